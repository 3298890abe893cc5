//! # Cross-platform OS signal handling.
//!
//! Provides [`wait_for_shutdown_signal`], an async helper that completes
//! when the process receives a termination signal and reports which one.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

/// Waits for a termination signal and returns its name.
///
/// Each call creates independent signal listeners. Returns `Err` if
/// signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = tokio::signal::ctrl_c() => "ctrl-c",
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for a termination signal and returns its name.
///
/// Each call creates independent signal listeners. Returns `Err` if
/// signal registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
