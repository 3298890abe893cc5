//! Integration tests for route discovery from a config file on disk.

use std::path::PathBuf;

use xakac::routes;
use xakac::ConfigError;

fn scratch_file(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!("xakac-routes-{tag}-{}.json", std::process::id()))
}

#[test]
fn test_route_file_round_trip() {
    let path = scratch_file("ok");
    std::fs::write(
        &path,
        r#"[{"Source":"http://a/stream","Target":"http://b/hook"}]"#,
    )
    .expect("write route file");

    let routes = routes::from_file(&path).expect("parse route file");
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].source, "http://a/stream");
    assert_eq!(routes[0].target, "http://b/hook");

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_empty_route_file_is_fatal() {
    let path = scratch_file("empty");
    std::fs::write(&path, "[]").expect("write route file");

    let err = routes::discover(Some(&path)).expect_err("empty file must not pass");
    assert!(matches!(err, ConfigError::NoRoutes));

    let _ = std::fs::remove_file(&path);
}
