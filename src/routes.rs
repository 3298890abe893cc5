//! # Route discovery.
//!
//! A [`Route`] pairs one source event stream with one target webhook.
//! Routes come from either:
//!
//! - a JSON config file: an array of objects with string fields `Source`
//!   and `Target`, selected with the `--config` flag;
//! - environment variables whose *name* contains
//!   [`ENV_MARKER`](self::ENV_MARKER), holding `source,target` — split on
//!   the **first** comma only, so commas inside the target survive.
//!
//! The file takes precedence when the flag is given; otherwise the
//! environment is scanned. Discovery failures are [`ConfigError`]s and
//! fatal: an unreadable file, a malformed variable, an empty route side,
//! or an empty final list all stop the process at startup.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Marker substring identifying route-bearing environment variables.
pub const ENV_MARKER: &str = "XAKAC_SOURCE_TARGET_";

/// One subscription/delivery pairing.
///
/// Immutable for the process lifetime; a restarting listener receives a
/// clone of the same value. Duplicate routes are legal and run as
/// independent listeners.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Route {
    /// URL of the source event stream.
    pub source: String,
    /// URL of the target webhook.
    pub target: String,
}

/// Loads routes from the file at `path` or, absent a path, from the
/// process environment.
///
/// Returns `ConfigError::NoRoutes` when discovery succeeds but produces
/// an empty list.
pub fn discover(config_path: Option<&Path>) -> Result<Vec<Route>, ConfigError> {
    let routes = match config_path {
        Some(path) => from_file(path)?,
        None => from_env()?,
    };
    if routes.is_empty() {
        return Err(ConfigError::NoRoutes);
    }
    Ok(routes)
}

/// Reads and validates the JSON route file.
pub fn from_file(path: &Path) -> Result<Vec<Route>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_file(&text, path)
}

fn parse_file(text: &str, path: &Path) -> Result<Vec<Route>, ConfigError> {
    let routes: Vec<Route> = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    for (idx, route) in routes.iter().enumerate() {
        check_sides(route, || format!("routes[{idx}]"))?;
    }
    Ok(routes)
}

/// Scans the process environment for route-bearing variables.
///
/// Variables with non-unicode names or values are skipped; they cannot
/// hold a URL pair.
pub fn from_env() -> Result<Vec<Route>, ConfigError> {
    let pairs = std::env::vars_os().filter_map(|(name, value)| {
        let name = name.into_string().ok()?;
        let value = value.into_string().ok()?;
        Some((name, value))
    });
    from_env_pairs(pairs)
}

fn from_env_pairs(
    pairs: impl Iterator<Item = (String, String)>,
) -> Result<Vec<Route>, ConfigError> {
    let mut routes = Vec::new();
    for (name, value) in pairs {
        if !name.contains(ENV_MARKER) {
            continue;
        }
        let (source, target) = value
            .split_once(',')
            .ok_or_else(|| ConfigError::EnvValue { name: name.clone() })?;
        let route = Route {
            source: source.to_string(),
            target: target.to_string(),
        };
        check_sides(&route, || name.clone())?;
        routes.push(route);
    }
    Ok(routes)
}

fn check_sides(route: &Route, origin: impl Fn() -> String) -> Result<(), ConfigError> {
    if route.source.is_empty() {
        return Err(ConfigError::EmptyField {
            origin: origin(),
            field: "Source",
        });
    }
    if route.target.is_empty() {
        return Err(ConfigError::EmptyField {
            origin: origin(),
            field: "Target",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn env(pairs: &[(&str, &str)]) -> Result<Vec<Route>, ConfigError> {
        from_env_pairs(
            pairs
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string())),
        )
    }

    #[test]
    fn test_file_parses_pascal_case_fields() {
        let text = r#"[
            {"Source": "http://a/stream", "Target": "http://b/hook"},
            {"Source": "http://c/stream", "Target": "http://d/hook"}
        ]"#;
        let routes = parse_file(text, &PathBuf::from("routes.json")).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].source, "http://a/stream");
        assert_eq!(routes[1].target, "http://d/hook");
    }

    #[test]
    fn test_file_rejects_non_array_json() {
        let err = parse_file("{}", &PathBuf::from("routes.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_file_rejects_empty_side() {
        let text = r#"[{"Source": "", "Target": "http://b/hook"}]"#;
        let err = parse_file(text, &PathBuf::from("routes.json")).unwrap_err();
        match err {
            ConfigError::EmptyField { origin, field } => {
                assert_eq!(origin, "routes[0]");
                assert_eq!(field, "Source");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_marker_matches_name_only() {
        let routes = env(&[
            ("XAKAC_SOURCE_TARGET_A", "http://a/stream,http://b/hook"),
            ("UNRELATED", "http://x,http://y"),
            ("PATH", "/usr/bin"),
        ])
        .unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].source, "http://a/stream");
        assert_eq!(routes[0].target, "http://b/hook");
    }

    #[test]
    fn test_env_splits_on_first_comma_only() {
        let routes = env(&[(
            "XAKAC_SOURCE_TARGET_CSV",
            "http://a/stream,http://b/hook?ids=1,2,3",
        )])
        .unwrap();
        assert_eq!(routes[0].source, "http://a/stream");
        assert_eq!(routes[0].target, "http://b/hook?ids=1,2,3");
    }

    #[test]
    fn test_env_value_without_comma_is_fatal() {
        let err = env(&[("XAKAC_SOURCE_TARGET_BAD", "http://only-one")]).unwrap_err();
        match err {
            ConfigError::EnvValue { name } => assert_eq!(name, "XAKAC_SOURCE_TARGET_BAD"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_env_empty_target_is_fatal() {
        let err = env(&[("XAKAC_SOURCE_TARGET_T", "http://a/stream,")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EmptyField { field: "Target", .. }
        ));
    }

    #[test]
    fn test_discover_empty_env_is_no_routes() {
        let routes = env(&[("HOME", "/root")]).unwrap();
        assert!(routes.is_empty());
        // discover() turns the empty scan into ConfigError::NoRoutes; the
        // scan itself just reports what it found.
    }

    #[test]
    fn test_from_file_reports_read_errors() {
        let err = from_file(Path::new("/nonexistent/routes.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
