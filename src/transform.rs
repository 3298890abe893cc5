//! # Payload transformation.
//!
//! Maps one raw data frame to one outbound request descriptor. The frame
//! payload must decode as a JSON object at the top level; its `body` key
//! becomes the POST body (re-serialized to JSON, `null` when absent) and
//! every other top-level key becomes an HTTP header.
//!
//! The mapping is pure and deterministic: identical input bytes always
//! yield identical descriptors. Decoding goes through the typed
//! [`WebhookPayload`] intermediate rather than ad-hoc map plucking, so the
//! body/header split is visible in the type system.
//!
//! ```rust
//! use xakac::transform;
//!
//! let desc = transform::descriptor_for(
//!     "http://sink/hook",
//!     br#"{"body": {"n": 1}, "X-Id": "42"}"#,
//! )
//! .unwrap();
//!
//! assert_eq!(desc.body, br#"{"n":1}"#);
//! assert_eq!(desc.headers, vec![("X-Id".to_string(), "42".to_string())]);
//! ```

use serde_json::Value;

use crate::error::MalformedPayload;

/// Typed intermediate between the decoded frame and the descriptor.
///
/// `headers` lists the keys in the decoded object's iteration order,
/// which is deterministic for a given input; duplicate names cannot
/// survive JSON decoding (last write wins there already).
#[derive(Clone, Debug, PartialEq)]
pub struct WebhookPayload {
    /// Value of the top-level `body` key, if present.
    pub body: Option<Value>,
    /// Every other top-level key, stringified.
    pub headers: Vec<(String, String)>,
}

/// One fully-formed outbound request. The method is always POST.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
    /// Target webhook URL from the route.
    pub url: String,
    /// Header pairs derived from the payload.
    pub headers: Vec<(String, String)>,
    /// JSON-encoded request body.
    pub body: Vec<u8>,
}

/// Decodes a data frame payload into the typed [`WebhookPayload`].
///
/// Fails with [`MalformedPayload`] when the bytes are not JSON or the top
/// level is not an object; the caller drops the frame.
pub fn decode(data: &[u8]) -> Result<WebhookPayload, MalformedPayload> {
    let value: Value = serde_json::from_slice(data)?;
    let Value::Object(map) = value else {
        return Err(MalformedPayload::NotObject);
    };

    let mut body = None;
    let mut headers = Vec::with_capacity(map.len());
    for (key, value) in map {
        if key == "body" {
            body = Some(value);
        } else {
            headers.push((key, stringify(&value)));
        }
    }
    Ok(WebhookPayload { body, headers })
}

/// Decodes `data` and builds the descriptor for `target` in one step.
pub fn descriptor_for(target: &str, data: &[u8]) -> Result<RequestDescriptor, MalformedPayload> {
    Ok(decode(data)?.into_descriptor(target))
}

impl WebhookPayload {
    /// Builds the outbound descriptor for the given target URL.
    ///
    /// The body is the JSON encoding of the `body` value, or the literal
    /// `null` when the key was absent.
    pub fn into_descriptor(self, target: &str) -> RequestDescriptor {
        let body = match self.body {
            Some(value) => value.to_string().into_bytes(),
            None => Value::Null.to_string().into_bytes(),
        };
        RequestDescriptor {
            url: target.to_string(),
            headers: self.headers,
            body,
        }
    }
}

/// Header value rendering: strings verbatim, everything else as compact
/// JSON text.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_is_deterministic() {
        let data = br#"{"body": {"a": 1}, "X-Foo": "bar", "X-N": 7}"#;
        let first = descriptor_for("http://t/hook", data).unwrap();
        let second = descriptor_for("http://t/hook", data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_body_and_headers_split() {
        let desc =
            descriptor_for("http://t/hook", br#"{"body": {"a":1}, "X-Foo": "bar"}"#).unwrap();
        assert_eq!(desc.body, br#"{"a":1}"#.to_vec());
        assert_eq!(
            desc.headers,
            vec![("X-Foo".to_string(), "bar".to_string())]
        );
        assert!(desc.headers.iter().all(|(name, _)| name != "body"));
    }

    #[test]
    fn test_absent_body_becomes_null() {
        let desc = descriptor_for("http://t/hook", br#"{"X-Foo": "bar"}"#).unwrap();
        assert_eq!(desc.body, b"null".to_vec());
    }

    #[test]
    fn test_string_body_keeps_json_quoting() {
        let desc = descriptor_for("http://t/hook", br#"{"body": "hello"}"#).unwrap();
        assert_eq!(desc.body, br#""hello""#.to_vec());
    }

    #[test]
    fn test_non_string_header_values_stringify_as_json() {
        let payload = decode(br#"{"X-Num": 42, "X-Bool": true, "X-Null": null, "X-Arr": [1,2]}"#)
            .unwrap();
        let mut headers = payload.headers;
        headers.sort();
        assert_eq!(
            headers,
            vec![
                ("X-Arr".to_string(), "[1,2]".to_string()),
                ("X-Bool".to_string(), "true".to_string()),
                ("X-Null".to_string(), "null".to_string()),
                ("X-Num".to_string(), "42".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = decode(b"not json at all").unwrap_err();
        assert!(matches!(err, MalformedPayload::Json(_)));
    }

    #[test]
    fn test_non_object_top_level_is_malformed() {
        let err = decode(br#"[1, 2, 3]"#).unwrap_err();
        assert!(matches!(err, MalformedPayload::NotObject));
        let err = decode(br#""just a string""#).unwrap_err();
        assert!(matches!(err, MalformedPayload::NotObject));
    }

    #[test]
    fn test_empty_object_yields_null_body_no_headers() {
        let payload = decode(b"{}").unwrap();
        assert!(payload.body.is_none());
        assert!(payload.headers.is_empty());
        let desc = payload.into_descriptor("http://t/hook");
        assert_eq!(desc.body, b"null".to_vec());
    }
}
