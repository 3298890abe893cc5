//! Webhook delivery.
//!
//! One POST per data frame, no retries. Delivery succeeds as soon as the
//! target produces *any* HTTP response; status codes are reported in the
//! [`Delivered`](crate::events::EventKind::Delivered) event and otherwise
//! ignored. Only a transport-level failure (DNS, refused connection,
//! timeout) counts as a delivery failure, and that too only costs the one
//! frame.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;

use crate::core::RelayConfig;
use crate::error::DeliveryError;
use crate::transform::RequestDescriptor;

/// HTTP client for webhook POSTs.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct DeliveryClient {
    http: reqwest::Client,
}

impl DeliveryClient {
    /// Builds the client from the relay configuration.
    ///
    /// The total request deadline is only applied when configured; the
    /// connect timeout always is.
    pub fn new(cfg: &RelayConfig) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout)
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true);
        if let Some(deadline) = cfg.request_deadline() {
            builder = builder.timeout(deadline);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }

    /// Executes one delivery and returns the target's status code.
    ///
    /// No Content-Type is set unless the payload carried one as a header
    /// pair; the descriptor is forwarded exactly as built.
    pub async fn deliver(&self, request: &RequestDescriptor) -> Result<StatusCode, DeliveryError> {
        let headers = header_map(&request.headers)?;
        let response = self
            .http
            .post(&request.url)
            .headers(headers)
            .body(request.body.clone())
            .send()
            .await?;
        Ok(response.status())
    }
}

/// Converts payload pairs into a wire-legal header map.
///
/// Payload keys are arbitrary JSON strings and may not be legal HTTP;
/// such a frame is rejected rather than sent partially.
fn header_map(pairs: &[(String, String)]) -> Result<HeaderMap, DeliveryError> {
    let mut map = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| DeliveryError::Header {
            name: name.clone(),
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| DeliveryError::Header {
            name: name.clone(),
        })?;
        map.append(header, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_map_keeps_all_pairs() {
        let pairs = vec![
            ("X-Id".to_owned(), "42".to_owned()),
            ("Content-Type".to_owned(), "application/json".to_owned()),
        ];
        let map = header_map(&pairs).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("x-id").unwrap(), "42");
    }

    #[test]
    fn test_illegal_header_name_is_rejected() {
        let pairs = vec![("not a header".to_owned(), "v".to_owned())];
        let err = header_map(&pairs).unwrap_err();
        assert!(matches!(err, DeliveryError::Header { name } if name == "not a header"));
    }

    #[test]
    fn test_illegal_header_value_is_rejected() {
        let pairs = vec![("X-Ok".to_owned(), "line\nbreak".to_owned())];
        assert!(header_map(&pairs).is_err());
    }

    #[test]
    fn test_empty_pairs_build_empty_map() {
        let map = header_map(&[]).unwrap();
        assert!(map.is_empty());
    }
}
