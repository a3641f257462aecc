//! API-key authentication
//!
//! Callers present the service key in the `X-API-Key` header. Comparison is
//! constant-time so response timing leaks nothing about the expected key.

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;

/// Header carrying the caller's credential
pub const API_KEY_HEADER: &str = "x-api-key";

/// Validate the caller-supplied API key against the configured service key.
///
/// Returns the presented credential on match. Absence of the header and a
/// mismatched key are indistinguishable to the caller.
pub fn authenticate<'a>(headers: &'a HeaderMap, expected: &str) -> Option<&'a str> {
    let provided = headers.get(API_KEY_HEADER)?.to_str().ok()?;
    if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        Some(provided)
    } else {
        None
    }
}

/// Constant-time byte comparison; length mismatch short-circuits, which leaks
/// only the key length
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_key(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_str(key).unwrap());
        headers
    }

    #[test]
    fn test_matching_key_returns_credential() {
        let headers = headers_with_key("svc-key-123");
        assert_eq!(authenticate(&headers, "svc-key-123"), Some("svc-key-123"));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let headers = headers_with_key("svc-key-456");
        assert_eq!(authenticate(&headers, "svc-key-123"), None);
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let headers = HeaderMap::new();
        assert_eq!(authenticate(&headers, "svc-key-123"), None);
    }

    #[test]
    fn test_prefix_of_expected_key_is_rejected() {
        let headers = headers_with_key("svc-key");
        assert_eq!(authenticate(&headers, "svc-key-123"), None);
    }
}
