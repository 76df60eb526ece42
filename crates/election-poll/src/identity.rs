//! Caller identity as forwarded by the upstream authentication proxy.

use axum::http::HeaderMap;

use crate::domain::AdminId;

/// Header carrying the authenticated admin's identifier.
pub const CALLER_HEADER: &str = "x-admin-id";

pub fn caller_identity(headers: &HeaderMap) -> Option<AdminId> {
    headers
        .get(CALLER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| AdminId(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn blank_header_is_anonymous() {
        let mut headers = HeaderMap::new();
        assert!(caller_identity(&headers).is_none());

        headers.insert(CALLER_HEADER, HeaderValue::from_static("   "));
        assert!(caller_identity(&headers).is_none());

        headers.insert(CALLER_HEADER, HeaderValue::from_static(" admin-7 "));
        assert_eq!(caller_identity(&headers), Some(AdminId("admin-7".to_string())));
    }
}
