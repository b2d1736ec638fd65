//! Client identification utilities
//!
//! Who is on the other end of a request, as far as headers can tell.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Longest User-Agent kept; longer values are truncated on a char boundary
pub const MAX_USER_AGENT_LEN: usize = 255;

/// Client metadata recorded on sessions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Collect client info from request headers and the peer address
    pub fn from_headers(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .map(truncate_user_agent);

        Self {
            ip: extract_client_ip(headers, direct_ip),
            user_agent,
        }
    }

    /// IP as string (for database storage)
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

fn truncate_user_agent(ua: &str) -> String {
    match ua.char_indices().nth(MAX_USER_AGENT_LEN) {
        Some((idx, _)) => ua[..idx].to_string(),
        None => ua.to_string(),
    }
}

/// Extract client IP address from headers
///
/// Checks X-Forwarded-For header first (for reverse proxy setups),
/// then falls back to direct connection IP.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or(direct_ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_info_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static("Mozilla/5.0 Test Browser"),
        );
        let direct: IpAddr = "10.1.2.3".parse().unwrap();

        let info = ClientInfo::from_headers(&headers, Some(direct));
        assert_eq!(info.user_agent.as_deref(), Some("Mozilla/5.0 Test Browser"));
        assert_eq!(info.ip_string().as_deref(), Some("10.1.2.3"));
    }

    #[test]
    fn test_missing_user_agent_is_none() {
        let info = ClientInfo::from_headers(&HeaderMap::new(), None);
        assert_eq!(info, ClientInfo::default());
    }

    #[test]
    fn test_long_user_agent_is_truncated() {
        let mut headers = HeaderMap::new();
        let long = "a".repeat(400);
        headers.insert(header::USER_AGENT, HeaderValue::from_str(&long).unwrap());

        let info = ClientInfo::from_headers(&headers, None);
        assert_eq!(info.user_agent.unwrap().len(), MAX_USER_AGENT_LEN);
    }

    #[test]
    fn test_extract_client_ip_xff() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("192.168.1.1, 10.0.0.1"),
        );

        let ip = extract_client_ip(&headers, None);
        assert_eq!(ip, Some("192.168.1.1".parse().unwrap()));
    }

    #[test]
    fn test_extract_client_ip_falls_back_on_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown"));
        let direct: IpAddr = "127.0.0.1".parse().unwrap();

        assert_eq!(extract_client_ip(&headers, Some(direct)), Some(direct));
    }
}
