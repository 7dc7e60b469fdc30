//! Client identity extractor used by the export rate guard.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::{convert::Infallible, net::SocketAddr};

/// Header carrying the originating client address behind proxies.
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Identity used when neither a forwarded address nor a peer address is known.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// The client a request is attributed to.
///
/// Taken from the first hop of `X-Forwarded-For` when present, otherwise from
/// the peer address of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// First non-empty hop of `X-Forwarded-For`.
pub fn forwarded_client(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(client) = forwarded_client(&parts.headers) {
            return Ok(ClientId(client));
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
        Ok(ClientId(peer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    async fn extract(request: Request<()>) -> ClientId {
        let (mut parts, _) = request.into_parts();
        ClientId::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[test]
    fn test_forwarded_client_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            FORWARDED_FOR_HEADER,
            HeaderValue::from_static(" 203.0.113.7 , 10.0.0.1"),
        );
        assert_eq!(forwarded_client(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_forwarded_client_ignores_empty_header() {
        let mut headers = HeaderMap::new();
        headers.insert(FORWARDED_FOR_HEADER, HeaderValue::from_static(""));
        assert!(forwarded_client(&headers).is_none());
    }

    #[tokio::test]
    async fn test_extract_falls_back_to_peer_address() {
        let mut request = Request::new(());
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 20], 51000))));
        assert_eq!(extract(request).await.as_str(), "192.168.1.20");
    }

    #[tokio::test]
    async fn test_extract_prefers_forwarded_header() {
        let mut request = Request::builder()
            .header(FORWARDED_FOR_HEADER, "198.51.100.4")
            .body(())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 20], 51000))));
        assert_eq!(extract(request).await.as_str(), "198.51.100.4");
    }

    #[tokio::test]
    async fn test_extract_without_any_source() {
        assert_eq!(extract(Request::new(())).await.as_str(), UNKNOWN_CLIENT);
    }
}
