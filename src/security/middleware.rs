//! Client-IP middleware.
//!
//! Resolves the client address once per request and attaches it as a
//! [`ClientIp`] extension, so handlers can pass it on as the remote IP of a
//! signed OTP call.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::security::client_ip::{ClientIp, ClientIpResolver, HttpRequestSource};

pub async fn client_ip_middleware(
    State(resolver): State<Arc<ClientIpResolver>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    let resolved = resolver.resolve(&HttpRequestSource::new(req.headers(), peer.as_deref()));

    match resolved {
        Some(ip) => {
            req.extensions_mut().insert(ip);
        }
        None => tracing::debug!("No client IP available for request"),
    }

    next.run(req).await
}

/// Extension lookup helper for handlers.
pub fn client_ip<B>(req: &Request<B>) -> Option<&ClientIp> {
    req.extensions().get::<ClientIp>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn echo(req: Request<Body>) -> String {
        client_ip(&req)
            .map(|ip| format!("{}|{}", ip.address, ip.source))
            .unwrap_or_else(|| "none".to_string())
    }

    fn app() -> Router {
        let resolver = Arc::new(ClientIpResolver::new(true, Vec::new()));
        Router::new()
            .route("/", get(echo))
            .layer(middleware::from_fn_with_state(resolver, client_ip_middleware))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_forwarded_header_is_attached() {
        let req = Request::builder()
            .uri("/")
            .header("X-Forwarded-For", "10.0.0.5, 8.8.8.8")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(req).await.unwrap();
        assert_eq!(body_text(response).await, "8.8.8.8|X-Forwarded-For");
    }

    #[tokio::test]
    async fn test_repeated_forwarded_lines_are_joined() {
        let mut req = Request::builder()
            .uri("/")
            .header("X-Forwarded-For", "10.0.0.5")
            .header("X-Forwarded-For", "8.8.8.8")
            .body(Body::empty())
            .unwrap();
        let peer: SocketAddr = "10.0.0.1:51000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));

        let response = app().oneshot(req).await.unwrap();
        assert_eq!(body_text(response).await, "8.8.8.8|X-Forwarded-For");
    }

    #[tokio::test]
    async fn test_connect_info_is_remote_addr() {
        let mut req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let peer: SocketAddr = "203.0.113.7:51000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(peer));

        let response = app().oneshot(req).await.unwrap();
        assert_eq!(body_text(response).await, "203.0.113.7|REMOTE_ADDR");
    }

    #[tokio::test]
    async fn test_no_source_leaves_extension_unset() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(body_text(response).await, "none");
    }

    #[test]
    fn test_client_ip_helper() {
        let mut req = Request::builder().body(()).unwrap();
        assert!(client_ip(&req).is_none());
        req.extensions_mut().insert(ClientIp {
            address: "1.1.1.1".into(),
            source: "X-Client-IP",
        });
        assert_eq!(client_ip(&req).unwrap().address, "1.1.1.1");
    }
}
