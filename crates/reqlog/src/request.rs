use std::net::SocketAddr;

use axum::extract::{ConnectInfo, OriginalUri};
use http::header::{self, HeaderName};
use http::Request;

use reqlog_core::Exchange;

/// Snapshot the request side of an exchange.
///
/// Under a nested router the request URI has the mount prefix stripped, so the
/// router's [`OriginalUri`] is preferred when present.
pub(crate) fn exchange_from_request<B>(req: &Request<B>) -> Exchange {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri)
        .unwrap_or_else(|| req.uri());
    let url = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let host = header_value(req, header::HOST)
        .or_else(|| uri.authority().map(|authority| authority.to_string()))
        .unwrap_or_default();

    let mut exchange = Exchange::new(req.method().as_str(), url).with_host(host);
    exchange.remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    exchange.user_agent = header_value(req, header::USER_AGENT);
    exchange.referer = header_value(req, header::REFERER);
    exchange
}

fn header_value<B>(req: &Request<B>, name: HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_fields() {
        let mut req = Request::builder()
            .method("POST")
            .uri("/upload?chunk=3")
            .header("host", "files.example.com")
            .header("user-agent", "reqwest/0.12")
            .header("referer", "https://example.com/form")
            .body(())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 20], 51234))));

        let ex = exchange_from_request(&req);
        assert_eq!(ex.method, "POST");
        assert_eq!(ex.path, "/upload");
        assert_eq!(ex.url, "/upload?chunk=3");
        assert_eq!(ex.host, "files.example.com");
        assert_eq!(ex.remote_addr.as_deref(), Some("192.168.1.20"));
        assert_eq!(ex.user_agent.as_deref(), Some("reqwest/0.12"));
        assert_eq!(ex.referer.as_deref(), Some("https://example.com/form"));
        assert_eq!(ex.status(), None);
    }

    #[test]
    fn test_host_from_absolute_uri() {
        let req = Request::builder()
            .uri("http://proxy.local:8080/status")
            .body(())
            .unwrap();

        let ex = exchange_from_request(&req);
        assert_eq!(ex.host, "proxy.local:8080");
        assert_eq!(ex.url, "/status");
        assert_eq!(ex.remote_addr, None);
        assert_eq!(ex.user_agent, None);
    }

    #[test]
    fn test_original_uri_preferred() {
        let mut req = Request::builder()
            .uri("/x?y=1")
            .header("host", "h")
            .body(())
            .unwrap();
        req.extensions_mut()
            .insert(OriginalUri("/api/x?y=1".parse().unwrap()));

        let ex = exchange_from_request(&req);
        assert_eq!(ex.url, "/api/x?y=1");
        assert_eq!(ex.path, "/api/x");
        assert_eq!(ex.host, "h");
    }
}
