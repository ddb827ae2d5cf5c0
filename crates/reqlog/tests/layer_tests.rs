use std::fs;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, Response, StatusCode};
use axum::routing::get;
use axum::{Extension, Router};
use tempfile::TempDir;
use tower::{service_fn, Layer, ServiceExt};

use reqlog::{AccessLogConfig, AccessLogLayer, AccessLogger, Env, FinalizeHandle};
use reqlog_logging::{ConsoleSink, DailyFileSink, SinkManager};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SharedBuffer {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }
}

/// Layer whose console output is captured as plain text.
fn capture_layer(config: AccessLogConfig, folder: Option<&TempDir>) -> (AccessLogLayer, SharedBuffer) {
    let buf = SharedBuffer::default();
    let sinks = SinkManager::from_parts(
        Some(ConsoleSink::from_writer(Box::new(buf.clone()), true)),
        folder.map(|dir| DailyFileSink::new(dir.path())),
    );
    let logger = Arc::new(AccessLogger::with_sinks(config, sinks));
    (AccessLogLayer::from_logger(logger), buf)
}

fn app(layer: AccessLogLayer) -> Router {
    Router::new()
        .route("/", get(|| async { "hello" }))
        .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "nope") }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                "late"
            }),
        )
        .route(
            "/upgrade",
            get(|Extension(log): Extension<FinalizeHandle>| async move {
                assert!(log.finalize());
                StatusCode::OK
            }),
        )
        .layer(layer)
}

async fn read_body(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn items() -> AccessLogConfig {
    AccessLogConfig::new().with_console_items(["method", "statusCode", "path"])
}

// ============================================================
// Completion signals
// ============================================================

#[tokio::test]
async fn test_logs_when_body_finishes() {
    let (layer, console) = capture_layer(items(), None);
    let response = app(layer)
        .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_body(response).await, "nope");
    assert_eq!(console.lines(), ["GET 404 /missing"]);
}

#[tokio::test]
async fn test_logs_once_when_response_dropped_unread() {
    let (layer, console) = capture_layer(items(), None);
    let response = app(layer)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(console.lines().is_empty() || console.lines() == ["GET 200 /"]);
    drop(response);
    assert_eq!(console.lines(), ["GET 200 /"]);
}

#[tokio::test]
async fn test_logs_when_future_dropped() {
    let (layer, console) = capture_layer(items(), None);
    let pending = app(layer).oneshot(Request::get("/slow").body(Body::empty()).unwrap());

    // Client goes away before the handler answers
    let result = tokio::time::timeout(Duration::from_millis(20), pending).await;
    assert!(result.is_err());

    assert_eq!(console.lines(), ["GET --- /slow"]);
}

#[tokio::test]
async fn test_timeout_backstop_logs_before_response() {
    let config = items().with_force_log(Duration::from_millis(30));
    let (layer, console) = capture_layer(config, None);

    let response = app(layer)
        .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // Timeout fired while the handler was still sleeping
    assert_eq!(console.lines(), ["GET --- /slow"]);
    assert_eq!(read_body(response).await, "late");
    assert_eq!(console.lines().len(), 1);
}

#[tokio::test]
async fn test_manual_finalize_from_handler() {
    let (layer, console) = capture_layer(items(), None);
    let response = app(layer)
        .oneshot(Request::get("/upgrade").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(console.lines(), ["GET --- /upgrade"]);
    read_body(response).await;
    assert_eq!(console.lines().len(), 1);
}

#[tokio::test]
async fn test_inner_error_finalizes() {
    let (layer, console) = capture_layer(items(), None);
    let failing = service_fn(|_req: Request<Body>| async {
        Err::<Response<Body>, io::Error>(io::Error::other("handler blew up"))
    });

    let result = layer
        .layer(failing)
        .oneshot(Request::post("/fail").body(Body::empty()).unwrap())
        .await;

    assert!(result.is_err());
    assert_eq!(console.lines(), ["POST --- /fail"]);
}

// ============================================================
// Exchange fields
// ============================================================

#[tokio::test]
async fn test_request_fields_reach_formatters() {
    let config = AccessLogConfig::new().with_console_items(["url", "ip", "ua", "referer", "depth"]);
    let (layer, console) = capture_layer(config, None);

    let mut req = Request::get("/?q=1")
        .header("host", "svc.internal")
        .header("user-agent", "probe/1.0")
        .body(Body::empty())
        .unwrap();
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([10, 1, 2, 3], 4000))));
    req.extensions_mut().insert(Env::with_depth(2));

    let response = app(layer).oneshot(req).await.unwrap();
    read_body(response).await;

    assert_eq!(
        console.lines(),
        ["svc.internal/?q=1 10.1.2.3 \"probe/1.0\" - @2"]
    );
}

#[tokio::test]
async fn test_nested_router_logs_full_url() {
    let config = AccessLogConfig::new().with_console_items(["url", "path"]);
    let (layer, console) = capture_layer(config, None);
    let api = Router::new()
        .route("/x", get(|| async { "x" }))
        .layer(layer);
    let router = Router::new().nest("/api", api);

    let req = Request::get("/api/x?y=1")
        .header("host", "h")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(req).await.unwrap();
    assert_eq!(read_body(response).await, "x");

    assert_eq!(console.lines(), ["h/api/x?y=1 /api/x"]);
}

#[tokio::test]
async fn test_file_sink_gets_plain_file_items() {
    let dir = TempDir::new().unwrap();
    let config = AccessLogConfig::new()
        .with_console_items(["method"])
        .with_file_items(["method", "statusCode", "url"])
        .with_sep("|");
    let (layer, console) = capture_layer(config, Some(&dir));
    let logger = layer.logger().clone();

    let response = app(layer)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    read_body(response).await;
    logger.close();

    assert_eq!(console.lines(), ["GET"]);

    let files: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.ends_with(".log") && name.len() == "YYYY-MM-DD.log".len());
    assert_eq!(fs::read_to_string(&files[0]).unwrap(), "GET|200|/\n");
}

#[tokio::test]
async fn test_concurrent_exchanges_each_log_once() {
    let (layer, console) = capture_layer(items(), None);
    let router = app(layer);

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let router = router.clone();
            tokio::spawn(async move {
                let path = if i % 2 == 0 { "/" } else { "/missing" };
                let response = router
                    .oneshot(Request::get(path).body(Body::empty()).unwrap())
                    .await
                    .unwrap();
                read_body(response).await;
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let lines = console.lines();
    assert_eq!(lines.len(), 20);
    assert_eq!(lines.iter().filter(|l| *l == "GET 200 /").count(), 10);
    assert_eq!(lines.iter().filter(|l| *l == "GET 404 /missing").count(), 10);
}
