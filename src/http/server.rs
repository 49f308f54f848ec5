//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the XHTTP handler on every path
//! - Wire up middleware (tracing, request ID, limits, timeout, panics)
//! - Add the `Server` header when a response has none
//! - Run the dispatcher against the current registry snapshot
//! - Start the registry watcher when configured

use axum::{
    body::{Body, Bytes},
    error_handling::HandleErrorLayer,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header::SERVER, HeaderMap, HeaderValue, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{timeout::error::Elapsed, BoxError, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::{NodeConfig, ProtocolConfig};
use crate::http::controller::ControllerRegistry;
use crate::http::dispatch::Dispatcher;
use crate::http::request::{RequestIdExt, UuidRequestId};
use crate::observability::metrics;
use crate::protocol::error::X_EXCEPTION;
use crate::protocol::{Mode, XhttpError, XhttpRequest, XhttpResponse, SERVER_NAME};
use crate::registry::{RegistryWatcher, SharedRegistry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: SharedRegistry,
    pub controllers: Arc<ControllerRegistry>,
    pub protocol: Arc<ProtocolConfig>,
}

/// HTTP server for the XHTTP node.
pub struct HttpServer {
    router: Router,
    config: NodeConfig,
    registry: SharedRegistry,
}

impl HttpServer {
    /// Create a new HTTP server serving `registry`.
    pub fn new(config: NodeConfig, registry: SharedRegistry, controllers: ControllerRegistry) -> Self {
        let state = AppState {
            registry: registry.clone(),
            controllers: Arc::new(controllers),
            protocol: Arc::new(config.protocol.clone()),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            registry,
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Oversized bodies and timeouts are answered as internal exceptions,
    /// so every response a client sees follows the XHTTP error mapping.
    fn build_router(config: &NodeConfig, state: AppState) -> Router {
        let server_header = HeaderValue::from_str(&config.protocol.server_header)
            .unwrap_or_else(|_| HeaderValue::from_static(SERVER_NAME));

        Router::new()
            .route("/{*path}", any(xhttp_handler))
            .route("/", any(xhttp_handler))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_middleware_error))
                    .timeout(Duration::from_secs(config.timeouts.request_secs)),
            )
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(SetResponseHeaderLayer::if_not_present(SERVER, server_header))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request.headers().request_id(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// The router, for driving the node without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.registry.load().len(),
            "HTTP server starting"
        );

        // Dropping the watcher stops it, so it lives as long as the server.
        let _watcher = if self.config.registry.watch {
            match RegistryWatcher::new(self.registry.clone()).run() {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to start service directory watcher");
                    None
                }
            }
        } else {
            None
        };

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }
}

/// XHTTP handler: every method, every path.
async fn xhttp_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start_time = Instant::now();
    let mode = mode_label(&headers);

    let result = match body {
        Ok(body) => {
            let registry = state.registry.load_full();
            Dispatcher::new(&registry, &state.controllers, &state.protocol).dispatch(&headers, body)
        }
        Err(rejection) => Err(XhttpError::internal(format!(
            "Request body rejected: {}",
            rejection.body_text()
        ))),
    };

    let response = match result {
        Ok(response) => response,
        Err(err) => {
            tracing::info!(
                request_id = %headers.request_id(),
                code = err.code(),
                exception = err.header(X_EXCEPTION).unwrap_or(""),
                "XHTTP request rejected: {}",
                err
            );
            XhttpResponse::from_error(&err)
        }
    };

    metrics::record_request(mode, response.status().as_u16(), start_time);
    response.into_response()
}

/// Metrics label for the request's mode.
fn mode_label(headers: &HeaderMap) -> &'static str {
    match XhttpRequest::new(headers).raw_mode() {
        Ok(None) => "none",
        Ok(Some(raw)) => raw.parse::<Mode>().map(Mode::as_str).unwrap_or("invalid"),
        Err(_) => "invalid",
    }
}

/// Answer a failed middleware (the request timeout) as an internal exception.
async fn handle_middleware_error(err: BoxError) -> Response {
    let err = if err.is::<Elapsed>() {
        XhttpError::internal("Request timed out")
    } else {
        XhttpError::internal(format!("Unhandled middleware error: {}", err))
    };

    tracing::warn!(code = err.code(), exception = err.header(X_EXCEPTION).unwrap_or(""), "Request aborted");
    err.into_response()
}

/// Turn a handler panic into an internal exception response.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "Request handler panicked");
    XhttpError::internal(format!("panic: {}", detail)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::controller::ActionCall;
    use crate::http::testing;
    use crate::protocol::XhttpResult;
    use arc_swap::ArcSwap;
    use axum::http::StatusCode;
    use hyper::ext::ReasonPhrase;
    use serde_json::Value;
    use tower::ServiceExt;

    fn server(controllers: ControllerRegistry) -> HttpServer {
        server_with(NodeConfig::default(), controllers)
    }

    fn server_with(config: NodeConfig, controllers: ControllerRegistry) -> HttpServer {
        let registry: SharedRegistry = Arc::new(ArcSwap::from_pointee(testing::registry()));
        HttpServer::new(config, registry, controllers)
    }

    fn request(pairs: &[(&str, &str)]) -> Request<Body> {
        let mut builder = Request::builder().method("POST").uri("/any/path");
        for (k, v) in pairs {
            builder = builder.header(*k, *v);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_version_mode_over_router() {
        let app = server(ControllerRegistry::new()).router();
        let response = app
            .oneshot(request(&[("X-Mode", "version"), ("X-Service", "calculator"), ("X-Version", "1.0")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[SERVER], "XHTTP Rust node");
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["content-type"], "application/json; charset=utf-8");
        assert_eq!(body_text(response).await, r#"["0.9","1.0"]"#);
    }

    #[tokio::test]
    async fn test_error_status_line() {
        let app = server(ControllerRegistry::new()).router();
        let response = app
            .oneshot(request(&[("X-Mode", "info"), ("X-Service", "calculator"), ("X-Version", "9.9")]))
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 551);
        assert_eq!(
            response.extensions().get::<ReasonPhrase>().map(|r| r.as_bytes()),
            Some(&b"XHTTP Version Not Supported"[..])
        );
        assert_eq!(response.headers()["x-version"], "1.0");
        assert_eq!(response.headers()["content-type"], "text/plain; charset=utf-8");
        assert_eq!(body_text(response).await, "551 XHTTP Version Not Supported");
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let app = server(ControllerRegistry::new()).router();
        let response = app
            .oneshot(request(&[("X-Mode", "version"), ("x-request-id", "req-42")]))
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-42");
        assert_eq!(response.status().as_u16(), 450);
    }

    #[tokio::test]
    async fn test_panicking_controller_becomes_internal_exception() {
        let mut controllers = ControllerRegistry::new();
        controllers.register("calculator", "1.0", "noop", |_: &ActionCall| -> XhttpResult<Value> {
            panic!("boom")
        });

        let app = server(controllers).router();
        let response = app
            .oneshot(request(&[
                ("X-Mode", "perform"),
                ("X-Service", "calculator"),
                ("X-Version", "1.0"),
                ("X-Action", "noop"),
            ]))
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 550);
        assert_eq!(response.headers()["x-exception"], r#""panic: boom""#);
        assert_eq!(response.headers()[SERVER], "XHTTP Rust node");
    }

    #[tokio::test]
    async fn test_oversized_body_is_internal_exception() {
        let mut config = NodeConfig::default();
        config.limits.max_body_size = 4;
        let mut controllers = ControllerRegistry::new();
        controllers.register("calculator", "1.0", "noop", |_: &ActionCall| -> XhttpResult<Value> {
            Ok(Value::from("unreachable"))
        });
        let app = server_with(config, controllers).router();

        for content_length in [None, Some("10")] {
            let mut builder = Request::builder()
                .method("POST")
                .uri("/")
                .header("X-Mode", "perform")
                .header("X-Service", "calculator")
                .header("X-Version", "1.0")
                .header("X-Action", "noop");
            if let Some(len) = content_length {
                builder = builder.header("content-length", len);
            }
            let response = app
                .clone()
                .oneshot(builder.body(Body::from("0123456789")).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status().as_u16(), 550);
            assert_eq!(
                response.extensions().get::<ReasonPhrase>().map(|r| r.as_bytes()),
                Some(&b"Exception"[..])
            );
            let exception = response.headers()["x-exception"].to_str().unwrap().to_string();
            assert!(exception.starts_with(r#""Request body rejected: "#), "{}", exception);
            assert!(exception.contains("length limit exceeded"), "{}", exception);
            assert_eq!(response.headers()[SERVER], "XHTTP Rust node");
            assert_eq!(body_text(response).await, "550 Exception");
        }
    }

    #[tokio::test]
    async fn test_body_within_limit_reaches_controller() {
        let mut config = NodeConfig::default();
        config.limits.max_body_size = 16;
        let mut controllers = ControllerRegistry::new();
        controllers.register("calculator", "1.0", "noop", |call: &ActionCall| -> XhttpResult<Value> {
            Ok(Value::from(call.body.len()))
        });
        let app = server_with(config, controllers).router();

        let request = Request::builder()
            .method("POST")
            .uri("/")
            .header("X-Mode", "perform")
            .header("X-Service", "calculator")
            .header("X-Version", "1.0")
            .header("X-Action", "noop")
            .body(Body::from("0123456789"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "10");
    }

    #[tokio::test]
    async fn test_timeout_is_internal_exception() {
        let response = handle_middleware_error(Box::new(Elapsed::new())).await;

        assert_eq!(response.status().as_u16(), 550);
        assert_eq!(response.headers()["x-exception"], r#""Request timed out""#);
        assert_eq!(body_text(response).await, "550 Exception");
    }

    #[test]
    fn test_mode_label() {
        let mut headers = HeaderMap::new();
        assert_eq!(mode_label(&headers), "none");

        headers.insert("x-mode", HeaderValue::from_static("info"));
        assert_eq!(mode_label(&headers), "info");

        headers.insert("x-mode", HeaderValue::from_static("bogus"));
        assert_eq!(mode_label(&headers), "invalid");
    }
}
