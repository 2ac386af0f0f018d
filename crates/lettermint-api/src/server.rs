//! HTTP server configuration and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID span and response header
//! 2. Request/response logging
//! 3. Timeout enforcement
//! 4. Body size limit
//! 5. Handler execution
//!
//! # Graceful Shutdown
//!
//! The server handles SIGTERM and Ctrl+C gracefully: it stops accepting new
//! connections and waits for in-flight requests before returning.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use lettermint_core::{EventHandler, WebhookError};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{
    config::{Config, WebhookConfig},
    handlers::{self, WebhookState},
};

/// Header carrying the per-request id on every response.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Creates the webhook route alone, for hosts mounting it into their own
/// router.
///
/// # Errors
///
/// Returns `SecretNotConfigured` when no signing secret is set.
pub fn webhook_router(
    config: &WebhookConfig,
    handler: Arc<dyn EventHandler>,
) -> Result<Router, WebhookError> {
    let state = WebhookState::from_config(config, handler)?;

    Ok(Router::new().route(&config.route_path(), post(handlers::receive_webhook)).with_state(state))
}

/// Creates the Axum router with all routes and middleware.
///
/// # Errors
///
/// Returns `SecretNotConfigured` when no webhook signing secret is set.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use lettermint_api::{create_router, Config};
/// use lettermint_core::LoggingEventHandler;
///
/// let config = Config::load().expect("configuration");
/// let app = create_router(&config, Arc::new(LoggingEventHandler)).expect("webhook secret");
/// ```
pub fn create_router(
    config: &Config,
    handler: Arc<dyn EventHandler>,
) -> Result<Router, WebhookError> {
    let webhook_routes = webhook_router(&config.webhook_config(), handler)?;

    Ok(Router::new()
        .route("/health", get(handlers::health_check))
        .merge(webhook_routes)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id)))
}

/// Runs each request inside a span keyed by a fresh id and echoes the id
/// back in [`REQUEST_ID_HEADER`], so a sender can match a delivery to the
/// receiver's logs.
async fn inject_request_id(req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("webhook_request", %request_id, path = %req.uri().path());

    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Serves `router` on `addr` until SIGTERM or Ctrl+C, then drains in-flight
/// deliveries before returning.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound.
pub async fn start_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Lettermint receiver listening");

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Lettermint receiver stopped");
    Ok(())
}

/// Resolves on the first of Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    };

    warn!(signal, "Shutdown requested, finishing in-flight webhook deliveries");
}
