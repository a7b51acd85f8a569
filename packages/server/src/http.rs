//! axum binding: every request goes through one fallback handler into
//! [`Provider::process`] on the blocking pool.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{ALLOW, CONTENT_LENGTH, CONTENT_LOCATION, CONTENT_TYPE, ETAG, LAST_MODIFIED, LOCATION};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::processor::Provider;
use crate::request::RequestContext;
use crate::response::{http_date, ResponseContext};

#[derive(Clone)]
struct AppState {
    provider: Arc<Provider>,
    max_body_bytes: usize,
}

/// Router serving every path through `provider`. Bodies above
/// `max_body_bytes` are answered with 413.
pub fn router(provider: Arc<Provider>, max_body_bytes: usize) -> Router {
    Router::new()
        .fallback(handle)
        .with_state(AppState {
            provider,
            max_body_bytes,
        })
        .layer(TraceLayer::new_for_http())
}

/// Bind `config.listen` and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig) -> Result<()> {
    let provider = Arc::new(config.provider()?);
    let app = router(provider, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    tracing::info!(listen = %config.listen, base_path = %config.base_path, "Abdera server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

async fn handle(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());
    if declared.is_some_and(|length| length > state.max_body_bytes) {
        return payload_too_large(state.max_body_bytes);
    }

    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            return payload_too_large(state.max_body_bytes);
        }
    };

    let head = parts.method == Method::HEAD;
    let uri = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path().to_string(), |target| target.as_str().to_string());
    let context = RequestContext::new(parts.method, uri)
        .with_headers(parts.headers)
        .with_body(bytes.to_vec());

    let provider = Arc::clone(&state.provider);
    let response = match tokio::task::spawn_blocking(move || provider.process(&context)).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Request processing task failed");
            ResponseContext::server_error("request processing failed")
        }
    };

    to_http(&response, head)
}

fn payload_too_large(limit: usize) -> Response {
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        format!("request body exceeds {limit} bytes"),
    )
        .into_response()
}

/// Convert a response context, dropping the body for HEAD.
fn to_http(response: &ResponseContext, head: bool) -> Response {
    let mut builder = Response::builder().status(response.status());
    if let Some(location) = response.location() {
        builder = builder.header(LOCATION, location);
    }
    if let Some(location) = response.content_location() {
        builder = builder.header(CONTENT_LOCATION, location);
    }
    if let Some(content_type) = response.content_type() {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    if let Some(tag) = response.entity_tag() {
        builder = builder.header(ETAG, tag);
    }
    if let Some(modified) = response.last_modified() {
        builder = builder.header(LAST_MODIFIED, http_date(&modified));
    }
    if !response.allow().is_empty() {
        let allow: Vec<&str> = response.allow().iter().map(Method::as_str).collect();
        builder = builder.header(ALLOW, allow.join(", "));
    }

    let body = if head {
        Body::empty()
    } else {
        Body::from(response.body_bytes())
    };
    builder.body(body).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid response header");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}
