//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::FutureExt;
use serde_json::json;
use std::net::{IpAddr, SocketAddr};
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use tickettriage_core::{TicketClassification, TicketRequest};

use crate::rate_limit::RateLimiter;
use crate::security;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .route("/classify_ticket", post(classify_ticket))
        .fallback(fallback)
        .layer(middleware::from_fn(catch_panics))
        .layer(middleware::from_fn(timing))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe; no auth, no rate limit, no dependency checks
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Render Prometheus metrics from the recorder handle
async fn render_metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

/// Main classification handler.
///
/// Order: authenticate, rate-limit, validate bounds, classify. Authentication
/// runs first so traffic with a bad key never consumes an address's quota.
async fn classify_ticket(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<Json<TicketRequest>, JsonRejection>,
) -> Result<Json<TicketClassification>, AppError> {
    metrics::counter!("tickettriage_requests_total").increment(1);

    security::authenticate(&headers, &state.service_api_key).ok_or(AppError::Unauthorized)?;

    check_rate_limit(&state.limiter, client_ip(&headers, addr))?;

    let Json(ticket) = body.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    ticket.validate().map_err(AppError::Validation)?;

    let result = state.classifier.classify(&ticket.text).await.map_err(|err| {
        error!("Error classifying ticket: {}", err);
        AppError::Classification
    })?;

    info!("Ticket classified: {}", result.category.as_str());
    metrics::counter!(
        "tickettriage_classifications_total",
        "category" => result.category.as_str()
    )
    .increment(1);

    Ok(Json(result))
}

/// Consume one unit of the address's quota, or reject with retry-after
fn check_rate_limit(limiter: &RateLimiter, ip: IpAddr) -> Result<(), AppError> {
    limiter.check(ip).map_err(|retry_after| {
        warn!("Rate limit exceeded for {}", ip);
        AppError::RateLimited {
            max_requests: limiter.max_requests(),
            window: limiter.window(),
            retry_after,
        }
    })
}

/// Client identity for rate-limit accounting.
///
/// First hop of X-Forwarded-For when a proxy set it, else the socket address.
fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_else(|| addr.ip())
}

/// Map a panic escaping a handler to the generic 500 body.
///
/// Without this the connection would drop uncaught; the panic payload is
/// logged server-side and never reaches the client.
async fn catch_panics(request: Request, next: Next) -> Response {
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            error!("Unhandled panic in request handler: {}", panic_detail(&panic));
            AppError::Internal.into_response()
        }
    }
}

/// Best-effort text of a panic payload for the server-side log
fn panic_detail(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Add an X-Process-Time header and record request latency
async fn timing(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    metrics::histogram!("tickettriage_request_latency_seconds").record(elapsed);

    if let Ok(value) = HeaderValue::from_str(&format!("{elapsed:.6}")) {
        response.headers_mut().insert("x-process-time", value);
    }
    response
}

async fn fallback() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": "Not found"})),
    )
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    /// Malformed or out-of-bounds request body
    Validation(String),

    /// Missing or incorrect API key
    Unauthorized,

    /// Per-address quota exceeded
    RateLimited {
        max_requests: u32,
        window: Duration,
        retry_after: Duration,
    },

    /// Pipeline exhausted retries or the provider call failed; cause already logged
    Classification,

    /// Anything else; cause already logged
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::FORBIDDEN,
                "unauthorized",
                "Could not validate API key".to_string(),
            ),
            AppError::RateLimited {
                max_requests,
                window,
                ..
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                format!(
                    "Rate limit exceeded: {} requests per {} seconds",
                    max_requests,
                    window.as_secs()
                ),
            ),
            AppError::Classification => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "classification",
                "Error classifying ticket".to_string(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "An unexpected error occurred".to_string(),
            ),
        };

        metrics::counter!("tickettriage_errors_total", "kind" => kind).increment(1);

        let mut response = (status, Json(json!({"message": message}))).into_response();

        if let AppError::RateLimited { retry_after, .. } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
                response.headers_mut().insert("retry-after", value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(
            client_ip(&headers, addr),
            "203.0.113.7".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_client_ip_falls_back_to_socket_addr() {
        let headers = HeaderMap::new();
        let addr: SocketAddr = "192.0.2.4:9000".parse().unwrap();
        assert_eq!(client_ip(&headers, addr), addr.ip());

        // Garbage header falls through to the socket address too
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(client_ip(&headers, addr), addr.ip());
    }
}
