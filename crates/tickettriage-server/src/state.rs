//! Application state shared across all requests

use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tickettriage_core::{OpenAiBackend, Result, TicketClassifier};
use tracing::info;

use crate::config::{Secrets, ServerConfig};
use crate::rate_limit::RateLimiter;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServerConfig>,

    /// Classification pipeline over the configured backend
    pub classifier: Arc<TicketClassifier>,

    /// Per-address rate limiter
    pub limiter: Arc<RateLimiter>,

    /// Key callers must present in the X-API-Key header
    pub service_api_key: Arc<String>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Initialize application state from configuration and secrets
    pub fn new(
        config: ServerConfig,
        secrets: Secrets,
        metrics_handle: PrometheusHandle,
    ) -> Result<Self> {
        info!("Initializing application state");

        let backend = OpenAiBackend::new(
            &config.provider.base_url,
            &secrets.openai_api_key,
            Duration::from_secs(config.provider.timeout_secs),
        )?;

        let classifier = TicketClassifier::new(
            Arc::new(backend),
            &config.provider.model,
            config.provider.max_attempts,
        );

        let limiter = RateLimiter::new(
            config.rate_limit.max_requests,
            Duration::from_secs(config.rate_limit.window_secs),
        );

        info!(
            "Classifier ready: model={}, max_attempts={}",
            config.provider.model, config.provider.max_attempts
        );

        Ok(Self {
            config: Arc::new(config),
            classifier: Arc::new(classifier),
            limiter: Arc::new(limiter),
            service_api_key: Arc::new(secrets.service_api_key),
            metrics_handle,
        })
    }
}
