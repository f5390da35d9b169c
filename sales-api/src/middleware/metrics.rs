//! Prometheus request metrics, recorded by [`track_metrics`] and served on
//! the debug listener as text exposition and as a JSON summary.

use std::sync::Arc;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{core::Collector, Encoder, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::recover::Panicked;

const LABELS: &[&str] = &["method", "path", "status"];

/// Path label for requests that matched no route.
const UNMATCHED_PATH: &str = "unmatched";

#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    requests_total: IntCounterVec,
    errors_total: IntCounterVec,
    panics_total: IntCounterVec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub panics: u64,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl ApiMetrics {
    pub fn new() -> Result<Self, AppError> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("sales_http_requests_total", "Total HTTP requests"),
            LABELS,
        )?;
        let errors_total = IntCounterVec::new(
            Opts::new("sales_http_errors_total", "Total HTTP responses with a 4xx or 5xx status"),
            LABELS,
        )?;
        let panics_total = IntCounterVec::new(
            Opts::new("sales_http_panics_total", "Handler panics recovered by the pipeline"),
            &["method", "path"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(panics_total.clone()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                registry,
                requests_total,
                errors_total,
                panics_total,
            }),
        })
    }

    fn record(&self, method: &str, path: &str, status: u16, panicked: bool) {
        let status = status.to_string();
        let labels = [method, path, status.as_str()];

        self.inner.requests_total.with_label_values(&labels).inc();
        if status.starts_with('4') || status.starts_with('5') {
            self.inner.errors_total.with_label_values(&labels).inc();
        }
        if panicked {
            self.inner.panics_total.with_label_values(&[method, path]).inc();
        }
    }

    /// Totals summed across every label set.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: sum(&self.inner.requests_total),
            errors: sum(&self.inner.errors_total),
            panics: sum(&self.inner.panics_total),
        }
    }

    /// Prometheus text exposition of the whole registry.
    pub fn encode(&self) -> Result<String, AppError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.inner.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| AppError::Internal(format!("metrics encoding produced invalid UTF-8: {e}")))
    }
}

fn sum(counter: &IntCounterVec) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .map(|metric| metric.get_counter().get_value() as u64)
        .sum()
}

pub async fn track_metrics(State(metrics): State<ApiMetrics>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());

    let response = next.run(request).await;

    let panicked = response.extensions().get::<Panicked>().is_some();
    metrics.record(&method, &path, response.status().as_u16(), panicked);

    response
}
