//! Metrics collection for the privacy graph engine
//!
//! Counters live in a crate-owned Prometheus registry so embedding
//! applications can expose them next to their own metrics without name
//! clashes in the default registry.

use crate::core::{Error, Result};
use crate::types::ApplyResult;
use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

/// Crate metrics registry
static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Counters describing traversal activity
pub struct Metrics {
    /// Requests by kind (`access`, `deletion`, `apply`) and outcome (`ok`, `error`)
    pub requests: IntCounterVec,
    /// Records returned by the backend, by fetch mode (`one`, `many`)
    pub records_fetched: IntCounterVec,
    /// Handler invocations by kind (`access`, `deletion`)
    pub callbacks: IntCounterVec,
    /// Documents updated by committed change sets
    pub documents_updated: IntCounter,
    /// Documents deleted by committed change sets
    pub documents_deleted: IntCounter,
}

impl Metrics {
    /// Create and register every counter
    pub fn new(registry: &Registry) -> Result<Self> {
        let requests = IntCounterVec::new(
            Opts::new("pg_requests_total", "Privacy requests processed"),
            &["kind", "outcome"],
        )?;
        let records_fetched = IntCounterVec::new(
            Opts::new("pg_records_fetched_total", "Records fetched from storage"),
            &["mode"],
        )?;
        let callbacks = IntCounterVec::new(
            Opts::new("pg_callbacks_total", "Handler invocations"),
            &["kind"],
        )?;
        let documents_updated = IntCounter::new(
            "pg_documents_updated_total",
            "Documents updated by committed change sets",
        )?;
        let documents_deleted = IntCounter::new(
            "pg_documents_deleted_total",
            "Documents deleted by committed change sets",
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(records_fetched.clone()))?;
        registry.register(Box::new(callbacks.clone()))?;
        registry.register(Box::new(documents_updated.clone()))?;
        registry.register(Box::new(documents_deleted.clone()))?;

        Ok(Self {
            requests,
            records_fetched,
            callbacks,
            documents_updated,
            documents_deleted,
        })
    }

    /// Global metrics instance, `None` if registration failed
    pub fn global() -> Option<&'static Metrics> {
        static INSTANCE: Lazy<Option<Metrics>> = Lazy::new(|| match Metrics::new(&REGISTRY) {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                tracing::warn!("Metrics disabled: {}", e);
                None
            }
        });
        INSTANCE.as_ref()
    }
}

/// Register the global counters
pub fn init_registry() -> Result<()> {
    Metrics::global()
        .map(|_| ())
        .ok_or_else(|| Error::Metrics(prometheus::Error::Msg("counter registration failed".into())))
}

/// Crate registry, for exposing through an application's own endpoint
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Count a finished request
pub fn record_request(kind: &str, ok: bool) {
    if let Some(metrics) = Metrics::global() {
        let outcome = if ok { "ok" } else { "error" };
        metrics.requests.with_label_values(&[kind, outcome]).inc();
    }
}

/// Count fetched records
pub fn record_fetch(mode: &str, records: usize) {
    if let Some(metrics) = Metrics::global() {
        metrics
            .records_fetched
            .with_label_values(&[mode])
            .inc_by(records as u64);
    }
}

/// Count a handler invocation
pub fn record_callback(kind: &str) {
    if let Some(metrics) = Metrics::global() {
        metrics.callbacks.with_label_values(&[kind]).inc();
    }
}

/// Count documents changed by an applied change set
pub fn record_applied(result: &ApplyResult) {
    if let Some(metrics) = Metrics::global() {
        metrics.documents_updated.inc_by(result.documents_updated as u64);
        metrics.documents_deleted.inc_by(result.documents_deleted as u64);
    }
}

/// Render the registry in the Prometheus text exposition format
pub fn gather() -> String {
    let encoder = prometheus::TextEncoder::new();
    encoder
        .encode_to_string(&registry().gather())
        .unwrap_or_default()
}
