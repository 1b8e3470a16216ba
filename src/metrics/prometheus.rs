//! Prometheus metrics registration and export.
//!
//! Defines the metrics exported by the dsa-coder service and the functions
//! for initializing and encoding them.

use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::{Mutex, OnceLock};

/// Serializes initialization so all statics come from one registry.
static INIT_LOCK: Mutex<()> = Mutex::new(());

/// Global Prometheus registry for all dsa-coder metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Action calls, labeled by operation (generate/regenerate) and outcome
/// (success/invalid/failed).
pub static ACTION_REQUESTS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Number of model calls currently awaiting a reply.
pub static LLM_IN_FLIGHT: OnceLock<Gauge> = OnceLock::new();

/// Total LLM API requests, labeled by template and status.
pub static LLM_REQUESTS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// LLM API request latency in seconds, labeled by template.
pub static LLM_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Total tokens used, labeled by type (input/output).
pub static LLM_TOKENS_TOTAL: OnceLock<CounterVec> = OnceLock::new();

/// Initialize all metrics and register them with the registry.
///
/// Call once at startup. Later calls are no-ops.
///
/// # Errors
///
/// Returns a `prometheus::Error` if metric registration fails.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let _guard = INIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    if REGISTRY.get().is_some() {
        return Ok(());
    }

    let registry = Registry::new();

    let action_requests_total = CounterVec::new(
        Opts::new("dsa_coder_action_requests_total", "Total action calls"),
        &["operation", "outcome"],
    )?;

    let llm_in_flight = Gauge::new(
        "dsa_coder_llm_in_flight",
        "Number of model calls awaiting a reply",
    )?;

    let llm_requests_total = CounterVec::new(
        Opts::new("dsa_coder_llm_requests_total", "Total LLM API requests"),
        &["template", "status"],
    )?;

    let llm_latency = HistogramVec::new(
        HistogramOpts::new(
            "dsa_coder_llm_latency_seconds",
            "LLM API request latency in seconds",
        )
        .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["template"],
    )?;

    let llm_tokens_total = CounterVec::new(
        Opts::new("dsa_coder_llm_tokens_total", "Total tokens used"),
        &["type"],
    )?;

    registry.register(Box::new(action_requests_total.clone()))?;
    registry.register(Box::new(llm_in_flight.clone()))?;
    registry.register(Box::new(llm_requests_total.clone()))?;
    registry.register(Box::new(llm_latency.clone()))?;
    registry.register(Box::new(llm_tokens_total.clone()))?;

    let _ = REGISTRY.set(registry);
    let _ = ACTION_REQUESTS_TOTAL.set(action_requests_total);
    let _ = LLM_IN_FLIGHT.set(llm_in_flight);
    let _ = LLM_REQUESTS_TOTAL.set(llm_requests_total);
    let _ = LLM_LATENCY.set(llm_latency);
    let _ = LLM_TOKENS_TOTAL.set(llm_tokens_total);

    tracing::info!("Prometheus metrics initialized successfully");

    Ok(())
}

/// Export all registered metrics in Prometheus text format.
///
/// Returns a comment line instead of failing when the registry has not been
/// initialized or encoding fails.
pub fn export_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return "# Metrics not initialized. Call init_metrics() first.\n".to_string();
    };

    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return format!("# Error encoding metrics: {}\n", e);
    }

    String::from_utf8(buffer)
        .unwrap_or_else(|e| format!("# Error converting metrics to UTF-8: {}\n", e))
}

/// HTTP handler for the /metrics endpoint.
pub async fn metrics_handler() -> String {
    export_metrics()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics_is_repeatable() {
        assert!(init_metrics().is_ok());
        let second = init_metrics();
        assert!(second.is_ok());
        assert!(REGISTRY.get().is_some());
    }

    #[test]
    fn test_export_after_init() {
        let _ = init_metrics();
        if let Some(counter) = ACTION_REQUESTS_TOTAL.get() {
            counter.with_label_values(&["generate", "success"]).inc();
        }

        let metrics = export_metrics();
        assert!(!metrics.starts_with("# Error"));
        assert!(metrics.contains("dsa_coder_action_requests_total"));
    }
}
