//! Recording helpers over the raw Prometheus metrics.
//!
//! Every method is a no-op when [`init_metrics`](super::init_metrics) has not
//! run, so library users and tests never need a registry.

use prometheus::Gauge;

use super::prometheus::{
    ACTION_REQUESTS_TOTAL, LLM_IN_FLIGHT, LLM_LATENCY, LLM_REQUESTS_TOTAL, LLM_TOKENS_TOTAL,
};
use crate::llm::Usage;

/// Result of an action call, as recorded in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Success,
    Invalid,
    Failed,
}

impl ActionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionOutcome::Success => "success",
            ActionOutcome::Invalid => "invalid",
            ActionOutcome::Failed => "failed",
        }
    }
}

/// Holds one unit of an in-flight gauge; the unit is released on drop, so a
/// cancelled call is still accounted for.
#[derive(Debug)]
#[must_use = "the call is counted as finished as soon as the guard is dropped"]
pub struct InFlightGuard {
    gauge: Option<Gauge>,
}

impl InFlightGuard {
    /// Increments `gauge` until the returned guard is dropped.
    pub fn track(gauge: Option<Gauge>) -> Self {
        if let Some(gauge) = &gauge {
            gauge.inc();
        }
        Self { gauge }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Some(gauge) = &self.gauge {
            gauge.dec();
        }
    }
}

/// Metrics collector for recording dsa-coder operational metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    /// Record one action call.
    pub fn record_action(&self, operation: &str, outcome: ActionOutcome) {
        if let Some(counter) = ACTION_REQUESTS_TOTAL.get() {
            counter
                .with_label_values(&[operation, outcome.as_str()])
                .inc();
        }

        tracing::trace!(
            operation = operation,
            outcome = outcome.as_str(),
            "Recorded action metric"
        );
    }

    /// Mark a model call as started. The call stays in flight until the
    /// returned guard is dropped.
    pub fn llm_call_started(&self) -> InFlightGuard {
        InFlightGuard::track(LLM_IN_FLIGHT.get().cloned())
    }

    /// Record a finished model call.
    ///
    /// # Arguments
    ///
    /// * `template` - Prompt template name ("generation" or "regeneration")
    /// * `success` - Whether the provider returned a reply
    /// * `latency_secs` - Wall-clock time of the call
    /// * `usage` - Token usage, when the provider reported it
    pub fn llm_call_finished(
        &self,
        template: &str,
        success: bool,
        latency_secs: f64,
        usage: Option<&Usage>,
    ) {
        let status = if success { "success" } else { "failure" };

        if let Some(requests) = LLM_REQUESTS_TOTAL.get() {
            requests.with_label_values(&[template, status]).inc();
        }

        if let Some(latency) = LLM_LATENCY.get() {
            latency.with_label_values(&[template]).observe(latency_secs);
        }

        if let (Some(tokens), Some(usage)) = (LLM_TOKENS_TOTAL.get(), usage) {
            tokens
                .with_label_values(&["input"])
                .inc_by(f64::from(usage.prompt_tokens));
            tokens
                .with_label_values(&["output"])
                .inc_by(f64::from(usage.completion_tokens));
        }
    }
}
