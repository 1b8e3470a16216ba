//! Prometheus-based monitoring.
//!
//! ```ignore
//! use dsa_coder::metrics::{init_metrics, export_metrics, MetricsCollector, ActionOutcome};
//!
//! init_metrics().expect("Failed to initialize metrics");
//! MetricsCollector::new().record_action("generate", ActionOutcome::Success);
//! let text = export_metrics();
//! ```

pub mod collectors;
pub mod prometheus;

pub use collectors::{ActionOutcome, InFlightGuard, MetricsCollector};
pub use prometheus::{
    export_metrics, init_metrics, metrics_handler, ACTION_REQUESTS_TOTAL, LLM_IN_FLIGHT,
    LLM_LATENCY, LLM_REQUESTS_TOTAL, LLM_TOKENS_TOTAL, REGISTRY,
};
