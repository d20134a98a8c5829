//! Prometheus metrics for logins, registrations, token checks and
//! authorization decisions.

mod recorder;

pub use recorder::{Metrics, MetricsRecorder};
