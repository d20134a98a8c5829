//! Metrics recording implementation using Prometheus.

use prometheus::{
    register_counter_vec_with_registry, register_histogram_vec_with_registry, CounterVec,
    Encoder, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Trait for recording application metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records a login attempt with its outcome.
    fn record_login(&self, result: &str);

    /// Records an account registration attempt with its outcome.
    fn record_registration(&self, result: &str);

    /// Records the outcome of a bearer token verification.
    fn record_token_verification(&self, result: &str);

    /// Records an authorization gate decision.
    fn record_authorization(&self, resource: &str, action: &str, outcome: &str);

    /// Records how long a bcrypt hash or verify took.
    fn record_hash_duration(&self, operation: &str, duration_secs: f64);
}

/// Prometheus metrics collector.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    logins_total: CounterVec,
    registrations_total: CounterVec,
    token_verifications_total: CounterVec,
    authorization_decisions_total: CounterVec,
    password_hash_duration_seconds: HistogramVec,
}

impl Metrics {
    /// Creates a new metrics instance with its own Prometheus registry.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let logins_total = register_counter_vec_with_registry!(
            Opts::new("logins_total", "Total number of login attempts"),
            &["result"],
            registry.clone()
        )
        .expect("Failed to register logins_total");

        let registrations_total = register_counter_vec_with_registry!(
            Opts::new("registrations_total", "Total number of registration attempts"),
            &["result"],
            registry.clone()
        )
        .expect("Failed to register registrations_total");

        let token_verifications_total = register_counter_vec_with_registry!(
            Opts::new(
                "token_verifications_total",
                "Total number of bearer token verifications"
            ),
            &["result"],
            registry.clone()
        )
        .expect("Failed to register token_verifications_total");

        let authorization_decisions_total = register_counter_vec_with_registry!(
            Opts::new(
                "authorization_decisions_total",
                "Authorization gate decisions per resource and action"
            ),
            &["resource", "action", "outcome"],
            registry.clone()
        )
        .expect("Failed to register authorization_decisions_total");

        // bcrypt at cost 14 sits around one second on common hardware.
        let password_hash_duration_seconds = register_histogram_vec_with_registry!(
            "password_hash_duration_seconds",
            "Duration of password hashing and verification in seconds",
            &["operation"],
            vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0],
            registry.clone()
        )
        .expect("Failed to register password_hash_duration_seconds");

        Metrics {
            registry,
            logins_total,
            registrations_total,
            token_verifications_total,
            authorization_decisions_total,
            password_hash_duration_seconds,
        }
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .expect("Failed to encode metrics");
        String::from_utf8(buffer).expect("Metrics encoding produced invalid UTF-8")
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for Metrics {
    fn record_login(&self, result: &str) {
        self.logins_total.with_label_values(&[result]).inc();
    }

    fn record_registration(&self, result: &str) {
        self.registrations_total.with_label_values(&[result]).inc();
    }

    fn record_token_verification(&self, result: &str) {
        self.token_verifications_total
            .with_label_values(&[result])
            .inc();
    }

    fn record_authorization(&self, resource: &str, action: &str, outcome: &str) {
        self.authorization_decisions_total
            .with_label_values(&[resource, action, outcome])
            .inc();
    }

    fn record_hash_duration(&self, operation: &str, duration_secs: f64) {
        self.password_hash_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }
}
