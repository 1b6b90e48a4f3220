//! Configuration metrics tracking using OpenTelemetry.

use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::time::Instant;

/// Metrics collector for reload and save operations.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_props::metrics::ConfigMetrics;
/// use opentelemetry::global;
///
/// let meter = global::meter("hotswap-props");
/// let metrics = ConfigMetrics::new(meter);
///
/// // Track a reload operation
/// let timer = metrics.start_reload();
/// // ... perform reload ...
/// metrics.record_reload_applied(timer);
/// ```
#[derive(Clone)]
pub struct ConfigMetrics {
    reload_attempts: Counter<u64>,
    reload_applied: Counter<u64>,
    reload_unchanged: Counter<u64>,
    reload_failures: Counter<u64>,
    reload_duration: Histogram<f64>,
    save_success: Counter<u64>,
    save_failures: Counter<u64>,
    active_subscribers: Gauge<i64>,
}

impl ConfigMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let reload_attempts = meter
            .u64_counter("hotswap_props.reload.attempts")
            .with_description("Total number of reload attempts")
            .build();

        let reload_applied = meter
            .u64_counter("hotswap_props.reload.applied")
            .with_description("Reloads that changed the configuration model")
            .build();

        let reload_unchanged = meter
            .u64_counter("hotswap_props.reload.unchanged")
            .with_description("Reloads skipped because the file content was unchanged")
            .build();

        let reload_failures = meter
            .u64_counter("hotswap_props.reload.failures")
            .with_description("Number of failed reloads")
            .build();

        let reload_duration = meter
            .f64_histogram("hotswap_props.reload.duration")
            .with_description("Duration of reload operations in seconds")
            .with_unit("s")
            .build();

        let save_success = meter
            .u64_counter("hotswap_props.save.success")
            .with_description("Number of successful saves")
            .build();

        let save_failures = meter
            .u64_counter("hotswap_props.save.failures")
            .with_description("Number of failed saves")
            .build();

        let active_subscribers = meter
            .i64_gauge("hotswap_props.subscribers.active")
            .with_description("Number of active reload subscribers")
            .build();

        Self {
            reload_attempts,
            reload_applied,
            reload_unchanged,
            reload_failures,
            reload_duration,
            save_success,
            save_failures,
            active_subscribers,
        }
    }

    /// Start a reload operation timer.
    ///
    /// Pass the returned `Instant` to one of the `record_reload_*` methods.
    pub fn start_reload(&self) -> Instant {
        self.reload_attempts.add(1, &[]);
        Instant::now()
    }

    /// Record a reload that pushed new values into the model.
    pub fn record_reload_applied(&self, start: Instant) {
        self.reload_applied.add(1, &[]);
        self.reload_duration.record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record a reload that found the file unchanged.
    pub fn record_reload_unchanged(&self, start: Instant) {
        self.reload_unchanged.add(1, &[]);
        self.reload_duration.record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record a failed reload operation.
    pub fn record_reload_failure(&self, start: Instant) {
        self.reload_failures.add(1, &[]);
        self.reload_duration.record(start.elapsed().as_secs_f64(), &[]);
    }

    /// Record the outcome of a save.
    pub fn record_save(&self, success: bool) {
        if success {
            self.save_success.add(1, &[]);
        } else {
            self.save_failures.add(1, &[]);
        }
    }

    /// Update the number of active subscribers.
    pub fn update_subscriber_count(&self, count: i64) {
        self.active_subscribers.record(count, &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::global;

    #[test]
    fn test_metrics_creation() {
        let meter = global::meter("test");
        let metrics = ConfigMetrics::new(meter);

        // Test basic operations don't panic
        let timer = metrics.start_reload();
        metrics.record_reload_applied(timer);

        let timer = metrics.start_reload();
        metrics.record_reload_unchanged(timer);

        let timer = metrics.start_reload();
        metrics.record_reload_failure(timer);

        metrics.record_save(true);
        metrics.record_save(false);
        metrics.update_subscriber_count(3);
    }

    #[test]
    fn test_metrics_clone() {
        let metrics = ConfigMetrics::new(global::meter("test"));
        let metrics2 = metrics.clone();

        let timer1 = metrics.start_reload();
        let timer2 = metrics2.start_reload();

        metrics.record_reload_applied(timer1);
        metrics2.record_reload_unchanged(timer2);
    }
}
