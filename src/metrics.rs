//! Metrics module for KMS-backed primitives
//!
//! Operation latencies and failure counts are reported through the [`metrics`] facade, so
//! they go wherever the application's installed recorder sends them and cost nothing when no
//! recorder is installed. Collection can be switched off with [`disable_metrics`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

// Global flag to check if metrics are enabled
static METRICS_ENABLED: AtomicBool = AtomicBool::new(true);

/// Enable metrics collection
pub fn enable_metrics() {
    METRICS_ENABLED.store(true, Ordering::SeqCst);
}

/// Disable metrics collection
pub fn disable_metrics() {
    METRICS_ENABLED.store(false, Ordering::SeqCst);
}

/// Check if metrics are enabled
pub fn metrics_enabled() -> bool {
    METRICS_ENABLED.load(Ordering::SeqCst)
}

/// Increment a failure counter labelled with the KMS it came from
pub fn increment_failure(name: &'static str, kms: &'static str) {
    if metrics_enabled() {
        ::metrics::counter!(name, 1, "kms" => kms);
    }
}

/// Timer for measuring and recording operation duration
///
/// The elapsed time is recorded as a histogram in seconds when the timer is dropped.
#[derive(Debug)]
pub struct Timer {
    /// Name of the histogram
    name: &'static str,

    /// KMS label
    kms: &'static str,

    /// Start time of the operation
    start: Instant,
}

impl Timer {
    /// Create a new timer with the given name and KMS label
    pub fn new(name: &'static str, kms: &'static str) -> Self {
        Self {
            name,
            kms,
            start: Instant::now(),
        }
    }

    /// Record the elapsed time
    pub fn observe_duration(&self) {
        let seconds = self.start.elapsed().as_secs_f64();
        ::metrics::histogram!(self.name, seconds, "kms" => self.kms);
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.observe_duration();
    }
}

/// Macro for creating a timer that records on drop
///
/// Evaluates to `None` while metrics are disabled.
#[macro_export]
macro_rules! timer {
    ($name:expr) => {
        $crate::timer!($name, "kms" => "unknown")
    };
    ($name:expr, "kms" => $kms:expr) => {{
        if $crate::metrics::metrics_enabled() {
            Some($crate::metrics::Timer::new($name, $kms))
        } else {
            None
        }
    }};
}
