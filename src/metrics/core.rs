//! Stage timing helpers

use std::time::Instant;

use super::stage_metric;

/// A timing guard that records the stage duration when dropped
///
/// The histogram is `sensor_stage_duration_seconds{stage=...}`.
pub struct TimingGuard {
    start: Instant,
    stage: &'static str,
}

impl TimingGuard {
    pub fn new(stage: &'static str) -> Self {
        Self {
            start: Instant::now(),
            stage,
        }
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Record now instead of at end of scope
    pub fn finish(self) {}
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        ::metrics::histogram!(stage_metric!(histogram, "stage", "duration_seconds"), "stage" => self.stage)
            .record(duration);
    }
}

/// Usage:
/// ```rust
/// let _timing = sensor_insights::metrics::time_stage("derive");
/// // ... do work ...
/// // Duration is recorded when _timing goes out of scope
/// ```
pub fn time_stage(stage: &'static str) -> TimingGuard {
    TimingGuard::new(stage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_timing_guard_measures_elapsed() {
        let guard = time_stage("test");
        thread::sleep(Duration::from_millis(5));
        assert!(guard.elapsed_secs() >= 0.005);
        guard.finish();
    }
}
