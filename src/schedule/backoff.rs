use std::time::Duration;

use super::ScheduleConfig;

impl ScheduleConfig {
    /// Delay after the `failures`-th consecutive failure (1-based).
    ///
    /// The first failure waits `base_error_delay`; each further one multiplies
    /// by `backoff_factor`, clamped to `max_error_delay`.
    pub fn error_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let base = self.base_error_delay.as_secs_f64();
        let max = self.max_error_delay.as_secs_f64();
        let exp = (failures - 1).min(i32::MAX as u32) as i32;
        let delay = base * self.backoff_factor.powi(exp);
        if delay.is_nan() || delay >= max {
            return self.max_error_delay;
        }
        Duration::try_from_secs_f64(delay.max(0.0)).unwrap_or(self.max_error_delay)
    }

    /// Delay to the next cadence slot after a success.
    ///
    /// Lands `phase` after the next `period` boundary of wall-clock time
    /// `now_ms`, plus `jitter_unit * jitter` where `jitter_unit` is in `[0, 1)`.
    pub fn cadence_delay(&self, now_ms: i64, jitter_unit: f64) -> Duration {
        let unit = if jitter_unit.is_nan() { 0.0 } else { jitter_unit.clamp(0.0, 1.0) };
        let jitter = Duration::try_from_secs_f64(self.jitter.as_secs_f64() * unit).unwrap_or(self.jitter);
        let period_ms = self.period.as_millis().min(i64::MAX as u128) as i64;
        if period_ms <= 0 {
            return jitter;
        }
        let phase_ms = self.phase.as_millis().min(i64::MAX as u128) as i64;
        let into_slot = now_ms.saturating_sub(phase_ms).rem_euclid(period_ms);
        let wait = Duration::from_millis((period_ms - into_slot) as u64);
        wait.saturating_add(jitter)
    }
}
