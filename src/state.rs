use std::time::Duration;

use crate::render::{ChartStyle, Viewport};
use crate::schedule::ScheduleConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub graph_url: String,
    pub index_url: String,
    pub graph_pixels: u32,
    pub graph_seconds: i64,
    /// Element size in logical pixels, header and footer included.
    pub chart_width: u32,
    pub chart_height: u32,
    pub device_pixel_ratio: f64,
    pub backing_store_ratio: f64,
    pub shadow_offset: u32,
    pub blur_radius: u32,
    pub dot_size: u32,
    pub poll_period_secs: f64,
    pub poll_phase_secs: f64,
    pub poll_jitter_secs: f64,
    pub poll_base_error_secs: f64,
    pub poll_max_error_secs: f64,
    pub resize_debounce_ms: u64,
    pub frame_path: String,
    pub snapshot_path: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            graph_url: std::env::var("GCP_GRAPH_URL").unwrap_or_else(|_| "https://global-mind.org/gcpdot/gcpgraph.php".to_string()),
            index_url: std::env::var("GCP_INDEX_URL").unwrap_or_else(|_| "http://gcpdot.com/gcpindex.php?small=1".to_string()),
            graph_pixels: std::env::var("GCP_GRAPH_PIXELS").ok().and_then(|v| v.parse().ok()).unwrap_or(457),
            graph_seconds: std::env::var("GCP_GRAPH_SECONDS").ok().and_then(|v| v.parse().ok()).unwrap_or(-86400),
            chart_width: std::env::var("CHART_WIDTH").ok().and_then(|v| v.parse().ok()).unwrap_or(457),
            chart_height: std::env::var("CHART_HEIGHT").ok().and_then(|v| v.parse().ok()).unwrap_or(320),
            device_pixel_ratio: std::env::var("DEVICE_PIXEL_RATIO").ok().and_then(|v| v.parse().ok()).unwrap_or(1.0),
            backing_store_ratio: std::env::var("BACKING_STORE_RATIO").ok().and_then(|v| v.parse().ok()).unwrap_or(1.0),
            shadow_offset: std::env::var("SHADOW_OFFSET").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            blur_radius: std::env::var("BLUR_RADIUS").ok().and_then(|v| v.parse().ok()).unwrap_or(6),
            dot_size: std::env::var("DOT_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(15),
            poll_period_secs: std::env::var("POLL_PERIOD_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(60.0),
            poll_phase_secs: std::env::var("POLL_PHASE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(6.0),
            poll_jitter_secs: std::env::var("POLL_JITTER_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30.0),
            poll_base_error_secs: std::env::var("POLL_BASE_ERROR_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(1.0),
            poll_max_error_secs: std::env::var("POLL_MAX_ERROR_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(300.0),
            resize_debounce_ms: std::env::var("RESIZE_DEBOUNCE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(3000),
            frame_path: std::env::var("FRAME_PATH").unwrap_or_else(|_| "out/gcpchart.png".to_string()),
            snapshot_path: std::env::var("SNAPSHOT_PATH").unwrap_or_else(|_| "out/gcpchart.json".to_string()),
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.chart_width,
            height: self.chart_height,
            device_pixel_ratio: self.device_pixel_ratio,
            backing_store_ratio: self.backing_store_ratio,
        }
    }

    pub fn style(&self) -> ChartStyle {
        ChartStyle {
            shadow_offset: self.shadow_offset,
            blur_radius: self.blur_radius,
            dot_size: self.dot_size,
            ..ChartStyle::default()
        }
    }

    pub fn schedule(&self) -> ScheduleConfig {
        ScheduleConfig {
            period: secs(self.poll_period_secs),
            phase: secs(self.poll_phase_secs),
            jitter: secs(self.poll_jitter_secs),
            base_error_delay: secs(self.poll_base_error_secs),
            max_error_delay: secs(self.poll_max_error_secs),
            resize_debounce: Duration::from_millis(self.resize_debounce_ms),
            ..ScheduleConfig::default()
        }
    }
}

/// Seconds from config. Non-positive or NaN is zero; anything past
/// `Duration::MAX` saturates.
fn secs(v: f64) -> Duration {
    if v.is_nan() || v <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(v).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_defaults_follow_reference_cadence() {
        let cfg = Config::from_env();
        let s = cfg.schedule();
        if std::env::var("POLL_MAX_ERROR_SECS").is_err() {
            assert_eq!(s.max_error_delay, Duration::from_secs(300));
        }
        if std::env::var("POLL_PERIOD_SECS").is_err() {
            assert_eq!(s.period, Duration::from_secs(60));
        }
    }

    #[test]
    fn test_negative_durations_collapse_to_zero() {
        assert_eq!(secs(-3.0), Duration::ZERO);
        assert_eq!(secs(f64::NAN), Duration::ZERO);
        assert_eq!(secs(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn test_huge_durations_saturate() {
        assert_eq!(secs(1e30), Duration::MAX);
        assert_eq!(secs(f64::INFINITY), Duration::MAX);

        let mut cfg = Config::from_env();
        cfg.poll_max_error_secs = 1e30;
        cfg.poll_base_error_secs = 1e30;
        cfg.poll_jitter_secs = 1e30;
        let s = cfg.schedule();
        assert_eq!(s.max_error_delay, Duration::MAX);
        assert_eq!(s.error_delay(3), Duration::MAX);
        assert!(s.cadence_delay(0, 0.5) > Duration::from_secs(1_000_000));
    }
}
