//! Color ramp for the headline dot.
//!
//! The ramp maps the network "high" value onto a perceptually ordered set of
//! colors, gray for a quiet network through red, yellow and green up to blue
//! and violet for unusually coherent readings.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn from_u32(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    pub fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// `#rrggbb`, lower case, zero padded.
    pub fn to_hex(self) -> String {
        format!("#{:06x}", self.to_u32())
    }

    pub fn parse_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_u32)
    }

    /// Channel-wise lerp in 8-bit space, rounding half up.
    pub fn lerp(self, other: Rgb, factor: f64) -> Rgb {
        let mix = |a: u8, b: u8| -> u8 {
            let v = (a as f64 + factor * (b as f64 - a as f64) + 0.5).floor();
            v.clamp(0.0, 255.0) as u8
        };
        Rgb {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub threshold: f64,
    pub color: Rgb,
}

const fn stop(threshold: f64, hex: u32) -> ColorStop {
    ColorStop {
        threshold,
        color: Rgb::from_u32(hex),
    }
}

pub const RAMP: [ColorStop; 14] = [
    stop(0.00, 0xCDCDCD),   // gray
    stop(0.01, 0xFFA8C0),   // pink
    stop(0.05, 0xFF1E1E),   // red
    stop(0.08, 0xFFB82E),   // orange
    stop(0.15, 0xFFD517),   // orange yellow
    stop(0.23, 0xFFFA40),   // yellow
    stop(0.30, 0xF9FA00),   // yellow green
    stop(0.40, 0xAEFA00),   // light green
    stop(0.90, 0x64FA64),   // green
    stop(0.9125, 0x64FAAB), // teal
    stop(0.93, 0xACF2FF),   // light teal
    stop(0.96, 0x0EEEFF),   // light blue
    stop(0.98, 0x24CBFD),   // blue
    stop(1.00, 0x5655CA),   // violet
];

/// Headline reading derived from the coarse "high" value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorReading {
    pub color: String,
    pub percentage: String,
    pub high: f64,
}

impl ColorReading {
    pub fn from_high(high: f64) -> Self {
        let (color, percentage) = map_to_color_and_percentage(high);
        Self {
            color: color.to_hex(),
            percentage,
            high,
        }
    }
}

/// Piecewise-linear lookup over [`RAMP`].
///
/// The input is clamped to `[0, 1]` (NaN reads as 0) so the interpolation
/// factor always stays inside its bracket. Anything at or above the last
/// threshold takes the last color.
pub fn map_to_color_and_percentage(value: f64) -> (Rgb, String) {
    let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };

    for pair in RAMP.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if value >= start.threshold && value < end.threshold {
            let factor = (value - start.threshold) / (end.threshold - start.threshold);
            return (start.color.lerp(end.color, factor), format_percentage(value));
        }
    }

    (RAMP[RAMP.len() - 1].color, format_percentage(1.0))
}

/// `value * 100` to two decimals. Exact halves round up rather than to even.
fn format_percentage(value: f64) -> String {
    let pct = value * 100.0;
    // an exact third-decimal 5 is a multiple of 1/8
    let eighths = pct * 8.0;
    let exact_half = eighths.fract() == 0.0 && (eighths as i64 * 125) % 10 == 5;
    if exact_half {
        format!("{:.2}", pct + 0.005)
    } else {
        format!("{:.2}", pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_thresholds_map_exactly() {
        for s in RAMP.iter() {
            let (color, _) = map_to_color_and_percentage(s.threshold);
            assert_eq!(color, s.color, "threshold {}", s.threshold);
        }
    }

    #[test]
    fn test_percentage_is_scaled_input() {
        for i in 0..=1000 {
            let v = i as f64 / 1000.0;
            let (_, pct) = map_to_color_and_percentage(v);
            assert_eq!(pct, format!("{:.2}", v * 100.0));
        }
    }

    #[test]
    fn test_percentage_ties_round_up() {
        assert_eq!(map_to_color_and_percentage(0.12125).1, "12.13");
        assert_eq!(map_to_color_and_percentage(0.00125).1, "0.13");
        assert_eq!(map_to_color_and_percentage(0.30125).1, "30.13");
        assert_eq!(map_to_color_and_percentage(0.12375).1, "12.38");
        assert_eq!(map_to_color_and_percentage(0.1225).1, "12.25");
        // not a tie once scaled: 0.1234 * 100 rounds down normally
        assert_eq!(map_to_color_and_percentage(0.1234).1, "12.34");
    }

    #[test]
    fn test_over_range_takes_last_stop() {
        let (color, pct) = map_to_color_and_percentage(1.2);
        assert_eq!(color, Rgb::from_u32(0x5655CA));
        assert_eq!(pct, "100.00");
    }

    #[test]
    fn test_negative_clamps_to_first_stop() {
        let (color, pct) = map_to_color_and_percentage(-0.3);
        assert_eq!(color, Rgb::from_u32(0xCDCDCD));
        assert_eq!(pct, "0.00");
    }

    #[test]
    fn test_midpoint_interpolation() {
        // halfway between red (0.05) and orange (0.08)
        let (color, _) = map_to_color_and_percentage(0.065);
        // r: 255, g: 0x1e + 0.5*(0xb8-0x1e) = 30 + 77 = 107, b: 30 + 0.5*16 = 38
        assert_eq!(color.r, 255);
        assert!((color.g as i32 - 107).abs() <= 1);
        assert!((color.b as i32 - 38).abs() <= 1);
    }

    #[test]
    fn test_hex_zero_padded() {
        assert_eq!(Rgb::from_u32(0x0000ff).to_hex(), "#0000ff");
        assert_eq!(Rgb::parse_hex("#0EEEFF"), Some(Rgb::from_u32(0x0eeeff)));
        assert_eq!(Rgb::parse_hex("#abc"), None);
    }

    #[test]
    fn test_reading_serializes_api_shape() {
        let reading = ColorReading::from_high(0.5);
        let v = serde_json::to_value(&reading).unwrap();
        assert_eq!(v["percentage"], "50.00");
        assert!(v["color"].as_str().unwrap().starts_with('#'));
        assert_eq!(v["high"], 0.5);
    }
}
