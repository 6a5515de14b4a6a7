use std::ops::Range;

use crate::series::{QuantileRecord, Series};

/// Rows of one column touched by a render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpan {
    pub column: u32,
    pub rows: Range<u32>,
}

/// Chart and shadow alpha planes, one byte per pixel, row major.
#[derive(Debug, Clone)]
pub struct AlphaMasks {
    pub width: u32,
    pub height: u32,
    pub chart: Vec<u8>,
    pub shadow: Vec<u8>,
    /// Every column/row range written, in series order.
    pub spans: Vec<ColumnSpan>,
}

impl AlphaMasks {
    pub fn chart_at(&self, x: u32, y: u32) -> u8 {
        self.chart[offset(self.width, x, y)]
    }

    pub fn shadow_at(&self, x: u32, y: u32) -> u8 {
        self.shadow[offset(self.width, x, y)]
    }
}

/// Row-major index, widened before multiplying.
fn offset(width: u32, x: u32, y: u32) -> usize {
    y as usize * width as usize + x as usize
}

/// Nudge a near-invisible band in the lower half up by one pixel.
pub fn adjust_record(rec: &QuantileRecord, inv_h: f64) -> QuantileRecord {
    let mut out = *rec;
    if out.span() < inv_h && out.top > 0.5 {
        out.top -= inv_h;
    }
    out
}

/// Rows `floor(top * h) .. y < bottom * h`, clipped to the canvas.
pub fn band_rows(rec: &QuantileRecord, height: u32) -> Range<u32> {
    let h = height as f64;
    let start = (rec.top * h).floor().max(0.0).min(h) as u32;
    let end = (rec.bottom * h).ceil().max(0.0).min(h) as u32;
    start..end.max(start)
}

/// Opacity of normalized row `ys` within the (already adjusted) band.
///
/// Solid between `q1` and `q3` or when the whole band is under 1.5 px,
/// ramping linearly to zero at `top` and `bottom`.
pub fn band_alpha(rec: &QuantileRecord, ys: f64, inv_h: f64) -> f64 {
    let a = if (ys > rec.q1 && ys <= rec.q3) || rec.span() < inv_h * 1.5 {
        1.0
    } else if ys > rec.top && ys <= rec.q1 {
        (ys - rec.top) / (rec.q1 - rec.top)
    } else if ys > rec.q3 && ys <= rec.bottom {
        (rec.bottom - ys) / (rec.bottom - rec.q3)
    } else {
        0.0
    };
    if a.is_nan() {
        0.0
    } else {
        a.clamp(0.0, 1.0)
    }
}

fn to_byte(a: f64) -> u8 {
    (a * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Build both alpha planes for a screen-space series.
///
/// Records whose column falls outside `width` are ignored. The shadow
/// plane holds `alpha.powf(shadow_exponent)`, ready for blurring.
pub fn build_alpha_masks(series: &Series, width: u32, height: u32, shadow_exponent: f64) -> AlphaMasks {
    let len = width as usize * height as usize;
    let mut masks = AlphaMasks {
        width,
        height,
        chart: vec![0; len],
        shadow: vec![0; len],
        spans: Vec::new(),
    };
    if width == 0 || height == 0 {
        return masks;
    }

    let h = height as f64;
    let inv_h = 1.0 / h;
    for raw in series {
        if raw.index >= width {
            continue;
        }
        let rec = adjust_record(raw, inv_h);
        let rows = band_rows(&rec, height);
        if rows.is_empty() {
            continue;
        }
        for y in rows.clone() {
            let a = band_alpha(&rec, y as f64 / h, inv_h);
            let i = offset(width, rec.index, y);
            masks.chart[i] = to_byte(a);
            masks.shadow[i] = to_byte(a.powf(shadow_exponent));
        }
        masks.spans.push(ColumnSpan { column: rec.index, rows });
    }
    masks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(index: u32, t: f64, q1: f64, q3: f64, b: f64) -> QuantileRecord {
        QuantileRecord { index, average: (q1 + q3) / 2.0, top: t, q1, q3, bottom: b }
    }

    #[test]
    fn test_core_is_opaque_and_edges_ramp() {
        // h = 64: top 16, q1 32, q3 48, bottom 56
        let s = Series::new(vec![rec(0, 0.25, 0.5, 0.75, 0.875)]);
        let m = build_alpha_masks(&s, 4, 64, 0.75);
        assert_eq!(m.chart_at(0, 15), 0);
        assert_eq!(m.chart_at(0, 16), 0);
        assert_eq!(m.chart_at(0, 24), 128);
        assert_eq!(m.chart_at(0, 40), 255);
        assert_eq!(m.chart_at(0, 52), 128);
        assert_eq!(m.chart_at(0, 56), 0);
        assert_eq!(m.chart_at(1, 40), 0);
        assert_eq!(m.spans, vec![ColumnSpan { column: 0, rows: 16..56 }]);
    }

    #[test]
    fn test_shadow_is_softened_power() {
        let s = Series::new(vec![rec(0, 0.25, 0.5, 0.75, 0.875)]);
        let m = build_alpha_masks(&s, 1, 64, 0.75);
        // a = 0.5 -> 0.5^0.75 = 0.5946 -> 152
        assert_eq!(m.shadow_at(0, 24), 152);
        assert_eq!(m.shadow_at(0, 40), 255);
        assert!(m.shadow_at(0, 20) > m.chart_at(0, 20));
    }

    #[test]
    fn test_thin_low_band_gets_one_pixel() {
        // h = 64 keeps the arithmetic exact: 0.625 * 64 = 40
        let s = Series::new(vec![rec(2, 0.625, 0.625, 0.625, 0.625)]);
        let m = build_alpha_masks(&s, 4, 64, 0.75);
        assert_eq!(m.spans, vec![ColumnSpan { column: 2, rows: 39..40 }]);
        assert_eq!(m.chart_at(2, 39), 255);
    }

    #[test]
    fn test_thin_high_band_is_not_nudged() {
        let s = Series::new(vec![rec(0, 0.25, 0.25, 0.25, 0.25)]);
        let m = build_alpha_masks(&s, 1, 64, 0.75);
        assert!(m.spans.is_empty());
        assert!(m.chart.iter().all(|&a| a == 0));
    }

    #[test]
    fn test_out_of_range_columns_and_rows_clip() {
        let s = Series::new(vec![rec(9, 0.1, 0.2, 0.3, 0.4), rec(0, -0.5, 0.0, 1.0, 1.5)]);
        let m = build_alpha_masks(&s, 4, 10, 0.75);
        assert_eq!(m.spans, vec![ColumnSpan { column: 0, rows: 0..10 }]);
    }

    #[test]
    fn test_inverted_band_does_not_panic() {
        let s = Series::new(vec![rec(0, 0.8, 0.6, 0.4, 0.2)]);
        let m = build_alpha_masks(&s, 1, 100, 0.75);
        // bottom above top: no rows at all
        assert!(m.spans.is_empty());
        let s = Series::new(vec![rec(0, 0.2, 0.6, 0.4, 0.8)]);
        let m = build_alpha_masks(&s, 1, 100, 0.75);
        assert_eq!(m.spans.len(), 1);
    }

    #[test]
    fn test_zero_sized_canvas() {
        let s = Series::new(vec![rec(0, 0.2, 0.4, 0.6, 0.8)]);
        let m = build_alpha_masks(&s, 0, 0, 0.75);
        assert!(m.chart.is_empty());
        assert!(m.spans.is_empty());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_offset_past_u32_range() {
        // 70_000 * 70_000 overflows u32
        assert_eq!(offset(70_000, 5, 70_000), 4_900_000_005);
        assert_eq!(offset(600, 3, 2), 1203);
    }
}
