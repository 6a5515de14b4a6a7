use image::{Rgba, RgbaImage};

use super::ChartStyle;

/// Output of one render pass: the chart surface and the shadow surface
/// beneath it, both at backing resolution.
#[derive(Debug, Clone)]
pub struct Frame {
    pub chart: RgbaImage,
    pub shadow: RgbaImage,
}

impl Frame {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            chart: RgbaImage::new(width, height),
            shadow: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.chart.width()
    }

    pub fn height(&self) -> u32 {
        self.chart.height()
    }

    /// Stack everything the viewer would see into one opaque image:
    /// page, shadow-surface backdrop, blurred shadow, chart.
    pub fn flatten(&self, style: &ChartStyle) -> RgbaImage {
        let (w, h) = self.chart.dimensions();
        let mut out = RgbaImage::from_pixel(w, h, Rgba(style.page_backdrop));
        let backdrop = Rgba(style.shadow_backdrop);
        for px in out.pixels_mut() {
            over(px, backdrop);
        }
        for (dst, src) in out.pixels_mut().zip(self.shadow.pixels()) {
            over(dst, *src);
        }
        for (dst, src) in out.pixels_mut().zip(self.chart.pixels()) {
            over(dst, *src);
        }
        out
    }
}

/// Source-over onto an opaque destination.
#[inline]
fn over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let a = src[3] as u16;
    if a == 0 {
        return;
    }
    for c in 0..3 {
        dst[c] = blend_channel(src[c], dst[c], a);
    }
    dst[3] = 255;
}

/// `(src * a + dst * (255 - a)) / 255` with the shift-based divide.
#[inline]
fn blend_channel(src: u8, dst: u8, alpha: u16) -> u8 {
    let result = src as u16 * alpha + dst as u16 * (255 - alpha);
    ((result + 1 + (result >> 8)) >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_extremes() {
        assert_eq!(blend_channel(200, 10, 255), 200);
        assert_eq!(blend_channel(200, 10, 0), 10);
        let mid = blend_channel(255, 0, 128);
        assert!((127..=129).contains(&mid));
    }

    #[test]
    fn test_flatten_empty_frame_shows_backdrop() {
        let style = ChartStyle::default();
        let frame = Frame::empty(3, 2);
        let out = frame.flatten(&style);
        let px = out.get_pixel(1, 1);
        assert_eq!(px[3], 255);
        // 90% dark gray over white
        assert!((80..=95).contains(&px[0]));
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn test_flatten_opaque_chart_wins() {
        let style = ChartStyle::default();
        let mut frame = Frame::empty(2, 2);
        frame.chart.put_pixel(0, 0, Rgba([0, 223, 0, 255]));
        frame.shadow.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        let out = frame.flatten(&style);
        assert_eq!(*out.get_pixel(0, 0), Rgba([0, 223, 0, 255]));
        assert_ne!(*out.get_pixel(1, 1), Rgba([0, 223, 0, 255]));
    }
}
