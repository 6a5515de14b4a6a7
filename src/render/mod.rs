//! Data-to-pixels pipeline: gradient backdrop, per-column alpha masks,
//! stack-blurred shadow and the compositor that ties them together.

use serde::{Deserialize, Serialize};

pub mod blur;
pub mod compositor;
pub mod frame;
pub mod gradient;
pub mod mask;
pub mod overlay;

pub use compositor::Compositor;
pub use frame::Frame;
pub use overlay::{ChartLayout, HoverReadout, LabelAnchor, LabelBox};

/// Element geometry as the host reports it, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Element width.
    pub width: u32,
    /// Element height, header and footer included.
    pub height: u32,
    pub device_pixel_ratio: f64,
    pub backing_store_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: 1.0,
            backing_store_ratio: 1.0,
        }
    }

    pub fn with_ratios(mut self, device_pixel_ratio: f64, backing_store_ratio: f64) -> Self {
        self.device_pixel_ratio = device_pixel_ratio;
        self.backing_store_ratio = backing_store_ratio;
        self
    }

    /// Logical-to-backing scale. 1 unless the two ratios differ.
    pub fn scale(&self) -> f64 {
        let g = sane_ratio(self.device_pixel_ratio);
        let b = sane_ratio(self.backing_store_ratio);
        if g == b {
            1.0
        } else {
            g / b
        }
    }

    pub fn layout(&self) -> ChartLayout {
        ChartLayout::for_element(self.width, self.height)
    }

    /// Canvas size in backing pixels.
    pub fn backing(&self) -> Backing {
        let layout = self.layout();
        let scale = self.scale();
        Backing {
            width: scaled(layout.canvas.width, scale),
            height: scaled(layout.canvas.height, scale),
            scale,
        }
    }
}

fn sane_ratio(r: f64) -> f64 {
    if r.is_finite() && r > 0.0 {
        r
    } else {
        1.0
    }
}

fn scaled(v: f64, scale: f64) -> u32 {
    let px = (v * scale).floor();
    if px.is_finite() && px > 0.0 {
        px as u32
    } else {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backing {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

impl Backing {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartStyle {
    /// Shadow displacement, backing pixels, applied down and right.
    pub shadow_offset: u32,
    pub blur_radius: u32,
    /// Half the dot is kept clear at the right edge of the graph.
    pub dot_size: u32,
    pub shadow_exponent: f64,
    /// Backdrop of the shadow surface, RGBA.
    pub shadow_backdrop: [u8; 4],
    /// Page color behind everything when flattening.
    pub page_backdrop: [u8; 4],
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            shadow_offset: 10,
            blur_radius: 6,
            dot_size: 15,
            shadow_exponent: 0.75,
            shadow_backdrop: [64, 64, 64, 230],
            page_backdrop: [255, 255, 255, 255],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backing_matches_logical_when_ratios_agree() {
        let vp = Viewport::new(600, 340).with_ratios(2.0, 2.0);
        let b = vp.backing();
        assert_eq!(b.scale, 1.0);
        assert_eq!((b.width, b.height), (600, 300));
    }

    #[test]
    fn test_backing_scales_on_retina() {
        let vp = Viewport::new(300, 240).with_ratios(2.0, 1.0);
        let b = vp.backing();
        assert_eq!(b.scale, 2.0);
        assert_eq!((b.width, b.height), (600, 400));
    }

    #[test]
    fn test_degenerate_viewport_is_empty() {
        assert!(Viewport::new(0, 100).backing().is_empty());
        // height below header + footer
        assert!(Viewport::new(100, 30).backing().is_empty());
        let vp = Viewport::new(100, 100).with_ratios(f64::NAN, 0.0);
        assert_eq!(vp.scale(), 1.0);
    }
}
