use image::{Rgba, RgbaImage};

use crate::color::Rgb;

/// Vertical rainbow behind the bands, top to bottom.
pub const GRADIENT_STOPS: [(f64, Rgb); 11] = [
    (0.000, Rgb::from_u32(0xFF00FF)),
    (0.010, Rgb::from_u32(0xFF0000)),
    (0.035, Rgb::from_u32(0xFF4000)),
    (0.060, Rgb::from_u32(0xFF7500)),
    (0.110, Rgb::from_u32(0xFFB000)),
    (0.220, Rgb::from_u32(0xFFFF00)),
    (0.500, Rgb::from_u32(0x00DF00)),
    (0.900, Rgb::from_u32(0x00DF00)),
    (0.940, Rgb::from_u32(0x00EEFF)),
    (0.990, Rgb::from_u32(0x0034F4)),
    (1.000, Rgb::from_u32(0x440088)),
];

/// Gradient color at `t` in `[0, 1]`, 0 being the top edge.
pub fn gradient_color(t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    for pair in GRADIENT_STOPS.windows(2) {
        let ((t0, c0), (t1, c1)) = (pair[0], pair[1]);
        if t <= t1 {
            let span = t1 - t0;
            let f = if span > 0.0 { (t - t0) / span } else { 0.0 };
            return c0.lerp(c1, f);
        }
    }
    GRADIENT_STOPS[GRADIENT_STOPS.len() - 1].1
}

/// Backdrop image in backing pixels.
///
/// Color channels hold the gradient; alpha starts fully transparent and is
/// only raised inside the graph columns of a single render pass.
pub fn build_background_gradient(width: u32, height: u32) -> RgbaImage {
    let mut img = RgbaImage::new(width, height);
    if width == 0 || height == 0 {
        return img;
    }
    for y in 0..height {
        let c = gradient_color((y as f64 + 0.5) / height as f64);
        let px = Rgba([c.r, c.g, c.b, 0]);
        for x in 0..width {
            img.put_pixel(x, y, px);
        }
    }
    img
}
