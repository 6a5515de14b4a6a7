use image::{imageops, Rgba, RgbaImage};

use super::blur::stack_blur_alpha;
use super::gradient::build_background_gradient;
use super::mask::{build_alpha_masks, ColumnSpan};
use super::overlay::{hover_readout, ChartLayout, HoverReadout, LabelBox};
use super::{Backing, ChartStyle, Frame, Viewport};
use crate::logging::{log_render, v_num, ProfileScope};
use crate::series::Series;

/// Owns every render cache: the backing geometry, the retained gradient
/// buffer and the last frame. One instance per chart.
///
/// Invariant: the retained gradient's alpha is zero everywhere between
/// render calls. A pass raises alpha only over the spans it draws and
/// clears exactly those spans before returning.
pub struct Compositor {
    viewport: Viewport,
    style: ChartStyle,
    backing: Backing,
    layout: ChartLayout,
    gradient: RgbaImage,
    gradient_builds: u64,
    series: Series,
    frame: Frame,
}

impl Compositor {
    pub fn new(viewport: Viewport, style: ChartStyle) -> Self {
        let backing = viewport.backing();
        Self {
            layout: viewport.layout(),
            frame: Frame::empty(backing.width, backing.height),
            viewport,
            style,
            backing,
            gradient: RgbaImage::new(0, 0),
            gradient_builds: 0,
            series: Series::default(),
        }
    }

    /// Re-derive geometry. Returns true when the backing size or scale moved.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        self.viewport = viewport;
        self.layout = viewport.layout();
        let backing = viewport.backing();
        if backing == self.backing {
            return false;
        }
        self.backing = backing;
        true
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn backing(&self) -> Backing {
        self.backing
    }

    pub fn layout(&self) -> &ChartLayout {
        &self.layout
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Series behind the current frame, screen space.
    pub fn series(&self) -> &Series {
        &self.series
    }

    /// How many times the background gradient has been generated.
    pub fn gradient_builds(&self) -> u64 {
        self.gradient_builds
    }

    pub fn graph_alpha_is_clear(&self) -> bool {
        self.gradient.pixels().all(|p| p[3] == 0)
    }

    /// Width of the graph area, leaving half a dot clear at the right edge.
    pub fn graph_width(&self) -> u32 {
        let inset = self.style.dot_size as f64 / 2.0 * self.backing.scale;
        let w = (self.backing.width as f64 - inset).floor();
        if w > 0.0 {
            w as u32
        } else {
            0
        }
    }

    /// Draw `series` (screen space) into a fresh frame.
    pub fn render(&mut self, series: &Series) -> &Frame {
        let _scope = ProfileScope::with_context(
            "render",
            &[
                ("records", v_num(series.len() as f64)),
                ("backing_w", v_num(self.backing.width as f64)),
            ],
        );
        self.series = series.clone();

        let (w, h) = (self.backing.width, self.backing.height);
        let mut frame = Frame::empty(w, h);
        if self.backing.is_empty() {
            self.frame = frame;
            log_render(w, h, 0, false);
            return &self.frame;
        }

        let rebuilt = self.ensure_gradient();
        let gw = self.gradient.width();

        let mut masks = build_alpha_masks(series, gw, h, self.style.shadow_exponent);
        stack_blur_alpha(
            &mut masks.shadow,
            gw as usize,
            h as usize,
            self.style.blur_radius as usize,
        );

        let off = self.style.shadow_offset;
        for y in 0..h {
            let dy = y + off;
            if dy >= h {
                break;
            }
            for x in 0..gw {
                let dx = x + off;
                if dx >= w {
                    break;
                }
                let a = masks.shadow_at(x, y);
                if a > 0 {
                    frame.shadow.put_pixel(dx, dy, Rgba([0, 0, 0, a]));
                }
            }
        }

        self.apply_spans(&masks.spans, |x, y| masks.chart_at(x, y));
        imageops::replace(&mut frame.chart, &self.gradient, 0, 0);
        self.apply_spans(&masks.spans, |_, _| 0);

        log_render(w, h, masks.spans.len(), rebuilt);
        self.frame = frame;
        &self.frame
    }

    /// Readout for a pointer at `offset_x` logical px into the canvas.
    pub fn hover(&self, offset_x: f64, label: LabelBox) -> Option<HoverReadout> {
        hover_readout(&self.series, &self.layout, self.backing.scale, offset_x, label)
    }

    fn ensure_gradient(&mut self) -> bool {
        let dims = (self.graph_width(), self.backing.height);
        if self.gradient_builds > 0 && self.gradient.dimensions() == dims {
            return false;
        }
        self.gradient = build_background_gradient(dims.0, dims.1);
        self.gradient_builds += 1;
        true
    }

    fn apply_spans<F: Fn(u32, u32) -> u8>(&mut self, spans: &[ColumnSpan], alpha: F) {
        for span in spans {
            for y in span.rows.clone() {
                self.gradient.get_pixel_mut(span.column, y)[3] = alpha(span.column, y);
            }
        }
    }
}
