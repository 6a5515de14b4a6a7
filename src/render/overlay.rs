//! Overlay elements around the raster: header link, footer time labels,
//! hover guide line and readout box. Positions are logical pixels relative
//! to the chart element.

use serde::{Deserialize, Serialize};

use crate::series::{average_percentage, Series};

pub const HEADER_HEIGHT: f64 = 20.0;
pub const FOOTER_HEIGHT: f64 = 20.0;
pub const HEADER_TITLE: &str = "24 Hour GCP Graph";
pub const HEADER_LINK: &str = "https://global-mind.org/gcpdot/";
pub const FOOTER_LEFT: &str = "24 Hours Ago";
pub const FOOTER_RIGHT: &str = "Now";
/// Gap between the guide line and the readout box.
pub const LABEL_GAP: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartLayout {
    pub header: Rect,
    pub title: String,
    pub link: String,
    pub canvas: Rect,
    pub footer: Rect,
    pub footer_left: String,
    pub footer_right: String,
}

impl ChartLayout {
    pub fn for_element(width: u32, height: u32) -> Self {
        let w = width as f64;
        let h = height as f64;
        let canvas_h = (h - HEADER_HEIGHT - FOOTER_HEIGHT).max(0.0);
        Self {
            header: Rect { left: 0.0, top: 0.0, width: w, height: HEADER_HEIGHT.min(h) },
            title: HEADER_TITLE.to_string(),
            link: HEADER_LINK.to_string(),
            canvas: Rect { left: 0.0, top: HEADER_HEIGHT, width: w, height: canvas_h },
            footer: Rect {
                left: 0.0,
                top: (h - FOOTER_HEIGHT).max(0.0),
                width: w,
                height: FOOTER_HEIGHT.min(h),
            },
            footer_left: FOOTER_LEFT.to_string(),
            footer_right: FOOTER_RIGHT.to_string(),
        }
    }
}

/// Rendered size of the readout box, as measured by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBox {
    pub width: f64,
    pub height: f64,
}

impl Default for LabelBox {
    fn default() -> Self {
        Self { width: 100.0, height: 20.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelAnchor {
    /// Box sits right of the guide line.
    Right,
    /// Box flipped to the left because it would overflow the element.
    Left,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoverReadout {
    pub index: u32,
    pub percentage: f64,
    pub text: String,
    pub guide_x: f64,
    pub guide_top: f64,
    pub guide_height: f64,
    pub label_left: f64,
    pub label_top: f64,
    pub anchor: LabelAnchor,
}

/// Map a pointer offset to the readout for the column under it.
///
/// `series` must be in screen space. `scale` is the device/backing ratio
/// the column index is derived with. `None` means hide the readout.
pub fn hover_readout(
    series: &Series,
    layout: &ChartLayout,
    scale: f64,
    offset_x: f64,
    label: LabelBox,
) -> Option<HoverReadout> {
    if !offset_x.is_finite() || offset_x < 0.0 {
        return None;
    }
    let column = (offset_x * scale).floor();
    if column > u32::MAX as f64 {
        return None;
    }
    let record = series.get(column as u32)?;

    let percentage = average_percentage(record.average);
    let (label_left, anchor) = if offset_x < layout.canvas.width - label.width {
        (offset_x + LABEL_GAP, LabelAnchor::Right)
    } else {
        (offset_x - LABEL_GAP - label.width, LabelAnchor::Left)
    };
    let label_top = (record.average * layout.canvas.height - label.height / 2.0 + layout.canvas.top).floor();

    Some(HoverReadout {
        index: record.index,
        percentage,
        text: format!("{}%", percentage),
        guide_x: offset_x,
        guide_top: layout.canvas.top,
        guide_height: layout.canvas.height,
        label_left,
        label_top,
        anchor,
    })
}
