//! Where finished frames go.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use crate::color::ColorReading;
use crate::logging::{log, obj, v_num, v_str, Domain, Level};
use crate::render::{ChartLayout, ChartStyle, Frame};

/// Everything shown next to the raster, in one serialisable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub ts: String,
    pub headline: Option<ColorReading>,
    pub layout: ChartLayout,
    pub backing_width: u32,
    pub backing_height: u32,
    pub records: usize,
    /// Newest average as a percentage, feed space.
    pub latest_pct: Option<f64>,
}

pub trait FrameSink: Send {
    fn present(&mut self, frame: &Frame, snapshot: &Snapshot) -> Result<()>;
}

/// Writes the flattened frame as PNG and the snapshot as JSON next to it.
pub struct PngSink {
    frame_path: PathBuf,
    snapshot_path: PathBuf,
    style: ChartStyle,
    written: u64,
}

impl PngSink {
    pub fn new(frame_path: impl Into<PathBuf>, snapshot_path: impl Into<PathBuf>, style: ChartStyle) -> Self {
        Self {
            frame_path: frame_path.into(),
            snapshot_path: snapshot_path.into(),
            style,
            written: 0,
        }
    }

    /// Frames written so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
    }
    Ok(())
}

impl FrameSink for PngSink {
    fn present(&mut self, frame: &Frame, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        ensure_parent(&self.snapshot_path)?;
        std::fs::write(&self.snapshot_path, json)
            .with_context(|| format!("write {}", self.snapshot_path.display()))?;

        // a zero-sized image cannot be encoded; the snapshot still goes out
        if frame.width() == 0 || frame.height() == 0 {
            log(
                Level::Debug,
                Domain::Sink,
                "frame_skipped",
                obj(&[("msg", v_str("empty canvas"))]),
            );
            return Ok(());
        }

        ensure_parent(&self.frame_path)?;
        frame
            .flatten(&self.style)
            .save_with_format(&self.frame_path, image::ImageFormat::Png)
            .with_context(|| format!("write {}", self.frame_path.display()))?;
        self.written += 1;

        log(
            Level::Info,
            Domain::Sink,
            "frame_written",
            obj(&[
                ("path", v_str(&self.frame_path.to_string_lossy())),
                ("width", v_num(frame.width() as f64)),
                ("height", v_num(frame.height() as f64)),
                ("records", v_num(snapshot.records as f64)),
            ]),
        );
        Ok(())
    }
}
