//! Glue between the poller and the renderer: each fresh series is flipped
//! into screen space, rendered, and handed to the sink.

use crate::color::ColorReading;
use crate::logging::{log, log_headline, log_parse, obj, v_str, ts_now, Domain, Level};
use crate::render::{ChartStyle, Compositor, HoverReadout, LabelBox, Viewport};
use crate::schedule::PollTarget;
use crate::series::Series;
use crate::sink::{FrameSink, Snapshot};

pub struct ChartApp<S> {
    compositor: Compositor,
    sink: S,
    /// Latest series in feed space, kept for re-rendering on resize.
    series: Series,
    headline: Option<ColorReading>,
    frames: u64,
}

impl<S: FrameSink> ChartApp<S> {
    pub fn new(viewport: Viewport, style: ChartStyle, sink: S) -> Self {
        Self {
            compositor: Compositor::new(viewport, style),
            sink,
            series: Series::default(),
            headline: None,
            frames: 0,
        }
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn headline(&self) -> Option<&ColorReading> {
        self.headline.as_ref()
    }

    /// Render passes completed.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn hover(&self, offset_x: f64, label: LabelBox) -> Option<HoverReadout> {
        self.compositor.hover(offset_x, label)
    }

    pub fn snapshot(&self) -> Snapshot {
        let backing = self.compositor.backing();
        Snapshot {
            ts: ts_now(),
            headline: self.headline.clone(),
            layout: self.compositor.layout().clone(),
            backing_width: backing.width,
            backing_height: backing.height,
            records: self.series.len(),
            latest_pct: self.series.latest_average_percentage(),
        }
    }

    /// Render the current series and present it. Sink failures are logged;
    /// the in-memory frame stays current either way.
    pub fn redraw(&mut self) {
        let screen = self.series.to_screen_space();
        self.compositor.render(&screen);
        self.frames += 1;
        let snapshot = self.snapshot();
        if let Err(err) = self.sink.present(self.compositor.frame(), &snapshot) {
            log(
                Level::Error,
                Domain::Sink,
                "present_failed",
                obj(&[("msg", v_str(&format!("{:#}", err)))]),
            );
        }
    }
}

impl<S: FrameSink + 'static> PollTarget for ChartApp<S> {
    fn on_series(&mut self, series: Series) {
        log_parse(series.len(), series.column_span(), series.latest_average_percentage());
        self.series = series;
        self.redraw();
    }

    fn on_headline(&mut self, reading: ColorReading) {
        log_headline(&reading.color, &reading.percentage, reading.high);
        self.headline = Some(reading);
    }

    fn on_resize(&mut self, viewport: Viewport) {
        if self.compositor.resize(viewport) {
            self.redraw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::QuantileRecord;
    use anyhow::{anyhow, Result};
    use crate::render::Frame;

    #[derive(Default)]
    struct Capture {
        sizes: Vec<(u32, u32)>,
        records: Vec<usize>,
        fail: bool,
    }

    impl FrameSink for Capture {
        fn present(&mut self, frame: &Frame, snapshot: &Snapshot) -> Result<()> {
            if self.fail {
                return Err(anyhow!("disk full"));
            }
            self.sizes.push((frame.width(), frame.height()));
            self.records.push(snapshot.records);
            Ok(())
        }
    }

    fn feed_series() -> Series {
        // feed space: 0 is the bottom
        Series::new(
            (0..50)
                .map(|i| QuantileRecord {
                    index: i,
                    average: 0.75,
                    top: 0.875,
                    q1: 0.8,
                    q3: 0.7,
                    bottom: 0.625,
                })
                .collect(),
        )
    }

    #[test]
    fn test_series_is_flipped_before_render() {
        let mut app = ChartApp::new(Viewport::new(100, 140), ChartStyle::default(), Capture::default());
        app.on_series(feed_series());
        assert_eq!(app.frames(), 1);
        assert_eq!(app.sink().sizes, vec![(100, 100)]);
        // band sits in the upper part of the screen: rows 12..38
        let chart = &app.compositor().frame().chart;
        assert_eq!(chart.get_pixel(3, 25)[3], 255);
        assert_eq!(chart.get_pixel(3, 75)[3], 0);
        // hover reads screen space: 1 - 0.75
        assert_eq!(app.hover(3.0, LabelBox::default()).unwrap().text, "25%");
    }

    #[test]
    fn test_resize_redraws_only_on_change() {
        let mut app = ChartApp::new(Viewport::new(100, 140), ChartStyle::default(), Capture::default());
        app.on_series(feed_series());
        app.on_resize(Viewport::new(100, 140));
        assert_eq!(app.frames(), 1);
        app.on_resize(Viewport::new(200, 140));
        assert_eq!(app.frames(), 2);
        assert_eq!(app.sink().sizes[1], (200, 100));
        assert_eq!(app.sink().records, vec![50, 50]);
    }

    #[test]
    fn test_sink_failure_keeps_frame() {
        let sink = Capture { fail: true, ..Capture::default() };
        let mut app = ChartApp::new(Viewport::new(100, 140), ChartStyle::default(), sink);
        app.on_series(feed_series());
        assert_eq!(app.frames(), 1);
        assert_eq!(app.compositor().frame().width(), 100);
    }

    #[test]
    fn test_headline_lands_in_snapshot() {
        let mut app = ChartApp::new(Viewport::new(100, 140), ChartStyle::default(), Capture::default());
        app.on_headline(ColorReading::from_high(0.3));
        let snap = app.snapshot();
        assert_eq!(snap.headline.unwrap().percentage, "30.00");
        assert_eq!(snap.records, 0);
        assert_eq!(snap.latest_pct, None);
    }
}
