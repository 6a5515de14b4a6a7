//! Render a saved graph payload to PNG without touching the network.
//!
//! Usage:
//!   render_payload <payload> [out.png] [--hover=<x>]
//!
//! Geometry and styling come from the usual environment variables
//! (CHART_WIDTH, CHART_HEIGHT, DEVICE_PIXEL_RATIO, ...). The JSON snapshot
//! goes next to the PNG with a `.json` extension.

use gcpchart::app::ChartApp;
use gcpchart::color::ColorReading;
use gcpchart::feed::parse::{coarse_high, parse_dot_position, parse_series};
use gcpchart::logging::{json_log, obj, v_num, v_str};
use gcpchart::render::LabelBox;
use gcpchart::schedule::PollTarget;
use gcpchart::sink::PngSink;
use gcpchart::state::Config;
use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let hover: Option<f64> = args
        .iter()
        .find_map(|a| a.strip_prefix("--hover="))
        .and_then(|v| v.parse().ok());
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();

    let Some(payload_path) = positional.first() else {
        eprintln!("usage: render_payload <payload> [out.png] [--hover=<x>]");
        std::process::exit(1);
    };
    let cfg = Config::from_env();
    let out = positional
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.frame_path));
    let snapshot_path = out.with_extension("json");

    let text = match fs::read_to_string(payload_path) {
        Ok(t) => t,
        Err(err) => {
            eprintln!("read {} failed: {}", payload_path, err);
            std::process::exit(2);
        }
    };

    let series = parse_series(&text);
    let high = coarse_high(&text);
    json_log(
        "payload",
        obj(&[
            ("path", v_str(payload_path)),
            ("records", v_num(series.len() as f64)),
            ("high", v_num(high)),
            (
                "dot_position",
                parse_dot_position(&text).map(v_num).unwrap_or(serde_json::Value::Null),
            ),
        ]),
    );

    let sink = PngSink::new(&out, &snapshot_path, cfg.style());
    let mut app = ChartApp::new(cfg.viewport(), cfg.style(), sink);
    app.on_headline(ColorReading::from_high(high));
    app.on_series(series);

    if app.sink().written() == 0 {
        eprintln!("nothing written: canvas is empty at this size");
        std::process::exit(3);
    }

    if let Some(x) = hover {
        match app.hover(x, LabelBox::default()) {
            Some(readout) => match serde_json::to_string_pretty(&readout) {
                Ok(json) => println!("{}", json),
                Err(err) => eprintln!("hover encode failed: {}", err),
            },
            None => println!("no record under x={}", x),
        }
    }

    json_log(
        "render_payload",
        obj(&[
            ("frame", v_str(&out.to_string_lossy())),
            ("snapshot", v_str(&snapshot_path.to_string_lossy())),
        ]),
    );
}
