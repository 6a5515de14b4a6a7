use std::sync::Arc;

use anyhow::Result;
use gcpchart::app::ChartApp;
use gcpchart::feed::{DataSource, GcpFeed};
use gcpchart::logging::{json_log, obj, v_num, v_str};
use gcpchart::schedule::spawn_poller;
use gcpchart::sink::PngSink;
use gcpchart::state::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let viewport = cfg.viewport();
    let backing = viewport.backing();

    json_log(
        "startup",
        obj(&[
            ("url", v_str(&cfg.graph_url)),
            ("index_url", v_str(&cfg.index_url)),
            ("backing_w", v_num(backing.width as f64)),
            ("backing_h", v_num(backing.height as f64)),
            ("scale", v_num(backing.scale)),
            ("frame_path", v_str(&cfg.frame_path)),
        ]),
    );

    let source: Arc<dyn DataSource> = Arc::new(GcpFeed::new(&cfg)?);
    let sink = PngSink::new(&cfg.frame_path, &cfg.snapshot_path, cfg.style());
    let app = ChartApp::new(viewport, cfg.style(), sink);
    let poller = spawn_poller(source, cfg.schedule(), app);

    tokio::signal::ctrl_c().await?;
    json_log("shutdown", obj(&[("msg", v_str("ctrl-c received"))]));

    let app = poller.stop().await?;
    json_log(
        "shutdown",
        obj(&[
            ("frames", v_num(app.frames() as f64)),
            ("written", v_num(app.sink().written() as f64)),
        ]),
    );
    Ok(())
}
