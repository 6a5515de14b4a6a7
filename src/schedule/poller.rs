use std::sync::Arc;
use std::time::{Duration, Instant as StdInstant};

use anyhow::{anyhow, Result};
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::{PollSchedule, ScheduleConfig};
use crate::color::ColorReading;
use crate::feed::retry::is_transient;
use crate::feed::DataSource;
use crate::logging::{log, log_fetch, obj, v_num, v_str, Domain, Level};
use crate::render::Viewport;
use crate::series::Series;

/// Receiver of poll results. Runs on the poller task.
pub trait PollTarget: Send + 'static {
    /// Fresh series, feed space. Replaces the previous one wholesale.
    fn on_series(&mut self, series: Series);
    fn on_headline(&mut self, reading: ColorReading);
    /// Called right away on resize, before the debounced refetch.
    fn on_resize(&mut self, viewport: Viewport);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Control {
    /// Fetch now, superseding any pending call.
    Refresh,
    Resize(Viewport),
    Stop,
}

pub struct PollHandle<T> {
    tx: mpsc::Sender<Control>,
    task: JoinHandle<T>,
}

impl<T: PollTarget> PollHandle<T> {
    pub async fn refresh(&self) -> Result<()> {
        self.send(Control::Refresh).await
    }

    pub async fn resize(&self, viewport: Viewport) -> Result<()> {
        self.send(Control::Resize(viewport)).await
    }

    /// Stop polling and hand the target back. A fetch still in flight is
    /// dropped without touching the target.
    pub async fn stop(self) -> Result<T> {
        // the task may already be gone; joining reports that
        let _ = self.tx.send(Control::Stop).await;
        self.task
            .await
            .map_err(|e| anyhow!("poller task failed: {}", e))
    }

    async fn send(&self, msg: Control) -> Result<()> {
        self.tx
            .send(msg)
            .await
            .map_err(|_| anyhow!("poller stopped"))
    }
}

/// Start polling `source` on a tokio task. The first fetch runs immediately.
pub fn spawn_poller<T: PollTarget>(
    source: Arc<dyn DataSource>,
    cfg: ScheduleConfig,
    target: T,
) -> PollHandle<T> {
    let (tx, rx) = mpsc::channel(16);
    let task = tokio::spawn(run(source, cfg, target, rx));
    PollHandle { tx, task }
}

async fn run<T: PollTarget>(
    source: Arc<dyn DataSource>,
    cfg: ScheduleConfig,
    mut target: T,
    mut rx: mpsc::Receiver<Control>,
) -> T {
    let debounce = cfg.resize_debounce;
    let mut schedule = PollSchedule::new(cfg);
    // exactly one outstanding call
    let mut due = Some(Instant::now());

    loop {
        let woke_by_timer = match due {
            Some(at) => tokio::select! {
                _ = sleep_until(at) => None,
                msg = rx.recv() => Some(msg),
            },
            None => Some(rx.recv().await),
        };

        let msg = match woke_by_timer {
            Some(msg) => msg,
            None => {
                schedule.begin_fetch();
                let started = StdInstant::now();
                let fetch = async { tokio::join!(source.fetch_series(), source.fetch_high()) };
                // a control message abandons the fetch; nothing from it is applied
                tokio::select! {
                    (series, high) = fetch => {
                        let delay = apply_poll(series, high, started, &mut schedule, &mut target);
                        due = deadline(delay);
                        continue;
                    }
                    msg = rx.recv() => {
                        log(
                            Level::Info,
                            Domain::Schedule,
                            "fetch_abandoned",
                            obj(&[("elapsed_ms", v_num(started.elapsed().as_secs_f64() * 1000.0))]),
                        );
                        msg
                    }
                }
            }
        };

        match msg {
            Some(Control::Refresh) => {
                schedule.reschedule(Duration::ZERO);
                due = Some(Instant::now());
            }
            Some(Control::Resize(viewport)) => {
                target.on_resize(viewport);
                schedule.reschedule(debounce);
                due = deadline(debounce);
            }
            Some(Control::Stop) | None => {
                schedule.stop();
                break;
            }
        }
    }
    log(Level::Info, Domain::System, "poller_stopped", obj(&[]));
    target
}

/// `None` when the delay runs past what the clock can represent: only a
/// control message wakes the poller then.
fn deadline(delay: Duration) -> Option<Instant> {
    Instant::now().checked_add(delay)
}

/// Hand one fetch cycle's results to the target. Returns the delay until the next one.
fn apply_poll<T: PollTarget>(
    series: Result<Series>,
    high: Result<f64>,
    started: StdInstant,
    schedule: &mut PollSchedule,
    target: &mut T,
) -> Duration {
    // headline is best effort and never drives backoff
    match high {
        Ok(high) => target.on_headline(ColorReading::from_high(high)),
        Err(err) => log_fetch("high", false, started.elapsed(), &format!("{:#}", err), is_transient(&err)),
    }

    match series {
        Ok(series) => {
            log_fetch("series", true, started.elapsed(), "", false);
            target.on_series(series);
            let now_ms = chrono::Utc::now().timestamp_millis();
            let jitter_unit: f64 = rand::thread_rng().gen();
            schedule.on_success(now_ms, jitter_unit)
        }
        Err(err) => {
            log_fetch("series", false, started.elapsed(), &format!("{:#}", err), is_transient(&err));
            let delay = schedule.on_failure();
            if schedule.failures() == 1 {
                log(
                    Level::Warn,
                    Domain::Schedule,
                    "keeping_last_frame",
                    obj(&[("msg", v_str("series fetch failed, previous frame stays up"))]),
                );
            }
            delay
        }
    }
}
