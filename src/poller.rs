//! Poll orchestration.
//!
//! A [`DashboardContext`] is built once at startup (including the one-shot
//! `/api/demo/config` bootstrap) and shared by every refresh cycle. The
//! poller task ticks on a fixed wall-clock period; each tick starts a cycle
//! that fetches the three primary sources concurrently, then runs the metrics
//! aggregation, then hands back a complete [`DashboardSnapshot`].
//!
//! Snapshots are published whole through a `watch` channel. A snapshot from
//! an older cycle never replaces one from a newer cycle. Under
//! [`OverlapPolicy::CancelPrevious`] a cycle aborted by the next one is
//! published as a failed snapshot, so a backend slower than the refresh
//! period still shows up on screen.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::backend::{Backend, TimeoutBackend};
use crate::config::{Config, OverlapPolicy, PrimaryBatchPolicy, RefreshConfig};
use crate::error::{DashboardError, Result};
use crate::model::{DashboardSnapshot, MetricsOutcome, MetricsPanel, PanelState};
use crate::normalize;
use crate::prometheus;

/// Backend path of the cluster status source.
pub const STATUS_PATH: &str = "/api/status";
/// Backend path of the fault timeline source.
pub const FAULTS_PATH: &str = "/api/faults";
/// Backend path of the latest benchmark source.
pub const BENCHMARK_PATH: &str = "/api/benchmarks/latest";
/// Backend path of the remote dashboard configuration.
pub const DEMO_CONFIG_PATH: &str = "/api/demo/config";

/// Shared, immutable state of a running dashboard.
pub struct DashboardContext {
    backend: Arc<dyn Backend>,
    prometheus_url: String,
    grafana_url: String,
    refresh: RefreshConfig,
}

impl DashboardContext {
    /// Build the context, resolving the Prometheus URL from the backend.
    ///
    /// The config fetch is attempted exactly once. Any failure falls back to
    /// `links.prometheus_fallback` and is only logged.
    pub async fn bootstrap(backend: Arc<dyn Backend>, config: &Config) -> Self {
        let timeout = config.backend.request_timeout();
        let backend: Arc<dyn Backend> = Arc::new(TimeoutBackend::new(backend, timeout));
        let fallback = config.links.prometheus_fallback.as_str();

        let demo = match backend.get_json(DEMO_CONFIG_PATH).await {
            Ok(raw) => normalize::demo_config(&raw, fallback),
            Err(e) => {
                warn!("Failed to load demo config, using {}: {}", fallback, e);
                normalize::demo_config(&Value::Null, fallback)
            }
        };
        info!(
            backend = %backend.describe(),
            prometheus = %demo.prometheus_url,
            "Dashboard context ready"
        );

        Self {
            backend,
            prometheus_url: demo.prometheus_url,
            grafana_url: config.links.grafana_url.trim_end_matches('/').to_string(),
            refresh: config.refresh.clone(),
        }
    }

    pub fn prometheus_url(&self) -> &str {
        &self.prometheus_url
    }

    pub fn grafana_url(&self) -> &str {
        &self.grafana_url
    }

    pub fn backend_description(&self) -> String {
        self.backend.describe()
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh.interval()
    }
}

/// Run one complete refresh cycle.
///
/// Never fails: every source error ends up as a panel message.
pub async fn run_cycle(ctx: &DashboardContext, cycle: u64) -> DashboardSnapshot {
    let backend = ctx.backend.as_ref();
    debug!(cycle, "Refresh cycle started");

    let (status, timeline, benchmark) = match ctx.refresh.primary_batch {
        PrimaryBatchPolicy::Isolated => {
            let (status, faults, bench) = tokio::join!(
                backend.get_json(STATUS_PATH),
                backend.get_json(FAULTS_PATH),
                backend.get_json(BENCHMARK_PATH),
            );
            (
                panel(status, normalize::status),
                panel(faults, normalize::timeline),
                panel(bench, normalize::benchmark),
            )
        }
        PrimaryBatchPolicy::AllOrNothing => {
            let batch = tokio::try_join!(
                backend.get_json(STATUS_PATH),
                backend.get_json(FAULTS_PATH),
                backend.get_json(BENCHMARK_PATH),
            );
            match batch {
                Ok((status, faults, bench)) => (
                    PanelState::Ready(normalize::status(&status)),
                    PanelState::Ready(normalize::timeline(&faults)),
                    PanelState::Ready(normalize::benchmark(&bench)),
                ),
                Err(e) => {
                    log_source_failure(&e);
                    let message = failure_message(&e);
                    (
                        PanelState::Failed(message.clone()),
                        PanelState::Failed(message.clone()),
                        PanelState::Failed(message),
                    )
                }
            }
        }
    };

    let outcome = prometheus::aggregate(backend).await;

    DashboardSnapshot {
        cycle,
        completed_at: Utc::now(),
        status,
        timeline,
        benchmark,
        metrics: MetricsPanel {
            outcome,
            prometheus_url: ctx.prometheus_url.clone(),
        },
    }
}

fn panel<T>(result: Result<Value>, adapt: fn(&Value) -> T) -> PanelState<T> {
    match result {
        Ok(raw) => PanelState::Ready(adapt(&raw)),
        Err(e) => {
            log_source_failure(&e);
            PanelState::Failed(failure_message(&e))
        }
    }
}

/// Unreachable backends are routine here; anything else is a local fault.
fn log_source_failure(e: &DashboardError) {
    if e.is_fetch_error() {
        warn!("Source failed: {}", e);
    } else {
        error!("Source failed: {}", e);
    }
}

fn failure_message(e: &DashboardError) -> String {
    format!("Refresh failed: {e}")
}

/// Latest published snapshot; `None` until the first cycle completes.
pub type SnapshotReceiver = watch::Receiver<Option<Arc<DashboardSnapshot>>>;

/// Handle for controlling the poller task.
pub struct PollerHandle {
    snapshots: SnapshotReceiver,
    refresh: Arc<Notify>,
    shutdown_tx: broadcast::Sender<()>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// A receiver notified on every published snapshot.
    pub fn subscribe(&self) -> SnapshotReceiver {
        self.snapshots.clone()
    }

    /// The snapshot currently on display.
    pub fn latest(&self) -> Option<Arc<DashboardSnapshot>> {
        self.snapshots.borrow().clone()
    }

    /// Start an extra cycle now, outside the regular period.
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    /// Signal the poller to stop. In-flight cycles are aborted.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Wait for the poller task to exit.
    pub async fn wait(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

/// Spawn the refresh loop. The first cycle starts immediately.
pub fn spawn(ctx: Arc<DashboardContext>) -> PollerHandle {
    let (snapshot_tx, snapshots) = watch::channel(None);
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
    let refresh = Arc::new(Notify::new());
    let trigger = refresh.clone();

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(ctx.refresh.interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut cycles = Cycles::new(ctx.refresh.overlap);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    cycles.start(&ctx, &snapshot_tx);
                }
                _ = trigger.notified() => {
                    debug!("Manual refresh requested");
                    cycles.start(&ctx, &snapshot_tx);
                }
                Some(joined) = cycles.running.join_next(), if !cycles.running.is_empty() => {
                    match joined {
                        Ok(snapshot) => {
                            let cycle = snapshot.cycle;
                            cycles.finished(cycle);
                            if !publish(&snapshot_tx, snapshot) {
                                debug!(cycle, "Discarded snapshot from superseded cycle");
                            }
                        }
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => warn!("Refresh cycle aborted: {}", e),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Poller shutting down");
                    break;
                }
            }
        }

        cycles.running.abort_all();
    });

    PollerHandle {
        snapshots,
        refresh,
        shutdown_tx,
        task: Some(task),
    }
}

/// In-flight cycles plus the sequence counter that orders them.
struct Cycles {
    running: JoinSet<DashboardSnapshot>,
    overlap: OverlapPolicy,
    last_started: u64,
    /// Latest started cycle and its start time, until its snapshot is joined.
    latest_in_flight: Option<(u64, Instant)>,
}

impl Cycles {
    fn new(overlap: OverlapPolicy) -> Self {
        Self {
            running: JoinSet::new(),
            overlap,
            last_started: 0,
            latest_in_flight: None,
        }
    }

    fn start(&mut self, ctx: &Arc<DashboardContext>, tx: &SnapshotSender) {
        if self.overlap == OverlapPolicy::CancelPrevious {
            self.running.abort_all();
            if let Some((cycle, started)) = self.latest_in_flight.take() {
                let elapsed = started.elapsed();
                warn!(
                    cycle,
                    elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    "Cancelled unfinished refresh cycle"
                );
                publish(tx, superseded(ctx, cycle, elapsed));
            }
        }

        self.last_started += 1;
        let cycle = self.last_started;
        self.latest_in_flight = Some((cycle, Instant::now()));
        let ctx = ctx.clone();
        self.running.spawn(async move { run_cycle(&ctx, cycle).await });
    }

    fn finished(&mut self, cycle: u64) {
        if self.latest_in_flight.is_some_and(|(latest, _)| latest == cycle) {
            self.latest_in_flight = None;
        }
    }
}

/// Failed snapshot standing in for a cycle that was cancelled mid-flight.
///
/// A task that completed just before the abort still yields its real
/// snapshot; being of the same cycle, it replaces this one when joined.
fn superseded(ctx: &DashboardContext, cycle: u64, elapsed: Duration) -> DashboardSnapshot {
    let reason = format!("cycle {cycle} still running after {}ms", elapsed.as_millis());
    let message = format!("Refresh failed: {reason}");
    DashboardSnapshot {
        cycle,
        completed_at: Utc::now(),
        status: PanelState::Failed(message.clone()),
        timeline: PanelState::Failed(message.clone()),
        benchmark: PanelState::Failed(message),
        metrics: MetricsPanel {
            outcome: MetricsOutcome::Failed(reason),
            prometheus_url: ctx.prometheus_url.clone(),
        },
    }
}

type SnapshotSender = watch::Sender<Option<Arc<DashboardSnapshot>>>;

/// Replace the published snapshot unless the current one is newer.
fn publish(tx: &SnapshotSender, snapshot: DashboardSnapshot) -> bool {
    tx.send_if_modified(|current| {
        if current.as_ref().is_some_and(|shown| shown.cycle > snapshot.cycle) {
            return false;
        }
        *current = Some(Arc::new(snapshot));
        true
    })
}
