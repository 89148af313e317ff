//! Snapshot service: owns the latest snapshot and the refresh scheduler
//!
//! The aggregation engine stays stateless; this is the one place that
//! caches a result. Construct it, optionally `start` the background refresh,
//! and `stop` it when done.

use crate::parsers::TranscriptSource;
use crate::services::aggregator::{DateFilter, UsageAggregator};
use crate::services::config_loader;
use crate::services::live_sessions::LiveSessionSource;
use crate::services::pricing::PricingCatalog;
use crate::services::snapshot::SnapshotAssembler;
use crate::types::{
    ClawdashError, CumulativeSummary, DashboardConfig, LiveSessions, Result, Snapshot,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Where the dashboard configuration comes from on each collection.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Fixed, already validated configuration
    Fixed(DashboardConfig),
    /// `openclaw.json`, re-read on every collection
    File(PathBuf),
}

impl ConfigSource {
    pub fn load(&self) -> DashboardConfig {
        match self {
            ConfigSource::Fixed(config) => config.clone(),
            ConfigSource::File(path) => config_loader::load_config(path),
        }
    }
}

struct Inner {
    source: Arc<dyn TranscriptSource>,
    live: Arc<dyn LiveSessionSource>,
    pricing: PricingCatalog,
    config: ConfigSource,
    latest: RwLock<Option<Arc<Snapshot>>>,
}

impl Inner {
    /// Scan and aggregate. An unavailable source yields the empty summary.
    fn cumulative(&self, range: DateFilter) -> CumulativeSummary {
        let config = self.config.load();
        let aggregator = UsageAggregator::new(&config, &self.pricing);
        match self.source.scan() {
            Ok(records) => aggregator.aggregate(records, range),
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "no usage data");
                aggregator.empty()
            }
        }
    }

    async fn live_sessions(&self) -> Result<LiveSessions> {
        LiveSessions::fetch(self.live.as_ref(), &self.pricing).await
    }

    async fn collect(self: &Arc<Self>, range: DateFilter) -> Result<Arc<Snapshot>> {
        let scan = {
            let inner = Arc::clone(self);
            tokio::task::spawn_blocking(move || inner.cumulative(range))
        };
        let (cumulative, live) = tokio::join!(scan, self.live_sessions());
        let cumulative = cumulative.map_err(|e| ClawdashError::Task(e.to_string()))?;

        let snapshot = Arc::new(SnapshotAssembler::assemble(cumulative, live));
        *self.latest.write().await = Some(Arc::clone(&snapshot));
        debug!(
            total_cost = snapshot.cumulative.total_cost,
            sessions = snapshot.stats.total,
            "snapshot collected"
        );
        Ok(snapshot)
    }
}

struct RefreshTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owner of the cached snapshot and its refresh scheduler.
pub struct SnapshotService {
    inner: Arc<Inner>,
    task: Mutex<Option<RefreshTask>>,
}

impl SnapshotService {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        live: Arc<dyn LiveSessionSource>,
        pricing: PricingCatalog,
        config: ConfigSource,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                live,
                pricing,
                config,
                latest: RwLock::new(None),
            }),
            task: Mutex::new(None),
        }
    }

    /// Recompute a snapshot for `range` and make it the latest.
    pub async fn collect(&self, range: DateFilter) -> Result<Arc<Snapshot>> {
        self.inner.collect(range).await
    }

    /// The cached snapshot, collecting one over all dates if none exists yet.
    pub async fn latest(&self) -> Result<Arc<Snapshot>> {
        if let Some(snapshot) = self.cached().await {
            return Ok(snapshot);
        }
        self.collect(DateFilter::all()).await
    }

    /// The cached snapshot, if any, without collecting.
    pub async fn cached(&self) -> Option<Arc<Snapshot>> {
        self.inner.latest.read().await.clone()
    }

    /// Refresh period configured for this service
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.inner.config.load().refresh_interval_ms)
    }

    pub async fn is_running(&self) -> bool {
        self.task.lock().await.is_some()
    }

    /// Start refreshing every `interval`, beginning immediately. Calling
    /// `start` on a running service is a no-op.
    pub async fn start(&self, interval: Duration) {
        let mut task = self.task.lock().await;
        if task.is_some() {
            debug!("snapshot refresh already running");
            return;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run_refresh(
            Arc::clone(&self.inner),
            interval,
            shutdown_rx,
        ));
        *task = Some(RefreshTask { shutdown, handle });
    }

    /// Stop the background refresh and wait for it to finish.
    pub async fn stop(&self) {
        let Some(task) = self.task.lock().await.take() else {
            return;
        };
        let _ = task.shutdown.send(true);
        if let Err(e) = task.handle.await {
            warn!(error = %e, "snapshot refresh task ended abnormally");
        }
    }
}

impl Drop for SnapshotService {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.handle.abort();
        }
    }
}

async fn run_refresh(inner: Arc<Inner>, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    info!("snapshot refresh started (interval={:?})", interval);
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = inner.collect(DateFilter::all()).await {
                    warn!(error = %e, "snapshot refresh failed");
                }
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("snapshot refresh stopped");
                    break;
                }
            }
        }
    }
}
