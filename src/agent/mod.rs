//! The cache policy agent
//!
//! One `Agent` is built per process with its collaborators injected:
//! a `CacheStorage` for buckets, a `Network` for fetches, a `Clients`
//! handle for claiming pages and a `Clock`. Its hooks are driven by the
//! [`Dispatcher`](crate::dispatch::Dispatcher) through the
//! [`Worker`](crate::dispatch::Worker) trait, or called directly.
//!
//! | Hook | Method | Module |
//! |------|--------|--------|
//! | install | [`Agent::install`] | `install` |
//! | activate | [`Agent::activate`] | `activate` |
//! | fetch | [`Agent::intercept`] | `intercept` |
//! | message | [`Agent::handle_message`] | `control` |
//! | sync | [`Agent::handle_sync`] | `control` |

mod activate;
mod background;
mod control;
mod install;
mod intercept;
mod lifecycle;
mod routes;

pub use activate::{ActivationReport, PurgeFailure};
pub use background::BackgroundTasks;
pub use control::{ControlMessage, MessageOutcome, SyncEvent, SyncOutcome, SYNC_POSTS_TAG};
pub use install::InstallReport;
pub use intercept::{FetchOutcome, PassReason, ResponseSource};
pub use lifecycle::{Lifecycle, WorkerState};
pub use routes::RouteRules;

use crate::cache::{BucketNames, CacheStorage};
use crate::clients::Clients;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::dispatch::Worker;
use crate::error::{OffgridError, OffgridResult};
use crate::http::{CacheKey, Request};
use crate::journal::Journal;
use crate::network::Network;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

/// Everything the agent needs to know about its deployment
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub origin: Url,
    pub buckets: BucketNames,
    /// Paths stored in the static bucket at install time
    pub precache: Vec<String>,
    pub routes: RouteRules,
    /// Key of the page served to navigations while offline
    pub fallback_key: CacheKey,
    /// Body of the synthesized 503 page
    pub offline_notice: String,
    pub skip_waiting_on_install: bool,
}

impl AgentSettings {
    pub fn from_config(config: &Config) -> OffgridResult<Self> {
        let origin = Url::parse(&config.agent.origin).map_err(|e| OffgridError::InvalidUrl {
            url: config.agent.origin.clone(),
            reason: e.to_string(),
        })?;
        let fallback = Request::resolve(&origin, &config.offline.fallback_page)?;

        Ok(Self {
            buckets: BucketNames::new(&config.agent.cache_prefix, &config.agent.version),
            precache: config.agent.precache.clone(),
            routes: RouteRules::from_config(&config.routes),
            fallback_key: fallback.cache_key(),
            offline_notice: config.offline.notice.clone(),
            skip_waiting_on_install: config.agent.skip_waiting_on_install,
            origin,
        })
    }
}

/// Offline-caching agent
pub struct Agent {
    settings: AgentSettings,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    clients: Arc<dyn Clients>,
    clock: Arc<dyn Clock>,
    journal: Journal,
    lifecycle: Mutex<Lifecycle>,
    background: BackgroundTasks,
}

impl Agent {
    pub fn new(
        settings: AgentSettings,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        clients: Arc<dyn Clients>,
    ) -> Self {
        Self {
            settings,
            storage,
            network,
            clients,
            clock: Arc::new(SystemClock),
            journal: Journal::disabled(),
            lifecycle: Mutex::new(Lifecycle::new()),
            background: BackgroundTasks::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Detached writes started by the interceptor
    pub fn background(&self) -> &BackgroundTasks {
        &self.background
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle().state()
    }

    /// Snapshot of the lifecycle
    pub fn lifecycle_snapshot(&self) -> Lifecycle {
        self.lifecycle().clone()
    }

    /// Ask to activate without waiting for old clients to close.
    /// Returns true when the worker is waiting and should activate now.
    pub fn skip_waiting(&self) -> bool {
        self.lifecycle().request_skip_waiting()
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, to: WorkerState) -> OffgridResult<()> {
        let now = self.clock.now();
        self.lifecycle().transition(to, now)
    }

    /// Journal an event stamped with the agent's clock
    async fn journal_event(&self, event: &str, data: serde_json::Value) {
        self.journal.record(self.clock.now(), event, &data).await;
    }
}

#[async_trait]
impl Worker for Agent {
    async fn on_install(&self) -> OffgridResult<InstallReport> {
        self.install().await
    }

    async fn on_activate(&self) -> OffgridResult<ActivationReport> {
        self.activate().await
    }

    async fn on_fetch(&self, request: Request) -> OffgridResult<FetchOutcome> {
        self.intercept(request).await
    }

    async fn on_message(&self, data: serde_json::Value) -> MessageOutcome {
        self.handle_message(&data)
    }

    async fn on_sync(&self, event: SyncEvent) -> SyncOutcome {
        self.handle_sync(&event)
    }
}
