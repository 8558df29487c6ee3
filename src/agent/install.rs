//! Install hook: precache the static bucket

use super::{Agent, WorkerState};
use crate::cache::add_all;
use crate::error::OffgridResult;
use crate::http::RequestInfo;
use serde::Serialize;
use tracing::{debug, info, warn};

/// What the install hook did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub bucket: String,
    pub requested: usize,
    pub stored: usize,
    /// Why precaching failed. Install completes regardless.
    pub failure: Option<String>,
    /// Skip-waiting was requested and the worker should activate now
    pub activate_now: bool,
}

impl Agent {
    /// Open the static bucket and store the precache list.
    ///
    /// Precache failures are logged and reported, never returned. Only an
    /// out-of-order lifecycle call is an error.
    pub async fn install(&self) -> OffgridResult<InstallReport> {
        self.transition(WorkerState::Installing)?;

        let bucket = self.settings.buckets.static_bucket.clone();
        let requested = self.settings.precache.len();
        info!("Installing {} ({} precache targets)", bucket, requested);

        let (stored, failure) = match self.populate(&bucket).await {
            Ok(stored) => (stored, None),
            Err(e) => {
                warn!("Precache of {} failed: {}", bucket, e);
                (0, Some(e.to_string()))
            }
        };

        self.transition(WorkerState::Installed)?;

        let activate_now = if self.settings.skip_waiting_on_install {
            self.skip_waiting()
        } else {
            self.lifecycle().should_activate()
        };

        let report = InstallReport {
            bucket,
            requested,
            stored,
            failure,
            activate_now,
        };

        self.journal_event(
            "install",
            serde_json::json!({
                "bucket": report.bucket,
                "stored": report.stored,
                "failure": report.failure,
            }),
        )
        .await;

        Ok(report)
    }

    async fn populate(&self, bucket: &str) -> OffgridResult<usize> {
        self.storage.open(bucket).await?;

        let targets: Vec<RequestInfo> = self
            .settings
            .precache
            .iter()
            .map(|raw| RequestInfo::build(&self.settings.origin, raw))
            .collect();

        for target in &targets {
            if let RequestInfo::Raw(raw) = target {
                debug!("Precache target kept as raw key: {}", raw);
            }
        }

        add_all(
            self.storage.as_ref(),
            self.network.as_ref(),
            bucket,
            &self.settings.origin,
            targets,
        )
        .await
    }
}
