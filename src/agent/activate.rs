//! Activate hook: purge stale buckets, then claim clients

use super::{Agent, WorkerState};
use crate::error::OffgridResult;
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

/// A bucket that could not be deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeFailure {
    pub bucket: String,
    pub reason: String,
}

/// What the activate hook did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub purged: Vec<String>,
    pub failed: Vec<PurgeFailure>,
    /// Clients now controlled, `None` if the claim failed
    pub claimed: Option<usize>,
}

impl Agent {
    /// Delete every bucket that is neither the static nor the runtime
    /// bucket, then claim all open clients.
    ///
    /// Deletions run concurrently and all settle before the claim. A failed
    /// deletion is reported and does not stop activation; there is no
    /// retry. Failing to list buckets makes the worker redundant.
    pub async fn activate(&self) -> OffgridResult<ActivationReport> {
        self.transition(WorkerState::Activating)?;

        let existing = match self.storage.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Cannot list cache buckets: {}", e);
                self.transition(WorkerState::Redundant)?;
                return Err(e);
            }
        };

        let stale: Vec<&str> = self.settings.buckets.stale(&existing);
        info!("Activating, {} stale bucket(s)", stale.len());

        let results = join_all(
            stale
                .iter()
                .map(|name| async move { (*name, self.storage.delete(name).await) }),
        )
        .await;

        let mut purged = Vec::new();
        let mut failed = Vec::new();
        for (bucket, result) in results {
            match result {
                Ok(true) => {
                    debug!("Deleted bucket {}", bucket);
                    purged.push(bucket.to_string());
                }
                Ok(false) => debug!("Bucket {} already gone", bucket),
                Err(e) => {
                    warn!("Failed to delete bucket {}: {}", bucket, e);
                    failed.push(PurgeFailure {
                        bucket: bucket.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let claimed = match self.clients.claim().await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Failed to claim clients: {}", e);
                None
            }
        };

        self.transition(WorkerState::Activated)?;

        let report = ActivationReport {
            purged,
            failed,
            claimed,
        };

        if !report.purged.is_empty() || !report.failed.is_empty() {
            self.journal_event(
                "purge",
                serde_json::json!({
                    "purged": report.purged,
                    "failed": report.failed,
                }),
            )
            .await;
        }
        self.journal_event("activate", serde_json::json!({ "claimed": report.claimed }))
            .await;

        Ok(report)
    }
}
