//! Lifecycle journal
//!
//! Appends JSON lines to `~/.local/state/offgrid/journal.log` for install,
//! activation and purge events. Off unless `general.journal` is set.

use crate::config::{schema::Config, ConfigManager};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// File-based journal that appends JSON lines
#[derive(Debug, Clone)]
pub struct Journal {
    enabled: bool,
    path: PathBuf,
}

impl Journal {
    /// Create a journal from config
    pub fn new(config: &Config) -> Self {
        Self {
            enabled: config.general.journal,
            path: ConfigManager::journal_path(),
        }
    }

    /// Journal writing to an explicit file
    pub fn at(path: PathBuf) -> Self {
        Self {
            enabled: true,
            path,
        }
    }

    /// Journal that drops everything
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            path: PathBuf::new(),
        }
    }

    /// Record an event stamped `at` as a JSON line
    ///
    /// IO failures are logged and dropped; the journal never fails a
    /// lifecycle hook.
    pub async fn record(&self, at: DateTime<Utc>, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": at.to_rfc3339(),
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize journal event: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write journal: {}", e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
