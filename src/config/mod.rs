//! Configuration management for offgrid
//!
//! | File | Location |
//! |------|----------|
//! | Settings | `-c PATH`, `$OFFGRID_CONFIG`, else `<config dir>/offgrid/config.toml` |
//! | Journal | `<state dir>/offgrid/journal.log` |
//!
//! A missing settings file is not an error: every section has defaults
//! matching the deployment the agent was written for.

pub mod schema;

pub use schema::Config;

use crate::error::{OffgridError, OffgridResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const APP_DIR: &str = "offgrid";

/// Locates, reads and writes the settings file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Use `explicit` when given (the `-c` flag, which clap also fills
    /// from `OFFGRID_CONFIG`), the per-user default otherwise.
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        Self::with_path(explicit.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("config.toml")
        }))
    }

    /// Where the lifecycle journal is appended
    pub fn journal_path() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("journal.log")
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Read the settings file, or the defaults when there is none
    pub async fn load(&self) -> OffgridResult<Config> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", self.config_path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(OffgridError::io(
                    format!("reading config from {}", self.config_path.display()),
                    e,
                ))
            }
        };

        toml::from_str(&content).map_err(|e| OffgridError::ConfigInvalid {
            path: self.config_path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write `config`, replacing the file in one rename so a reader never
    /// sees a half-written file
    pub async fn save(&self, config: &Config) -> OffgridResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| OffgridError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        let staging = self.config_path.with_extension("toml.tmp");
        fs::write(&staging, content)
            .await
            .map_err(|e| OffgridError::io(format!("writing {}", staging.display()), e))?;
        fs::rename(&staging, &self.config_path).await.map_err(|e| {
            OffgridError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }
}
