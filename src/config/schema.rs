//! Configuration schema for offgrid
//!
//! Configuration is stored at `~/.config/offgrid/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Agent identity and precache list
    pub agent: AgentConfig,

    /// URL segments driving the interception policy
    pub routes: RoutesConfig,

    /// HTTP client settings
    pub network: NetworkConfig,

    /// Offline fallback settings
    pub offline: OfflineConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Append lifecycle events to the journal
    pub journal: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            journal: false,
        }
    }
}

/// Agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Origin the agent serves (scheme, host and port)
    pub origin: String,

    /// Bucket name prefix
    pub cache_prefix: String,

    /// Bucket version suffix; bump to invalidate older deployments
    pub version: String,

    /// Paths stored in the static bucket at install time
    pub precache: Vec<String>,

    /// Activate right after install instead of waiting for old clients
    pub skip_waiting_on_install: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:5000".to_string(),
            cache_prefix: "red-social".to_string(),
            version: "v1".to_string(),
            precache: vec![
                "/".to_string(),
                "/static/css/style.css".to_string(),
                "/static/js/main.js".to_string(),
                "/static/uploads/default_avatar.png".to_string(),
                "/login".to_string(),
                "/register".to_string(),
            ],
            skip_waiting_on_install: true,
        }
    }
}

/// Interception routing rules
///
/// Segments are matched as substrings of the full URL. An empty segment
/// disables its rule: it matches nothing, so `api_segment = ""` sends
/// nothing to the network unconditionally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Requests containing this segment are never intercepted
    pub api_segment: String,

    /// Requests containing this segment bypass the agent unless they are static
    pub post_segment: String,

    /// Static asset segment; these are stored in the runtime bucket
    pub static_segment: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            api_segment: "/api/".to_string(),
            post_segment: "/post/".to_string(),
            static_segment: "/static/".to_string(),
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Whole-request timeout in seconds (0 = none)
    pub timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Offline fallback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Cached page served for navigations while offline
    pub fallback_page: String,

    /// Body of the 503 page when the fallback page is not cached either
    pub notice: String,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            fallback_page: "/".to_string(),
            notice: "Sin conexión".to_string(),
        }
    }
}
