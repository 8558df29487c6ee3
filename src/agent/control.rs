//! Message and sync hooks

use super::Agent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// Tag of the post synchronization event
pub const SYNC_POSTS_TAG: &str = "sync-posts";

/// Recognized page messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// `{"type": "SKIP_WAITING"}`
    SkipWaiting,
}

impl ControlMessage {
    pub fn parse(data: &Value) -> Option<Self> {
        match data.get("type").and_then(Value::as_str) {
            Some("SKIP_WAITING") => Some(Self::SkipWaiting),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    Ignored,
    SkipWaiting { activate_now: bool },
}

/// Background sync trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub tag: String,
}

impl SyncEvent {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    Acknowledged,
    Ignored,
}

impl Agent {
    /// Handle a page message. Only `SKIP_WAITING` is recognized.
    pub fn handle_message(&self, data: &Value) -> MessageOutcome {
        match ControlMessage::parse(data) {
            Some(ControlMessage::SkipWaiting) => {
                let activate_now = self.skip_waiting();
                info!("Skip waiting requested (activate now: {})", activate_now);
                MessageOutcome::SkipWaiting { activate_now }
            }
            None => {
                debug!("Ignoring message {}", data);
                MessageOutcome::Ignored
            }
        }
    }

    /// Post synchronization is not implemented; the event is only logged.
    pub fn handle_sync(&self, event: &SyncEvent) -> SyncOutcome {
        if event.tag == SYNC_POSTS_TAG {
            info!("Sync requested for posts, nothing to do");
            SyncOutcome::Acknowledged
        } else {
            debug!("Ignoring sync tag {}", event.tag);
            SyncOutcome::Ignored
        }
    }
}
