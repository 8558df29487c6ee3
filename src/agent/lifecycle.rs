//! Worker lifecycle state machine

use crate::error::{OffgridError, OffgridResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Worker states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Constructed, nothing run yet
    #[default]
    Parsed,
    /// Install hook running
    Installing,
    /// Installed, waiting to activate
    Installed,
    /// Activate hook running
    Activating,
    /// Active and controlling clients
    Activated,
    /// Replaced or failed
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        f.write_str(s)
    }
}

fn is_valid_transition(from: WorkerState, to: WorkerState) -> bool {
    use WorkerState::*;

    matches!(
        (from, to),
        (Parsed, Installing)
            | (Installing, Installed)
            | (Installing, Redundant)
            | (Installed, Activating)
            | (Activating, Activated)
            | (Activating, Redundant)
            | (Activated, Redundant)
    )
}

/// Current state plus the pending skip-waiting request
#[derive(Debug, Clone, Default, Serialize)]
pub struct Lifecycle {
    state: WorkerState,
    skip_waiting: bool,
    installed_at: Option<DateTime<Utc>>,
    activated_at: Option<DateTime<Utc>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn installed_at(&self) -> Option<DateTime<Utc>> {
        self.installed_at
    }

    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        self.activated_at
    }

    /// Installed and not yet activating
    pub fn is_waiting(&self) -> bool {
        self.state == WorkerState::Installed
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    /// Move to `to`, stamping install/activation times
    pub fn transition(&mut self, to: WorkerState, now: DateTime<Utc>) -> OffgridResult<()> {
        if !is_valid_transition(self.state, to) {
            return Err(OffgridError::InvalidTransition {
                from: self.state.to_string(),
                to: to.to_string(),
            });
        }

        match to {
            WorkerState::Installed => self.installed_at = Some(now),
            WorkerState::Activated => self.activated_at = Some(now),
            _ => {}
        }
        self.state = to;
        Ok(())
    }

    /// Record a skip-waiting request. Returns true when the worker is
    /// waiting and should activate now. A request made while installing
    /// is honoured once install completes.
    pub fn request_skip_waiting(&mut self) -> bool {
        self.skip_waiting = true;
        self.should_activate()
    }

    /// Waiting with skip-waiting requested
    pub fn should_activate(&self) -> bool {
        self.is_waiting() && self.skip_waiting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_lifecycle() {
        let now = Utc::now();
        let mut lifecycle = Lifecycle::new();
        lifecycle.transition(WorkerState::Installing, now).unwrap();
        lifecycle.transition(WorkerState::Installed, now).unwrap();
        assert!(lifecycle.is_waiting());
        assert_eq!(lifecycle.installed_at(), Some(now));

        lifecycle.transition(WorkerState::Activating, now).unwrap();
        lifecycle.transition(WorkerState::Activated, now).unwrap();
        assert_eq!(lifecycle.state(), WorkerState::Activated);
        assert_eq!(lifecycle.activated_at(), Some(now));
    }

    #[test]
    fn rejects_skipping_install() {
        let mut lifecycle = Lifecycle::new();
        let err = lifecycle
            .transition(WorkerState::Activating, Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("parsed -> activating"));
        assert_eq!(lifecycle.state(), WorkerState::Parsed);
    }

    #[test]
    fn skip_waiting_before_installed_is_deferred() {
        let now = Utc::now();
        let mut lifecycle = Lifecycle::new();
        lifecycle.transition(WorkerState::Installing, now).unwrap();

        assert!(!lifecycle.request_skip_waiting());
        lifecycle.transition(WorkerState::Installed, now).unwrap();
        assert!(lifecycle.should_activate());
    }

    #[test]
    fn skip_waiting_after_activation_is_noop() {
        let now = Utc::now();
        let mut lifecycle = Lifecycle::new();
        for state in [
            WorkerState::Installing,
            WorkerState::Installed,
            WorkerState::Activating,
            WorkerState::Activated,
        ] {
            lifecycle.transition(state, now).unwrap();
        }
        assert!(!lifecycle.request_skip_waiting());
    }
}
