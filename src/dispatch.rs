//! Event dispatch
//!
//! The host turns platform events into [`Event`] values and hands them to a
//! [`Dispatcher`], which routes each one to the matching [`Worker`] hook.
//! Hooks can also be invoked directly in tests.

use crate::agent::{
    ActivationReport, FetchOutcome, InstallReport, MessageOutcome, SyncEvent, SyncOutcome,
};
use crate::error::OffgridResult;
use crate::http::Request;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Lifecycle hooks of an offline agent
#[async_trait]
pub trait Worker: Send + Sync {
    async fn on_install(&self) -> OffgridResult<InstallReport>;

    async fn on_activate(&self) -> OffgridResult<ActivationReport>;

    async fn on_fetch(&self, request: Request) -> OffgridResult<FetchOutcome>;

    async fn on_message(&self, data: Value) -> MessageOutcome;

    async fn on_sync(&self, event: SyncEvent) -> SyncOutcome;
}

/// A platform event
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Message(Value),
    Sync(SyncEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Message,
    Sync,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Install => EventKind::Install,
            Self::Activate => EventKind::Activate,
            Self::Fetch(_) => EventKind::Fetch,
            Self::Message(_) => EventKind::Message,
            Self::Sync(_) => EventKind::Sync,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Fetch => "fetch",
            Self::Message => "message",
            Self::Sync => "sync",
        };
        f.write_str(s)
    }
}

/// Result of one dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Installed {
        install: InstallReport,
        /// Present when install led straight into activation
        activation: Option<ActivationReport>,
    },
    Activated(ActivationReport),
    Fetched(FetchOutcome),
    Message {
        outcome: MessageOutcome,
        activation: Option<ActivationReport>,
    },
    Sync(SyncOutcome),
}

/// Routes events to a worker's hooks
pub struct Dispatcher {
    worker: Arc<dyn Worker>,
}

impl Dispatcher {
    pub fn new(worker: Arc<dyn Worker>) -> Self {
        Self { worker }
    }

    /// Run the hook for `event`.
    ///
    /// An install or skip-waiting message that leaves the worker ready to
    /// take over is followed by activation.
    pub async fn dispatch(&self, event: Event) -> OffgridResult<EventOutcome> {
        let kind = event.kind();
        debug!("Dispatching {} event", kind);

        match event {
            Event::Install => {
                let install = self.worker.on_install().await?;
                let activation = if install.activate_now {
                    info!("Skipping the waiting phase");
                    Some(self.worker.on_activate().await?)
                } else {
                    None
                };
                Ok(EventOutcome::Installed {
                    install,
                    activation,
                })
            }
            Event::Activate => Ok(EventOutcome::Activated(self.worker.on_activate().await?)),
            Event::Fetch(request) => Ok(EventOutcome::Fetched(self.worker.on_fetch(request).await?)),
            Event::Message(data) => {
                let outcome = self.worker.on_message(data).await;
                let activation = match outcome {
                    MessageOutcome::SkipWaiting { activate_now: true } => {
                        Some(self.worker.on_activate().await?)
                    }
                    _ => None,
                };
                Ok(EventOutcome::Message {
                    outcome,
                    activation,
                })
            }
            Event::Sync(sync) => Ok(EventOutcome::Sync(self.worker.on_sync(sync).await)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Agent, AgentSettings, WorkerState};
    use crate::cache::MemoryStorage;
    use crate::config::Config;
    use crate::testing::{get, ok, CountingClients, StubNetwork};
    use serde_json::json;

    fn agent(skip_waiting_on_install: bool) -> (Arc<Agent>, Arc<StubNetwork>, Arc<CountingClients>) {
        let mut config = Config::default();
        config.agent.skip_waiting_on_install = skip_waiting_on_install;
        let network = Arc::new(StubNetwork::new());
        for path in &config.agent.precache {
            network.respond(path, ok(path));
        }
        let clients = Arc::new(CountingClients::default());
        let agent = Agent::new(
            AgentSettings::from_config(&config).unwrap(),
            Arc::new(MemoryStorage::new()),
            network.clone(),
            clients.clone(),
        );
        (Arc::new(agent), network, clients)
    }

    #[tokio::test]
    async fn install_runs_activation_when_skipping_wait() {
        let (agent, _, clients) = agent(true);
        let dispatcher = Dispatcher::new(agent.clone());

        let outcome = dispatcher.dispatch(Event::Install).await.unwrap();

        match outcome {
            EventOutcome::Installed { install, activation } => {
                assert_eq!(install.stored, 6);
                assert!(activation.is_some());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(agent.state(), WorkerState::Activated);
        assert_eq!(clients.claims(), 1);
    }

    #[tokio::test]
    async fn skip_waiting_message_activates_waiting_worker() {
        let (agent, _, clients) = agent(false);
        let dispatcher = Dispatcher::new(agent.clone());

        dispatcher.dispatch(Event::Install).await.unwrap();
        assert_eq!(agent.state(), WorkerState::Installed);
        assert_eq!(clients.claims(), 0);

        let outcome = dispatcher
            .dispatch(Event::Message(json!({"type": "SKIP_WAITING"})))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            EventOutcome::Message {
                outcome: MessageOutcome::SkipWaiting { activate_now: true },
                activation: Some(_),
            }
        ));
        assert_eq!(agent.state(), WorkerState::Activated);
        assert_eq!(clients.claims(), 1);
    }

    #[tokio::test]
    async fn skip_waiting_after_activation_does_nothing() {
        let (agent, _, clients) = agent(true);
        let dispatcher = Dispatcher::new(agent.clone());
        dispatcher.dispatch(Event::Install).await.unwrap();

        let outcome = dispatcher
            .dispatch(Event::Message(json!({"type": "SKIP_WAITING"})))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            EventOutcome::Message { activation: None, .. }
        ));
        assert_eq!(clients.claims(), 1);
    }

    #[tokio::test]
    async fn fetch_and_sync_are_routed() {
        let (agent, network, _) = agent(true);
        let dispatcher = Dispatcher::new(agent);
        dispatcher.dispatch(Event::Install).await.unwrap();
        network.set_online(false);

        let outcome = dispatcher
            .dispatch(Event::Fetch(get("/login")))
            .await
            .unwrap();
        match outcome {
            EventOutcome::Fetched(fetched) => {
                assert_eq!(fetched.response().unwrap().text(), "/login");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        let outcome = dispatcher
            .dispatch(Event::Sync(SyncEvent::new("sync-posts")))
            .await
            .unwrap();
        assert_eq!(outcome, EventOutcome::Sync(SyncOutcome::Acknowledged));
    }

    #[test]
    fn event_kinds_display() {
        assert_eq!(Event::Install.kind().to_string(), "install");
        assert_eq!(Event::Fetch(get("/")).kind(), EventKind::Fetch);
    }
}
