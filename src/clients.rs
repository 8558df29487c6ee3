//! Open client connections (pages) the agent can take control of

use crate::error::OffgridResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Client-connection claim primitive
#[async_trait]
pub trait Clients: Send + Sync {
    /// Take control of every open client. Returns how many clients the
    /// agent now controls.
    async fn claim(&self) -> OffgridResult<usize>;
}

/// An open page
#[derive(Debug, Clone, Serialize)]
pub struct ClientInfo {
    pub id: Uuid,
    pub url: String,
    /// Whether this agent version controls the page
    pub controlled: bool,
    pub connected_at: DateTime<Utc>,
}

/// In-memory client table
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<Vec<ClientInfo>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open page, initially uncontrolled
    pub async fn connect(&self, url: impl Into<String>) -> Uuid {
        let client = ClientInfo {
            id: Uuid::new_v4(),
            url: url.into(),
            controlled: false,
            connected_at: Utc::now(),
        };
        let id = client.id;
        self.clients.write().await.push(client);
        id
    }

    pub async fn controlled_count(&self) -> usize {
        self.clients
            .read()
            .await
            .iter()
            .filter(|c| c.controlled)
            .count()
    }
}

#[async_trait]
impl Clients for ClientRegistry {
    async fn claim(&self) -> OffgridResult<usize> {
        let mut clients = self.clients.write().await;
        for client in clients.iter_mut().filter(|c| !c.controlled) {
            debug!("Claiming client {} ({})", client.id, client.url);
            client.controlled = true;
        }
        Ok(clients.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn claim_controls_open_clients() {
        let registry = ClientRegistry::new();
        registry.connect("http://localhost:5000/feed").await;
        registry.connect("http://localhost:5000/login").await;
        assert_eq!(registry.controlled_count().await, 0);

        assert_eq!(registry.claim().await.unwrap(), 2);
        assert_eq!(registry.controlled_count().await, 2);
    }
}
