//! Fetch hook: the cache selection policy
//!
//! 1. Non-GET requests and dynamic routes pass through untouched.
//! 2. A hit in any bucket is served from cache.
//! 3. On a miss the network answers. Cacheable static assets are copied
//!    into the runtime bucket in the background.
//! 4. When the network fails, documents fall back to the cached root page
//!    and then to a synthesized 503. Other requests get one more cache
//!    lookup, after which the failure surfaces.

use super::Agent;
use crate::error::{OffgridError, OffgridResult};
use crate::http::{Destination, Method, Request, Response};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a request was not intercepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PassReason {
    NonGet,
    DynamicRoute,
}

impl fmt::Display for PassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonGet => f.write_str("non-get"),
            Self::DynamicRoute => f.write_str("dynamic-route"),
        }
    }
}

/// Where an intercepted response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseSource {
    Cache,
    Network,
    /// Network response, copy queued for the runtime bucket
    NetworkStored,
    /// Cached root page served for an offline navigation
    OfflinePage,
    /// Synthesized 503
    OfflineNotice,
    /// Cache lookup after a failed fetch
    CacheFallback,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cache => "cache",
            Self::Network => "network",
            Self::NetworkStored => "network+stored",
            Self::OfflinePage => "offline-page",
            Self::OfflineNotice => "offline-notice",
            Self::CacheFallback => "cache-fallback",
        };
        f.write_str(s)
    }
}

/// Result of the fetch hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Not intercepted; the host performs its default handling
    Passthrough(PassReason),
    Respond {
        response: Response,
        source: ResponseSource,
    },
}

impl FetchOutcome {
    fn respond(response: Response, source: ResponseSource) -> Self {
        Self::Respond { response, source }
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Passthrough(_))
    }

    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Respond { response, .. } => Some(response),
            Self::Passthrough(_) => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Respond { response, .. } => Some(response),
            Self::Passthrough(_) => None,
        }
    }

    pub fn source(&self) -> Option<ResponseSource> {
        match self {
            Self::Respond { source, .. } => Some(*source),
            Self::Passthrough(_) => None,
        }
    }
}

impl Agent {
    /// Decide how to answer one request.
    ///
    /// Returns `Err` only for storage failures and for a non-document
    /// request that neither the network nor the cache can answer.
    pub async fn intercept(&self, request: Request) -> OffgridResult<FetchOutcome> {
        if request.method != Method::Get {
            return Ok(FetchOutcome::Passthrough(PassReason::NonGet));
        }
        if self.settings.routes.bypasses(request.url_str()) {
            debug!("Dynamic route, not intercepting {}", request.url);
            return Ok(FetchOutcome::Passthrough(PassReason::DynamicRoute));
        }

        let key = request.cache_key();
        if let Some(cached) = self.storage.match_any(&key).await? {
            debug!("Cache hit {}", key);
            return Ok(FetchOutcome::respond(cached, ResponseSource::Cache));
        }

        match self.network.fetch(&request).await {
            Ok(response) => Ok(self.from_network(&request, response)),
            Err(e) => self.offline(&request, e).await,
        }
    }

    fn from_network(&self, request: &Request, response: Response) -> FetchOutcome {
        if !response.is_cacheable() || !self.settings.routes.is_static(request.url_str()) {
            return FetchOutcome::respond(response, ResponseSource::Network);
        }

        let storage = Arc::clone(&self.storage);
        let bucket = self.settings.buckets.runtime_bucket.clone();
        let key = request.cache_key();
        let copy = response.clone();
        self.background.spawn(format!("store {} in {}", key, bucket), async move {
            storage.put(&bucket, key, copy).await
        });

        FetchOutcome::respond(response, ResponseSource::NetworkStored)
    }

    async fn offline(&self, request: &Request, err: OffgridError) -> OffgridResult<FetchOutcome> {
        warn!("Fetch failed for {}: {}", request.url, err);

        if request.destination == Destination::Document {
            if let Some(page) = self.storage.match_any(&self.settings.fallback_key).await? {
                return Ok(FetchOutcome::respond(page, ResponseSource::OfflinePage));
            }
            let notice = Response::offline_notice(&self.settings.offline_notice);
            return Ok(FetchOutcome::respond(notice, ResponseSource::OfflineNotice));
        }

        match self.storage.match_any(&request.cache_key()).await? {
            Some(cached) => Ok(FetchOutcome::respond(cached, ResponseSource::CacheFallback)),
            None => Err(OffgridError::unavailable(request.url_str(), err)),
        }
    }
}
