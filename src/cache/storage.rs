//! Cache storage abstraction
//!
//! Provides a trait for bucket operations so the agent can run against
//! the in-memory store or any host-provided response cache.

use crate::error::OffgridResult;
use crate::http::{CacheKey, Response};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored response with metadata
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub response: Response,
    /// When the entry was stored
    pub cached_at: DateTime<Utc>,
    /// Body size in bytes
    pub size: usize,
}

impl CacheEntry {
    pub fn new(key: CacheKey, response: Response, cached_at: DateTime<Utc>) -> Self {
        let size = response.body.len();
        Self {
            key,
            response,
            cached_at,
            size,
        }
    }
}

/// Summary of one bucket
#[derive(Debug, Clone, Serialize)]
pub struct BucketInfo {
    pub name: String,
    pub entries: usize,
    pub size_bytes: usize,
    pub created_at: DateTime<Utc>,
}

/// Abstract response cache
///
/// Every operation is atomic on its own; callers never hold a bucket
/// across an await point.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the bucket if it does not exist
    async fn open(&self, bucket: &str) -> OffgridResult<()>;

    /// Store a response, replacing any entry under the same key.
    /// Opens the bucket if needed.
    async fn put(&self, bucket: &str, key: CacheKey, response: Response) -> OffgridResult<()>;

    /// Look up a key in one bucket
    async fn match_in(&self, bucket: &str, key: &CacheKey) -> OffgridResult<Option<Response>>;

    /// Look up a key across all buckets in creation order
    async fn match_any(&self, key: &CacheKey) -> OffgridResult<Option<Response>>;

    /// Names of all buckets in creation order
    async fn keys(&self) -> OffgridResult<Vec<String>>;

    /// Delete a bucket and everything in it. Returns whether it existed.
    async fn delete(&self, bucket: &str) -> OffgridResult<bool>;

    /// Entries of one bucket, ordered by key
    async fn entries(&self, bucket: &str) -> OffgridResult<Vec<CacheEntry>>;

    /// Summaries of all buckets
    async fn describe(&self) -> OffgridResult<Vec<BucketInfo>>;
}
