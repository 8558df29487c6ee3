//! In-memory bucket store

use crate::cache::storage::{BucketInfo, CacheEntry, CacheStorage};
use crate::clock::{Clock, SystemClock};
use crate::error::{OffgridError, OffgridResult};
use crate::http::{CacheKey, Response};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug)]
struct Bucket {
    name: String,
    entries: BTreeMap<CacheKey, CacheEntry>,
    created_at: DateTime<Utc>,
}

impl Bucket {
    fn new(name: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            entries: BTreeMap::new(),
            created_at,
        }
    }

    fn size(&self) -> usize {
        self.entries.values().map(|e| e.size).sum()
    }
}

/// Buckets held in process memory, in creation order
pub struct MemoryStorage {
    buckets: RwLock<Vec<Bucket>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: RwLock::new(Vec::new()),
            clock,
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, bucket: &str) -> OffgridResult<()> {
        let mut buckets = self.buckets.write().await;
        if !buckets.iter().any(|b| b.name == bucket) {
            debug!("Creating bucket {}", bucket);
            buckets.push(Bucket::new(bucket, self.clock.now()));
        }
        Ok(())
    }

    async fn put(&self, bucket: &str, key: CacheKey, response: Response) -> OffgridResult<()> {
        let now = self.clock.now();
        let mut buckets = self.buckets.write().await;

        let index = match buckets.iter().position(|b| b.name == bucket) {
            Some(index) => index,
            None => {
                buckets.push(Bucket::new(bucket, now));
                buckets.len() - 1
            }
        };

        let entry = CacheEntry::new(key.clone(), response, now);
        buckets[index].entries.insert(key, entry);
        Ok(())
    }

    async fn match_in(&self, bucket: &str, key: &CacheKey) -> OffgridResult<Option<Response>> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .find(|b| b.name == bucket)
            .and_then(|b| b.entries.get(key))
            .map(|e| e.response.clone()))
    }

    async fn match_any(&self, key: &CacheKey) -> OffgridResult<Option<Response>> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .find_map(|b| b.entries.get(key))
            .map(|e| e.response.clone()))
    }

    async fn keys(&self) -> OffgridResult<Vec<String>> {
        let buckets = self.buckets.read().await;
        Ok(buckets.iter().map(|b| b.name.clone()).collect())
    }

    async fn delete(&self, bucket: &str) -> OffgridResult<bool> {
        let mut buckets = self.buckets.write().await;
        let before = buckets.len();
        buckets.retain(|b| b.name != bucket);
        Ok(buckets.len() != before)
    }

    async fn entries(&self, bucket: &str) -> OffgridResult<Vec<CacheEntry>> {
        let buckets = self.buckets.read().await;
        buckets
            .iter()
            .find(|b| b.name == bucket)
            .map(|b| b.entries.values().cloned().collect())
            .ok_or_else(|| OffgridError::BucketNotFound(bucket.to_string()))
    }

    async fn describe(&self) -> OffgridResult<Vec<BucketInfo>> {
        let buckets = self.buckets.read().await;
        Ok(buckets
            .iter()
            .map(|b| BucketInfo {
                name: b.name.clone(),
                entries: b.entries.len(),
                size_bytes: b.size(),
                created_at: b.created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;

    fn key(path: &str) -> CacheKey {
        CacheKey::new(Method::Get, &format!("http://localhost:5000{}", path))
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let storage = MemoryStorage::new();
        storage.open("a").await.unwrap();
        storage.open("a").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn put_creates_bucket_lazily() {
        let storage = MemoryStorage::new();
        storage
            .put("runtime", key("/static/a.css"), Response::new(200))
            .await
            .unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["runtime"]);
        let hit = storage.match_in("runtime", &key("/static/a.css")).await.unwrap();
        assert_eq!(hit.map(|r| r.status), Some(200));
    }

    #[tokio::test]
    async fn put_overwrites_same_key() {
        let storage = MemoryStorage::new();
        storage
            .put("b", key("/x"), Response::new(200).with_body("old"))
            .await
            .unwrap();
        storage
            .put("b", key("/x"), Response::new(200).with_body("new"))
            .await
            .unwrap();

        let entries = storage.entries("b").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].response.text(), "new");
        assert_eq!(entries[0].size, 3);
    }

    #[tokio::test]
    async fn match_any_searches_in_creation_order() {
        let storage = MemoryStorage::new();
        storage
            .put("first", key("/x"), Response::new(200).with_body("first"))
            .await
            .unwrap();
        storage
            .put("second", key("/x"), Response::new(200).with_body("second"))
            .await
            .unwrap();

        let hit = storage.match_any(&key("/x")).await.unwrap().unwrap();
        assert_eq!(hit.text(), "first");
        assert!(storage.match_any(&key("/missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_entries() {
        let storage = MemoryStorage::new();
        storage.put("old", key("/x"), Response::new(200)).await.unwrap();

        assert!(storage.delete("old").await.unwrap());
        assert!(!storage.delete("old").await.unwrap());
        assert!(storage.match_any(&key("/x")).await.unwrap().is_none());
        assert!(matches!(
            storage.entries("old").await,
            Err(OffgridError::BucketNotFound(_))
        ));
    }

    #[tokio::test]
    async fn describe_reports_sizes() {
        let storage = MemoryStorage::new();
        storage
            .put("b", key("/a"), Response::new(200).with_body("12345"))
            .await
            .unwrap();
        storage
            .put("b", key("/b"), Response::new(200).with_body("678"))
            .await
            .unwrap();

        let info = storage.describe().await.unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info[0].entries, 2);
        assert_eq!(info[0].size_bytes, 8);
    }
}
