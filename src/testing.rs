//! Shared test doubles

use crate::cache::{BucketInfo, CacheEntry, CacheStorage, MemoryStorage};
use crate::clients::Clients;
use crate::error::{OffgridError, OffgridResult};
use crate::http::{CacheKey, Request, Response, ResponseType};
use crate::network::Network;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

pub const ORIGIN: &str = "http://localhost:5000";

pub fn origin() -> Url {
    Url::parse(ORIGIN).unwrap()
}

pub fn url(path: &str) -> String {
    origin().join(path).unwrap().to_string()
}

pub fn get(path: &str) -> Request {
    Request::resolve(&origin(), path).unwrap()
}

/// Basic 200 with a text body
pub fn ok(body: &str) -> Response {
    Response::new(200)
        .with_type(ResponseType::Basic)
        .with_body(body.to_string())
}

/// Network answering from a fixed table. Unknown URLs get a basic 404.
pub struct StubNetwork {
    routes: Mutex<HashMap<String, Response>>,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn respond(&self, path: &str, response: Response) {
        self.routes.lock().unwrap().insert(url(path), response);
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> OffgridResult<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.online.load(Ordering::SeqCst) {
            return Err(OffgridError::Offline(request.url_str().to_string()));
        }
        let routes = self.routes.lock().unwrap();
        Ok(routes
            .get(request.url_str())
            .cloned()
            .unwrap_or_else(|| Response::new(404).with_type(ResponseType::Basic)))
    }
}

/// Memory storage whose deletes fail for chosen bucket names
pub struct FlakyStorage {
    inner: MemoryStorage,
    undeletable: HashSet<String>,
}

impl FlakyStorage {
    pub fn new(undeletable: &[&str]) -> Self {
        Self {
            inner: MemoryStorage::new(),
            undeletable: undeletable.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl CacheStorage for FlakyStorage {
    async fn open(&self, bucket: &str) -> OffgridResult<()> {
        self.inner.open(bucket).await
    }

    async fn put(&self, bucket: &str, key: CacheKey, response: Response) -> OffgridResult<()> {
        self.inner.put(bucket, key, response).await
    }

    async fn match_in(&self, bucket: &str, key: &CacheKey) -> OffgridResult<Option<Response>> {
        self.inner.match_in(bucket, key).await
    }

    async fn match_any(&self, key: &CacheKey) -> OffgridResult<Option<Response>> {
        self.inner.match_any(key).await
    }

    async fn keys(&self) -> OffgridResult<Vec<String>> {
        self.inner.keys().await
    }

    async fn delete(&self, bucket: &str) -> OffgridResult<bool> {
        if self.undeletable.contains(bucket) {
            return Err(OffgridError::Storage(format!("{} is locked", bucket)));
        }
        self.inner.delete(bucket).await
    }

    async fn entries(&self, bucket: &str) -> OffgridResult<Vec<CacheEntry>> {
        self.inner.entries(bucket).await
    }

    async fn describe(&self) -> OffgridResult<Vec<BucketInfo>> {
        self.inner.describe().await
    }
}

/// Memory storage whose writes wait until the gate is opened
pub struct GatedStorage {
    inner: MemoryStorage,
    gate: Arc<Notify>,
}

impl GatedStorage {
    pub fn new() -> Self {
        Self {
            inner: MemoryStorage::new(),
            gate: Arc::new(Notify::new()),
        }
    }

    /// Let one pending or future write through
    pub fn open_gate(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl CacheStorage for GatedStorage {
    async fn open(&self, bucket: &str) -> OffgridResult<()> {
        self.inner.open(bucket).await
    }

    async fn put(&self, bucket: &str, key: CacheKey, response: Response) -> OffgridResult<()> {
        self.gate.notified().await;
        self.inner.put(bucket, key, response).await
    }

    async fn match_in(&self, bucket: &str, key: &CacheKey) -> OffgridResult<Option<Response>> {
        self.inner.match_in(bucket, key).await
    }

    async fn match_any(&self, key: &CacheKey) -> OffgridResult<Option<Response>> {
        self.inner.match_any(key).await
    }

    async fn keys(&self) -> OffgridResult<Vec<String>> {
        self.inner.keys().await
    }

    async fn delete(&self, bucket: &str) -> OffgridResult<bool> {
        self.inner.delete(bucket).await
    }

    async fn entries(&self, bucket: &str) -> OffgridResult<Vec<CacheEntry>> {
        self.inner.entries(bucket).await
    }

    async fn describe(&self) -> OffgridResult<Vec<BucketInfo>> {
        self.inner.describe().await
    }
}

/// Clients double counting claims
#[derive(Default)]
pub struct CountingClients {
    claims: AtomicUsize,
}

impl CountingClients {
    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Clients for CountingClients {
    async fn claim(&self) -> OffgridResult<usize> {
        self.claims.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}
