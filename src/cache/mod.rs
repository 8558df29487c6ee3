//! Named response buckets
//!
//! The agent keeps responses in named buckets. Bucket names carry a
//! version suffix; bumping the suffix makes every older bucket stale, and
//! stale buckets are purged when the new version activates.
//!
//! # Buckets
//!
//! | Bucket | Default name | Filled by |
//! |--------|--------------|-----------|
//! | Static | `red-social-v1` | install-time precache |
//! | Runtime | `red-social-runtime-v1` | static assets fetched while running |
//!
//! Lookups are global: a request matches an entry in whichever bucket
//! holds it, searched in bucket creation order.

pub mod memory;
pub mod precache;
pub mod storage;

pub use memory::MemoryStorage;
pub use precache::add_all;
pub use storage::{BucketInfo, CacheEntry, CacheStorage};

use serde::Serialize;

/// The two bucket names considered current for a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketNames {
    pub static_bucket: String,
    pub runtime_bucket: String,
}

impl BucketNames {
    /// Derive bucket names from a prefix and a version suffix
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            static_bucket: format!("{}-{}", prefix, version),
            runtime_bucket: format!("{}-runtime-{}", prefix, version),
        }
    }

    /// Whether a bucket belongs to this deployment
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_bucket || name == self.runtime_bucket
    }

    /// Names from `existing` that are not current
    pub fn stale<'a>(&self, existing: &'a [String]) -> Vec<&'a str> {
        existing
            .iter()
            .map(String::as_str)
            .filter(|name| !self.is_current(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_version() {
        let names = BucketNames::new("red-social", "v1");
        assert_eq!(names.static_bucket, "red-social-v1");
        assert_eq!(names.runtime_bucket, "red-social-runtime-v1");
    }

    #[test]
    fn stale_excludes_current() {
        let names = BucketNames::new("red-social", "v2");
        let existing = vec![
            "red-social-v1".to_string(),
            "red-social-v2".to_string(),
            "red-social-runtime-v1".to_string(),
            "red-social-runtime-v2".to_string(),
            "other".to_string(),
        ];
        assert_eq!(
            names.stale(&existing),
            vec!["red-social-v1", "red-social-runtime-v1", "other"]
        );
    }
}
