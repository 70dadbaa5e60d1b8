//! Process-local cache of the last successful, non-empty extraction.
//!
//! One slot, no persistence: a restart starts cold. Readers never block each
//! other; writers replace the whole record so a reader sees either the old
//! list or the new one, never a mix.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use facdir_core::FacultyEntry;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub fetched_at: SystemTime,
    pub data: Vec<FacultyEntry>,
}

impl CacheRecord {
    pub fn age(&self) -> Duration {
        // A clock step backwards reads as "just fetched".
        SystemTime::now()
            .duration_since(self.fetched_at)
            .unwrap_or(Duration::ZERO)
    }

    /// Fresh while `age < ttl`; a record exactly `ttl` old is stale.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age() < ttl
    }
}

#[derive(Debug, Clone, Default)]
pub struct FacultyCache {
    slot: Arc<RwLock<Option<CacheRecord>>>,
}

impl FacultyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<CacheRecord> {
        self.slot.read().await.clone()
    }

    /// The cached list if it is younger than `ttl`.
    pub async fn get_fresh(&self, ttl: Duration) -> Option<Vec<FacultyEntry>> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|r| r.is_fresh(ttl))
            .map(|r| r.data.clone())
    }

    pub async fn is_fresh(&self, ttl: Duration) -> bool {
        self.slot
            .read()
            .await
            .as_ref()
            .is_some_and(|r| r.is_fresh(ttl))
    }

    /// Replace the record, stamped now. Empty lists are ignored.
    pub async fn set(&self, data: Vec<FacultyEntry>) -> bool {
        self.set_at(data, SystemTime::now()).await
    }

    /// Replace the record with an explicit timestamp. Returns whether it was stored.
    pub async fn set_at(&self, data: Vec<FacultyEntry>, fetched_at: SystemTime) -> bool {
        if data.is_empty() {
            return false;
        }
        *self.slot.write().await = Some(CacheRecord { fetched_at, data });
        true
    }

    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }
}
