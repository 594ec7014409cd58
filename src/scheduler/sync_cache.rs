// src/scheduler/sync_cache.rs

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::types::TargetScope;

/// Last successful pull per scope, with a shared TTL.
///
/// A scope that was never pulled is always due.
#[derive(Debug)]
pub struct SyncCache {
    ttl: TimeDelta,
    last_sync: HashMap<TargetScope, DateTime<Utc>>,
}

impl SyncCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
            last_sync: HashMap::new(),
        }
    }

    pub fn is_due(&self, scope: TargetScope, now: DateTime<Utc>) -> bool {
        match self.last_sync.get(&scope) {
            Some(last) => now.signed_duration_since(*last) >= self.ttl,
            None => true,
        }
    }

    pub fn mark(&mut self, scope: TargetScope, now: DateTime<Utc>) {
        debug!(%scope, "sync cache refreshed");
        self.last_sync.insert(scope, now);
    }

    pub fn last_sync(&self, scope: TargetScope) -> Option<DateTime<Utc>> {
        self.last_sync.get(&scope).copied()
    }
}
