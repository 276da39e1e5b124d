//! Report cache keyed by (user, snapshot version)
//!
//! A report is a pure function of the snapshot and the user, so a cached
//! entry is valid for exactly as long as its snapshot version is current.
//! The cache tracks that version itself; version check and insert happen
//! under one write lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::model::{RecommendationReport, UserId};

#[derive(Default)]
struct CacheState {
    version: u64,
    entries: HashMap<(UserId, u64), Arc<RecommendationReport>>,
}

pub struct RecommendationCache {
    state: RwLock<CacheState>,
}

impl RecommendationCache {
    /// Empty cache accepting reports built from `version`
    pub fn new(version: u64) -> Self {
        Self {
            state: RwLock::new(CacheState {
                version,
                entries: HashMap::new(),
            }),
        }
    }

    pub async fn version(&self) -> u64 {
        self.state.read().await.version
    }

    pub async fn get(&self, user: &UserId, version: u64) -> Option<Arc<RecommendationReport>> {
        self.state
            .read()
            .await
            .entries
            .get(&(user.clone(), version))
            .cloned()
    }

    /// Store `report` if `version` is still the current one; returns whether
    /// it was stored
    pub async fn insert(&self, user: UserId, version: u64, report: Arc<RecommendationReport>) -> bool {
        let mut state = self.state.write().await;
        if version != state.version {
            return false;
        }
        state.entries.insert((user, version), report);
        true
    }

    /// Move to `version` and drop every entry built from another one; returns
    /// how many went. An older version than the current one is ignored.
    pub async fn retain_version(&self, version: u64) -> usize {
        let mut state = self.state.write().await;
        state.version = state.version.max(version);
        let current = state.version;
        let before = state.entries.len();
        state.entries.retain(|(_, v), _| *v == current);
        before - state.entries.len()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserMetrics;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn report(user: &str) -> Arc<RecommendationReport> {
        Arc::new(RecommendationReport {
            user: user.into(),
            handle: format!("@{user}"),
            as_of: Utc.with_ymd_and_hms(2025, 2, 14, 12, 0, 0).unwrap(),
            metrics: UserMetrics {
                user: user.into(),
                total_pnl: Decimal::ZERO,
                realized_pnl: Decimal::ZERO,
                unrealized_pnl: Decimal::ZERO,
                holdings_value: Decimal::ZERO,
                trade_count: 0,
                trade_frequency: 0.0,
                unique_assets_traded: 0,
                avg_trade_value: Decimal::ZERO,
                inbound_edges: 0,
                inbound_weight: 0.0,
                social_influence: 0.0,
            },
            network: Vec::new(),
            top_performers: Vec::new(),
            trends: Vec::new(),
            recommendations: Vec::new(),
        })
    }

    #[tokio::test]
    async fn test_entries_are_scoped_to_version() {
        let cache = RecommendationCache::new(1);
        assert!(cache.insert("alice".into(), 1, report("alice")).await);
        assert!(cache.insert("bob".into(), 1, report("bob")).await);
        assert!(cache.get(&"alice".into(), 1).await.is_some());
        assert!(cache.get(&"bob".into(), 2).await.is_none());

        assert_eq!(cache.retain_version(2).await, 2);
        assert!(cache.is_empty().await);
        assert!(cache.insert("alice".into(), 2, report("alice")).await);
        assert!(cache.get(&"alice".into(), 2).await.is_some());
    }

    #[tokio::test]
    async fn test_stale_report_is_not_stored() {
        let cache = RecommendationCache::new(1);
        cache.retain_version(2).await;
        assert!(!cache.insert("alice".into(), 1, report("alice")).await);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_version_never_moves_backwards() {
        let cache = RecommendationCache::new(1);
        cache.retain_version(3).await;
        cache.retain_version(2).await;
        assert_eq!(cache.version().await, 3);
        assert!(!cache.insert("alice".into(), 2, report("alice")).await);
    }
}
