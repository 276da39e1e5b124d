//! Insight Service
//!
//! Serves recommendation requests against the current snapshot and keeps
//! the report cache in step with snapshot replacement.

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::model::{RecommendationReport, User, UserId};
use crate::pipeline::Pipeline;
use crate::snapshot::{INITIAL_VERSION, Snapshot, SnapshotHandle, SnapshotStore};
use crate::source::RecordSource;

use super::RecommendationCache;

/// Store + pipeline + cache
///
/// Requests read whichever snapshot is current when they start and keep it
/// for their whole run, so a concurrent refresh never mixes two snapshots
/// into one report.
pub struct InsightService {
    pipeline: Pipeline,
    store: SnapshotStore,
    cache: Option<RecommendationCache>,
}

impl InsightService {
    pub fn new(config: PipelineConfig, snapshot: Snapshot) -> Result<Self> {
        Ok(Self {
            pipeline: Pipeline::new(config)?,
            store: SnapshotStore::new(snapshot),
            cache: Some(RecommendationCache::new(INITIAL_VERSION)),
        })
    }

    pub async fn from_source(config: PipelineConfig, source: &dyn RecordSource) -> Result<Self> {
        let pipeline = Pipeline::new(config)?;
        let snapshot = source.load().await?;
        tracing::info!(source = source.name(), users = snapshot.users().count(), "snapshot loaded");
        Ok(Self {
            pipeline,
            store: SnapshotStore::new(snapshot),
            cache: Some(RecommendationCache::new(INITIAL_VERSION)),
        })
    }

    /// Recompute every request instead of memoizing reports
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub async fn snapshot(&self) -> SnapshotHandle {
        self.store.current().await
    }

    pub async fn users(&self) -> Vec<User> {
        self.store.current().await.snapshot.users().cloned().collect()
    }

    /// Reload from `source` and install the result; the old snapshot stays
    /// current if loading fails
    pub async fn refresh(&self, source: &dyn RecordSource) -> Result<u64> {
        let snapshot = source.load().await?;
        Ok(self.replace_snapshot(snapshot).await)
    }

    pub async fn replace_snapshot(&self, snapshot: Snapshot) -> u64 {
        let version = self.store.replace(snapshot).await;
        if let Some(cache) = &self.cache {
            let evicted = cache.retain_version(version).await;
            tracing::debug!(version, evicted, "report cache pruned");
        }
        version
    }

    pub async fn recommend(&self, user: &UserId) -> Result<Arc<RecommendationReport>> {
        let SnapshotHandle { version, snapshot } = self.store.current().await;

        if let Some(cache) = &self.cache {
            if let Some(report) = cache.get(user, version).await {
                tracing::debug!(user = %user, version, "report cache hit");
                return Ok(report);
            }
        }

        let report = Arc::new(self.pipeline.recommend(&snapshot, user)?);
        self.remember(user, version, &report).await;
        Ok(report)
    }

    /// Cache `report` unless a replace landed while it was being computed
    async fn remember(&self, user: &UserId, version: u64, report: &Arc<RecommendationReport>) {
        if let Some(cache) = &self.cache {
            if !cache.insert(user.clone(), version, Arc::clone(report)).await {
                tracing::debug!(user = %user, version, "snapshot replaced mid-request, report not cached");
            }
        }
    }
}
