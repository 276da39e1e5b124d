//! Pipeline Facade
//!
//! Runs metrics → ranking → trends → scoring for one target user against one
//! snapshot. Any stage failure aborts the request; there are no partial
//! recommendation lists.

use std::collections::BTreeMap;

use crate::analysis::{MetricAggregator, NetworkRanker, RecommendationScorer, TrendDetector};
use crate::config::PipelineConfig;
use crate::error::{InsightError, Result};
use crate::model::{RecommendationReport, UserId, UserMetrics};
use crate::snapshot::Snapshot;

/// Validated configuration plus the stage sequence
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Fails with [`InsightError::Config`] before any computation if the
    /// configuration is invalid
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Produce the full recommendation report for `target`
    pub fn recommend(&self, snapshot: &Snapshot, target: &UserId) -> Result<RecommendationReport> {
        let user = snapshot
            .user(target)
            .ok_or_else(|| InsightError::missing(target, "user record"))?;

        tracing::info!(user = %target, as_of = %snapshot.as_of(), "computing recommendations");

        let aggregator = MetricAggregator::new(
            self.config.activity_window,
            self.config.influence.clone(),
            snapshot.as_of(),
        );
        let metrics = metrics_for(&aggregator, snapshot, target)?;

        let mut metrics_by_user: BTreeMap<UserId, UserMetrics> = BTreeMap::new();
        for edge in snapshot.outbound_edges(target) {
            let peer = &edge.target;
            if peer == target || metrics_by_user.contains_key(peer) {
                continue;
            }
            match metrics_for(&aggregator, snapshot, peer) {
                Ok(peer_metrics) => {
                    metrics_by_user.insert(peer.clone(), peer_metrics);
                }
                Err(InsightError::MissingData { record, .. }) => {
                    tracing::debug!(user = %target, peer = %peer, record, "data gap, peer skipped");
                }
                Err(e) => return Err(e),
            }
        }

        let ranker = NetworkRanker::new(self.config.top_performers, self.config.selection_fallback);
        let mut network = ranker.rank_network(target, snapshot.edges(), &metrics_by_user);
        for peer in &mut network {
            peer.handle = snapshot.user(&peer.user).map(|u| u.handle.clone());
        }
        let top_performers = ranker.top_performers(&network)?;
        tracing::debug!(
            user = %target,
            network = network.len(),
            top = top_performers.len(),
            "network ranked"
        );

        let detector = TrendDetector::new(self.config.trend_window, snapshot.as_of());
        let trends = detector.detect_trends(&top_performers, snapshot.trades_by_user());

        let scorer = RecommendationScorer::new(
            self.config.strong_threshold,
            self.config.confidence.clone(),
            self.config.trend_window,
        )
        .with_min_confidence(self.config.min_confidence);
        let mut recommendations = scorer.score(snapshot.holdings_for(target), &metrics, &trends)?;
        if let Some(max) = self.config.max_recommendations {
            recommendations.truncate(max);
        }

        tracing::info!(
            user = %target,
            recommendations = recommendations.len(),
            trends = trends.len(),
            "recommendations ready"
        );

        Ok(RecommendationReport {
            user: target.clone(),
            handle: user.handle.clone(),
            as_of: snapshot.as_of(),
            metrics,
            network,
            top_performers,
            trends,
            recommendations,
        })
    }
}

fn metrics_for(aggregator: &MetricAggregator, snapshot: &Snapshot, user: &UserId) -> Result<UserMetrics> {
    aggregator.compute_metrics(
        user,
        snapshot.holdings_for(user),
        snapshot.trades_for(user),
        snapshot.profit_loss_for(user),
        snapshot.inbound_edges(user),
    )
}
