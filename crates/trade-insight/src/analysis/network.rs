//! Network Ranker
//!
//! Orders the peers a user follows by performance and slices off the top
//! performers whose trades drive trend detection.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::{SelectionFallback, TopPerformers};
use crate::error::{InsightError, Result};
use crate::model::{RankedPeer, SocialEdge, UserId, UserMetrics};

pub struct NetworkRanker {
    selection: TopPerformers,
    fallback: SelectionFallback,
}

impl NetworkRanker {
    pub const fn new(selection: TopPerformers, fallback: SelectionFallback) -> Self {
        Self {
            selection,
            fallback,
        }
    }

    /// Rank everyone `target` has an outbound edge to
    ///
    /// Peers without an entry in `metrics_by_user` are left out rather than
    /// ranked as zero. The result is a strict total order (see
    /// [`ranking_order`]) with 1-based ranks.
    pub fn rank_network(
        &self,
        target: &UserId,
        edges: &[SocialEdge],
        metrics_by_user: &BTreeMap<UserId, UserMetrics>,
    ) -> Vec<RankedPeer> {
        let mut interaction: BTreeMap<&UserId, f64> = BTreeMap::new();
        for edge in edges {
            if edge.source == *target && edge.target != *target {
                *interaction.entry(&edge.target).or_insert(0.0) += edge.weight;
            }
        }

        let mut ranked: Vec<RankedPeer> = interaction
            .into_iter()
            .filter_map(|(peer, weight)| {
                let Some(metrics) = metrics_by_user.get(peer) else {
                    tracing::debug!(user = %target, peer = %peer, "peer has no metrics, left out of ranking");
                    return None;
                };
                Some(RankedPeer {
                    rank: 0,
                    user: peer.clone(),
                    handle: None,
                    metrics: metrics.clone(),
                    interaction_weight: weight,
                })
            })
            .collect();

        ranked.sort_by(|a, b| ranking_order(&a.metrics, &b.metrics));
        for (i, peer) in ranked.iter_mut().enumerate() {
            peer.rank = i + 1;
        }
        ranked
    }

    /// The top-K slice of an already ranked network
    pub fn top_performers(&self, ranked: &[RankedPeer]) -> Result<Vec<RankedPeer>> {
        let network_size = ranked.len();
        if network_size == 0 {
            return Ok(Vec::new());
        }

        let requested = self.selection.requested(network_size);
        if requested >= network_size && self.fallback == SelectionFallback::Reject {
            return Err(InsightError::Config(format!(
                "top performer slice of {requested} is not smaller than the network of {network_size}"
            )));
        }

        Ok(ranked.iter().take(requested).cloned().collect())
    }
}

/// Total P/L descending, then holdings value descending, then user id ascending
pub fn ranking_order(a: &UserMetrics, b: &UserMetrics) -> Ordering {
    b.total_pnl
        .cmp(&a.total_pnl)
        .then_with(|| b.holdings_value.cmp(&a.holdings_value))
        .then_with(|| a.user.cmp(&b.user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn metrics(user: &str, pnl: Decimal, holdings: Decimal) -> UserMetrics {
        UserMetrics {
            user: user.into(),
            total_pnl: pnl,
            realized_pnl: pnl,
            unrealized_pnl: Decimal::ZERO,
            holdings_value: holdings,
            trade_count: 0,
            trade_frequency: 0.0,
            unique_assets_traded: 0,
            avg_trade_value: Decimal::ZERO,
            inbound_edges: 0,
            inbound_weight: 0.0,
            social_influence: 0.0,
        }
    }

    fn by_user(all: Vec<UserMetrics>) -> BTreeMap<UserId, UserMetrics> {
        all.into_iter().map(|m| (m.user.clone(), m)).collect()
    }

    fn ranker(k: usize) -> NetworkRanker {
        NetworkRanker::new(TopPerformers::Count(k), SelectionFallback::WholeNetwork)
    }

    #[test]
    fn test_ranks_by_pnl_then_holdings_then_id() {
        let all = by_user(vec![
            metrics("dave", dec!(100), dec!(50)),
            metrics("bob", dec!(500), dec!(10)),
            metrics("carol", dec!(100), dec!(50)),
            metrics("erin", dec!(100), dec!(80)),
        ]);
        let edges = vec![
            SocialEdge::new("alice", "dave", 1.0),
            SocialEdge::new("alice", "bob", 1.0),
            SocialEdge::new("alice", "carol", 1.0),
            SocialEdge::new("alice", "erin", 1.0),
        ];

        let ranked = ranker(3).rank_network(&"alice".into(), &edges, &all);
        let order: Vec<&str> = ranked.iter().map(|p| p.user.as_str()).collect();
        assert_eq!(order, vec!["bob", "erin", "carol", "dave"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[3].rank, 4);
    }

    #[test]
    fn test_network_is_one_outbound_hop_without_self() {
        let all = by_user(vec![
            metrics("alice", dec!(1000), dec!(0)),
            metrics("bob", dec!(1), dec!(0)),
            metrics("carol", dec!(2), dec!(0)),
            metrics("dave", dec!(3), dec!(0)),
        ]);
        let edges = vec![
            SocialEdge::new("alice", "alice", 5.0),
            SocialEdge::new("alice", "bob", 1.0),
            SocialEdge::new("carol", "alice", 1.0),
            SocialEdge::new("bob", "dave", 1.0),
        ];

        let ranked = ranker(5).rank_network(&"alice".into(), &edges, &all);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].user.as_str(), "bob");
    }

    #[test]
    fn test_peers_without_metrics_are_excluded() {
        let all = by_user(vec![metrics("bob", dec!(-50), dec!(0))]);
        let edges = vec![
            SocialEdge::new("alice", "bob", 1.0),
            SocialEdge::new("alice", "ghost", 1.0),
        ];
        let ranked = ranker(5).rank_network(&"alice".into(), &edges, &all);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].user.as_str(), "bob");
    }

    #[test]
    fn test_interaction_weight_sums_parallel_edges() {
        let all = by_user(vec![metrics("bob", dec!(1), dec!(0))]);
        let edges = vec![
            SocialEdge::new("alice", "bob", 1.5),
            SocialEdge::new("alice", "bob", 2.0),
        ];
        let ranked = ranker(5).rank_network(&"alice".into(), &edges, &all);
        assert!((ranked[0].interaction_weight - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_top_slice_and_fallbacks() {
        let all = by_user(vec![
            metrics("bob", dec!(3), dec!(0)),
            metrics("carol", dec!(2), dec!(0)),
            metrics("dave", dec!(1), dec!(0)),
        ]);
        let edges: Vec<_> = ["bob", "carol", "dave"]
            .iter()
            .map(|peer| SocialEdge::new("alice", *peer, 1.0))
            .collect();
        let ranked = ranker(2).rank_network(&"alice".into(), &edges, &all);

        let top = ranker(2).top_performers(&ranked).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].user.as_str(), "bob");

        let whole = ranker(10).top_performers(&ranked).unwrap();
        assert_eq!(whole.len(), 3);

        let strict = NetworkRanker::new(TopPerformers::Count(10), SelectionFallback::Reject);
        assert!(matches!(strict.top_performers(&ranked), Err(InsightError::Config(_))));
    }

    #[test]
    fn test_empty_network_yields_no_top_performers() {
        let strict = NetworkRanker::new(TopPerformers::Count(3), SelectionFallback::Reject);
        let ranked = strict.rank_network(&"alice".into(), &[], &BTreeMap::new());
        assert!(ranked.is_empty());
        assert!(strict.top_performers(&ranked).unwrap().is_empty());
    }
}
