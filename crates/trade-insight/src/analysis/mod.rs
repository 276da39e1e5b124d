//! Recommendation Analysis
//!
//! The four pipeline stages, leaves first: metrics, network ranking, trend
//! detection, scoring.

mod metrics;
mod network;
mod scorer;
mod summary;
mod trends;

pub use metrics::{MetricAggregator, influence_score};
pub use network::{NetworkRanker, ranking_order};
pub use scorer::RecommendationScorer;
pub use trends::{TrendDetector, peer_trust, signal_order};
