//! # trade-insight
//!
//! Investment recommendations driven by what the best traders in a user's
//! social network are doing right now.
//!
//! ## Pipeline
//!
//! Each request runs four stages against one immutable [`Snapshot`]:
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Metric     │   │   Network    │   │    Trend     │   │Recommendation│
//! │  Aggregator  │──▶│    Ranker    │──▶│   Detector   │──▶│    Scorer    │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//!   P/L, holdings,     one-hop peers      net buy/sell       buy / sell /
//!   frequency,         ranked by P/L,     pressure per       hold / watch
//!   influence          top-K slice        asset, [-1, 1]     + confidence
//! ```
//!
//! ## Example: one network, one week
//!
//! ```text
//! 5 top performers, 7-day window
//! │  SOL  █████  5 buying, 0 selling   strength +1.00  → buy  (not held)
//! │  DOGE ████   0 buying, 4 selling   strength -0.80  → sell (held)
//! │  ETH  ███    3 buying, 0 selling   strength +0.60  → hold (held)
//! │  LINK        1 buying, 1 selling   strength  0.00  → watch (held)
//! ```
//!
//! The pipeline is a pure function of `(snapshot, user, config)`: lookback
//! windows are anchored at the snapshot's `as_of`, never the system clock,
//! and every ordering has a total tie-break.

pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod service;
pub mod snapshot;
pub mod source;

pub use config::{
    ConfidenceWeights, InfluenceWeights, LookbackWindow, PipelineConfig, SelectionFallback,
    TopPerformers,
};
pub use error::{InsightError, Result};
pub use model::{
    RankedPeer, Recommendation, RecommendationAction, RecommendationReport, TrendDirection,
    TrendSignal, User, UserId, UserMetrics,
};
pub use pipeline::Pipeline;
pub use service::InsightService;
pub use snapshot::{Snapshot, SnapshotRecords, SnapshotStore};
pub use source::{InMemorySource, JsonFileSource, RecordSource};
