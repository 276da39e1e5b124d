//! Domain Models
//!
//! Normalized records supplied by the loader, plus the derived shapes the
//! pipeline produces. Uses `rust_decimal` for all monetary values - never use
//! f64 for money!

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stable user identifier
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user known to the snapshot
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    /// Display handle (e.g., "@alice")
    pub handle: String,
}

impl User {
    pub fn new(id: impl Into<UserId>, handle: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: handle.into(),
        }
    }
}

/// One asset position held by a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingRecord {
    pub user: UserId,

    /// Asset symbol as reported by the source (e.g., "ETH", "Fuji AVAX")
    pub symbol: String,

    pub quantity: Decimal,

    /// Current value in USD, taken from the source record
    pub value: Decimal,
}

impl HoldingRecord {
    pub fn new(
        user: impl Into<UserId>,
        symbol: impl Into<String>,
        quantity: Decimal,
        value: Decimal,
    ) -> Self {
        Self {
            user: user.into(),
            symbol: symbol.into().trim().to_string(),
            quantity,
            value,
        }
    }

    pub fn is_open(&self) -> bool {
        self.quantity > Decimal::ZERO
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
        }
    }
}

/// A single executed trade
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub user: UserId,
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: Decimal,

    /// Trade value in USD
    pub value: Decimal,

    pub timestamp: DateTime<Utc>,
}

impl TradeRecord {
    pub fn new(
        user: impl Into<UserId>,
        symbol: impl Into<String>,
        action: TradeAction,
        quantity: Decimal,
        value: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user: user.into(),
            symbol: symbol.into().trim().to_string(),
            action,
            quantity,
            value,
            timestamp,
        }
    }
}

/// Profit/loss snapshot for one user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitLossRecord {
    pub user: UserId,
    pub realized: Decimal,
    pub unrealized: Decimal,
}

impl ProfitLossRecord {
    pub fn new(user: impl Into<UserId>, realized: Decimal, unrealized: Decimal) -> Self {
        Self {
            user: user.into(),
            realized,
            unrealized,
        }
    }

    pub fn total(&self) -> Decimal {
        self.realized + self.unrealized
    }
}

/// Directed interaction from `source` to `target` (source follows/mentions target)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SocialEdge {
    pub source: UserId,
    pub target: UserId,
    pub weight: f64,
}

impl SocialEdge {
    pub fn new(source: impl Into<UserId>, target: impl Into<UserId>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Derived performance and influence metrics for one user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserMetrics {
    pub user: UserId,

    /// Realized + unrealized
    pub total_pnl: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,

    /// Sum of current holding values
    pub holdings_value: Decimal,

    /// Trades inside the activity window
    pub trade_count: usize,

    /// Trades per day over the activity window
    pub trade_frequency: f64,

    pub unique_assets_traded: usize,
    pub avg_trade_value: Decimal,

    pub inbound_edges: usize,
    pub inbound_weight: f64,

    /// Normalized to [0, 100)
    pub social_influence: f64,
}

/// Net pressure of a trend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Accumulate,
    Distribute,
    Neutral,
}

impl TrendDirection {
    pub fn from_strength(strength: f64) -> Self {
        if strength > 0.0 {
            Self::Accumulate
        } else if strength < 0.0 {
            Self::Distribute
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accumulate => f.write_str("accumulate"),
            Self::Distribute => f.write_str("distribute"),
            Self::Neutral => f.write_str("neutral"),
        }
    }
}

/// A network member placed in the ranking
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedPeer {
    /// 1-based position in the ranking
    pub rank: usize,
    pub user: UserId,
    pub handle: Option<String>,
    pub metrics: UserMetrics,

    /// Sum of edge weights from the target user to this peer
    pub interaction_weight: f64,
}

/// Buy/sell pressure on one asset among top performers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendSignal {
    pub symbol: String,

    /// Distinct top performers that traded the asset in the window
    pub performer_count: usize,
    pub buyers: usize,
    pub sellers: usize,

    pub direction: TrendDirection,

    /// (buyers - sellers) / top performers considered, in [-1, 1]
    pub strength: f64,

    /// Value of all window trades in this asset
    pub total_volume: Decimal,

    /// Contributing performers, in rank order
    pub contributors: Vec<UserId>,

    /// How much the target trusts this set of contributors, in [0, 1)
    pub segment_trust: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationAction {
    Buy,
    Sell,
    Hold,
    Watch,
}

impl fmt::Display for RecommendationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
            Self::Hold => f.write_str("hold"),
            Self::Watch => f.write_str("watch"),
        }
    }
}

/// Facts a recommendation was derived from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupportingMetrics {
    pub strength: f64,
    pub direction: TrendDirection,
    pub performer_count: usize,
    pub buyers: usize,
    pub sellers: usize,
    pub total_volume: Decimal,
    pub segment_trust: f64,
    pub contributors: Vec<UserId>,

    /// Current value of the target's position, if held
    pub held_value: Option<Decimal>,
}

/// A single ranked recommendation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    pub action: RecommendationAction,

    /// In [0, 1]
    pub confidence: f64,

    pub reasoning: String,
    pub supporting: SupportingMetrics,
}

/// Everything one recommendation request produced
///
/// Carries no wall-clock time, so identical inputs serialize identically.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendationReport {
    pub user: UserId,
    pub handle: String,

    /// Snapshot time every lookback window was anchored to
    pub as_of: DateTime<Utc>,

    pub metrics: UserMetrics,
    pub network: Vec<RankedPeer>,
    pub top_performers: Vec<RankedPeer>,
    pub trends: Vec<TrendSignal>,
    pub recommendations: Vec<Recommendation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pnl_total() {
        let pnl = ProfitLossRecord::new("alice", dec!(1200.50), dec!(-200.25));
        assert_eq!(pnl.total(), dec!(1000.25));
    }

    #[test]
    fn test_direction_from_strength() {
        assert_eq!(TrendDirection::from_strength(0.4), TrendDirection::Accumulate);
        assert_eq!(TrendDirection::from_strength(-0.1), TrendDirection::Distribute);
        assert_eq!(TrendDirection::from_strength(0.0), TrendDirection::Neutral);
    }

    #[test]
    fn test_symbols_are_trimmed() {
        let holding = HoldingRecord::new("alice", "  lucky money ", dec!(3), dec!(0));
        assert_eq!(holding.symbol, "lucky money");
        assert!(holding.is_open());
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId::from("BillSun")).unwrap();
        assert_eq!(json, "\"BillSun\"");
    }
}
