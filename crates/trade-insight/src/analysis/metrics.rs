//! Metric Aggregator
//!
//! Derives [`UserMetrics`] from one user's holdings, trades, P/L record and
//! inbound social edges.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::{InfluenceWeights, LookbackWindow};
use crate::error::{InsightError, Result};
use crate::model::{HoldingRecord, ProfitLossRecord, SocialEdge, TradeRecord, UserId, UserMetrics};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Computes per-user metrics against a fixed snapshot time
pub struct MetricAggregator {
    window: LookbackWindow,
    influence: InfluenceWeights,
    as_of: DateTime<Utc>,
}

impl MetricAggregator {
    pub const fn new(window: LookbackWindow, influence: InfluenceWeights, as_of: DateTime<Utc>) -> Self {
        Self {
            window,
            influence,
            as_of,
        }
    }

    /// Compute metrics for `user`
    ///
    /// Records belonging to other users are ignored. `social_activity` is
    /// searched for edges pointing at `user`; self-edges do not count.
    pub fn compute_metrics(
        &self,
        user: &UserId,
        holdings: &[HoldingRecord],
        trades: &[TradeRecord],
        pnl: Option<&ProfitLossRecord>,
        social_activity: &[SocialEdge],
    ) -> Result<UserMetrics> {
        let pnl = pnl
            .filter(|p| p.user == *user)
            .ok_or_else(|| InsightError::missing(user, "profit/loss record"))?;

        let holdings_value: Decimal = holdings
            .iter()
            .filter(|h| h.user == *user)
            .map(|h| h.value)
            .sum();

        let window_trades: Vec<&TradeRecord> = trades
            .iter()
            .filter(|t| t.user == *user && self.window.contains(t.timestamp, self.as_of))
            .collect();

        let trade_count = window_trades.len();
        let trade_frequency = count_as_f64(trade_count) / self.window_days(&window_trades);

        let unique_assets_traded = window_trades
            .iter()
            .map(|t| t.symbol.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        let total_traded: Decimal = window_trades.iter().map(|t| t.value).sum();
        let avg_trade_value = if trade_count > 0 {
            total_traded / Decimal::from(trade_count)
        } else {
            Decimal::ZERO
        };

        let (inbound_edges, inbound_weight) = social_activity
            .iter()
            .filter(|e| e.target == *user && !e.is_self_loop())
            .fold((0usize, 0.0_f64), |(count, weight), e| (count + 1, weight + e.weight));

        Ok(UserMetrics {
            user: user.clone(),
            total_pnl: pnl.total(),
            realized_pnl: pnl.realized,
            unrealized_pnl: pnl.unrealized,
            holdings_value,
            trade_count,
            trade_frequency,
            unique_assets_traded,
            avg_trade_value,
            inbound_edges,
            inbound_weight,
            social_influence: influence_score(&self.influence, inbound_edges, inbound_weight),
        })
    }

    /// Window length in days, never below one
    fn window_days(&self, window_trades: &[&TradeRecord]) -> f64 {
        let start = match self.window.start(self.as_of) {
            Some(start) => Some(start),
            None => window_trades.iter().map(|t| t.timestamp).min(),
        };

        start.map_or(1.0, |start| {
            #[allow(clippy::cast_precision_loss)]
            let days = (self.as_of - start).num_seconds() as f64 / SECONDS_PER_DAY;
            days.max(1.0)
        })
    }
}

/// Social influence in [0, 100), strictly increasing in both inputs
pub fn influence_score(weights: &InfluenceWeights, inbound_edges: usize, inbound_weight: f64) -> f64 {
    let count_part = saturation(count_as_f64(inbound_edges), weights.edge_count_half);
    let weight_part = saturation(inbound_weight, weights.edge_weight_half);
    let total = weights.edge_count_weight + weights.edge_weight_weight;

    let score = 100.0
        * (weights.edge_count_weight * count_part + weights.edge_weight_weight * weight_part)
        / total;
    score.clamp(0.0, 100.0)
}

/// `x / (x + half)` for non-negative `x`, reaching 1.0 once `x` overflows
pub(crate) fn saturation(x: f64, half: f64) -> f64 {
    if x.is_nan() || x <= 0.0 {
        0.0
    } else if x.is_infinite() {
        1.0
    } else {
        (x / (x + half)).min(1.0)
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn count_as_f64(count: usize) -> f64 {
    count as f64
}
