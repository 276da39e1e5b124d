//! Trend Detector
//!
//! Finds the assets top performers are accumulating or distributing inside
//! the trend window.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::metrics::{count_as_f64, saturation};
use crate::config::LookbackWindow;
use crate::model::{RankedPeer, TradeAction, TradeRecord, TrendDirection, TrendSignal, UserId};

pub struct TrendDetector {
    window: LookbackWindow,
    as_of: DateTime<Utc>,
}

#[derive(Default)]
struct AssetTally<'a> {
    buyers: usize,
    sellers: usize,
    volume: Decimal,
    contributors: Vec<&'a RankedPeer>,
}

#[derive(Default)]
struct PerformerActivity {
    buys: usize,
    sells: usize,
    volume: Decimal,
}

impl TrendDetector {
    pub const fn new(window: LookbackWindow, as_of: DateTime<Utc>) -> Self {
        Self { window, as_of }
    }

    pub const fn window(&self) -> LookbackWindow {
        self.window
    }

    /// Aggregate buy/sell pressure per asset among `top_performers`
    ///
    /// A performer counts as a buyer of an asset when they made more buy than
    /// sell trades in it inside the window, as a seller for the opposite, and
    /// as neutral otherwise. Strength is `(buyers - sellers) / top_performers`,
    /// so it always lies in [-1, 1]. Output is ordered by absolute strength
    /// descending, then symbol ascending.
    pub fn detect_trends(
        &self,
        top_performers: &[RankedPeer],
        trades_by_user: &BTreeMap<UserId, Vec<TradeRecord>>,
    ) -> Vec<TrendSignal> {
        if top_performers.is_empty() {
            return Vec::new();
        }

        let mut tallies: BTreeMap<&str, AssetTally<'_>> = BTreeMap::new();

        for peer in top_performers {
            let Some(trades) = trades_by_user.get(&peer.user) else {
                continue;
            };

            let mut activity: BTreeMap<&str, PerformerActivity> = BTreeMap::new();
            for trade in trades
                .iter()
                .filter(|t| t.user == peer.user && self.window.contains(t.timestamp, self.as_of))
            {
                let entry = activity.entry(trade.symbol.as_str()).or_default();
                match trade.action {
                    TradeAction::Buy => entry.buys += 1,
                    TradeAction::Sell => entry.sells += 1,
                }
                entry.volume += trade.value;
            }

            for (symbol, act) in activity {
                let tally = tallies.entry(symbol).or_default();
                match act.buys.cmp(&act.sells) {
                    Ordering::Greater => tally.buyers += 1,
                    Ordering::Less => tally.sellers += 1,
                    Ordering::Equal => {}
                }
                tally.volume += act.volume;
                tally.contributors.push(peer);
            }
        }

        let considered = count_as_f64(top_performers.len());
        let mut signals: Vec<TrendSignal> = tallies
            .into_iter()
            .map(|(symbol, tally)| {
                let strength =
                    ((count_as_f64(tally.buyers) - count_as_f64(tally.sellers)) / considered).clamp(-1.0, 1.0);
                let segment_trust = tally.contributors.iter().map(|p| peer_trust(p)).sum::<f64>()
                    / count_as_f64(tally.contributors.len());

                TrendSignal {
                    symbol: symbol.to_string(),
                    performer_count: tally.contributors.len(),
                    buyers: tally.buyers,
                    sellers: tally.sellers,
                    direction: TrendDirection::from_strength(strength),
                    strength,
                    total_volume: tally.volume,
                    contributors: tally.contributors.iter().map(|p| p.user.clone()).collect(),
                    segment_trust,
                }
            })
            .collect();

        signals.sort_by(signal_order);

        tracing::debug!(
            performers = top_performers.len(),
            signals = signals.len(),
            window = %self.window.describe(),
            "trend detection complete"
        );
        signals
    }
}

/// Absolute strength descending, then symbol ascending
pub fn signal_order(a: &TrendSignal, b: &TrendSignal) -> Ordering {
    b.strength
        .abs()
        .total_cmp(&a.strength.abs())
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Trust the target places in one peer, in [0, 1)
///
/// Half from how strongly the target interacts with the peer, half from the
/// peer's own social influence.
pub fn peer_trust(peer: &RankedPeer) -> f64 {
    let interaction = saturation(peer.interaction_weight, 1.0);
    let influence = if peer.metrics.social_influence.is_finite() {
        (peer.metrics.social_influence / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (0.5 * interaction + 0.5 * influence).clamp(0.0, 1.0)
}
