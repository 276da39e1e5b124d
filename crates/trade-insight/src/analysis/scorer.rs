//! Recommendation Scorer
//!
//! Turns trend signals and the target's own holdings into ranked
//! buy/sell/hold/watch recommendations with a confidence score and a
//! plain-language rationale.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::metrics::count_as_f64;
use crate::config::{ConfidenceWeights, LookbackWindow};
use crate::error::{InsightError, Result};
use crate::model::{
    HoldingRecord, Recommendation, RecommendationAction, SupportingMetrics, TrendSignal,
    UserMetrics,
};

pub struct RecommendationScorer {
    strong_threshold: f64,
    weights: ConfidenceWeights,
    trend_window: LookbackWindow,
    min_confidence: f64,
}

impl RecommendationScorer {
    pub const fn new(
        strong_threshold: f64,
        weights: ConfidenceWeights,
        trend_window: LookbackWindow,
    ) -> Self {
        Self {
            strong_threshold,
            weights,
            trend_window,
            min_confidence: 0.0,
        }
    }

    /// Drop candidates whose confidence falls below `min_confidence`
    #[must_use]
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Score every candidate asset: anything the target holds plus anything
    /// with a trend signal
    ///
    /// Fails with [`InsightError::InsufficientSignal`] when no candidate maps
    /// to an action at or above the minimum confidence.
    pub fn score(
        &self,
        target_holdings: &[HoldingRecord],
        target_metrics: &UserMetrics,
        trend_signals: &[TrendSignal],
    ) -> Result<Vec<Recommendation>> {
        let mut held: BTreeMap<&str, Decimal> = BTreeMap::new();
        for holding in target_holdings
            .iter()
            .filter(|h| h.user == target_metrics.user && h.is_open())
        {
            *held.entry(holding.symbol.as_str()).or_default() += holding.value;
        }

        let signals: BTreeMap<&str, &TrendSignal> = trend_signals
            .iter()
            .map(|s| (s.symbol.as_str(), s))
            .collect();

        let candidates: BTreeSet<&str> = held.keys().chain(signals.keys()).copied().collect();

        let mut recommendations: Vec<Recommendation> = candidates
            .iter()
            .filter_map(|symbol| {
                let signal = signals.get(symbol).copied()?;
                let held_value = held.get(symbol).copied();
                let action = self.decide(signal, held_value.is_some())?;
                let confidence = self.confidence(signal);
                if confidence < self.min_confidence {
                    tracing::debug!(symbol, confidence, min = self.min_confidence, "below minimum confidence");
                    return None;
                }

                Some(Recommendation {
                    symbol: (*symbol).to_string(),
                    action,
                    confidence,
                    reasoning: self.reasoning(action, signal, held_value, target_metrics),
                    supporting: SupportingMetrics {
                        strength: signal.strength,
                        direction: signal.direction,
                        performer_count: signal.performer_count,
                        buyers: signal.buyers,
                        sellers: signal.sellers,
                        total_volume: signal.total_volume,
                        segment_trust: signal.segment_trust,
                        contributors: signal.contributors.clone(),
                        held_value,
                    },
                })
            })
            .collect();

        if recommendations.is_empty() {
            tracing::warn!(
                user = %target_metrics.user,
                candidates = candidates.len(),
                "no candidate cleared the action table"
            );
            return Err(InsightError::InsufficientSignal {
                user: target_metrics.user.clone(),
                candidates: candidates.len(),
            });
        }

        recommendations.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        Ok(recommendations)
    }

    /// Action table, first match wins
    fn decide(&self, signal: &TrendSignal, held: bool) -> Option<RecommendationAction> {
        let strong = signal.strength.abs() > self.strong_threshold;
        match (strong, signal.strength > 0.0, held) {
            (true, true, false) => Some(RecommendationAction::Buy),
            (true, true, true) => Some(RecommendationAction::Hold),
            (true, false, true) => Some(RecommendationAction::Sell),
            (false, _, true) => Some(RecommendationAction::Watch),
            (true, false, false) | (false, _, false) => None,
        }
    }

    /// Weighted blend of strength, corroboration and segment trust, in [0, 1]
    pub fn confidence(&self, signal: &TrendSignal) -> f64 {
        let w = &self.weights;
        let strength = signal.strength.abs().min(1.0);
        let corroboration = (count_as_f64(signal.performer_count)
            / count_as_f64(w.corroboration_saturation))
        .min(1.0);
        let trust = if signal.segment_trust.is_finite() {
            signal.segment_trust.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let total = w.strength_weight + w.corroboration_weight + w.trust_weight;
        let blended = (w.strength_weight * strength
            + w.corroboration_weight * corroboration
            + w.trust_weight * trust)
            / total;
        if blended.is_finite() {
            blended.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn reasoning(
        &self,
        action: RecommendationAction,
        signal: &TrendSignal,
        held_value: Option<Decimal>,
        target: &UserMetrics,
    ) -> String {
        let symbol = &signal.symbol;
        let mut text = format!(
            "{} in your network traded {} {}: {} net buying vs {} net selling (net {}, strength {:+.2}).",
            count_noun(signal.performer_count, "top performer", "top performers"),
            symbol,
            self.trend_window.describe(),
            signal.buyers,
            signal.sellers,
            signal.direction,
            signal.strength,
        );

        let position = held_value.map(|value| position_phrase(symbol, value, target.holdings_value));

        match (action, position) {
            (RecommendationAction::Buy, _) => {
                text.push_str(&format!(
                    " You do not hold {symbol} yet, so this could be an entry opportunity."
                ));
            }
            (RecommendationAction::Hold, Some(position)) => {
                text.push_str(&format!(
                    " You already hold {position}; the network is still accumulating, so keep the position."
                ));
            }
            (RecommendationAction::Sell, Some(position)) => {
                text.push_str(&format!(
                    " You hold {position} while the network is distributing; consider taking profits or reducing exposure."
                ));
            }
            (RecommendationAction::Watch, Some(position)) => {
                text.push_str(&format!(
                    " You hold {position}, but a strength of {:.2} is below the {:.2} action threshold; keep it on your watchlist.",
                    signal.strength.abs(),
                    self.strong_threshold,
                ));
            }
            (_, None) => {}
        }

        text
    }
}

fn position_phrase(symbol: &str, value: Decimal, portfolio_value: Decimal) -> String {
    if portfolio_value > Decimal::ZERO {
        let share = (value / portfolio_value) * dec!(100);
        format!("${value:.2} of {symbol} ({share:.1}% of your portfolio)")
    } else {
        format!("${value:.2} of {symbol}")
    }
}

fn count_noun(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {singular}")
    } else {
        format!("{count} {plural}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TrendDirection, UserId};
    use rust_decimal_macros::dec;

    fn scorer() -> RecommendationScorer {
        RecommendationScorer::new(0.5, ConfidenceWeights::default(), LookbackWindow::Days(7))
    }

    fn target(holdings_value: Decimal) -> UserMetrics {
        UserMetrics {
            user: "alice".into(),
            total_pnl: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            holdings_value,
            trade_count: 0,
            trade_frequency: 0.0,
            unique_assets_traded: 0,
            avg_trade_value: Decimal::ZERO,
            inbound_edges: 0,
            inbound_weight: 0.0,
            social_influence: 0.0,
        }
    }

    fn signal(symbol: &str, buyers: usize, sellers: usize, considered: usize) -> TrendSignal {
        #[allow(clippy::cast_precision_loss)]
        let strength = (buyers as f64 - sellers as f64) / considered as f64;
        TrendSignal {
            symbol: symbol.into(),
            performer_count: buyers + sellers,
            buyers,
            sellers,
            direction: TrendDirection::from_strength(strength),
            strength,
            total_volume: dec!(1000),
            contributors: (0..buyers + sellers)
                .map(|i| UserId::new(format!("peer{i}")))
                .collect(),
            segment_trust: 0.5,
        }
    }

    fn holding(symbol: &str, value: Decimal) -> HoldingRecord {
        HoldingRecord::new("alice", symbol, dec!(1), value)
    }

    #[test]
    fn test_network_buying_unheld_asset_recommends_buy() {
        let holdings = vec![holding("AAA", dec!(100))];
        let signals = vec![signal("BBB", 3, 0, 3)];

        let recs = scorer().score(&holdings, &target(dec!(100)), &signals).unwrap();
        assert_eq!(recs.len(), 1);
        let bbb = &recs[0];
        assert_eq!(bbb.symbol, "BBB");
        assert_eq!(bbb.action, RecommendationAction::Buy);
        assert!(bbb.confidence > 0.0);
        assert!(bbb.reasoning.contains("3 top performers"));
        assert!(bbb.reasoning.contains("net accumulate"));
        assert!(recs.iter().all(|r| r.symbol != "AAA"));
    }

    #[test]
    fn test_action_table() {
        let holdings = vec![
            holding("HOLD", dec!(300)),
            holding("SELL", dec!(100)),
            holding("WATCH", dec!(100)),
        ];
        let signals = vec![
            signal("HOLD", 4, 0, 5),
            signal("SELL", 0, 4, 5),
            signal("WATCH", 2, 1, 5),
            signal("SKIPWEAK", 1, 0, 5),
            signal("SKIPDUMP", 0, 5, 5),
        ];

        let recs = scorer().score(&holdings, &target(dec!(500)), &signals).unwrap();
        let actions: BTreeMap<&str, RecommendationAction> =
            recs.iter().map(|r| (r.symbol.as_str(), r.action)).collect();

        assert_eq!(actions.len(), 3);
        assert_eq!(actions["HOLD"], RecommendationAction::Hold);
        assert_eq!(actions["SELL"], RecommendationAction::Sell);
        assert_eq!(actions["WATCH"], RecommendationAction::Watch);

        let hold = recs.iter().find(|r| r.symbol == "HOLD").unwrap();
        assert!(hold.reasoning.contains("60.0% of your portfolio"));
        assert_eq!(hold.supporting.held_value, Some(dec!(300)));
    }

    #[test]
    fn test_threshold_is_strict() {
        // strength exactly 0.5 is still weak
        let recs = scorer()
            .score(&[holding("ETH", dec!(10))], &target(dec!(10)), &[signal("ETH", 2, 0, 4)])
            .unwrap();
        assert_eq!(recs[0].action, RecommendationAction::Watch);
    }

    #[test]
    fn test_no_actionable_candidate_is_insufficient_signal() {
        let err = scorer()
            .score(&[holding("AAA", dec!(100))], &target(dec!(100)), &[signal("BBB", 1, 0, 5)])
            .unwrap_err();
        match err {
            InsightError::InsufficientSignal { user, candidates } => {
                assert_eq!(user.as_str(), "alice");
                assert_eq!(candidates, 2);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(scorer().score(&[], &target(Decimal::ZERO), &[]).is_err());
    }

    #[test]
    fn test_min_confidence_filters_candidates() {
        let signals = vec![
            signal("ZZZ", 4, 0, 5),
            signal("AAA", 4, 0, 5),
            signal("MMM", 5, 0, 5),
        ];

        // MMM scores 0.9, AAA and ZZZ 0.8
        let recs = scorer()
            .with_min_confidence(0.85)
            .score(&[], &target(Decimal::ZERO), &signals)
            .unwrap();
        let order: Vec<&str> = recs.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["MMM"]);

        let err = scorer()
            .with_min_confidence(0.95)
            .score(&[], &target(Decimal::ZERO), &signals)
            .unwrap_err();
        assert!(matches!(err, InsightError::InsufficientSignal { candidates: 3, .. }));
    }

    #[test]
    fn test_non_finite_trust_keeps_confidence_bounded() {
        let mut s = signal("X", 3, 0, 3);
        s.segment_trust = f64::NAN;
        let c = scorer().confidence(&s);
        assert!((0.0..=1.0).contains(&c));
    }

    #[test]
    fn test_ordering_by_confidence_then_symbol() {
        let signals = vec![
            signal("ZZZ", 4, 0, 5),
            signal("AAA", 4, 0, 5),
            signal("MMM", 5, 0, 5),
        ];
        let recs = scorer().score(&[], &target(Decimal::ZERO), &signals).unwrap();
        let order: Vec<&str> = recs.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["MMM", "AAA", "ZZZ"]);
    }

    #[test]
    fn test_confidence_monotonic_and_bounded() {
        let s = scorer();
        let base = signal("X", 2, 0, 4);

        let mut stronger = base.clone();
        stronger.strength = 0.9;
        assert!(s.confidence(&stronger) > s.confidence(&base));

        let mut corroborated = base.clone();
        corroborated.performer_count = 3;
        assert!(s.confidence(&corroborated) > s.confidence(&base));

        let mut trusted = base.clone();
        trusted.segment_trust = 0.9;
        assert!(s.confidence(&trusted) > s.confidence(&base));

        let mut extreme = base;
        extreme.strength = 1.0;
        extreme.performer_count = 100;
        extreme.segment_trust = 1.0;
        assert!(s.confidence(&extreme) <= 1.0);
    }

    #[test]
    fn test_singular_performer_phrase() {
        let recs = scorer()
            .score(&[], &target(Decimal::ZERO), &[signal("ONE", 1, 0, 1)])
            .unwrap();
        assert!(recs[0].reasoning.starts_with("1 top performer in your network"));
    }
}
