//! Report Summary
//!
//! Plain-text digest of a [`RecommendationReport`] for display next to the
//! full recommendation list.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::model::{RecommendationAction, RecommendationReport};

impl RecommendationReport {
    /// Number of recommendations per action
    pub fn action_counts(&self) -> BTreeMap<RecommendationAction, usize> {
        let mut counts = BTreeMap::new();
        for rec in &self.recommendations {
            *counts.entry(rec.action).or_insert(0) += 1;
        }
        counts
    }

    /// Short narrative: portfolio value, P/L, and how many of each action
    pub fn summary(&self) -> String {
        let pnl_sign = if self.metrics.total_pnl >= Decimal::ZERO { "+" } else { "" };

        let mut s = format!("Investment Recommendations for {}\n\n", self.handle);
        s.push_str(&format!(
            "Based on your portfolio (${:.2} total value, {}${:.2} P/L) and the recent trades of {} top performers among {} connections, {} recommendations were generated.\n\n",
            self.metrics.holdings_value,
            pnl_sign,
            self.metrics.total_pnl,
            self.top_performers.len(),
            self.network.len(),
            self.recommendations.len(),
        ));

        let counts = self.action_counts();
        for (action, label) in [
            (RecommendationAction::Buy, "buy recommendations for new opportunities"),
            (RecommendationAction::Sell, "sell recommendations to reduce exposure"),
            (RecommendationAction::Hold, "hold recommendations for your existing assets"),
            (RecommendationAction::Watch, "assets to keep on your watchlist"),
        ] {
            if let Some(count) = counts.get(&action) {
                s.push_str(&format!("  • {count} {label}\n"));
            }
        }

        s
    }
}
