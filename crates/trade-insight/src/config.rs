//! Pipeline Configuration
//!
//! Every tunable the pipeline reads lives here, with documented defaults.
//! `validate` runs before any computation so a bad parameter fails fast.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InsightError, Result};

/// Longest lookback a window may cover, roughly a century
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// How far back from the snapshot time records are considered
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookbackWindow {
    /// Every record up to the snapshot time
    All,
    /// The last N days before the snapshot time
    Days(u32),
}

impl LookbackWindow {
    /// First instant inside the window, `None` when unbounded
    pub fn start(&self, as_of: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::All => None,
            Self::Days(days) => Some(
                as_of
                    .checked_sub_signed(Duration::days(i64::from(*days)))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            ),
        }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>, as_of: DateTime<Utc>) -> bool {
        timestamp <= as_of && self.start(as_of).is_none_or(|start| timestamp >= start)
    }

    /// Human-readable phrase used in recommendation reasoning
    pub fn describe(&self) -> String {
        match self {
            Self::All => "across all recorded history".into(),
            Self::Days(1) => "in the last day".into(),
            Self::Days(days) => format!("in the last {days} days"),
        }
    }
}

/// Size of the top-performer slice
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopPerformers {
    /// A fixed number of peers
    Count(usize),
    /// A share of the ranked network, rounded up
    Fraction(f64),
}

impl TopPerformers {
    /// Requested slice size for a network of `network_size` ranked peers
    pub fn requested(&self, network_size: usize) -> usize {
        match self {
            Self::Count(k) => *k,
            Self::Fraction(fraction) => {
                if network_size == 0 {
                    return 0;
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
                let k = (fraction * network_size as f64).ceil() as usize;
                k.max(1)
            }
        }
    }
}

/// What to do when the requested slice is at least as large as the network
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionFallback {
    /// Treat the whole ranked network as top performers
    #[default]
    WholeNetwork,
    /// Fail the request with a configuration error
    Reject,
}

/// Coefficients of the confidence score
///
/// `confidence = (a*|strength| + b*corroboration + c*trust) / (a + b + c)`
/// where `corroboration = min(1, performers / corroboration_saturation)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub strength_weight: f64,
    pub corroboration_weight: f64,
    pub trust_weight: f64,

    /// Performer count at which corroboration is fully credited
    pub corroboration_saturation: usize,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            strength_weight: 0.5,
            corroboration_weight: 0.3,
            trust_weight: 0.2,
            corroboration_saturation: 3,
        }
    }
}

impl ConfidenceWeights {
    fn total(&self) -> f64 {
        self.strength_weight + self.corroboration_weight + self.trust_weight
    }
}

/// Coefficients of the social influence score
///
/// `influence = 100 * (a*n/(n+hn) + b*w/(w+hw)) / (a + b)` for `n` inbound
/// edges carrying total weight `w`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InfluenceWeights {
    pub edge_count_weight: f64,
    pub edge_weight_weight: f64,

    /// Inbound edge count that earns half of the count component
    pub edge_count_half: f64,

    /// Inbound weight sum that earns half of the weight component
    pub edge_weight_half: f64,
}

impl Default for InfluenceWeights {
    fn default() -> Self {
        Self {
            edge_count_weight: 0.5,
            edge_weight_weight: 0.5,
            edge_count_half: 5.0,
            edge_weight_half: 10.0,
        }
    }
}

/// Full pipeline configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Window for trade frequency and activity metrics
    pub activity_window: LookbackWindow,

    /// Window the trend detector scans
    pub trend_window: LookbackWindow,

    pub top_performers: TopPerformers,
    pub selection_fallback: SelectionFallback,

    /// Strength magnitude a trend must exceed to count as strong
    pub strong_threshold: f64,

    pub confidence: ConfidenceWeights,
    pub influence: InfluenceWeights,

    /// Candidates scoring below this confidence are dropped
    pub min_confidence: f64,

    /// Cap on returned recommendations; `None` returns all of them
    pub max_recommendations: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            activity_window: LookbackWindow::All,
            trend_window: LookbackWindow::Days(7),
            top_performers: TopPerformers::Count(5),
            selection_fallback: SelectionFallback::WholeNetwork,
            strong_threshold: 0.5,
            confidence: ConfidenceWeights::default(),
            influence: InfluenceWeights::default(),
            min_confidence: 0.0,
            max_recommendations: Some(5),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `INSIGHT_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `INSIGHT_*` key
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("INSIGHT_ACTIVITY_WINDOW_DAYS") {
            config.activity_window = parse_window("INSIGHT_ACTIVITY_WINDOW_DAYS", &raw)?;
        }
        if let Some(raw) = lookup("INSIGHT_TREND_WINDOW_DAYS") {
            config.trend_window = parse_window("INSIGHT_TREND_WINDOW_DAYS", &raw)?;
        }
        if let Some(raw) = lookup("INSIGHT_TOP_K") {
            config.top_performers = TopPerformers::Count(parse_count("INSIGHT_TOP_K", &raw)?);
        }
        if let Some(raw) = lookup("INSIGHT_TOP_FRACTION") {
            config.top_performers =
                TopPerformers::Fraction(parse_float("INSIGHT_TOP_FRACTION", &raw)?);
        }
        if let Some(raw) = lookup("INSIGHT_TOP_K_FALLBACK") {
            config.selection_fallback = match raw.trim() {
                "whole-network" => SelectionFallback::WholeNetwork,
                "reject" => SelectionFallback::Reject,
                other => {
                    return Err(InsightError::Config(format!(
                        "INSIGHT_TOP_K_FALLBACK must be 'whole-network' or 'reject', got '{other}'"
                    )));
                }
            };
        }
        if let Some(raw) = lookup("INSIGHT_STRONG_THRESHOLD") {
            config.strong_threshold = parse_float("INSIGHT_STRONG_THRESHOLD", &raw)?;
        }
        if let Some(raw) = lookup("INSIGHT_CONFIDENCE_STRENGTH") {
            config.confidence.strength_weight = parse_float("INSIGHT_CONFIDENCE_STRENGTH", &raw)?;
        }
        if let Some(raw) = lookup("INSIGHT_CONFIDENCE_CORROBORATION") {
            config.confidence.corroboration_weight =
                parse_float("INSIGHT_CONFIDENCE_CORROBORATION", &raw)?;
        }
        if let Some(raw) = lookup("INSIGHT_CONFIDENCE_TRUST") {
            config.confidence.trust_weight = parse_float("INSIGHT_CONFIDENCE_TRUST", &raw)?;
        }
        if let Some(raw) = lookup("INSIGHT_CORROBORATION_SATURATION") {
            config.confidence.corroboration_saturation =
                parse_count("INSIGHT_CORROBORATION_SATURATION", &raw)?;
        }
        if let Some(raw) = lookup("INSIGHT_MIN_CONFIDENCE") {
            config.min_confidence = parse_float("INSIGHT_MIN_CONFIDENCE", &raw)?;
        }
        if let Some(raw) = lookup("INSIGHT_MAX_RECOMMENDATIONS") {
            config.max_recommendations = if raw.trim().eq_ignore_ascii_case("none") {
                None
            } else {
                Some(parse_count("INSIGHT_MAX_RECOMMENDATIONS", &raw)?)
            };
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject parameters the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        for (name, window) in [
            ("activity_window", self.activity_window),
            ("trend_window", self.trend_window),
        ] {
            match window {
                LookbackWindow::Days(0) => {
                    return Err(InsightError::Config(format!(
                        "{name} must cover at least one day"
                    )));
                }
                LookbackWindow::Days(days) if days > MAX_WINDOW_DAYS => {
                    return Err(InsightError::Config(format!(
                        "{name} of {days} days exceeds the {MAX_WINDOW_DAYS} day limit"
                    )));
                }
                _ => {}
            }
        }

        match self.top_performers {
            TopPerformers::Count(0) => {
                return Err(InsightError::Config(
                    "top_performers count must be at least 1".into(),
                ));
            }
            TopPerformers::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(InsightError::Config(format!(
                    "top_performers fraction must be in (0, 1], got {f}"
                )));
            }
            _ => {}
        }

        if !(0.0..1.0).contains(&self.strong_threshold) {
            return Err(InsightError::Config(format!(
                "strong_threshold must be in [0, 1), got {}",
                self.strong_threshold
            )));
        }

        let weights = &self.confidence;
        for (name, w) in [
            ("strength_weight", weights.strength_weight),
            ("corroboration_weight", weights.corroboration_weight),
            ("trust_weight", weights.trust_weight),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(InsightError::Config(format!(
                    "confidence {name} must be finite and non-negative, got {w}"
                )));
            }
        }
        if weights.total() <= 0.0 {
            return Err(InsightError::Config(
                "confidence weights must not all be zero".into(),
            ));
        }
        if weights.corroboration_saturation == 0 {
            return Err(InsightError::Config(
                "corroboration_saturation must be at least 1".into(),
            ));
        }

        let influence = &self.influence;
        for (name, w) in [
            ("edge_count_weight", influence.edge_count_weight),
            ("edge_weight_weight", influence.edge_weight_weight),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(InsightError::Config(format!(
                    "influence {name} must be finite and non-negative, got {w}"
                )));
            }
        }
        if influence.edge_count_weight + influence.edge_weight_weight <= 0.0 {
            return Err(InsightError::Config(
                "influence weights must not all be zero".into(),
            ));
        }
        for (name, half) in [
            ("edge_count_half", influence.edge_count_half),
            ("edge_weight_half", influence.edge_weight_half),
        ] {
            if !(half.is_finite() && half > 0.0) {
                return Err(InsightError::Config(format!(
                    "influence {name} must be positive, got {half}"
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(InsightError::Config(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }

        if self.max_recommendations == Some(0) {
            return Err(InsightError::Config(
                "max_recommendations must be at least 1 when set".into(),
            ));
        }

        Ok(())
    }
}

fn parse_window(key: &str, raw: &str) -> Result<LookbackWindow> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("all") {
        return Ok(LookbackWindow::All);
    }
    let days: i64 = raw
        .parse()
        .map_err(|_| InsightError::Config(format!("{key} must be 'all' or a day count, got '{raw}'")))?;
    if days < 1 {
        return Err(InsightError::Config(format!(
            "{key} must be at least one day, got {days}"
        )));
    }
    u32::try_from(days)
        .map(LookbackWindow::Days)
        .map_err(|_| InsightError::Config(format!("{key} is too large: {days}")))
}

fn parse_count(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| InsightError::Config(format!("{key} must be a non-negative integer, got '{raw}'")))
}

fn parse_float(key: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .map_err(|_| InsightError::Config(format!("{key} must be a number, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.trend_window, LookbackWindow::Days(7));
        assert_eq!(config.top_performers, TopPerformers::Count(5));
    }

    #[test]
    fn test_env_overrides() {
        let config = PipelineConfig::from_lookup(lookup(&[
            ("INSIGHT_TREND_WINDOW_DAYS", "14"),
            ("INSIGHT_TOP_FRACTION", "0.1"),
            ("INSIGHT_TOP_K_FALLBACK", "reject"),
            ("INSIGHT_MAX_RECOMMENDATIONS", "none"),
        ]))
        .unwrap();

        assert_eq!(config.trend_window, LookbackWindow::Days(14));
        assert_eq!(config.top_performers, TopPerformers::Fraction(0.1));
        assert_eq!(config.selection_fallback, SelectionFallback::Reject);
        assert_eq!(config.max_recommendations, None);
    }

    #[test]
    fn test_negative_window_rejected() {
        let err = PipelineConfig::from_lookup(lookup(&[("INSIGHT_TREND_WINDOW_DAYS", "-3")]))
            .unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let mut config = PipelineConfig::default();
        config.top_performers = TopPerformers::Count(0);
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.strong_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.confidence.strength_weight = -0.1;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.trend_window = LookbackWindow::Days(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_window_rejected() {
        let mut config = PipelineConfig::default();
        config.trend_window = LookbackWindow::Days(100_000_000);
        assert!(matches!(config.validate(), Err(InsightError::Config(_))));

        let mut config = PipelineConfig::default();
        config.activity_window = LookbackWindow::Days(MAX_WINDOW_DAYS);
        assert!(config.validate().is_ok());

        let err = PipelineConfig::from_lookup(lookup(&[("INSIGHT_ACTIVITY_WINDOW_DAYS", "4000000000")]))
            .unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));
    }

    #[test]
    fn test_window_start_saturates() {
        let as_of = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let window = LookbackWindow::Days(u32::MAX);
        assert_eq!(window.start(as_of), Some(DateTime::<Utc>::MIN_UTC));
        assert!(window.contains(as_of - Duration::days(900), as_of));
    }

    #[test]
    fn test_min_confidence_bounds() {
        let config = PipelineConfig::from_lookup(lookup(&[("INSIGHT_MIN_CONFIDENCE", "0.6")])).unwrap();
        assert!((config.min_confidence - 0.6).abs() < f64::EPSILON);

        let err = PipelineConfig::from_lookup(lookup(&[("INSIGHT_MIN_CONFIDENCE", "1.2")])).unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));

        let mut config = PipelineConfig::default();
        config.min_confidence = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fraction_rounds_up() {
        assert_eq!(TopPerformers::Fraction(0.1).requested(25), 3);
        assert_eq!(TopPerformers::Fraction(0.1).requested(4), 1);
        assert_eq!(TopPerformers::Fraction(0.5).requested(0), 0);
    }

    #[test]
    fn test_window_bounds() {
        let as_of = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let window = LookbackWindow::Days(7);

        assert!(window.contains(as_of - Duration::days(7), as_of));
        assert!(!window.contains(as_of - Duration::days(8), as_of));
        assert!(!window.contains(as_of + Duration::seconds(1), as_of));
        assert!(LookbackWindow::All.contains(as_of - Duration::days(900), as_of));
    }
}
