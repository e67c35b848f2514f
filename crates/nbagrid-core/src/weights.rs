//! Usage-history weighting of filter kinds.
//!
//! A kind used `d` days before the target date (1 <= d <= lookback) has its
//! weight multiplied by `decay^((lookback - d + 1) / lookback)`, so yesterday
//! costs a full `decay` and the edge of the window almost nothing. Kinds
//! unused inside the window keep weight 1.0.

use crate::error::ConfigError;
use crate::filter::FilterCatalog;
use chrono::{Days, NaiveDate};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One filter kind used on one committed grid
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UsageRecord {
    pub date: NaiveDate,
    pub kind: String,
}

impl UsageRecord {
    pub fn new(date: NaiveDate, kind: impl Into<String>) -> Self {
        Self {
            date,
            kind: kind.into(),
        }
    }
}

/// Weight per filter kind, 1.0 for kinds not present
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterWeights {
    weights: BTreeMap<String, f64>,
}

impl FilterWeights {
    pub fn get(&self, kind: &str) -> f64 {
        self.weights.get(kind).copied().unwrap_or(1.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, w)| (k.as_str(), *w))
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Longest accepted lookback window
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageWeighter {
    pub lookback_days: u32,
    /// Factor applied for a use on the day before the target date, in (0, 1)
    pub decay: f64,
}

impl Default for UsageWeighter {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            decay: 0.5,
        }
    }
}

impl UsageWeighter {
    pub fn new(lookback_days: u32, decay: f64) -> Self {
        Self {
            lookback_days,
            decay,
        }
    }

    /// First date inside the lookback window for `target`
    pub fn window_start(&self, target: NaiveDate) -> Result<NaiveDate, ConfigError> {
        target
            .checked_sub_days(Days::new(u64::from(self.lookback_days)))
            .ok_or_else(|| {
                ConfigError::InvalidSetting(format!(
                    "a {}-day lookback from {} leaves the calendar",
                    self.lookback_days, target
                ))
            })
    }

    /// Multiplier for a single use `days_before` days ahead of the target
    pub fn factor(&self, days_before: i64) -> f64 {
        let lookback = i64::from(self.lookback_days);
        if days_before < 1 || days_before > lookback || lookback == 0 {
            return 1.0;
        }
        let exponent = (lookback - days_before + 1) as f64 / lookback as f64;
        self.decay.powf(exponent)
    }

    /// Weights for every kind seen in `records` relative to `target`
    pub fn compute_weights(&self, records: &[UsageRecord], target: NaiveDate) -> FilterWeights {
        let mut weights: BTreeMap<String, f64> = BTreeMap::new();
        for record in records {
            let days_before = (target - record.date).num_days();
            let factor = self.factor(days_before);
            if factor < 1.0 {
                *weights.entry(record.kind.clone()).or_insert(1.0) *= factor;
            }
        }
        FilterWeights { weights }
    }
}

/// Draw `count` distinct kinds, biased by usage weight times catalog priority.
///
/// Kinds in `exclude` are never drawn. Returns fewer than `count` kinds only
/// when the catalog runs out.
pub fn draw_kinds<R: Rng + ?Sized>(
    catalog: &FilterCatalog,
    weights: &FilterWeights,
    count: usize,
    exclude: &[String],
    rng: &mut R,
) -> Vec<String> {
    let mut pool: Vec<(String, f64)> = catalog
        .list_available()
        .iter()
        .filter(|d| !exclude.contains(&d.kind))
        .map(|d| (d.kind.clone(), (weights.get(&d.kind) * d.priority).max(f64::MIN_POSITIVE)))
        .collect();

    let mut drawn = Vec::with_capacity(count);
    while drawn.len() < count && !pool.is_empty() {
        let index = match WeightedIndex::new(pool.iter().map(|(_, w)| *w)) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.gen_range(0..pool.len()),
        };
        drawn.push(pool.swap_remove(index).0);
    }
    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterDescriptor, Flag};
    use crate::rng::seeded;
    use proptest::prelude::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn test_unused_kind_has_full_weight() {
        let weighter = UsageWeighter::default();
        let weights = weighter.compute_weights(&[], date(20));
        assert_eq!(weights.get("all_star"), 1.0);
        assert!(weights.is_empty());
    }

    #[test]
    fn test_recent_use_penalized_more() {
        let weighter = UsageWeighter::new(7, 0.5);
        let records = vec![
            UsageRecord::new(date(19), "yesterday"),
            UsageRecord::new(date(14), "last_week"),
        ];
        let weights = weighter.compute_weights(&records, date(20));
        assert!((weights.get("yesterday") - 0.5).abs() < 1e-9);
        assert!(weights.get("last_week") > weights.get("yesterday"));
        assert!(weights.get("last_week") < 1.0);
    }

    #[test]
    fn test_uses_outside_window_ignored() {
        let weighter = UsageWeighter::new(7, 0.5);
        let records = vec![
            UsageRecord::new(date(1), "old"),
            UsageRecord::new(date(20), "same_day"),
            UsageRecord::new(date(25), "future"),
        ];
        let weights = weighter.compute_weights(&records, date(20));
        assert_eq!(weights.get("old"), 1.0);
        assert_eq!(weights.get("same_day"), 1.0);
        assert_eq!(weights.get("future"), 1.0);
    }

    #[test]
    fn test_repeated_use_compounds() {
        let weighter = UsageWeighter::new(7, 0.5);
        let records = vec![
            UsageRecord::new(date(19), "twice"),
            UsageRecord::new(date(18), "twice"),
            UsageRecord::new(date(18), "once"),
        ];
        let weights = weighter.compute_weights(&records, date(20));
        assert!(weights.get("twice") < weights.get("once"));
    }

    #[test]
    fn test_window_start() {
        let weighter = UsageWeighter::new(7, 0.5);
        assert_eq!(weighter.window_start(date(20)).unwrap(), date(13));

        let early = NaiveDate::MIN.checked_add_days(Days::new(3)).unwrap();
        let result = UsageWeighter::new(MAX_LOOKBACK_DAYS, 0.5).window_start(early);
        assert!(matches!(result, Err(ConfigError::InvalidSetting(_))));
    }

    #[test]
    fn test_draw_kinds_distinct_and_excluding() {
        let catalog = FilterCatalog::new(Flag::ALL.into_iter().map(FilterDescriptor::flag).collect())
            .unwrap();
        let mut rng = seeded(5);
        let exclude = vec!["all_star".to_string()];
        let kinds = draw_kinds(&catalog, &FilterWeights::default(), 6, &exclude, &mut rng);
        assert_eq!(kinds.len(), 6);
        let mut unique = kinds.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 6);
        assert!(!kinds.contains(&"all_star".to_string()));

        let all = draw_kinds(&catalog, &FilterWeights::default(), 20, &[], &mut rng);
        assert_eq!(all.len(), Flag::ALL.len());
    }

    #[test]
    fn test_draw_prefers_unused_kinds() {
        let catalog = FilterCatalog::new(vec![
            FilterDescriptor::flag(Flag::AllStar),
            FilterDescriptor::flag(Flag::AllNba),
        ])
        .unwrap();
        let weighter = UsageWeighter::new(7, 0.01);
        let records: Vec<UsageRecord> = (13..20).map(|d| UsageRecord::new(date(d), "all_star")).collect();
        let weights = weighter.compute_weights(&records, date(20));
        let mut rng = seeded(9);
        let first_picks = (0..200)
            .filter(|_| draw_kinds(&catalog, &weights, 1, &[], &mut rng)[0] == "all_nba")
            .count();
        assert!(first_picks > 190);
    }

    proptest! {
        #[test]
        fn weight_in_unit_interval_and_monotone(
            lookback in 1u32..30,
            decay in 0.01f64..0.99,
            days in 1i64..40,
        ) {
            let weighter = UsageWeighter::new(lookback, decay);
            let target = date(28) + chrono::Duration::days(40);
            let recent = weighter.compute_weights(&[UsageRecord::new(target - chrono::Duration::days(days), "k")], target);
            let older = weighter.compute_weights(&[UsageRecord::new(target - chrono::Duration::days(days + 1), "k")], target);
            let w = recent.get("k");
            prop_assert!(w > 0.0 && w <= 1.0);
            prop_assert!(older.get("k") >= w);
            if days > i64::from(lookback) {
                prop_assert_eq!(w, 1.0);
            }
        }
    }
}
