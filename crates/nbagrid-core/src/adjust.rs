//! Narrow, widen and randomize operations on dynamic filters.
//!
//! Every applied adjustment returns the new filter together with its
//! regenerated label and the population count against the current snapshot.
//! Grid-level constraints are not re-checked here.

use crate::error::ConfigError;
use crate::filter::{Filter, FilterCatalog, FilterConfig, ThresholdFilter};
use crate::player::PlayerSnapshot;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Direction of an adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjustment {
    Narrow,
    Widen,
    Randomize,
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Adjustment::Narrow => "narrow",
            Adjustment::Widen => "widen",
            Adjustment::Randomize => "randomize",
        };
        f.write_str(name)
    }
}

impl FromStr for Adjustment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "narrow" => Ok(Adjustment::Narrow),
            "widen" => Ok(Adjustment::Widen),
            "randomize" | "random" => Ok(Adjustment::Randomize),
            other => Err(format!("unknown adjustment '{}'", other)),
        }
    }
}

/// Result of an applied adjustment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjusted {
    pub filter: Filter,
    pub label: String,
    pub population: usize,
}

impl Adjusted {
    fn new(filter: Filter, snapshot: &PlayerSnapshot) -> Self {
        let population = snapshot
            .players()
            .iter()
            .filter(|p| filter.evaluate(p))
            .count();
        Self {
            label: filter.label(),
            filter,
            population,
        }
    }
}

/// Why an adjustment was a no-op
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inapplicable {
    /// Static filters have nothing to adjust
    Static,
    AtNarrowest,
    AtWidest,
    /// Narrow and widen are meaningless for choices among peers
    Unordered,
    /// The kind has no other legal configuration
    NoAlternative,
}

impl fmt::Display for Inapplicable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Inapplicable::Static => "filter has no adjustable configuration",
            Inapplicable::AtNarrowest => "filter is already at its narrowest step",
            Inapplicable::AtWidest => "filter is already at its widest step",
            Inapplicable::Unordered => "filter values have no narrower or wider ordering",
            Inapplicable::NoAlternative => "filter kind has no other configuration",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustOutcome {
    Applied(Adjusted),
    Inapplicable(Inapplicable),
}

impl AdjustOutcome {
    pub fn applied(self) -> Option<Adjusted> {
        match self {
            AdjustOutcome::Applied(adjusted) => Some(adjusted),
            AdjustOutcome::Inapplicable(_) => None,
        }
    }
}

/// Move a threshold one step toward fewer matching players
pub fn narrow(filter: &Filter, snapshot: &PlayerSnapshot) -> AdjustOutcome {
    step(filter, snapshot, Adjustment::Narrow)
}

/// Move a threshold one step toward more matching players
pub fn widen(filter: &Filter, snapshot: &PlayerSnapshot) -> AdjustOutcome {
    step(filter, snapshot, Adjustment::Widen)
}

fn step(filter: &Filter, snapshot: &PlayerSnapshot, direction: Adjustment) -> AdjustOutcome {
    let threshold = match filter {
        Filter::Flag(_) => return AdjustOutcome::Inapplicable(Inapplicable::Static),
        Filter::Choice(_) => return AdjustOutcome::Inapplicable(Inapplicable::Unordered),
        Filter::Threshold(threshold) => threshold,
    };
    let next = match direction {
        Adjustment::Widen => threshold.spec.wider(threshold.value),
        _ => threshold.spec.narrower(threshold.value),
    };
    let Some(value) = next else {
        let reason = if direction == Adjustment::Widen {
            Inapplicable::AtWidest
        } else {
            Inapplicable::AtNarrowest
        };
        debug!(kind = %filter.kind_id(), %direction, "adjustment at boundary");
        return AdjustOutcome::Inapplicable(reason);
    };
    let updated = Filter::Threshold(ThresholdFilter {
        spec: threshold.spec.clone(),
        value,
    });
    debug!(kind = %filter.kind_id(), from = threshold.value, to = value, %direction, "adjusted threshold");
    AdjustOutcome::Applied(Adjusted::new(updated, snapshot))
}

/// Pick a different legal configuration of the same kind uniformly at random
pub fn randomize<R: Rng + ?Sized>(
    filter: &Filter,
    catalog: &FilterCatalog,
    snapshot: &PlayerSnapshot,
    rng: &mut R,
) -> Result<AdjustOutcome, ConfigError> {
    if !filter.is_dynamic() {
        return Ok(AdjustOutcome::Inapplicable(Inapplicable::Static));
    }
    let kind = filter.kind_id();
    let descriptor = catalog
        .descriptor(&kind)
        .ok_or_else(|| ConfigError::UnknownKind(kind.clone()))?;
    let current = filter.config();
    let alternatives: Vec<FilterConfig> = descriptor
        .legal_configs()
        .into_iter()
        .filter(|config| *config != current)
        .collect();
    let Some(config) = alternatives.choose(rng) else {
        return Ok(AdjustOutcome::Inapplicable(Inapplicable::NoAlternative));
    };
    let updated = catalog.instantiate(&kind, config)?;
    debug!(kind = %kind, from = %current, to = %config, "randomized filter");
    Ok(AdjustOutcome::Applied(Adjusted::new(updated, snapshot)))
}

/// Apply `adjustment` to `filter`
pub fn adjust<R: Rng + ?Sized>(
    filter: &Filter,
    adjustment: Adjustment,
    catalog: &FilterCatalog,
    snapshot: &PlayerSnapshot,
    rng: &mut R,
) -> Result<AdjustOutcome, ConfigError> {
    match adjustment {
        Adjustment::Narrow => Ok(narrow(filter, snapshot)),
        Adjustment::Widen => Ok(widen(filter, snapshot)),
        Adjustment::Randomize => randomize(filter, catalog, snapshot, rng),
    }
}
