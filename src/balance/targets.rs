//! Per-level target sizes
//!
//! Combines observed counts, the resolved balancing spec and an optional
//! output size into one `(target, method)` pair per level.
//!
//! With explicit sizes, unnamed levels pass through unchanged unless an
//! output size is given; then they share the leftover budget evenly
//! (ceiling division). A leftover of zero or less drops them from the plan.
//!
//! With a named strategy every level gets the same target:
//! - undersample: smallest observed count
//! - oversample: largest observed count
//! - uniform: ceiling of the mean count, or of `output_size / levels`

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::level::{DesiredSizeMapping, FrequencyMapping, Level};
use super::spec::{BalancingSpec, StrategyToken};

/// Resampling method resolved for a single level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Undersample,
    Oversample,
    Nosample,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Undersample => "undersample",
            Method::Oversample => "oversample",
            Method::Nosample => "nosample",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target row count and method for one level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelPlan {
    pub target: u64,
    pub method: Method,
}

impl LevelPlan {
    pub fn new(target: u64, method: Method) -> Self {
        Self { target, method }
    }
}

/// Plan for every retained level
pub type TargetPlan = BTreeMap<Level, LevelPlan>;

/// Picks a method from an actual/desired pair.
///
/// Equal counts undersample so the level can still be bootstrapped.
pub fn choose_method(actual: u64, desired: u64) -> Method {
    if actual < desired {
        Method::Oversample
    } else {
        Method::Undersample
    }
}

/// Builds the per-level plan.
pub fn plan_targets(
    spec: &BalancingSpec,
    actual: &FrequencyMapping,
    output_size: Option<u64>,
) -> TargetPlan {
    match spec {
        BalancingSpec::Explicit(desired) => plan_explicit(desired, actual, output_size),
        BalancingSpec::Strategy(token) => plan_strategy(*token, actual, output_size),
    }
}

fn plan_explicit(
    desired: &DesiredSizeMapping,
    actual: &FrequencyMapping,
    output_size: Option<u64>,
) -> TargetPlan {
    let mut plan = TargetPlan::new();

    for (level, &want) in desired {
        let have = actual.get(level).unwrap_or(0);
        plan.insert(level.clone(), LevelPlan::new(want, choose_method(have, want)));
    }

    let unspecified: Vec<(&Level, u64)> = actual
        .iter()
        .filter(|(level, _)| !desired.contains_key(*level))
        .collect();
    if unspecified.is_empty() {
        return plan;
    }

    match output_size {
        None => {
            for (level, have) in unspecified {
                plan.insert(level.clone(), LevelPlan::new(have, Method::Nosample));
            }
        }
        Some(goal) => {
            let requested = desired.values().fold(0u64, |acc, n| acc.saturating_add(*n));
            let leftover = goal.saturating_sub(requested);
            if leftover > 0 {
                let share = leftover.div_ceil(unspecified.len() as u64);
                for (level, have) in unspecified {
                    plan.insert(level.clone(), LevelPlan::new(share, choose_method(have, share)));
                }
            }
        }
    }

    plan
}

fn plan_strategy(
    token: StrategyToken,
    actual: &FrequencyMapping,
    output_size: Option<u64>,
) -> TargetPlan {
    let target = match strategy_target(token, actual, output_size) {
        Some(target) => target,
        None => return TargetPlan::new(),
    };

    actual
        .iter()
        .map(|(level, have)| (level.clone(), LevelPlan::new(target, choose_method(have, target))))
        .collect()
}

/// Shared target size for a named strategy; `None` when nothing was observed
pub fn strategy_target(
    token: StrategyToken,
    actual: &FrequencyMapping,
    output_size: Option<u64>,
) -> Option<u64> {
    if actual.is_empty() {
        return None;
    }
    let levels = actual.len() as u64;
    match token {
        StrategyToken::Undersample => actual.min_count(),
        StrategyToken::Oversample => actual.max_count(),
        StrategyToken::Uniform => match output_size {
            Some(goal) => Some(goal.div_ceil(levels)),
            None => Some(actual.total().div_ceil(levels)),
        },
    }
}

/// Levels that were observed but received no plan
pub fn dropped_levels<'a>(actual: &'a FrequencyMapping, plan: &TargetPlan) -> Vec<&'a Level> {
    actual.levels().filter(|level| !plan.contains_key(*level)).collect()
}
