//! Regroups a target plan by method

use std::collections::BTreeMap;

use super::level::Level;
use super::targets::{LevelPlan, Method, TargetPlan};

/// Level → target count, one map per method. The maps are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodPartitions {
    pub undersample: BTreeMap<Level, u64>,
    pub oversample: BTreeMap<Level, u64>,
    pub nosample: BTreeMap<Level, u64>,
}

impl MethodPartitions {
    /// Splits a plan by method, dropping the method tag
    pub fn split(plan: &TargetPlan) -> Self {
        let mut partitions = Self::default();
        for (level, level_plan) in plan {
            partitions
                .partition_mut(level_plan.method)
                .insert(level.clone(), level_plan.target);
        }
        partitions
    }

    pub fn partition(&self, method: Method) -> &BTreeMap<Level, u64> {
        match method {
            Method::Undersample => &self.undersample,
            Method::Oversample => &self.oversample,
            Method::Nosample => &self.nosample,
        }
    }

    fn partition_mut(&mut self, method: Method) -> &mut BTreeMap<Level, u64> {
        match method {
            Method::Undersample => &mut self.undersample,
            Method::Oversample => &mut self.oversample,
            Method::Nosample => &mut self.nosample,
        }
    }

    /// Rebuilds the plan the partitions were split from
    pub fn merge(&self) -> TargetPlan {
        [Method::Undersample, Method::Oversample, Method::Nosample]
            .into_iter()
            .flat_map(|method| {
                self.partition(method)
                    .iter()
                    .map(move |(level, target)| (level.clone(), LevelPlan::new(*target, method)))
            })
            .collect()
    }

    /// Number of levels across all partitions
    pub fn level_count(&self) -> usize {
        self.undersample.len() + self.oversample.len() + self.nosample.len()
    }

    pub fn is_empty(&self) -> bool {
        self.level_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn plan() -> TargetPlan {
        [
            ("a", 25, Method::Oversample),
            ("b", 25, Method::Undersample),
            ("c", 25, Method::Nosample),
            ("d", 7, Method::Undersample),
        ]
        .into_iter()
        .map(|(l, n, m)| (Level::value(l), LevelPlan::new(n, m)))
        .chain([(Level::Null, LevelPlan::new(3, Method::Oversample))])
        .collect()
    }

    #[test]
    fn test_split_is_complete_and_disjoint() {
        let plan = plan();
        let parts = MethodPartitions::split(&plan);
        assert_eq!(parts.level_count(), plan.len());

        let under: BTreeSet<_> = parts.undersample.keys().collect();
        let over: BTreeSet<_> = parts.oversample.keys().collect();
        let pass: BTreeSet<_> = parts.nosample.keys().collect();
        assert!(under.is_disjoint(&over));
        assert!(under.is_disjoint(&pass));
        assert!(over.is_disjoint(&pass));

        let all: BTreeSet<_> = under.union(&over).chain(pass.iter()).copied().collect();
        let expected: BTreeSet<_> = plan.keys().collect();
        assert_eq!(all, expected);
    }

    #[test]
    fn test_split_keeps_targets() {
        let parts = MethodPartitions::split(&plan());
        assert_eq!(parts.undersample.get(&Level::value("d")), Some(&7));
        assert_eq!(parts.oversample.get(&Level::Null), Some(&3));
        assert_eq!(parts.nosample.get(&Level::value("c")), Some(&25));
    }

    #[test]
    fn test_merge_round_trip() {
        let plan = plan();
        assert_eq!(MethodPartitions::split(&plan).merge(), plan);
    }

    #[test]
    fn test_empty_plan() {
        let parts = MethodPartitions::split(&TargetPlan::new());
        assert!(parts.is_empty());
    }
}
