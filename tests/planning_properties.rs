//! Planning property tests
//!
//! Pure planner behaviour, no store involved:
//! - every observed level gets exactly one plan, unless dropped
//! - method partitions are complete, disjoint and merge back losslessly
//! - `choose_method` oversamples iff actual < desired
//! - rendered statements depend only on inputs and the scratch seed

use std::collections::BTreeSet;

use stratify::balance::spec::{self, StrategyToken};
use stratify::balance::targets::dropped_levels;
use stratify::balance::{
    choose_method, plan_targets, BalancingSpec, FrequencyMapping, Level, LevelPlan, Method,
    MethodPartitions,
};
use stratify::sql::{compose, generate, FragmentContext, FragmentKind, ScratchNames, SqlRenderer};

// =============================================================================
// Helper Functions
// =============================================================================

fn observed(pairs: &[(&str, u64)]) -> FrequencyMapping {
    FrequencyMapping::new(pairs.iter().map(|(l, n)| (Level::value(*l), *n)))
}

fn distributions() -> Vec<FrequencyMapping> {
    vec![
        observed(&[("a", 20), ("b", 30), ("c", 25)]),
        observed(&[("only", 7)]),
        observed(&[("x", 1), ("y", 1000)]),
        observed(&[("p", 5), ("q", 5), ("r", 5), ("s", 5)]),
        FrequencyMapping::new([
            (Level::Null, 3),
            (Level::value("a"), 9),
            (Level::value("b"), 4),
        ]),
    ]
}

/// Every spec/output-size combination the resolver accepts for a mapping
fn specs_for(actual: &FrequencyMapping) -> Vec<(BalancingSpec, Option<u64>)> {
    let first = actual.levels().next().cloned().unwrap();
    let mut explicit = stratify::balance::DesiredSizeMapping::new();
    explicit.insert(first, 12);

    vec![
        (BalancingSpec::Strategy(StrategyToken::Uniform), None),
        (BalancingSpec::Strategy(StrategyToken::Uniform), Some(17)),
        (BalancingSpec::Strategy(StrategyToken::Undersample), None),
        (BalancingSpec::Strategy(StrategyToken::Oversample), None),
        (BalancingSpec::Explicit(explicit.clone()), None),
        (BalancingSpec::Explicit(explicit.clone()), Some(40)),
        (BalancingSpec::Explicit(explicit), Some(3)),
    ]
}

// =============================================================================
// choose_method Tests
// =============================================================================

#[test]
fn test_choose_method_is_total() {
    for actual in 0..40u64 {
        for desired in 0..40u64 {
            let method = choose_method(actual, desired);
            if actual < desired {
                assert_eq!(method, Method::Oversample);
            } else {
                assert_eq!(method, Method::Undersample);
            }
        }
    }
    assert_eq!(choose_method(25, 25), Method::Undersample);
}

// =============================================================================
// Target Plan Tests
// =============================================================================

/// Planned and dropped levels together cover exactly the observed levels.
#[test]
fn test_plan_covers_observed_levels() {
    for actual in distributions() {
        for (spec, output_size) in specs_for(&actual) {
            let plan = plan_targets(&spec, &actual, output_size);
            let dropped = dropped_levels(&actual, &plan);

            let planned: BTreeSet<&Level> = plan.keys().collect();
            let dropped: BTreeSet<&Level> = dropped.into_iter().collect();
            let observed: BTreeSet<&Level> = actual.levels().collect();

            assert!(planned.is_disjoint(&dropped));
            assert_eq!(
                planned.union(&dropped).copied().collect::<BTreeSet<_>>(),
                observed
            );
            assert!(plan.values().all(|p| p.target >= 1), "{:?}", plan);

            // Only explicit sizes with a spent budget drop levels
            if !matches!(spec, BalancingSpec::Explicit(_)) || output_size.is_none() {
                assert!(dropped.is_empty());
            }
        }
    }
}

/// Methods always agree with the actual/target pair, except pass-through.
#[test]
fn test_plan_methods_consistent() {
    for actual in distributions() {
        for (spec, output_size) in specs_for(&actual) {
            for (level, plan) in plan_targets(&spec, &actual, output_size) {
                let have = actual.get(&level).unwrap();
                match plan.method {
                    Method::Nosample => assert_eq!(plan.target, have),
                    method => assert_eq!(method, choose_method(have, plan.target)),
                }
            }
        }
    }
}

#[test]
fn test_spec_examples() {
    let actual = observed(&[("a", 20), ("b", 30), ("c", 25)]);

    let uniform = plan_targets(
        &spec::resolve("", None, &actual).unwrap(),
        &actual,
        None,
    );
    assert_eq!(uniform[&Level::value("a")], LevelPlan::new(25, Method::Oversample));
    assert_eq!(uniform[&Level::value("b")], LevelPlan::new(25, Method::Undersample));
    assert_eq!(uniform[&Level::value("c")], LevelPlan::new(25, Method::Undersample));

    let over = plan_targets(
        &spec::resolve("oVeR", None, &actual).unwrap(),
        &actual,
        None,
    );
    assert_eq!(over[&Level::value("a")], LevelPlan::new(30, Method::Oversample));
    assert_eq!(over[&Level::value("b")], LevelPlan::new(30, Method::Undersample));
    assert_eq!(over[&Level::value("c")], LevelPlan::new(30, Method::Oversample));

    let explicit = plan_targets(
        &spec::resolve("b=25", Some(60), &actual).unwrap(),
        &actual,
        Some(60),
    );
    assert_eq!(explicit[&Level::value("a")], LevelPlan::new(18, Method::Undersample));
    assert_eq!(explicit[&Level::value("b")], LevelPlan::new(25, Method::Undersample));
    assert_eq!(explicit[&Level::value("c")], LevelPlan::new(18, Method::Undersample));
}

// =============================================================================
// Partition Tests
// =============================================================================

#[test]
fn test_partitions_complete_disjoint_and_lossless() {
    for actual in distributions() {
        for (spec, output_size) in specs_for(&actual) {
            let plan = plan_targets(&spec, &actual, output_size);
            let partitions = MethodPartitions::split(&plan);

            let under: BTreeSet<&Level> = partitions.undersample.keys().collect();
            let over: BTreeSet<&Level> = partitions.oversample.keys().collect();
            let pass: BTreeSet<&Level> = partitions.nosample.keys().collect();
            assert!(under.is_disjoint(&over));
            assert!(under.is_disjoint(&pass));
            assert!(over.is_disjoint(&pass));
            assert_eq!(partitions.level_count(), plan.len());

            assert_eq!(partitions.merge(), plan);
            assert_eq!(MethodPartitions::split(&partitions.merge()), partitions);
        }
    }
}

// =============================================================================
// Fragment Tests
// =============================================================================

fn fragments_for(
    actual: &FrequencyMapping,
    spec: &BalancingSpec,
    with_replacement: bool,
    seed: u32,
) -> String {
    let columns = vec!["id".to_string(), "label".to_string()];
    let ctx = FragmentContext {
        source_table: "events",
        class_column: "label",
        source_columns: &columns,
        null_sentinel: "__NULL__",
        keep_null: true,
    };
    let partitions = MethodPartitions::split(&plan_targets(spec, actual, None));
    let mut names = ScratchNames::new(seed);
    let fragments = generate(&ctx, &mut names, &partitions, actual, with_replacement);

    let covered: usize = fragments.iter().map(|f| f.levels.len()).sum();
    assert_eq!(covered, partitions.level_count());

    SqlRenderer::statement(&compose(&fragments, "out", "__strat_id__").unwrap())
}

#[test]
fn test_fragments_cover_every_planned_level() {
    for actual in distributions() {
        for (spec, _) in specs_for(&actual) {
            fragments_for(&actual, &spec, false, 1);
            fragments_for(&actual, &spec, true, 1);
        }
    }
}

#[test]
fn test_rendering_depends_only_on_inputs_and_seed() {
    let actual = observed(&[("a", 20), ("b", 30), ("c", 25)]);
    let spec = BalancingSpec::Strategy(StrategyToken::Uniform);

    assert_eq!(
        fragments_for(&actual, &spec, false, 9),
        fragments_for(&actual, &spec, false, 9)
    );
    assert_ne!(
        fragments_for(&actual, &spec, false, 9),
        fragments_for(&actual, &spec, false, 10)
    );
}

#[test]
fn test_with_replacement_merges_undersample() {
    let actual = observed(&[("a", 20), ("b", 30), ("c", 25)]);
    let partitions = MethodPartitions::split(&plan_targets(
        &BalancingSpec::Strategy(StrategyToken::Uniform),
        &actual,
        None,
    ));
    let columns = vec!["label".to_string()];
    let ctx = FragmentContext {
        source_table: "events",
        class_column: "label",
        source_columns: &columns,
        null_sentinel: "__NULL__",
        keep_null: false,
    };

    let split = generate(&ctx, &mut ScratchNames::new(1), &partitions, &actual, false);
    let kinds: Vec<FragmentKind> = split.iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![FragmentKind::WithoutReplacement, FragmentKind::WithReplacement]
    );

    let merged = generate(&ctx, &mut ScratchNames::new(1), &partitions, &actual, true);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].kind, FragmentKind::WithReplacement);
    assert_eq!(merged[0].levels.len(), 3);
}
