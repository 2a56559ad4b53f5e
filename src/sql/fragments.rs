//! Sub-plan fragments, one per resampling method group
//!
//! - Pass-through: every row of the listed levels, unchanged.
//! - Without replacement: rows ranked randomly within their level, kept
//!   while rank <= target. A target above the level's count keeps every row.
//! - With replacement: `target` uniform draws of a row index in
//!   `[1, actual]` per level, joined back to an enumeration of the rows.
//!
//! Fragments project exactly the source columns, in source order, so they
//! can be unioned.

use std::collections::BTreeMap;
use std::fmt;

use crate::balance::level::{FrequencyMapping, Level};
use crate::balance::partition::MethodPartitions;

use super::ast::{Binding, ColumnRef, Expr, Literal, Relation, RowOrder, Select};
use super::names::ScratchNames;

const SOURCE_ALIAS: &str = "src";

/// Fixed inputs shared by all generators
#[derive(Debug, Clone)]
pub struct FragmentContext<'a> {
    pub source_table: &'a str,
    pub class_column: &'a str,
    /// Source columns in schema order
    pub source_columns: &'a [String],
    pub null_sentinel: &'a str,
    /// Whether null class values form a level
    pub keep_null: bool,
}

impl FragmentContext<'_> {
    /// Level key over the source alias
    fn level_key(&self) -> Expr {
        Expr::LevelKey {
            column: ColumnRef::qualified(SOURCE_ALIAS, self.class_column),
            null_sentinel: self.keep_null.then(|| self.null_sentinel.to_string()),
        }
    }

    fn level_literal(&self, level: &Level) -> Literal {
        Literal::text(level.key_text(self.null_sentinel))
    }

    fn level_filter<'l>(&self, levels: impl IntoIterator<Item = &'l Level>) -> Expr {
        let list = levels.into_iter().map(|l| self.level_literal(l)).collect();
        Expr::in_list(self.level_key(), list)
    }

    fn source(&self) -> Relation {
        Relation::Table(self.source_table.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    PassThrough,
    WithoutReplacement,
    WithReplacement,
}

impl FragmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::PassThrough => "pass_through",
            FragmentKind::WithoutReplacement => "without_replacement",
            FragmentKind::WithReplacement => "with_replacement",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sub-plan plus the bindings it depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub bindings: Vec<Binding>,
    pub relation: Relation,
    /// Levels covered by this fragment
    pub levels: Vec<Level>,
}

/// Builds the fragments for all non-empty partitions.
///
/// The undersample partition is drawn with replacement when
/// `with_replacement` is set, and then shares one fragment with the
/// oversample partition.
pub fn generate(
    ctx: &FragmentContext<'_>,
    names: &mut ScratchNames,
    partitions: &MethodPartitions,
    actual: &FrequencyMapping,
    with_replacement: bool,
) -> Vec<Fragment> {
    let mut fragments = Vec::new();

    if let Some(fragment) = pass_through(ctx, &partitions.nosample) {
        fragments.push(fragment);
    }

    if with_replacement {
        let mut drawn = partitions.oversample.clone();
        drawn.extend(partitions.undersample.iter().map(|(l, n)| (l.clone(), *n)));
        fragments.extend(with_replacement_fragment(ctx, names, &drawn, actual));
    } else {
        fragments.extend(without_replacement(ctx, names, &partitions.undersample));
        fragments.extend(with_replacement_fragment(ctx, names, &partitions.oversample, actual));
    }

    fragments
}

/// Every row of the given levels, unmodified
pub fn pass_through(
    ctx: &FragmentContext<'_>,
    levels: &BTreeMap<Level, u64>,
) -> Option<Fragment> {
    if levels.is_empty() {
        return None;
    }

    let relation = Select::from(ctx.source(), SOURCE_ALIAS)
        .columns(SOURCE_ALIAS, ctx.source_columns)
        .filter(ctx.level_filter(levels.keys()))
        .into_relation();

    Some(Fragment {
        kind: FragmentKind::PassThrough,
        bindings: Vec::new(),
        relation,
        levels: levels.keys().cloned().collect(),
    })
}

/// Up to `target` distinct rows per level, chosen by random rank
pub fn without_replacement(
    ctx: &FragmentContext<'_>,
    names: &mut ScratchNames,
    targets: &BTreeMap<Level, u64>,
) -> Option<Fragment> {
    if targets.is_empty() {
        return None;
    }

    let ranked_name = names.next("ranked");
    let level_col = names.next("level");
    let rank_col = names.next("rank");
    let target_col = names.next("target");

    let ranked = Select::from(ctx.source(), SOURCE_ALIAS)
        .all_from(SOURCE_ALIAS)
        .item(ctx.level_key(), level_col.clone())
        .item(
            Expr::row_number(Some(ctx.level_key()), RowOrder::Random),
            rank_col.clone(),
        )
        .filter(ctx.level_filter(targets.keys()))
        .into_relation();

    let target_rows = Relation::Values {
        columns: vec![level_col.clone(), target_col.clone()],
        rows: targets
            .iter()
            .map(|(level, n)| vec![ctx.level_literal(level), Literal::count(*n)])
            .collect(),
    };

    let relation = Select::from(Relation::Binding(ranked_name.clone()), "r")
        .columns("r", ctx.source_columns)
        .join(
            target_rows,
            "t",
            Expr::And(vec![
                Expr::eq(Expr::column("r", &level_col), Expr::column("t", &level_col)),
                Expr::lt_eq(Expr::column("r", &rank_col), Expr::column("t", &target_col)),
            ]),
        )
        .into_relation();

    Some(Fragment {
        kind: FragmentKind::WithoutReplacement,
        bindings: vec![Binding::relation(ranked_name, ranked, true)],
        relation,
        levels: targets.keys().cloned().collect(),
    })
}

/// Exactly `target` rows per level, drawn independently with replacement.
///
/// Levels with no observed rows are skipped.
pub fn with_replacement_fragment(
    ctx: &FragmentContext<'_>,
    names: &mut ScratchNames,
    targets: &BTreeMap<Level, u64>,
    actual: &FrequencyMapping,
) -> Option<Fragment> {
    let drawable: Vec<(&Level, u64, u64)> = targets
        .iter()
        .filter_map(|(level, target)| {
            actual
                .get(level)
                .filter(|have| *have > 0 && *target > 0)
                .map(|have| (level, *target, have))
        })
        .collect();
    if drawable.is_empty() {
        return None;
    }
    let max_target = drawable.iter().map(|(_, target, _)| *target).max().unwrap_or(1);

    let enumerated_name = names.next("enumerated");
    let seq_name = names.next("seq");
    let draws_name = names.next("draws");
    let level_col = names.next("level");
    let index_col = names.next("index");
    let step_col = names.next("step");
    let target_col = names.next("target");
    let actual_col = names.next("actual");

    let enumerated = Select::from(ctx.source(), SOURCE_ALIAS)
        .all_from(SOURCE_ALIAS)
        .item(ctx.level_key(), level_col.clone())
        .item(
            Expr::row_number(Some(ctx.level_key()), RowOrder::Arbitrary),
            index_col.clone(),
        )
        .filter(ctx.level_filter(drawable.iter().map(|(level, _, _)| *level)))
        .into_relation();

    let level_rows = Relation::Values {
        columns: vec![level_col.clone(), target_col.clone(), actual_col.clone()],
        rows: drawable
            .iter()
            .map(|(level, target, have)| {
                vec![
                    ctx.level_literal(level),
                    Literal::count(*target),
                    Literal::count(*have),
                ]
            })
            .collect(),
    };

    let draws = Select::from(level_rows, "t")
        .item(Expr::column("t", &level_col), level_col.clone())
        .item(
            Expr::random_index(Expr::column("t", &actual_col)),
            index_col.clone(),
        )
        .join(
            Relation::Binding(seq_name.clone()),
            "s",
            Expr::lt_eq(Expr::column("s", &step_col), Expr::column("t", &target_col)),
        )
        .into_relation();

    let relation = Select::from(Relation::Binding(draws_name.clone()), "d")
        .columns("e", ctx.source_columns)
        .join(
            Relation::Binding(enumerated_name.clone()),
            "e",
            Expr::And(vec![
                Expr::eq(Expr::column("e", &level_col), Expr::column("d", &level_col)),
                Expr::eq(Expr::column("e", &index_col), Expr::column("d", &index_col)),
            ]),
        )
        .into_relation();

    Some(Fragment {
        kind: FragmentKind::WithReplacement,
        bindings: vec![
            Binding::relation(enumerated_name, enumerated, true),
            Binding::sequence(seq_name, step_col, max_target),
            Binding::relation(draws_name, draws, true),
        ],
        relation,
        levels: drawable.iter().map(|(level, _, _)| (*level).clone()).collect(),
    })
}
