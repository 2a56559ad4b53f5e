//! Balancing orchestration
//!
//! Pre-flight checks, in order (first failure wins):
//! 1. Required identifiers are non-empty
//! 2. Grouping columns are unset
//! 3. Source table exists
//! 4. Output table does not exist
//! 5. Class column is in the source schema
//! 6. Id column is not in the source schema and differs from the class column
//! 7. Output size, if given, is positive
//! 8. The profile has at least one level
//! 9. The null sentinel is not an observed class value
//! 10. The balancing specification resolves
//!
//! Nothing is written until every check has passed and a statement has
//! been composed.

use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::sql::{
    compose, generate, is_scratch, Fragment, FragmentContext, ScratchNames, SqlRenderer,
    Statement,
};
use crate::store::RelationalStore;

use super::errors::{BalanceError, BalanceResult};
use super::level::{FrequencyMapping, Level};
use super::partition::MethodPartitions;
use super::profiler;
use super::request::BalanceRequest;
use super::spec::{self, BalancingSpec};
use super::targets::{dropped_levels, plan_targets, TargetPlan};

/// Default name of the generated row identifier column
pub const DEFAULT_ID_COLUMN: &str = "__strat_id__";

/// Default stand-in for null class values inside generated statements
pub const DEFAULT_NULL_SENTINEL: &str = "__NULL__";

/// Reserved names and the scratch seed for one planning context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceContext {
    pub id_column: String,
    pub null_sentinel: String,
    /// Seed for scratch identifiers
    pub seed: u32,
}

impl BalanceContext {
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }
}

impl Default for BalanceContext {
    fn default() -> Self {
        Self {
            id_column: DEFAULT_ID_COLUMN.to_string(),
            null_sentinel: DEFAULT_NULL_SENTINEL.to_string(),
            seed: 0,
        }
    }
}

/// Everything decided for one request; nothing has been written yet
#[derive(Debug, Clone)]
pub struct BalancePlan {
    pub request: BalanceRequest,
    pub frequencies: FrequencyMapping,
    pub spec: BalancingSpec,
    pub targets: TargetPlan,
    pub partitions: MethodPartitions,
    /// Observed levels that received no plan
    pub dropped: Vec<Level>,
    pub fragments: Vec<Fragment>,
    pub statement: Statement,
    /// Rendered statement
    pub sql: String,
}

impl BalancePlan {
    /// Rows the output will hold, from the targets alone; saturates at `u64::MAX`
    pub fn expected_rows(&self) -> u64 {
        let passed = self.partitions.nosample.values();
        let drawn = self.partitions.oversample.values();
        let undersampled = self.partitions.undersample.iter().map(|(level, target)| {
            if self.request.with_replacement {
                *target
            } else {
                (*target).min(self.frequencies.get(level).unwrap_or(0))
            }
        });

        passed
            .chain(drawn)
            .copied()
            .chain(undersampled)
            .fold(0, u64::saturating_add)
    }
}

/// Result of a materialized request
#[derive(Debug, Clone)]
pub struct BalanceOutcome {
    pub output_table: String,
    pub rows_written: u64,
    pub plan: BalancePlan,
}

/// Source state gathered by pre-flight
struct Prepared {
    columns: Vec<String>,
    frequencies: FrequencyMapping,
    output_size: Option<u64>,
    spec: BalancingSpec,
}

/// Plans and materializes balanced samples against a relational store
pub struct Balancer<'a, S: RelationalStore> {
    store: &'a mut S,
    context: BalanceContext,
}

impl<'a, S: RelationalStore> Balancer<'a, S> {
    pub fn new(store: &'a mut S, context: BalanceContext) -> Self {
        Self { store, context }
    }

    pub fn context(&self) -> &BalanceContext {
        &self.context
    }

    /// Checks the source side of a request and returns the observed level counts.
    ///
    /// The output table is not consulted.
    pub fn profile(&self, request: &BalanceRequest) -> BalanceResult<FrequencyMapping> {
        logging_rejection(request, || {
            require("source_table", &request.source_table)?;
            require("class_col", &request.class_column)?;
            self.check_source_exists(request)?;
            self.class_schema(request)?;
            self.profile_source(request)
        })
    }

    /// Decides every level's target and composes the statement
    pub fn plan(&self, request: &BalanceRequest) -> BalanceResult<BalancePlan> {
        let prepared = logging_rejection(request, || self.prepare(request))?;

        log_event_with_fields(
            Event::SpecResolved,
            &[("spec", &describe_spec(&prepared.spec))],
        );

        let targets = plan_targets(&prepared.spec, &prepared.frequencies, prepared.output_size);
        let dropped: Vec<Level> = dropped_levels(&prepared.frequencies, &targets)
            .into_iter()
            .cloned()
            .collect();
        if !dropped.is_empty() {
            let names: Vec<String> = dropped.iter().map(|l| l.to_string()).collect();
            log_event_with_fields(
                Event::LevelsDropped,
                &[
                    ("levels", &names.join(",")),
                    ("reason", "no output budget left for unspecified levels"),
                ],
            );
        }

        let partitions = MethodPartitions::split(&targets);
        log_event_with_fields(
            Event::TargetsPlanned,
            &[
                ("levels", &targets.len().to_string()),
                ("nosample", &partitions.nosample.len().to_string()),
                ("oversample", &partitions.oversample.len().to_string()),
                ("undersample", &partitions.undersample.len().to_string()),
            ],
        );

        let ctx = FragmentContext {
            source_table: &request.source_table,
            class_column: &request.class_column,
            source_columns: &prepared.columns,
            null_sentinel: &self.context.null_sentinel,
            keep_null: request.keep_null,
        };
        let mut names = ScratchNames::new(self.context.seed);
        let fragments = generate(
            &ctx,
            &mut names,
            &partitions,
            &prepared.frequencies,
            request.with_replacement,
        );
        for fragment in &fragments {
            log_event_with_fields(
                Event::FragmentBuilt,
                &[
                    ("kind", fragment.kind.as_str()),
                    ("levels", &fragment.levels.len().to_string()),
                ],
            );
        }

        let statement = compose(&fragments, &request.output_table, &self.context.id_column)
            .ok_or_else(BalanceError::empty_plan)?;
        let sql = SqlRenderer::statement(&statement);

        Ok(BalancePlan {
            request: request.clone(),
            frequencies: prepared.frequencies,
            spec: prepared.spec,
            targets,
            partitions,
            dropped,
            fragments,
            statement,
            sql,
        })
    }

    /// Plans the request and creates the output table
    pub fn run(&mut self, request: &BalanceRequest) -> BalanceResult<BalanceOutcome> {
        let scope = ObservationScope::with_fields(
            "BALANCE",
            &[
                ("output", &request.output_table),
                ("source", &request.source_table),
            ],
        );

        let plan = match self.plan(request) {
            Ok(plan) => plan,
            Err(err) => {
                scope.fail(err.code().code());
                return Err(err);
            }
        };

        let rows_written = match self.materialize(&plan) {
            Ok(rows) => rows,
            Err(err) => {
                scope.fail(err.code().code());
                return Err(err);
            }
        };

        scope.complete_with_fields(&[("rows", &rows_written.to_string())]);
        Ok(BalanceOutcome {
            output_table: request.output_table.clone(),
            rows_written,
            plan,
        })
    }

    fn materialize(&mut self, plan: &BalancePlan) -> BalanceResult<u64> {
        let output = plan.request.output_table.as_str();
        log_event_with_fields(
            Event::MaterializeStart,
            &[
                ("fragments", &plan.fragments.len().to_string()),
                ("output", output),
            ],
        );

        if let Err(err) = self.store.execute(&plan.sql) {
            let reason = err.to_string();
            log_event_with_fields(
                Event::MaterializeFailed,
                &[("output", output), ("reason", &reason)],
            );
            return Err(err.into());
        }

        let rows = self.store.row_count(output)?;
        log_event_with_fields(
            Event::MaterializeComplete,
            &[("output", output), ("rows", &rows.to_string())],
        );
        Ok(rows)
    }

    fn prepare(&self, request: &BalanceRequest) -> BalanceResult<Prepared> {
        require("source_table", &request.source_table)?;
        require("output_table", &request.output_table)?;
        require("class_col", &request.class_column)?;
        if request.grouping_requested() {
            return Err(BalanceError::grouping_unsupported());
        }

        self.check_source_exists(request)?;
        if self.store.table_exists(&request.output_table)? {
            return Err(BalanceError::output_exists(&request.output_table));
        }
        let columns = self.class_schema(request)?;
        self.check_reserved_columns(request, &columns)?;

        let output_size = match request.output_size {
            Some(n) if n <= 0 => {
                return Err(BalanceError::non_positive_size("output_table_size", n));
            }
            Some(n) => Some(n as u64),
            None => None,
        };

        let frequencies = self.profile_source(request)?;
        let spec = spec::resolve(&request.class_size, output_size, &frequencies)?;

        Ok(Prepared {
            columns,
            frequencies,
            output_size,
            spec,
        })
    }

    fn check_source_exists(&self, request: &BalanceRequest) -> BalanceResult<()> {
        if !self.store.table_exists(&request.source_table)? {
            return Err(BalanceError::source_missing(&request.source_table));
        }
        Ok(())
    }

    /// Source columns in schema order; the class column must be among them
    fn class_schema(&self, request: &BalanceRequest) -> BalanceResult<Vec<String>> {
        let columns = self.store.table_columns(&request.source_table)?;
        if !columns
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&request.class_column))
        {
            return Err(BalanceError::column_missing(
                &request.class_column,
                &request.source_table,
            ));
        }
        Ok(columns)
    }

    /// Reserved names and scratch identifiers must not collide with source columns
    fn check_reserved_columns(
        &self,
        request: &BalanceRequest,
        columns: &[String],
    ) -> BalanceResult<()> {
        let id_column = &self.context.id_column;
        if id_column.eq_ignore_ascii_case(&request.class_column)
            || columns.iter().any(|c| c.eq_ignore_ascii_case(id_column))
        {
            return Err(BalanceError::reserved_name("id_column", id_column));
        }
        let sentinel = &self.context.null_sentinel;
        if columns.iter().any(|c| c.eq_ignore_ascii_case(sentinel)) {
            return Err(BalanceError::reserved_name("null_sentinel", sentinel));
        }
        if let Some(column) = columns.iter().find(|c| is_scratch(c)) {
            return Err(BalanceError::reserved_name("source_table", column));
        }
        Ok(())
    }

    fn profile_source(&self, request: &BalanceRequest) -> BalanceResult<FrequencyMapping> {
        let frequencies = profiler::profile(
            &*self.store,
            &request.source_table,
            &request.class_column,
            request.keep_null,
        )?;
        if frequencies.is_empty() {
            return Err(BalanceError::source_empty(&request.source_table));
        }

        let sentinel = Level::value(self.context.null_sentinel.as_str());
        if request.keep_null && frequencies.contains(&sentinel) {
            return Err(BalanceError::reserved_name(
                "null_sentinel",
                &self.context.null_sentinel,
            ));
        }
        Ok(frequencies)
    }
}

fn require(parameter: &'static str, value: &str) -> BalanceResult<()> {
    if value.trim().is_empty() {
        return Err(BalanceError::missing_parameter(parameter));
    }
    Ok(())
}

/// Logs a pre-flight rejection before handing the error back
fn logging_rejection<T>(
    request: &BalanceRequest,
    check: impl FnOnce() -> BalanceResult<T>,
) -> BalanceResult<T> {
    check().inspect_err(|err| {
        let mut fields = vec![
            ("code", err.code().code()),
            ("message", err.message()),
            ("source", request.source_table.as_str()),
        ];
        if let Some(parameter) = err.parameter() {
            fields.push(("parameter", parameter));
        }
        log_event_with_fields(Event::PreflightRejected, &fields);
    })
}

fn describe_spec(spec: &BalancingSpec) -> String {
    match spec {
        BalancingSpec::Strategy(token) => token.as_str().to_string(),
        BalancingSpec::Explicit(sizes) => sizes
            .iter()
            .map(|(level, n)| format!("{}={}", level, n))
            .collect::<Vec<_>>()
            .join(","),
    }
}
