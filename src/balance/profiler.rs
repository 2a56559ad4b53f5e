//! Frequency profiling of the class column
//!
//! One grouped count over the source table. Null class values are either
//! filtered out or reported as the null level.

use crate::observability::{log_event_with_fields, Event};
use crate::sql::ast::ColumnRef;
use crate::sql::{Expr, Query, Relation, Select, SqlRenderer, Statement};
use crate::store::RelationalStore;

use super::errors::BalanceResult;
use super::level::{FrequencyMapping, Level};

const SOURCE_ALIAS: &str = "src";

/// `SELECT key AS level, COUNT(*) AS n FROM source GROUP BY key`
pub fn frequency_query(source_table: &str, class_column: &str, keep_null: bool) -> Statement {
    let key = Expr::LevelKey {
        column: ColumnRef::qualified(SOURCE_ALIAS, class_column),
        null_sentinel: None,
    };

    let mut select = Select::from(Relation::Table(source_table.to_string()), SOURCE_ALIAS)
        .item(key.clone(), "level")
        .item(Expr::CountStar, "n")
        .group_by(key);

    if !keep_null {
        select = select.filter(Expr::IsNotNull(Box::new(Expr::column(
            SOURCE_ALIAS,
            class_column,
        ))));
    }

    Statement::Query(Query::new(select.into_relation()))
}

/// Counts rows per level of `class_column`
pub fn profile<S: RelationalStore + ?Sized>(
    store: &S,
    source_table: &str,
    class_column: &str,
    keep_null: bool,
) -> BalanceResult<FrequencyMapping> {
    let sql = SqlRenderer::statement(&frequency_query(source_table, class_column, keep_null));
    log_event_with_fields(
        Event::ProfileStart,
        &[("source", source_table), ("class_col", class_column)],
    );

    let counts = store.level_counts(&sql)?;
    let frequencies = FrequencyMapping::new(
        counts
            .into_iter()
            .map(|(level, count)| (Level::from(level), count)),
    );

    let levels = frequencies.len().to_string();
    let rows = frequencies.total().to_string();
    log_event_with_fields(
        Event::ProfileComplete,
        &[("source", source_table), ("levels", &levels), ("rows", &rows)],
    );

    Ok(frequencies)
}
