//! Composes fragments into the statement that materializes the result
//!
//! Fragments are unioned without deduplication (their levels are disjoint)
//! and every output row gets a dense sequential identifier.

use super::ast::{Expr, Query, Relation, RowOrder, Select, Statement};
use super::fragments::Fragment;

const UNION_ALIAS: &str = "u";

/// The union of all fragments plus the row identifier
fn compose_query(fragments: &[Fragment], id_column: &str) -> Option<Query> {
    if fragments.is_empty() {
        return None;
    }

    let bindings = fragments
        .iter()
        .flat_map(|f| f.bindings.iter().cloned())
        .collect();
    let union = Relation::UnionAll(fragments.iter().map(|f| f.relation.clone()).collect());

    let body = Select::from(union, UNION_ALIAS)
        .all_from(UNION_ALIAS)
        .item(Expr::row_number(None, RowOrder::Arbitrary), id_column)
        .into_relation();

    Some(Query { bindings, body })
}

/// `CREATE TABLE output AS <composed query>`; `None` when there is nothing to union
pub fn compose(fragments: &[Fragment], output_table: &str, id_column: &str) -> Option<Statement> {
    compose_query(fragments, id_column).map(|query| Statement::CreateTableAs {
        table: output_table.to_string(),
        query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::level::{FrequencyMapping, Level};
    use crate::sql::fragments::{pass_through, with_replacement_fragment, FragmentContext};
    use crate::sql::names::ScratchNames;
    use crate::sql::render::SqlRenderer;
    use std::collections::BTreeMap;

    #[test]
    fn test_nothing_to_compose() {
        assert!(compose(&[], "out", "__id__").is_none());
    }

    #[test]
    fn test_compose_unions_and_numbers_rows() {
        let columns = vec!["id".to_string(), "label".to_string()];
        let ctx = FragmentContext {
            source_table: "events",
            class_column: "label",
            source_columns: &columns,
            null_sentinel: "__NULL__",
            keep_null: false,
        };
        let actual = FrequencyMapping::new([(Level::value("a"), 2), (Level::value("b"), 9)]);
        let mut names = ScratchNames::new(3);

        let passed: BTreeMap<Level, u64> = [(Level::value("b"), 9)].into_iter().collect();
        let drawn: BTreeMap<Level, u64> = [(Level::value("a"), 9)].into_iter().collect();
        let fragments = vec![
            pass_through(&ctx, &passed).unwrap(),
            with_replacement_fragment(&ctx, &mut names, &drawn, &actual).unwrap(),
        ];

        let statement = compose(&fragments, "balanced", "__id__").unwrap();
        let Statement::CreateTableAs { table, query } = &statement else {
            panic!("expected CREATE TABLE AS");
        };
        assert_eq!(table, "balanced");
        assert_eq!(query.bindings.len(), 3);

        let sql = SqlRenderer::statement(&statement);
        assert!(sql.starts_with("CREATE TABLE \"balanced\" AS\nWITH RECURSIVE "));
        assert_eq!(sql.matches("\nUNION ALL\n").count(), 1);
        assert!(sql.contains("ROW_NUMBER() OVER () AS \"__id__\""));
    }

    #[test]
    fn test_same_inputs_render_identically() {
        let columns = vec!["label".to_string()];
        let ctx = FragmentContext {
            source_table: "t",
            class_column: "label",
            source_columns: &columns,
            null_sentinel: "__NULL__",
            keep_null: true,
        };
        let actual = FrequencyMapping::new([(Level::Null, 2), (Level::value("a"), 5)]);
        let drawn: BTreeMap<Level, u64> = [(Level::Null, 5)].into_iter().collect();

        let render = || {
            let mut names = ScratchNames::new(11);
            let fragment = with_replacement_fragment(&ctx, &mut names, &drawn, &actual).unwrap();
            SqlRenderer::statement(&compose(&[fragment], "o", "__id__").unwrap())
        };
        assert_eq!(render(), render());
    }
}
