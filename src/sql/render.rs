//! Serializes the operator tree to SQL
//!
//! Output targets SQLite: double-quoted identifiers, single-quoted literals,
//! `RANDOM()`, window functions and `WITH RECURSIVE` for sequences.
//! Rendering is pure; the same tree always yields the same text.

use super::ast::{
    Binding, BindingBody, ColumnRef, Expr, Literal, Query, Relation, RowOrder, Select,
    SelectItem, Source, Statement,
};

/// Renders statements to SQL text
pub struct SqlRenderer;

impl SqlRenderer {
    pub fn statement(statement: &Statement) -> String {
        match statement {
            Statement::Query(query) => Self::query(query),
            Statement::CreateTableAs { table, query } => {
                format!("CREATE TABLE {} AS\n{}", quote_ident(table), Self::query(query))
            }
        }
    }

    pub fn query(query: &Query) -> String {
        if query.bindings.is_empty() {
            return Self::relation(&query.body);
        }

        let recursive = query
            .bindings
            .iter()
            .any(|b| matches!(b.body, BindingBody::Sequence { .. }));
        let bindings: Vec<String> = query.bindings.iter().map(Self::binding).collect();

        format!(
            "WITH {}{}\n{}",
            if recursive { "RECURSIVE " } else { "" },
            bindings.join(",\n"),
            Self::relation(&query.body)
        )
    }

    fn binding(binding: &Binding) -> String {
        let name = quote_ident(&binding.name);
        match &binding.body {
            BindingBody::Sequence { column, upper } => {
                let col = quote_ident(column);
                format!(
                    "{name}({col}) AS (SELECT 1 UNION ALL SELECT {col} + 1 FROM {name} WHERE {col} < {upper})"
                )
            }
            BindingBody::Relation(relation) => format!(
                "{} AS {}(\n{}\n)",
                name,
                if binding.materialized { "MATERIALIZED " } else { "" },
                Self::relation(relation)
            ),
        }
    }

    /// Renders a relation as a standalone select
    pub fn relation(relation: &Relation) -> String {
        match relation {
            Relation::Table(name) | Relation::Binding(name) => {
                format!("SELECT * FROM {}", quote_ident(name))
            }
            Relation::Values { columns, rows } => Self::values(columns, rows),
            Relation::Select(select) => Self::select(select),
            Relation::UnionAll(arms) => arms
                .iter()
                .map(Self::relation)
                .collect::<Vec<_>>()
                .join("\nUNION ALL\n"),
        }
    }

    fn values(columns: &[String], rows: &[Vec<Literal>]) -> String {
        if rows.is_empty() {
            let nulls: Vec<String> = columns
                .iter()
                .map(|c| format!("NULL AS {}", quote_ident(c)))
                .collect();
            return format!("SELECT {} LIMIT 0", nulls.join(", "));
        }

        rows.iter()
            .map(|row| {
                let cells: Vec<String> = row
                    .iter()
                    .zip(columns)
                    .map(|(value, column)| {
                        format!("{} AS {}", Self::literal(value), quote_ident(column))
                    })
                    .collect();
                format!("SELECT {}", cells.join(", "))
            })
            .collect::<Vec<_>>()
            .join(" UNION ALL ")
    }

    fn select(select: &Select) -> String {
        let items: Vec<String> = select.items.iter().map(Self::select_item).collect();
        let mut sql = format!(
            "SELECT {}\nFROM {}",
            if items.is_empty() {
                "*".to_string()
            } else {
                items.join(", ")
            },
            Self::source(&select.from)
        );

        for join in &select.joins {
            sql.push_str(&format!(
                "\nJOIN {} ON {}",
                Self::source(&join.source),
                Self::expr(&join.on)
            ));
        }
        if let Some(filter) = &select.filter {
            sql.push_str(&format!("\nWHERE {}", Self::expr(filter)));
        }
        if !select.group_by.is_empty() {
            let groups: Vec<String> = select.group_by.iter().map(Self::expr).collect();
            sql.push_str(&format!("\nGROUP BY {}", groups.join(", ")));
        }
        sql
    }

    fn select_item(item: &SelectItem) -> String {
        match item {
            SelectItem::AllFrom(alias) => format!("{}.*", quote_ident(alias)),
            SelectItem::Expr { expr, alias: None } => Self::expr(expr),
            SelectItem::Expr {
                expr,
                alias: Some(alias),
            } => format!("{} AS {}", Self::expr(expr), quote_ident(alias)),
        }
    }

    fn source(source: &Source) -> String {
        let alias = quote_ident(&source.alias);
        match &source.relation {
            Relation::Table(name) | Relation::Binding(name) => {
                format!("{} AS {}", quote_ident(name), alias)
            }
            other => format!("(\n{}\n) AS {}", Self::relation(other), alias),
        }
    }

    pub fn expr(expr: &Expr) -> String {
        match expr {
            Expr::Column(column) => Self::column(column),
            Expr::Literal(value) => Self::literal(value),
            Expr::LevelKey {
                column,
                null_sentinel,
            } => {
                let text = format!("CAST({} AS TEXT)", Self::column(column));
                match null_sentinel {
                    Some(sentinel) => format!("COALESCE({}, {})", text, quote_literal(sentinel)),
                    None => text,
                }
            }
            Expr::InList { expr, list } => {
                if list.is_empty() {
                    return "(1 = 0)".to_string();
                }
                let values: Vec<String> = list.iter().map(Self::literal).collect();
                format!("{} IN ({})", Self::expr(expr), values.join(", "))
            }
            Expr::IsNotNull(inner) => format!("{} IS NOT NULL", Self::expr(inner)),
            Expr::Eq(left, right) => format!("{} = {}", Self::expr(left), Self::expr(right)),
            Expr::LtEq(left, right) => format!("{} <= {}", Self::expr(left), Self::expr(right)),
            Expr::And(terms) => {
                if terms.is_empty() {
                    return "1".to_string();
                }
                terms.iter().map(Self::expr).collect::<Vec<_>>().join(" AND ")
            }
            Expr::RandomIndex(upper) => {
                // RANDOM() % n keeps the dividend's sign; shift into [0, n) first
                let n = Self::expr(upper);
                format!("((RANDOM() % {n}) + {n}) % {n} + 1")
            }
            Expr::RowNumber {
                partition_by,
                order,
            } => {
                let mut window = Vec::new();
                if let Some(partition) = partition_by {
                    window.push(format!("PARTITION BY {}", Self::expr(partition)));
                }
                if *order == RowOrder::Random {
                    window.push("ORDER BY RANDOM()".to_string());
                }
                format!("ROW_NUMBER() OVER ({})", window.join(" "))
            }
            Expr::CountStar => "COUNT(*)".to_string(),
        }
    }

    fn column(column: &ColumnRef) -> String {
        match &column.qualifier {
            Some(q) => format!("{}.{}", quote_ident(q), quote_ident(&column.name)),
            None => quote_ident(&column.name),
        }
    }

    fn literal(value: &Literal) -> String {
        match value {
            Literal::Text(text) => quote_literal(text),
            Literal::Integer(n) => n.to_string(),
        }
    }
}

/// Double-quotes an identifier
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quotes a string literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
