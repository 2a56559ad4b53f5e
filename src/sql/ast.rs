//! Relational operator tree for generated statements
//!
//! Covers only what balancing needs: scans, literal value lists, bounded
//! sequences, filtered/joined/grouped selects, union-all and window row
//! numbers. Rendering lives in `render`.

/// Literal value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Text(String),
    Integer(i64),
}

impl Literal {
    pub fn text(value: impl Into<String>) -> Self {
        Literal::Text(value.into())
    }

    /// Counts are unsigned; anything past `i64::MAX` saturates
    pub fn count(value: u64) -> Self {
        Literal::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

/// Possibly qualified column reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub qualifier: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }
}

/// Row ordering inside a row-number window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Independent random draw per row
    Random,
    /// Whatever order the engine produces
    Arbitrary,
}

/// Scalar expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Literal),
    /// Text rendering of a class column; nulls become the sentinel when one is set
    LevelKey {
        column: ColumnRef,
        null_sentinel: Option<String>,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Literal>,
    },
    IsNotNull(Box<Expr>),
    Eq(Box<Expr>, Box<Expr>),
    LtEq(Box<Expr>, Box<Expr>),
    And(Vec<Expr>),
    /// Uniform random integer in `[1, upper]`
    RandomIndex(Box<Expr>),
    RowNumber {
        partition_by: Option<Box<Expr>>,
        order: RowOrder,
    },
    CountStar,
}

impl Expr {
    pub fn column(qualifier: &str, name: &str) -> Self {
        Expr::Column(ColumnRef::qualified(qualifier, name))
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Expr::Eq(Box::new(left), Box::new(right))
    }

    pub fn lt_eq(left: Expr, right: Expr) -> Self {
        Expr::LtEq(Box::new(left), Box::new(right))
    }

    pub fn in_list(expr: Expr, list: Vec<Literal>) -> Self {
        Expr::InList {
            expr: Box::new(expr),
            list,
        }
    }

    pub fn random_index(upper: Expr) -> Self {
        Expr::RandomIndex(Box::new(upper))
    }

    pub fn row_number(partition_by: Option<Expr>, order: RowOrder) -> Self {
        Expr::RowNumber {
            partition_by: partition_by.map(Box::new),
            order,
        }
    }
}

/// One entry of a select list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectItem {
    /// `alias.*`
    AllFrom(String),
    Expr { expr: Expr, alias: Option<String> },
}

/// Aliased relation in a FROM or JOIN clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub relation: Relation,
    pub alias: String,
}

/// Inner join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub source: Source,
    pub on: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub items: Vec<SelectItem>,
    pub from: Source,
    pub joins: Vec<Join>,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
}

impl Select {
    pub fn from(relation: Relation, alias: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            from: Source {
                relation,
                alias: alias.into(),
            },
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
        }
    }

    pub fn all_from(mut self, alias: impl Into<String>) -> Self {
        self.items.push(SelectItem::AllFrom(alias.into()));
        self
    }

    pub fn item(mut self, expr: Expr, alias: impl Into<String>) -> Self {
        self.items.push(SelectItem::Expr {
            expr,
            alias: Some(alias.into()),
        });
        self
    }

    /// Projects `qualifier.name AS name` for each column
    pub fn columns(mut self, qualifier: &str, names: &[String]) -> Self {
        for name in names {
            self.items.push(SelectItem::Expr {
                expr: Expr::column(qualifier, name),
                alias: Some(name.clone()),
            });
        }
        self
    }

    pub fn join(mut self, relation: Relation, alias: impl Into<String>, on: Expr) -> Self {
        self.joins.push(Join {
            source: Source {
                relation,
                alias: alias.into(),
            },
            on,
        });
        self
    }

    pub fn filter(mut self, predicate: Expr) -> Self {
        self.filter = Some(predicate);
        self
    }

    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    pub fn into_relation(self) -> Relation {
        Relation::Select(Box::new(self))
    }
}

/// Row-producing relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// Base table in the store
    Table(String),
    /// Reference to a binding of the enclosing query
    Binding(String),
    /// Literal rows
    Values {
        columns: Vec<String>,
        rows: Vec<Vec<Literal>>,
    },
    Select(Box<Select>),
    UnionAll(Vec<Relation>),
}

/// Body of a named binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingBody {
    Relation(Relation),
    /// Integers `1..=upper` in a single column
    Sequence { column: String, upper: u64 },
}

/// Named intermediate relation (`WITH name AS ...`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub body: BindingBody,
    /// Evaluate once; required wherever random values are produced
    pub materialized: bool,
}

impl Binding {
    pub fn relation(name: impl Into<String>, relation: Relation, materialized: bool) -> Self {
        Self {
            name: name.into(),
            body: BindingBody::Relation(relation),
            materialized,
        }
    }

    pub fn sequence(name: impl Into<String>, column: impl Into<String>, upper: u64) -> Self {
        Self {
            name: name.into(),
            body: BindingBody::Sequence {
                column: column.into(),
                upper,
            },
            materialized: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub bindings: Vec<Binding>,
    pub body: Relation,
}

impl Query {
    pub fn new(body: Relation) -> Self {
        Self {
            bindings: Vec::new(),
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Query(Query),
    CreateTableAs { table: String, query: Query },
}
