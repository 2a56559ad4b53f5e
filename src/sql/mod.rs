//! Relational sub-plan generation for stratify
//!
//! Decisions are made in `balance`; this subsystem turns a partitioned plan
//! into an operator tree and renders it.
//!
//! # Flow
//!
//! 1. `fragments` builds one fragment per non-empty method group
//! 2. `compose` unions the fragments and adds the row identifier
//! 3. `render` serializes the tree to SQL
//!
//! Intermediate relations and helper columns are named by `ScratchNames`,
//! seeded from the planning context.

pub mod ast;
mod compose;
mod fragments;
mod names;
mod render;

pub use ast::{Binding, BindingBody, Expr, Literal, Query, Relation, RowOrder, Select, Statement};
pub use compose::compose;
pub use fragments::{
    generate, pass_through, with_replacement_fragment, without_replacement, Fragment,
    FragmentContext, FragmentKind,
};
pub use names::{is_scratch, ScratchNames, SCRATCH_PREFIX};
pub use render::{quote_ident, quote_literal, SqlRenderer};
