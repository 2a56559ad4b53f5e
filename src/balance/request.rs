//! Balancing request
//!
//! Identifiers and options for one invocation. Values are carried as given;
//! validation happens in the balancer's pre-flight.

use serde::Serialize;

/// One balancing invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceRequest {
    pub source_table: String,
    pub output_table: String,
    pub class_column: String,
    /// Strategy prefix or explicit `level=count` list; empty means uniform
    pub class_size: String,
    /// Overall output size goal
    pub output_size: Option<i64>,
    /// Must stay unset
    pub grouping_cols: Option<String>,
    pub with_replacement: bool,
    pub keep_null: bool,
}

impl BalanceRequest {
    pub fn new(
        source_table: impl Into<String>,
        output_table: impl Into<String>,
        class_column: impl Into<String>,
    ) -> Self {
        Self {
            source_table: source_table.into(),
            output_table: output_table.into(),
            class_column: class_column.into(),
            class_size: String::new(),
            output_size: None,
            grouping_cols: None,
            with_replacement: false,
            keep_null: false,
        }
    }

    pub fn with_class_size(mut self, class_size: impl Into<String>) -> Self {
        self.class_size = class_size.into();
        self
    }

    pub fn with_output_size(mut self, output_size: i64) -> Self {
        self.output_size = Some(output_size);
        self
    }

    pub fn with_grouping_cols(mut self, grouping_cols: impl Into<String>) -> Self {
        self.grouping_cols = Some(grouping_cols.into());
        self
    }

    pub fn with_replacement(mut self, with_replacement: bool) -> Self {
        self.with_replacement = with_replacement;
        self
    }

    pub fn keep_null(mut self, keep_null: bool) -> Self {
        self.keep_null = keep_null;
        self
    }

    /// Grouping columns that were actually supplied
    pub fn grouping_requested(&self) -> bool {
        self.grouping_cols
            .as_deref()
            .is_some_and(|cols| !cols.trim().is_empty())
    }
}
