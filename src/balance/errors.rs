//! Balancing error types
//!
//! Error codes by category:
//! - Configuration: STRAT_MISSING_PARAMETER, STRAT_OUTPUT_EXISTS, STRAT_SOURCE_MISSING,
//!   STRAT_SOURCE_EMPTY, STRAT_COLUMN_MISSING, STRAT_RESERVED_NAME, STRAT_GROUPING_UNSUPPORTED
//! - Specification: STRAT_SPEC_TOO_SHORT, STRAT_SPEC_UNKNOWN, STRAT_UNKNOWN_LEVEL,
//!   STRAT_DUPLICATE_LEVEL, STRAT_NON_POSITIVE_SIZE, STRAT_SIZE_CONFLICT, STRAT_MALFORMED_SPEC
//! - Type: STRAT_NOT_AN_INTEGER
//! - Internal: STRAT_STORE_FAILURE, STRAT_EMPTY_PLAN
//!
//! Every error is fatal to the invocation. Nothing is written once one is raised.

use std::fmt;

use crate::store::StoreError;

/// Error category, used as the display prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad identifiers or table state
    Configuration,
    /// Bad balancing specification
    Specification,
    /// Value not coercible to the required type
    Type,
    /// Store failure or broken planner invariant
    Internal,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "CONFIGURATION",
            ErrorCategory::Specification => "SPECIFICATION",
            ErrorCategory::Type => "TYPE",
            ErrorCategory::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Balancing error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceErrorCode {
    /// A required identifier is missing or empty
    StratMissingParameter,
    /// Output table already exists
    StratOutputExists,
    /// Source table does not exist
    StratSourceMissing,
    /// Source table has no usable rows
    StratSourceEmpty,
    /// Class column not in the source schema
    StratColumnMissing,
    /// Reserved identifier collides with user data
    StratReservedName,
    /// Grouping columns were requested
    StratGroupingUnsupported,
    /// Strategy prefix shorter than three characters
    StratSpecTooShort,
    /// Strategy prefix matches no known strategy
    StratSpecUnknown,
    /// Explicit size names a level that was not observed
    StratUnknownLevel,
    /// Explicit size names a level twice
    StratDuplicateLevel,
    /// Explicit size or output size is not positive
    StratNonPositiveSize,
    /// Size-determining strategy combined with an output size
    StratSizeConflict,
    /// Explicit size list cannot be tokenized
    StratMalformedSpec,
    /// Explicit size is not an integer
    StratNotAnInteger,
    /// The relational store failed
    StratStoreFailure,
    /// No fragment was produced
    StratEmptyPlan,
}

impl BalanceErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            BalanceErrorCode::StratMissingParameter => "STRAT_MISSING_PARAMETER",
            BalanceErrorCode::StratOutputExists => "STRAT_OUTPUT_EXISTS",
            BalanceErrorCode::StratSourceMissing => "STRAT_SOURCE_MISSING",
            BalanceErrorCode::StratSourceEmpty => "STRAT_SOURCE_EMPTY",
            BalanceErrorCode::StratColumnMissing => "STRAT_COLUMN_MISSING",
            BalanceErrorCode::StratReservedName => "STRAT_RESERVED_NAME",
            BalanceErrorCode::StratGroupingUnsupported => "STRAT_GROUPING_UNSUPPORTED",
            BalanceErrorCode::StratSpecTooShort => "STRAT_SPEC_TOO_SHORT",
            BalanceErrorCode::StratSpecUnknown => "STRAT_SPEC_UNKNOWN",
            BalanceErrorCode::StratUnknownLevel => "STRAT_UNKNOWN_LEVEL",
            BalanceErrorCode::StratDuplicateLevel => "STRAT_DUPLICATE_LEVEL",
            BalanceErrorCode::StratNonPositiveSize => "STRAT_NON_POSITIVE_SIZE",
            BalanceErrorCode::StratSizeConflict => "STRAT_SIZE_CONFLICT",
            BalanceErrorCode::StratMalformedSpec => "STRAT_MALFORMED_SPEC",
            BalanceErrorCode::StratNotAnInteger => "STRAT_NOT_AN_INTEGER",
            BalanceErrorCode::StratStoreFailure => "STRAT_STORE_FAILURE",
            BalanceErrorCode::StratEmptyPlan => "STRAT_EMPTY_PLAN",
        }
    }

    /// Returns the category of this code
    pub fn category(&self) -> ErrorCategory {
        match self {
            BalanceErrorCode::StratMissingParameter
            | BalanceErrorCode::StratOutputExists
            | BalanceErrorCode::StratSourceMissing
            | BalanceErrorCode::StratSourceEmpty
            | BalanceErrorCode::StratColumnMissing
            | BalanceErrorCode::StratReservedName
            | BalanceErrorCode::StratGroupingUnsupported => ErrorCategory::Configuration,
            BalanceErrorCode::StratSpecTooShort
            | BalanceErrorCode::StratSpecUnknown
            | BalanceErrorCode::StratUnknownLevel
            | BalanceErrorCode::StratDuplicateLevel
            | BalanceErrorCode::StratNonPositiveSize
            | BalanceErrorCode::StratSizeConflict
            | BalanceErrorCode::StratMalformedSpec => ErrorCategory::Specification,
            BalanceErrorCode::StratNotAnInteger => ErrorCategory::Type,
            BalanceErrorCode::StratStoreFailure | BalanceErrorCode::StratEmptyPlan => {
                ErrorCategory::Internal
            }
        }
    }
}

impl fmt::Display for BalanceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Balancing error with full context
#[derive(Debug, Clone)]
pub struct BalanceError {
    code: BalanceErrorCode,
    message: String,
    /// Offending parameter, if one can be named
    parameter: Option<&'static str>,
}

impl BalanceError {
    fn new(code: BalanceErrorCode, parameter: Option<&'static str>, message: String) -> Self {
        Self {
            code,
            message,
            parameter,
        }
    }

    /// A required identifier was empty
    pub fn missing_parameter(parameter: &'static str) -> Self {
        Self::new(
            BalanceErrorCode::StratMissingParameter,
            Some(parameter),
            format!("Parameter '{}' must be a non-empty identifier", parameter),
        )
    }

    pub fn output_exists(table: &str) -> Self {
        Self::new(
            BalanceErrorCode::StratOutputExists,
            Some("output_table"),
            format!("Output table '{}' already exists", table),
        )
    }

    pub fn source_missing(table: &str) -> Self {
        Self::new(
            BalanceErrorCode::StratSourceMissing,
            Some("source_table"),
            format!("Source table '{}' does not exist", table),
        )
    }

    pub fn source_empty(table: &str) -> Self {
        Self::new(
            BalanceErrorCode::StratSourceEmpty,
            Some("source_table"),
            format!("Source table '{}' has no rows to balance", table),
        )
    }

    pub fn column_missing(column: &str, table: &str) -> Self {
        Self::new(
            BalanceErrorCode::StratColumnMissing,
            Some("class_col"),
            format!("Column '{}' does not exist in '{}'", column, table),
        )
    }

    /// A reserved name is already used by the source data
    pub fn reserved_name(parameter: &'static str, name: &str) -> Self {
        Self::new(
            BalanceErrorCode::StratReservedName,
            Some(parameter),
            format!("Reserved name '{}' collides with the source data", name),
        )
    }

    pub fn grouping_unsupported() -> Self {
        Self::new(
            BalanceErrorCode::StratGroupingUnsupported,
            Some("grouping_cols"),
            "Grouping columns are not supported".into(),
        )
    }

    pub fn spec_too_short(spec: &str) -> Self {
        Self::new(
            BalanceErrorCode::StratSpecTooShort,
            Some("class_size"),
            format!(
                "Strategy '{}' is too short; use at least 3 characters of uniform, undersample or oversample",
                spec
            ),
        )
    }

    pub fn spec_unknown(spec: &str) -> Self {
        Self::new(
            BalanceErrorCode::StratSpecUnknown,
            Some("class_size"),
            format!(
                "Strategy '{}' does not match uniform, undersample or oversample",
                spec
            ),
        )
    }

    pub fn unknown_level(level: impl fmt::Display) -> Self {
        Self::new(
            BalanceErrorCode::StratUnknownLevel,
            Some("class_size"),
            format!("Level '{}' does not occur in the class column", level),
        )
    }

    pub fn duplicate_level(level: impl fmt::Display) -> Self {
        Self::new(
            BalanceErrorCode::StratDuplicateLevel,
            Some("class_size"),
            format!("Level '{}' is given more than once", level),
        )
    }

    pub fn non_positive_size(parameter: &'static str, value: i64) -> Self {
        Self::new(
            BalanceErrorCode::StratNonPositiveSize,
            Some(parameter),
            format!("Size must be a positive integer, got {}", value),
        )
    }

    pub fn size_conflict(strategy: &str) -> Self {
        Self::new(
            BalanceErrorCode::StratSizeConflict,
            Some("output_table_size"),
            format!(
                "Strategy '{}' determines the output size and cannot be combined with an output table size",
                strategy
            ),
        )
    }

    pub fn malformed_spec(reason: impl Into<String>) -> Self {
        Self::new(
            BalanceErrorCode::StratMalformedSpec,
            Some("class_size"),
            reason.into(),
        )
    }

    pub fn not_an_integer(value: &str) -> Self {
        Self::new(
            BalanceErrorCode::StratNotAnInteger,
            Some("class_size"),
            format!("Class size '{}' is not an integer", value),
        )
    }

    pub fn store_failure(err: &StoreError) -> Self {
        Self::new(
            BalanceErrorCode::StratStoreFailure,
            None,
            err.to_string(),
        )
    }

    pub fn empty_plan() -> Self {
        Self::new(
            BalanceErrorCode::StratEmptyPlan,
            None,
            "No level produced a sub-plan".into(),
        )
    }

    /// Returns the error code
    pub fn code(&self) -> BalanceErrorCode {
        self.code
    }

    /// Returns the category
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the offending parameter if applicable
    pub fn parameter(&self) -> Option<&str> {
        self.parameter
    }
}

impl fmt::Display for BalanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.category(),
            self.code.code(),
            self.message
        )?;
        if let Some(parameter) = self.parameter {
            write!(f, " (parameter '{}')", parameter)?;
        }
        Ok(())
    }
}

impl std::error::Error for BalanceError {}

impl From<StoreError> for BalanceError {
    fn from(err: StoreError) -> Self {
        BalanceError::store_failure(&err)
    }
}

/// Result type for balancing operations
pub type BalanceResult<T> = Result<T, BalanceError>;
