//! Explain output for a balancing plan
//!
//! Deterministic, human-readable listing of what a request would do: the
//! resolved specification, one line per observed level and the composed
//! statement. Also serializable for the CLI.

use std::fmt;

use serde::Serialize;

use super::balancer::BalancePlan;
use super::errors::BalanceError;
use super::level::Level;
use super::spec::BalancingSpec;
use super::targets::Method;

/// Plan for one observed level
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplainLevel {
    pub level: Level,
    pub actual: u64,
    /// `None` when the level was dropped
    pub target: Option<u64>,
    pub method: Option<Method>,
}

/// Explain plan output
#[derive(Debug, Clone, Serialize)]
pub struct ExplainPlan {
    /// Whether planning succeeded
    pub accepted: bool,
    pub source_table: Option<String>,
    pub output_table: Option<String>,
    /// `uniform`, `undersample`, `oversample` or `explicit`
    pub strategy: Option<String>,
    pub with_replacement: bool,
    pub levels: Vec<ExplainLevel>,
    /// Fragment kinds in union order
    pub fragments: Vec<String>,
    pub expected_rows: Option<u64>,
    pub sql: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a successful balance plan
    pub fn from_plan(plan: &BalancePlan) -> Self {
        let levels = plan
            .frequencies
            .iter()
            .map(|(level, actual)| {
                let planned = plan.targets.get(level);
                ExplainLevel {
                    level: level.clone(),
                    actual,
                    target: planned.map(|p| p.target),
                    method: planned.map(|p| p.method),
                }
            })
            .collect();

        let strategy = match &plan.spec {
            BalancingSpec::Strategy(token) => token.as_str(),
            BalancingSpec::Explicit(_) => "explicit",
        };

        Self {
            accepted: true,
            source_table: Some(plan.request.source_table.clone()),
            output_table: Some(plan.request.output_table.clone()),
            strategy: Some(strategy.to_string()),
            with_replacement: plan.request.with_replacement,
            levels,
            fragments: plan
                .fragments
                .iter()
                .map(|f| f.kind.as_str().to_string())
                .collect(),
            expected_rows: Some(plan.expected_rows()),
            sql: Some(plan.sql.clone()),
            rejection_code: None,
            rejection_reason: None,
        }
    }

    /// Creates an explain plan from a planning error
    pub fn from_error(err: &BalanceError) -> Self {
        Self {
            accepted: false,
            source_table: None,
            output_table: None,
            strategy: None,
            with_replacement: false,
            levels: Vec::new(),
            fragments: Vec::new(),
            expected_rows: None,
            sql: None,
            rejection_code: Some(err.code().code().to_string()),
            rejection_reason: Some(err.message().to_string()),
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;

        if !self.accepted {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
            return Ok(());
        }

        writeln!(f, "Status: ACCEPTED")?;
        if let (Some(source), Some(output)) = (&self.source_table, &self.output_table) {
            writeln!(f, "Source: {} -> {}", source, output)?;
        }
        if let Some(strategy) = &self.strategy {
            writeln!(f, "Strategy: {}", strategy)?;
        }
        writeln!(
            f,
            "Replacement: {}",
            if self.with_replacement { "always" } else { "oversample only" }
        )?;

        writeln!(f, "Levels:")?;
        for level in &self.levels {
            match (level.target, level.method) {
                (Some(target), Some(method)) => writeln!(
                    f,
                    "  - {}: {} -> {} ({})",
                    level.level, level.actual, target, method
                )?,
                _ => writeln!(f, "  - {}: {} -> dropped", level.level, level.actual)?,
            }
        }

        if !self.fragments.is_empty() {
            writeln!(f, "Fragments: {}", self.fragments.join(", "))?;
        }
        if let Some(rows) = self.expected_rows {
            writeln!(f, "Expected Rows: {}", rows)?;
        }
        if let Some(sql) = &self.sql {
            writeln!(f, "SQL:")?;
            writeln!(f, "{}", sql)?;
        }

        Ok(())
    }
}
