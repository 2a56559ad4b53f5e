//! Stratified resampling planner
//!
//! Decides, for every level of a class column, how many rows to keep and
//! how to draw them, then hands a composed statement to the store.
//!
//! # Flow
//!
//! 1. `profiler` counts rows per level
//! 2. `spec` resolves the balancing specification
//! 3. `targets` computes a `(target, method)` pair per level
//! 4. `partition` groups the plan by method
//! 5. `crate::sql` builds, composes and renders the fragments
//! 6. `balancer` runs the pre-flight checks and materializes the result
//!
//! Steps 2 to 4 are pure and never touch a store.

pub mod balancer;
mod errors;
pub mod explain;
pub mod level;
pub mod partition;
pub mod profiler;
pub mod request;
pub mod spec;
pub mod targets;

pub use balancer::{
    BalanceContext, BalanceOutcome, BalancePlan, Balancer, DEFAULT_ID_COLUMN,
    DEFAULT_NULL_SENTINEL,
};
pub use errors::{BalanceError, BalanceErrorCode, BalanceResult, ErrorCategory};
pub use explain::{ExplainLevel, ExplainPlan};
pub use level::{DesiredSizeMapping, FrequencyMapping, Level};
pub use partition::MethodPartitions;
pub use request::BalanceRequest;
pub use spec::{BalancingSpec, StrategyToken};
pub use targets::{choose_method, plan_targets, LevelPlan, Method, TargetPlan};
