// SPDX-License-Identifier: MIT OR Apache-2.0

//! Counterfactual remediation for high-risk die-casting samples.
//!
//! Two stages run in order: deterministic cut-off corrections, then a
//! fenced greedy search that walks a SHAP-derived priority list one
//! variable at a time, committing only steps the classifier scores as a
//! real improvement. Good-sample means act as a one-sided fence so no
//! variable is pushed past what passing parts have empirically shown.

#![forbid(unsafe_code)]

pub mod greedy;
pub mod priority;
pub mod remediate;
pub mod rule_fix;

pub use greedy::{FenceStop, ShapAdjustment};
pub use priority::{adjustment_priority, AdjustDirection, PriorityEntry};
pub use remediate::{remediate, AdjustmentResult};
pub use rule_fix::{fix_rule_violations, RuleAdjustment};
