// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Signal layer of the castguard engine: bounded normalization of model
//! attributions and rule violations, per-process score aggregation, and
//! variable contribution ranking.

pub mod normalize;
pub mod process;
pub mod rank;

pub use normalize::{normalize_attribution, rule_severity};
pub use process::{blend_score, AlertLevel, ProcessScores, ProcessSignals};
pub use rank::{rank_variables, top_contributors, RankedVariable};
