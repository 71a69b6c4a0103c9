// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering layer of the castguard engine: turns process scores, ranked
//! contributors, and remediation results into structured, human-readable
//! explanations with correct units and signs.

#![forbid(unsafe_code)]

pub mod render;
pub mod summary;
pub mod tier;

pub use render::{
    evaluate_process_alert, CutoffStatus, ExplanationBody, ExplanationHeader, ProcessExplanation,
    ValueDirection, VariableDetail,
};
pub use summary::render_adjustment_summary;
pub use tier::{AlertTier, ImpactTier, SignalBadge};
