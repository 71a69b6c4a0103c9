// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Core shared types for the castguard explainability-and-remediation engine:
//! samples and encoded feature rows, the configuration tables, the external
//! oracle traits, and request-scoped execution control.

pub mod config;
pub mod error;
pub mod execution_context;
pub mod oracle;
pub mod presets;
pub mod sample;

pub use config::{
    feature_map_from_prefixes, AdjustTuning, CutoffRule, DataRange, GuardConfig, ScoreWeights,
};
pub use error::CastguardError;
pub use execution_context::{
    BudgetMode, BudgetStatus, CancelToken, Constraints, ExecutionContext, ProgressSink,
    TelemetrySink,
};
pub use oracle::{checked_prob, Classifier, Explainer, FeatureEncoder};
pub use presets::die_casting_defaults;
pub use sample::{Attributions, FeatureRow, RawSample, SampleValue};
