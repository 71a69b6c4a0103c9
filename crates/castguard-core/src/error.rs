// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Error taxonomy shared by every castguard crate.
///
/// The engine recovers locally wherever the dashboard must stay usable
/// (missing configuration entries, degenerate probabilities); these variants
/// cover the cases that genuinely cannot proceed.
#[derive(Debug, thiserror::Error)]
pub enum CastguardError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cancelled")]
    Cancelled,

    #[error("resource limit exceeded: {0}")]
    ResourceLimit(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
}

impl CastguardError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }

    pub fn resource_limit(message: impl Into<String>) -> Self {
        Self::ResourceLimit(message.into())
    }

    pub fn model_unavailable(message: impl Into<String>) -> Self {
        Self::ModelUnavailable(message.into())
    }
}
