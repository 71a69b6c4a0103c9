// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use castguard_core::ScoreWeights;
use castguard_signal::AlertLevel;

/// Discrete severity tier for the process header. The tier is the contract;
/// whatever colors a dashboard maps these to is its own business.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertTier {
    Critical,
    Warning,
    Caution,
    Normal,
}

impl AlertTier {
    pub fn from_alert(alert: AlertLevel) -> Self {
        match alert {
            AlertLevel::StrongCauseCandidate => Self::Critical,
            AlertLevel::ModelSignalWarning => Self::Warning,
            AlertLevel::RuleThresholdExceeded => Self::Caution,
            AlertLevel::Normal => Self::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Caution => "caution",
            Self::Normal => "normal",
        }
    }
}

/// Qualitative strength of one variable's normalized model attribution.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImpactTier {
    VeryHigh,
    High,
    Moderate,
    Low,
    Negligible,
}

impl ImpactTier {
    pub fn from_normalized(shap_normalized: f64) -> Self {
        if shap_normalized > 0.3 {
            Self::VeryHigh
        } else if shap_normalized > 0.15 {
            Self::High
        } else if shap_normalized > 0.05 {
            Self::Moderate
        } else if shap_normalized > 0.01 {
            Self::Low
        } else {
            Self::Negligible
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::VeryHigh => "very high",
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Low => "low",
            Self::Negligible => "negligible",
        }
    }
}

/// Which signal source flagged a variable.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalBadge {
    /// Model attribution and rule severity both elevated.
    Both,
    Model,
    Rule,
    Weak,
}

impl SignalBadge {
    pub fn classify(shap_normalized: f64, rule_normalized: f64, weights: &ScoreWeights) -> Self {
        let threshold = weights.signal_badge_threshold;
        match (shap_normalized > threshold, rule_normalized > threshold) {
            (true, true) => Self::Both,
            (true, false) => Self::Model,
            (false, true) => Self::Rule,
            (false, false) => Self::Weak,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Both => "both signals detected",
            Self::Model => "model signal",
            Self::Rule => "rule signal",
            Self::Weak => "weak signal",
        }
    }
}
