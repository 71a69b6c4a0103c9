// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::tier::{AlertTier, ImpactTier, SignalBadge};
use castguard_core::{Attributions, GuardConfig, RawSample};
use castguard_signal::{rank_variables, top_contributors, AlertLevel, ProcessSignals};
use std::fmt;

/// Process-level alert header: the label plus the fused score.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ExplanationHeader {
    pub process: String,
    pub alert: AlertLevel,
    pub tier: AlertTier,
    pub shap_score: f64,
    pub rule_score: f64,
    pub fused_score: f64,
}

impl ExplanationHeader {
    /// One-line headline in the dashboard's header format.
    pub fn headline(&self) -> String {
        format!("{} (score={:.2})", self.alert.label(), self.fused_score)
    }
}

/// Where the current value sits relative to the data-range midpoint.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueDirection {
    TooHigh,
    TooLow,
    /// No current value or no data range to compare against.
    Unknown,
}

/// Status of one cut-off bound for one variable.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CutoffStatus {
    BelowLow {
        bound: f64,
        distance: f64,
        percent: f64,
    },
    AboveHigh {
        bound: f64,
        distance: f64,
        percent: f64,
    },
    LowSatisfied {
        bound: f64,
    },
    HighSatisfied {
        bound: f64,
    },
    NotConfigured,
}

impl fmt::Display for CutoffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowLow {
                bound,
                distance,
                percent,
            } => write!(
                f,
                "below the low cut-off ({bound:.1}) by {distance:.1} ({percent:.1}% beyond)"
            ),
            Self::AboveHigh {
                bound,
                distance,
                percent,
            } => write!(
                f,
                "above the high cut-off ({bound:.1}) by {distance:.1} ({percent:.1}% beyond)"
            ),
            Self::LowSatisfied { bound } => {
                write!(f, "at or above the low cut-off ({bound:.1})")
            }
            Self::HighSatisfied { bound } => {
                write!(f, "at or below the high cut-off ({bound:.1})")
            }
            Self::NotConfigured => write!(f, "no cut-off configured"),
        }
    }
}

/// Explanation block for one top-ranked variable.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDetail {
    /// Encoded column name the signals are keyed by.
    pub variable: String,
    pub display_name: String,
    pub current_value: Option<f64>,
    pub shap_normalized: f64,
    pub shap_raw: f64,
    pub shap_relative: f64,
    pub rule_normalized: f64,
    pub rule_relative: f64,
    pub combined_relative: f64,
    pub badge: SignalBadge,
    pub impact: ImpactTier,
    pub direction: ValueDirection,
    pub impact_narrative: String,
    pub cutoff_statuses: Vec<CutoffStatus>,
}

/// Detail section of an explanation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum ExplanationBody {
    Details(Vec<VariableDetail>),
    /// Nothing cleared the relative-importance floor.
    AllWithinNormalRange,
}

/// Rendered explanation for one process group.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum ProcessExplanation {
    Report {
        header: ExplanationHeader,
        body: ExplanationBody,
    },
    /// Sentinel rendering when the classifier or explainer could not run
    /// for this sample; the dashboard stays usable either way.
    Unavailable { process: String, reason: String },
}

impl ProcessExplanation {
    pub fn unavailable(process: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            process: process.into(),
            reason: reason.into(),
        }
    }
}

/// Scores one process group and renders its full explanation.
///
/// A degenerate predicted probability (non-finite, zero or negative, above
/// one) falls back to the configured pessimistic default rather than
/// producing a zeroed-out report.
pub fn evaluate_process_alert(
    process: &str,
    raw_sample: &RawSample,
    attributions: &Attributions,
    predicted_prob: f64,
    config: &GuardConfig,
) -> ProcessExplanation {
    let prob = if predicted_prob.is_finite() && predicted_prob > 0.0 && predicted_prob <= 1.0 {
        predicted_prob
    } else {
        config.tuning.fallback_prob
    };

    let signals = ProcessSignals::collect(process, raw_sample, attributions, prob, config);
    let scores = signals.scores(&config.weights);
    let ranked = rank_variables(&signals, &config.weights);
    let top = top_contributors(&ranked, &config.weights);

    let details: Vec<VariableDetail> = top
        .iter()
        .map(|entry| {
            build_detail(
                &entry.variable,
                entry.shap_relative,
                entry.rule_relative,
                entry.combined_relative,
                &signals,
                config,
            )
        })
        .collect();

    let body = if details.is_empty() {
        ExplanationBody::AllWithinNormalRange
    } else {
        ExplanationBody::Details(details)
    };

    ProcessExplanation::Report {
        header: ExplanationHeader {
            process: process.to_string(),
            alert: scores.alert,
            tier: AlertTier::from_alert(scores.alert),
            shap_score: scores.shap_score,
            rule_score: scores.rule_score,
            fused_score: scores.fused,
        },
        body,
    }
}

fn build_detail(
    variable: &str,
    shap_relative: f64,
    rule_relative: f64,
    combined_relative: f64,
    signals: &ProcessSignals,
    config: &GuardConfig,
) -> VariableDetail {
    let shap_normalized = signals.shap_normalized.get(variable).copied().unwrap_or(0.0);
    let shap_raw = signals.shap_raw.get(variable).copied().unwrap_or(0.0);
    let rule_normalized = signals.rule_normalized.get(variable).copied().unwrap_or(0.0);
    let current_value = signals
        .current_values
        .get(variable)
        .copied()
        .unwrap_or(None);

    let raw_variable = config.raw_variable(variable);
    let display_name = raw_variable
        .map(|raw| config.display_name(raw).to_string())
        .unwrap_or_else(|| variable.to_string());

    let direction = direction_vs_midpoint(current_value, raw_variable, config);
    let impact = ImpactTier::from_normalized(shap_normalized);
    let badge = SignalBadge::classify(shap_normalized, rule_normalized, &config.weights);
    let impact_narrative = impact_narrative(impact, direction, shap_raw);
    let cutoff_statuses = cutoff_statuses(current_value, raw_variable, config);

    VariableDetail {
        variable: variable.to_string(),
        display_name,
        current_value,
        shap_normalized,
        shap_raw,
        shap_relative,
        rule_normalized,
        rule_relative,
        combined_relative,
        badge,
        impact,
        direction,
        impact_narrative,
        cutoff_statuses,
    }
}

fn direction_vs_midpoint(
    current_value: Option<f64>,
    raw_variable: Option<&str>,
    config: &GuardConfig,
) -> ValueDirection {
    let Some(value) = current_value else {
        return ValueDirection::Unknown;
    };
    let Some(range) = raw_variable.and_then(|raw| config.data_ranges.get(raw)) else {
        return ValueDirection::Unknown;
    };
    if value > range.midpoint() {
        ValueDirection::TooHigh
    } else {
        ValueDirection::TooLow
    }
}

fn impact_narrative(impact: ImpactTier, direction: ValueDirection, shap_raw: f64) -> String {
    let subject = match direction {
        ValueDirection::TooHigh => "this value running high",
        ValueDirection::TooLow => "this value running low",
        ValueDirection::Unknown => "this variable's change",
    };
    // Estimated percentage-point contribution to the failure probability.
    let points = (shap_raw * 100.0).abs();

    match impact {
        ImpactTier::VeryHigh | ImpactTier::High | ImpactTier::Moderate => format!(
            "{} - {subject} raised the failure probability by about {points:.1}%p",
            impact.label()
        ),
        ImpactTier::Low => {
            format!("low - {subject} had a slight but minor influence ({points:.2}%p)")
        }
        ImpactTier::Negligible => {
            "this variable has almost no influence on the failure probability".to_string()
        }
    }
}

fn cutoff_statuses(
    current_value: Option<f64>,
    raw_variable: Option<&str>,
    config: &GuardConfig,
) -> Vec<CutoffStatus> {
    let rule = raw_variable.and_then(|raw| config.cutoffs.get(raw));
    let (Some(value), Some(rule)) = (current_value, rule) else {
        return vec![CutoffStatus::NotConfigured];
    };

    let mut statuses = Vec::new();
    if let Some(low) = rule.low {
        if value < low {
            let distance = low - value;
            statuses.push(CutoffStatus::BelowLow {
                bound: low,
                distance,
                percent: bound_percent(distance, low),
            });
        } else {
            statuses.push(CutoffStatus::LowSatisfied { bound: low });
        }
    }
    if let Some(high) = rule.high {
        if value > high {
            let distance = value - high;
            statuses.push(CutoffStatus::AboveHigh {
                bound: high,
                distance,
                percent: bound_percent(distance, high),
            });
        } else {
            statuses.push(CutoffStatus::HighSatisfied { bound: high });
        }
    }
    statuses
}

fn bound_percent(distance: f64, bound: f64) -> f64 {
    if bound.abs() > 0.0 {
        (distance / bound.abs()) * 100.0
    } else {
        0.0
    }
}
