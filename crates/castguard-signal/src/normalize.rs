// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use castguard_core::{CutoffRule, DataRange};

/// Converts a raw SHAP attribution into a bounded [0, 1] push-toward-failure
/// signal, relative to the model's current predicted probability.
///
/// Only the positive part contributes: this signal answers "how much did the
/// variable push toward failure", not general influence. A degenerate
/// probability (<= 0, > 1, or non-finite) yields 0 so a dashboard render
/// degrades to "no alert" instead of crashing. When the probability is tiny
/// while the attribution is positive the result saturates at 1: any adverse
/// contribution is maximally suspicious when the model was otherwise
/// confident in a pass.
pub fn normalize_attribution(raw_value: f64, prediction_prob: f64) -> f64 {
    if !prediction_prob.is_finite() || prediction_prob <= 0.0 || prediction_prob > 1.0 {
        return 0.0;
    }

    let positive_contrib = raw_value.max(0.0);
    (positive_contrib / prediction_prob).clamp(0.0, 1.0)
}

/// Converts a raw value plus its cut-off rule into a bounded [0, 1] severity,
/// scaled by how much room the data range leaves beyond the bound.
///
/// Values inside `[low, high]` score exactly 0. Each violated bound adds a
/// term proportional to the overshoot; a non-positive denominator (cut-off at
/// or past the range edge) skips that term rather than dividing by zero.
pub fn rule_severity(value: f64, rule: &CutoffRule, range: &DataRange) -> f64 {
    let mut severity = 0.0;

    if let Some(low) = rule.low {
        if value < low {
            let denominator = low - range.min;
            if denominator > 0.0 {
                severity += (low - value) / denominator;
            }
        }
    }

    if let Some(high) = rule.high {
        if value > high {
            let denominator = range.max - high;
            if denominator > 0.0 {
                severity += (value - high) / denominator;
            }
        }
    }

    severity.clamp(0.0, 1.0)
}
