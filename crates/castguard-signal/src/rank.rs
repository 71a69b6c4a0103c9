// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::process::ProcessSignals;
use castguard_core::ScoreWeights;

/// One variable's combined relative importance within a process group.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RankedVariable {
    pub variable: String,
    pub combined_relative: f64,
    pub shap_relative: f64,
    pub rule_relative: f64,
}

/// Ranks a process group's variables by combined relative importance.
///
/// Each signal type is normalized to its own total (with an epsilon guard so
/// an all-zero signal contributes nothing rather than dividing by zero), the
/// two shares are combined 50/50, and the result is sorted descending with a
/// deterministic name tie-break. Callers apply `top_k` and the relative
/// floor.
pub fn rank_variables(signals: &ProcessSignals, weights: &ScoreWeights) -> Vec<RankedVariable> {
    let total_shap: f64 =
        signals.shap_normalized.values().sum::<f64>() + weights.relative_epsilon;
    let total_rule: f64 =
        signals.rule_normalized.values().sum::<f64>() + weights.relative_epsilon;

    let mut ranked: Vec<RankedVariable> = signals
        .variables
        .iter()
        .map(|variable| {
            let shap = signals.shap_normalized.get(variable).copied().unwrap_or(0.0);
            let rule = signals.rule_normalized.get(variable).copied().unwrap_or(0.0);
            let shap_relative = shap / total_shap;
            let rule_relative = rule / total_rule;
            RankedVariable {
                variable: variable.clone(),
                combined_relative: weights.shap_weight * shap_relative
                    + weights.rule_weight * rule_relative,
                shap_relative,
                rule_relative,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.combined_relative
            .total_cmp(&a.combined_relative)
            .then_with(|| a.variable.cmp(&b.variable))
    });
    ranked
}

/// Top contributors worth explaining: the first `top_k` entries above the
/// relative-importance floor.
pub fn top_contributors<'a>(
    ranked: &'a [RankedVariable],
    weights: &ScoreWeights,
) -> Vec<&'a RankedVariable> {
    ranked
        .iter()
        .take(weights.top_k)
        .filter(|entry| entry.combined_relative > weights.relative_floor)
        .collect()
}
