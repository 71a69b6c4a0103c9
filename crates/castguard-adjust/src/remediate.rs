// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::greedy::{greedy_adjust, CallCounter, FenceStop, ShapAdjustment};
use crate::priority::adjustment_priority;
use crate::rule_fix::{fix_rule_violations, RuleAdjustment};
use castguard_core::{
    Attributions, CastguardError, Classifier, ExecutionContext, FeatureEncoder, GuardConfig,
    RawSample,
};
use std::time::Instant;

/// Full remediation report for one defective sample.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AdjustmentResult {
    /// Failure probability of the sample as received.
    pub initial_prob: f64,
    /// Probability at or below which remediation counts as successful.
    pub target_prob: f64,
    /// Probability after all committed corrections and adjustments.
    pub final_prob: f64,
    /// Hard cut-off corrections applied before any model-guided search.
    pub rule_adjustments: Vec<RuleAdjustment>,
    /// Committed model-guided adjustments, in priority order.
    pub shap_adjustments: Vec<ShapAdjustment>,
    /// Variables the good-sample-mean fence blocked or truncated.
    pub fence_stops: Vec<FenceStop>,
    /// Whether `final_prob` reached the target.
    pub success: bool,
    /// The sample with every committed change applied.
    pub final_sample: RawSample,
    /// One-line operator-facing account of how the run ended.
    pub explanation: String,
    /// True when a soft classifier-call or time budget ended the search
    /// before the priority list was exhausted.
    pub budget_exhausted: bool,
}

/// Runs the two-stage remediation pipeline: deterministic cut-off
/// corrections first, then the fenced greedy search over whatever failure
/// probability remains.
pub fn remediate(
    sample: &RawSample,
    attributions: &Attributions,
    classifier: &dyn Classifier,
    encoder: &dyn FeatureEncoder,
    config: &GuardConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<AdjustmentResult, CastguardError> {
    config.validate()?;
    let started_at = Instant::now();
    let mut counter = CallCounter::new();
    let target_prob = config.tuning.target_prob;

    let initial_prob = counter.predict_required(classifier, encoder, sample, ctx)?;

    let (corrected, rule_adjustments) = fix_rule_violations(sample, config);
    let prob_after_rule = if rule_adjustments.is_empty() {
        initial_prob
    } else {
        counter.predict_required(classifier, encoder, &corrected, ctx)?
    };

    if prob_after_rule <= target_prob {
        ctx.record_scalar("classifier_calls", counter.calls as f64);
        ctx.report_progress(1.0);
        return Ok(AdjustmentResult {
            initial_prob,
            target_prob,
            final_prob: prob_after_rule,
            rule_adjustments,
            shap_adjustments: Vec::new(),
            fence_stops: Vec::new(),
            success: true,
            final_sample: corrected,
            explanation: format!(
                "rule correction alone reached the target ({initial_prob:.3} → {prob_after_rule:.3})"
            ),
            budget_exhausted: false,
        });
    }

    let priority_list = adjustment_priority(attributions, config);
    let outcome = greedy_adjust(
        &corrected,
        classifier,
        encoder,
        target_prob,
        &priority_list,
        config,
        ctx,
        started_at,
        &mut counter,
        prob_after_rule,
    )?;

    let success = outcome.final_prob <= target_prob;
    let explanation = if success {
        format!(
            "stepwise adjustment reached the target ({initial_prob:.3} → {:.3})",
            outcome.final_prob
        )
    } else {
        format!(
            "additional manual intervention needed ({initial_prob:.3} → {:.3}, target: {target_prob:.3})",
            outcome.final_prob
        )
    };

    ctx.record_scalar("classifier_calls", counter.calls as f64);
    ctx.report_progress(1.0);

    Ok(AdjustmentResult {
        initial_prob,
        target_prob,
        final_prob: outcome.final_prob,
        rule_adjustments,
        shap_adjustments: outcome.adjustments,
        fence_stops: outcome.fence_stops,
        success,
        final_sample: outcome.sample,
        explanation,
        budget_exhausted: outcome.budget_exhausted,
    })
}
