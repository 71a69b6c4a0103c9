// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use castguard_adjust::{AdjustDirection, AdjustmentResult};
use castguard_core::GuardConfig;
use std::fmt::Write;

const RULE: &str = "======================================================================";

/// Multi-line operator-facing summary of one remediation run, with pretty
/// variable names substituted from the configuration.
pub fn render_adjustment_summary(result: &AdjustmentResult, config: &GuardConfig) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Failure-probability adjustment guide");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Target: failure probability at or below {:.1}%",
        result.target_prob * 100.0
    );
    let _ = writeln!(
        out,
        "Current: {:.1}% -> after adjustment: {:.1}%",
        result.initial_prob * 100.0,
        result.final_prob * 100.0
    );
    if result.success {
        let _ = writeln!(out, "Result: target reached");
    } else {
        let _ = writeln!(out, "Result: additional adjustment needed");
    }
    if result.budget_exhausted {
        let _ = writeln!(out, "Note: search ended early on an exhausted budget");
    }

    if !result.rule_adjustments.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "Step 1: required corrections (cut-off violations)");
        let _ = writeln!(out, "{RULE}");
        for adjustment in &result.rule_adjustments {
            let pretty = config.display_name(&adjustment.variable);
            let word = match adjustment.direction {
                AdjustDirection::Increase => "upward",
                AdjustDirection::Decrease => "downward",
            };
            let _ = writeln!(
                out,
                "  - {pretty}: {:.1} → {:.1} ({word} adjustment)",
                adjustment.from, adjustment.to
            );
        }
    }

    if !result.shap_adjustments.is_empty() || !result.fence_stops.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(
            out,
            "Step 2: model-guided optimization (fenced greedy search)"
        );
        let _ = writeln!(out, "{RULE}");
        for adjustment in &result.shap_adjustments {
            let pretty = config.display_name(&adjustment.variable);
            let _ = writeln!(
                out,
                "  - {pretty}: {:.1} → {:.1} {} (-{:.3})",
                adjustment.from,
                adjustment.to,
                adjustment.direction.arrow(),
                adjustment.improvement
            );
        }
        for stop in &result.fence_stops {
            let _ = writeln!(out, "  ! {stop}");
        }
    }

    if result.rule_adjustments.is_empty() && result.shap_adjustments.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "No adjustment needed: all variables within normal range"
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE}");
    out
}

#[cfg(test)]
mod tests {
    use super::render_adjustment_summary;
    use castguard_adjust::{
        AdjustDirection, AdjustmentResult, FenceStop, RuleAdjustment, ShapAdjustment,
    };
    use castguard_core::{die_casting_defaults, RawSample};

    fn base_result() -> AdjustmentResult {
        AdjustmentResult {
            initial_prob: 0.6,
            target_prob: 0.3,
            final_prob: 0.259,
            rule_adjustments: Vec::new(),
            shap_adjustments: Vec::new(),
            fence_stops: Vec::new(),
            success: true,
            final_sample: RawSample::new(),
            explanation: String::new(),
            budget_exhausted: false,
        }
    }

    #[test]
    fn summary_lists_both_stages_with_pretty_names() {
        let config = die_casting_defaults();
        let mut result = base_result();
        result.rule_adjustments.push(RuleAdjustment {
            variable: "coolant_temp".to_string(),
            from: 15.0,
            to: 20.0,
            direction: AdjustDirection::Increase,
        });
        result.shap_adjustments.push(ShapAdjustment {
            variable: "cast_pressure".to_string(),
            from: 350.0,
            to: 333.8,
            direction: AdjustDirection::Decrease,
            improvement: 0.341,
            fence_mean: Some(328.5),
        });
        result.fence_stops.push(FenceStop::StoppedAtMean {
            variable: "cast_pressure".to_string(),
            mean: 328.5,
            stopped_at: 333.8,
        });

        let summary = render_adjustment_summary(&result, &config);
        assert!(summary.contains("Target: failure probability at or below 30.0%"));
        assert!(summary.contains("Current: 60.0% -> after adjustment: 25.9%"));
        assert!(summary.contains("Result: target reached"));
        assert!(summary.contains("Step 1: required corrections (cut-off violations)"));
        assert!(summary.contains("  - Coolant temperature: 15.0 → 20.0 (upward adjustment)"));
        assert!(summary.contains("Step 2: model-guided optimization (fenced greedy search)"));
        assert!(summary.contains("  - Casting pressure: 350.0 → 333.8 ↓ (-0.341)"));
        assert!(summary
            .contains("  ! cast_pressure: reached good mean (328.5); stepping stopped at 333.8"));
        assert!(!summary.contains("No adjustment needed"));
    }

    #[test]
    fn untouched_sample_renders_the_no_adjustment_line() {
        let config = die_casting_defaults();
        let summary = render_adjustment_summary(&base_result(), &config);
        assert!(summary.contains("No adjustment needed: all variables within normal range"));
        assert!(!summary.contains("Step 1"));
        assert!(!summary.contains("Step 2"));
    }

    #[test]
    fn failed_run_reports_the_need_for_manual_work() {
        let config = die_casting_defaults();
        let mut result = base_result();
        result.success = false;
        result.budget_exhausted = true;
        let summary = render_adjustment_summary(&result, &config);
        assert!(summary.contains("Result: additional adjustment needed"));
        assert!(summary.contains("Note: search ended early on an exhausted budget"));
    }
}
