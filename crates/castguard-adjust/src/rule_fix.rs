// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::priority::AdjustDirection;
use castguard_core::{GuardConfig, RawSample};
use std::fmt;

/// One immediate correction of an out-of-bound variable.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RuleAdjustment {
    pub variable: String,
    pub from: f64,
    pub to: f64,
    pub direction: AdjustDirection,
}

impl fmt::Display for RuleAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.direction {
            AdjustDirection::Increase => "upward adjustment",
            AdjustDirection::Decrease => "downward adjustment",
        };
        write!(
            f,
            "{}: {:.1} → {:.1} ({kind})",
            self.variable, self.from, self.to
        )
    }
}

/// Clamps every ruled, out-of-bound variable to its nearest valid boundary.
///
/// Expert rule violations are unconditionally disqualifying, so this always
/// runs before any model-guided step. Single pass: corrections are
/// independent per variable and a corrected value never re-violates its own
/// rule, making the operation idempotent. Variables without a rule, without
/// a data range, or with a categorical value are untouched.
pub fn fix_rule_violations(
    sample: &RawSample,
    config: &GuardConfig,
) -> (RawSample, Vec<RuleAdjustment>) {
    let mut adjusted = sample.clone();
    let mut adjustments = Vec::new();

    for (variable, value) in sample.iter() {
        let Some(current) = value.as_numeric() else {
            continue;
        };
        let Some(rule) = config.cutoffs.get(variable) else {
            continue;
        };
        let Some(range) = config.data_ranges.get(variable) else {
            continue;
        };

        if let Some(low) = rule.low {
            if current < low {
                let target = low.max(range.min);
                adjusted.set_numeric(variable.clone(), target);
                adjustments.push(RuleAdjustment {
                    variable: variable.clone(),
                    from: current,
                    to: target,
                    direction: AdjustDirection::Increase,
                });
            }
        }

        if let Some(high) = rule.high {
            if current > high {
                let target = high.min(range.max);
                adjusted.set_numeric(variable.clone(), target);
                adjustments.push(RuleAdjustment {
                    variable: variable.clone(),
                    from: current,
                    to: target,
                    direction: AdjustDirection::Decrease,
                });
            }
        }
    }

    (adjusted, adjustments)
}

#[cfg(test)]
mod tests {
    use super::fix_rule_violations;
    use castguard_core::{die_casting_defaults, RawSample};

    #[test]
    fn low_violation_is_clamped_up_to_the_bound() {
        let config = die_casting_defaults();
        let sample = RawSample::new().with_numeric("coolant_temp", 15.0);

        let (corrected, log) = fix_rule_violations(&sample, &config);
        assert_eq!(corrected.numeric("coolant_temp"), Some(20.0));
        assert_eq!(log.len(), 1);
        assert_eq!(
            log[0].to_string(),
            "coolant_temp: 15.0 → 20.0 (upward adjustment)"
        );
    }

    #[test]
    fn high_violation_is_clamped_down_to_the_bound() {
        let config = die_casting_defaults();
        let sample = RawSample::new().with_numeric("biscuit_thickness", 80.0);

        let (corrected, log) = fix_rule_violations(&sample, &config);
        assert_eq!(corrected.numeric("biscuit_thickness"), Some(56.0));
        assert_eq!(
            log[0].to_string(),
            "biscuit_thickness: 80.0 → 56.0 (downward adjustment)"
        );
    }

    #[test]
    fn in_range_values_pass_through_untouched() {
        let config = die_casting_defaults();
        let sample = RawSample::new()
            .with_numeric("cast_pressure", 350.0)
            .with_numeric("coolant_temp", 25.0)
            .with_categorical("working", "active");

        let (corrected, log) = fix_rule_violations(&sample, &config);
        assert_eq!(corrected, sample);
        assert!(log.is_empty());
    }

    #[test]
    fn unruled_variables_are_ignored() {
        let config = die_casting_defaults();
        // molten_temp has a data range but no cut-off rule
        let sample = RawSample::new().with_numeric("molten_temp", 5.0);
        let (corrected, log) = fix_rule_violations(&sample, &config);
        assert_eq!(corrected, sample);
        assert!(log.is_empty());
    }

    #[test]
    fn correction_is_idempotent() {
        let config = die_casting_defaults();
        let sample = RawSample::new()
            .with_numeric("coolant_temp", 15.0)
            .with_numeric("biscuit_thickness", 80.0)
            .with_numeric("cast_pressure", 100.0);

        let (once, first_log) = fix_rule_violations(&sample, &config);
        let (twice, second_log) = fix_rule_violations(&once, &config);
        assert_eq!(once, twice);
        assert_eq!(first_log.len(), 3);
        assert!(second_log.is_empty());
    }
}
