// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::priority::{AdjustDirection, PriorityEntry};
use castguard_core::{
    checked_prob, BudgetStatus, CastguardError, Classifier, ExecutionContext, FeatureEncoder,
    GuardConfig, RawSample,
};
use std::fmt;
use std::time::Instant;

/// One committed model-guided adjustment.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ShapAdjustment {
    pub variable: String,
    pub from: f64,
    pub to: f64,
    pub direction: AdjustDirection,
    /// Absolute probability improvement attributed to this adjustment.
    pub improvement: f64,
    /// Good-sample mean that fenced this adjustment, when configured.
    pub fence_mean: Option<f64>,
}

impl fmt::Display for ShapAdjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.1} → {:.1} {} (-{:.3})",
            self.variable,
            self.from,
            self.to,
            self.direction.arrow(),
            self.improvement
        )?;
        if let Some(mean) = self.fence_mean {
            match self.direction {
                AdjustDirection::Increase => {
                    write!(f, " (held at or below mean {mean:.1})")?;
                }
                AdjustDirection::Decrease => {
                    write!(f, " (held at or above mean {mean:.1})")?;
                }
            }
        }
        Ok(())
    }
}

/// Why the good-sample-mean fence constrained a variable.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum FenceStop {
    /// The variable already sits at or past the mean in the needed
    /// direction; no adjustment is permitted at all.
    Blocked {
        variable: String,
        direction: AdjustDirection,
        current: f64,
        mean: f64,
    },
    /// Stepping ran into the mean; the search kept the best value reached
    /// before the fence.
    StoppedAtMean {
        variable: String,
        mean: f64,
        stopped_at: f64,
    },
}

impl fmt::Display for FenceStop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocked {
                variable,
                direction,
                current,
                mean,
            } => match direction {
                AdjustDirection::Increase => write!(
                    f,
                    "{variable}: upward adjustment blocked (current {current:.1} ≥ good mean {mean:.1})"
                ),
                AdjustDirection::Decrease => write!(
                    f,
                    "{variable}: downward adjustment blocked (current {current:.1} ≤ good mean {mean:.1})"
                ),
            },
            Self::StoppedAtMean {
                variable,
                mean,
                stopped_at,
            } => write!(
                f,
                "{variable}: reached good mean ({mean:.1}); stepping stopped at {stopped_at:.1}"
            ),
        }
    }
}

/// Outcome of the greedy pass over the priority list.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GreedyOutcome {
    pub sample: RawSample,
    pub adjustments: Vec<ShapAdjustment>,
    pub fence_stops: Vec<FenceStop>,
    pub final_prob: f64,
    pub budget_exhausted: bool,
}

pub(crate) struct CallCounter {
    pub calls: usize,
}

impl CallCounter {
    pub fn new() -> Self {
        Self { calls: 0 }
    }

    /// Scores one sample, failing hard when the budget does not allow it.
    /// Used for the mandatory initial and post-correction predictions.
    pub fn predict_required(
        &mut self,
        classifier: &dyn Classifier,
        encoder: &dyn FeatureEncoder,
        sample: &RawSample,
        ctx: &ExecutionContext<'_>,
    ) -> Result<f64, CastguardError> {
        ctx.check_cancelled()?;
        self.calls += 1;
        if let Some(limit) = ctx.constraints.max_classifier_calls {
            if self.calls > limit {
                return Err(CastguardError::resource_limit(format!(
                    "constraints.max_classifier_calls exceeded before a mandatory prediction: used={}, limit={limit}",
                    self.calls
                )));
            }
        }
        let row = encoder.encode(sample)?;
        checked_prob(classifier.predict_fail_prob(&row)?)
    }

    /// Scores one trial perturbation. Returns `None` when a soft budget ran
    /// out, signalling the search to end with the best result so far.
    pub fn predict_trial(
        &mut self,
        classifier: &dyn Classifier,
        encoder: &dyn FeatureEncoder,
        sample: &RawSample,
        ctx: &ExecutionContext<'_>,
        started_at: Instant,
    ) -> Result<Option<f64>, CastguardError> {
        ctx.check_cancelled()?;
        if ctx.check_time_budget(started_at)? == BudgetStatus::ExceededSoftDegrade {
            return Ok(None);
        }
        self.calls += 1;
        if ctx.check_call_budget(self.calls)? == BudgetStatus::ExceededSoftDegrade {
            return Ok(None);
        }
        let row = encoder.encode(sample)?;
        checked_prob(classifier.predict_fail_prob(&row)?).map(Some)
    }
}

/// Directional, fenced, single-variable-at-a-time greedy hill-climb.
///
/// For each variable in priority order: step toward the SHAP-implied
/// direction, re-score the classifier after every trial step, track the best
/// probability seen, and stop on the fence/range limit, on a regressive
/// step, or at the per-variable iteration cap. Only improvements above the
/// configured minimum are committed. The good-sample mean is a hard stop
/// before the physical range: a value is never pushed past what passing
/// parts have empirically shown.
#[allow(clippy::too_many_arguments)]
pub(crate) fn greedy_adjust(
    sample: &RawSample,
    classifier: &dyn Classifier,
    encoder: &dyn FeatureEncoder,
    target_prob: f64,
    priority_list: &[PriorityEntry],
    config: &GuardConfig,
    ctx: &ExecutionContext<'_>,
    started_at: Instant,
    counter: &mut CallCounter,
    prob_after_rule: f64,
) -> Result<GreedyOutcome, CastguardError> {
    let mut adjusted = sample.clone();
    let mut adjustments = Vec::new();
    let mut fence_stops = Vec::new();
    let mut current_prob = prob_after_rule;
    let mut budget_exhausted = false;

    for (index, entry) in priority_list.iter().enumerate() {
        if current_prob <= target_prob || budget_exhausted {
            break;
        }
        ctx.report_progress(index as f32 / priority_list.len().max(1) as f32);

        let Some(step_size) = config.adjustment_steps.get(&entry.variable).copied() else {
            continue;
        };
        let Some(range) = config.data_ranges.get(&entry.variable).copied() else {
            continue;
        };
        let Some(current_val) = adjusted.numeric(&entry.variable) else {
            continue;
        };
        let good_mean = config.good_means.get(&entry.variable).copied();

        // Nothing to do when already pinned to the physical range.
        match entry.direction {
            AdjustDirection::Increase if current_val >= range.max => continue,
            AdjustDirection::Decrease if current_val <= range.min => continue,
            _ => {}
        }

        // One-sided fence: at or past the empirical norm in the needed
        // direction means the variable is off limits entirely.
        if let Some(mean) = good_mean {
            let blocked = match entry.direction {
                AdjustDirection::Increase => current_val >= mean,
                AdjustDirection::Decrease => current_val <= mean,
            };
            if blocked {
                fence_stops.push(FenceStop::Blocked {
                    variable: entry.variable.clone(),
                    direction: entry.direction,
                    current: current_val,
                    mean,
                });
                continue;
            }
        }

        let mut best_improvement = 0.0;
        let mut best_new_val = current_val;
        let mut test_val = current_val;

        for step in 0..config.tuning.max_iterations_per_var {
            let (new_val, limit) = match entry.direction {
                AdjustDirection::Increase => {
                    let mut upper_limit = range.max;
                    if let Some(mean) = good_mean {
                        upper_limit = upper_limit.min(mean);
                    }
                    ((test_val + step_size).min(upper_limit), upper_limit)
                }
                AdjustDirection::Decrease => {
                    let mut lower_limit = range.min;
                    if let Some(mean) = good_mean {
                        lower_limit = lower_limit.max(mean);
                    }
                    ((test_val - step_size).max(lower_limit), lower_limit)
                }
            };

            // The fence value itself is never proposed: stop as soon as the
            // next trial would land on or past the mean.
            if let Some(mean) = good_mean {
                let fence_hit = match entry.direction {
                    AdjustDirection::Increase => new_val >= mean,
                    AdjustDirection::Decrease => new_val <= mean,
                };
                if fence_hit {
                    if step > 0 {
                        fence_stops.push(FenceStop::StoppedAtMean {
                            variable: entry.variable.clone(),
                            mean,
                            stopped_at: best_new_val,
                        });
                    }
                    break;
                }
            }

            let mut trial = adjusted.clone();
            trial.set_numeric(entry.variable.as_str(), new_val);
            let Some(new_prob) =
                counter.predict_trial(classifier, encoder, &trial, ctx, started_at)?
            else {
                budget_exhausted = true;
                break;
            };

            let improvement = current_prob - new_prob;
            if improvement > best_improvement {
                best_improvement = improvement;
                best_new_val = new_val;
            } else if improvement < 0.0 {
                // Greedy never accepts a regressive step.
                break;
            }

            test_val = new_val;

            let limit_reached = match entry.direction {
                AdjustDirection::Increase => new_val >= limit,
                AdjustDirection::Decrease => new_val <= limit,
            };
            if limit_reached {
                break;
            }
        }

        if best_improvement > config.tuning.min_improvement {
            adjusted.set_numeric(entry.variable.as_str(), best_new_val);
            current_prob -= best_improvement;
            ctx.record_scalar("accepted_improvement", best_improvement);
            adjustments.push(ShapAdjustment {
                variable: entry.variable.clone(),
                from: current_val,
                to: best_new_val,
                direction: entry.direction,
                improvement: best_improvement,
                fence_mean: good_mean,
            });
        }
    }

    Ok(GreedyOutcome {
        sample: adjusted,
        adjustments,
        fence_stops,
        final_prob: current_prob,
        budget_exhausted,
    })
}
