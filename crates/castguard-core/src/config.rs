// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::CastguardError;
use std::collections::BTreeMap;

/// Expert cut-off rule for one raw variable. At least one bound must be set;
/// violation is strict inequality beyond the bound.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CutoffRule {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl CutoffRule {
    pub fn low(value: f64) -> Self {
        Self {
            low: Some(value),
            high: None,
        }
    }

    pub fn high(value: f64) -> Self {
        Self {
            low: None,
            high: Some(value),
        }
    }

    pub fn band(low: f64, high: f64) -> Self {
        Self {
            low: Some(low),
            high: Some(high),
        }
    }
}

/// Physical data range for one raw variable, used to clamp rule corrections
/// and to bound severity denominators.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DataRange {
    pub min: f64,
    pub max: f64,
}

impl DataRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Named weights and thresholds of the scoring layer. These are deliberately
/// configuration values, not literals, so one implementation covers the
/// tunable variants seen in production.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreWeights {
    /// Weight of the worst single variable in the max/mean blend.
    pub max_weight: f64,
    /// Weight of the average signal level in the max/mean blend.
    pub mean_weight: f64,
    /// Weight of the model-attribution score in the fused process score.
    pub shap_weight: f64,
    /// Weight of the rule-severity score in the fused process score.
    pub rule_weight: f64,
    /// Per-signal score above which a process-level alert fires.
    pub alert_threshold: f64,
    /// Per-variable normalized score above which a signal badge lights up.
    pub signal_badge_threshold: f64,
    /// Minimum combined relative importance for a variable to be reported.
    pub relative_floor: f64,
    /// Number of top contributors shown per process.
    pub top_k: usize,
    /// Divide-by-zero guard for relative-importance shares.
    pub relative_epsilon: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            max_weight: 0.7,
            mean_weight: 0.3,
            shap_weight: 0.5,
            rule_weight: 0.5,
            alert_threshold: 0.15,
            signal_badge_threshold: 0.1,
            relative_floor: 0.05,
            top_k: 3,
            relative_epsilon: 1.0e-6,
        }
    }
}

/// Named tunables of the greedy counterfactual search.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdjustTuning {
    /// Default failure-probability target of the remediation search.
    pub target_prob: f64,
    /// Minimum absolute probability improvement worth committing.
    pub min_improvement: f64,
    /// Attributions below this magnitude carry no adjustment priority.
    pub near_zero_floor: f64,
    /// Trial-step cap per variable.
    pub max_iterations_per_var: usize,
    /// Stand-in probability when a caller supplies a degenerate one during
    /// explanation rendering.
    pub fallback_prob: f64,
}

impl Default for AdjustTuning {
    fn default() -> Self {
        Self {
            target_prob: 0.30,
            min_improvement: 0.01,
            near_zero_floor: 1.0e-6,
            max_iterations_per_var: 10,
            fallback_prob: 0.8,
        }
    }
}

/// Read-only configuration tables loaded once at startup.
///
/// Every map is keyed by raw variable name except `process_vars`, which lists
/// encoded column names, and `feature_map`, which translates encoded column
/// names back to raw ones.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuardConfig {
    pub cutoffs: BTreeMap<String, CutoffRule>,
    pub data_ranges: BTreeMap<String, DataRange>,
    pub good_means: BTreeMap<String, f64>,
    pub adjustment_steps: BTreeMap<String, f64>,
    pub process_vars: BTreeMap<String, Vec<String>>,
    pub feature_map: BTreeMap<String, String>,
    pub display_names: BTreeMap<String, String>,
    pub weights: ScoreWeights,
    pub tuning: AdjustTuning,
}

impl GuardConfig {
    /// Raw variable behind an encoded column, if the mapping knows it.
    pub fn raw_variable(&self, encoded: &str) -> Option<&str> {
        self.feature_map.get(encoded).map(String::as_str)
    }

    /// Human-readable name for rendering; falls back to the raw name.
    pub fn display_name<'a>(&'a self, variable: &'a str) -> &'a str {
        self.display_names
            .get(variable)
            .map(String::as_str)
            .unwrap_or(variable)
    }

    /// Validates the loaded tables. A malformed cut-off rule (`low > high`)
    /// is a configuration error, not something the evaluators paper over.
    pub fn validate(&self) -> Result<(), CastguardError> {
        for (variable, rule) in &self.cutoffs {
            match (rule.low, rule.high) {
                (None, None) => {
                    return Err(CastguardError::invalid_config(format!(
                        "cutoff rule for {variable} has neither a low nor a high bound"
                    )));
                }
                (Some(low), Some(high)) if low > high => {
                    return Err(CastguardError::invalid_config(format!(
                        "cutoff rule for {variable} has low {low} above high {high}"
                    )));
                }
                _ => {}
            }
            for bound in [rule.low, rule.high].into_iter().flatten() {
                if !bound.is_finite() {
                    return Err(CastguardError::invalid_config(format!(
                        "cutoff bound for {variable} must be finite; got {bound}"
                    )));
                }
            }
            if !self.data_ranges.contains_key(variable) {
                return Err(CastguardError::invalid_config(format!(
                    "cutoff rule for {variable} has no matching data range"
                )));
            }
        }

        for (variable, range) in &self.data_ranges {
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(CastguardError::invalid_config(format!(
                    "data range for {variable} must be finite; got [{}, {}]",
                    range.min, range.max
                )));
            }
            if range.min > range.max {
                return Err(CastguardError::invalid_config(format!(
                    "data range for {variable} has min {} above max {}",
                    range.min, range.max
                )));
            }
        }

        for (variable, step) in &self.adjustment_steps {
            if !step.is_finite() || *step <= 0.0 {
                return Err(CastguardError::invalid_config(format!(
                    "adjustment step for {variable} must be finite and > 0; got {step}"
                )));
            }
        }

        for (variable, mean) in &self.good_means {
            if !mean.is_finite() {
                return Err(CastguardError::invalid_config(format!(
                    "good-sample mean for {variable} must be finite; got {mean}"
                )));
            }
        }

        let weights = &self.weights;
        for (name, value) in [
            ("max_weight", weights.max_weight),
            ("mean_weight", weights.mean_weight),
            ("shap_weight", weights.shap_weight),
            ("rule_weight", weights.rule_weight),
            ("alert_threshold", weights.alert_threshold),
            ("signal_badge_threshold", weights.signal_badge_threshold),
            ("relative_floor", weights.relative_floor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CastguardError::invalid_config(format!(
                    "score weight {name} must be finite and >= 0; got {value}"
                )));
            }
        }
        if weights.relative_epsilon <= 0.0 {
            return Err(CastguardError::invalid_config(format!(
                "relative_epsilon must be > 0; got {}",
                weights.relative_epsilon
            )));
        }

        let tuning = &self.tuning;
        if !tuning.target_prob.is_finite() || !(0.0..=1.0).contains(&tuning.target_prob) {
            return Err(CastguardError::invalid_config(format!(
                "target_prob must be within [0, 1]; got {}",
                tuning.target_prob
            )));
        }
        if !tuning.min_improvement.is_finite() || tuning.min_improvement <= 0.0 {
            return Err(CastguardError::invalid_config(format!(
                "min_improvement must be finite and > 0; got {}",
                tuning.min_improvement
            )));
        }
        if tuning.near_zero_floor <= 0.0 {
            return Err(CastguardError::invalid_config(format!(
                "near_zero_floor must be > 0; got {}",
                tuning.near_zero_floor
            )));
        }
        if tuning.max_iterations_per_var == 0 {
            return Err(CastguardError::invalid_config(
                "max_iterations_per_var must be at least 1",
            ));
        }
        if !tuning.fallback_prob.is_finite()
            || tuning.fallback_prob <= 0.0
            || tuning.fallback_prob > 1.0
        {
            return Err(CastguardError::invalid_config(format!(
                "fallback_prob must be within (0, 1]; got {}",
                tuning.fallback_prob
            )));
        }

        Ok(())
    }
}

/// Derives an encoded-to-raw mapping from the conventional `num__` / `cat__`
/// preprocessing prefixes.
pub fn feature_map_from_prefixes<'a, I>(encoded_columns: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    encoded_columns
        .into_iter()
        .map(|column| {
            let raw = column
                .strip_prefix("num__")
                .or_else(|| column.strip_prefix("cat__"))
                .unwrap_or(column);
            (column.to_string(), raw.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{feature_map_from_prefixes, CutoffRule, DataRange, GuardConfig};

    fn config_with_rule(rule: CutoffRule) -> GuardConfig {
        let mut config = GuardConfig::default();
        config.cutoffs.insert("cast_pressure".to_string(), rule);
        config
            .data_ranges
            .insert("cast_pressure".to_string(), DataRange::new(40.0, 370.0));
        config
    }

    #[test]
    fn default_config_validates() {
        GuardConfig::default()
            .validate()
            .expect("empty config should validate");
    }

    #[test]
    fn malformed_rule_low_above_high_is_a_config_error() {
        let config = config_with_rule(CutoffRule::band(300.0, 200.0));
        let err = config.validate().expect_err("low > high must be rejected");
        assert!(err.to_string().contains("low 300 above high 200"));
    }

    #[test]
    fn empty_rule_is_a_config_error() {
        let config = config_with_rule(CutoffRule::default());
        let err = config.validate().expect_err("empty rule must be rejected");
        assert!(err.to_string().contains("neither a low nor a high bound"));
    }

    #[test]
    fn ruled_variable_without_range_is_a_config_error() {
        let mut config = GuardConfig::default();
        config
            .cutoffs
            .insert("cast_pressure".to_string(), CutoffRule::low(314.0));
        let err = config
            .validate()
            .expect_err("missing data range must be rejected");
        assert!(err.to_string().contains("no matching data range"));
    }

    #[test]
    fn inverted_data_range_is_a_config_error() {
        let mut config = GuardConfig::default();
        config
            .data_ranges
            .insert("coolant_temp".to_string(), DataRange::new(50.0, 10.0));
        let err = config
            .validate()
            .expect_err("min > max must be rejected");
        assert!(err.to_string().contains("min 50 above max 10"));
    }

    #[test]
    fn non_positive_step_is_a_config_error() {
        let mut config = GuardConfig::default();
        config
            .adjustment_steps
            .insert("coolant_temp".to_string(), 0.0);
        let err = config
            .validate()
            .expect_err("zero step must be rejected");
        assert!(err.to_string().contains("must be finite and > 0"));
    }

    #[test]
    fn feature_map_strips_known_prefixes() {
        let map = feature_map_from_prefixes(vec![
            "num__cast_pressure",
            "cat__working_active",
            "unprefixed",
        ]);
        assert_eq!(map["num__cast_pressure"], "cast_pressure");
        assert_eq!(map["cat__working_active"], "working_active");
        assert_eq!(map["unprefixed"], "unprefixed");
    }

    #[test]
    fn midpoint_is_halfway_across_the_range() {
        assert_eq!(DataRange::new(40.0, 370.0).midpoint(), 205.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn guard_config_serde_roundtrip() {
        let config = config_with_rule(CutoffRule::band(314.0, 360.0));
        let encoded = serde_json::to_string(&config).expect("serialize config");
        let decoded: GuardConfig = serde_json::from_str(&encoded).expect("deserialize config");
        assert_eq!(decoded, config);
    }
}
