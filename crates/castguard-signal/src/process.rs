// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::normalize::{normalize_attribution, rule_severity};
use castguard_core::{Attributions, GuardConfig, RawSample, ScoreWeights};
use std::collections::BTreeMap;

/// Max/mean blend of per-variable normalized signals.
///
/// A single severely anomalous variable should dominate the process alert
/// (acute failure mode), while elevated levels across many variables still
/// register (creeping failure mode). Empty input scores 0.
pub fn blend_score(signals: &[f64], weights: &ScoreWeights) -> f64 {
    if signals.is_empty() {
        return 0.0;
    }

    let max = signals.iter().copied().fold(0.0_f64, f64::max);
    let mean = signals.iter().sum::<f64>() / signals.len() as f64;
    weights.max_weight * max + weights.mean_weight * mean
}

/// Discrete per-process alert decision.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertLevel {
    /// Both independent signal sources agree.
    StrongCauseCandidate,
    /// Only the model attribution signal is elevated.
    ModelSignalWarning,
    /// Only the expert rule signal is elevated.
    RuleThresholdExceeded,
    Normal,
}

impl AlertLevel {
    pub fn classify(shap_score: f64, rule_score: f64, threshold: f64) -> Self {
        match (shap_score > threshold, rule_score > threshold) {
            (true, true) => Self::StrongCauseCandidate,
            (true, false) => Self::ModelSignalWarning,
            (false, true) => Self::RuleThresholdExceeded,
            (false, false) => Self::Normal,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::StrongCauseCandidate => "strong cause candidate",
            Self::ModelSignalWarning => "model signal warning",
            Self::RuleThresholdExceeded => "rule threshold exceeded",
            Self::Normal => "normal",
        }
    }
}

/// Aggregated scores for one process group.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessScores {
    pub shap_score: f64,
    pub rule_score: f64,
    pub fused: f64,
    pub alert: AlertLevel,
}

/// Per-variable signals of one process group, keyed by encoded column name.
///
/// Variables missing from the attribution map or the raw sample contribute
/// zero signal; many variables legitimately have no rule or no attribution.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessSignals {
    pub process: String,
    pub variables: Vec<String>,
    pub shap_normalized: BTreeMap<String, f64>,
    pub shap_raw: BTreeMap<String, f64>,
    pub rule_normalized: BTreeMap<String, f64>,
    pub current_values: BTreeMap<String, Option<f64>>,
}

impl ProcessSignals {
    /// Collects normalized SHAP and rule signals for `process`.
    ///
    /// Rule severities are computed against the sample's raw values because
    /// cut-offs are defined in physical units, while attributions are keyed
    /// by encoded column names.
    pub fn collect(
        process: &str,
        raw_sample: &RawSample,
        attributions: &Attributions,
        prediction_prob: f64,
        config: &GuardConfig,
    ) -> Self {
        let variables = config
            .process_vars
            .get(process)
            .cloned()
            .unwrap_or_default();

        let mut shap_normalized = BTreeMap::new();
        let mut shap_raw = BTreeMap::new();
        let mut rule_normalized = BTreeMap::new();
        let mut current_values = BTreeMap::new();

        for encoded in &variables {
            let raw_attr = attributions.get(encoded).unwrap_or(0.0);
            shap_raw.insert(encoded.clone(), raw_attr);
            shap_normalized.insert(
                encoded.clone(),
                normalize_attribution(raw_attr, prediction_prob),
            );

            let raw_variable = config.raw_variable(encoded);
            let current = raw_variable.and_then(|name| raw_sample.numeric(name));
            current_values.insert(encoded.clone(), current);

            let severity = match (raw_variable, current) {
                (Some(name), Some(value)) => {
                    match (config.cutoffs.get(name), config.data_ranges.get(name)) {
                        (Some(rule), Some(range)) => rule_severity(value, rule, range),
                        _ => 0.0,
                    }
                }
                _ => 0.0,
            };
            rule_normalized.insert(encoded.clone(), severity);
        }

        Self {
            process: process.to_string(),
            variables,
            shap_normalized,
            shap_raw,
            rule_normalized,
            current_values,
        }
    }

    /// Blends the per-variable signals into process-level scores and the
    /// alert decision.
    pub fn scores(&self, weights: &ScoreWeights) -> ProcessScores {
        let shap: Vec<f64> = self
            .variables
            .iter()
            .filter_map(|v| self.shap_normalized.get(v).copied())
            .collect();
        let rule: Vec<f64> = self
            .variables
            .iter()
            .filter_map(|v| self.rule_normalized.get(v).copied())
            .collect();

        let shap_score = blend_score(&shap, weights);
        let rule_score = blend_score(&rule, weights);
        let fused = weights.shap_weight * shap_score + weights.rule_weight * rule_score;
        let alert = AlertLevel::classify(shap_score, rule_score, weights.alert_threshold);

        ProcessScores {
            shap_score,
            rule_score,
            fused,
            alert,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{blend_score, AlertLevel, ProcessSignals};
    use castguard_core::{die_casting_defaults, Attributions, RawSample, ScoreWeights};

    #[test]
    fn blend_score_is_zero_for_empty_input() {
        assert_eq!(blend_score(&[], &ScoreWeights::default()), 0.0);
    }

    #[test]
    fn blend_score_mixes_max_and_mean() {
        let weights = ScoreWeights::default();
        let signals = [0.0, 0.0, 0.9];
        let expected = 0.7 * 0.9 + 0.3 * 0.3;
        assert!((blend_score(&signals, &weights) - expected).abs() < 1.0e-12);
    }

    #[test]
    fn blend_score_stays_in_unit_interval_for_unit_signals() {
        let weights = ScoreWeights::default();
        let signals = [1.0, 1.0, 1.0];
        assert!(blend_score(&signals, &weights) <= 1.0);
        assert!(blend_score(&signals, &weights) >= 0.0);
    }

    #[test]
    fn alert_classification_covers_all_quadrants() {
        let t = 0.15;
        assert_eq!(
            AlertLevel::classify(0.2, 0.2, t),
            AlertLevel::StrongCauseCandidate
        );
        assert_eq!(
            AlertLevel::classify(0.2, 0.1, t),
            AlertLevel::ModelSignalWarning
        );
        assert_eq!(
            AlertLevel::classify(0.1, 0.2, t),
            AlertLevel::RuleThresholdExceeded
        );
        assert_eq!(AlertLevel::classify(0.1, 0.1, t), AlertLevel::Normal);
        // exactly at the threshold does not fire
        assert_eq!(AlertLevel::classify(t, t, t), AlertLevel::Normal);
    }

    #[test]
    fn all_zero_signals_score_zero_and_stay_normal() {
        let config = die_casting_defaults();
        let sample = RawSample::new()
            .with_numeric("cast_pressure", 350.0)
            .with_numeric("low_section_speed", 105.0);
        let signals = ProcessSignals::collect(
            "injection",
            &sample,
            &Attributions::new(),
            0.6,
            &config,
        );
        let scores = signals.scores(&config.weights);
        assert_eq!(scores.shap_score, 0.0);
        assert_eq!(scores.rule_score, 0.0);
        assert_eq!(scores.fused, 0.0);
        assert_eq!(scores.alert, AlertLevel::Normal);
    }

    #[test]
    fn rule_violation_in_raw_units_raises_the_rule_score() {
        let config = die_casting_defaults();
        // coolant_temp 15 violates low=20; range 10..50
        let sample = RawSample::new().with_numeric("coolant_temp", 15.0);
        let signals = ProcessSignals::collect(
            "solidify",
            &sample,
            &Attributions::new(),
            0.6,
            &config,
        );
        let severity = signals.rule_normalized["num__coolant_temp"];
        assert!((severity - 0.5).abs() < 1.0e-12, "got {severity}");

        let scores = signals.scores(&config.weights);
        assert!(scores.rule_score > config.weights.alert_threshold);
        assert_eq!(scores.alert, AlertLevel::RuleThresholdExceeded);
    }

    #[test]
    fn attribution_signal_uses_encoded_names() {
        let config = die_casting_defaults();
        let sample = RawSample::new().with_numeric("cast_pressure", 350.0);
        let attributions =
            Attributions::from_pairs(vec![("num__cast_pressure", 0.3)]).expect("finite");
        let signals =
            ProcessSignals::collect("injection", &sample, &attributions, 0.6, &config);
        assert_eq!(signals.shap_raw["num__cast_pressure"], 0.3);
        assert_eq!(signals.shap_normalized["num__cast_pressure"], 0.5);
        assert_eq!(signals.current_values["num__cast_pressure"], Some(350.0));

        let scores = signals.scores(&config.weights);
        assert_eq!(scores.alert, AlertLevel::ModelSignalWarning);
    }

    #[test]
    fn unknown_process_yields_empty_signals() {
        let config = die_casting_defaults();
        let signals = ProcessSignals::collect(
            "trimming",
            &RawSample::new(),
            &Attributions::new(),
            0.6,
            &config,
        );
        assert!(signals.variables.is_empty());
        let scores = signals.scores(&config.weights);
        assert_eq!(scores.fused, 0.0);
        assert_eq!(scores.alert, AlertLevel::Normal);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn process_scores_roundtrip_through_serde() {
        use super::ProcessScores;

        let scores = ProcessScores {
            shap_score: 0.42,
            rule_score: 0.17,
            fused: 0.295,
            alert: AlertLevel::StrongCauseCandidate,
        };
        let encoded = serde_json::to_string(&scores).expect("serialize scores");
        let decoded: ProcessScores = serde_json::from_str(&encoded).expect("deserialize scores");
        assert_eq!(scores, decoded);
    }
}
