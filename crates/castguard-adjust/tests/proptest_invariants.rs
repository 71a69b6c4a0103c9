// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use castguard_adjust::{fix_rule_violations, remediate, AdjustDirection};
use castguard_core::{
    die_casting_defaults, Attributions, CastguardError, Classifier, Constraints, ExecutionContext,
    FeatureEncoder, FeatureRow, RawSample,
};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

const MIN_PROPTEST_CASES: u32 = 1000;

fn proptest_cases() -> u32 {
    std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .map(|parsed| parsed.max(MIN_PROPTEST_CASES))
        .unwrap_or(MIN_PROPTEST_CASES)
}

struct PassthroughEncoder;

impl FeatureEncoder for PassthroughEncoder {
    fn encode(&self, sample: &RawSample) -> Result<FeatureRow, CastguardError> {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for (name, value) in sample.iter() {
            if let Some(numeric) = value.as_numeric() {
                columns.push(name.clone());
                values.push(numeric);
            }
        }
        FeatureRow::new(columns, values)
    }
}

struct PressureLogistic;

impl Classifier for PressureLogistic {
    fn predict_fail_prob(&self, row: &FeatureRow) -> Result<f64, CastguardError> {
        let pressure = row
            .value("cast_pressure")
            .ok_or_else(|| CastguardError::invalid_input("cast_pressure missing"))?;
        let z = 0.09 * pressure - 31.095;
        Ok(1.0 / (1.0 + (-z).exp()))
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        ..ProptestConfig::default()
    })]

    #[test]
    fn rule_correction_is_idempotent(
        pressure in 0.0_f64..500.0,
        coolant in 0.0_f64..60.0,
        biscuit in 0.0_f64..500.0,
    ) {
        let config = die_casting_defaults();
        let sample = RawSample::new()
            .with_numeric("cast_pressure", pressure)
            .with_numeric("coolant_temp", coolant)
            .with_numeric("biscuit_thickness", biscuit);

        let (corrected_once, _) = fix_rule_violations(&sample, &config);
        let (corrected_twice, second_pass) = fix_rule_violations(&corrected_once, &config);

        prop_assert!(second_pass.is_empty(), "corrected values must not re-violate");
        prop_assert_eq!(corrected_once, corrected_twice);
    }

    #[test]
    fn committed_adjustments_always_improve_and_respect_the_fence(
        pressure in 40.0_f64..370.0,
        attribution in -0.5_f64..0.5,
    ) {
        let config = die_casting_defaults();
        let sample = RawSample::new().with_numeric("cast_pressure", pressure);
        let attributions = Attributions::from_pairs([("num__cast_pressure", attribution)])
            .expect("finite attribution");
        let constraints = Constraints::default();
        let ctx = ExecutionContext::new(&constraints);

        let result = remediate(
            &sample,
            &attributions,
            &PressureLogistic,
            &PassthroughEncoder,
            &config,
            &ctx,
        )
        .expect("remediation runs");

        prop_assert!(result.shap_adjustments.iter().all(|a| a.improvement > 0.0));
        if result.rule_adjustments.is_empty() {
            // No correction stage ran, so the search starts from the initial
            // probability and every committed step lowers it.
            let committed: f64 = result
                .shap_adjustments
                .iter()
                .map(|adjustment| adjustment.improvement)
                .sum();
            prop_assert!(result.final_prob <= result.initial_prob - committed + 1e-9);
        }

        for adjustment in &result.shap_adjustments {
            if let Some(mean) = adjustment.fence_mean {
                match adjustment.direction {
                    AdjustDirection::Increase => prop_assert!(adjustment.to <= mean),
                    AdjustDirection::Decrease => prop_assert!(adjustment.to >= mean),
                }
            }
        }
    }
}
