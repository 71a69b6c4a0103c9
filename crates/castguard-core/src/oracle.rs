// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{Attributions, CastguardError, FeatureRow, RawSample};

/// Fitted pass/fail classifier, treated as an opaque probability oracle.
///
/// Implementations wrap whatever tree ensemble the offline pipeline trained;
/// the engine only ever asks for the failure-class probability of one row.
pub trait Classifier {
    fn predict_fail_prob(&self, row: &FeatureRow) -> Result<f64, CastguardError>;
}

/// Deterministic raw-to-encoded feature transform with fitted parameters.
pub trait FeatureEncoder {
    fn encode(&self, sample: &RawSample) -> Result<FeatureRow, CastguardError>;
}

/// SHAP-style explainer: signed, additive per-feature attributions for the
/// failure class of one encoded row.
pub trait Explainer {
    fn explain(&self, row: &FeatureRow) -> Result<Attributions, CastguardError>;
}

/// Validates a probability coming back from an external classifier.
pub fn checked_prob(prob: f64) -> Result<f64, CastguardError> {
    if !prob.is_finite() || !(0.0..=1.0).contains(&prob) {
        return Err(CastguardError::invalid_input(format!(
            "classifier returned a probability outside [0, 1]: {prob}"
        )));
    }
    Ok(prob)
}
