// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::CastguardError;
use std::collections::BTreeMap;

/// One raw process measurement. Rules, fences, and adjustments apply to
/// numeric variables only; categorical values pass through to the encoder
/// untouched.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum SampleValue {
    Numeric(f64),
    Categorical(String),
}

impl SampleValue {
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            Self::Numeric(value) => Some(*value),
            Self::Categorical(_) => None,
        }
    }
}

/// A single cast-part sample in raw (physical) units.
///
/// Backed by a `BTreeMap` so iteration order, and therefore every adjustment
/// log, is deterministic.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSample {
    values: BTreeMap<String, SampleValue>,
}

impl RawSample {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_numeric(mut self, variable: impl Into<String>, value: f64) -> Self {
        self.values
            .insert(variable.into(), SampleValue::Numeric(value));
        self
    }

    pub fn with_categorical(
        mut self,
        variable: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.values
            .insert(variable.into(), SampleValue::Categorical(value.into()));
        self
    }

    pub fn get(&self, variable: &str) -> Option<&SampleValue> {
        self.values.get(variable)
    }

    /// Numeric value of `variable`, or `None` when absent or categorical.
    pub fn numeric(&self, variable: &str) -> Option<f64> {
        self.values.get(variable).and_then(SampleValue::as_numeric)
    }

    pub fn set_numeric(&mut self, variable: impl Into<String>, value: f64) {
        self.values
            .insert(variable.into(), SampleValue::Numeric(value));
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SampleValue)> {
        self.values.iter()
    }

    /// Variable names in deterministic order.
    pub fn variables(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }
}

/// An encoded feature row as consumed by the fitted classifier.
///
/// Column order is significant: it must match the training schema exactly.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRow {
    columns: Vec<String>,
    values: Vec<f64>,
}

impl FeatureRow {
    pub fn new(columns: Vec<String>, values: Vec<f64>) -> Result<Self, CastguardError> {
        if columns.len() != values.len() {
            return Err(CastguardError::invalid_input(format!(
                "feature row shape mismatch: {} columns, {} values",
                columns.len(),
                values.len()
            )));
        }
        for (column, value) in columns.iter().zip(&values) {
            if !value.is_finite() {
                return Err(CastguardError::invalid_input(format!(
                    "feature row value for {column} must be finite; got {value}"
                )));
            }
        }
        Ok(Self { columns, values })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn value(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|candidate| candidate == column)
            .map(|idx| self.values[idx])
    }
}

/// Per-feature signed attributions for one prediction, keyed by encoded
/// column name. Positive pushes toward failure, negative toward pass.
///
/// This is the single shape the core accepts: whatever structure an external
/// explainer produces must be flattened into name/value pairs at the system
/// boundary via [`Attributions::from_pairs`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributions {
    values: BTreeMap<String, f64>,
}

impl Attributions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boundary adapter: collects explainer output into the canonical map.
    ///
    /// Non-finite attributions are rejected rather than silently dropped;
    /// a NaN here means the explainer itself misbehaved.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, CastguardError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut values = BTreeMap::new();
        for (name, value) in pairs {
            let name = name.into();
            if !value.is_finite() {
                return Err(CastguardError::invalid_input(format!(
                    "attribution for {name} must be finite; got {value}"
                )));
            }
            values.insert(name, value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, feature: &str) -> Option<f64> {
        self.values.get(feature).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, f64)> {
        self.values.iter().map(|(name, value)| (name, *value))
    }
}

#[cfg(test)]
mod tests {
    use super::{Attributions, FeatureRow, RawSample, SampleValue};

    #[test]
    fn raw_sample_numeric_access_ignores_categoricals() {
        let sample = RawSample::new()
            .with_numeric("cast_pressure", 350.0)
            .with_categorical("working", "active");

        assert_eq!(sample.numeric("cast_pressure"), Some(350.0));
        assert_eq!(sample.numeric("working"), None);
        assert_eq!(sample.numeric("missing"), None);
        assert_eq!(
            sample.get("working"),
            Some(&SampleValue::Categorical("active".to_string()))
        );
    }

    #[test]
    fn raw_sample_iteration_is_sorted_by_name() {
        let sample = RawSample::new()
            .with_numeric("zeta", 1.0)
            .with_numeric("alpha", 2.0);
        let names: Vec<&String> = sample.variables().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn feature_row_rejects_shape_mismatch_and_non_finite() {
        let err = FeatureRow::new(vec!["a".to_string()], vec![1.0, 2.0])
            .expect_err("mismatched lengths must fail");
        assert!(err.to_string().contains("shape mismatch"));

        let err = FeatureRow::new(vec!["a".to_string()], vec![f64::NAN])
            .expect_err("NaN value must fail");
        assert!(err.to_string().contains("must be finite"));
    }

    #[test]
    fn feature_row_lookup_by_column() {
        let row = FeatureRow::new(
            vec!["num__cast_pressure".to_string(), "num__coolant_temp".to_string()],
            vec![350.0, 25.0],
        )
        .expect("row should be valid");
        assert_eq!(row.value("num__coolant_temp"), Some(25.0));
        assert_eq!(row.value("absent"), None);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn attributions_adapter_accepts_pairs_and_rejects_nan() {
        let attrs = Attributions::from_pairs(vec![
            ("num__cast_pressure", 0.25),
            ("num__coolant_temp", -0.15),
        ])
        .expect("finite pairs should convert");
        assert_eq!(attrs.get("num__cast_pressure"), Some(0.25));
        assert_eq!(attrs.len(), 2);

        let err = Attributions::from_pairs(vec![("bad", f64::INFINITY)])
            .expect_err("non-finite attribution must fail");
        assert!(err.to_string().contains("must be finite"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn raw_sample_serde_roundtrip() {
        let sample = RawSample::new()
            .with_numeric("cast_pressure", 350.0)
            .with_categorical("tryshot_signal", "D");
        let encoded = serde_json::to_string(&sample).expect("serialize sample");
        let decoded: RawSample = serde_json::from_str(&encoded).expect("deserialize sample");
        assert_eq!(decoded, sample);
    }
}
