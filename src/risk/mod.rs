//! Heart-disease risk from the fifteen clinical inputs.
//!
//! The model itself is a trained artifact loaded at startup. This module
//! turns a submitted string map into the feature vector, evaluates the
//! model and maps the probability onto the stored risk figures.

pub mod insights;
pub mod model;

pub use insights::{explain, Insights, RiskFactor};
pub use model::{LogisticRiskModel, RiskModel};

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::models::enums::RiskText;
use crate::pipeline::extraction::ClinicalField;

pub const FEATURE_COUNT: usize = ClinicalField::ALL.len();

pub type FeatureVector = [f64; FEATURE_COUNT];

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Invalid value for {field}: {value:?}")]
    InvalidInput { field: &'static str, value: String },

    #[error("Model artifact unreadable at {path}: {source}")]
    ArtifactIo {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Model artifact malformed: {0}")]
    ArtifactFormat(String),

    #[error("Model produced a non-finite probability")]
    NonFinite,
}

/// What gets stored with an assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskOutcome {
    /// Probability of disease as a whole percent, 0-100.
    pub risk_level: i64,
    pub risk_text: RiskText,
    /// Confidence in the predicted class, percent with one decimal.
    pub confidence_score: f64,
}

impl RiskOutcome {
    fn sentinel(risk_text: RiskText) -> Self {
        Self {
            risk_level: 0,
            risk_text,
            confidence_score: 0.0,
        }
    }

    fn from_probability(p: f64) -> Self {
        let risk_level = (p * 100.0).round_ties_even() as i64;
        let confidence = p.max(1.0 - p) * 100.0;
        Self {
            risk_level,
            risk_text: RiskText::from_level(risk_level),
            confidence_score: (confidence * 10.0).round_ties_even() / 10.0,
        }
    }
}

/// Feature vector in model order. Missing inputs count as zero.
pub fn feature_vector(inputs: &BTreeMap<String, String>) -> Result<FeatureVector, RiskError> {
    let mut features = [0.0; FEATURE_COUNT];
    for (slot, field) in features.iter_mut().zip(ClinicalField::ALL) {
        let Some(raw) = inputs.get(field.as_str()) else {
            continue;
        };
        let value: f64 = raw.trim().parse().map_err(|_| RiskError::InvalidInput {
            field: field.as_str(),
            value: raw.clone(),
        })?;
        if !value.is_finite() {
            return Err(RiskError::InvalidInput {
                field: field.as_str(),
                value: raw.clone(),
            });
        }
        *slot = value;
    }
    Ok(features)
}

/// Evaluate `model` on the submitted inputs.
///
/// Never fails: an absent model and bad inputs both map to sentinel outcomes
/// that are stored like any other result.
pub fn calculate_risk(
    model: Option<&dyn RiskModel>,
    inputs: &BTreeMap<String, String>,
) -> RiskOutcome {
    let Some(model) = model else {
        return RiskOutcome::sentinel(RiskText::ModelNotLoaded);
    };

    let evaluated = feature_vector(inputs).and_then(|features| model.predict_proba(&features));
    match evaluated {
        Ok([_, p]) => RiskOutcome::from_probability(p),
        Err(e) => {
            tracing::warn!(error = %e, "Risk evaluation failed");
            RiskOutcome::sentinel(RiskText::InputError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a fixed probability regardless of input.
    struct FixedModel(f64);

    impl RiskModel for FixedModel {
        fn predict_proba(&self, _features: &FeatureVector) -> Result<[f64; 2], RiskError> {
            Ok([1.0 - self.0, self.0])
        }
    }

    /// Echoes the age feature back as the probability, scaled down.
    struct AgeModel;

    impl RiskModel for AgeModel {
        fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], RiskError> {
            let p = features[1] / 100.0;
            Ok([1.0 - p, p])
        }
    }

    fn inputs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn no_model_is_a_sentinel() {
        let outcome = calculate_risk(None, &inputs(&[("age", "50")]));
        assert_eq!(outcome.risk_level, 0);
        assert_eq!(outcome.risk_text, RiskText::ModelNotLoaded);
        assert_eq!(outcome.confidence_score, 0.0);
    }

    #[test]
    fn bad_number_is_input_error() {
        let outcome = calculate_risk(Some(&FixedModel(0.9)), &inputs(&[("age", "fifty")]));
        assert_eq!(outcome.risk_level, 0);
        assert_eq!(outcome.risk_text, RiskText::InputError);
        assert_eq!(outcome.confidence_score, 0.0);
    }

    #[test]
    fn non_finite_number_is_input_error() {
        let outcome = calculate_risk(Some(&FixedModel(0.9)), &inputs(&[("BMI", "NaN")]));
        assert_eq!(outcome.risk_text, RiskText::InputError);
        let outcome = calculate_risk(Some(&FixedModel(0.9)), &inputs(&[("glucose", "inf")]));
        assert_eq!(outcome.risk_text, RiskText::InputError);
    }

    #[test]
    fn missing_features_are_zero() {
        let features = feature_vector(&inputs(&[("age", "61"), ("glucose", " 99 ")])).unwrap();
        assert_eq!(features[1], 61.0);
        assert_eq!(features[14], 99.0);
        assert_eq!(features.iter().filter(|v| **v == 0.0).count(), 13);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let features =
            feature_vector(&inputs(&[("documentName", "scan.png"), ("male", "1")])).unwrap();
        assert_eq!(features[0], 1.0);
    }

    #[test]
    fn level_text_and_confidence() {
        let outcome = calculate_risk(Some(&FixedModel(0.8)), &BTreeMap::new());
        assert_eq!(outcome.risk_level, 80);
        assert_eq!(outcome.risk_text, RiskText::VeryHigh);
        assert_eq!(outcome.confidence_score, 80.0);

        let outcome = calculate_risk(Some(&FixedModel(0.123)), &BTreeMap::new());
        assert_eq!(outcome.risk_level, 12);
        assert_eq!(outcome.risk_text, RiskText::Low);
        assert_eq!(outcome.confidence_score, 87.7);
    }

    #[test]
    fn bands_are_strictly_greater_than() {
        for (p, text) in [
            (0.76, RiskText::VeryHigh),
            (0.75, RiskText::High),
            (0.51, RiskText::High),
            (0.50, RiskText::Moderate),
            (0.26, RiskText::Moderate),
            (0.25, RiskText::Low),
        ] {
            let outcome = calculate_risk(Some(&FixedModel(p)), &BTreeMap::new());
            assert_eq!(outcome.risk_text, text, "p = {p}");
        }
    }

    #[test]
    fn half_percent_rounds_to_even() {
        let outcome = calculate_risk(Some(&AgeModel), &inputs(&[("age", "62.5")]));
        assert_eq!(outcome.risk_level, 62);
        let outcome = calculate_risk(Some(&AgeModel), &inputs(&[("age", "63.5")]));
        assert_eq!(outcome.risk_level, 64);
    }

    #[test]
    fn model_failure_is_input_error() {
        struct Broken;
        impl RiskModel for Broken {
            fn predict_proba(&self, _: &FeatureVector) -> Result<[f64; 2], RiskError> {
                Err(RiskError::NonFinite)
            }
        }
        let outcome = calculate_risk(Some(&Broken), &BTreeMap::new());
        assert_eq!(outcome.risk_text, RiskText::InputError);
    }
}
