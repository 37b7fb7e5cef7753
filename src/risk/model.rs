use std::path::Path;

use serde::Deserialize;

use super::{FeatureVector, RiskError, FEATURE_COUNT};
use crate::pipeline::extraction::ClinicalField;

/// A trained binary classifier over the clinical feature vector.
pub trait RiskModel: Send + Sync {
    /// `[P(no disease), P(disease)]`.
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], RiskError>;
}

/// On-disk layout of the exported model.
#[derive(Debug, Deserialize)]
struct ModelArtifact {
    /// Optional; checked against the fixed feature order when present.
    #[serde(default)]
    features: Option<Vec<String>>,
    scaler: ScalerParams,
    classifier: ClassifierParams,
}

#[derive(Debug, Deserialize)]
struct ScalerParams {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct ClassifierParams {
    coefficients: Vec<f64>,
    intercept: f64,
}

/// Standard scaler followed by logistic regression.
#[derive(Debug, Clone)]
pub struct LogisticRiskModel {
    mean: FeatureVector,
    scale: FeatureVector,
    coefficients: FeatureVector,
    intercept: f64,
}

impl LogisticRiskModel {
    pub fn load(path: &Path) -> Result<Self, RiskError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RiskError::ArtifactIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, RiskError> {
        let artifact: ModelArtifact =
            serde_json::from_str(raw).map_err(|e| RiskError::ArtifactFormat(e.to_string()))?;

        if let Some(names) = &artifact.features {
            let expected: Vec<&str> = ClinicalField::ALL.iter().map(|f| f.as_str()).collect();
            if names.iter().map(String::as_str).ne(expected.iter().copied()) {
                return Err(RiskError::ArtifactFormat(format!(
                    "feature order {names:?} does not match {expected:?}"
                )));
            }
        }

        let mean = fixed_len("scaler.mean", artifact.scaler.mean)?;
        let mut scale = fixed_len("scaler.scale", artifact.scaler.scale)?;
        let coefficients = fixed_len("classifier.coefficients", artifact.classifier.coefficients)?;

        // Constant features were exported with a zero scale
        for s in scale.iter_mut() {
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        let all_finite = mean
            .iter()
            .chain(scale.iter())
            .chain(coefficients.iter())
            .chain(std::iter::once(&artifact.classifier.intercept))
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(RiskError::ArtifactFormat("non-finite parameter".into()));
        }

        Ok(Self {
            mean,
            scale,
            coefficients,
            intercept: artifact.classifier.intercept,
        })
    }

    fn decision(&self, features: &FeatureVector) -> f64 {
        features
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .zip(&self.coefficients)
            .map(|(((x, mean), scale), w)| w * ((x - mean) / scale))
            .sum::<f64>()
            + self.intercept
    }
}

impl RiskModel for LogisticRiskModel {
    fn predict_proba(&self, features: &FeatureVector) -> Result<[f64; 2], RiskError> {
        let p = sigmoid(self.decision(features));
        if !p.is_finite() {
            return Err(RiskError::NonFinite);
        }
        Ok([1.0 - p, p])
    }
}

fn fixed_len(name: &str, values: Vec<f64>) -> Result<FeatureVector, RiskError> {
    let len = values.len();
    values.try_into().map_err(|_| {
        RiskError::ArtifactFormat(format!("{name} has {len} entries, expected {FEATURE_COUNT}"))
    })
}

/// Logistic function without overflow for large |z|.
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(coefficients: &[f64], intercept: f64) -> String {
        serde_json::json!({
            "scaler": {
                "mean": vec![0.0; FEATURE_COUNT],
                "scale": vec![1.0; FEATURE_COUNT],
            },
            "classifier": {
                "coefficients": coefficients,
                "intercept": intercept,
            }
        })
        .to_string()
    }

    #[test]
    fn intercept_only_model() {
        let model = LogisticRiskModel::from_json(&artifact(&[0.0; FEATURE_COUNT], 0.0)).unwrap();
        let [p0, p1] = model.predict_proba(&[0.0; FEATURE_COUNT]).unwrap();
        assert!((p0 - 0.5).abs() < 1e-12);
        assert!((p1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn features_are_standardized() {
        let mut coefficients = [0.0; FEATURE_COUNT];
        coefficients[1] = 1.0;
        let mut mean = vec![0.0; FEATURE_COUNT];
        mean[1] = 50.0;
        let mut scale = vec![1.0; FEATURE_COUNT];
        scale[1] = 10.0;
        let raw = serde_json::json!({
            "scaler": {"mean": mean, "scale": scale},
            "classifier": {"coefficients": coefficients, "intercept": 0.0}
        })
        .to_string();
        let model = LogisticRiskModel::from_json(&raw).unwrap();

        let mut x = [0.0; FEATURE_COUNT];
        x[1] = 60.0;
        let [_, p] = model.predict_proba(&x).unwrap();
        assert!((p - sigmoid(1.0)).abs() < 1e-12);
    }

    #[test]
    fn zero_scale_is_treated_as_one() {
        let raw = serde_json::json!({
            "scaler": {"mean": vec![0.0; FEATURE_COUNT], "scale": vec![0.0; FEATURE_COUNT]},
            "classifier": {"coefficients": vec![1.0; FEATURE_COUNT], "intercept": 0.0}
        })
        .to_string();
        let model = LogisticRiskModel::from_json(&raw).unwrap();
        let mut x = [0.0; FEATURE_COUNT];
        x[0] = 2.0;
        let [_, p] = model.predict_proba(&x).unwrap();
        assert!((p - sigmoid(2.0)).abs() < 1e-12);
    }

    #[test]
    fn extreme_scores_stay_finite() {
        let model =
            LogisticRiskModel::from_json(&artifact(&[1000.0; FEATURE_COUNT], 0.0)).unwrap();
        let [p0, p1] = model.predict_proba(&[1000.0; FEATURE_COUNT]).unwrap();
        assert_eq!(p1, 1.0);
        assert_eq!(p0, 0.0);
        let [_, p1] = model.predict_proba(&[-1000.0; FEATURE_COUNT]).unwrap();
        assert_eq!(p1, 0.0);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = LogisticRiskModel::from_json(&artifact(&[0.0; 3], 0.0)).unwrap_err();
        assert!(err.to_string().contains("classifier.coefficients has 3 entries"));
    }

    #[test]
    fn mismatched_feature_names_are_rejected() {
        let raw = serde_json::json!({
            "features": ["age", "male"],
            "scaler": {"mean": vec![0.0; FEATURE_COUNT], "scale": vec![1.0; FEATURE_COUNT]},
            "classifier": {"coefficients": vec![0.0; FEATURE_COUNT], "intercept": 0.0}
        })
        .to_string();
        assert!(matches!(
            LogisticRiskModel::from_json(&raw),
            Err(RiskError::ArtifactFormat(_))
        ));
    }

    #[test]
    fn garbage_is_a_format_error() {
        assert!(matches!(
            LogisticRiskModel::from_json("not json"),
            Err(RiskError::ArtifactFormat(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LogisticRiskModel::load(Path::new("/nonexistent/heart_model.json")).unwrap_err();
        assert!(matches!(err, RiskError::ArtifactIo { .. }));
    }

    #[test]
    fn bundled_sample_model_loads() {
        let raw = include_str!("../../resources/models/heart_model.json");
        let model = LogisticRiskModel::from_json(raw).unwrap();

        let healthy = [0.0, 35.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 180.0, 115.0, 75.0, 22.0, 70.0, 80.0];
        let at_risk = [1.0, 68.0, 1.0, 1.0, 30.0, 1.0, 1.0, 1.0, 1.0, 300.0, 185.0, 110.0, 34.0, 95.0, 250.0];
        let [_, p_healthy] = model.predict_proba(&healthy).unwrap();
        let [_, p_at_risk] = model.predict_proba(&at_risk).unwrap();
        assert!(p_healthy < 0.25, "healthy p = {p_healthy}");
        assert!(p_at_risk > 0.75, "at-risk p = {p_at_risk}");
    }
}
