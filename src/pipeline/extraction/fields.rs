//! Labeled clinical values pulled out of free report text.
//!
//! Every field has one pattern, applied to the lowercased text. The first
//! match wins; fields without a match are simply absent from the result.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The fifteen model inputs, declared in model feature order so that a
/// `BTreeMap<ClinicalField, _>` iterates in that order too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClinicalField {
    #[serde(rename = "male")]
    Male,
    #[serde(rename = "age")]
    Age,
    #[serde(rename = "education")]
    Education,
    #[serde(rename = "currentSmoker")]
    CurrentSmoker,
    #[serde(rename = "cigsPerDay")]
    CigsPerDay,
    #[serde(rename = "BPMeds")]
    BpMeds,
    #[serde(rename = "prevalentStroke")]
    PrevalentStroke,
    #[serde(rename = "prevalentHyp")]
    PrevalentHyp,
    #[serde(rename = "diabetes")]
    Diabetes,
    #[serde(rename = "totChol")]
    TotChol,
    #[serde(rename = "sysBP")]
    SysBp,
    #[serde(rename = "diaBP")]
    DiaBp,
    #[serde(rename = "BMI")]
    Bmi,
    #[serde(rename = "heartRate")]
    HeartRate,
    #[serde(rename = "glucose")]
    Glucose,
}

impl ClinicalField {
    pub const ALL: [ClinicalField; 15] = [
        Self::Male,
        Self::Age,
        Self::Education,
        Self::CurrentSmoker,
        Self::CigsPerDay,
        Self::BpMeds,
        Self::PrevalentStroke,
        Self::PrevalentHyp,
        Self::Diabetes,
        Self::TotChol,
        Self::SysBp,
        Self::DiaBp,
        Self::Bmi,
        Self::HeartRate,
        Self::Glucose,
    ];

    /// Wire name, also the model's feature name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Age => "age",
            Self::Education => "education",
            Self::CurrentSmoker => "currentSmoker",
            Self::CigsPerDay => "cigsPerDay",
            Self::BpMeds => "BPMeds",
            Self::PrevalentStroke => "prevalentStroke",
            Self::PrevalentHyp => "prevalentHyp",
            Self::Diabetes => "diabetes",
            Self::TotChol => "totChol",
            Self::SysBp => "sysBP",
            Self::DiaBp => "diaBP",
            Self::Bmi => "BMI",
            Self::HeartRate => "heartRate",
            Self::Glucose => "glucose",
        }
    }

    /// Yes/no questions, normalized to "1"/"0".
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            Self::CurrentSmoker
                | Self::BpMeds
                | Self::PrevalentStroke
                | Self::PrevalentHyp
                | Self::Diabetes
        )
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            Self::Male => &SEX_RE,
            Self::Age => &AGE_RE,
            Self::Education => &EDUCATION_RE,
            Self::CurrentSmoker => &SMOKER_RE,
            Self::CigsPerDay => &CIGS_RE,
            Self::BpMeds => &BP_MEDS_RE,
            Self::PrevalentStroke => &STROKE_RE,
            Self::PrevalentHyp => &HYPERTENSION_RE,
            Self::Diabetes => &DIABETES_RE,
            Self::TotChol => &CHOLESTEROL_RE,
            Self::SysBp => &SYSTOLIC_RE,
            Self::DiaBp => &DIASTOLIC_RE,
            Self::Bmi => &BMI_RE,
            Self::HeartRate => &HEART_RATE_RE,
            Self::Glucose => &GLUCOSE_RE,
        }
    }

    fn normalize(&self, captured: &str) -> String {
        match self {
            Self::Male => {
                let value = captured.trim();
                if value.contains("female") || value == "f" {
                    "0".into()
                } else {
                    "1".into()
                }
            }
            field if field.is_boolean() => {
                if captured.contains("yes") {
                    "1".into()
                } else {
                    "0".into()
                }
            }
            _ => captured.to_string(),
        }
    }
}

impl std::fmt::Display for ClinicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Patterns run on lowercased text.
static AGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"age[\s:]*(\d{1,3})").unwrap());
static SEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:sex|gender)[\s:]+(male|female|m|f)").unwrap());
static EDUCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:education|edu)[\s:]+(\d)").unwrap());
static SMOKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:smoker|smoking)[\s:]+(yes|no)").unwrap());
static CIGS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:cigs per day|cigs/day)[\s:]+(\d+)").unwrap());
static BP_MEDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:bp meds|medication)[\s:]+(yes|no)").unwrap());
static STROKE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"stroke[\s:]+(yes|no)").unwrap());
static HYPERTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:hypertension|prevalent hyp)[\s:]+(yes|no)").unwrap());
static DIABETES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"diabetes[\s:]+(yes|no)").unwrap());
static CHOLESTEROL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:total cholesterol|chol)[\s\(\)a-z/]*[:\s]+(\d{2,3})").unwrap()
});
static SYSTOLIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:systolic bp|sys bp)[\s\(\)a-z/]*[:\s]+(\d{2,3})").unwrap()
});
static DIASTOLIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:diastolic bp|dia bp)[\s\(\)a-z/]*[:\s]+(\d{2,3})").unwrap()
});
static BMI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:bmi|body mass index)[\s\(\)]*[:\s]+([\d]+\.?[\d]*)").unwrap()
});
static HEART_RATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:heart rate|hr)[\s\(\)a-z]*[:\s]+(\d{2,3})").unwrap());
static GLUCOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:glucose|blood sugar)[\s\(\)a-z/]*[:\s]+(\d{2,3})").unwrap()
});

/// Pull every recognizable field out of `text`.
pub fn extract_fields(text: &str) -> BTreeMap<ClinicalField, String> {
    let lowered = text.to_lowercase();
    let mut fields = BTreeMap::new();

    for field in ClinicalField::ALL {
        if let Some(value) = field
            .pattern()
            .captures(&lowered)
            .and_then(|caps| caps.get(1))
        {
            fields.insert(field, field.normalize(value.as_str()));
        }
    }

    tracing::debug!(found = fields.len(), "Clinical fields extracted");
    fields
}
