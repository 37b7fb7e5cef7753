use std::collections::BTreeMap;

use serde::Serialize;

/// Systolic pressure above which a high-risk result calls out blood pressure.
pub const ELEVATED_SYSTOLIC_MMHG: f64 = 140.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFactor {
    pub title: String,
    pub description: String,
}

/// Human-readable explanation shown next to a result. Text uses `**bold**`
/// markup that the client renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub insights_text: String,
    pub precautions: Vec<String>,
    pub risk_factors: Vec<RiskFactor>,
}

pub fn explain(risk_level: i64, inputs: &BTreeMap<String, String>) -> Insights {
    if risk_level > 50 {
        let mut risk_factors = Vec::new();
        let systolic = inputs
            .get("sysBP")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        if systolic > ELEVATED_SYSTOLIC_MMHG {
            let shown = inputs.get("sysBP").map(String::as_str).unwrap_or_default();
            risk_factors.push(RiskFactor {
                title: "High Blood Pressure".into(),
                description: format!("BP of {shown} mmHg is elevated."),
            });
        }
        Insights {
            insights_text: "Your result suggests a **high probability** of heart disease.".into(),
            precautions: vec!["**Schedule an appointment** with your doctor.".into()],
            risk_factors,
        }
    } else {
        Insights {
            insights_text: "Your result indicates a **low probability** of heart disease.".into(),
            precautions: vec![
                "**Continue with your healthy lifestyle** and regular check-ups.".into(),
            ],
            risk_factors: Vec::new(),
        }
    }
}
