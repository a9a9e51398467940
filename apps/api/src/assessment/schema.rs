//! Output schema for assessments. An `AssessmentResponse` only exists once
//! the model's JSON has decoded and every bounded field has been checked.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm_client::extract_json_object;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    #[serde(rename = "self-care")]
    SelfCare,
    #[serde(rename = "see a doctor soon")]
    SeeDoctorSoon,
    #[serde(rename = "emergency")]
    Emergency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionHypothesis {
    pub name: String,
    /// 0.0 – 1.0, as reported by the model. Not independently verified.
    pub confidence: f64,
    #[serde(default)]
    pub uncertainty_notes: Option<String>,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResponse {
    pub summary: String,
    pub red_flags: Vec<String>,
    pub possible_conditions: Vec<ConditionHypothesis>,
    pub urgency: Urgency,
    pub next_steps: Vec<String>,
    pub recommended_specialists: Vec<String>,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid assessment JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("condition '{name}' has confidence {confidence} outside [0, 1]")]
    ConfidenceOutOfRange { name: String, confidence: f64 },
}

impl AssessmentResponse {
    pub fn validate(&self) -> Result<(), SchemaError> {
        for condition in &self.possible_conditions {
            if !(0.0..=1.0).contains(&condition.confidence) {
                return Err(SchemaError::ConfidenceOutOfRange {
                    name: condition.name.clone(),
                    confidence: condition.confidence,
                });
            }
        }
        Ok(())
    }
}

/// Extracts the outermost JSON object from raw model text, decodes it and
/// validates it.
pub fn parse_assessment(raw: &str) -> Result<AssessmentResponse, SchemaError> {
    let json = extract_json_object(raw);
    let assessment: AssessmentResponse = serde_json::from_str(json)?;
    assessment.validate()?;
    Ok(assessment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> serde_json::Value {
        json!({
            "summary": "Likely a viral infection.",
            "red_flags": [],
            "possible_conditions": [
                {"name": "Common cold", "confidence": 0.4, "uncertainty_notes": "Limited info", "reasoning": "Mild symptoms"},
                {"name": "Influenza", "confidence": 0.2, "reasoning": "Seasonal"}
            ],
            "urgency": "see a doctor soon",
            "next_steps": ["Rest", "Hydration"],
            "recommended_specialists": ["General Practitioner"]
        })
    }

    #[test]
    fn test_parse_valid_payload() {
        let assessment = parse_assessment(&valid_payload().to_string()).unwrap();
        assert_eq!(assessment.urgency, Urgency::SeeDoctorSoon);
        assert_eq!(assessment.possible_conditions.len(), 2);
        assert_eq!(assessment.possible_conditions[1].uncertainty_notes, None);
    }

    #[test]
    fn test_parse_tolerates_surrounding_text() {
        let raw = format!("Sure! {} Thanks.", valid_payload());
        assert!(parse_assessment(&raw).is_ok());
    }

    #[test]
    fn test_null_uncertainty_notes_is_accepted() {
        let mut payload = valid_payload();
        payload["possible_conditions"][0]["uncertainty_notes"] = json!(null);
        assert!(parse_assessment(&payload.to_string()).is_ok());
    }

    #[test]
    fn test_unknown_urgency_is_rejected() {
        let mut payload = valid_payload();
        payload["urgency"] = json!("urgent");
        assert!(matches!(
            parse_assessment(&payload.to_string()),
            Err(SchemaError::Json(_))
        ));
    }

    #[test]
    fn test_confidence_above_one_is_rejected() {
        let mut payload = valid_payload();
        payload["possible_conditions"][0]["confidence"] = json!(1.5);
        assert!(matches!(
            parse_assessment(&payload.to_string()),
            Err(SchemaError::ConfidenceOutOfRange { .. })
        ));
    }

    #[test]
    fn test_missing_reasoning_is_rejected() {
        let mut payload = valid_payload();
        payload["possible_conditions"][0]
            .as_object_mut()
            .unwrap()
            .remove("reasoning");
        assert!(parse_assessment(&payload.to_string()).is_err());
    }

    #[test]
    fn test_wrong_field_type_is_rejected() {
        let mut payload = valid_payload();
        payload["next_steps"] = json!("Rest");
        assert!(parse_assessment(&payload.to_string()).is_err());
    }

    #[test]
    fn test_not_json_is_rejected() {
        assert!(parse_assessment("not json").is_err());
    }
}
