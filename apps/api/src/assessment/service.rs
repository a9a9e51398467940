//! Assessment use case.
//!
//! Flow: evaluate red flags → build messages → generate → parse/validate →
//!       (one repair round-trip on failure) → safety override.
//!
//! The red-flag verdict is computed before the model is called and can only
//! raise urgency, never lower it.

use thiserror::Error;
use tracing::{info, warn};

use crate::assessment::prompts::build_assessment_messages;
use crate::assessment::schema::{parse_assessment, AssessmentResponse, Urgency};
use crate::llm_client::prompts::REPAIR_INSTRUCTION;
use crate::llm_client::{ChatMessage, LanguageModel, LlmError};
use crate::models::intake::SymptomIntake;
use crate::safety::red_flags::{evaluate_red_flags, RedFlagsResult};

#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("language model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("model output was invalid after repair: {reason}")]
    InvalidOutput { reason: String },
}

/// Runs the full assessment for one intake. Calls the model at most twice.
pub async fn assess_intake(
    llm: &dyn LanguageModel,
    intake: &SymptomIntake,
) -> Result<AssessmentResponse, AssessmentError> {
    let verdict = evaluate_red_flags(intake);

    let messages = build_assessment_messages(intake);
    let raw = llm.generate(&messages).await?;

    let mut assessment = match parse_assessment(&raw) {
        Ok(assessment) => assessment,
        Err(e) => {
            warn!("Assessment JSON invalid: {e}. Attempting repair.");
            let repair_messages = build_repair_messages(&messages, &raw);
            let repaired = llm.generate(&repair_messages).await?;
            parse_assessment(&repaired).map_err(|e| AssessmentError::InvalidOutput {
                reason: e.to_string(),
            })?
        }
    };

    if apply_safety_override(&mut assessment, &verdict) {
        warn!(
            "Red-flag rules escalated urgency to emergency (triggered: {:?})",
            verdict.triggered
        );
    }

    info!(
        "Assessment produced: urgency={:?}, conditions={}",
        assessment.urgency,
        assessment.possible_conditions.len()
    );

    Ok(assessment)
}

/// Original messages, the invalid reply as the assistant's turn, then the
/// repair instruction.
fn build_repair_messages(messages: &[ChatMessage], invalid_output: &str) -> Vec<ChatMessage> {
    let mut repair = messages.to_vec();
    repair.push(ChatMessage::assistant(invalid_output));
    repair.push(ChatMessage::user(REPAIR_INSTRUCTION));
    repair
}

/// Forces urgency to emergency when the rule engine says so and merges the
/// triggered flags into `red_flags` without duplicates. Returns whether the
/// override changed the assessment.
pub fn apply_safety_override(assessment: &mut AssessmentResponse, verdict: &RedFlagsResult) -> bool {
    if !verdict.emergency || assessment.urgency == Urgency::Emergency {
        return false;
    }

    assessment.urgency = Urgency::Emergency;

    let mut merged: Vec<String> = Vec::with_capacity(assessment.red_flags.len());
    let incoming = assessment
        .red_flags
        .drain(..)
        .chain(verdict.triggered_keys().map(str::to_string));
    for flag in incoming {
        if !merged.contains(&flag) {
            merged.push(flag);
        }
    }
    assessment.red_flags = merged;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;
    use crate::llm_client::Role;
    use crate::models::intake::RedFlag;
    use serde_json::json;

    fn reply(urgency: &str, red_flags: &[&str]) -> String {
        json!({
            "summary": "Test summary",
            "red_flags": red_flags,
            "possible_conditions": [
                {"name": "Common cold", "confidence": 0.4, "uncertainty_notes": "Limited info", "reasoning": "Mild symptoms"}
            ],
            "urgency": urgency,
            "next_steps": ["Hydration"],
            "recommended_specialists": ["General Practitioner"]
        })
        .to_string()
    }

    fn cough_intake() -> SymptomIntake {
        let mut intake = SymptomIntake::new();
        intake.set_chief_complaint("cough");
        intake
    }

    #[tokio::test]
    async fn test_assess_returns_assessment() {
        let llm = ScriptedModel::replying([reply("self-care", &[])]);
        let assessment = assess_intake(&llm, &cough_intake()).await.unwrap();

        assert_eq!(assessment.summary, "Test summary");
        assert_eq!(assessment.urgency, Urgency::SelfCare);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_safety_override_escalates_to_emergency() {
        let mut intake = cough_intake();
        intake.red_flag_answers.insert(RedFlag::StrokeSigns, true.into());
        let llm = ScriptedModel::replying([reply("self-care", &["mild cough"])]);

        let assessment = assess_intake(&llm, &intake).await.unwrap();

        assert_eq!(assessment.urgency, Urgency::Emergency);
        assert!(assessment.red_flags.contains(&"stroke_signs".to_string()));
        assert!(assessment.red_flags.contains(&"mild cough".to_string()));
    }

    #[tokio::test]
    async fn test_safety_override_never_lowers_model_urgency() {
        let llm = ScriptedModel::replying([reply("emergency", &["model flag"])]);
        let assessment = assess_intake(&llm, &cough_intake()).await.unwrap();

        assert_eq!(assessment.urgency, Urgency::Emergency);
        assert_eq!(assessment.red_flags, vec!["model flag".to_string()]);
    }

    #[tokio::test]
    async fn test_no_override_without_emergency_verdict() {
        let mut intake = cough_intake();
        intake.red_flag_answers.insert(RedFlag::ChestPain, true.into());
        let llm = ScriptedModel::replying([reply("see a doctor soon", &[])]);

        let assessment = assess_intake(&llm, &intake).await.unwrap();
        assert_eq!(assessment.urgency, Urgency::SeeDoctorSoon);
        assert!(assessment.red_flags.is_empty());
    }

    #[tokio::test]
    async fn test_repair_path_succeeds_on_second_call() {
        let llm = ScriptedModel::replying(["not json".to_string(), reply("self-care", &[])]);

        let assessment = assess_intake(&llm, &cough_intake()).await.unwrap();
        assert_eq!(assessment.urgency, Urgency::SelfCare);
        assert_eq!(llm.call_count(), 2);

        let requests = llm.requests();
        let repair = &requests[1];
        assert_eq!(repair.len(), requests[0].len() + 2);
        assert_eq!(repair[repair.len() - 2].role, Role::Assistant);
        assert_eq!(repair[repair.len() - 2].content, "not json");
        assert_eq!(repair[repair.len() - 1].content, REPAIR_INSTRUCTION);
    }

    #[tokio::test]
    async fn test_second_invalid_output_is_fatal_without_third_call() {
        let llm = ScriptedModel::replying(["not json", "still not json", "{}"]);

        let result = assess_intake(&llm, &cough_intake()).await;
        assert!(matches!(result, Err(AssessmentError::InvalidOutput { .. })));
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_schema_violation_triggers_repair() {
        let llm = ScriptedModel::replying([reply("urgent", &[]), reply("self-care", &[])]);
        assert!(assess_intake(&llm, &cough_intake()).await.is_ok());
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_wrapped_json_parses_without_repair() {
        let llm = ScriptedModel::replying([format!("Sure! {} Thanks.", reply("self-care", &[]))]);
        assert!(assess_intake(&llm, &cough_intake()).await.is_ok());
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_port_failure_is_not_retried() {
        let llm = ScriptedModel::new();
        llm.push_error(LlmError::NotConfigured);
        llm.push_reply(reply("self-care", &[]));

        let result = assess_intake(&llm, &cough_intake()).await;
        assert!(matches!(
            result,
            Err(AssessmentError::Llm(LlmError::NotConfigured))
        ));
        assert_eq!(llm.call_count(), 1);
    }

    #[test]
    fn test_override_deduplicates_flags() {
        let mut assessment: AssessmentResponse =
            serde_json::from_str(&reply("self-care", &["chest_pain", "chest_pain"])).unwrap();
        let verdict = RedFlagsResult {
            triggered: vec![RedFlag::ChestPain, RedFlag::Fainting],
            emergency: true,
        };

        assert!(apply_safety_override(&mut assessment, &verdict));
        assert_eq!(
            assessment.red_flags,
            vec!["chest_pain".to_string(), "fainting".to_string()]
        );
    }
}
