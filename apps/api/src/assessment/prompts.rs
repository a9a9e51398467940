// Prompt text and builders for the assessment call.

use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NOT_A_DOCTOR};
use crate::llm_client::ChatMessage;
use crate::models::intake::{RedFlag, SymptomIntake};

pub const ASSESSMENT_SYSTEM: &str = "You are a careful virtual health assistant. \
    Always provide a disclaimer that this is NOT medical advice or a diagnosis. \
    Ask and reason about symptoms safely. \
    Return a strict JSON object matching the schema provided.";

pub const SCHEMA_INSTRUCTIONS: &str = "Return ONLY valid JSON with keys: \
    summary (string), red_flags (array of strings), possible_conditions (array of objects), \
    urgency (one of 'self-care', 'see a doctor soon', 'emergency'), next_steps (array of strings), \
    recommended_specialists (array of strings).\n\
    Each possible condition object MUST have: name (string), confidence (number between 0 and 1), \
    uncertainty_notes (string or null), reasoning (string).";

/// System instruction, schema instruction, then the intake body.
pub fn build_assessment_messages(intake: &SymptomIntake) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!("{ASSESSMENT_SYSTEM} {NOT_A_DOCTOR}")),
        ChatMessage::user(format!("{SCHEMA_INSTRUCTIONS}\n{JSON_ONLY_INSTRUCTION}")),
        ChatMessage::user(build_intake_prompt(intake)),
    ]
}

/// Renders every intake field as `label: value` in a fixed order.
pub fn build_intake_prompt(intake: &SymptomIntake) -> String {
    let demo = &intake.demographics;
    let lines = [
        format!(
            "Chief complaint: {}",
            intake.chief_complaint().unwrap_or("unknown")
        ),
        format!("Duration: {}", or_unknown(intake.duration.as_deref())),
        format!(
            "Severity (0-10): {}",
            or_unknown(intake.severity_scale.map(|s| s.to_string()).as_deref())
        ),
        format!("Onset: {}", or_unknown(intake.onset.as_deref())),
        format!(
            "Fever: {}",
            match intake.fever {
                Some(true) => "yes",
                Some(false) => "no",
                None => "unknown",
            }
        ),
        format!(
            "Pain scale (0-10): {}",
            or_unknown(intake.pain_scale.map(|s| s.to_string()).as_deref())
        ),
        format!("Triggers: {}", or_none(&intake.triggers)),
        format!("Relevant history: {}", or_none(&intake.relevant_history)),
        format!("Meds: {}", or_none(&intake.meds)),
        format!("Allergies: {}", or_none(&intake.allergies)),
        format!(
            "Demographics: age={}, sex={}, child={}, pregnant={}, elderly={}, immunocompromised={}",
            or_unknown(demo.age.map(|a| a.to_string()).as_deref()),
            or_unknown(demo.sex.as_deref()),
            demo.is_child,
            demo.is_pregnant,
            demo.is_elderly,
            demo.is_immunocompromised
        ),
        format!("Red flag responses: {}", render_red_flags(intake)),
    ];
    lines.join("\n")
}

fn or_unknown(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("unknown")
}

fn or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn render_red_flags(intake: &SymptomIntake) -> String {
    let answered: Vec<String> = RedFlag::ALL
        .iter()
        .filter_map(|flag| {
            intake.red_flag_answers.get(flag).map(|answer| {
                let value = if answer.is_affirmative() { "yes" } else { "no" };
                format!("{}={}", flag.key(), value)
            })
        })
        .collect();
    if answered.is_empty() {
        "none".to_string()
    } else {
        answered.join(", ")
    }
}
