//! Markdown rendering of an assessment for the chat transcript.

use crate::assessment::schema::{AssessmentResponse, Urgency};

pub fn format_for_chat(assessment: &AssessmentResponse) -> String {
    let mut lines = vec![
        "# Assessment Summary\n".to_string(),
        format!("**Summary:** {}\n", assessment.summary),
    ];

    match assessment.urgency {
        Urgency::Emergency => {
            lines.push("## EMERGENCY".to_string());
            lines.push(
                "**Seek immediate medical care by calling your local emergency number.**\n"
                    .to_string(),
            );
        }
        Urgency::SeeDoctorSoon => {
            lines.push("## See a Doctor Soon".to_string());
            lines.push("Schedule an appointment with a healthcare professional soon.\n".to_string());
        }
        Urgency::SelfCare => {
            lines.push("## Self-Care Likely Appropriate".to_string());
            lines.push("Monitor your symptoms. Home care may be sufficient.\n".to_string());
        }
    }

    lines.push("## Red Flags".to_string());
    if assessment.red_flags.is_empty() {
        lines.push("- No red flags detected".to_string());
    } else {
        for flag in &assessment.red_flags {
            lines.push(format!("- {}", humanize(flag)));
        }
    }
    lines.push(String::new());

    lines.push("## Possible Conditions (NOT a diagnosis)".to_string());
    for condition in &assessment.possible_conditions {
        lines.push(format!(
            "**{}** (Confidence: {:.0}%)",
            condition.name,
            condition.confidence * 100.0
        ));
        lines.push(format!("- Why: {}", condition.reasoning));
        if let Some(notes) = &condition.uncertainty_notes {
            lines.push(format!("- Note: {notes}"));
        }
    }
    lines.push(String::new());

    lines.push("## Recommended Next Steps".to_string());
    for (i, step) in assessment.next_steps.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, step));
    }
    lines.push(String::new());

    lines.push("## Recommended Specialist(s)".to_string());
    if assessment.recommended_specialists.is_empty() {
        lines.push("No specific specialist recommended".to_string());
    } else {
        lines.push(assessment.recommended_specialists.join(", "));
    }
    lines.push(String::new());

    lines.push("---".to_string());
    lines.push(
        "**Reminder:** This is NOT medical advice. Always consult a licensed healthcare professional."
            .to_string(),
    );

    lines.join("\n")
}

/// "severe_abdominal_pain" → "Severe Abdominal Pain".
fn humanize(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
