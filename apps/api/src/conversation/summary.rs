//! Markdown summary of the intake, shown for confirmation before assessment.

use crate::models::intake::{RedFlag, SymptomIntake};

pub fn render_intake_summary(intake: &SymptomIntake) -> String {
    let mut lines = Vec::new();

    if let Some(complaint) = intake.chief_complaint() {
        lines.push(format!("**Chief Complaint:** {complaint}"));
    }
    if let Some(duration) = &intake.duration {
        lines.push(format!("**Duration:** {duration}"));
    }
    if let Some(severity) = intake.severity_scale {
        lines.push(format!("**Severity:** {severity}/10"));
    }
    if let Some(onset) = &intake.onset {
        lines.push(format!("**Onset:** {onset}"));
    }
    if let Some(fever) = intake.fever {
        lines.push(format!("**Fever:** {}", if fever { "Yes" } else { "No" }));
    }
    if let Some(pain) = intake.pain_scale {
        lines.push(format!("**Pain:** {pain}/10"));
    }

    for (label, items) in [
        ("Triggers", &intake.triggers),
        ("Medical History", &intake.relevant_history),
        ("Medications", &intake.meds),
        ("Allergies", &intake.allergies),
    ] {
        if !items.is_empty() {
            lines.push(format!("**{label}:** {}", items.join(", ")));
        }
    }

    let demo = &intake.demographics;
    let mut demo_lines = Vec::new();
    if let Some(age) = demo.age {
        demo_lines.push(format!("Age: {age}"));
    }
    if demo.is_pregnant {
        demo_lines.push("Pregnant: Yes".to_string());
    }
    if demo.is_elderly {
        demo_lines.push("Age ≥65: Yes".to_string());
    }
    if demo.is_immunocompromised {
        demo_lines.push("Immunocompromised: Yes".to_string());
    }
    if !demo_lines.is_empty() {
        lines.push(format!("**Demographics:** {}", demo_lines.join(", ")));
    }

    let flagged: Vec<&str> = RedFlag::ALL
        .iter()
        .filter(|flag| {
            intake
                .red_flag_answers
                .get(*flag)
                .is_some_and(|answer| answer.is_affirmative())
        })
        .map(|flag| flag.key())
        .collect();
    if !flagged.is_empty() {
        lines.push(format!("**Red Flags:** {}", flagged.join(", ")));
    }

    lines.join("\n")
}
