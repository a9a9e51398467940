//! Intake record collected over a conversation.
//!
//! Bounded fields are enforced when they are assigned: scales clamp into
//! [0, 10], ages outside [0, 120] are refused, and a blank chief complaint
//! is stored as unset.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Bounded scalars
// ────────────────────────────────────────────────────────────────────────────

/// A 0–10 rating. Out-of-range input is clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Scale(u8);

impl Scale {
    pub const MAX: u8 = 10;

    pub fn clamped(value: i64) -> Self {
        Scale(value.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<i64> for Scale {
    fn from(value: i64) -> Self {
        Scale::clamped(value)
    }
}

impl From<Scale> for u8 {
    fn from(scale: Scale) -> Self {
        scale.0
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Patient age in whole years, always within [0, 120].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u8")]
pub struct Age(u8);

impl Age {
    pub const MAX: u32 = 120;

    pub fn new(years: u32) -> Option<Self> {
        (years <= Self::MAX).then_some(Age(years as u8))
    }

    pub fn years(self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for Age {
    type Error = String;

    fn try_from(years: u32) -> Result<Self, Self::Error> {
        Age::new(years).ok_or_else(|| format!("age {years} is outside 0-{}", Age::MAX))
    }
}

impl From<Age> for u8 {
    fn from(age: Age) -> Self {
        age.0
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Red-flag keys and answers
// ────────────────────────────────────────────────────────────────────────────

/// The fixed set of safety questions asked during every interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlag {
    ChestPain,
    DifficultyBreathing,
    Fainting,
    SevereBleeding,
    StrokeSigns,
    SuicidalThoughts,
    SevereAbdominalPain,
    HighFever,
}

impl RedFlag {
    /// Every red flag, in the order they are asked.
    pub const ALL: [RedFlag; 8] = [
        RedFlag::ChestPain,
        RedFlag::DifficultyBreathing,
        RedFlag::Fainting,
        RedFlag::SevereBleeding,
        RedFlag::StrokeSigns,
        RedFlag::SuicidalThoughts,
        RedFlag::SevereAbdominalPain,
        RedFlag::HighFever,
    ];

    pub fn key(self) -> &'static str {
        match self {
            RedFlag::ChestPain => "chest_pain",
            RedFlag::DifficultyBreathing => "difficulty_breathing",
            RedFlag::Fainting => "fainting",
            RedFlag::SevereBleeding => "severe_bleeding",
            RedFlag::StrokeSigns => "stroke_signs",
            RedFlag::SuicidalThoughts => "suicidal_thoughts",
            RedFlag::SevereAbdominalPain => "severe_abdominal_pain",
            RedFlag::HighFever => "high_fever",
        }
    }

    pub fn question(self) -> &'static str {
        match self {
            RedFlag::ChestPain => "Are you experiencing chest pain?",
            RedFlag::DifficultyBreathing => "Any difficulty breathing or shortness of breath?",
            RedFlag::Fainting => "Have you fainted or felt near-fainting?",
            RedFlag::SevereBleeding => "Any severe or uncontrolled bleeding?",
            RedFlag::StrokeSigns => {
                "Any signs of stroke (face drooping, arm weakness, speech difficulty)?"
            }
            RedFlag::SuicidalThoughts => "Any suicidal thoughts or intent?",
            RedFlag::SevereAbdominalPain => "Severe abdominal pain?",
            RedFlag::HighFever => "High fever (>39°C / 102°F)?",
        }
    }
}

impl fmt::Display for RedFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An answer to a red-flag question: either already a boolean, or the raw
/// text the patient typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RedFlagAnswer {
    Flag(bool),
    Text(String),
}

impl From<bool> for RedFlagAnswer {
    fn from(value: bool) -> Self {
        RedFlagAnswer::Flag(value)
    }
}

impl From<&str> for RedFlagAnswer {
    fn from(value: &str) -> Self {
        RedFlagAnswer::Text(value.to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Demographics and intake
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Demographics {
    pub age: Option<Age>,
    /// Male / Female / Other / Prefer not to say, as the patient phrased it.
    pub sex: Option<String>,
    pub is_child: bool,
    pub is_pregnant: bool,
    pub is_elderly: bool,
    pub is_immunocompromised: bool,
}

impl Demographics {
    /// Child, pregnant, elderly, or immunocompromised.
    pub fn is_vulnerable(&self) -> bool {
        self.is_child || self.is_pregnant || self.is_elderly || self.is_immunocompromised
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymptomIntake {
    #[serde(deserialize_with = "deserialize_complaint")]
    chief_complaint: Option<String>,
    pub duration: Option<String>,
    pub severity_scale: Option<Scale>,
    pub onset: Option<String>,
    pub fever: Option<bool>,
    pub pain_scale: Option<Scale>,
    pub triggers: Vec<String>,
    pub relevant_history: Vec<String>,
    pub meds: Vec<String>,
    pub allergies: Vec<String>,
    pub demographics: Demographics,
    pub red_flag_answers: HashMap<RedFlag, RedFlagAnswer>,
}

impl SymptomIntake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chief_complaint(&self) -> Option<&str> {
        self.chief_complaint.as_deref()
    }

    /// Stores the trimmed complaint; blank text leaves the complaint unset.
    pub fn set_chief_complaint(&mut self, text: &str) {
        self.chief_complaint = normalize_complaint(text);
    }

    pub fn set_severity(&mut self, value: i64) {
        self.severity_scale = Some(Scale::clamped(value));
    }

    pub fn set_pain(&mut self, value: i64) {
        self.pain_scale = Some(Scale::clamped(value));
    }

    /// Records the age if it is within range. Returns whether it was kept.
    pub fn set_age(&mut self, years: u32) -> bool {
        match Age::new(years) {
            Some(age) => {
                self.demographics.age = Some(age);
                self.demographics.is_child = age.years() < 18;
                true
            }
            None => false,
        }
    }

    /// Chief complaint, duration and severity are all known.
    pub fn has_essentials(&self) -> bool {
        self.chief_complaint.is_some() && self.duration.is_some() && self.severity_scale.is_some()
    }

    pub fn is_pain_related(&self) -> bool {
        const PAIN_KEYWORDS: &[&str] = &["pain", "ache", "hurt", "sore", "cramp", "tender"];
        let complaint = self.chief_complaint().unwrap_or_default().to_lowercase();
        PAIN_KEYWORDS.iter().any(|kw| complaint.contains(kw))
    }
}

fn normalize_complaint(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn deserialize_complaint<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(normalize_complaint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_clamps_out_of_range_values() {
        for (input, expected) in [(-5, 0), (0, 0), (7, 7), (10, 10), (11, 10), (710, 10)] {
            assert_eq!(Scale::clamped(input).value(), expected, "input {input}");
        }
    }

    #[test]
    fn test_severity_and_pain_setters_clamp() {
        let mut intake = SymptomIntake::new();
        intake.set_severity(42);
        intake.set_pain(-3);
        assert_eq!(intake.severity_scale.map(Scale::value), Some(10));
        assert_eq!(intake.pain_scale.map(Scale::value), Some(0));
    }

    #[test]
    fn test_scale_deserializes_with_clamp() {
        let intake: SymptomIntake =
            serde_json::from_str(r#"{"severity_scale": 15, "pain_scale": 4}"#).unwrap();
        assert_eq!(intake.severity_scale.map(Scale::value), Some(10));
        assert_eq!(intake.pain_scale.map(Scale::value), Some(4));
    }

    #[test]
    fn test_blank_chief_complaint_is_unset() {
        let mut intake = SymptomIntake::new();
        intake.set_chief_complaint("   \t ");
        assert_eq!(intake.chief_complaint(), None);

        intake.set_chief_complaint("  headache ");
        assert_eq!(intake.chief_complaint(), Some("headache"));
    }

    #[test]
    fn test_blank_chief_complaint_is_unset_when_deserialized() {
        let intake: SymptomIntake = serde_json::from_str(r#"{"chief_complaint": "  "}"#).unwrap();
        assert_eq!(intake.chief_complaint(), None);
    }

    #[test]
    fn test_age_bounds() {
        let mut intake = SymptomIntake::new();
        assert!(!intake.set_age(121));
        assert_eq!(intake.demographics.age, None);

        assert!(intake.set_age(120));
        assert_eq!(intake.demographics.age.map(Age::years), Some(120));
        assert!(serde_json::from_str::<Demographics>(r#"{"age": 130}"#).is_err());
    }

    #[test]
    fn test_age_under_eighteen_marks_child() {
        let mut intake = SymptomIntake::new();
        intake.set_age(9);
        assert!(intake.demographics.is_child);
        assert!(intake.demographics.is_vulnerable());

        intake.set_age(40);
        assert!(!intake.demographics.is_child);
    }

    #[test]
    fn test_pain_related_keywords() {
        let mut intake = SymptomIntake::new();
        intake.set_chief_complaint("My knee HURTS");
        assert!(intake.is_pain_related());

        intake.set_chief_complaint("I have a cough");
        assert!(!intake.is_pain_related());
    }

    #[test]
    fn test_red_flag_answers_accept_bool_or_text() {
        let intake: SymptomIntake = serde_json::from_str(
            r#"{"red_flag_answers": {"chest_pain": true, "fainting": "Yes"}}"#,
        )
        .unwrap();
        assert_eq!(
            intake.red_flag_answers.get(&RedFlag::ChestPain),
            Some(&RedFlagAnswer::Flag(true))
        );
        assert_eq!(
            intake.red_flag_answers.get(&RedFlag::Fainting),
            Some(&RedFlagAnswer::Text("Yes".to_string()))
        );
    }

    #[test]
    fn test_unknown_red_flag_key_is_rejected() {
        let result: Result<SymptomIntake, _> =
            serde_json::from_str(r#"{"red_flag_answers": {"headache": true}}"#);
        assert!(result.is_err());
    }
}
