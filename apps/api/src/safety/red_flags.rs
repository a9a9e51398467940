//! Red-flag rule engine.
//!
//! Pure function of the intake's red-flag answers and demographics. The
//! verdict is recomputed on demand and never persisted.

use serde::{Deserialize, Serialize};

use crate::extract::is_yes;
use crate::models::intake::{RedFlag, RedFlagAnswer, SymptomIntake};

/// Any one of these is an emergency on its own.
const ALWAYS_EMERGENCY: &[RedFlag] = &[
    RedFlag::SuicidalThoughts,
    RedFlag::StrokeSigns,
    RedFlag::SevereBleeding,
];

/// Two of these, or one in a vulnerable patient, is an emergency.
const SEVERE_LIKE: &[RedFlag] = &[
    RedFlag::ChestPain,
    RedFlag::DifficultyBreathing,
    RedFlag::Fainting,
    RedFlag::SevereAbdominalPain,
    RedFlag::HighFever,
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedFlagsResult {
    /// Triggered flags, in question order.
    pub triggered: Vec<RedFlag>,
    pub emergency: bool,
}

impl RedFlagsResult {
    pub fn triggered_keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.triggered.iter().map(|flag| flag.key())
    }
}

impl RedFlagAnswer {
    /// Booleans count as given; text counts only if it reads as "yes".
    pub fn is_affirmative(&self) -> bool {
        match self {
            RedFlagAnswer::Flag(value) => *value,
            RedFlagAnswer::Text(text) => is_yes(text),
        }
    }
}

pub fn evaluate_red_flags(intake: &SymptomIntake) -> RedFlagsResult {
    let triggered: Vec<RedFlag> = RedFlag::ALL
        .into_iter()
        .filter(|flag| {
            intake
                .red_flag_answers
                .get(flag)
                .is_some_and(RedFlagAnswer::is_affirmative)
        })
        .collect();

    let mut emergency = triggered.iter().any(|f| ALWAYS_EMERGENCY.contains(f));
    if !emergency {
        let severe_count = triggered.iter().filter(|f| SEVERE_LIKE.contains(f)).count();
        let vulnerable = intake.demographics.is_vulnerable();
        emergency = severe_count >= 2 || (severe_count >= 1 && vulnerable);
    }

    RedFlagsResult {
        triggered,
        emergency,
    }
}
