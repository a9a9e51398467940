//! Scripted interview: a fixed-order question sequencer.
//!
//! Stage graph (acyclic apart from the summary rejection rewind):
//! Initial → ChiefComplaint → RedFlagCheck → Demographics → Summary →
//! Assessment → Results.
//!
//! `current_question` routes the next answer to its field; `visited` keeps
//! questions from being asked twice.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::conversation::summary::render_intake_summary;
use crate::conversation::{ConversationDriver, DriverReply, COMPLETED_MESSAGE, OPENING_QUESTION};
use crate::extract::{extract_digits, is_confirmation, is_yes, parse_yes_no, split_list};
use crate::llm_client::ChatMessage;
use crate::models::intake::{RedFlag, RedFlagAnswer, SymptomIntake};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Initial,
    /// Chief complaint received; follow-up questions are asked in this stage.
    ChiefComplaint,
    RedFlagCheck,
    Demographics,
    Summary,
    Assessment,
    Results,
}

impl Stage {
    /// Transition table: the stage entered when this one is finished.
    pub fn next(self) -> Stage {
        match self {
            Stage::Initial => Stage::ChiefComplaint,
            Stage::ChiefComplaint => Stage::RedFlagCheck,
            Stage::RedFlagCheck => Stage::Demographics,
            Stage::Demographics => Stage::Summary,
            Stage::Summary => Stage::Assessment,
            Stage::Assessment | Stage::Results => Stage::Results,
        }
    }

    /// Questions asked in this stage, in order.
    pub fn questions(self) -> &'static [QuestionKey] {
        match self {
            Stage::ChiefComplaint => FOLLOW_UP_QUESTIONS,
            Stage::RedFlagCheck => RED_FLAG_QUESTIONS,
            Stage::Demographics => DEMOGRAPHIC_QUESTIONS,
            _ => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Initial => "initial",
            Stage::ChiefComplaint => "chief_complaint",
            Stage::RedFlagCheck => "red_flag_check",
            Stage::Demographics => "demographics",
            Stage::Summary => "summary",
            Stage::Assessment => "assessment",
            Stage::Results => "results",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKey {
    ChiefComplaint,
    Duration,
    Severity,
    Onset,
    Fever,
    Pain,
    Triggers,
    History,
    Meds,
    Allergies,
    RedFlag(RedFlag),
    Age,
    Pregnancy,
    Elderly,
    Immunocompromised,
}

const FOLLOW_UP_QUESTIONS: &[QuestionKey] = &[
    QuestionKey::Duration,
    QuestionKey::Severity,
    QuestionKey::Onset,
    QuestionKey::Fever,
    QuestionKey::Pain,
    QuestionKey::Triggers,
    QuestionKey::History,
    QuestionKey::Meds,
    QuestionKey::Allergies,
];

const RED_FLAG_QUESTIONS: &[QuestionKey] = &[
    QuestionKey::RedFlag(RedFlag::ChestPain),
    QuestionKey::RedFlag(RedFlag::DifficultyBreathing),
    QuestionKey::RedFlag(RedFlag::Fainting),
    QuestionKey::RedFlag(RedFlag::SevereBleeding),
    QuestionKey::RedFlag(RedFlag::StrokeSigns),
    QuestionKey::RedFlag(RedFlag::SuicidalThoughts),
    QuestionKey::RedFlag(RedFlag::SevereAbdominalPain),
    QuestionKey::RedFlag(RedFlag::HighFever),
];

const DEMOGRAPHIC_QUESTIONS: &[QuestionKey] = &[
    QuestionKey::Age,
    QuestionKey::Pregnancy,
    QuestionKey::Elderly,
    QuestionKey::Immunocompromised,
];

impl QuestionKey {
    pub fn prompt(self) -> String {
        let text = match self {
            QuestionKey::ChiefComplaint => OPENING_QUESTION,
            QuestionKey::Duration => "How long have you had this symptom? (e.g., 2 days, 1 week)",
            QuestionKey::Severity => {
                "On a scale of 0-10, how severe is this symptom? (0 = none, 10 = worst possible)"
            }
            QuestionKey::Onset => "Did this start suddenly or gradually?",
            QuestionKey::Fever => "Do you have a fever?",
            QuestionKey::Pain => "On a scale of 0-10, how would you rate the pain?",
            QuestionKey::Triggers => {
                "Is there anything that makes it better or worse? (e.g., movement, position, food)"
            }
            QuestionKey::History => {
                "Do you have any relevant medical history? (e.g., diabetes, heart disease, asthma)"
            }
            QuestionKey::Meds => "Are you taking any medications?",
            QuestionKey::Allergies => "Do you have any known allergies?",
            QuestionKey::RedFlag(flag) => {
                return format!("Quick safety check: {} (yes/no)", flag.question());
            }
            QuestionKey::Age => "How old are you?",
            QuestionKey::Pregnancy => "Are you pregnant or could you be pregnant?",
            QuestionKey::Elderly => "Are you 65 or older?",
            QuestionKey::Immunocompromised => {
                "Do you have any immune system conditions? (HIV, cancer treatment, organ transplant, etc.)"
            }
        };
        text.to_string()
    }

    /// The pain scale is only asked for pain-related complaints.
    fn applies_to(self, intake: &SymptomIntake) -> bool {
        match self {
            QuestionKey::Pain => intake.is_pain_related(),
            _ => true,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// State machine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct IntakeStateMachine {
    stage: Stage,
    visited: HashSet<QuestionKey>,
    current_question: Option<QuestionKey>,
}

impl Default for IntakeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeStateMachine {
    pub fn new() -> Self {
        Self {
            stage: Stage::Initial,
            visited: HashSet::new(),
            current_question: None,
        }
    }

    pub fn current_stage(&self) -> Stage {
        self.stage
    }

    pub fn visited(&self) -> &HashSet<QuestionKey> {
        &self.visited
    }

    pub fn current_question(&self) -> Option<QuestionKey> {
        self.current_question
    }

    /// Next question for the current stage. Sets `current_question`; when a
    /// stage has nothing left to ask it advances and tries the next stage.
    /// Never touches `visited`, so asking twice yields the same question.
    pub fn get_next_question(&mut self, intake: &SymptomIntake) -> String {
        loop {
            match self.stage {
                Stage::Initial => return OPENING_QUESTION.to_string(),
                Stage::Summary => {
                    return format!(
                        "Let me confirm what I've gathered:\n\n{}\n\nDoes this sound correct?",
                        render_intake_summary(intake)
                    );
                }
                Stage::Assessment => return "Analyzing your symptoms...".to_string(),
                Stage::Results => return COMPLETED_MESSAGE.to_string(),
                stage => {
                    let pending = stage
                        .questions()
                        .iter()
                        .copied()
                        .find(|key| !self.visited.contains(key) && key.applies_to(intake));
                    match pending {
                        Some(key) => {
                            self.current_question = Some(key);
                            return key.prompt();
                        }
                        None => {
                            debug!("Stage {} complete", stage.as_str());
                            self.stage = stage.next();
                        }
                    }
                }
            }
        }
    }

    /// Routes one answer to the field implied by the current question.
    pub fn process_user_response(&mut self, intake: &mut SymptomIntake, user_message: &str) {
        match self.stage {
            Stage::Initial => {
                intake.set_chief_complaint(user_message);
                self.visited.insert(QuestionKey::ChiefComplaint);
                self.stage = Stage::ChiefComplaint;
            }
            Stage::Summary => {
                if is_confirmation(user_message) {
                    self.stage = Stage::Assessment;
                } else {
                    info!("Patient rejected the intake summary; asking follow-ups again");
                    self.visited = HashSet::from([QuestionKey::ChiefComplaint]);
                    self.current_question = None;
                    self.stage = Stage::ChiefComplaint;
                }
            }
            Stage::Assessment | Stage::Results => {
                debug!("Ignoring message received after intake completed");
            }
            stage => {
                let Some(key) = self.current_question else {
                    debug!("No question pending; ignoring message");
                    return;
                };
                if !stage.questions().contains(&key) {
                    debug!("Pending question does not belong to stage {}", stage.as_str());
                    return;
                }
                apply_answer(key, intake, user_message);
                self.visited.insert(key);
            }
        }
    }

    pub fn is_ready_for_assessment(&self) -> bool {
        self.stage == Stage::Assessment
    }
}

/// Per-field coercion. Answers that cannot be read leave the field as it was.
fn apply_answer(key: QuestionKey, intake: &mut SymptomIntake, text: &str) {
    let trimmed = text.trim();
    match key {
        QuestionKey::ChiefComplaint => intake.set_chief_complaint(text),
        QuestionKey::Duration => intake.duration = non_blank(trimmed),
        QuestionKey::Onset => intake.onset = non_blank(trimmed),
        QuestionKey::Severity => match extract_digits(text) {
            Some(value) => intake.set_severity(value as i64),
            None => debug!("Severity answer had no digits; leaving unset"),
        },
        QuestionKey::Pain => match extract_digits(text) {
            Some(value) => intake.set_pain(value as i64),
            None => debug!("Pain answer had no digits; leaving unset"),
        },
        QuestionKey::Fever => intake.fever = parse_yes_no(text),
        QuestionKey::Triggers => replace_list(&mut intake.triggers, text),
        QuestionKey::History => replace_list(&mut intake.relevant_history, text),
        QuestionKey::Meds => replace_list(&mut intake.meds, text),
        QuestionKey::Allergies => replace_list(&mut intake.allergies, text),
        QuestionKey::RedFlag(flag) => {
            intake
                .red_flag_answers
                .insert(flag, RedFlagAnswer::Flag(is_yes(text)));
        }
        QuestionKey::Age => {
            let kept = extract_digits(text).is_some_and(|years| intake.set_age(years));
            if !kept {
                debug!("Age answer unreadable or out of range; leaving unset");
            }
        }
        QuestionKey::Pregnancy => intake.demographics.is_pregnant = is_yes(text),
        QuestionKey::Elderly => intake.demographics.is_elderly = is_yes(text),
        QuestionKey::Immunocompromised => {
            intake.demographics.is_immunocompromised = is_yes(text)
        }
    }
}

fn non_blank(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

fn replace_list(field: &mut Vec<String>, text: &str) {
    if let Some(items) = split_list(text) {
        *field = items;
    }
}

#[async_trait]
impl ConversationDriver for IntakeStateMachine {
    fn opening_question(&mut self, intake: &SymptomIntake) -> String {
        self.get_next_question(intake)
    }

    async fn respond(
        &mut self,
        intake: &mut SymptomIntake,
        _history: &[ChatMessage],
        user_message: &str,
    ) -> DriverReply {
        self.process_user_response(intake, user_message);
        let question = self.get_next_question(intake);
        if self.is_ready_for_assessment() {
            DriverReply::Ready(question)
        } else {
            DriverReply::Ask(question)
        }
    }

    fn is_ready(&self) -> bool {
        self.is_ready_for_assessment()
    }

    fn mark_complete(&mut self) {
        if self.stage == Stage::Assessment {
            self.stage = Stage::Results;
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn stage(&self) -> &'static str {
        self.stage.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::intake::Scale;

    fn started(complaint: &str) -> (IntakeStateMachine, SymptomIntake) {
        let mut machine = IntakeStateMachine::new();
        let mut intake = SymptomIntake::new();
        machine.get_next_question(&intake);
        machine.process_user_response(&mut intake, complaint);
        (machine, intake)
    }

    fn answer(machine: &mut IntakeStateMachine, intake: &mut SymptomIntake, text: &str) -> String {
        let question = machine.get_next_question(intake);
        machine.process_user_response(intake, text);
        question
    }

    /// Answers every question with `text` until the summary is reached.
    fn run_to_summary(machine: &mut IntakeStateMachine, intake: &mut SymptomIntake, text: &str) {
        for _ in 0..64 {
            machine.get_next_question(intake);
            if machine.current_stage() == Stage::Summary {
                return;
            }
            machine.process_user_response(intake, text);
        }
        panic!("summary stage never reached");
    }

    #[test]
    fn test_initial_question_asks_for_complaint() {
        let mut machine = IntakeStateMachine::new();
        assert_eq!(
            machine.get_next_question(&SymptomIntake::new()),
            OPENING_QUESTION
        );
        assert_eq!(machine.current_stage(), Stage::Initial);
    }

    #[test]
    fn test_first_response_sets_chief_complaint() {
        let (machine, intake) = started("  my knee hurts ");
        assert_eq!(intake.chief_complaint(), Some("my knee hurts"));
        assert_eq!(machine.current_stage(), Stage::ChiefComplaint);
        assert!(machine.visited().contains(&QuestionKey::ChiefComplaint));
    }

    #[test]
    fn test_pain_complaint_includes_pain_question() {
        let (mut machine, mut intake) = started("my knee hurts");
        let mut keys = Vec::new();
        for text in ["2 days", "6", "suddenly", "no", "7"] {
            machine.get_next_question(&intake);
            keys.push(machine.current_question().unwrap());
            machine.process_user_response(&mut intake, text);
        }
        assert_eq!(
            keys,
            vec![
                QuestionKey::Duration,
                QuestionKey::Severity,
                QuestionKey::Onset,
                QuestionKey::Fever,
                QuestionKey::Pain,
            ]
        );
        assert_eq!(intake.pain_scale, Some(Scale::clamped(7)));
    }

    #[test]
    fn test_non_pain_complaint_skips_pain_question() {
        let (mut machine, mut intake) = started("I have a cough");
        let mut keys = Vec::new();
        for _ in 0..FOLLOW_UP_QUESTIONS.len() - 1 {
            machine.get_next_question(&intake);
            keys.push(machine.current_question().unwrap());
            machine.process_user_response(&mut intake, "none");
        }
        assert!(!keys.contains(&QuestionKey::Pain));
        assert_eq!(keys[4], QuestionKey::Triggers);

        machine.get_next_question(&intake);
        assert_eq!(machine.current_stage(), Stage::RedFlagCheck);
        assert_eq!(
            machine.current_question(),
            Some(QuestionKey::RedFlag(RedFlag::ChestPain))
        );
    }

    #[test]
    fn test_get_next_question_is_idempotent() {
        let (mut machine, intake) = started("headache");
        let visited_before = machine.visited().clone();
        let first = machine.get_next_question(&intake);
        let second = machine.get_next_question(&intake);
        assert_eq!(first, second);
        assert_eq!(machine.visited(), &visited_before);
    }

    #[test]
    fn test_severity_is_clamped_and_unreadable_is_ignored() {
        let (mut machine, mut intake) = started("headache");
        answer(&mut machine, &mut intake, "3 days");
        answer(&mut machine, &mut intake, "15");
        assert_eq!(intake.severity_scale.map(Scale::value), Some(10));

        let (mut machine, mut intake) = started("headache");
        answer(&mut machine, &mut intake, "3 days");
        answer(&mut machine, &mut intake, "pretty bad");
        assert_eq!(intake.severity_scale, None);
        assert!(machine.visited().contains(&QuestionKey::Severity));
    }

    #[test]
    fn test_list_answers_split_and_none_is_empty() {
        let (mut machine, mut intake) = started("I have a cough");
        for text in ["1 week", "4", "gradually", "yes"] {
            answer(&mut machine, &mut intake, text);
        }
        answer(&mut machine, &mut intake, "cold air, talking");
        answer(&mut machine, &mut intake, "N/A");
        answer(&mut machine, &mut intake, "salbutamol");
        answer(&mut machine, &mut intake, "none");

        assert_eq!(intake.fever, Some(true));
        assert_eq!(intake.triggers, vec!["cold air", "talking"]);
        assert!(intake.relevant_history.is_empty());
        assert_eq!(intake.meds, vec!["salbutamol"]);
        assert!(intake.allergies.is_empty());
    }

    #[test]
    fn test_red_flags_follow_fixed_order_and_record_answers() {
        let (mut machine, mut intake) = started("I have a cough");
        for _ in 0..8 {
            answer(&mut machine, &mut intake, "no");
        }
        let mut asked = Vec::new();
        for flag in RedFlag::ALL {
            machine.get_next_question(&intake);
            asked.push(machine.current_question().unwrap());
            let reply = if flag == RedFlag::Fainting { "Yes" } else { "no" };
            machine.process_user_response(&mut intake, reply);
        }
        let expected: Vec<QuestionKey> = RedFlag::ALL.into_iter().map(QuestionKey::RedFlag).collect();
        assert_eq!(asked, expected);
        assert_eq!(
            intake.red_flag_answers.get(&RedFlag::Fainting),
            Some(&RedFlagAnswer::Flag(true))
        );
        assert_eq!(
            intake.red_flag_answers.get(&RedFlag::ChestPain),
            Some(&RedFlagAnswer::Flag(false))
        );
    }

    #[test]
    fn test_demographics_answers() {
        let (mut machine, mut intake) = started("I have a cough");
        for _ in 0..(8 + 8) {
            answer(&mut machine, &mut intake, "no");
        }
        assert_eq!(answer(&mut machine, &mut intake, "I'm 70"), "How old are you?");
        answer(&mut machine, &mut intake, "no");
        answer(&mut machine, &mut intake, "yes");
        answer(&mut machine, &mut intake, "y");

        let demo = &intake.demographics;
        assert_eq!(demo.age.map(|a| a.years()), Some(70));
        assert!(!demo.is_pregnant);
        assert!(demo.is_elderly);
        assert!(demo.is_immunocompromised);
        machine.get_next_question(&intake);
        assert_eq!(machine.current_stage(), Stage::Summary);
    }

    #[test]
    fn test_summary_confirmation_reaches_assessment() {
        let (mut machine, mut intake) = started("I have a cough");
        run_to_summary(&mut machine, &mut intake, "no");
        assert!(machine
            .get_next_question(&intake)
            .starts_with("Let me confirm"));
        assert!(!machine.is_ready_for_assessment());

        machine.process_user_response(&mut intake, "Correct.");
        assert!(machine.is_ready_for_assessment());
        assert_eq!(machine.current_stage(), Stage::Assessment);
    }

    #[test]
    fn test_summary_rejection_rewinds_and_keeps_complaint() {
        let (mut machine, mut intake) = started("I have a cough");
        run_to_summary(&mut machine, &mut intake, "no");

        machine.process_user_response(&mut intake, "no");

        assert_eq!(machine.current_stage(), Stage::ChiefComplaint);
        assert_eq!(
            machine.visited(),
            &HashSet::from([QuestionKey::ChiefComplaint])
        );
        assert_eq!(intake.chief_complaint(), Some("I have a cough"));
        machine.get_next_question(&intake);
        assert_eq!(machine.current_question(), Some(QuestionKey::Duration));
    }

    #[test]
    fn test_messages_after_assessment_do_not_mutate_intake() {
        let (mut machine, mut intake) = started("I have a cough");
        run_to_summary(&mut machine, &mut intake, "no");
        machine.process_user_response(&mut intake, "yes");
        let before = intake.clone();

        machine.process_user_response(&mut intake, "actually it is 9");
        assert_eq!(intake, before);
        assert!(machine.is_ready_for_assessment());
    }

    #[tokio::test]
    async fn test_driver_reports_ready_after_confirmation() {
        let (mut machine, mut intake) = started("I have a cough");
        run_to_summary(&mut machine, &mut intake, "no");

        let reply = machine.respond(&mut intake, &[], "yes").await;
        assert!(reply.is_ready());
        assert_eq!(reply.text(), "Analyzing your symptoms...");

        machine.mark_complete();
        assert_eq!(ConversationDriver::stage(&machine), "results");
        assert!(!machine.is_ready());

        let closing = machine.respond(&mut intake, &[], "thanks").await;
        assert_eq!(closing, DriverReply::Ask(COMPLETED_MESSAGE.to_string()));
    }
}
