//! Adaptive interviewer: the language model phrases each follow-up question.
//!
//! Termination does not depend on the model: the interview stops after
//! `MAX_QUESTIONS` questions or as soon as chief complaint, duration and
//! severity are all known. When the model fails, a fixed priority list of
//! canned questions keeps the conversation moving.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::conversation::prompts::{ADAPTIVE_SYSTEM, READY_TEMPLATE};
use crate::conversation::summary::render_intake_summary;
use crate::conversation::{ConversationDriver, DriverReply, COMPLETED_MESSAGE, OPENING_QUESTION};
use crate::extract::{duration_phrase, scale_token_outside_duration, yes_no_token};
use crate::llm_client::prompts::NOT_A_DOCTOR;
use crate::llm_client::{ChatMessage, LanguageModel, LlmError, Role};
use crate::models::intake::SymptomIntake;

/// Hard cap on questions asked after the chief complaint.
pub const MAX_QUESTIONS: usize = 15;
/// History messages sent with each question request.
const CONTEXT_WINDOW: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initial,
    Intake,
    Assessment,
    Results,
}

/// Canned follow-ups, in the order they are used when the model is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Topic {
    Duration,
    Severity,
    Onset,
    Fever,
    Triggers,
    History,
    Meds,
    Allergies,
    Age,
    Closing,
}

const FALLBACK_ORDER: [Topic; 10] = [
    Topic::Duration,
    Topic::Severity,
    Topic::Onset,
    Topic::Fever,
    Topic::Triggers,
    Topic::History,
    Topic::Meds,
    Topic::Allergies,
    Topic::Age,
    Topic::Closing,
];

impl Topic {
    fn question(self) -> &'static str {
        match self {
            Topic::Duration => "How long have you had this symptom?",
            Topic::Severity => "On a scale of 0-10, how severe is it right now?",
            Topic::Onset => "Did it start suddenly or gradually?",
            Topic::Fever => "Have you had a fever?",
            Topic::Triggers => "Does anything make it better or worse?",
            Topic::History => "Do you have any relevant medical conditions?",
            Topic::Meds => "Are you taking any medications?",
            Topic::Allergies => "Do you have any allergies?",
            Topic::Age => "How old are you?",
            Topic::Closing => "Is there anything else about your symptoms you think I should know?",
        }
    }

    fn is_missing(self, intake: &SymptomIntake) -> bool {
        match self {
            Topic::Duration => intake.duration.is_none(),
            Topic::Severity => intake.severity_scale.is_none(),
            Topic::Onset => intake.onset.is_none(),
            Topic::Fever => intake.fever.is_none(),
            Topic::Triggers => intake.triggers.is_empty(),
            Topic::History => intake.relevant_history.is_empty(),
            Topic::Meds => intake.meds.is_empty(),
            Topic::Allergies => intake.allergies.is_empty(),
            Topic::Age => intake.demographics.age.is_none(),
            Topic::Closing => true,
        }
    }
}

pub struct AdaptiveInterviewer {
    llm: Arc<dyn LanguageModel>,
    phase: Phase,
    questions_asked: usize,
    fallback_asked: HashSet<Topic>,
}

impl AdaptiveInterviewer {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            phase: Phase::Initial,
            questions_asked: 0,
            fallback_asked: HashSet::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn questions_asked(&self) -> usize {
        self.questions_asked
    }

    fn should_stop(&self, intake: &SymptomIntake) -> bool {
        self.questions_asked >= MAX_QUESTIONS || intake.has_essentials()
    }

    async fn generate_question(
        &self,
        intake: &SymptomIntake,
        history: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let messages = build_question_messages(intake, history, self.questions_asked);
        let raw = self.llm.generate(&messages).await?;
        let question = raw.trim().trim_matches('"').trim();
        if question.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(question.to_string())
    }

    fn fallback_question(&mut self, intake: &SymptomIntake) -> &'static str {
        let topic = FALLBACK_ORDER
            .into_iter()
            .find(|t| *t == Topic::Closing || (t.is_missing(intake) && !self.fallback_asked.contains(t)))
            .unwrap_or(Topic::Closing);
        self.fallback_asked.insert(topic);
        topic.question()
    }
}

#[async_trait]
impl ConversationDriver for AdaptiveInterviewer {
    fn opening_question(&mut self, _intake: &SymptomIntake) -> String {
        OPENING_QUESTION.to_string()
    }

    async fn respond(
        &mut self,
        intake: &mut SymptomIntake,
        history: &[ChatMessage],
        user_message: &str,
    ) -> DriverReply {
        match self.phase {
            Phase::Initial => {
                intake.set_chief_complaint(user_message);
                self.phase = Phase::Intake;
            }
            Phase::Intake => {
                let prior_question = last_assistant_message(history);
                absorb_free_text(intake, user_message, prior_question);
            }
            Phase::Assessment => {
                debug!("Ignoring message received while awaiting assessment");
                return DriverReply::Ready(ready_message(intake));
            }
            Phase::Results => {
                debug!("Ignoring message received after results were stored");
                return DriverReply::Ask(COMPLETED_MESSAGE.to_string());
            }
        }

        if self.should_stop(intake) {
            self.phase = Phase::Assessment;
            return DriverReply::Ready(ready_message(intake));
        }

        let question = match self.generate_question(intake, history).await {
            Ok(question) => question,
            Err(e) => {
                warn!("Question generation failed: {e}. Using fallback question.");
                self.fallback_question(intake).to_string()
            }
        };
        self.questions_asked += 1;
        DriverReply::Ask(question)
    }

    fn is_ready(&self) -> bool {
        self.phase == Phase::Assessment
    }

    fn mark_complete(&mut self) {
        if self.phase == Phase::Assessment {
            self.phase = Phase::Results;
        }
    }

    fn reset(&mut self) {
        self.phase = Phase::Initial;
        self.questions_asked = 0;
        self.fallback_asked.clear();
    }

    fn stage(&self) -> &'static str {
        match self.phase {
            Phase::Initial => "initial",
            Phase::Intake => "intake",
            Phase::Assessment => "assessment",
            Phase::Results => "results",
        }
    }
}

fn ready_message(intake: &SymptomIntake) -> String {
    READY_TEMPLATE.replace("{summary}", &render_intake_summary(intake))
}

fn last_assistant_message(history: &[ChatMessage]) -> Option<&str> {
    history
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .map(|m| m.content.as_str())
}

/// Best-effort enrichment of the intake from one free-text answer.
///
/// - duration-like wording fills `duration` if unset
/// - a standalone number ≤ 10 fills severity, then pain, if unset; a number
///   counting a duration unit ("3 days") is not a scale value
/// - a yes/no word is attributed to the topic of the previous question by
///   keyword (fever, then allergies, then medication)
///
/// The yes/no attribution is approximate: a question naming several topics
/// is credited to the first match only.
pub fn absorb_free_text(intake: &mut SymptomIntake, text: &str, prior_question: Option<&str>) {
    if intake.duration.is_none() {
        if let Some(duration) = duration_phrase(text) {
            debug!("Heuristic filled duration");
            intake.duration = Some(duration);
        }
    }

    if let Some(value) = scale_token_outside_duration(text) {
        if intake.severity_scale.is_none() {
            intake.set_severity(value);
        } else if intake.pain_scale.is_none() {
            intake.set_pain(value);
        }
    }

    let (Some(answer), Some(prior)) = (yes_no_token(text), prior_question) else {
        return;
    };
    let prior = prior.to_lowercase();
    let detail = text.trim();
    if prior.contains("fever") || prior.contains("temperature") {
        intake.fever = Some(answer);
    } else if prior.contains("allerg") {
        if answer && has_detail(detail) {
            intake.allergies.push(detail.to_string());
        }
    } else if prior.contains("medication") || prior.contains("medicine") {
        if answer && has_detail(detail) {
            intake.meds.push(detail.to_string());
        }
    }
}

/// More than a bare yes/no word.
fn has_detail(text: &str) -> bool {
    text.split_whitespace().count() > 1
}

/// Instruction block, the last few turns, then a snapshot of the intake.
fn build_question_messages(
    intake: &SymptomIntake,
    history: &[ChatMessage],
    questions_asked: usize,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(format!("{ADAPTIVE_SYSTEM} {NOT_A_DOCTOR}"))];
    let start = history.len().saturating_sub(CONTEXT_WINDOW);
    messages.extend(
        history[start..]
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned(),
    );
    messages.push(ChatMessage::user(intake_snapshot(intake, questions_asked)));
    messages
}

fn intake_snapshot(intake: &SymptomIntake, questions_asked: usize) -> String {
    let checks: [(&str, bool); 11] = [
        ("chief complaint", intake.chief_complaint().is_some()),
        ("duration", intake.duration.is_some()),
        ("severity", intake.severity_scale.is_some()),
        ("onset", intake.onset.is_some()),
        ("fever", intake.fever.is_some()),
        ("pain scale", intake.pain_scale.is_some()),
        ("triggers", !intake.triggers.is_empty()),
        ("history", !intake.relevant_history.is_empty()),
        ("medications", !intake.meds.is_empty()),
        ("allergies", !intake.allergies.is_empty()),
        ("age", intake.demographics.age.is_some()),
    ];
    let filled: Vec<&str> = checks.iter().filter(|(_, f)| *f).map(|(n, _)| *n).collect();
    let missing: Vec<&str> = checks.iter().filter(|(_, f)| !*f).map(|(n, _)| *n).collect();

    format!(
        "Chief complaint: {}\nFilled fields: {}\nMissing fields: {}\nQuestions asked: {} of {}\n\
        Ask the single most useful next question.",
        intake.chief_complaint().unwrap_or("unknown"),
        join_or_none(&filled),
        join_or_none(&missing),
        questions_asked,
        MAX_QUESTIONS
    )
}

fn join_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
