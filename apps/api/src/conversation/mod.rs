//! Conversation drivers: turn patient free text into a `SymptomIntake`.
//!
//! Two strategies sit behind `ConversationDriver`: a fixed-order scripted
//! state machine and an LLM-adaptive interviewer. Both fill the same intake
//! and hand it to the same assessment use case.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::llm_client::{ChatMessage, LanguageModel};
use crate::models::intake::SymptomIntake;

pub mod adaptive;
pub mod handlers;
pub mod prompts;
pub mod scripted;
pub mod session;
pub mod summary;

pub const OPENING_QUESTION: &str =
    "What brings you in today? Please describe your main symptom or concern.";

/// Reply to any message received after the assessment has been stored.
pub const COMPLETED_MESSAGE: &str = "Thank you for providing that information. \
    Start a new conversation to describe another concern.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationMode {
    #[default]
    Scripted,
    Adaptive,
}

impl std::str::FromStr for ConversationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scripted" | "deterministic" => Ok(ConversationMode::Scripted),
            "adaptive" => Ok(ConversationMode::Adaptive),
            other => Err(format!("unknown conversation mode '{other}'")),
        }
    }
}

/// What the driver wants shown to the patient after a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverReply {
    /// Another question for the patient.
    Ask(String),
    /// Intake is complete; the message tells the patient an assessment follows.
    Ready(String),
}

impl DriverReply {
    pub fn text(&self) -> &str {
        match self {
            DriverReply::Ask(text) | DriverReply::Ready(text) => text,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, DriverReply::Ready(_))
    }
}

/// Given the history and the intake, produce the next prompt or mark the
/// intake ready for assessment.
#[async_trait]
pub trait ConversationDriver: Send + Sync {
    /// First question of a fresh conversation.
    fn opening_question(&mut self, intake: &SymptomIntake) -> String;

    /// Absorbs one patient message into the intake and returns the reply.
    /// `history` already ends with `user_message`.
    async fn respond(
        &mut self,
        intake: &mut SymptomIntake,
        history: &[ChatMessage],
        user_message: &str,
    ) -> DriverReply;

    fn is_ready(&self) -> bool;

    /// Called once an assessment has been stored for this conversation.
    fn mark_complete(&mut self);

    fn reset(&mut self);

    fn stage(&self) -> &'static str;
}

pub fn driver_for(mode: ConversationMode, llm: Arc<dyn LanguageModel>) -> Box<dyn ConversationDriver> {
    match mode {
        ConversationMode::Scripted => Box::new(scripted::IntakeStateMachine::new()),
        ConversationMode::Adaptive => Box::new(adaptive::AdaptiveInterviewer::new(llm)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!(
            "Adaptive".parse::<ConversationMode>(),
            Ok(ConversationMode::Adaptive)
        );
        assert_eq!(
            "deterministic".parse::<ConversationMode>(),
            Ok(ConversationMode::Scripted)
        );
        assert!("chatty".parse::<ConversationMode>().is_err());
    }
}
