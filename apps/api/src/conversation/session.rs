//! Conversation sessions and the in-memory store that owns them.
//!
//! A session is the single owner of its intake, history and driver state.
//! Each one sits behind its own mutex, held for a whole turn, so only one
//! mutation is ever in flight per conversation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::assessment::format::format_for_chat;
use crate::assessment::schema::AssessmentResponse;
use crate::conversation::{driver_for, ConversationDriver, ConversationMode, DriverReply};
use crate::llm_client::{ChatMessage, LanguageModel};
use crate::models::intake::SymptomIntake;

pub struct Session {
    pub id: Uuid,
    pub mode: ConversationMode,
    pub intake: SymptomIntake,
    pub history: Vec<ChatMessage>,
    pub assessment: Option<AssessmentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    driver: Box<dyn ConversationDriver>,
}

impl Session {
    pub fn new(mode: ConversationMode, llm: Arc<dyn LanguageModel>) -> Self {
        let now = Utc::now();
        let mut session = Self {
            id: Uuid::new_v4(),
            mode,
            intake: SymptomIntake::new(),
            history: Vec::new(),
            assessment: None,
            created_at: now,
            updated_at: now,
            driver: driver_for(mode, llm),
        };
        session.open();
        session
    }

    /// The most recent assistant message.
    pub fn last_reply(&self) -> Option<&str> {
        self.history.last().map(|m| m.content.as_str())
    }

    pub fn stage(&self) -> &'static str {
        self.driver.stage()
    }

    pub fn is_ready(&self) -> bool {
        self.driver.is_ready()
    }

    /// Processes one patient message to completion.
    pub async fn handle_message(&mut self, text: &str) -> DriverReply {
        self.history.push(ChatMessage::user(text));
        let reply = self
            .driver
            .respond(&mut self.intake, &self.history, text)
            .await;
        self.history.push(ChatMessage::assistant(reply.text()));
        self.updated_at = Utc::now();
        reply
    }

    /// Stores a finished assessment and moves the driver to its results stage.
    pub fn record_assessment(&mut self, assessment: AssessmentResponse) {
        self.history
            .push(ChatMessage::assistant(format_for_chat(&assessment)));
        self.assessment = Some(assessment);
        self.driver.mark_complete();
        self.updated_at = Utc::now();
    }

    /// Starts a new conversation in place: intake, history, driver state and
    /// any assessment are all replaced together.
    pub fn reset(&mut self) {
        self.intake = SymptomIntake::new();
        self.history.clear();
        self.assessment = None;
        self.driver.reset();
        self.open();
        self.updated_at = Utc::now();
        info!("Conversation {} reset", self.id);
    }

    fn open(&mut self) {
        let opening = self.driver.opening_question(&self.intake);
        self.history.push(ChatMessage::assistant(opening));
    }
}

/// Sessions idle for longer than this are dropped.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

/// In-memory sessions keyed by id. Sessions untouched for `idle_ttl` are
/// evicted on every insert and by the periodic sweeper.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>>,
    idle_ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_idle_ttl(DEFAULT_IDLE_TTL)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub async fn insert(&self, session: Session) -> Arc<Mutex<Session>> {
        self.evict_idle().await;
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        handle
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Removes sessions idle for longer than the TTL and returns how many
    /// were dropped. A session locked by an in-flight turn is never evicted.
    pub async fn evict_idle(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !is_idle(&session, now, self.idle_ttl),
            Err(_) => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!("Evicted {evicted} idle conversation(s)");
        }
        evicted
    }

    /// Spawns a background task that calls `evict_idle` every `period`.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                store.evict_idle().await;
            }
        })
    }
}

fn is_idle(session: &Session, now: DateTime<Utc>, ttl: Duration) -> bool {
    (now - session.updated_at)
        .to_std()
        .map(|idle| idle > ttl)
        .unwrap_or(false)
}
