//! Open chat sessions and the per-turn typing delay.
//!
//! Each session owns its conversation exclusively. Turns on one session are
//! serialized by an async turn lock, so replies never reorder. Closing a
//! session wakes any turn still waiting out its delay; that turn is dropped
//! without touching the conversation. Sessions left idle past the configured
//! TTL are reaped by a background sweep, which closes them the same way.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chat::conversation::{ChatMessage, Conversation, TurnOutcome};
use crate::chat::intent::Intent;
use crate::chat::responder::{Responder, UnknownIntentError};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(Uuid),

    #[error("Session {0} was closed")]
    Closed(Uuid),

    #[error(transparent)]
    UnknownIntent(#[from] UnknownIntentError),
}

/// Point-in-time copy of a session for display.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub last_intent: Option<Intent>,
    pub transcript: Vec<ChatMessage>,
    pub suggestions: Vec<&'static str>,
}

pub struct Session {
    id: Uuid,
    conversation: Mutex<Conversation>,
    turn_lock: tokio::sync::Mutex<()>,
    closed: watch::Sender<bool>,
    last_active: Mutex<Instant>,
}

impl Session {
    fn new(id: Uuid) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            id,
            conversation: Mutex::new(Conversation::new()),
            turn_lock: tokio::sync::Mutex::new(()),
            closed,
            last_active: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_active.lock() = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_active.lock())
    }

    /// A turn holding the lock counts as activity regardless of its timestamp.
    fn is_busy(&self) -> bool {
        self.turn_lock.try_lock().is_err()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let conversation = self.conversation.lock();
        SessionSnapshot {
            session_id: self.id,
            last_intent: conversation.context().last_intent,
            transcript: conversation.transcript().to_vec(),
            suggestions: conversation.suggestions().to_vec(),
        }
    }

    /// Runs one turn: record the user message, wait out `delay`, then answer.
    ///
    /// Returns [`SessionError::Closed`] if the session is closed before the
    /// reply is written; in that case the context is unchanged.
    pub async fn take_turn(
        &self,
        utterance: &str,
        responder: &Responder,
        delay: Duration,
    ) -> Result<TurnOutcome, SessionError> {
        let _turn = self.turn_lock.lock().await;
        self.touch();
        let mut closed = self.closed.subscribe();

        {
            let mut conversation = self.conversation.lock();
            if *closed.borrow() {
                return Err(SessionError::Closed(self.id));
            }
            conversation.push_user(utterance);
        }

        if !delay.is_zero() {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = closed.wait_for(|closed| *closed) => {
                    debug!(session_id = %self.id, "turn cancelled during typing delay");
                    return Err(SessionError::Closed(self.id));
                }
            }
        }

        let mut conversation = self.conversation.lock();
        if self.is_closed() {
            return Err(SessionError::Closed(self.id));
        }
        let outcome = conversation.answer(utterance, responder)?;
        self.touch();
        Ok(outcome)
    }

    /// Marks the session closed and wakes any pending turn.
    fn close(&self) {
        // Hold the conversation lock so no reply lands after the flag flips.
        let _conversation = self.conversation.lock();
        self.closed.send_replace(true);
    }
}

/// All open sessions, keyed by id.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Session>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(Uuid::new_v4()));
        self.sessions.write().insert(session.id(), session.clone());
        info!(session_id = %session.id(), "chat session opened");
        session
    }

    /// Looks up a session and marks it active.
    pub fn get(&self, id: Uuid) -> Result<Arc<Session>, SessionError> {
        let session = self
            .sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))?;
        session.touch();
        Ok(session)
    }

    /// Removes the session and cancels any turn still in flight.
    pub fn close(&self, id: Uuid) -> Result<(), SessionError> {
        let session = self
            .sessions
            .write()
            .remove(&id)
            .ok_or(SessionError::NotFound(id))?;
        session.close();
        info!(session_id = %id, "chat session closed");
        Ok(())
    }

    pub fn open_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Closes every session idle for at least `ttl`. Returns how many were reaped.
    pub fn reap_idle(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<Arc<Session>> = {
            let mut sessions = self.sessions.write();
            let ids: Vec<Uuid> = sessions
                .values()
                .filter(|s| !s.is_busy() && s.idle_for(now) >= ttl)
                .map(|s| s.id())
                .collect();
            ids.iter().filter_map(|id| sessions.remove(id)).collect()
        };
        for session in &expired {
            session.close();
            debug!(session_id = %session.id(), "idle chat session reaped");
        }
        expired.len()
    }

    /// Spawns the periodic idle sweep. The task runs until aborted.
    pub fn spawn_reaper(&self, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let reaped = registry.reap_idle(ttl);
                if reaped > 0 {
                    info!(reaped, open = registry.open_count(), "reaped idle chat sessions");
                }
            }
        })
    }
}
