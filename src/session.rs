//! Conversation session and transcript.
//!
//! A [`Session`] owns an append-only transcript of user/assistant messages
//! and enforces the one-in-flight-request turn state machine. Per turn it
//! assembles a fresh completion request: the fixed system instruction, one
//! system message per retrieved document, then the persisted transcript.
//! The assembled request is never stored — only the final assistant reply
//! is appended back.

use thiserror::Error;

use crate::models::Message;

/// Instruction prepended to every completion request.
pub const SYSTEM_INSTRUCTION: &str = "Use the following documents to answer the question.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a completion request is already in flight for this session")]
    TurnInFlight,
}

/// Turn state. Exactly two states exist: waiting for user input, or waiting
/// for the completion service to finish streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingCompletion,
}

/// One interactive conversation.
#[derive(Debug)]
pub struct Session {
    transcript: Vec<Message>,
    state: SessionState,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            transcript: Vec::new(),
            state: SessionState::Idle,
        }
    }

    /// The persisted user/assistant messages, in chronological order.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Append a user message and transition to `AwaitingCompletion`.
    ///
    /// Fails without mutating the transcript if a turn is already in flight;
    /// concurrent submissions are rejected, not queued.
    pub fn submit_user_turn(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        if self.state == SessionState::AwaitingCompletion {
            return Err(SessionError::TurnInFlight);
        }
        self.transcript.push(Message::user(text));
        self.state = SessionState::AwaitingCompletion;
        Ok(())
    }

    /// Build the message list for the completion call, fresh each turn.
    ///
    /// Layout: system instruction, one system message per retrieved document
    /// in retrieval order, then the full transcript. Zero retrieved documents
    /// simply omit the per-document messages.
    pub fn build_completion_request(&self, retrieved_docs: &[String]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(1 + retrieved_docs.len() + self.transcript.len());
        messages.push(Message::system(SYSTEM_INSTRUCTION));
        for doc_text in retrieved_docs {
            messages.push(Message::system(doc_text.clone()));
        }
        messages.extend(self.transcript.iter().cloned());
        messages
    }

    /// Append the completed assistant reply and return to `Idle`.
    pub fn record_assistant_turn(&mut self, text: impl Into<String>) {
        self.transcript.push(Message::assistant(text));
        self.state = SessionState::Idle;
    }

    /// Return to `Idle` without recording an assistant message.
    ///
    /// Used when the completion call fails or the stream is aborted: the
    /// user message for the turn stays in the transcript, any partial
    /// response buffer is discarded by the caller.
    pub fn abort_turn(&mut self) {
        self.state = SessionState::Idle;
    }
}
