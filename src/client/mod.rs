//! Client side of the conversation: transcript, continuation identifiers
//! and the single outstanding request.

pub mod keys;
pub mod notify;
pub mod storage;
pub mod transport;

use self::notify::{ Notifier, EMPTY_MESSAGE_WARNING, REQUEST_FAILED_ERROR };
use self::storage::{ ClientStorage, CONVERSATION_ID_KEY, MESSAGE_ID_KEY, TRANSCRIPT_KEY };
use self::transport::RelayTransport;
use crate::models::chat::RelayRequest;
use log::{ debug, error, warn };
use std::sync::{ Arc, Mutex, MutexGuard };
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    Pending,
    Committed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub status: TurnStatus,
}

impl Turn {
    fn committed(speaker: Speaker, text: String) -> Self {
        Self { speaker, text, status: TurnStatus::Committed }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Sending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Empty input; nothing was sent.
    Empty,
    /// Another request is outstanding; nothing was sent.
    Busy,
    Replied,
    Failed,
    /// The conversation was reset while the request was outstanding.
    Discarded,
}

struct ControllerState {
    transcript: Vec<Turn>,
    conversation_id: String,
    message_id: String,
    request: RequestState,
    restored: bool,
    generation: u64,
}

fn lock(state: &Mutex<ControllerState>) -> MutexGuard<'_, ControllerState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Releases the in-flight lock if the request future is dropped before it
/// settles.
struct InFlightGuard<'a> {
    state: &'a Mutex<ControllerState>,
    turn: usize,
    generation: u64,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock(self.state);
        state.request = RequestState::Idle;
        if state.generation == self.generation {
            if let Some(turn) = state.transcript.get_mut(self.turn) {
                turn.status = TurnStatus::Failed;
            }
        }
    }
}

pub struct ConversationController {
    transport: Arc<dyn RelayTransport>,
    storage: Arc<dyn ClientStorage>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<ControllerState>,
}

impl ConversationController {
    pub fn new(
        transport: Arc<dyn RelayTransport>,
        storage: Arc<dyn ClientStorage>,
        notifier: Arc<dyn Notifier>
    ) -> Self {
        Self {
            transport,
            storage,
            notifier,
            state: Mutex::new(ControllerState {
                transcript: Vec::new(),
                conversation_id: String::new(),
                message_id: String::new(),
                request: RequestState::Idle,
                restored: false,
                generation: 0,
            }),
        }
    }

    pub fn transcript(&self) -> Vec<Turn> {
        lock(&self.state).transcript.clone()
    }

    pub fn conversation_id(&self) -> String {
        lock(&self.state).conversation_id.clone()
    }

    pub fn message_id(&self) -> String {
        lock(&self.state).message_id.clone()
    }

    pub fn request_state(&self) -> RequestState {
        lock(&self.state).request
    }

    pub fn is_submitting(&self) -> bool {
        self.request_state() == RequestState::Sending
    }

    /// Loads the durable cache into memory. Only the first call has any
    /// effect; returns whether this call was it.
    pub fn restore(&self) -> bool {
        let mut state = lock(&self.state);
        if state.restored {
            return false;
        }
        state.restored = true;

        if let Some(raw) = self.read(TRANSCRIPT_KEY) {
            match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(texts) => {
                    state.transcript = texts
                        .into_iter()
                        .enumerate()
                        .map(|(i, text)| {
                            let speaker = if i % 2 == 0 { Speaker::User } else { Speaker::Assistant };
                            Turn::committed(speaker, text)
                        })
                        .collect();
                }
                Err(e) => warn!("Ignoring unreadable cached transcript: {}", e),
            }
        }
        if let Some(id) = self.read(CONVERSATION_ID_KEY) {
            state.conversation_id = id;
        }
        if let Some(id) = self.read(MESSAGE_ID_KEY) {
            state.message_id = id;
        }
        debug!(
            "Restored {} turns, conversation {:?}",
            state.transcript.len(),
            state.conversation_id
        );
        true
    }

    /// Clears the transcript and both identifiers, in memory and in the
    /// durable cache.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        for key in [TRANSCRIPT_KEY, CONVERSATION_ID_KEY, MESSAGE_ID_KEY] {
            if let Err(e) = self.storage.remove(key) {
                error!("Failed to clear {} from client storage: {}", key, e);
            }
        }
        state.transcript.clear();
        state.conversation_id.clear();
        state.message_id.clear();
        state.generation += 1;
        if state.request != RequestState::Sending {
            state.request = RequestState::Idle;
        }
    }

    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        if text.is_empty() {
            self.notifier.warn(EMPTY_MESSAGE_WARNING);
            return SubmitOutcome::Empty;
        }

        let (request, turn, generation) = {
            let mut state = lock(&self.state);
            if state.request == RequestState::Sending {
                return SubmitOutcome::Busy;
            }
            state.request = RequestState::Sending;
            state.transcript.push(Turn {
                speaker: Speaker::User,
                text: text.to_string(),
                status: TurnStatus::Pending,
            });
            let request = RelayRequest {
                message: text.to_string(),
                conversation_id: state.conversation_id.clone(),
                parent_message_id: state.message_id.clone(),
            };
            (request, state.transcript.len() - 1, state.generation)
        };

        let mut guard = InFlightGuard { state: &self.state, turn, generation, armed: true };
        let result = self.transport.send(&request).await;
        guard.disarm();

        let mut state = lock(&self.state);
        let stale = state.generation != generation;
        match result {
            Ok(response) => {
                state.request = RequestState::Succeeded;
                if stale {
                    return SubmitOutcome::Discarded;
                }
                state.transcript[turn].status = TurnStatus::Committed;

                if let Some(id) = response.conversation_id {
                    if id != state.conversation_id {
                        self.write(CONVERSATION_ID_KEY, &id);
                        state.conversation_id = id;
                    }
                }
                if let Some(id) = response.message_id {
                    if id != state.message_id {
                        self.write(MESSAGE_ID_KEY, &id);
                        state.message_id = id;
                    }
                }
                state.transcript.push(Turn::committed(Speaker::Assistant, response.message));
                self.persist_transcript(&state.transcript);
                SubmitOutcome::Replied
            }
            Err(e) => {
                state.request = RequestState::Failed;
                if !stale {
                    state.transcript[turn].status = TurnStatus::Failed;
                }
                drop(state);
                error!("Relay request failed: {}", e);
                self.notifier.error(REQUEST_FAILED_ERROR);
                if stale { SubmitOutcome::Discarded } else { SubmitOutcome::Failed }
            }
        }
    }

    /// Writes the committed turns; failed turns stay in memory only.
    fn persist_transcript(&self, transcript: &[Turn]) {
        let texts: Vec<&str> = transcript
            .iter()
            .filter(|t| t.status == TurnStatus::Committed)
            .map(|t| t.text.as_str())
            .collect();
        match serde_json::to_string(&texts) {
            Ok(json) => self.write(TRANSCRIPT_KEY, &json),
            Err(e) => error!("Failed to encode transcript: {}", e),
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!("Failed to read {} from client storage: {}", key, e);
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set(key, value) {
            error!("Failed to write {} to client storage: {}", key, e);
        }
    }
}
