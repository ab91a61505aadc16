//! Streaming coordinator
//!
//! Spawns a worker thread per conversation turn for provider I/O. The
//! thread relays tokens over an mpsc channel and ends the stream with
//! exactly one terminal event; no panic or error ever crosses the channel
//! boundary unclassified. Cancellation trips a shared flag the transport
//! checks between stream lines, so dropping the consumer stops upstream
//! work promptly and produces no terminal event at all.

use crate::adapters::transport_types::{AdapterError, CancelFlag, StreamContext};
use crate::adapters::{factory, ProviderAdapter};
use crate::contracts;
use sketchpilot_core::{AppConfig, BudgetedRequest, ConversationTurn, ProviderSelection, TurnRole};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};
use uuid::Uuid;

/// Channel sender for turn events
pub type TurnSender = mpsc::Sender<StreamEvent>;
/// Channel receiver for turn events
pub type TurnReceiver = mpsc::Receiver<StreamEvent>;

/// Event sent from the worker thread to the consumer
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// One streamed text delta
    Token { content: String },
    /// Turn finished; carries the concatenated reply
    Done { full_text: String },
    /// Turn failed; carries the normalized error
    Error { error: AdapterError },
}

impl StreamEvent {
    /// True for events that end the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done { .. } | StreamEvent::Error { .. })
    }
}

/// Handle to a running turn
///
/// Dropping the handle does not cancel the turn; call [`TurnHandle::cancel`]
/// (or let the transport see the flag) to stop it.
#[derive(Debug)]
pub struct TurnHandle {
    handle: Option<JoinHandle<()>>,
    cancel: CancelFlag,
    turn_id: String,
}

impl TurnHandle {
    /// Turn id for logging and correlation
    pub fn turn_id(&self) -> &str {
        &self.turn_id
    }

    /// Shared cancel flag for this turn
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Request cancellation; the worker stops at the next stream line
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True while the worker thread is still running
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Wait for the worker thread to finish
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            // A worker panic has already been converted to an Error
            // event where possible; nothing more to report here.
            let _ = handle.join();
        }
    }
}

/// Assemble the full conversation for one turn
///
/// System prompt first, then the (already truncated) history tail, then
/// the new user message.
fn assemble_turns(budgeted: BudgetedRequest) -> Vec<ConversationTurn> {
    let mut turns = Vec::with_capacity(budgeted.history.len() + 2);
    turns.push(ConversationTurn::text(
        TurnRole::System,
        contracts::system_prompt(),
    ));
    turns.extend(budgeted.history);
    turns.push(budgeted.message);
    turns
}

/// Run one conversation turn on a worker thread
///
/// The adapter is resolved before spawning so configuration failures
/// (unknown provider, missing demo key) surface as the stream's single
/// terminal event without any thread or network activity. The deadline
/// is measured from this call, not from the first token.
pub fn run_turn(
    budgeted: BudgetedRequest,
    selection: ProviderSelection,
    config: &AppConfig,
) -> (TurnReceiver, TurnHandle) {
    run_turn_with_flag(budgeted, selection, config, CancelFlag::new())
}

/// [`run_turn`] with a caller-owned cancel flag
///
/// Lets the caller wire the flag into a disconnect guard before the
/// worker starts.
pub fn run_turn_with_flag(
    budgeted: BudgetedRequest,
    selection: ProviderSelection,
    config: &AppConfig,
    cancel: CancelFlag,
) -> (TurnReceiver, TurnHandle) {
    let turn_id = Uuid::new_v4().to_string();
    let (tx, rx) = mpsc::channel();

    let adapter = match factory::create_adapter(&selection, config) {
        Ok(adapter) => adapter,
        Err(error) => {
            warn!(turn_id = %turn_id, %error, "Adapter resolution failed");
            let _ = tx.send(StreamEvent::Error { error });
            return (
                rx,
                TurnHandle {
                    handle: None,
                    cancel,
                    turn_id,
                },
            );
        }
    };

    let ctx = StreamContext::new(cancel.clone(), config.stream.turn_timeout_secs);
    let turns = assemble_turns(budgeted);
    let thread_turn_id = turn_id.clone();

    let handle = thread::spawn(move || {
        debug!(
            turn_id = %thread_turn_id,
            provider = adapter.provider_name(),
            turns = turns.len(),
            "Turn started"
        );

        let token_tx = tx.clone();
        let result = adapter.stream_reply(&turns, &ctx, |token| {
            let _ = token_tx.send(StreamEvent::Token {
                content: token.to_string(),
            });
        });

        match result {
            Ok(full_text) => {
                debug!(turn_id = %thread_turn_id, chars = full_text.len(), "Turn complete");
                let _ = tx.send(StreamEvent::Done { full_text });
            }
            Err(AdapterError::Cancelled) => {
                // The consumer went away; nobody is listening and the
                // stream ends without a terminal event.
                debug!(turn_id = %thread_turn_id, "Turn cancelled");
            }
            Err(error) => {
                warn!(turn_id = %thread_turn_id, %error, "Turn failed");
                let _ = tx.send(StreamEvent::Error { error });
            }
        }
    });

    (
        rx,
        TurnHandle {
            handle: Some(handle),
            cancel,
            turn_id,
        },
    )
}
