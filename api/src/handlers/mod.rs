//! API handlers
//!
//! Request handlers for the HTTP surface: turn submission (SSE), model
//! listing, and the per-session review endpoints. Review sessions are
//! serialized behind one async mutex; a session has exactly one
//! interactive user, so contention is not a concern here.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::Json,
};
use futures::Stream;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use sketchpilot_core::{
    budget, extract, AppConfig, ChangeOrigin, InboundRequest, JsonlHistorySink, ReplyAction,
    ReviewSession,
};
use sketchpilot_llm::coordinator::{self, StreamEvent};
use sketchpilot_llm::{create_adapter, CancelFlag, ProviderAdapter};

use crate::models::{
    AcceptRequest, ApplyReplyRequest, CreateSessionRequest, ErrorBody, HistoryEntryView,
    SessionView, TurnRequest,
};

/// Shared state of the API server
pub struct ApiState {
    /// Application configuration
    pub config: AppConfig,
    /// Review sessions by id
    pub sessions: Mutex<HashMap<String, ReviewSession>>,
}

impl ApiState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message)))
}

fn not_found(message: impl Into<String>) -> ApiError {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new(message)))
}

/// Map an adapter error to the status of a non-streaming response
fn adapter_error_status(error: &sketchpilot_llm::AdapterError) -> StatusCode {
    use sketchpilot_llm::AdapterError as E;
    match error {
        E::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
        E::InsufficientCredit(_) => StatusCode::PAYMENT_REQUIRED,
        E::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        E::ModelUnavailable(_) => StatusCode::NOT_FOUND,
        E::Configuration(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<HashMap<String, String>> {
    let mut response = HashMap::new();
    response.insert("status".to_string(), "healthy".to_string());
    response.insert("service".to_string(), "sketchpilot-api".to_string());
    Json(response)
}

/// Cancels the turn when the SSE body is dropped before completion
///
/// Client disconnects drop the response stream; the guard trips the
/// cancel flag so the transport loop stops upstream work.
struct DisconnectGuard {
    cancel: CancelFlag,
    finished: bool,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!("Turn stream dropped before completion, cancelling");
            self.cancel.cancel();
        }
    }
}

/// Submit a conversation turn; the reply streams back as SSE
///
/// Frames, one event per line, in emission order with no coalescing:
/// `{"content": …}` per token, `{"error": …}` for a terminal failure,
/// and a final `[DONE]` sentinel ending every stream.
pub async fn submit_turn(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<TurnRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let message = request
        .message
        .decode()
        .map_err(|e| bad_request(e.to_string()))?;
    let mut history = Vec::with_capacity(request.history.len());
    for turn in &request.history {
        history.push(turn.decode().map_err(|e| bad_request(e.to_string()))?);
    }

    // Budget violations are refused before any provider work starts
    let budgeted = budget::validate(InboundRequest { message, history }, &state.config.budget)
        .map_err(|e| bad_request(e.to_string()))?;

    let cancel = CancelFlag::new();
    let (rx, handle) = coordinator::run_turn_with_flag(
        budgeted,
        request.provider,
        &state.config,
        cancel.clone(),
    );
    tracing::debug!(turn_id = handle.turn_id(), "Turn accepted");

    // Bridge the worker's blocking channel onto the async side
    let (tx, mut events) = tokio::sync::mpsc::channel::<StreamEvent>(64);
    tokio::task::spawn_blocking(move || {
        while let Ok(event) = rx.recv() {
            if tx.blocking_send(event).is_err() {
                break;
            }
        }
    });

    let mut guard = DisconnectGuard {
        cancel,
        finished: false,
    };

    let stream = async_stream::stream! {
        while let Some(event) = events.recv().await {
            match event {
                StreamEvent::Token { content } => {
                    let frame = serde_json::json!({ "content": content });
                    yield Ok(Event::default().data(frame.to_string()));
                }
                StreamEvent::Done { .. } => {
                    guard.finished = true;
                    yield Ok(Event::default().data("[DONE]"));
                    return;
                }
                StreamEvent::Error { error } => {
                    guard.finished = true;
                    let frame = serde_json::json!({ "error": error.to_string() });
                    yield Ok(Event::default().data(frame.to_string()));
                    yield Ok(Event::default().data("[DONE]"));
                    return;
                }
            }
        }
        // Channel closed without a terminal event (cancelled upstream);
        // still close the frame protocol for any reader left
        guard.finished = true;
        yield Ok(Event::default().data("[DONE]"));
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// List models available to a provider
///
/// The caller's credential arrives as a bearer token; the demo provider
/// ignores it and lists only its pinned model.
pub async fn list_models(
    State(state): State<Arc<ApiState>>,
    Path(provider_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<String>>, ApiError> {
    let credential = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string());

    let selection = sketchpilot_core::ProviderSelection {
        provider_id,
        model_id: String::new(),
        credential,
    };

    let adapter = create_adapter(&selection, &state.config)
        .map_err(|e| (adapter_error_status(&e), Json(ErrorBody::new(e.to_string()))))?;

    // Blocking HTTP; keep it off the runtime
    let result = tokio::task::spawn_blocking(move || adapter.list_models())
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(e.to_string())),
            )
        })?;

    match result {
        Ok(models) => Ok(Json(models)),
        Err(e) => Err((adapter_error_status(&e), Json(ErrorBody::new(e.to_string())))),
    }
}

/// Create a review session around an initial document
pub async fn create_session(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Json<SessionView> {
    let id = Uuid::new_v4().to_string();
    let session = match &state.config.history_path {
        Some(path) => ReviewSession::with_sink(
            request.document,
            Box::new(JsonlHistorySink::new(path.into())),
        ),
        None => ReviewSession::new(request.document),
    };

    let view = SessionView::from_session(&id, &session);
    state.sessions.lock().await.insert(id, session);
    Json(view)
}

/// Get a session snapshot
pub async fn get_session(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let sessions = state.sessions.lock().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| not_found("Unknown session"))?;
    Ok(Json(SessionView::from_session(&session_id, session)))
}

/// Extract code from an assistant reply and stage it for review
///
/// Patch blocks apply against the current document in listed order; any
/// unmatched block fails the whole apply with nothing staged. A reply
/// with no code action leaves the session untouched.
pub async fn apply_reply(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
    Json(request): Json<ApplyReplyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| not_found("Unknown session"))?;

    let action = match extract(&request.reply) {
        ReplyAction::Patches(patches) => {
            let patched = sketchpilot_core::apply_patches(session.document(), &patches)
                .map_err(|e| {
                    (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        Json(ErrorBody::new(e.to_string())),
                    )
                })?;
            session.stage(patched, ChangeOrigin::Patch, request.patch_key, false);
            "patched"
        }
        ReplyAction::FullCode(code) => {
            session.stage(code, ChangeOrigin::FullCode, request.patch_key, false);
            "replaced"
        }
        ReplyAction::None => "none",
    };

    Ok(Json(serde_json::json!({
        "action": action,
        "session": SessionView::from_session(&session_id, session),
    })))
}

/// Accept the pending diff
///
/// A stale accept with nothing staged is a no-op, not an error; the
/// response says whether an entry was actually committed.
pub async fn accept_pending(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
    Json(request): Json<AcceptRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| not_found("Unknown session"))?;

    let entry = session.accept(request.prompt);
    Ok(Json(serde_json::json!({
        "accepted": entry.is_some(),
        "entry": entry.as_ref().map(HistoryEntryView::from),
        "session": SessionView::from_session(&session_id, session),
    })))
}

/// Reject the pending diff; stale rejects are no-ops too
pub async fn reject_pending(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| not_found("Unknown session"))?;

    let rejected = session.reject();
    Ok(Json(serde_json::json!({
        "rejected": rejected,
        "session": SessionView::from_session(&session_id, session),
    })))
}

/// List the accepted-change history, oldest first
pub async fn list_history(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<HistoryEntryView>>, ApiError> {
    let sessions = state.sessions.lock().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| not_found("Unknown session"))?;

    Ok(Json(
        session.history().iter().map(HistoryEntryView::from).collect(),
    ))
}

/// Read-only view of a history entry's result document
pub async fn preview_entry(
    State(state): State<Arc<ApiState>>,
    Path((session_id, entry_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sessions = state.sessions.lock().await;
    let session = sessions
        .get(&session_id)
        .ok_or_else(|| not_found("Unknown session"))?;

    let document = session
        .preview(&entry_id)
        .ok_or_else(|| not_found("Unknown history entry"))?;
    Ok(Json(serde_json::json!({ "document": document })))
}

/// Stage a restoration of a history entry
pub async fn restore_entry(
    State(state): State<Arc<ApiState>>,
    Path((session_id, entry_id)): Path<(String, String)>,
) -> Result<Json<SessionView>, ApiError> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or_else(|| not_found("Unknown session"))?;

    if !session.restore(&entry_id) {
        return Err(not_found("Unknown history entry"));
    }
    Ok(Json(SessionView::from_session(&session_id, session)))
}
