//! API wire models
//!
//! Request and response DTOs for the HTTP surface. Images cross the
//! boundary base64-encoded; decoding into domain attachments happens
//! here, before budget validation sees them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sketchpilot_core::{
    ConversationTurn, HistoryEntry, ImageAttachment, ImageFormat, PendingDiff, ProviderSelection,
    ReviewSession, ReviewState, TurnRole,
};

/// One image attachment on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireImage {
    /// Base64-encoded payload
    pub data: String,
    /// Declared format ("png" or "jpeg")
    pub format: ImageFormat,
}

/// One conversation turn on the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTurn {
    pub role: TurnRole,
    pub text: String,
    #[serde(default)]
    pub images: Vec<WireImage>,
}

/// Submit-turn request body
#[derive(Debug, Clone, Deserialize)]
pub struct TurnRequest {
    /// The new user message
    pub message: WireTurn,
    /// Prior conversation, oldest first
    #[serde(default)]
    pub history: Vec<WireTurn>,
    /// Provider routing
    pub provider: ProviderSelection,
}

/// Decode failure for a wire turn
#[derive(Debug, thiserror::Error)]
#[error("Image {index} is not valid base64: {reason}")]
pub struct DecodeError {
    pub index: usize,
    pub reason: String,
}

impl WireTurn {
    /// Decode into a domain turn
    pub fn decode(&self) -> Result<ConversationTurn, DecodeError> {
        let mut images = Vec::with_capacity(self.images.len());
        for (index, image) in self.images.iter().enumerate() {
            let bytes = BASE64.decode(&image.data).map_err(|e| DecodeError {
                index,
                reason: e.to_string(),
            })?;
            images.push(ImageAttachment {
                bytes,
                format: image.format,
            });
        }
        Ok(ConversationTurn {
            role: self.role,
            text: self.text.clone(),
            images,
        })
    }
}

/// Create-session request body
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    /// Initial sketch document
    #[serde(default)]
    pub document: String,
}

/// Apply-reply request body
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyReplyRequest {
    /// Full assistant reply text to extract code from
    pub reply: String,
    /// Stable key for the proposal (e.g. reply message id)
    #[serde(default)]
    pub patch_key: Option<String>,
}

/// Accept request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcceptRequest {
    /// Prompt that produced the change, recorded on the history entry
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Pending-diff view
#[derive(Debug, Clone, Serialize)]
pub struct PendingDiffView {
    pub candidate_document: String,
    pub baseline_document: String,
    pub patch_key: Option<String>,
    pub is_restore: bool,
}

impl From<&PendingDiff> for PendingDiffView {
    fn from(diff: &PendingDiff) -> Self {
        Self {
            candidate_document: diff.candidate_document.clone(),
            baseline_document: diff.baseline_document.clone(),
            patch_key: diff.patch_key.clone(),
            is_restore: diff.is_restore,
        }
    }
}

/// History-entry view (documents elided, summary kept)
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntryView {
    pub id: String,
    pub origin: sketchpilot_core::ChangeOrigin,
    pub timestamp: String,
    pub summary: String,
    pub prompt: Option<String>,
    pub is_restore: bool,
}

impl From<&HistoryEntry> for HistoryEntryView {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id.clone(),
            origin: entry.origin.clone(),
            timestamp: entry.timestamp.to_rfc3339(),
            summary: entry.summary.clone(),
            prompt: entry.prompt.clone(),
            is_restore: entry.is_restore,
        }
    }
}

/// Session snapshot returned by session endpoints
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: String,
    pub state: String,
    pub document: String,
    pub pending: Option<PendingDiffView>,
    pub rejected_patch_keys: Vec<String>,
}

impl SessionView {
    /// Snapshot a session under its id
    pub fn from_session(id: &str, session: &ReviewSession) -> Self {
        Self {
            id: id.to_string(),
            state: match session.state() {
                ReviewState::Clean => "clean".to_string(),
                ReviewState::Staged => "staged".to_string(),
            },
            document: session.document().to_string(),
            pending: session.pending().map(PendingDiffView::from),
            rejected_patch_keys: session.rejected_patch_keys().to_vec(),
        }
    }
}

/// Uniform error body for non-streaming failures
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_turn_decodes_base64_image() {
        let turn = WireTurn {
            role: TurnRole::User,
            text: "look".to_string(),
            images: vec![WireImage {
                data: BASE64.encode([0xFF, 0xD8, 0xFF, 0xE0]),
                format: ImageFormat::Jpeg,
            }],
        };

        let decoded = turn.decode().unwrap();
        assert_eq!(decoded.images.len(), 1);
        assert_eq!(decoded.images[0].bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
    }

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let turn = WireTurn {
            role: TurnRole::User,
            text: "x".to_string(),
            images: vec![WireImage {
                data: "!!not base64!!".to_string(),
                format: ImageFormat::Png,
            }],
        };

        let err = turn.decode().unwrap_err();
        assert_eq!(err.index, 0);
    }

    #[test]
    fn test_session_view_reports_state() {
        let mut session = ReviewSession::new("doc".to_string());
        let view = SessionView::from_session("s1", &session);
        assert_eq!(view.state, "clean");
        assert!(view.pending.is_none());

        session.stage(
            "doc2".to_string(),
            sketchpilot_core::ChangeOrigin::FullCode,
            None,
            false,
        );
        let view = SessionView::from_session("s1", &session);
        assert_eq!(view.state, "staged");
        assert_eq!(view.document, "doc");
        assert_eq!(view.pending.unwrap().candidate_document, "doc2");
    }
}
