//! Request budget validation
//!
//! Every inbound conversation turn passes through `validate` before any
//! provider call is made. Checks run in a fixed order and short-circuit on
//! the first violated ceiling; nothing is partially applied. The only
//! intentionally lossy step is history truncation, which is a documented
//! policy rather than a failure.

use crate::config::BudgetConfig;
use crate::types::{ConversationTurn, ImageFormat};
use tracing::debug;

/// Validation errors — each names the ceiling that was exceeded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Image {index} declared as {declared} but payload bytes do not match that format")]
    ImageFormatMismatch { index: usize, declared: &'static str },

    #[error("Image {index} is {size} bytes, exceeding the per-image limit of {limit} bytes")]
    ImageTooLarge {
        index: usize,
        size: usize,
        limit: usize,
    },

    #[error("Request carries {count} images, exceeding the limit of {limit}")]
    TooManyImages { count: usize, limit: usize },

    #[error("Combined image payload is {total} bytes, exceeding the limit of {limit} bytes")]
    ImageBytesExceeded { total: usize, limit: usize },

    #[error("Message is {size} bytes of text, exceeding the per-message limit of {limit} bytes")]
    MessageTooLong { size: usize, limit: usize },
}

/// An inbound turn plus its conversation tail, before validation
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// The new user turn
    pub message: ConversationTurn,
    /// Prior conversation, oldest first, without the system turn
    pub history: Vec<ConversationTurn>,
}

/// A validated request whose budget invariants hold
///
/// Construction goes through [`validate`] only; the history tail has
/// already been truncated to the configured message-count and byte
/// ceilings.
#[derive(Debug, Clone)]
pub struct BudgetedRequest {
    pub message: ConversationTurn,
    pub history: Vec<ConversationTurn>,
}

/// Validate a request against the configured ceilings
///
/// Check order, short-circuiting on first failure:
/// 1. per-image magic-byte check against the declared media type
/// 2. per-image size ceiling
/// 3. combined image count and byte ceilings across message + history
/// 4. per-message text ceiling (current message and history alike)
/// 5. history truncation (lossy by design, oldest messages dropped)
pub fn validate(
    request: InboundRequest,
    budget: &BudgetConfig,
) -> Result<BudgetedRequest, ValidationError> {
    let mut image_count = 0usize;
    let mut image_bytes = 0usize;

    // Walk every image in the current message first, then the history
    // tail, keeping running totals so the first violation wins.
    for turn in std::iter::once(&request.message).chain(request.history.iter()) {
        for (index, image) in turn.images.iter().enumerate() {
            if !image.matches_declared_format() {
                let declared = match image.format {
                    ImageFormat::Png => "png",
                    ImageFormat::Jpeg => "jpeg",
                };
                return Err(ValidationError::ImageFormatMismatch { index, declared });
            }
            if image.bytes.len() > budget.max_image_bytes {
                return Err(ValidationError::ImageTooLarge {
                    index,
                    size: image.bytes.len(),
                    limit: budget.max_image_bytes,
                });
            }
            image_count += 1;
            image_bytes += image.bytes.len();
            if image_count > budget.max_images {
                return Err(ValidationError::TooManyImages {
                    count: image_count,
                    limit: budget.max_images,
                });
            }
            if image_bytes > budget.max_total_image_bytes {
                return Err(ValidationError::ImageBytesExceeded {
                    total: image_bytes,
                    limit: budget.max_total_image_bytes,
                });
            }
        }
    }

    // Step 4: per-message text ceiling
    for turn in std::iter::once(&request.message).chain(request.history.iter()) {
        if turn.text.len() > budget.max_message_text_bytes {
            return Err(ValidationError::MessageTooLong {
                size: turn.text.len(),
                limit: budget.max_message_text_bytes,
            });
        }
    }

    // Step 5: history truncation
    let history = truncate_history(request.history, budget);

    Ok(BudgetedRequest {
        message: request.message,
        history,
    })
}

/// Truncate a conversation tail to the configured ceilings
///
/// Keeps the most recent `max_history_messages`, then walks newest to
/// oldest accumulating text bytes, keeping a message only while the
/// running total stays under `max_history_text_bytes`. Original order is
/// restored. Idempotent: a conforming tail passes through unchanged.
pub fn truncate_history(
    mut history: Vec<ConversationTurn>,
    budget: &BudgetConfig,
) -> Vec<ConversationTurn> {
    let original_len = history.len();

    // Most recent N messages
    if history.len() > budget.max_history_messages {
        let drop = history.len() - budget.max_history_messages;
        history.drain(..drop);
    }

    // Newest-to-oldest byte accumulation
    let mut kept: Vec<ConversationTurn> = Vec::with_capacity(history.len());
    let mut total_bytes = 0usize;
    for turn in history.into_iter().rev() {
        if total_bytes + turn.text.len() > budget.max_history_text_bytes {
            break;
        }
        total_bytes += turn.text.len();
        kept.push(turn);
    }
    kept.reverse();

    if kept.len() < original_len {
        debug!(
            dropped = original_len - kept.len(),
            kept = kept.len(),
            "History tail truncated to fit budget"
        );
    }

    kept
}
