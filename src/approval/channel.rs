use crate::approval::ReviewCard;
use crate::types::Result;
use async_trait::async_trait;

/// Discord's per-message character limit.
pub const MESSAGE_LIMIT: usize = 2000;

/// Where a card was posted, so it can be edited later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub channel_id: u64,
    pub message_id: u64,
}

/// The chat surface of the approval workflow.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Post a card with Approve/Reject controls bound to `request_id`.
    async fn send_card(&self, request_id: &str, card: &ReviewCard) -> Result<MessageRef>;

    /// Replace a card's text and remove its controls.
    async fn close_card(&self, message: &MessageRef, text: &str) -> Result<()>;

    async fn send_text(&self, text: &str) -> Result<()>;
}

/// Split text into chunks of at most `max_len` bytes, preferring line breaks.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    // `None` until a line starts the chunk; blank lines count as lines.
    let mut current: Option<String> = None;

    for line in text.lines() {
        if let Some(chunk) = current.take_if(|chunk| chunk.len() + line.len() + 1 > max_len) {
            push_chunk(&mut chunks, chunk);
        }

        let mut remaining = line;
        while remaining.len() > max_len {
            let cut = floor_char_boundary(remaining, max_len);
            chunks.push(remaining[..cut].to_string());
            remaining = &remaining[cut..];
        }

        match current.as_mut() {
            Some(chunk) => {
                chunk.push('\n');
                chunk.push_str(remaining);
            }
            None => current = Some(remaining.to_string()),
        }
    }

    if let Some(chunk) = current {
        push_chunk(&mut chunks, chunk);
    }
    chunks
}

fn push_chunk(chunks: &mut Vec<String>, chunk: String) {
    if !chunk.is_empty() {
        chunks.push(chunk);
    }
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
