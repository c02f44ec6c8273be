//! Text chunking for decomposition
//!
//! Overlapping character-bounded chunks, preferring paragraph breaks and
//! falling back to sentence breaks so a chunk rarely cuts mid-thought.

/// Maximum characters per chunk
pub const MAX_CHUNK_SIZE: usize = 8000;

/// Characters of overlap carried into the next chunk
pub const CHUNK_OVERLAP: usize = 200;

/// Split `text` into overlapping chunks of at most `max_chunk_size` bytes
#[must_use]
pub fn chunk_text(text: &str, max_chunk_size: usize, overlap: usize) -> Vec<String> {
    if text.len() <= max_chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < text.len() {
        let mut end = floor_char_boundary(text, (start + max_chunk_size).min(text.len()));

        if end < text.len() {
            let window = &text[start..end];
            if let Some(pos) = window.rfind("\n\n") {
                if pos > 0 {
                    end = start + pos;
                }
            } else if let Some(pos) = window.rfind(". ") {
                if pos > 0 {
                    end = start + pos + 1;
                }
            }
        }

        chunks.push(text[start..end].to_string());

        start = if end < text.len() {
            let candidate = floor_char_boundary(text, end.saturating_sub(overlap));
            if candidate > start {
                candidate
            } else {
                end
            }
        } else {
            end
        };
    }

    chunks
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}
