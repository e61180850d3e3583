/// AWS Polly accepts at most 3000 characters per synthesis request
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 3000;

/// A word-aligned slice of the source text and its position in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

impl Chunk {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Split text into chunks of at most `max_chunk_chars` characters without
/// breaking words.
///
/// Words are packed greedily and joined by a single space. A word longer than
/// the bound is emitted alone in its own chunk. Whitespace-only input yields
/// no chunks.
pub fn split_into_chunks(text: &str, max_chunk_chars: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if !current.is_empty() && current_len + 1 + word_len > max_chunk_chars {
            chunks.push(Chunk {
                index: chunks.len(),
                text: std::mem::take(&mut current),
            });
            current_len = 0;
        }

        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(Chunk {
            index: chunks.len(),
            text: current,
        });
    }

    chunks
}
