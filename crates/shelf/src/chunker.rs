//! Fixed-size text chunking for papers.

use crate::types::ChunkCandidate;

/// Chunk text into segments of `chunk_size` characters.
///
/// Sizes are counted in characters, so multi-byte text never splits inside a
/// code point. Consecutive chunks share `overlap` characters; papers use no
/// overlap by default. Whitespace-only chunks are dropped.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<ChunkCandidate> {
    if text.is_empty() || chunk_size == 0 {
        return vec![];
    }

    // Byte offset of every char boundary, plus the end of the string
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0;

    while start < char_count {
        let end = (start + chunk_size).min(char_count);
        let chunk_text = &text[boundaries[start]..boundaries[end]];

        if !chunk_text.trim().is_empty() {
            chunks.push(ChunkCandidate {
                position,
                text: chunk_text.to_string(),
            });
            position += 1;
        }

        if end == char_count {
            break;
        }
        start += step;
    }

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_no_overlap() {
        let text = "a".repeat(1200);
        let chunks = chunk_text(&text, 500, 0);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.len(), 500);
        assert_eq!(chunks[1].text.len(), 500);
        assert_eq!(chunks[2].text.len(), 200);
        assert_eq!(chunks[2].position, 2);
    }

    #[test]
    fn test_chunks_concatenate_to_original() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(30);
        let chunks = chunk_text(&text, 64, 0);

        let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("", 100, 0).is_empty());
        assert!(chunk_text("   \n  ", 100, 0).is_empty());
    }

    #[test]
    fn test_chunk_text_counts_chars_not_bytes() {
        let text = "é".repeat(10);
        let chunks = chunk_text(&text, 4, 0);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.chars().count(), 4);
        assert_eq!(chunks[2].text.chars().count(), 2);
    }

    #[test]
    fn test_chunk_text_with_overlap() {
        let text = "abcdefghij";
        let chunks = chunk_text(text, 4, 2);

        assert_eq!(chunks[0].text, "abcd");
        assert_eq!(chunks[1].text, "cdef");
        assert_eq!(chunks.last().map(|c| c.text.as_str()), Some("ghij"));
    }
}
