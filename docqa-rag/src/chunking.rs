//! Fixed-size text chunking with overlap.

/// A strategy for splitting extracted text into chunks.
///
/// Implementations return plain text windows in document order; chunk ids
/// and metadata are assigned by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split text into ordered chunks. Empty input yields an empty `Vec`.
    fn chunk(&self, text: &str) -> Vec<String>;
}

/// Splits text into fixed-size windows by character count with overlap.
///
/// Consecutive windows share `chunk_overlap` characters so context is
/// preserved across chunk boundaries; the tail window may be shorter than
/// `chunk_size`. Window boundaries always fall on `char` boundaries, so
/// multi-byte text is never split mid-scalar.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — characters shared between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        if text.is_empty() || self.chunk_size == 0 {
            return Vec::new();
        }

        // Byte offset of each char boundary, plus the end of the string.
        let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        bounds.push(text.len());
        let char_count = bounds.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < char_count {
            let end = (start + self.chunk_size).min(char_count);
            chunks.push(text[bounds[start]..bounds[end]].to_string());

            let step = self.chunk_size.saturating_sub(self.chunk_overlap);
            if step == 0 {
                break;
            }
            start += step;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunker = FixedSizeChunker::new(500, 50);
        assert!(chunker.chunk("").is_empty());
    }

    #[test]
    fn short_input_is_a_single_chunk() {
        let chunker = FixedSizeChunker::new(500, 50);
        let chunks = chunker.chunk("short text");
        assert_eq!(chunks, vec!["short text".to_string()]);
    }

    #[test]
    fn twelve_hundred_chars_make_three_overlapping_chunks() {
        let text: String = (0..1200).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunker = FixedSizeChunker::new(500, 50);
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 500);
        assert_eq!(chunks[1].chars().count(), 500);
        assert_eq!(chunks[2].chars().count(), 300);

        // Consecutive chunks share a 50-char suffix/prefix.
        for pair in chunks.windows(2) {
            let suffix: String = pair[0].chars().skip(450).collect();
            let prefix: String = pair[1].chars().take(50).collect();
            assert_eq!(suffix, prefix);
        }
    }

    #[test]
    fn windows_fall_on_char_boundaries() {
        let text = "héllo wörld ".repeat(100);
        let chunker = FixedSizeChunker::new(64, 8);
        let chunks = chunker.chunk(&text);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 64);
        }
    }

    #[test]
    fn overlap_equal_to_size_stops_after_first_window() {
        let chunker = FixedSizeChunker::new(10, 10);
        let chunks = chunker.chunk("abcdefghijklmnop");
        assert_eq!(chunks, vec!["abcdefghij".to_string()]);
    }

    #[test]
    fn no_text_is_lost_across_boundaries() {
        let text: String = (0..997).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunker = FixedSizeChunker::new(100, 20);
        let chunks = chunker.chunk(&text);

        // Dropping each chunk's leading overlap reconstructs the input.
        let mut rebuilt = chunks[0].clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.chars().skip(20));
        }
        assert_eq!(rebuilt, text);
    }
}
