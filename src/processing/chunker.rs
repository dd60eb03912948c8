//! Overlapping character windows for long documents

use crate::error::{Result, RelevanceError};

#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub content: String,
    /// Character offsets into the source text
    pub start_index: usize,
    pub end_index: usize,
    pub chunk_id: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size <= overlap {
            return Err(RelevanceError::Processing(
                "Chunk size must be greater than overlap".to_string(),
            ));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Split `text` into windows of at most `chunk_size` characters, breaking
    /// at whitespace or sentence punctuation where possible. Text that fits
    /// in one window comes back as a single chunk; blank text as none.
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let chars: Vec<char> = text.chars().collect();
        let total_length = chars.len();
        let mut chunks = Vec::new();

        let mut start = 0;
        while start < total_length {
            let end = (start + self.chunk_size).min(total_length);

            let mut actual_end = end;
            if end < total_length {
                if let Some(i) = (start + 1..end)
                    .rev()
                    .find(|&i| chars[i].is_whitespace() || matches!(chars[i], '.' | '!' | '?'))
                {
                    actual_end = i + 1;
                }
            }

            let content: String = chars[start..actual_end].iter().collect();
            let content = content.trim();
            if !content.is_empty() {
                chunks.push(TextChunk {
                    content: content.to_string(),
                    start_index: start,
                    end_index: actual_end,
                    chunk_id: chunks.len(),
                });
            }

            if actual_end >= total_length {
                break;
            }
            // Step back by the overlap but always make progress
            start = actual_end.saturating_sub(self.overlap).max(start + 1);
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(Chunker::new(50, 50).is_err());
        assert!(Chunker::new(50, 10).is_ok());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = Chunker::new(512, 50).unwrap();
        let chunks = chunker.chunk("  Python developer  ");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Python developer");
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        let chunker = Chunker::new(512, 50).unwrap();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   ").is_empty());
    }

    #[test]
    fn test_long_text_overlaps_and_covers() {
        let chunker = Chunker::new(40, 10).unwrap();
        let text = "Designed data pipelines. Built REST services in Rust. Led a team of five engineers. Migrated workloads to Kubernetes.";
        let chunks = chunker.chunk(text);

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 40));
        assert_eq!(chunks[0].start_index, 0);
        assert_eq!(chunks.last().unwrap().end_index, text.chars().count());
        for pair in chunks.windows(2) {
            assert!(pair[1].start_index < pair[0].end_index, "chunks should overlap");
            assert!(pair[1].start_index > pair[0].start_index);
        }
    }

    #[test]
    fn test_unbroken_text_is_still_split() {
        let chunker = Chunker::new(10, 2).unwrap();
        let text = "a".repeat(35);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() >= 4);
        assert!(chunks.iter().all(|c| c.content.len() <= 10));
    }
}
