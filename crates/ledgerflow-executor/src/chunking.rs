use text_splitter::{ChunkConfig, TextSplitter};

/// Splits one page's text into content chunks per the configured chunk
/// size/overlap (characters), capped at `max_chunks`.
/// Truncation past the cap is logged, not silent.
pub fn chunk_page_text(text: &str, chunk_size: usize, overlap: usize, max_chunks: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let config = ChunkConfig::new(chunk_size)
        .with_overlap(overlap)
        .expect("chunk overlap must be smaller than chunk size");
    let splitter = TextSplitter::new(config);

    let mut chunks: Vec<String> = splitter.chunks(text).map(|s| s.to_string()).collect();

    if chunks.len() > max_chunks {
        tracing::warn!(
            produced = chunks.len(),
            kept = max_chunks,
            "page produced more chunks than max_chunks_per_page; truncating"
        );
        chunks.truncate(max_chunks);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_page_text("   ", 400, 80, 10).is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk_page_text("Revenue grew 12% year over year.", 400, 80, 10);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn long_text_is_split_and_capped() {
        let text = "word ".repeat(2000);
        let chunks = chunk_page_text(&text, 50, 10, 3);
        assert_eq!(chunks.len(), 3);
    }
}
