//! Sliding-window re-segmentation applied uniformly to parser output.

use repowiki_domain::constants::{CHUNK_TOKEN_BUDGET, SLIDING_WINDOW_OVERLAP_LINES};
use repowiki_domain::entities::Chunk;
use repowiki_domain::value_objects::ChunkId;

/// Re-segment any chunk whose approximate token count exceeds
/// [`CHUNK_TOKEN_BUDGET`] into overlapping line-window fragments, each typed
/// `<original_type>_part`. Chunks within budget pass through unchanged.
#[must_use]
pub fn apply_sliding_window(chunks: Vec<Chunk>) -> Vec<Chunk> {
    chunks
        .into_iter()
        .flat_map(split_if_oversized)
        .collect()
}

fn split_if_oversized(chunk: Chunk) -> Vec<Chunk> {
    if chunk.approx_tokens() <= CHUNK_TOKEN_BUDGET {
        return vec![chunk];
    }

    let lines: Vec<&str> = chunk.content.lines().collect();
    if lines.len() <= 1 {
        return vec![chunk];
    }

    // Token budget in lines, approximated the same way as approx_tokens:
    // len/4 tokens, so window_lines * avg_line_len/4 <= budget.
    let avg_line_len = (chunk.content.len() / lines.len()).max(1);
    let window_lines = ((CHUNK_TOKEN_BUDGET * 4) / avg_line_len).max(1);
    let overlap = SLIDING_WINDOW_OVERLAP_LINES.min(window_lines.saturating_sub(1));
    let stride = (window_lines - overlap).max(1);

    let mut parts = Vec::new();
    let mut start = 0usize;
    let part_type = format!("{}_part", chunk.node_type);

    while start < lines.len() {
        let end = (start + window_lines).min(lines.len());
        let body = lines[start..end].join("\n");
        parts.push(Chunk {
            id: ChunkId::new(),
            repo_id: chunk.repo_id,
            file_path: chunk.file_path.clone(),
            node_type: part_type.clone(),
            symbol_name: chunk.symbol_name.clone(),
            start_line: chunk.start_line + start,
            end_line: chunk.start_line + end - 1,
            content: body,
            language: chunk.language.clone(),
            parent_chunk_id: Some(chunk.id),
            called_symbols: chunk.called_symbols.clone(),
            docstring: if start == 0 { chunk.docstring.clone() } else { None },
            metadata: chunk.metadata.clone(),
        });

        if end == lines.len() {
            break;
        }
        start += stride;
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use repowiki_domain::value_objects::RepositoryId;

    fn chunk_with_lines(n: usize, line_len: usize) -> Chunk {
        let line = "x".repeat(line_len);
        let content = std::iter::repeat(line).take(n).collect::<Vec<_>>().join("\n");
        Chunk {
            id: ChunkId::new(),
            repo_id: RepositoryId::new(),
            file_path: "big.rs".to_owned(),
            node_type: "function".to_owned(),
            symbol_name: Some("big".to_owned()),
            start_line: 1,
            end_line: n,
            content,
            language: "rust".to_owned(),
            parent_chunk_id: None,
            called_symbols: vec![],
            docstring: None,
            metadata: None,
        }
    }

    #[test]
    fn chunk_within_budget_is_not_split() {
        let chunk = chunk_with_lines(10, 4);
        let out = apply_sliding_window(vec![chunk]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].node_type, "function");
    }

    #[test]
    fn oversized_chunk_splits_with_overlap() {
        // 4 chars/line * 4 = 16 tokens/line approx; budget 6000 tokens -> window ~1500 lines.
        // Force oversized by using huge line length instead.
        let chunk = chunk_with_lines(200, 200);
        let out = apply_sliding_window(vec![chunk.clone()]);
        assert!(out.len() > 1);
        assert!(out.iter().all(|c| c.node_type == "function_part"));
        assert!(out.iter().all(|c| c.parent_chunk_id == Some(chunk.id)));
    }
}
