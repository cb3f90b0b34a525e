//! Properties of the boundary chunker: exact overlap reconstruction,
//! single-chunk short texts, and precondition validation.

use askdocs_rag::chunking::{BoundaryChunker, Chunker};
use askdocs_rag::document::Document;
use askdocs_rag::error::RagError;
use proptest::prelude::*;

/// ASCII text plus independently valid (size, overlap) parameters.
fn arb_text_and_params() -> impl Strategy<Value = (String, usize, usize)> {
    ("[a-z .\\n]{0,3000}", 2usize..400).prop_flat_map(|(text, size)| {
        (Just(text), Just(size), 0usize..size)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Concatenating the first slice with every later slice minus its first
    /// `overlap` bytes reconstructs the input exactly.
    #[test]
    fn overlap_removal_reconstructs_input((text, size, overlap) in arb_text_and_params()) {
        let chunker = BoundaryChunker::new(size, overlap).unwrap();
        let slices = chunker.split(&text);

        prop_assert!(!slices.is_empty());
        let mut rebuilt = String::from(slices[0]);
        for slice in &slices[1..] {
            prop_assert!(slice.len() > overlap);
            rebuilt.push_str(&slice[overlap..]);
        }
        prop_assert_eq!(rebuilt, text);
    }

    /// Every slice is at most `size` bytes and consecutive slices share exactly
    /// `overlap` bytes.
    #[test]
    fn slices_respect_size_and_overlap((text, size, overlap) in arb_text_and_params()) {
        let chunker = BoundaryChunker::new(size, overlap).unwrap();
        let slices = chunker.split(&text);

        for slice in &slices {
            prop_assert!(slice.len() <= size);
        }
        for pair in slices.windows(2) {
            let tail = &pair[0][pair[0].len() - overlap..];
            let head = &pair[1][..overlap];
            prop_assert_eq!(tail, head);
        }
    }

    /// Text no longer than the chunk size yields exactly one chunk equal to
    /// the whole text.
    #[test]
    fn short_text_is_a_single_chunk(text in "[a-z .]{0,100}", size in 100usize..500) {
        let chunker = BoundaryChunker::new(size, 10).unwrap();
        let slices = chunker.split(&text);
        prop_assert_eq!(slices, vec![text.as_str()]);
    }
}

#[test]
fn hard_cuts_give_three_chunks_for_2500_chars() {
    // No natural boundaries, so cuts land exactly at the window ends and the
    // final window absorbs the tail: 1000 + 1000 + 900 with stride 800.
    let text = "a".repeat(2500);
    let chunker = BoundaryChunker::new(1000, 200).unwrap();
    let slices = chunker.split(&text);
    assert_eq!(slices.iter().map(|s| s.len()).collect::<Vec<_>>(), vec![1000, 1000, 900]);
}

#[test]
fn cuts_prefer_word_boundaries() {
    let words: Vec<String> = (0..200).map(|i| format!("word{i:03}")).collect();
    let text = words.join(" ");
    let chunker = BoundaryChunker::new(100, 20).unwrap();
    let slices = chunker.split(&text);
    assert!(slices.len() > 1);
    // Every non-final cut lands after a space, so slices never sever a word.
    for slice in &slices[..slices.len() - 1] {
        assert!(slice.ends_with(' '), "slice severed a word: {slice:?}");
    }
}

#[test]
fn multibyte_text_never_splits_a_char() {
    // Slicing off a char boundary panics, so surviving split() is the check.
    let text = "héllo wörld ünïcode ".repeat(50);
    let chunker = BoundaryChunker::new(64, 16).unwrap();
    let slices = chunker.split(&text);
    assert!(slices.len() > 1);
    assert!(slices.iter().all(|s| s.len() <= 64));
    assert!(text.starts_with(slices[0]));
    assert!(text.ends_with(slices[slices.len() - 1]));
}

#[test]
fn chunk_metadata_is_contiguous_and_inherited() {
    let mut document = Document::new("notes.txt", "alpha beta gamma ".repeat(100));
    document.metadata.insert("description".to_string(), "test".to_string());

    let chunker = BoundaryChunker::new(200, 40).unwrap();
    let chunks = chunker.chunk(&document);

    assert!(chunks.len() > 1);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.sequence_index, i);
        assert_eq!(chunk.document_id, document.id);
        assert_eq!(chunk.filename, "notes.txt");
        assert_eq!(chunk.metadata.get("description").map(String::as_str), Some("test"));
        assert!(chunk.embedding.is_empty());
    }
}

#[test]
fn invalid_parameters_are_rejected() {
    assert!(matches!(BoundaryChunker::new(0, 0), Err(RagError::InvalidArgument(_))));
    assert!(matches!(BoundaryChunker::new(100, 100), Err(RagError::InvalidArgument(_))));
    assert!(matches!(BoundaryChunker::new(100, 150), Err(RagError::InvalidArgument(_))));
    assert!(BoundaryChunker::new(100, 99).is_ok());
}
