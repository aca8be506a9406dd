//! Property tests: splitting a document into chunks never changes the output.
//!
//! 1. Documents assembled from construct fragments, split at arbitrary char
//!    boundaries.
//! 2. Arbitrary strings over the delimiter alphabet, split one char at a time.
//! 3. Byte streams split inside multi-byte characters.

use proptest::prelude::*;
use sxml::{Session, translate};
use sxml_test_support::harness::{ChunkPlan, run_chunked};

const PIECES: &[&str] = &[
    "(", ")", "((", "))", "(p ", "(ul\n  ", "(@id ", "(@class '", "'", "\"", "\\", "#", "#(",
    ")#", "(&nbsp ", "(&& ", "3", " ", "  ", "\n", "text", "é", "😀", "<", ">", "(br)",
];

fn arb_document() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(PIECES), 0..48).prop_map(|pieces| pieces.concat())
}

fn char_boundaries(source: &str) -> Vec<usize> {
    source.char_indices().map(|(idx, _)| idx).skip(1).collect()
}

fn feed_at(source: &str, cuts: &[usize]) -> String {
    let mut session = Session::new();
    let mut out = Vec::new();
    let mut last = 0usize;
    for &cut in cuts {
        session.feed_into(&source[last..cut], &mut out);
        last = cut;
    }
    session.feed_into(&source[last..], &mut out);
    out.concat()
}

proptest! {
    #[test]
    fn fragment_documents_are_chunk_invariant(
        source in arb_document(),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..12),
    ) {
        let boundaries = char_boundaries(&source);
        let mut cuts: Vec<usize> = if boundaries.is_empty() {
            Vec::new()
        } else {
            picks.iter().map(|pick| *pick.get(&boundaries)).collect()
        };
        cuts.sort_unstable();
        cuts.dedup();
        prop_assert_eq!(feed_at(&source, &cuts), translate(&source), "cuts: {:?}", cuts);
    }

    #[test]
    fn delimiter_soup_char_at_a_time(source in "[()#@&'\"\\\\ \na-c]{0,64}") {
        let cuts = char_boundaries(&source);
        prop_assert_eq!(feed_at(&source, &cuts), translate(&source));
    }

    #[test]
    fn byte_stream_splits(source in arb_document(), size in 1usize..5) {
        let chunked = run_chunked(&source, &ChunkPlan::fixed_unaligned(size));
        prop_assert_eq!(chunked, translate(&source));
    }
}
