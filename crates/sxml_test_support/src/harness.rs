//! Chunk plans and whole/chunked translation runners.

use std::fmt;

use sxml::Session;
use tools::utf8::Utf8Decoder;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BoundaryPolicy {
    /// Enforce UTF-8 aligned boundaries between chunks.
    Utf8Aligned,
    /// Byte-stream mode; chunks go through the incremental decoder.
    ByteStream,
}

impl fmt::Display for BoundaryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryPolicy::Utf8Aligned => f.write_str("utf8"),
            BoundaryPolicy::ByteStream => f.write_str("bytes"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ChunkPlan {
    Fixed {
        size: usize,
        policy: BoundaryPolicy,
    },
    Sizes {
        sizes: Vec<usize>,
        policy: BoundaryPolicy,
    },
    Boundaries {
        indices: Vec<usize>,
        policy: BoundaryPolicy,
    },
}

impl fmt::Display for ChunkPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkPlan::Fixed { size, policy } => write!(f, "fixed size={size} policy={policy}"),
            ChunkPlan::Sizes { sizes, policy } => {
                write!(f, "sizes count={} policy={policy} sizes={sizes:?}", sizes.len())
            }
            ChunkPlan::Boundaries { indices, policy } => write!(
                f,
                "boundaries count={} policy={policy} indices={indices:?}",
                indices.len()
            ),
        }
    }
}

impl ChunkPlan {
    pub fn fixed(size: usize) -> Self {
        Self::Fixed {
            size,
            policy: BoundaryPolicy::Utf8Aligned,
        }
    }

    pub fn fixed_unaligned(size: usize) -> Self {
        Self::Fixed {
            size,
            policy: BoundaryPolicy::ByteStream,
        }
    }

    pub fn sizes(sizes: impl Into<Vec<usize>>) -> Self {
        Self::Sizes {
            sizes: sizes.into(),
            policy: BoundaryPolicy::Utf8Aligned,
        }
    }

    pub fn boundaries(indices: impl Into<Vec<usize>>) -> Self {
        Self::Boundaries {
            indices: indices.into(),
            policy: BoundaryPolicy::Utf8Aligned,
        }
    }

    pub fn boundaries_unaligned(indices: impl Into<Vec<usize>>) -> Self {
        Self::Boundaries {
            indices: indices.into(),
            policy: BoundaryPolicy::ByteStream,
        }
    }

    pub fn policy(&self) -> BoundaryPolicy {
        match self {
            ChunkPlan::Fixed { policy, .. }
            | ChunkPlan::Sizes { policy, .. }
            | ChunkPlan::Boundaries { policy, .. } => *policy,
        }
    }

    pub fn for_each_chunk(&self, input: &str, mut f: impl FnMut(&[u8])) {
        let bytes = input.as_bytes();
        match self {
            ChunkPlan::Fixed { size, policy } => {
                assert!(*size > 0, "chunk size must be > 0");
                let mut offset = 0usize;
                while offset < bytes.len() {
                    let mut end = (offset + size).min(bytes.len());
                    if *policy == BoundaryPolicy::Utf8Aligned {
                        while !input.is_char_boundary(end) {
                            end += 1;
                        }
                    }
                    f(&bytes[offset..end]);
                    offset = end;
                }
            }
            ChunkPlan::Sizes { sizes, policy } => {
                let mut offset = 0usize;
                for size in sizes {
                    assert!(*size > 0, "chunk size must be > 0");
                    if offset >= bytes.len() {
                        break;
                    }
                    let end = (offset + size).min(bytes.len());
                    assert_chunk_boundary(input, end, *policy, "sizes-end");
                    f(&bytes[offset..end]);
                    offset = end;
                }
                if offset < bytes.len() {
                    f(&bytes[offset..]);
                }
            }
            ChunkPlan::Boundaries { indices, policy } => {
                let mut points = filter_boundaries_by_policy(input, indices, *policy);
                points.sort_unstable();
                points.dedup();
                let mut last = 0usize;
                for idx in points {
                    f(&bytes[last..idx]);
                    last = idx;
                }
                if last < bytes.len() {
                    f(&bytes[last..]);
                }
            }
        }
    }
}

fn assert_chunk_boundary(input: &str, idx: usize, policy: BoundaryPolicy, context: &str) {
    if policy == BoundaryPolicy::Utf8Aligned {
        assert!(
            input.is_char_boundary(idx),
            "chunk boundary must be UTF-8 aligned ({context}): {idx}"
        );
    }
}

/// Drop boundaries outside `(0, len)` and, for aligned plans, those inside a
/// multi-byte character.
pub(crate) fn filter_boundaries_by_policy(
    input: &str,
    indices: &[usize],
    policy: BoundaryPolicy,
) -> Vec<usize> {
    let len = input.len();
    indices
        .iter()
        .copied()
        .filter(|&idx| idx > 0 && idx < len)
        .filter(|&idx| policy == BoundaryPolicy::ByteStream || input.is_char_boundary(idx))
        .collect()
}

/// Translate `input` in a single chunk.
pub fn run_whole(input: &str) -> String {
    let mut session = Session::new();
    session.feed(input).concat()
}

/// Translate `input` chunk by chunk according to `plan`.
pub fn run_chunked(input: &str, plan: &ChunkPlan) -> String {
    run_chunked_with_count(input, plan).0
}

/// Like [`run_chunked`], also returning how many chunks were fed.
pub fn run_chunked_with_count(input: &str, plan: &ChunkPlan) -> (String, usize) {
    let mut session = Session::new();
    let mut decoder = Utf8Decoder::new();
    let mut fragments = Vec::new();
    let mut text = String::new();
    let mut chunks = 0usize;
    plan.for_each_chunk(input, |bytes| {
        chunks += 1;
        text.clear();
        decoder.push(bytes, &mut text);
        session.feed_into(&text, &mut fragments);
    });
    text.clear();
    decoder.finish(&mut text);
    session.feed_into(&text, &mut fragments);
    (fragments.concat(), chunks)
}
