//! Deterministic and seeded chunk plans for streaming coverage.
//!
//! Fuzz plans are seeded so a failing plan can be replayed from its label.

use crate::harness::{BoundaryPolicy, ChunkPlan, filter_boundaries_by_policy};

#[derive(Clone, Debug)]
pub struct ChunkPlanCase {
    pub label: String,
    pub plan: ChunkPlan,
}

#[derive(Clone, Copy, Debug)]
pub struct ChunkerConfig {
    pub policy: BoundaryPolicy,
}

impl ChunkerConfig {
    pub fn utf8() -> Self {
        Self {
            policy: BoundaryPolicy::Utf8Aligned,
        }
    }

    pub fn byte_stream() -> Self {
        Self {
            policy: BoundaryPolicy::ByteStream,
        }
    }
}

/// Bytes around which a split is most likely to land inside a construct.
const SIGNIFICANT: &[u8] = b"()#'\"\\@&";

/// Build deterministic and fuzz chunk plans for `input`.
///
/// Deterministic plans cover fixed sizes and splits on both sides of every
/// form delimiter, quote, backslash and discriminator.
pub fn build_chunk_plans(
    input: &str,
    fuzz_runs: usize,
    fuzz_seed: u64,
    config: ChunkerConfig,
) -> Vec<ChunkPlanCase> {
    let policy = config.policy;
    let mut plans = Vec::new();

    for size in [1usize, 2, 3, 4, 8, 16, 32, 64] {
        plans.push(ChunkPlanCase {
            label: format!("fixed size={size} policy={policy}"),
            plan: match policy {
                BoundaryPolicy::Utf8Aligned => ChunkPlan::fixed(size),
                BoundaryPolicy::ByteStream => ChunkPlan::fixed_unaligned(size),
            },
        });
    }

    let token_boundaries = token_boundary_indices(input, policy);
    if !token_boundaries.is_empty() {
        plans.push(ChunkPlanCase {
            label: format!("token-boundaries count={}", token_boundaries.len()),
            plan: boundaries_plan(token_boundaries.clone(), policy),
        });
    }

    if fuzz_runs > 0 {
        let mut candidates = char_boundaries(input, policy);
        candidates.extend_from_slice(&token_boundaries);
        candidates.sort_unstable();
        candidates.dedup();
        for i in 0..fuzz_runs {
            let seed = fuzz_seed.wrapping_add(i as u64);
            let mut rng = Lcg::new(seed);
            let plan = if candidates.is_empty() {
                ChunkPlan::fixed(1)
            } else {
                let max = candidates.len().clamp(1, 32);
                let mut picks = candidates.clone();
                rng.shuffle(&mut picks);
                picks.truncate(1 + rng.gen_range(max));
                picks.sort_unstable();
                boundaries_plan(picks, policy)
            };
            plans.push(ChunkPlanCase {
                label: format!("fuzz boundaries seed=0x{seed:016x}"),
                plan,
            });
        }
    }

    plans
}

pub fn build_chunk_plans_utf8(input: &str, fuzz_runs: usize, fuzz_seed: u64) -> Vec<ChunkPlanCase> {
    build_chunk_plans(input, fuzz_runs, fuzz_seed, ChunkerConfig::utf8())
}

/// Seed for fuzz plans: `SXML_FUZZ_SEED` (decimal or `0x` hex) or `default`.
pub fn fuzz_seed_from_env(default: u64) -> u64 {
    std::env::var("SXML_FUZZ_SEED")
        .ok()
        .and_then(|raw| parse_seed(raw.trim()))
        .unwrap_or(default)
}

/// Number of fuzz plans per input: `SXML_FUZZ_RUNS` or `default`.
pub fn fuzz_runs_from_env(default: usize) -> usize {
    std::env::var("SXML_FUZZ_RUNS")
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_seed(raw: &str) -> Option<u64> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

fn boundaries_plan(indices: Vec<usize>, policy: BoundaryPolicy) -> ChunkPlan {
    match policy {
        BoundaryPolicy::Utf8Aligned => ChunkPlan::boundaries(indices),
        BoundaryPolicy::ByteStream => ChunkPlan::boundaries_unaligned(indices),
    }
}

fn token_boundary_indices(input: &str, policy: BoundaryPolicy) -> Vec<usize> {
    let mut out = Vec::new();
    for (i, b) in input.bytes().enumerate() {
        if SIGNIFICANT.contains(&b) {
            out.push(i);
            out.push(i + 1);
        }
    }
    out.sort_unstable();
    out.dedup();
    filter_boundaries_by_policy(input, &out, policy)
}

fn char_boundaries(input: &str, policy: BoundaryPolicy) -> Vec<usize> {
    let indices: Vec<usize> = match policy {
        BoundaryPolicy::Utf8Aligned => input.char_indices().map(|(idx, _)| idx).collect(),
        BoundaryPolicy::ByteStream => (0..input.len()).collect(),
    };
    filter_boundaries_by_policy(input, &indices, policy)
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn gen_range(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() >> 32) as usize % upper
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.gen_range(i + 1);
            items.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_boundaries_bracket_each_delimiter() {
        let indices = token_boundary_indices("a(b)", BoundaryPolicy::Utf8Aligned);
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn fuzz_plans_are_reproducible() {
        let input = "(p (@a 'x\\'y') #(raw)# (&nbsp 3))";
        let first = build_chunk_plans_utf8(input, 4, 7);
        let second = build_chunk_plans_utf8(input, 4, 7);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.label, b.label);
            assert_eq!(a.plan, b.plan);
        }
    }

    #[test]
    fn seeds_parse_in_both_radixes() {
        assert_eq!(parse_seed("0x10"), Some(16));
        assert_eq!(parse_seed("42"), Some(42));
        assert_eq!(parse_seed("nope"), None);
    }
}
