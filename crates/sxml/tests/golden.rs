use std::path::{Path, PathBuf};

use sxml_test_support::chunker::{
    ChunkerConfig, build_chunk_plans, fuzz_runs_from_env, fuzz_seed_from_env,
};
use sxml_test_support::fixtures::{FixtureFilter, FixtureStatus, GoldenCase, load_golden};
use sxml_test_support::harness::{run_chunked, run_whole};
use sxml_test_support::{diff_text, escape_text};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mode {
    WholeInput,
    ChunkedInput,
}

impl Mode {
    fn label(self) -> &'static str {
        match self {
            Mode::WholeInput => "whole",
            Mode::ChunkedInput => "chunked",
        }
    }
}

fn manifest_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("golden.toml")
}

fn load_cases() -> Vec<GoldenCase> {
    let path = manifest_path();
    load_golden(&path).unwrap_or_else(|err| panic!("{err}"))
}

fn enforce_expected(case: &GoldenCase, actual: &str, mode: Mode, plan_label: Option<&str>) {
    let mismatch = actual != case.expected;
    let label = match plan_label {
        Some(plan) => format!("{} ({plan})", mode.label()),
        None => mode.label().to_string(),
    };
    match case.status {
        FixtureStatus::Active => {
            if mismatch {
                panic!(
                    "output mismatch in fixture '{}' [{label}]\ninput: \"{}\"\n{}",
                    case.name,
                    escape_text(&case.input),
                    diff_text(&case.expected, actual)
                );
            }
        }
        FixtureStatus::Xfail => {
            if !mismatch {
                panic!(
                    "fixture '{}' [{label}] matched but is marked xfail; reason: {}",
                    case.name,
                    case.reason.as_deref().unwrap_or("<missing reason>")
                );
            }
        }
        FixtureStatus::Skip => {}
    }
}

#[test]
fn golden_whole_input() {
    let filter = FixtureFilter::from_env("SXML_GOLDEN_FIXTURE");
    let mut ran = 0usize;
    for case in load_cases() {
        if !filter.matches(&case.name) {
            continue;
        }
        ran += 1;
        if case.status == FixtureStatus::Skip {
            continue;
        }
        let actual = run_whole(&case.input);
        enforce_expected(&case, &actual, Mode::WholeInput, None);
    }
    assert!(ran > 0, "no fixtures matched filter");
}

#[test]
fn golden_chunked_input() {
    let filter = FixtureFilter::from_env("SXML_GOLDEN_FIXTURE");
    let mut fuzz_runs = fuzz_runs_from_env(4);
    if std::env::var("CI").is_ok() && fuzz_runs == 0 {
        fuzz_runs = 1;
    }
    let fuzz_seed = fuzz_seed_from_env(0x5E_4D_11);
    let mut ran = 0usize;
    for case in load_cases() {
        if !filter.matches(&case.name) {
            continue;
        }
        ran += 1;
        if case.status == FixtureStatus::Skip {
            continue;
        }
        let whole = run_whole(&case.input);
        for config in [ChunkerConfig::utf8(), ChunkerConfig::byte_stream()] {
            for plan in build_chunk_plans(&case.input, fuzz_runs, fuzz_seed, config) {
                let actual = run_chunked(&case.input, &plan.plan);
                assert!(
                    actual == whole,
                    "chunked output differs from whole input in fixture '{}'\nplan: {} ({})\n{}",
                    case.name,
                    plan.label,
                    plan.plan,
                    diff_text(&whole, &actual)
                );
                enforce_expected(&case, &actual, Mode::ChunkedInput, Some(&plan.label));
            }
        }
    }
    assert!(ran > 0, "no fixtures matched filter");
}
