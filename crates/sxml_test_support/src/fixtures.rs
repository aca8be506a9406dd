//! Golden fixture manifests.
//!
//! A manifest is a TOML file with a `format` header and one `[[case]]` table
//! per fixture:
//!
//! ```toml
//! format = "sxml-golden-v1"
//!
//! [[case]]
//! name = "self-closing"
//! input = "(br)"
//! expected = "<br />"
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

pub const GOLDEN_FORMAT: &str = "sxml-golden-v1";

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
    #[default]
    Active,
    Xfail,
    Skip,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GoldenCase {
    pub name: String,
    pub input: String,
    pub expected: String,
    #[serde(default)]
    pub status: FixtureStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    format: String,
    #[serde(default)]
    case: Vec<GoldenCase>,
}

/// Parse a manifest from text. `origin` only labels error messages.
pub fn parse_golden(text: &str, origin: &str) -> Result<Vec<GoldenCase>, String> {
    let manifest: Manifest =
        toml::from_str(text).map_err(|err| format!("invalid manifest {origin}: {err}"))?;
    if manifest.format != GOLDEN_FORMAT {
        return Err(format!(
            "unsupported format '{}' in {origin} (want {GOLDEN_FORMAT})",
            manifest.format
        ));
    }
    let mut seen = BTreeSet::new();
    for case in &manifest.case {
        if case.name != case.name.trim() || case.name.is_empty() {
            return Err(format!("bad fixture name {:?} in {origin}", case.name));
        }
        if !seen.insert(case.name.as_str()) {
            return Err(format!("duplicate fixture '{}' in {origin}", case.name));
        }
        if case.status != FixtureStatus::Active
            && case.reason.as_deref().unwrap_or("").trim().is_empty()
        {
            return Err(format!(
                "non-active fixture '{}' missing reason in {origin}",
                case.name
            ));
        }
    }
    Ok(manifest.case)
}

pub fn load_golden(path: &Path) -> Result<Vec<GoldenCase>, String> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read manifest {}: {err}", path.display()))?;
    parse_golden(&text, &path.display().to_string())
}

/// Substring filter over fixture names, read from an environment variable.
pub struct FixtureFilter {
    raw: Option<String>,
}

impl FixtureFilter {
    pub fn from_env(key: &str) -> Self {
        Self {
            raw: std::env::var(key).ok().filter(|raw| !raw.is_empty()),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match &self.raw {
            Some(filter) => name.contains(filter.as_str()),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_default_to_active() {
        let cases = parse_golden(
            r#"
format = "sxml-golden-v1"

[[case]]
name = "a"
input = "(a)"
expected = "<a />"

[[case]]
name = "b"
input = "(b"
expected = ""
status = "xfail"
reason = "open form"
"#,
            "inline",
        )
        .expect("manifest parses");
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].status, FixtureStatus::Active);
        assert_eq!(cases[1].status, FixtureStatus::Xfail);
    }

    #[test]
    fn rejects_duplicates_and_missing_reasons() {
        let dup = r#"
format = "sxml-golden-v1"
[[case]]
name = "a"
input = ""
expected = ""
[[case]]
name = "a"
input = ""
expected = ""
"#;
        assert!(parse_golden(dup, "dup").is_err());

        let skip = r#"
format = "sxml-golden-v1"
[[case]]
name = "a"
input = ""
expected = ""
status = "skip"
"#;
        assert!(parse_golden(skip, "skip").is_err());
    }

    #[test]
    fn rejects_unknown_format() {
        let err = parse_golden("format = \"other\"", "fmt").unwrap_err();
        assert!(err.contains("unsupported format"));
    }
}
