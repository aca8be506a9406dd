//! Shared helpers for translator tests, benches and fuzzing.

pub mod chunker;
pub mod fixtures;
pub mod harness;

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Line-oriented diff of two translation outputs, centred on the first
/// differing line.
pub fn diff_text(expected: &str, actual: &str) -> String {
    use std::fmt::Write;

    let expected: Vec<&str> = expected.split('\n').collect();
    let actual: Vec<&str> = actual.split('\n').collect();
    let max = expected.len().max(actual.len());
    let missing = "<missing>";
    let mut out = String::new();

    let mismatch = (0..max).find(|&i| expected.get(i) != actual.get(i));
    let Some(i) = mismatch else {
        return out;
    };
    let start = i.saturating_sub(2);
    let end = (i + 3).min(max);
    let _ = writeln!(
        &mut out,
        "first mismatch at line {} (showing {}..={}):",
        i + 1,
        start + 1,
        end
    );
    for line_idx in start..end {
        let left = expected.get(line_idx).copied().unwrap_or(missing);
        let right = actual.get(line_idx).copied().unwrap_or(missing);
        let marker = if line_idx == i { ">" } else { " " };
        let _ = writeln!(
            &mut out,
            "{marker} {:>4}  expected: \"{}\"",
            line_idx + 1,
            escape_text(left)
        );
        let _ = writeln!(
            &mut out,
            "{marker} {:>4}    actual: \"{}\"",
            line_idx + 1,
            escape_text(right)
        );
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_text_shows_control_chars() {
        assert_eq!(escape_text("a\n\"b\"\u{1}"), "a\\n\\\"b\\\"\\u{01}");
    }

    #[test]
    fn diff_points_at_first_differing_line() {
        let diff = diff_text("<ul>\n<li>a</li>\n</ul>", "<ul>\n<li>b</li>\n</ul>");
        assert!(diff.starts_with("first mismatch at line 2"));
        assert!(diff.contains("expected: \"<li>a</li>\""));
        assert!(diff_text("same", "same").is_empty());
    }
}
