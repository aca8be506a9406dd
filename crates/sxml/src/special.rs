//! Character entities for `(&tok n)` forms and text escaping.

use std::borrow::Cow;

/// Entity text for one special-character token.
pub fn entity_for(token: &str) -> Cow<'static, str> {
    match token {
        "&" => Cow::Borrowed("&amp;"),
        "<" => Cow::Borrowed("&lt;"),
        ">" => Cow::Borrowed("&gt;"),
        other => Cow::Owned(format!("&{other};")),
    }
}

/// Replace `<` and `>` in literal text.
pub fn escape_angle_brackets(text: &str) -> Cow<'_, str> {
    if memchr::memchr2(b'<', b'>', text.as_bytes()).is_none() {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Leading decimal digits of `text`, saturating on overflow. `None` when
/// there are no digits.
pub(crate) fn parse_repeat(text: &str) -> Option<usize> {
    let digits = text.bytes().take_while(u8::is_ascii_digit);
    let mut seen = false;
    let mut value = 0usize;
    for digit in digits {
        seen = true;
        value = value
            .saturating_mul(10)
            .saturating_add(usize::from(digit - b'0'));
    }
    seen.then_some(value)
}
