/// Construct kind selected by the character that follows an opening `(`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Tag,
    Attribute,
    Bracket,
    SpecialChar,
    None,
}

/// Classify a form by the first character of `text`.
pub fn classify(text: &str) -> Operator {
    match text.chars().next() {
        None => Operator::None,
        Some(ch) if ch.is_whitespace() => Operator::None,
        Some('@') => Operator::Attribute,
        Some('(') => Operator::Bracket,
        Some('&') => Operator::SpecialChar,
        Some(')') => Operator::None,
        Some(_) => Operator::Tag,
    }
}
