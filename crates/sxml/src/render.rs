//! Output rendering.
//!
//! The state machine decides *when* markup is produced and hands the frame
//! payload to a [`Render`] implementation, which decides *what* text it
//! becomes. [`HtmlRenderer`] is the only implementation shipped.

use crate::frame::{Attribute, AttributeValue, Tag};

/// Lifecycle events raised by the state machine.
#[derive(Clone, Copy, Debug)]
pub enum RenderEvent<'a> {
    OpenTag(&'a Tag),
    CloseTag(&'a Tag),
    CloseTagNoChildren(&'a Tag),
    BeginEscapeBracket,
    EndEscapeBracket,
    /// An attribute closed where no tag was waiting for attributes.
    LooseAttribute(&'a Attribute),
}

pub trait Render {
    fn render(&self, event: RenderEvent<'_>) -> String;
}

impl<R: Render + ?Sized> Render for Box<R> {
    fn render(&self, event: RenderEvent<'_>) -> String {
        (**self).render(event)
    }
}

impl<R: Render + ?Sized> Render for &R {
    fn render(&self, event: RenderEvent<'_>) -> String {
        (**self).render(event)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlRenderer;

impl Render for HtmlRenderer {
    fn render(&self, event: RenderEvent<'_>) -> String {
        match event {
            RenderEvent::OpenTag(tag) => {
                let mut out = start_tag(tag);
                out.push('>');
                out
            }
            RenderEvent::CloseTagNoChildren(tag) => {
                let mut out = start_tag(tag);
                push_or_space(&mut out, &tag.trailing_whitespace);
                out.push_str("/>");
                out
            }
            RenderEvent::CloseTag(tag) => format!("</{}>", tag.name),
            RenderEvent::BeginEscapeBracket => "(".to_string(),
            RenderEvent::EndEscapeBracket => ")".to_string(),
            RenderEvent::LooseAttribute(attr) => {
                let mut out = String::new();
                push_attribute(&mut out, attr);
                out
            }
        }
    }
}

fn start_tag(tag: &Tag) -> String {
    let mut out = String::with_capacity(tag.leading_whitespace.len() + tag.name.len() + 2);
    out.push_str(&tag.leading_whitespace);
    out.push('<');
    out.push_str(&tag.name);
    for attr in &tag.attributes {
        push_attribute(&mut out, attr);
    }
    out
}

fn push_attribute(out: &mut String, attr: &Attribute) {
    push_or_space(out, &attr.leading_whitespace);
    out.push_str(&attr.name);
    for value in &attr.values {
        out.push('=');
        match value {
            AttributeValue::Quoted { quote, text } => {
                out.push(quote.as_char());
                out.push_str(text);
                out.push(quote.as_char());
            }
            AttributeValue::Unquoted(text) => {
                out.push('"');
                out.push_str(&text.replace('"', "&quot;"));
                out.push('"');
            }
        }
    }
}

fn push_or_space(out: &mut String, whitespace: &str) {
    if whitespace.is_empty() {
        out.push(' ');
    } else {
        out.push_str(whitespace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Quote;

    fn attr(ws: &str, name: &str, values: Vec<AttributeValue>) -> Attribute {
        Attribute {
            leading_whitespace: ws.to_string(),
            name: name.to_string(),
            values,
        }
    }

    #[test]
    fn self_closing_without_whitespace_gets_one_space() {
        let tag = Tag {
            name: "br".to_string(),
            ..Tag::default()
        };
        assert_eq!(
            HtmlRenderer.render(RenderEvent::CloseTagNoChildren(&tag)),
            "<br />"
        );
    }

    #[test]
    fn self_closing_keeps_written_whitespace() {
        let tag = Tag {
            name: "tag".to_string(),
            trailing_whitespace: "\n".to_string(),
            ..Tag::default()
        };
        assert_eq!(
            HtmlRenderer.render(RenderEvent::CloseTagNoChildren(&tag)),
            "<tag\n/>"
        );
    }

    #[test]
    fn open_tag_with_mixed_values() {
        let tag = Tag {
            leading_whitespace: "\n  ".to_string(),
            name: "a".to_string(),
            attributes: vec![
                attr("", "href", vec![AttributeValue::Unquoted("x\"y".to_string())]),
                attr(
                    "  ",
                    "title",
                    vec![AttributeValue::Quoted {
                        quote: Quote::Single,
                        text: "it\\'s".to_string(),
                    }],
                ),
                attr(" ", "hidden", Vec::new()),
            ],
            ..Tag::default()
        };
        assert_eq!(
            HtmlRenderer.render(RenderEvent::OpenTag(&tag)),
            "\n  <a href=\"x&quot;y\"  title='it\\'s' hidden>"
        );
        assert_eq!(HtmlRenderer.render(RenderEvent::CloseTag(&tag)), "</a>");
    }

    #[test]
    fn extra_values_chain() {
        let loose = attr(
            "",
            "k",
            vec![
                AttributeValue::Quoted {
                    quote: Quote::Double,
                    text: "a".to_string(),
                },
                AttributeValue::Unquoted("b".to_string()),
            ],
        );
        assert_eq!(
            HtmlRenderer.render(RenderEvent::LooseAttribute(&loose)),
            " k=\"a\"=\"b\""
        );
    }

    #[test]
    fn boxed_renderer_delegates() {
        let boxed: Box<dyn Render> = Box::new(HtmlRenderer);
        assert_eq!(boxed.render(RenderEvent::BeginEscapeBracket), "(");
        assert_eq!(boxed.render(RenderEvent::EndEscapeBracket), ")");
    }
}
