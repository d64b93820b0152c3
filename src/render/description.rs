//! Description prose → Markdown → HTML or plain text.

use pulldown_cmark::{html, Event, Parser, TagEnd};

use super::anchor::{form_encode, short_name, Links};
use crate::model::{DescriptionItem, DocDescription};

/// Build the Markdown source of a description, turning references into
/// links or inline code.
pub fn to_markdown(description: &DocDescription, links: &Links) -> String {
    let mut out = String::new();
    for item in &description.items {
        match item {
            DescriptionItem::Text(text) => out.push_str(&join_single_newlines(text)),
            DescriptionItem::HostRef(class) => {
                out.push_str(&reference(short_name(class), links.host_type(class)))
            }
            DescriptionItem::ParamRef(param) => {
                out.push_str(&format!(" `{}` ", form_encode(param)))
            }
            DescriptionItem::TypeRef(type_name) => {
                out.push_str(&reference(short_name(type_name), links.script_type(type_name)))
            }
        }
    }
    out
}

fn reference(name: &str, url: Option<String>) -> String {
    match url {
        Some(url) => format!(" [{}]({}) ", name, url),
        None => format!(" `{}` ", name),
    }
}

/// A lone newline is a line wrap inside a paragraph; blank lines separate
/// paragraphs and are kept.
fn join_single_newlines(text: &str) -> String {
    text.split("\n\n")
        .map(|paragraph| paragraph.replace('\n', " "))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render a description to an HTML fragment.
pub fn to_html(description: &DocDescription, links: &Links) -> String {
    let markdown = to_markdown(description, links);
    let mut out = String::new();
    html::push_html(&mut out, Parser::new(&markdown));
    out
}

/// The text of a description with all Markdown formatting removed.
pub fn plain_text(description: &DocDescription, links: &Links) -> String {
    let markdown = to_markdown(description, links);
    let mut out = String::new();
    for event in Parser::new(&markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item) => out.push('\n'),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// [`plain_text`] cut to `max` characters, with `...` appended when cut.
pub fn short_plain_text(description: &DocDescription, links: &Links, max: usize) -> String {
    let text = plain_text(description, links);
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> Links {
        Links::new("std", None)
    }

    fn sample() -> DocDescription {
        DocDescription::new(vec![
            DescriptionItem::Text("Adds\none to".to_string()),
            DescriptionItem::ParamRef("x".to_string()),
            DescriptionItem::Text("giving".to_string()),
            DescriptionItem::TypeRef("int".to_string()),
            DescriptionItem::Text("via".to_string()),
            DescriptionItem::HostRef("java.lang.Math".to_string()),
        ])
    }

    #[test]
    fn markdown_links_known_types() {
        assert_eq!(
            to_markdown(&sample(), &links()),
            "Adds one to `x` giving [int](/library/std/entity/int.html) via `Math` "
        );
    }

    #[test]
    fn html_renders_markdown() {
        let html = to_html(&DocDescription::text("Some **bold** text"), &links());
        assert_eq!(html, "<p>Some <strong>bold</strong> text</p>\n");
    }

    #[test]
    fn plain_text_strips_formatting() {
        assert_eq!(plain_text(&sample(), &links()), "Adds one to x giving int via Math");
        let two = DocDescription::text("First *para*.\n\nSecond.");
        assert_eq!(plain_text(&two, &links()), "First para.\nSecond.");
    }

    #[test]
    fn short_text_is_cut_on_char_boundaries() {
        let text = DocDescription::text("héllo world");
        assert_eq!(short_plain_text(&text, &links(), 5), "héllo...");
        assert_eq!(short_plain_text(&text, &links(), 50), "héllo world");
    }
}
