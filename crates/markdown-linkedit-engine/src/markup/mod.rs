//! Markdown import and export for the document model.
//!
//! The document only knows plain text and links, so import keeps text, code
//! spans, raw HTML and line breaks, separates blocks with a blank line and
//! turns every link into a mark. Export writes the text back with inline link
//! syntax, escaping anything that would otherwise read back as Markdown.

use std::ops::Range;

use pulldown_cmark::{Event, LinkType, Parser, Tag, TagEnd};

use crate::editing::{LinkAttributes, LinkSet};

/// Plain text and link marks extracted from Markdown source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMarkdown {
    pub text: String,
    pub links: Vec<(Range<usize>, LinkAttributes)>,
}

pub fn parse_markdown(source: &str) -> ParsedMarkdown {
    let mut parsed = ParsedMarkdown::default();
    let mut open: Vec<(usize, LinkAttributes)> = Vec::new();
    let mut block_pending = false;

    for event in Parser::new(source) {
        match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            }) => {
                flush_block(&mut parsed.text, &mut block_pending);
                let attrs = LinkAttributes {
                    href: dest_url.to_string(),
                    title: (!title.is_empty()).then(|| title.to_string()),
                    auto: matches!(link_type, LinkType::Autolink | LinkType::Email),
                };
                open.push((parsed.text.len(), attrs));
            }
            Event::End(TagEnd::Link) => {
                if let Some((start, attrs)) = open.pop()
                    && start < parsed.text.len()
                {
                    parsed.links.push((start..parsed.text.len(), attrs));
                }
            }
            Event::Text(text)
            | Event::Code(text)
            | Event::Html(text)
            | Event::InlineHtml(text) => {
                flush_block(&mut parsed.text, &mut block_pending);
                parsed.text.push_str(&text);
            }
            Event::SoftBreak | Event::HardBreak => parsed.text.push('\n'),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::CodeBlock
                | TagEnd::Item
                | TagEnd::BlockQuote(_)
                | TagEnd::HtmlBlock,
            ) => block_pending = true,
            _ => {}
        }
    }

    let len = parsed.text.trim_end_matches('\n').len();
    parsed.text.truncate(len);
    parsed.links.retain_mut(|(range, _)| {
        range.end = range.end.min(len);
        range.start < range.end
    });
    parsed
}

/// Separate the next block from the previous one with a blank line
fn flush_block(text: &mut String, pending: &mut bool) {
    if std::mem::take(pending) && !text.is_empty() {
        let len = text.trim_end_matches('\n').len();
        text.truncate(len);
        text.push_str("\n\n");
    }
}

/// Write text and links back out as Markdown
pub fn to_markdown(text: &str, links: &LinkSet) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    for mark in links.iter() {
        let Range { start, end } = mark.range.clone();
        if start < pos
            || end > text.len()
            || !text.is_char_boundary(start)
            || !text.is_char_boundary(end)
        {
            log::warn!("skipping link mark {start}..{end} outside the text");
            continue;
        }
        push_escaped(&mut out, &text[pos..start]);
        push_link(&mut out, &text[start..end], &mark.attrs);
        pos = end;
    }

    push_escaped(&mut out, &text[pos..]);
    out
}

fn push_link(out: &mut String, label: &str, attrs: &LinkAttributes) {
    if attrs.auto && attrs.title.is_none() && label == attrs.href && is_autolink_safe(label) {
        out.push('<');
        out.push_str(label);
        out.push('>');
        return;
    }

    // `![` would open an image
    if out.ends_with('!') {
        out.pop();
        out.push_str("\\!");
    }
    out.push('[');
    push_escaped(out, label);
    out.push_str("](");
    if attrs.href.is_empty() || attrs.href.contains([' ', '(', ')', '<', '>']) {
        out.push('<');
        out.push_str(&attrs.href.replace('<', "\\<").replace('>', "\\>"));
        out.push('>');
    } else {
        out.push_str(&attrs.href);
    }
    if let Some(title) = &attrs.title {
        out.push_str(" \"");
        out.push_str(&title.replace('\\', "\\\\").replace('"', "\\\""));
        out.push('"');
    }
    out.push(')');
}

/// `<...>` only round-trips for text without spaces, angle brackets or escapes
fn is_autolink_safe(href: &str) -> bool {
    !href.is_empty()
        && !href.contains(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | '\\'))
}

/// Append `text`, backslash-escaping what Markdown would parse as syntax.
///
/// Inline markers are always escaped. Block markers only matter at the start
/// of a line, and `&` only when it could begin an entity.
fn push_escaped(out: &mut String, text: &str) {
    let before = out.trim_end_matches(' ');
    let mut line_start = before.is_empty() || before.ends_with('\n');
    let mut line_number = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let escape = match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '<' => true,
            '&' => chars.peek().is_some_and(|next| next.is_ascii_alphanumeric() || *next == '#'),
            '#' | '>' | '-' | '+' | '=' => line_start,
            '.' | ')' => line_number,
            _ => false,
        };
        if escape {
            out.push('\\');
        }
        out.push(c);

        line_number = c.is_ascii_digit() && (line_start || line_number);
        line_start = c == '\n' || (line_start && c == ' ');
    }
}

/// Render Markdown to HTML for previews
pub fn to_html(markdown: &str) -> String {
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, Parser::new(markdown));
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn parse_keeps_text_and_marks_links() {
        let parsed =
            parse_markdown("this is a [hyperlink](https://jackhanford.com \"with a title\")");

        assert_eq!(parsed.text, "this is a hyperlink");
        assert_eq!(
            parsed.links,
            vec![(
                10..19,
                LinkAttributes::new("https://jackhanford.com").with_title("with a title")
            )]
        );
    }

    #[test]
    fn parse_marks_angle_bracket_links_as_auto() {
        let parsed = parse_markdown("see <https://b.io>");

        assert_eq!(parsed.text, "see https://b.io");
        assert_eq!(parsed.links, vec![(4..16, LinkAttributes::auto("https://b.io"))]);
    }

    #[test]
    fn parse_separates_blocks_with_blank_line() {
        let parsed = parse_markdown("# Heading\n\nFirst line\nsecond line\n\n- item");

        assert_eq!(parsed.text, "Heading\n\nFirst line\nsecond line\n\nitem");
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn parse_keeps_code_span_text() {
        let parsed = parse_markdown("run `cargo doc` [here](https://docs.rs)");

        assert_eq!(parsed.text, "run cargo doc here");
        assert_eq!(parsed.links[0].0, 14..18);
    }

    #[test]
    fn export_writes_inline_links() {
        let mut links = LinkSet::new();
        links.upsert(4..8, LinkAttributes::new("https://a.com"));
        links.upsert(13..17, LinkAttributes::new("https://b.com").with_title("B"));

        assert_eq!(
            to_markdown("see this and that", &links),
            "see [this](https://a.com) and [that](https://b.com \"B\")"
        );
    }

    #[test]
    fn export_uses_autolink_form_when_label_is_the_url() {
        let mut links = LinkSet::new();
        links.upsert(0..12, LinkAttributes::auto("https://b.io"));
        links.upsert(13..28, LinkAttributes::auto("https://www.example.com"));

        assert_eq!(
            to_markdown("https://b.io www.example.com", &links),
            "<https://b.io> [www.example.com](https://www.example.com)"
        );
    }

    #[test]
    fn export_wraps_destinations_with_spaces() {
        let mut links = LinkSet::new();
        links.upsert(0..4, LinkAttributes::new("my page.md"));

        assert_eq!(to_markdown("page", &links), "[page](<my page.md>)");
    }

    #[test]
    fn export_then_parse_keeps_links() {
        let source = "a [b](https://b.com \"Bee\") c <https://d.io>";
        let parsed = parse_markdown(source);
        let mut links = LinkSet::new();
        for (range, attrs) in parsed.links.clone() {
            links.upsert(range, attrs);
        }

        assert_eq!(to_markdown(&parsed.text, &links), source);
    }

    fn round_trip(text: &str, links: &LinkSet) -> ParsedMarkdown {
        parse_markdown(&to_markdown(text, links))
    }

    #[rstest]
    #[case::emphasis("2*3*4 and a_b_c")]
    #[case::brackets_and_html("see [x] and <b>")]
    #[case::code_and_escapes("`tick` and back\\slash")]
    #[case::entity("AT&T uses &amp; and &#35;")]
    #[case::heading("# not a heading")]
    #[case::list_markers("- one\n+ two\n3. three\n4) four")]
    #[case::quote_and_setext("> quoted\nunderlined\n===")]
    fn export_then_parse_keeps_plain_text(#[case] text: &str) {
        let parsed = round_trip(text, &LinkSet::new());

        assert_eq!(parsed.text, text);
        assert!(parsed.links.is_empty());
    }

    #[test]
    fn export_then_parse_keeps_links_with_markdown_in_label() {
        let text = "wow! a ]b and *c*";
        let mut links = LinkSet::new();
        links.upsert(5..9, LinkAttributes::new("https://x.io"));
        links.upsert(14..17, LinkAttributes::new("https://y.io").with_title("say \"hi\""));

        let parsed = round_trip(text, &links);

        assert_eq!(parsed.text, text);
        assert_eq!(
            parsed.links,
            vec![
                (5..9, LinkAttributes::new("https://x.io")),
                (14..17, LinkAttributes::new("https://y.io").with_title("say \"hi\"")),
            ]
        );
    }

    #[test]
    fn export_escapes_bang_before_link() {
        let mut links = LinkSet::new();
        links.upsert(4..8, LinkAttributes::new("https://x.io"));

        assert_eq!(to_markdown("wow!link", &links), "wow\\![link](https://x.io)");
    }

    #[test]
    fn parse_keeps_inline_and_block_html_as_text() {
        let parsed = parse_markdown("a <b>bold</b> word\n\n<div>\nblock\n</div>\n\nafter");

        assert_eq!(parsed.text, "a <b>bold</b> word\n\n<div>\nblock\n</div>\n\nafter");
    }
}
