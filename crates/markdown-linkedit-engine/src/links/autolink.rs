//! Turns bare URLs into links as they are typed.
//!
//! The rule runs after an insertion that ends in whitespace and looks at the
//! word just finished. Links it creates are marked `auto`.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::editing::{Cmd, DocumentEngine, LinkAttributes, SelectionRange};

fn url_regex() -> &'static Regex {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    URL_REGEX.get_or_init(|| {
        Regex::new(r"(?:https?://|www\.)[^\s<>\[\]]+").expect("Invalid URL regex")
    })
}

/// Byte range of the URL in `text` and the href to link it to
pub fn find_url(text: &str) -> Option<(Range<usize>, String)> {
    let found = url_regex().find_iter(text).last()?;
    let start = found.start();
    let mut end = found.end();

    // Remove trailing punctuation that's typically not part of URLs
    while let Some(last_char) = text[start..end].chars().last() {
        if matches!(last_char, '.' | ',' | ':' | ';' | '!' | '?' | ')' | ']' | '}' | '\'' | '"') {
            end -= last_char.len_utf8();
        } else {
            break;
        }
    }

    let url = &text[start..end];
    let host = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("www."))?;
    if host.is_empty() {
        return None;
    }

    let href = if url.starts_with("www.") {
        format!("https://{url}")
    } else {
        url.to_string()
    };
    Some((start..end, href))
}

/// Link the URL completed by `inserted`, if there is one.
///
/// Returns the linked range. Text that already carries a link is left alone.
pub fn autolink<D: DocumentEngine + ?Sized>(
    doc: &mut D,
    inserted: Range<usize>,
) -> Option<Range<usize>> {
    let typed = doc.slice(inserted.clone());
    let last = typed.chars().last().filter(|c| c.is_whitespace())?;
    let word_end = inserted.end - last.len_utf8();

    let before = doc.slice(0..word_end).into_owned();
    let word_start = before
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(index, c)| index + c.len_utf8());

    let (found, href) = find_url(&before[word_start..])?;
    let range = word_start + found.start..word_start + found.end;
    if doc
        .links()
        .overlapping(SelectionRange::from(range.clone()))
        .next()
        .is_some()
    {
        return None;
    }

    log::debug!("autolinking {href} at {}..{}", range.start, range.end);
    doc.apply(Cmd::UpsertLink {
        range: range.clone(),
        attrs: LinkAttributes::auto(href),
    });
    Some(range)
}
