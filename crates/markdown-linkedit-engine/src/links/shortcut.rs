use std::cell::Cell;
use std::rc::Rc;
use std::sync::OnceLock;

use regex::Regex;

use crate::editing::{Cmd, DocUpdate, DocumentEngine, SelectionRange, Subscription};

/// How a link session was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// The link key chord
    Keyboard,
    /// Typed `[label]()`; `syntax` spans the whole markup
    MarkdownSyntax { syntax: SelectionRange },
}

/// A recognised request to start editing a link over `range`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutEvent {
    pub range: SelectionRange,
    pub trigger: TriggerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingInput {
    version: u64,
    at: usize,
}

/// Watches document edits for link triggers.
///
/// The document subscription only remembers where the latest transaction
/// inserted text. Matching happens in [`ShortcutDetector::poll`], after the
/// transaction has been delivered to every listener, and fires at most once
/// per document version.
#[derive(Debug, Default)]
pub struct ShortcutDetector {
    pending: Rc<Cell<Option<PendingInput>>>,
    last_fired: Option<u64>,
    subscription: Option<Subscription>,
}

impl ShortcutDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach<D: DocumentEngine + ?Sized>(&mut self, doc: &D) {
        if self.subscription.is_some() {
            return;
        }
        let pending = Rc::clone(&self.pending);
        self.subscription = Some(doc.subscribe(Box::new(move |update: &DocUpdate| {
            if update.reason.doc {
                pending.set(update.changed.last().map(|range| PendingInput {
                    version: update.version,
                    at: range.end,
                }));
            }
        })));
    }

    pub fn detach(&mut self) {
        self.subscription = None;
        self.pending.set(None);
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Check the latest insertion for the Markdown link trigger
    pub fn poll<D: DocumentEngine + ?Sized>(&mut self, doc: &D) -> Option<ShortcutEvent> {
        let input = self.pending.take()?;
        if self.last_fired == Some(input.version) {
            return None;
        }
        let event = markdown_trigger(doc, input.at)?;
        self.last_fired = Some(input.version);
        log::debug!("link shortcut typed at {}..{}", event.range.from, event.range.to);
        Some(event)
    }

    /// The event for the link key chord: the selection, else the link under
    /// the cursor, else the cursor itself
    pub fn keyboard<D: DocumentEngine + ?Sized>(doc: &D) -> ShortcutEvent {
        let selection = doc.selection();
        let range = if selection.is_empty() {
            doc.links()
                .at(selection.from)
                .map_or(selection, |mark| mark.selection())
        } else {
            selection
        };
        ShortcutEvent {
            range,
            trigger: TriggerKind::Keyboard,
        }
    }
}

fn link_syntax() -> &'static Regex {
    static LINK_SYNTAX: OnceLock<Regex> = OnceLock::new();
    LINK_SYNTAX.get_or_init(|| {
        Regex::new(r"\[([^\[\]\n]+)\]\(\)$").expect("Invalid link syntax regex")
    })
}

fn markdown_trigger<D: DocumentEngine + ?Sized>(doc: &D, at: usize) -> Option<ShortcutEvent> {
    let before = doc.slice(0..at);
    let line_start = before.rfind('\n').map_or(0, |index| index + 1);
    let line = &before[line_start..];

    let captures = link_syntax().captures(line)?;
    let whole = captures.get(0)?;
    let label = captures.get(1)?;

    // Image syntax and escaped brackets are not link triggers
    if line[..whole.start()].ends_with(['!', '\\']) {
        return None;
    }

    Some(ShortcutEvent {
        range: SelectionRange::new(line_start + label.start(), line_start + label.end()),
        trigger: TriggerKind::MarkdownSyntax {
            syntax: SelectionRange::new(line_start + whole.start(), line_start + whole.end()),
        },
    })
}

/// Replace typed `[label]()` markup by its label.
///
/// Returns the event with `range` moved onto the bare label. Keyboard events
/// are returned unchanged.
pub fn strip_markup<D: DocumentEngine + ?Sized>(
    doc: &mut D,
    event: ShortcutEvent,
) -> ShortcutEvent {
    let TriggerKind::MarkdownSyntax { syntax } = event.trigger else {
        return event;
    };

    let label = doc.slice(event.range.as_range()).into_owned();
    let start = syntax.from;
    doc.apply(Cmd::ReplaceRange {
        range: syntax.as_range(),
        text: label.clone(),
    });

    ShortcutEvent {
        range: SelectionRange::new(start, start + label.len()),
        ..event
    }
}
