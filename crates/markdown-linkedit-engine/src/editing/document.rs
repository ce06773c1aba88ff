use std::borrow::Cow;
use std::fmt;
use std::ops::Range;

use xi_rope::Rope;

use crate::editing::commands::TextEdit;
use crate::editing::{
    Cmd, DocUpdate, DocumentEngine, LinkSet, ListenerRegistry, Patch, SelectionRange,
    Subscription, UpdateReason,
};
use crate::markup;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("range {from}..{to} is outside the document (length {len})")]
    StaleRange { from: usize, to: usize, len: usize },
    #[error("offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
}

/// In-memory rich text document: plain text plus link marks.
///
/// The text lives in a single `xi_rope::Rope`; links are stored beside it
/// as byte ranges and are moved through every text edit. All changes go
/// through [`Document::apply`], which bumps the version and notifies
/// listeners synchronously whenever text, marks or selection changed.
///
/// ```rust
/// # use markdown_linkedit_engine::editing::{Cmd, Document, LinkAttributes, DocumentEngine};
/// let mut doc = Document::from_markdown("read the [docs](https://docs.rs)");
/// assert_eq!(doc.text(), "read the docs");
///
/// doc.apply(Cmd::UpsertLink {
///     range: 0..4,
///     attrs: LinkAttributes::new("https://example.com"),
/// });
/// assert_eq!(
///     doc.to_markdown(),
///     "[read](https://example.com) the [docs](https://docs.rs)"
/// );
/// ```
pub struct Document {
    /// Plain text content
    pub(crate) buffer: Rope,
    /// Current selection as byte offsets in buffer
    pub(crate) selection: SelectionRange,
    /// Incremented on each effective change
    pub(crate) version: u64,
    pub(crate) links: LinkSet,
    listeners: ListenerRegistry<DocUpdate>,
}

impl Document {
    /// Empty document with the cursor at 0
    pub fn new() -> Self {
        Self::from_text("")
    }

    /// Create a new document from raw UTF-8 text (no markup interpretation)
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_text(text))
    }

    /// Parse Markdown, keeping the text and turning links into marks
    pub fn from_markdown(source: &str) -> Self {
        let parsed = markup::parse_markdown(source);
        let mut doc = Self::from_text(&parsed.text);
        for (range, attrs) in parsed.links {
            doc.links.push(range, attrs);
        }
        doc
    }

    fn from_text(text: &str) -> Self {
        let buffer = Rope::from(text);
        let len = buffer.len();
        Self {
            buffer,
            selection: SelectionRange::cursor(len), // Start with cursor at end
            version: 0,
            links: LinkSet::new(),
            listeners: ListenerRegistry::new(),
        }
    }

    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.text().into_bytes()
    }

    pub fn to_markdown(&self) -> String {
        markup::to_markdown(&self.text(), &self.links)
    }

    /// HTML preview of the document
    pub fn to_html(&self) -> String {
        markup::to_html(&self.to_markdown())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Offset of the character before `offset` (0 stays 0)
    pub fn prev_offset(&self, offset: usize) -> usize {
        let offset = self.clamp_offset(offset);
        self.buffer.prev_codepoint_offset(offset).unwrap_or(0)
    }

    /// Offset of the character after `offset` (end stays end)
    pub fn next_offset(&self, offset: usize) -> usize {
        let offset = self.clamp_offset(offset);
        self.buffer.next_codepoint_offset(offset).unwrap_or(offset)
    }

    /// Apply command to document
    ///
    /// Text commands compile to a single rope delta; links and selection are
    /// mapped through the same edit so they stay attached to their text. Link
    /// and selection commands never touch the rope.
    ///
    /// Listeners are notified only when something actually changed, and the
    /// version is bumped at the same time, so a no-op command is invisible.
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let before = self.selection;
        let mut reason = UpdateReason::default();
        let mut changed = Vec::new();

        if let Some(edit) = cmd.text_edit() {
            let edit = self.clamp_edit(edit);
            if !edit.is_noop() {
                let delta = edit.to_delta(self.buffer.len());
                self.buffer = delta.apply(&self.buffer);
                self.links.map_edit(&edit);
                self.selection = edit.map_selection(self.selection);
                if !edit.text.is_empty() {
                    changed.push(edit.inserted());
                }
                reason.doc = true;
            }
        } else {
            match cmd {
                Cmd::Select { range } => {
                    self.selection = self.clamp_selection(range);
                }
                Cmd::UpsertLink { range, attrs } => {
                    let range = self.clamp_selection(range.into()).as_range();
                    reason.doc = self.links.upsert(range, attrs);
                }
                Cmd::RemoveLink { range } => {
                    let range = self.clamp_selection(range);
                    reason.doc = !self.links.remove_touched(range).is_empty();
                }
                Cmd::SelectLink => {
                    if let Some(mark) = self.links.touching(self.selection.from) {
                        self.selection = mark.selection();
                    }
                }
                Cmd::Focus { at } => {
                    if let Some(at) = at {
                        self.selection = SelectionRange::cursor(self.clamp_offset(at));
                    }
                }
                Cmd::InsertText { .. } | Cmd::DeleteRange { .. } | Cmd::ReplaceRange { .. } => {}
            }
        }

        reason.selection = self.selection != before;
        if reason.any() {
            self.version += 1;
            self.listeners.emit(&DocUpdate {
                version: self.version,
                reason,
                selection: self.selection,
                changed: changed.clone(),
            });
        }

        Patch {
            changed,
            new_selection: self.selection,
            version: self.version,
            reason,
        }
    }

    fn clamp_selection(&self, range: SelectionRange) -> SelectionRange {
        SelectionRange::new(self.clamp_offset(range.from), self.clamp_offset(range.to))
    }

    fn clamp_edit(&self, edit: TextEdit) -> TextEdit {
        let range = self.clamp_selection(edit.range.clone().into()).as_range();
        TextEdit { range, ..edit }
    }
}

impl DocumentEngine for Document {
    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn selection(&self) -> SelectionRange {
        self.selection
    }

    fn links(&self) -> &LinkSet {
        &self.links
    }

    fn slice(&self, range: Range<usize>) -> Cow<'_, str> {
        let start = self.clamp_offset(range.start);
        let end = self.clamp_offset(range.end).max(start);
        self.buffer.slice_to_cow(start..end)
    }

    fn clamp_offset(&self, offset: usize) -> usize {
        if offset >= self.buffer.len() {
            return self.buffer.len();
        }
        self.buffer.at_or_prev_codepoint_boundary(offset).unwrap_or(0)
    }

    fn resolve(&self, range: SelectionRange) -> Result<SelectionRange, DocumentError> {
        let len = self.buffer.len();
        if range.to > len {
            return Err(DocumentError::StaleRange {
                from: range.from,
                to: range.to,
                len,
            });
        }
        for offset in [range.from, range.to] {
            if self.clamp_offset(offset) != offset {
                return Err(DocumentError::NotCharBoundary(offset));
            }
        }
        Ok(range)
    }

    fn subscribe(&self, listener: Box<dyn FnMut(&DocUpdate)>) -> Subscription {
        self.listeners.subscribe(listener)
    }

    fn apply(&mut self, cmd: Cmd) -> Patch {
        Document::apply(self, cmd)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("text", &self.text())
            .field("selection", &self.selection)
            .field("version", &self.version)
            .field("links", &self.links)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
