use std::ops::Range;

use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::{LinkAttributes, SelectionRange};

/// Commands that can be applied to the document
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText {
        at: usize,
        text: String,
    },
    DeleteRange {
        range: Range<usize>,
    },
    ReplaceRange {
        range: Range<usize>,
        text: String,
    },
    /// Move the selection
    Select {
        range: SelectionRange,
    },
    /// Create or replace the link over `range`
    UpsertLink {
        range: Range<usize>,
        attrs: LinkAttributes,
    },
    /// Remove every link the range touches
    RemoveLink {
        range: SelectionRange,
    },
    /// Expand the selection to the link at the cursor
    SelectLink,
    /// Return focus to the text, optionally collapsing the cursor to `at`
    Focus {
        at: Option<usize>,
    },
}

impl Cmd {
    /// The text replacement this command performs, if it edits text
    pub(crate) fn text_edit(&self) -> Option<TextEdit> {
        match self {
            Cmd::InsertText { at, text } => Some(TextEdit::new(*at..*at, text)),
            Cmd::DeleteRange { range } => Some(TextEdit::new(range.clone(), "")),
            Cmd::ReplaceRange { range, text } => Some(TextEdit::new(range.clone(), text)),
            _ => None,
        }
    }
}

/// Which side a position sticks to when text is inserted exactly on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bias {
    Left,
    Right,
}

/// A single replacement of `range` (old coordinates) by `text`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextEdit {
    pub range: Range<usize>,
    pub text: String,
}

impl TextEdit {
    pub fn new(range: Range<usize>, text: &str) -> Self {
        Self {
            range,
            text: text.to_string(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.range.is_empty() && self.text.is_empty()
    }

    /// Range the inserted text occupies after the edit
    pub fn inserted(&self) -> Range<usize> {
        self.range.start..self.range.start + self.text.len()
    }

    /// Map an old offset into post-edit coordinates
    pub fn map(&self, pos: usize, bias: Bias) -> usize {
        let Range { start, end } = self.range;
        let inserted = self.text.len();

        if pos < start {
            pos
        } else if pos > end {
            pos - (end - start) + inserted
        } else if start == end {
            match bias {
                Bias::Left => pos,
                Bias::Right => pos + inserted,
            }
        } else if pos == start {
            start
        } else if pos == end {
            start + inserted
        } else {
            match bias {
                Bias::Left => start,
                Bias::Right => start + inserted,
            }
        }
    }

    /// Selection after the edit.
    ///
    /// Typing over or at the selection collapses the cursor behind the new
    /// text; edits elsewhere only shift it.
    pub fn map_selection(&self, selection: SelectionRange) -> SelectionRange {
        let Range { start, end } = self.range;
        let at_cursor = selection.is_empty() && start <= selection.from && selection.from <= end;
        let over_selection = start < selection.to && selection.from < end;

        if at_cursor || over_selection || self.range == selection.as_range() {
            SelectionRange::cursor(self.inserted().end)
        } else {
            SelectionRange::new(
                self.map(selection.from, Bias::Right),
                self.map(selection.to, Bias::Left),
            )
        }
    }

    pub fn to_delta(&self, base_len: usize) -> Delta<RopeInfo> {
        let mut builder = Builder::new(base_len);
        if self.text.is_empty() {
            builder.delete(self.range.clone());
        } else {
            builder.replace(self.range.clone(), Rope::from(self.text.as_str()));
        }
        builder.build()
    }
}
