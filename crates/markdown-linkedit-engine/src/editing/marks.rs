use std::ops::Range;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::editing::SelectionRange;
use crate::editing::commands::{Bias, TextEdit};

/// Unique identifier for a link mark, stable across edits that move it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// Attributes carried by a link mark
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkAttributes {
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Created by URL detection rather than by the user
    #[serde(default)]
    pub auto: bool,
}

impl LinkAttributes {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: None,
            auto: false,
        }
    }

    pub fn auto(href: impl Into<String>) -> Self {
        Self {
            auto: true,
            ..Self::new(href)
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A hyperlink attached to a byte range of the text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkMark {
    pub id: LinkId,
    pub range: Range<usize>,
    pub attrs: LinkAttributes,
}

impl LinkMark {
    pub fn selection(&self) -> SelectionRange {
        self.range.clone().into()
    }
}

/// Ordered, non-overlapping set of link marks.
///
/// Links are non-inclusive at both ends: text typed exactly at a boundary
/// stays outside the link.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    marks: Vec<LinkMark>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkMark> {
        self.marks.iter()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Link active at a collapsed cursor (strictly inside the link)
    pub fn at(&self, pos: usize) -> Option<&LinkMark> {
        self.marks
            .iter()
            .find(|mark| mark.range.start < pos && pos < mark.range.end)
    }

    /// Link whose extent touches `pos`, including its boundaries
    pub fn touching(&self, pos: usize) -> Option<&LinkMark> {
        self.marks
            .iter()
            .find(|mark| mark.range.start <= pos && pos <= mark.range.end)
    }

    /// Link that fully covers a non-empty range
    pub fn covering(&self, range: SelectionRange) -> Option<&LinkMark> {
        if range.is_empty() {
            return None;
        }
        self.marks
            .iter()
            .find(|mark| mark.selection().contains(range))
    }

    pub fn overlapping(&self, range: SelectionRange) -> impl Iterator<Item = &LinkMark> {
        self.marks
            .iter()
            .filter(move |mark| mark.range.start < range.to && range.from < mark.range.end)
    }

    /// Link reported for a selection: the one under a collapsed cursor, or
    /// the first one a range overlaps
    pub fn active(&self, selection: SelectionRange) -> Option<&LinkMark> {
        if selection.is_empty() {
            self.at(selection.from)
        } else {
            self.overlapping(selection).next()
        }
    }

    /// Insert a link mark, clearing whatever links the range overlapped.
    ///
    /// When the range matches an existing link exactly and the new attributes
    /// carry no title, the old title is kept.
    pub(crate) fn upsert(&mut self, range: Range<usize>, mut attrs: LinkAttributes) -> bool {
        if range.is_empty() {
            return false;
        }

        let existing = self.marks.iter().find(|mark| mark.range == range);
        if let Some(existing) = existing {
            if attrs.title.is_none() {
                attrs.title = existing.attrs.title.clone();
            }
            if existing.attrs == attrs {
                return false;
            }
        }

        self.clear(range.clone());
        let index = self
            .marks
            .partition_point(|mark| mark.range.start < range.start);
        self.marks.insert(
            index,
            LinkMark {
                id: LinkId::new(),
                range,
                attrs,
            },
        );
        true
    }

    /// Remove link coverage from `range`, splitting links that extend past it
    pub(crate) fn clear(&mut self, range: Range<usize>) -> bool {
        let mut changed = false;
        let mut kept = Vec::with_capacity(self.marks.len() + 1);

        for mark in self.marks.drain(..) {
            if mark.range.end <= range.start || range.end <= mark.range.start {
                kept.push(mark);
                continue;
            }
            changed = true;
            if mark.range.start < range.start {
                kept.push(LinkMark {
                    id: mark.id,
                    range: mark.range.start..range.start,
                    attrs: mark.attrs.clone(),
                });
            }
            if range.end < mark.range.end {
                kept.push(LinkMark {
                    id: LinkId::new(),
                    range: range.end..mark.range.end,
                    attrs: mark.attrs,
                });
            }
        }

        self.marks = kept;
        changed
    }

    /// Remove every link the selection touches, whole.
    ///
    /// A collapsed cursor removes the link it sits inside.
    pub(crate) fn remove_touched(&mut self, selection: SelectionRange) -> Vec<Range<usize>> {
        let doomed: Vec<Range<usize>> = if selection.is_empty() {
            self.at(selection.from)
                .map(|mark| mark.range.clone())
                .into_iter()
                .collect()
        } else {
            self.overlapping(selection)
                .map(|mark| mark.range.clone())
                .collect()
        };

        self.marks.retain(|mark| !doomed.contains(&mark.range));
        doomed
    }

    /// Move marks through a text edit, dropping links whose text vanished
    pub(crate) fn map_edit(&mut self, edit: &TextEdit) {
        for mark in &mut self.marks {
            let start = edit.map(mark.range.start, Bias::Right);
            let end = edit.map(mark.range.end, Bias::Left);
            mark.range = start..end.max(start);
        }
        self.marks.retain(|mark| !mark.range.is_empty());
    }

    /// Add an already-validated mark at load time
    pub(crate) fn push(&mut self, range: Range<usize>, attrs: LinkAttributes) {
        self.upsert(range, attrs);
    }
}
