use std::ops::Range;

use serde::Serialize;

use crate::editing::{DocumentEngine, SelectionRange};
use crate::links::LinkEditState;

/// Screen-space rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AnchorRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl AnchorRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Smallest rectangle containing both
    pub fn union(self, other: AnchorRect) -> AnchorRect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        AnchorRect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Placement {
    Top,
    Bottom,
}

/// Which floating surface an anchor is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Surface {
    /// "Make link" affordance over a plain selection
    SelectionToolbar,
    /// Edit and unlink buttons for an existing link
    LinkToolbar,
    EditForm,
}

impl Surface {
    pub fn placement(self) -> Placement {
        match self {
            Surface::SelectionToolbar => Placement::Top,
            Surface::LinkToolbar | Surface::EditForm => Placement::Bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Anchor {
    pub rect: AnchorRect,
    pub surface: Surface,
    /// Document range the rectangle was computed from
    pub range: SelectionRange,
}

impl Anchor {
    pub fn placement(&self) -> Placement {
        self.surface.placement()
    }

    /// Top-left corner for a floating box of the given size.
    ///
    /// The box goes on the anchor's preferred side, flips to the other side
    /// when it would leave the viewport, and is then clamped inside it.
    pub fn popup_origin(&self, width: f32, height: f32, viewport: AnchorRect) -> (f32, f32) {
        let above = self.rect.y - height;
        let below = self.rect.bottom();
        let y = match self.placement() {
            Placement::Top if above < viewport.y => below,
            Placement::Top => above,
            Placement::Bottom if below + height > viewport.bottom() => above,
            Placement::Bottom => below,
        };

        (
            clamp_axis(self.rect.x, viewport.x, viewport.right() - width),
            clamp_axis(y, viewport.y, viewport.bottom() - height),
        )
    }
}

fn clamp_axis(value: f32, min: f32, max: f32) -> f32 {
    if max < min { min } else { value.clamp(min, max) }
}

/// Maps document offsets to screen geometry
pub trait Layout {
    /// Zero-width rectangle of the caret in front of `offset`
    fn caret_rect(&self, text: &str, offset: usize) -> AnchorRect;

    /// Bounding box of a range
    fn range_rect(&self, text: &str, range: SelectionRange) -> AnchorRect {
        let start = self.caret_rect(text, range.from);
        if range.is_empty() {
            return start;
        }
        start.union(self.caret_rect(text, range.to))
    }
}

/// Monospace layout that breaks at newlines and soft-wraps every `columns`
/// characters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub columns: u16,
    pub cell_width: f32,
    pub cell_height: f32,
    pub origin: (f32, f32),
}

impl GridLayout {
    pub fn new(columns: u16) -> Self {
        Self {
            columns: columns.max(1),
            cell_width: 1.0,
            cell_height: 1.0,
            origin: (0.0, 0.0),
        }
    }

    pub fn with_cell_size(mut self, width: f32, height: f32) -> Self {
        self.cell_width = width;
        self.cell_height = height;
        self
    }

    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.origin = (x, y);
        self
    }

    /// Byte ranges of the visual rows, newlines excluded
    pub fn rows(&self, text: &str) -> Vec<Range<usize>> {
        let width = usize::from(self.columns.max(1));
        let mut rows = Vec::new();
        let mut line_start = 0;

        for line in text.split('\n') {
            let mut row_start = line_start;
            for (count, (index, _)) in line.char_indices().enumerate() {
                if count > 0 && count % width == 0 {
                    rows.push(row_start..line_start + index);
                    row_start = line_start + index;
                }
            }
            rows.push(row_start..line_start + line.len());
            line_start += line.len() + 1;
        }

        rows
    }

    /// Row and column of the caret in front of `offset`
    pub fn cell_of(&self, text: &str, offset: usize) -> (usize, usize) {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }

        let rows = self.rows(text);
        let row = rows
            .iter()
            .rposition(|row| row.start <= offset)
            .unwrap_or(0);
        let column = text[rows[row].start..offset].chars().count();
        (row, column)
    }

    fn rect_at(&self, row: usize, column: usize) -> AnchorRect {
        AnchorRect::new(
            self.origin.0 + column as f32 * self.cell_width,
            self.origin.1 + row as f32 * self.cell_height,
            0.0,
            self.cell_height,
        )
    }
}

impl Layout for GridLayout {
    fn caret_rect(&self, text: &str, offset: usize) -> AnchorRect {
        let (row, column) = self.cell_of(text, offset);
        self.rect_at(row, column)
    }

    /// Ranges spanning several rows get the full-width band of those rows
    fn range_rect(&self, text: &str, range: SelectionRange) -> AnchorRect {
        let (start_row, start_column) = self.cell_of(text, range.from);
        let (end_row, end_column) = self.cell_of(text, range.to);

        if start_row == end_row {
            return self
                .rect_at(start_row, start_column)
                .union(self.rect_at(end_row, end_column));
        }

        AnchorRect::new(
            self.origin.0,
            self.origin.1 + start_row as f32 * self.cell_height,
            f32::from(self.columns) * self.cell_width,
            (end_row - start_row + 1) as f32 * self.cell_height,
        )
    }
}

/// Decides where floating link UI goes
pub struct Positioner;

impl Positioner {
    /// Anchor for the current state, or `None` when nothing should float.
    ///
    /// While idle, a selection inside one link (or a cursor strictly inside
    /// it) anchors the link toolbar to that link; any other non-empty
    /// selection anchors the selection toolbar. While editing, the form is
    /// pinned to the draft range, falling back to the selection.
    pub fn anchor<D, L>(state: &LinkEditState, doc: &D, layout: &L) -> Option<Anchor>
    where
        D: DocumentEngine + ?Sized,
        L: Layout + ?Sized,
    {
        if doc.is_empty() {
            return None;
        }

        let selection = doc.selection();
        let (range, surface) = match state {
            LinkEditState::Editing(draft) => {
                (draft.range.unwrap_or(selection), Surface::EditForm)
            }
            LinkEditState::Idle if selection.is_empty() => {
                let mark = doc.links().at(selection.from)?;
                (mark.selection(), Surface::LinkToolbar)
            }
            LinkEditState::Idle => match doc.links().covering(selection) {
                Some(mark) => (mark.selection(), Surface::LinkToolbar),
                None => (selection, Surface::SelectionToolbar),
            },
        };

        let text = doc.slice(0..doc.len());
        Some(Anchor {
            rect: layout.range_rect(&text, range),
            surface,
            range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{Cmd, Document};
    use crate::links::LinkDraft;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn rows_split_lines_and_wrap() {
        let layout = GridLayout::new(4);

        assert_eq!(layout.rows("abcdefghij\nxy"), vec![0..4, 4..8, 8..10, 11..13]);
        assert_eq!(layout.rows(""), vec![0..0]);
        assert_eq!(layout.rows("ab\n"), vec![0..2, 3..3]);
    }

    #[rstest]
    #[case::start(0, (0, 0))]
    #[case::wrap_point(4, (1, 0))]
    #[case::line_end(10, (2, 2))]
    #[case::next_line(11, (3, 0))]
    #[case::past_end(99, (3, 2))]
    fn cell_of_offsets(#[case] offset: usize, #[case] expected: (usize, usize)) {
        assert_eq!(GridLayout::new(4).cell_of("abcdefghij\nxy", offset), expected);
    }

    #[test]
    fn range_rect_on_one_row_spans_the_text() {
        let layout = GridLayout::new(80).with_cell_size(8.0, 16.0).with_origin(10.0, 20.0);

        let rect = layout.range_rect("hello world", SelectionRange::new(6, 11));

        assert_eq!(rect, AnchorRect::new(58.0, 20.0, 40.0, 16.0));
    }

    #[test]
    fn range_rect_over_rows_is_a_band() {
        let layout = GridLayout::new(4);

        let rect = layout.range_rect("abcdefgh", SelectionRange::new(2, 6));

        assert_eq!(rect, AnchorRect::new(0.0, 0.0, 4.0, 2.0));
    }

    fn doc_with_selection(markdown: &str, selection: SelectionRange) -> Document {
        let mut doc = Document::from_markdown(markdown);
        doc.apply(Cmd::Select { range: selection });
        doc
    }

    #[test]
    fn idle_plain_selection_gets_selection_toolbar() {
        let doc = doc_with_selection("make this a link", SelectionRange::new(5, 9));

        let anchor = Positioner::anchor(&LinkEditState::Idle, &doc, &GridLayout::new(80)).unwrap();

        assert_eq!(anchor.surface, Surface::SelectionToolbar);
        assert_eq!(anchor.range, SelectionRange::new(5, 9));
        assert_eq!(anchor.rect, AnchorRect::new(5.0, 0.0, 4.0, 1.0));
        assert_eq!(anchor.placement(), Placement::Top);
    }

    #[test]
    fn idle_selection_inside_link_anchors_to_the_link() {
        let doc = doc_with_selection("go [over here](https://a.com)", SelectionRange::new(4, 6));

        let anchor = Positioner::anchor(&LinkEditState::Idle, &doc, &GridLayout::new(80)).unwrap();

        assert_eq!(anchor.surface, Surface::LinkToolbar);
        assert_eq!(anchor.range, SelectionRange::new(3, 12));
    }

    #[test]
    fn idle_cursor_inside_link_anchors_to_the_link() {
        let doc = doc_with_selection("go [here](https://a.com)", SelectionRange::cursor(5));

        let anchor = Positioner::anchor(&LinkEditState::Idle, &doc, &GridLayout::new(80)).unwrap();

        assert_eq!(anchor.surface, Surface::LinkToolbar);
        assert_eq!(anchor.range, SelectionRange::new(3, 7));
    }

    #[test]
    fn idle_cursor_outside_links_has_no_anchor() {
        let doc = doc_with_selection("plain text", SelectionRange::cursor(3));

        assert_eq!(Positioner::anchor(&LinkEditState::Idle, &doc, &GridLayout::new(80)), None);
    }

    #[test]
    fn editing_pins_form_to_draft_range() {
        let doc = doc_with_selection("one two three", SelectionRange::cursor(0));
        let state = LinkEditState::Editing(LinkDraft {
            href: String::new(),
            range: Some(SelectionRange::new(4, 7)),
        });

        let anchor = Positioner::anchor(&state, &doc, &GridLayout::new(80)).unwrap();

        assert_eq!(anchor.surface, Surface::EditForm);
        assert_eq!(anchor.range, SelectionRange::new(4, 7));
        assert_eq!(anchor.placement(), Placement::Bottom);
    }

    #[test]
    fn editing_without_range_follows_selection() {
        let doc = doc_with_selection("one two three", SelectionRange::new(8, 13));
        let state = LinkEditState::Editing(LinkDraft::default());

        let anchor = Positioner::anchor(&state, &doc, &GridLayout::new(80)).unwrap();

        assert_eq!(anchor.range, SelectionRange::new(8, 13));
    }

    #[test]
    fn empty_document_has_no_anchor() {
        let state = LinkEditState::Editing(LinkDraft::default());
        assert_eq!(Positioner::anchor(&state, &Document::new(), &GridLayout::new(80)), None);
    }

    #[rstest]
    #[case::below(Surface::EditForm, AnchorRect::new(10.0, 5.0, 4.0, 1.0), (10.0, 6.0))]
    #[case::above(Surface::SelectionToolbar, AnchorRect::new(10.0, 5.0, 4.0, 1.0), (10.0, 2.0))]
    #[case::flips_down_at_top(Surface::SelectionToolbar, AnchorRect::new(10.0, 1.0, 4.0, 1.0), (10.0, 2.0))]
    #[case::flips_up_at_bottom(Surface::EditForm, AnchorRect::new(10.0, 22.0, 4.0, 1.0), (10.0, 19.0))]
    #[case::clamped_right(Surface::EditForm, AnchorRect::new(75.0, 5.0, 4.0, 1.0), (60.0, 6.0))]
    fn popup_origin_stays_in_viewport(
        #[case] surface: Surface,
        #[case] rect: AnchorRect,
        #[case] expected: (f32, f32),
    ) {
        let anchor = Anchor {
            rect,
            surface,
            range: SelectionRange::default(),
        };
        let viewport = AnchorRect::new(0.0, 0.0, 80.0, 24.0);

        assert_eq!(anchor.popup_origin(20.0, 3.0, viewport), expected);
    }
}
