use crate::editing::{Cmd, DocumentEngine, LinkAttributes, SelectionRange};
use crate::links::LinkDraft;

/// What a commit did to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The range now carries the link
    Linked { range: SelectionRange },
    /// Links touched by the range were removed
    Unlinked { range: SelectionRange },
    /// The href was inserted as linked text at the cursor
    Inserted { range: SelectionRange },
    /// The target no longer resolved; nothing was changed
    Degraded,
}

/// Turns confirmed drafts into document commands
pub struct CommitBridge;

impl CommitBridge {
    /// Write `draft` into the document and return focus to the text.
    ///
    /// The target is the draft's range or, when it has none, the current
    /// selection. Focus lands at the end of the affected range. A target
    /// that no longer resolves leaves the document untouched and moves the
    /// cursor to the start.
    pub fn commit<D: DocumentEngine + ?Sized>(doc: &mut D, draft: &LinkDraft) -> CommitOutcome {
        let target = draft.range.unwrap_or_else(|| doc.selection());
        let range = match doc.resolve(target) {
            Ok(range) => range,
            Err(err) => {
                log::warn!("link commit skipped: {err}");
                doc.apply(Cmd::Focus { at: Some(0) });
                return CommitOutcome::Degraded;
            }
        };

        let outcome = if draft.href.is_empty() {
            doc.apply(Cmd::RemoveLink { range });
            CommitOutcome::Unlinked { range }
        } else if range.is_empty() {
            doc.apply(Cmd::InsertText {
                at: range.from,
                text: draft.href.clone(),
            });
            let inserted = SelectionRange::new(range.from, range.from + draft.href.len());
            doc.apply(Cmd::UpsertLink {
                range: inserted.as_range(),
                attrs: LinkAttributes::new(draft.href.as_str()),
            });
            CommitOutcome::Inserted { range: inserted }
        } else {
            doc.apply(Cmd::UpsertLink {
                range: range.as_range(),
                attrs: LinkAttributes::new(draft.href.as_str()),
            });
            CommitOutcome::Linked { range }
        };

        let focus = match outcome {
            CommitOutcome::Linked { range }
            | CommitOutcome::Unlinked { range }
            | CommitOutcome::Inserted { range } => range.to,
            CommitOutcome::Degraded => 0,
        };
        doc.apply(Cmd::Focus { at: Some(focus) });
        log::debug!("link commit: {outcome:?}");
        outcome
    }

    /// Remove every link the selection touches and refocus.
    ///
    /// Returns whether anything was removed.
    pub fn remove<D: DocumentEngine + ?Sized>(doc: &mut D) -> bool {
        let range = doc.selection();
        let patch = doc.apply(Cmd::RemoveLink { range });
        doc.apply(Cmd::Focus { at: None });
        patch.reason.doc
    }

    /// Expand the selection to the link at the cursor
    pub fn select_link<D: DocumentEngine + ?Sized>(doc: &mut D) -> SelectionRange {
        doc.apply(Cmd::SelectLink).new_selection
    }
}
