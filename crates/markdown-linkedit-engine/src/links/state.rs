use crate::editing::{SelectionRange, UpdateReason};
use crate::links::ShortcutEvent;

/// The in-progress, uncommitted link edit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkDraft {
    pub href: String,
    /// Range detected when the session started; `None` means the selection
    /// at commit time is the target
    pub range: Option<SelectionRange>,
}

/// Link editing session state.
///
/// There is at most one session: the draft only exists inside `Editing`,
/// and every way out of it goes back to `Idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LinkEditState {
    #[default]
    Idle,
    Editing(LinkDraft),
}

/// Inputs to the link editing state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Edit button; carries the href of the link at the selection, if any
    ClickEdit { href: Option<String> },
    Shortcut(ShortcutEvent),
    HrefChanged(String),
    /// The document or the selection changed under the session
    Changed(UpdateReason),
    Submit,
    Cancel,
    RemoveLink,
}

/// Document work requested by a transition, run once the state has settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Commit(LinkDraft),
    Remove,
}

impl LinkEditState {
    pub fn is_editing(&self) -> bool {
        matches!(self, LinkEditState::Editing(_))
    }

    pub fn draft(&self) -> Option<&LinkDraft> {
        match self {
            LinkEditState::Editing(draft) => Some(draft),
            LinkEditState::Idle => None,
        }
    }

    /// Draft href, empty when idle
    pub fn href(&self) -> &str {
        self.draft().map_or("", |draft| draft.href.as_str())
    }

    /// Apply one action.
    ///
    /// Pure: the returned effect describes the document mutation that the
    /// caller must perform, and the returned state is already final when
    /// that happens.
    pub fn reduce(self, action: LinkAction) -> (Self, Option<Effect>) {
        use LinkAction as A;
        use LinkEditState::{Editing, Idle};

        match (self, action) {
            (Idle, A::ClickEdit { href }) => (
                Editing(LinkDraft {
                    href: href.unwrap_or_default(),
                    range: None,
                }),
                None,
            ),
            (Idle, A::Shortcut(event)) => (
                Editing(LinkDraft {
                    href: String::new(),
                    range: Some(event.range),
                }),
                None,
            ),
            // Last trigger wins; the href typed so far survives
            (Editing(mut draft), A::Shortcut(event)) => {
                draft.range = Some(event.range);
                (Editing(draft), None)
            }
            (Editing(mut draft), A::HrefChanged(href)) => {
                draft.href = href;
                (Editing(draft), None)
            }
            (Editing(_), A::Changed(reason)) if reason.any() => (Idle, None),
            (Editing(draft), A::Submit) => (Idle, Some(Effect::Commit(draft))),
            (Editing(_), A::Cancel) => (Idle, None),
            (Idle, A::RemoveLink) => (Idle, Some(Effect::Remove)),
            (state, _) => (state, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::TriggerKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn shortcut(from: usize, to: usize) -> LinkAction {
        LinkAction::Shortcut(ShortcutEvent {
            range: SelectionRange::new(from, to),
            trigger: TriggerKind::Keyboard,
        })
    }

    fn editing(href: &str, range: Option<SelectionRange>) -> LinkEditState {
        LinkEditState::Editing(LinkDraft {
            href: href.to_string(),
            range,
        })
    }

    #[test]
    fn click_edit_starts_session_with_current_href() {
        let (state, effect) = LinkEditState::Idle.reduce(LinkAction::ClickEdit {
            href: Some("https://a.com".to_string()),
        });

        assert_eq!(state, editing("https://a.com", None));
        assert_eq!(effect, None);
    }

    #[test]
    fn shortcut_starts_session_with_detected_range() {
        let (state, _) = LinkEditState::Idle.reduce(shortcut(5, 10));

        assert_eq!(state, editing("", Some(SelectionRange::new(5, 10))));
    }

    #[test]
    fn second_shortcut_replaces_range_and_keeps_href() {
        let (state, _) = editing("https://x.io", Some(SelectionRange::new(0, 4)))
            .reduce(shortcut(8, 12));

        assert_eq!(state, editing("https://x.io", Some(SelectionRange::new(8, 12))));
    }

    #[test]
    fn click_edit_while_editing_keeps_draft() {
        let before = editing("typed", Some(SelectionRange::new(1, 2)));

        let (state, effect) = before.clone().reduce(LinkAction::ClickEdit { href: None });

        assert_eq!(state, before);
        assert_eq!(effect, None);
    }

    #[rstest]
    #[case::doc(UpdateReason { doc: true, selection: false })]
    #[case::selection(UpdateReason { doc: false, selection: true })]
    #[case::both(UpdateReason { doc: true, selection: true })]
    fn changes_abort_without_effect(#[case] reason: UpdateReason) {
        let (state, effect) = editing("x", None).reduce(LinkAction::Changed(reason));

        assert_eq!(state, LinkEditState::Idle);
        assert_eq!(effect, None);
    }

    #[test]
    fn submit_hands_draft_to_commit() {
        let draft = LinkDraft {
            href: "https://x.io".to_string(),
            range: Some(SelectionRange::new(5, 10)),
        };

        let (state, effect) = LinkEditState::Editing(draft.clone()).reduce(LinkAction::Submit);

        assert_eq!(state, LinkEditState::Idle);
        assert_eq!(effect, Some(Effect::Commit(draft)));
    }

    #[rstest]
    #[case::cancel(LinkAction::Cancel)]
    #[case::submit(LinkAction::Submit)]
    #[case::href(LinkAction::HrefChanged("x".to_string()))]
    #[case::changed(LinkAction::Changed(UpdateReason { doc: true, selection: true }))]
    fn idle_ignores_session_actions(#[case] action: LinkAction) {
        assert_eq!(LinkEditState::Idle.reduce(action), (LinkEditState::Idle, None));
    }

    #[test]
    fn remove_is_ignored_while_editing() {
        let before = editing("x", None);
        assert_eq!(before.clone().reduce(LinkAction::RemoveLink), (before, None));
    }

    #[test]
    fn remove_from_idle_requests_removal() {
        assert_eq!(
            LinkEditState::Idle.reduce(LinkAction::RemoveLink),
            (LinkEditState::Idle, Some(Effect::Remove))
        );
    }
}
