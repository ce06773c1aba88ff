use std::cell::RefCell;
use std::rc::Rc;

use crate::editing::{
    Cmd, Document, DocumentEngine, Patch, SelectionRange, SelectionTracker, Subscription,
    UpdateReason,
};
use crate::links::autolink::autolink;
use crate::links::form::DEFAULT_PLACEHOLDER;
use crate::links::{
    Anchor, CommitBridge, CommitOutcome, EditForm, Effect, FormIntent, FormKey, FormView,
    Layout, LinkAction, LinkDraft, LinkEditState, Positioner, ShortcutDetector, ShortcutEvent,
    strip_markup,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEditorOptions {
    /// Link bare URLs when whitespace is typed after them
    pub autolink: bool,
    pub placeholder: String,
}

impl Default for LinkEditorOptions {
    fn default() -> Self {
        Self {
            autolink: true,
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// Owns a document and its link editing session.
///
/// The editor is the single entry point the UI uses: it feeds user actions
/// through the [`LinkEditState`] reducer, runs the resulting commits through
/// the [`CommitBridge`] and aborts the session when the document or the
/// selection changes underneath it.
///
/// Listeners are registered by [`LinkEditor::init`] and removed by
/// [`LinkEditor::dispose`]; both are idempotent. Until `init` runs, nothing
/// aborts a session and typed link syntax is not detected.
///
/// ```rust
/// # use markdown_linkedit_engine::editing::{Cmd, Document, SelectionRange};
/// # use markdown_linkedit_engine::links::LinkEditor;
/// let mut editor = LinkEditor::new(Document::from_markdown("hello world"));
/// editor.init();
/// editor.edit(Cmd::Select { range: SelectionRange::new(0, 5) });
///
/// editor.click_edit();
/// editor.set_href("https://example.com");
/// editor.submit();
///
/// assert!(!editor.is_editing());
/// assert_eq!(editor.document().to_markdown(), "[hello](https://example.com) world");
/// ```
pub struct LinkEditor<D: DocumentEngine = Document> {
    doc: D,
    state: Rc<RefCell<LinkEditState>>,
    tracker: Option<SelectionTracker>,
    detector: ShortcutDetector,
    form: EditForm,
    options: LinkEditorOptions,
    subscriptions: Vec<Subscription>,
}

impl<D: DocumentEngine> LinkEditor<D> {
    pub fn new(doc: D) -> Self {
        Self::with_options(doc, LinkEditorOptions::default())
    }

    pub fn with_options(doc: D, options: LinkEditorOptions) -> Self {
        Self {
            doc,
            state: Rc::new(RefCell::new(LinkEditState::Idle)),
            tracker: None,
            detector: ShortcutDetector::new(),
            form: EditForm::new(options.placeholder.clone()),
            options,
            subscriptions: Vec::new(),
        }
    }

    /// Register the abort-on-change listeners and the shortcut detector
    pub fn init(&mut self) {
        if self.is_initialised() {
            return;
        }

        let tracker = SelectionTracker::attach(&self.doc);
        let on_selection = {
            let state = Rc::clone(&self.state);
            tracker.subscribe(move |_| {
                abort(
                    &state,
                    UpdateReason {
                        doc: false,
                        selection: true,
                    },
                )
            })
        };
        let on_doc = {
            let state = Rc::clone(&self.state);
            self.doc.subscribe(Box::new(move |update| {
                if update.reason.doc {
                    abort(&state, update.reason);
                }
            }))
        };

        self.detector.attach(&self.doc);
        self.subscriptions = vec![on_selection, on_doc];
        self.tracker = Some(tracker);
        log::debug!("link editor initialised");
    }

    /// Drop every listener and end any open session without committing
    pub fn dispose(&mut self) {
        if !self.is_initialised() {
            return;
        }
        self.subscriptions.clear();
        self.tracker = None;
        self.detector.detach();
        *self.state.borrow_mut() = LinkEditState::Idle;
        log::debug!("link editor disposed");
    }

    pub fn is_initialised(&self) -> bool {
        self.tracker.is_some()
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn into_document(mut self) -> D {
        self.dispose();
        self.doc
    }

    pub fn options(&self) -> &LinkEditorOptions {
        &self.options
    }

    pub fn state(&self) -> LinkEditState {
        self.state.borrow().clone()
    }

    pub fn is_editing(&self) -> bool {
        self.state.borrow().is_editing()
    }

    pub fn href(&self) -> String {
        self.state.borrow().href().to_string()
    }

    pub fn draft(&self) -> Option<LinkDraft> {
        self.state.borrow().draft().cloned()
    }

    pub fn selection(&self) -> SelectionRange {
        self.tracker
            .as_ref()
            .map_or_else(|| self.doc.selection(), SelectionTracker::current)
    }

    /// Apply a host edit, then run the input rules on what it inserted.
    ///
    /// Any effective edit ends an open session first.
    pub fn edit(&mut self, cmd: Cmd) -> Patch {
        let patch = self.doc.apply(cmd);
        if !patch.reason.doc || !self.is_initialised() {
            return patch;
        }

        if let Some(event) = self.detector.poll(&self.doc) {
            self.shortcut(event);
        } else if self.options.autolink
            && let Some(inserted) = patch.changed.last()
        {
            autolink(&mut self.doc, inserted.clone());
        }
        patch
    }

    pub fn set_href(&mut self, href: impl Into<String>) {
        self.dispatch(LinkAction::HrefChanged(href.into()));
    }

    /// Commit the draft. Returns `None` when no session was open.
    pub fn submit(&mut self) -> Option<CommitOutcome> {
        match self.dispatch(LinkAction::Submit)? {
            Effect::Commit(draft) => Some(CommitBridge::commit(&mut self.doc, &draft)),
            Effect::Remove => None,
        }
    }

    pub fn cancel(&mut self) {
        self.dispatch(LinkAction::Cancel);
    }

    /// Open the form for the link at the selection, or for a new link.
    ///
    /// A collapsed cursor is first expanded to the link it touches.
    pub fn click_edit(&mut self) {
        if self.is_editing() {
            return;
        }
        if self.doc.selection().is_empty() {
            CommitBridge::select_link(&mut self.doc);
        }
        let href = self.doc.link_attributes().map(|attrs| attrs.href);
        self.dispatch(LinkAction::ClickEdit { href });
        let href = self.href();
        self.form.open(&href);
    }

    /// Remove the links under the selection. Ignored while editing.
    pub fn remove_link(&mut self) -> bool {
        match self.dispatch(LinkAction::RemoveLink) {
            Some(Effect::Remove) => CommitBridge::remove(&mut self.doc),
            _ => false,
        }
    }

    /// Start a session from the link key chord
    pub fn trigger_shortcut(&mut self) {
        let event = ShortcutDetector::keyboard(&self.doc);
        self.shortcut(event);
    }

    /// Start a session, or retarget the open one, from a detected trigger
    pub fn shortcut(&mut self, event: ShortcutEvent) {
        // Rewriting the markup is a doc change and ends the open session
        let kept_href = self.draft().map(|draft| draft.href);
        let event = strip_markup(&mut self.doc, event);
        self.dispatch(LinkAction::Shortcut(event));
        if let Some(href) = kept_href.filter(|href| !href.is_empty()) {
            self.dispatch(LinkAction::HrefChanged(href));
        }
        let href = self.href();
        self.form.open(&href);
    }

    pub fn anchor<L: Layout + ?Sized>(&self, layout: &L) -> Option<Anchor> {
        Positioner::anchor(&self.state.borrow(), &self.doc, layout)
    }

    /// Route a key press to the open form
    pub fn handle_form_key(&mut self, key: FormKey) -> Option<CommitOutcome> {
        if !self.is_editing() {
            return None;
        }
        let href = self.href();
        match self.form.handle_key(&href, key) {
            FormIntent::Edit(value) => {
                self.set_href(value);
                None
            }
            FormIntent::Submit => self.submit(),
            FormIntent::Cancel => {
                self.cancel();
                None
            }
            FormIntent::Moved | FormIntent::Ignored => None,
        }
    }

    pub fn form_view(&self) -> FormView {
        self.form.view(&self.state.borrow())
    }

    fn dispatch(&mut self, action: LinkAction) -> Option<Effect> {
        let mut state = self.state.borrow_mut();
        let was_editing = state.is_editing();
        let (next, effect) = std::mem::take(&mut *state).reduce(action);
        if was_editing != next.is_editing() {
            log::debug!("link session {}", if next.is_editing() { "opened" } else { "closed" });
        }
        *state = next;
        effect
    }
}

fn abort(state: &RefCell<LinkEditState>, reason: UpdateReason) {
    let Ok(mut state) = state.try_borrow_mut() else {
        log::warn!("link state busy, change {reason:?} not applied");
        return;
    };
    if state.is_editing() {
        let (next, _) = std::mem::take(&mut *state).reduce(LinkAction::Changed(reason));
        *state = next;
        log::debug!("link session aborted by {reason:?}");
    }
}
