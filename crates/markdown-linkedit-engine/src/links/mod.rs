/*!
 * # Link Editing
 *
 * Inline creation, editing and removal of links through a small floating
 * form instead of a dialog.
 *
 * ## Flow
 *
 * ```text
 * SelectionTracker + ShortcutDetector
 *          |
 *          v
 *    LinkEditState (reducer) ---> Positioner, EditForm
 *          |
 *       Effect
 *          v
 *    CommitBridge ---> DocumentEngine ---> back to the tracker
 * ```
 *
 * [`LinkEditor`] wires the pieces together for one document. A session
 * starts from the edit button ([`LinkEditor::click_edit`]), the link key
 * chord ([`LinkEditor::trigger_shortcut`]) or typed `[label]()` syntax, and
 * ends on submit, cancel, or any document or selection change.
 */

pub mod autolink;
pub mod bridge;
pub mod editor;
pub mod form;
pub mod positioner;
pub mod shortcut;
pub mod state;

pub use bridge::{CommitBridge, CommitOutcome};
pub use editor::{LinkEditor, LinkEditorOptions};
pub use form::{EditForm, FormIntent, FormKey, FormView};
pub use positioner::{Anchor, AnchorRect, GridLayout, Layout, Placement, Positioner, Surface};
pub use shortcut::{ShortcutDetector, ShortcutEvent, TriggerKind, strip_markup};
pub use state::{Effect, LinkAction, LinkDraft, LinkEditState};
