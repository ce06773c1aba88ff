pub mod editing;
pub mod links;
pub mod markup;

// Re-export key types for easier usage
pub use editing::{
    Cmd, DocUpdate, Document, DocumentEngine, DocumentError, LinkAttributes, LinkMark, LinkSet,
    Patch, SelectionRange, Subscription,
};
pub use links::{
    Anchor, AnchorRect, CommitOutcome, FormKey, FormView, GridLayout, Layout, LinkEditState,
    LinkEditor, LinkEditorOptions, Surface,
};
