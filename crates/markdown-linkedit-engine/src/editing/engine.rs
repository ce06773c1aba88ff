use std::borrow::Cow;
use std::ops::Range;

use crate::editing::{
    Cmd, DocUpdate, DocumentError, LinkAttributes, LinkSet, Patch, SelectionRange, Subscription,
};

/// The document engine the link editor drives.
///
/// Everything here is synchronous: `apply` runs a command to completion and
/// notifies subscribers before it returns. Invalid offsets are clamped,
/// never reported through `apply`.
pub trait DocumentEngine {
    /// Length of the text in bytes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn selection(&self) -> SelectionRange;

    fn links(&self) -> &LinkSet;

    /// Attributes of the link active at the current selection
    fn link_attributes(&self) -> Option<LinkAttributes> {
        self.links()
            .active(self.selection())
            .map(|mark| mark.attrs.clone())
    }

    /// Text of `range`, clamped to the document and to character boundaries
    fn slice(&self, range: Range<usize>) -> Cow<'_, str>;

    /// Nearest character boundary at or before `offset`, within the document
    fn clamp_offset(&self, offset: usize) -> usize;

    /// Check that `range` still addresses this document
    fn resolve(&self, range: SelectionRange) -> Result<SelectionRange, DocumentError>;

    fn subscribe(&self, listener: Box<dyn FnMut(&DocUpdate)>) -> Subscription;

    fn apply(&mut self, cmd: Cmd) -> Patch;
}
