use crate::editing::{SelectionRange, UpdateReason};

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub changed: Vec<std::ops::Range<usize>>,
    pub new_selection: SelectionRange,
    pub version: u64,
    pub reason: UpdateReason,
}
