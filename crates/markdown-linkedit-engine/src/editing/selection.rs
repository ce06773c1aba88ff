use std::cell::Cell;
use std::ops::Range;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::editing::events::{DocUpdate, ListenerRegistry, Subscription};
use crate::editing::DocumentEngine;

/// Cursor or selection in document coordinates (UTF-8 byte offsets).
///
/// Always normalised so that `from <= to`; a collapsed cursor has
/// `from == to`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRange {
    pub from: usize,
    pub to: usize,
}

impl SelectionRange {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            from: a.min(b),
            to: a.max(b),
        }
    }

    pub fn cursor(at: usize) -> Self {
        Self { from: at, to: at }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.from == self.to
    }

    #[must_use]
    pub fn len(self) -> usize {
        self.to - self.from
    }

    /// True when `other` lies entirely inside this range
    pub fn contains(self, other: SelectionRange) -> bool {
        self.from <= other.from && other.to <= self.to
    }

    pub fn as_range(self) -> Range<usize> {
        self.from..self.to
    }
}

impl From<Range<usize>> for SelectionRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Observes the document selection and republishes its movements.
///
/// The tracker caches the last selection it saw so readers never have to
/// reach back into the document, and notifies its own subscribers only when
/// the selection actually moved (including moves caused by text edits).
pub struct SelectionTracker {
    current: Rc<Cell<SelectionRange>>,
    listeners: ListenerRegistry<SelectionRange>,
    _subscription: Subscription,
}

impl SelectionTracker {
    pub fn attach<D: DocumentEngine + ?Sized>(doc: &D) -> Self {
        let current = Rc::new(Cell::new(doc.selection()));
        let listeners = ListenerRegistry::new();

        let subscription = {
            let current = Rc::clone(&current);
            let listeners = listeners.clone();
            doc.subscribe(Box::new(move |update: &DocUpdate| {
                if current.get() != update.selection {
                    current.set(update.selection);
                    listeners.emit(&update.selection);
                }
            }))
        };

        Self {
            current,
            listeners,
            _subscription: subscription,
        }
    }

    pub fn current(&self) -> SelectionRange {
        self.current.get()
    }

    pub fn is_empty(&self) -> bool {
        self.current.get().is_empty()
    }

    pub fn subscribe(&self, listener: impl FnMut(&SelectionRange) + 'static) -> Subscription {
        self.listeners.subscribe(Box::new(listener))
    }
}
