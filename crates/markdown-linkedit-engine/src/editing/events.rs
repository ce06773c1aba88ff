use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::{Rc, Weak};

use serde::Serialize;

use crate::editing::SelectionRange;

/// What changed in the transaction that produced an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReason {
    /// Text or marks changed
    pub doc: bool,
    /// The selection moved
    pub selection: bool,
}

impl UpdateReason {
    pub fn any(self) -> bool {
        self.doc || self.selection
    }
}

/// Notification delivered to document listeners after every effective command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocUpdate {
    /// Document version after the command
    pub version: u64,
    pub reason: UpdateReason,
    /// Selection after the command
    pub selection: SelectionRange,
    /// Byte ranges of inserted text, in post-edit coordinates
    pub changed: Vec<Range<usize>>,
}

type Slot<E> = Rc<RefCell<Box<dyn FnMut(&E)>>>;

struct Slots<E> {
    next_id: u64,
    entries: Vec<(u64, Slot<E>)>,
}

/// Synchronous publish-subscribe registry.
///
/// `emit` snapshots the registered listeners before calling them, so a
/// listener may drop its own (or another) [`Subscription`] while it is being
/// notified. Listeners added during an emit are first called on the next one.
pub struct ListenerRegistry<E> {
    inner: Rc<RefCell<Slots<E>>>,
}

impl<E: 'static> ListenerRegistry<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Slots {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub fn subscribe(&self, listener: Box<dyn FnMut(&E)>) -> Subscription {
        let id = {
            let mut slots = self.inner.borrow_mut();
            let id = slots.next_id;
            slots.next_id += 1;
            slots.entries.push((id, Rc::new(RefCell::new(listener))));
            id
        };

        let registry: Weak<RefCell<Slots<E>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = registry.upgrade() {
                inner.borrow_mut().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    pub fn emit(&self, event: &E) {
        let listeners: Vec<Slot<E>> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|(_, slot)| Rc::clone(slot))
            .collect();

        for listener in listeners {
            // A listener that re-enters its own emit is skipped rather than aliased
            match listener.try_borrow_mut() {
                Ok(mut callback) => callback(event),
                Err(_) => log::warn!("skipping re-entrant listener"),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: 'static> Default for ListenerRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for ListenerRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Handle to a registered listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn emit_reaches_every_listener() {
        let registry = ListenerRegistry::<u32>::new();
        let total = Rc::new(Cell::new(0));

        let a = {
            let total = Rc::clone(&total);
            registry.subscribe(Box::new(move |n| total.set(total.get() + n)))
        };
        let b = {
            let total = Rc::clone(&total);
            registry.subscribe(Box::new(move |n| total.set(total.get() + n * 10)))
        };

        registry.emit(&2);

        assert_eq!(total.get(), 22);
        assert_eq!(registry.len(), 2);
        drop((a, b));
    }

    #[test]
    fn dropping_subscription_detaches_listener() {
        let registry = ListenerRegistry::<u32>::new();
        let calls = Rc::new(Cell::new(0));

        let subscription = {
            let calls = Rc::clone(&calls);
            registry.subscribe(Box::new(move |_| calls.set(calls.get() + 1)))
        };
        registry.emit(&1);
        drop(subscription);
        registry.emit(&1);

        assert_eq!(calls.get(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn explicit_unsubscribe_detaches_listener() {
        let registry = ListenerRegistry::<u32>::new();
        let subscription = registry.subscribe(Box::new(|_| {}));

        subscription.unsubscribe();

        assert!(registry.is_empty());
    }

    #[test]
    fn listener_can_unsubscribe_itself_during_emit() {
        let registry = ListenerRegistry::<u32>::new();
        let holder: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let subscription = {
            let holder = Rc::clone(&holder);
            let calls = Rc::clone(&calls);
            registry.subscribe(Box::new(move |_| {
                calls.set(calls.get() + 1);
                holder.borrow_mut().take();
            }))
        };
        *holder.borrow_mut() = Some(subscription);

        registry.emit(&1);
        registry.emit(&1);

        assert_eq!(calls.get(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let registry = ListenerRegistry::<u32>::new();
        let subscription = registry.subscribe(Box::new(|_| {}));

        drop(registry);
        drop(subscription);
    }
}
