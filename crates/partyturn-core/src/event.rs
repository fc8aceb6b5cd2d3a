//! Observer registration.
//!
//! [`Listeners::subscribe`] hands back a [`Subscription`] that is neither
//! `Clone` nor `Copy`, and [`Listeners::unsubscribe`] consumes it. A listener
//! therefore cannot be registered twice through one handle, nor removed
//! twice.

use std::fmt;

/// Handle for one registered listener.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a Subscription makes the listener impossible to remove"]
pub struct Subscription {
    id: u64,
}

type Callback<E> = Box<dyn FnMut(&E) + Send>;

/// A multicast listener list for events of type `E`.
pub struct Listeners<E> {
    next_id: u64,
    entries: Vec<(u64, Callback<E>)>,
}

impl<E> Listeners<E> {
    /// Creates an empty listener list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Registers `callback` and returns the handle that removes it.
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + Send + 'static) -> Subscription {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        Subscription { id }
    }

    /// Removes the listener behind `subscription`.
    ///
    /// Returns `false` if the handle came from a different list.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(id, _)| *id != subscription.id);
        self.entries.len() != before
    }

    /// Delivers `event` to every listener in registration order.
    pub fn emit(&mut self, event: &E) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_reaches_all_listeners_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();
        let a = Arc::clone(&seen);
        let _first = listeners.subscribe(move |e: &u32| a.lock().unwrap().push(("a", *e)));
        let b = Arc::clone(&seen);
        let _second = listeners.subscribe(move |e: &u32| b.lock().unwrap().push(("b", *e)));

        listeners.emit(&7);

        assert_eq!(*seen.lock().unwrap(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_unsubscribe_removes_only_that_listener() {
        let count = Arc::new(Mutex::new(0));
        let mut listeners = Listeners::new();
        let c = Arc::clone(&count);
        let keep = listeners.subscribe(move |_: &()| *c.lock().unwrap() += 1);
        let drop_me = listeners.subscribe(|_: &()| panic!("removed listener was called"));

        assert!(listeners.unsubscribe(drop_me));
        listeners.emit(&());

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(listeners.len(), 1);
        assert!(listeners.unsubscribe(keep));
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_subscription_removed_after_emit_is_not_called_again() {
        let count = Arc::new(Mutex::new(0));
        let mut listeners = Listeners::new();
        let c = Arc::clone(&count);
        let sub = listeners.subscribe(move |_: &u8| *c.lock().unwrap() += 1);

        listeners.emit(&1);
        assert!(listeners.unsubscribe(sub));
        listeners.emit(&2);

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
