use std::{
    fmt,
    rc::Rc,
    sync::{self, Arc},
};

use imbl::Vector;

use crate::FailurePolicy;

/// A pointer whose identity is the address of the allocation it points to.
///
/// Metadata of wide pointers (vtables) is ignored, so the same observer
/// compares equal no matter which trait object type it was cast to.
pub(crate) trait Address {
    fn address(&self) -> *const ();
}

impl<T: ?Sized> Address for Rc<T> {
    fn address(&self) -> *const () {
        Rc::as_ptr(self).cast()
    }
}

impl<T: ?Sized> Address for Arc<T> {
    fn address(&self) -> *const () {
        Arc::as_ptr(self).cast()
    }
}

impl<T: ?Sized> Address for sync::Weak<T> {
    fn address(&self) -> *const () {
        self.as_ptr().cast()
    }
}

/// Ordered set of observers, keyed by pointer identity.
pub(crate) struct Registry<R> {
    /// Registration order is delivery order.
    observers: Vector<R>,
    policy: FailurePolicy,
}

impl<R: Clone + Address> Registry<R> {
    pub(crate) fn new(policy: FailurePolicy) -> Self {
        Self { observers: Vector::new(), policy }
    }

    pub(crate) fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn contains(&self, address: *const ()) -> bool {
        self.position(address).is_some()
    }

    /// Append `observer` unless it is already registered.
    ///
    /// Returns whether it was added.
    pub(crate) fn attach(&mut self, observer: R) -> bool {
        if self.contains(observer.address()) {
            #[cfg(feature = "tracing")]
            tracing::debug!("Observer is already attached, ignoring");
            return false;
        }

        self.observers.push_back(observer);
        #[cfg(feature = "tracing")]
        tracing::debug!(num_observers = self.observers.len(), "Observer attached");
        true
    }

    /// Remove the observer at `address`, if any, and return it.
    ///
    /// The returned handle may be the last one to the observer. Callers must
    /// release their lock on the registry before dropping it, since the
    /// observer's destructor may use the dispatcher again.
    #[must_use]
    pub(crate) fn detach(&mut self, address: *const ()) -> Option<R> {
        let index = self.position(address)?;
        let removed = self.observers.remove(index);
        #[cfg(feature = "tracing")]
        tracing::debug!(num_observers = self.observers.len(), "Observer detached");
        Some(removed)
    }

    /// A copy of the current registration list.
    ///
    /// This is a cheap structural clone; later changes to the registry are not
    /// visible through it.
    pub(crate) fn snapshot(&self) -> Vector<R> {
        self.observers.clone()
    }

    fn position(&self, address: *const ()) -> Option<usize> {
        self.observers.iter().position(|observer| observer.address() == address)
    }
}

impl<R> fmt::Debug for Registry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("num_observers", &self.observers.len())
            .field("policy", &self.policy)
            .finish()
    }
}
