//! This module defines a single-threaded [`Dispatcher`] that can be attached
//! to, detached from and notified through a shared reference, including from
//! within an observer that is currently being notified.
//!
//! Use this when the subject and all of its observers live on one thread. See
//! [`shared::Dispatcher`](crate::shared::Dispatcher) for a thread-safe
//! variant.

use std::{
    cell::RefCell,
    convert::Infallible,
    fmt,
    rc::{self, Rc},
};

use crate::{
    delivery::deliver,
    registry::{Address, Registry},
    DeliveryError, FailurePolicy, Observer,
};

/// An observer as stored by a [`Dispatcher`].
pub type ObserverRc<P, E = Infallible> = Rc<dyn Observer<P, Error = E>>;

/// A registry of observers that delivers notifications synchronously, in
/// registration order.
///
/// Cloning a `Dispatcher` creates another handle to the same registry. To hold
/// on to a dispatcher from one of its own observers, use
/// [`downgrade`][Self::downgrade] so the two don't keep each other alive.
pub struct Dispatcher<P: ?Sized, E = Infallible> {
    registry: Rc<RefCell<Registry<ObserverRc<P, E>>>>,
}

impl<P: ?Sized, E> Dispatcher<P, E> {
    /// Create a new `Dispatcher` that aborts delivery at the first failing
    /// observer.
    pub fn new() -> Self {
        Self::with_policy(FailurePolicy::Abort)
    }

    /// Create a new `Dispatcher` with the given failure policy.
    pub fn with_policy(policy: FailurePolicy) -> Self {
        Self { registry: Rc::new(RefCell::new(Registry::new(policy))) }
    }

    /// The failure policy this dispatcher was created with.
    pub fn policy(&self) -> FailurePolicy {
        self.registry.borrow().policy()
    }

    /// Register an observer.
    ///
    /// If the observer is already registered, this does nothing. Returns
    /// whether the observer was added.
    ///
    /// An observer attached while a notification is being delivered only
    /// receives the following notifications.
    pub fn attach(&self, observer: ObserverRc<P, E>) -> bool {
        self.registry.borrow_mut().attach(observer)
    }

    /// Unregister an observer.
    ///
    /// `observer` can be any `Rc` pointing to the same allocation as the one
    /// that was attached. If it isn't registered, this does nothing. Returns
    /// whether the observer was removed.
    ///
    /// An observer detached while a notification is being delivered still
    /// receives that notification if it was registered when delivery started.
    pub fn detach<O: ?Sized>(&self, observer: &Rc<O>) -> bool {
        self.detach_address(observer.address())
    }

    fn detach_address(&self, address: *const ()) -> bool {
        // Dropped after the borrow ends, observers may use the dispatcher
        // from `Drop`.
        let removed = self.registry.borrow_mut().detach(address);
        removed.is_some()
    }

    /// Whether `observer` is currently registered.
    pub fn contains<O: ?Sized>(&self, observer: &Rc<O>) -> bool {
        self.registry.borrow().contains(observer.address())
    }

    /// The number of registered observers.
    pub fn len(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Whether no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `payload` to every registered observer.
    ///
    /// The set of observers is fixed when this is called: attaching or
    /// detaching observers from within [`Observer::update`] takes effect for
    /// the next call only. Observers may also call `notify` themselves, which
    /// starts a nested delivery pass.
    ///
    /// Returns once every observer has been called, or, with
    /// [`FailurePolicy::Abort`], as soon as one of them fails.
    pub fn notify(&self, payload: &P) -> Result<(), DeliveryError<E>> {
        // The borrow must end before any observer runs.
        let (observers, policy) = {
            let registry = self.registry.borrow();
            (registry.snapshot(), registry.policy())
        };

        deliver(&observers, payload, policy)
    }

    /// Create a [`WeakDispatcher`] for this dispatcher.
    pub fn downgrade(&self) -> WeakDispatcher<P, E> {
        WeakDispatcher { registry: Rc::downgrade(&self.registry) }
    }
}

impl<P: ?Sized> Dispatcher<P> {
    /// Deliver `payload` to every registered observer.
    ///
    /// Same as [`notify`][Self::notify], for observers that can't fail.
    pub fn broadcast(&self, payload: &P) {
        if let Err(error) = self.notify(payload) {
            match error.source {}
        }
    }
}

impl<P: ?Sized, E> Clone for Dispatcher<P, E> {
    fn clone(&self) -> Self {
        Self { registry: self.registry.clone() }
    }
}

impl<P: ?Sized, E> Default for Dispatcher<P, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ?Sized, E> fmt::Debug for Dispatcher<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.registry.try_borrow() {
            Ok(registry) => f.debug_tuple("Dispatcher").field(&*registry).finish(),
            Err(_) => f.debug_tuple("Dispatcher").field(&"<borrowed>").finish(),
        }
    }
}

/// A non-owning handle to a [`Dispatcher`].
pub struct WeakDispatcher<P: ?Sized, E = Infallible> {
    registry: rc::Weak<RefCell<Registry<ObserverRc<P, E>>>>,
}

impl<P: ?Sized, E> WeakDispatcher<P, E> {
    /// Get the dispatcher back, if any handle to it is still alive.
    pub fn upgrade(&self) -> Option<Dispatcher<P, E>> {
        self.registry.upgrade().map(|registry| Dispatcher { registry })
    }
}

impl<P: ?Sized, E> Clone for WeakDispatcher<P, E> {
    fn clone(&self) -> Self {
        Self { registry: self.registry.clone() }
    }
}

impl<P: ?Sized, E> fmt::Debug for WeakDispatcher<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDispatcher").finish_non_exhaustive()
    }
}
