//! This module defines a thread-safe [`Dispatcher`] that is clonable and can be
//! used from multiple threads at once.
//!
//! Registry changes and the snapshot taken at the start of each notification
//! are serialized through a lock, but observers are always called without
//! holding it.

use std::{
    convert::Infallible,
    fmt,
    sync::{self, Arc, RwLock},
};

use tokio::sync::mpsc;

use crate::{
    delivery::deliver,
    registry::{Address, Registry},
    subscriber::{Forwarder, Subscriber},
    DeliveryError, FailurePolicy, Observer,
};

/// An observer as stored by a [`Dispatcher`].
pub type ObserverArc<P, E = Infallible> = Arc<dyn Observer<P, Error = E> + Send + Sync>;

pub(crate) type SharedRegistry<P, E> = RwLock<Registry<ObserverArc<P, E>>>;

/// A thread-safe registry of observers that delivers notifications
/// synchronously, in registration order.
///
/// Unlike [`local::Dispatcher`](crate::local::Dispatcher), this `Dispatcher` is
/// `Send` and `Sync`, and only accepts observers that are too.
pub struct Dispatcher<P: ?Sized, E = Infallible> {
    registry: Arc<SharedRegistry<P, E>>,
}

impl<P: ?Sized, E> Dispatcher<P, E> {
    /// Create a new `Dispatcher` that aborts delivery at the first failing
    /// observer.
    pub fn new() -> Self {
        Self::with_policy(FailurePolicy::Abort)
    }

    /// Create a new `Dispatcher` with the given failure policy.
    pub fn with_policy(policy: FailurePolicy) -> Self {
        Self { registry: Arc::new(RwLock::new(Registry::new(policy))) }
    }

    /// The failure policy this dispatcher was created with.
    pub fn policy(&self) -> FailurePolicy {
        self.registry.read().unwrap().policy()
    }

    /// Register an observer.
    ///
    /// If the observer is already registered, this does nothing. Returns
    /// whether the observer was added.
    ///
    /// An observer attached while a notification is being delivered only
    /// receives the following notifications.
    pub fn attach(&self, observer: ObserverArc<P, E>) -> bool {
        self.registry.write().unwrap().attach(observer)
    }

    /// Unregister an observer.
    ///
    /// `observer` can be any `Arc` pointing to the same allocation as the one
    /// that was attached. If it isn't registered, this does nothing. Returns
    /// whether the observer was removed.
    pub fn detach<O: ?Sized>(&self, observer: &Arc<O>) -> bool {
        // Dropped after the lock is released, observers may use the
        // dispatcher from `Drop`.
        let removed = self.registry.write().unwrap().detach(observer.address());
        removed.is_some()
    }

    /// Whether `observer` is currently registered.
    pub fn contains<O: ?Sized>(&self, observer: &Arc<O>) -> bool {
        self.registry.read().unwrap().contains(observer.address())
    }

    /// The number of registered observers.
    ///
    /// Other clones of this dispatcher may change the registry right after
    /// this returns.
    pub fn len(&self) -> usize {
        self.registry.read().unwrap().len()
    }

    /// Whether no observers are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `payload` to every registered observer, on the calling thread.
    ///
    /// The set of observers is fixed when this is called: observers attached
    /// or detached concurrently, or from within [`Observer::update`], are only
    /// affected from the next call on.
    ///
    /// Returns once every observer has been called, or, with
    /// [`FailurePolicy::Abort`], as soon as one of them fails.
    pub fn notify(&self, payload: &P) -> Result<(), DeliveryError<E>> {
        let (observers, policy) = {
            let registry = self.registry.read().unwrap();
            (registry.snapshot(), registry.policy())
        };

        deliver(&observers, payload, policy)
    }

    /// Obtain a [`Subscriber`] that receives a clone of every payload
    /// delivered from now on.
    ///
    /// The subscriber is attached like any other observer, after the ones
    /// that are already registered, and detached again when it is dropped.
    pub fn subscribe(&self) -> Subscriber<P, E>
    where
        P: Clone + Send + 'static,
        E: 'static,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let forwarder: Arc<Forwarder<P, E>> = Arc::new(Forwarder::new(sender));
        let handle = Arc::downgrade(&forwarder);
        self.attach(forwarder);

        Subscriber::new(receiver, handle, self.downgrade())
    }

    /// Create a [`WeakDispatcher`] for this dispatcher.
    pub fn downgrade(&self) -> WeakDispatcher<P, E> {
        WeakDispatcher { registry: Arc::downgrade(&self.registry) }
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
        f.debug_tuple("Dispatcher").field(&self.registry).finish()
    }
}

/// A non-owning handle to a [`Dispatcher`].
pub struct WeakDispatcher<P: ?Sized, E = Infallible> {
    registry: sync::Weak<SharedRegistry<P, E>>,
}

impl<P: ?Sized, E> WeakDispatcher<P, E> {
    /// Get the dispatcher back, if any handle to it is still alive.
    pub fn upgrade(&self) -> Option<Dispatcher<P, E>> {
        self.registry.upgrade().map(|registry| Dispatcher { registry })
    }

    /// Detach the observer at `address` if the dispatcher is still alive.
    ///
    /// Never panics, so it can be used from `Drop` implementations.
    pub(crate) fn detach_address(&self, address: *const ()) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let removed = match registry.write() {
            Ok(mut registry) => registry.detach(address),
            Err(_) => None,
        };
        drop(removed);
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
