use std::{
    collections::hash_map::DefaultHasher,
    convert::Infallible,
    hash::{Hash, Hasher},
    ops,
};

use crate::{local::Dispatcher, DeliveryError};

/// A value that notifies observers when it changes.
///
/// This is a ready-made subject: it owns a value and a
/// [`local::Dispatcher`](crate::local::Dispatcher) for it, and every
/// modification goes through one of its associated functions, which then
/// deliver the new value to the registered observers.
///
/// Reading goes through `Deref<Target = T>`. Everything that writes or reaches
/// the dispatcher is an associated function returning the delivery `Result`,
/// e.g. `ObservableValue::set(&mut value, 5)?`, so method calls always resolve
/// to the inner type.
///
/// The new value is stored before any observer runs, so it is kept even if
/// delivery fails.
#[derive(Debug)]
pub struct ObservableValue<T, E = Infallible> {
    value: T,
    dispatcher: Dispatcher<T, E>,
}

impl<T, E> ObservableValue<T, E> {
    /// Create a new `ObservableValue` with the given initial value and no
    /// observers.
    pub fn new(value: T) -> Self {
        Self::with_dispatcher(value, Dispatcher::new())
    }

    /// Create a new `ObservableValue` that notifies the observers of an
    /// existing dispatcher.
    ///
    /// Use this to pick a [`FailurePolicy`](crate::FailurePolicy) other than
    /// the default.
    pub fn with_dispatcher(value: T, dispatcher: Dispatcher<T, E>) -> Self {
        Self { value, dispatcher }
    }

    /// Get the dispatcher, to attach or detach observers.
    pub fn dispatcher(this: &Self) -> &Dispatcher<T, E> {
        &this.dispatcher
    }

    /// Get a reference to the inner value.
    ///
    /// Same as dereferencing `this`, spelled out for call sites where the
    /// target type can't be inferred.
    pub fn get(this: &Self) -> &T {
        &this.value
    }

    /// Set the inner value to the given `value` and notify observers.
    pub fn set(this: &mut Self, value: T) -> Result<(), DeliveryError<E>> {
        this.value = value;
        Self::notify(this)
    }

    /// Set the inner value to the given `value` and notify observers if the
    /// updated value does not equal the previous value.
    ///
    /// Returns whether observers were notified.
    pub fn set_eq(this: &mut Self, value: T) -> Result<bool, DeliveryError<E>>
    where
        T: PartialEq,
    {
        if this.value == value {
            return Ok(false);
        }
        Self::set(this, value)?;
        Ok(true)
    }

    /// Set the inner value to the given `value` and notify observers if the
    /// hash of the updated value does not equal the hash of the previous
    /// value.
    ///
    /// Returns whether observers were notified.
    pub fn set_hash(this: &mut Self, value: T) -> Result<bool, DeliveryError<E>>
    where
        T: Hash,
    {
        let prev_hash = hash(&this.value);
        this.value = value;
        if hash(&this.value) == prev_hash {
            return Ok(false);
        }
        Self::notify(this)?;
        Ok(true)
    }

    /// Mutate the inner value in place, then deliver it to every observer.
    ///
    /// Delivery happens unconditionally, whatever the closure did. See
    /// [`update_if`][Self::update_if] to let the closure decide.
    pub fn update(this: &mut Self, f: impl FnOnce(&mut T)) -> Result<(), DeliveryError<E>> {
        f(&mut this.value);
        Self::notify(this)
    }

    /// Maybe update the inner value and notify observers if it changed.
    ///
    /// The closure given to this function must return `true` if observers
    /// should be notified of a change to the inner value. Returns what the
    /// closure returned.
    pub fn update_if(
        this: &mut Self,
        f: impl FnOnce(&mut T) -> bool,
    ) -> Result<bool, DeliveryError<E>> {
        if !f(&mut this.value) {
            return Ok(false);
        }
        Self::notify(this)?;
        Ok(true)
    }

    /// Discard the dispatcher handle and return the inner value.
    pub fn into_inner(this: Self) -> T {
        this.value
    }

    fn notify(this: &Self) -> Result<(), DeliveryError<E>> {
        this.dispatcher.notify(&this.value)
    }
}

impl<T: Default, E> Default for ObservableValue<T, E> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// Read-only: writes have to go through the associated functions so that
// observers see them.
impl<T, E> ops::Deref for ObservableValue<T, E> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

fn hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
