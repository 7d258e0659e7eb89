//! Synchronous observer registries for your Rust types!
//!
//! This crate implements the push flavor of the [Observer pattern][]: a
//! subject owns a dispatcher, observers implementing [`Observer<P>`] are
//! attached to it, and whenever the subject decides something notable
//! happened it calls `notify(&payload)`, which calls every observer in
//! registration order before returning.
//!
//! Two dispatchers are provided:
//!
//! - [`local::Dispatcher<P>`] for single-threaded code, and
//! - [`shared::Dispatcher<P>`] for observers that live on multiple threads.
//!   It can additionally hand out [`Subscriber`]s, which receive the payloads
//!   as an async `Stream`.
//!
//! Both take a snapshot of their observers when a notification starts, so
//! observers can attach or detach observers (themselves included) while they
//! are being notified. Such changes apply to the next notification.
//!
//! There is also [`ObservableValue<T>`] as a ready-made subject that wraps a
//! value and notifies observers when it is set.
//!
//! Here is a quick walk-through:
//!
//! ```
//! use std::{cell::RefCell, convert::Infallible, rc::Rc};
//!
//! use tidings::local::Dispatcher;
//!
//! let dispatcher = Dispatcher::<i32>::new();
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! let log_a = log.clone();
//! let a = Rc::new(move |value: &i32| {
//!     log_a.borrow_mut().push(("A", *value));
//!     Ok::<_, Infallible>(())
//! });
//! let log_b = log.clone();
//! let b = Rc::new(move |value: &i32| {
//!     log_b.borrow_mut().push(("B", *value));
//!     Ok::<_, Infallible>(())
//! });
//!
//! dispatcher.attach(a.clone());
//! dispatcher.attach(b.clone());
//! // Attaching the same observer again does nothing.
//! assert!(!dispatcher.attach(a.clone()));
//!
//! dispatcher.broadcast(&5);
//! assert_eq!(*log.borrow(), [("A", 5), ("B", 5)]);
//!
//! dispatcher.detach(&a);
//! dispatcher.broadcast(&7);
//! assert_eq!(*log.borrow(), [("A", 5), ("B", 5), ("B", 7)]);
//! ```
//!
//! Observers can fail. By default, the first failure stops the delivery and is
//! returned from `notify` as a [`DeliveryError`]; see [`FailurePolicy`] for
//! the alternative.
//!
//! Cargo features:
//!
//! - `tracing`: Emit [tracing] events when observers are attached, detached
//!   and notified
//!
//! [Observer pattern]: https://en.wikipedia.org/wiki/Observer_pattern
#![warn(missing_debug_implementations, missing_docs, rust_2018_idioms, unreachable_pub)]

mod delivery;
mod error;
pub mod local;
mod observer;
mod registry;
pub mod shared;
mod subscriber;
mod value;

pub use delivery::FailurePolicy;
pub use error::DeliveryError;
pub use observer::Observer;
#[doc(inline)]
pub use subscriber::Subscriber;
pub use value::ObservableValue;
