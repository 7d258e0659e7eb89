use std::ops::Deref;

use imbl::Vector;

use crate::{DeliveryError, Observer};

/// What a dispatcher does when an observer fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FailurePolicy {
    /// Stop at the first failing observer.
    ///
    /// Observers after it don't receive the payload, and the error is returned
    /// from `notify`.
    #[default]
    Abort,

    /// Skip failing observers and keep going.
    ///
    /// Every observer of the pass receives the payload. Afterwards, the first
    /// error is returned from `notify` together with the number of failures.
    /// The other errors are only logged (with the `tracing` feature).
    Continue,
}

/// Call every observer of a registry snapshot, in order.
pub(crate) fn deliver<P, O, R>(
    observers: &Vector<R>,
    payload: &P,
    policy: FailurePolicy,
) -> Result<(), DeliveryError<O::Error>>
where
    P: ?Sized,
    O: Observer<P> + ?Sized,
    R: Clone + Deref<Target = O>,
{
    #[cfg(feature = "tracing")]
    tracing::debug!("Delivering notification to {} observers", observers.len());

    let mut first_error = None;
    let mut failures = 0;

    for (position, observer) in observers.iter().enumerate() {
        let Err(source) = Observer::update(&**observer, payload) else {
            continue;
        };

        match policy {
            FailurePolicy::Abort => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Observer at position {position} failed, aborting delivery");
                return Err(DeliveryError { position, failures: 1, source });
            }
            FailurePolicy::Continue => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Observer at position {position} failed, delivering to the rest");
                failures += 1;
                if first_error.is_none() {
                    first_error = Some((position, source));
                }
            }
        }
    }

    match first_error {
        Some((position, source)) => Err(DeliveryError { position, failures, source }),
        None => Ok(()),
    }
}
