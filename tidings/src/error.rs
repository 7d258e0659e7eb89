/// An observer failed while a notification was being delivered.
///
/// With [`FailurePolicy::Abort`][crate::FailurePolicy::Abort], this is the
/// error of the observer that stopped the delivery pass. With
/// [`FailurePolicy::Continue`][crate::FailurePolicy::Continue], it is the first
/// error encountered during a pass that still reached every observer.
#[derive(Debug, thiserror::Error)]
#[error("observer at position {position} failed to handle a notification ({failures} failed in total)")]
pub struct DeliveryError<E> {
    /// Index of the failing observer within the delivery pass, which is its
    /// position in the registry at the time `notify` was called.
    pub position: usize,

    /// How many observers failed during the pass.
    ///
    /// Always `1` when the pass was aborted.
    pub failures: usize,

    /// The error returned by the observer.
    #[source]
    pub source: E,
}

impl<E> DeliveryError<E> {
    /// Discard the delivery metadata and return the observer's error.
    pub fn into_source(self) -> E {
        self.source
    }
}
