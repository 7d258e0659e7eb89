/// Something that wants to hear about state changes of a subject.
///
/// Observers are registered with a dispatcher ([`local::Dispatcher`] or
/// [`shared::Dispatcher`]) and get their [`update`][Self::update] method
/// called with the payload of every notification that happens while they are
/// attached.
///
/// Any closure of the form `Fn(&P) -> Result<(), E>` is an observer.
///
/// An observer must not assume that it is the only one receiving a payload,
/// nor depend on any delivery order other than registration order.
///
/// [`local::Dispatcher`]: crate::local::Dispatcher
/// [`shared::Dispatcher`]: crate::shared::Dispatcher
pub trait Observer<P: ?Sized> {
    /// The error an observer can fail with.
    ///
    /// Use [`Infallible`][std::convert::Infallible] for observers that can't
    /// fail.
    type Error;

    /// Receive a notification.
    fn update(&self, payload: &P) -> Result<(), Self::Error>;
}

impl<P, E, F> Observer<P> for F
where
    P: ?Sized,
    F: Fn(&P) -> Result<(), E>,
{
    type Error = E;

    fn update(&self, payload: &P) -> Result<(), E> {
        self(payload)
    }
}
