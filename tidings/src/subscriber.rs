use std::{
    convert::Infallible,
    fmt,
    marker::PhantomData,
    pin::Pin,
    sync::Weak,
    task::{Context, Poll},
};

use futures_core::Stream;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::{registry::Address, shared::WeakDispatcher, Observer};

/// A stream of the payloads delivered by a
/// [`shared::Dispatcher`](crate::shared::Dispatcher).
///
/// Created by [`Dispatcher::subscribe`][crate::shared::Dispatcher::subscribe].
/// Payloads are buffered without bound until they are polled, so none are
/// skipped. The stream ends once every handle to the dispatcher has been
/// dropped and the buffered payloads have been consumed.
///
/// Dropping the subscriber detaches it from the dispatcher.
pub struct Subscriber<P, E = Infallible> {
    receiver: UnboundedReceiver<P>,
    forwarder: Weak<Forwarder<P, E>>,
    dispatcher: WeakDispatcher<P, E>,
}

impl<P, E> Subscriber<P, E> {
    pub(crate) fn new(
        receiver: UnboundedReceiver<P>,
        forwarder: Weak<Forwarder<P, E>>,
        dispatcher: WeakDispatcher<P, E>,
    ) -> Self {
        Self { receiver, forwarder, dispatcher }
    }

    /// Wait for the next payload.
    ///
    /// This method is a convenience so you don't have to import a `Stream`
    /// extension trait such as `futures::StreamExt` or
    /// `tokio_stream::StreamExt`.
    #[allow(clippy::should_implement_trait)]
    pub async fn next(&mut self) -> Option<P> {
        self.receiver.recv().await
    }

    /// Get the next payload if one has already been delivered, without
    /// waiting.
    pub fn try_next(&mut self) -> Option<P> {
        self.receiver.try_recv().ok()
    }
}

impl<P, E> Stream for Subscriber<P, E> {
    type Item = P;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl<P, E> Drop for Subscriber<P, E> {
    fn drop(&mut self) {
        self.dispatcher.detach_address(self.forwarder.address());
    }
}

impl<P, E> fmt::Debug for Subscriber<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("attached", &(self.forwarder.strong_count() > 0))
            .finish_non_exhaustive()
    }
}

/// The observer behind a [`Subscriber`]: sends each payload down a channel.
pub(crate) struct Forwarder<P, E> {
    sender: UnboundedSender<P>,
    _error: PhantomData<fn() -> E>,
}

impl<P, E> Forwarder<P, E> {
    pub(crate) fn new(sender: UnboundedSender<P>) -> Self {
        Self { sender, _error: PhantomData }
    }
}

impl<P: Clone, E> Observer<P> for Forwarder<P, E> {
    type Error = E;

    fn update(&self, payload: &P) -> Result<(), E> {
        // The receiver is only gone while the subscriber is being dropped,
        // which detaches this forwarder right after.
        let _ = self.sender.send(payload.clone());
        Ok(())
    }
}
