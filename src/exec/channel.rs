#[cfg(not(feature = "tokio"))]
use crossbeam_channel::{bounded, Receiver, Sender};
#[cfg(feature = "tokio")]
use std::{future::Future, pin::Pin, task::{Context, Poll}};
#[cfg(feature = "tokio")]
use tokio::sync::oneshot::{channel, Receiver, Sender};
use tracing::trace;
use crate::Error;

pub(crate) struct Tx<T> {
    sender: Sender<Result<T, Error>>,
}

/// How a promise returned to [`Handle::call`](super::Handle::call) settled.
///
/// A promise dropped on the lane without settling reports
/// [`Error::Abandoned`].
pub struct Rx<T> {
    receiver: Receiver<Result<T, Error>>,
}

pub(crate) fn oneshot<T>() -> (Tx<T>, Rx<T>) {
    #[cfg(feature = "tokio")]
    let (sender, receiver) = channel();
    #[cfg(not(feature = "tokio"))]
    let (sender, receiver) = bounded(1);
    (Tx { sender }, Rx { receiver })
}

impl<T> Tx<T> {
    pub fn send(self, result: Result<T, Error>) {
        if self.sender.send(result).is_err() {
            trace!("call result discarded, receiver dropped");
        }
    }
}

impl<T> Rx<T> {
    /// Blocks the calling thread until the lane reports. Async callers
    /// should `.await` the receiver instead.
    pub fn recv(self) -> Result<T, Error> {
        #[cfg(feature = "tokio")]
        let result = self.receiver.blocking_recv();
        #[cfg(not(feature = "tokio"))]
        let result = self.receiver.recv();
        result.unwrap_or(Err(Error::Abandoned))
    }
}

#[cfg(feature = "tokio")]
impl<T> Future for Rx<T> {
    type Output = Result<T, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|r| r.unwrap_or(Err(Error::Abandoned)))
    }
}
