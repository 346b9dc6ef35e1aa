use std::fmt;
use tracing::{debug, trace, warn};
use crate::Error;
use super::cell::{clamp, Inner, Listener, Shared, State};
use super::handle::Promise;

/// Producer view of a promise cell.
///
/// A cell settles once. Settling it again returns [`Error::Settled`] and fires
/// nothing.
pub struct Deferred<T> {
    inner: Shared<T>,
}

impl<T: 'static> Deferred<T> {
    pub fn new() -> Self {
        Self { inner: Inner::new() }
    }

    pub fn promise(&self) -> Promise<T> {
        Promise::new(self.inner.clone())
    }

    pub fn state(&self) -> State {
        self.inner.borrow().state
    }

    pub fn resolve(&self, value: T) -> Result<(), Error> {
        self.settle(Some(value))
    }

    /// Resolves without a payload; readers see `None` or the default value.
    pub fn complete(&self) -> Result<(), Error> {
        self.settle(None)
    }

    pub fn reject(&self, error: impl Into<String>) -> Result<(), Error> {
        let fired = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_settled() {
                return Err(Error::Settled(inner.state));
            }
            inner.reject(error.into())
        };

        if fired.fire(&self.promise()).is_some() {
            debug!("chain abandoned, promise rejected");
        }

        Ok(())
    }

    /// Reports progress in `[0, 1]`; out of range values are clamped.
    /// Does nothing once the cell has settled.
    ///
    /// Listeners see every call. A `notify` made from inside a listener is
    /// queued and delivered after the current round of listeners returns.
    pub fn notify(&self, value: f32) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_settled() {
                trace!(value, state = %inner.state, "progress after settlement ignored");
                return;
            }
            inner.queued.push_back(clamp(value));
            if inner.notify {
                return;
            }
            inner.notify = true;
        }

        let promise = self.promise();
        while let Some(mut listen) = self.round() {
            for listener in listen.iter_mut() {
                listener(&promise);
            }

            let mut inner = self.inner.borrow_mut();
            if !inner.state.is_settled() {
                listen.append(&mut inner.listen);
                inner.listen = listen;
            }
        }
    }

    /// Applies the next queued progress value and takes the listeners out.
    fn round(&self) -> Option<Vec<Listener<T>>> {
        let mut inner = self.inner.borrow_mut();
        let value = match inner.queued.pop_front() {
            Some(value) if !inner.state.is_settled() => value,
            _                                        => {
                inner.queued.clear();
                inner.notify = false;
                return None;
            }
        };
        inner.progress = value;
        Some(std::mem::take(&mut inner.listen))
    }

    pub(crate) fn fail_with(&self, error: anyhow::Error) {
        let message = format!("{error:#}");
        if let Err(e) = self.reject(message.as_str()) {
            warn!("stage failed after settlement ({e}): {message}");
        }
    }

    fn settle(&self, value: Option<T>) -> Result<(), Error> {
        let fired = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_settled() {
                return Err(Error::Settled(inner.state));
            }
            inner.resolve(value)
        };

        if let Some(next) = fired.fire(&self.promise()) {
            next();
        }

        Ok(())
    }
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T: 'static> Default for Deferred<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.inner.borrow().state)
            .finish()
    }
}
