use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;
use anyhow::Result;
use tracing::trace;
use crate::Error;
use crate::promise::Deferred;
use super::machine::Handle;

pub(crate) struct Remotes {
    counter: u64,
    pending: HashMap<u64, Rc<dyn Settle>>,
}

pub(crate) enum Message {
    Progress(u64, f32),
    Success(u64, Box<dyn Any + Send>),
    Failure(u64, String),
}

/// Settles a lane cell from any thread.
///
/// Every call is posted to the lane that owns the cell and applied there, in
/// order. Dropping a resolver without settling rejects its cell, and so does
/// a payload that is not the cell's type.
pub struct Resolver<T> {
    id:      u64,
    tx:      Handle,
    settled: bool,
    marker:  PhantomData<fn(T)>,
}

pub(crate) trait Settle {
    fn progress(&self, value: f32);
    fn success(&self, value: Box<dyn Any + Send>) -> Result<(), Error>;
    fn failure(&self, error: String) -> Result<(), Error>;
}

impl Remotes {
    pub fn new() -> Self {
        Self {
            counter: 0,
            pending: HashMap::new(),
        }
    }

    pub fn insert<T: Send + 'static>(&mut self, deferred: Deferred<T>) -> u64 {
        let id = self.counter;
        self.counter += 1;
        self.pending.insert(id, Rc::new(deferred));
        id
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Applies a message; no borrow of the table is held while the cell fires.
    pub fn settle(remotes: &RefCell<Self>, message: Message) -> Result<(), Error> {
        let id = match &message {
            Message::Progress(id, _) => *id,
            Message::Success(id, _)  => *id,
            Message::Failure(id, _)  => *id,
        };

        let entry = match &message {
            Message::Progress(..) => remotes.borrow().pending.get(&id).cloned(),
            _                     => remotes.borrow_mut().pending.remove(&id),
        };

        let entry = match entry {
            Some(entry) => entry,
            None        => {
                trace!(id, "message for settled remote ignored");
                return Ok(());
            }
        };

        match message {
            Message::Progress(_, value) => entry.progress(value),
            Message::Success(_, value)  => entry.success(value)?,
            Message::Failure(_, error)  => entry.failure(error)?,
        }

        Ok(())
    }
}

impl<T: Send + 'static> Resolver<T> {
    pub(crate) fn new(id: u64, tx: Handle) -> Self {
        Self {
            id:      id,
            tx:      tx,
            settled: false,
            marker:  PhantomData,
        }
    }

    pub fn resolve(mut self, value: T) -> Result<()> {
        self.settled = true;
        self.tx.done(Message::Success(self.id, Box::new(value)))
    }

    pub fn reject(mut self, error: impl Into<String>) -> Result<()> {
        self.settled = true;
        self.tx.done(Message::Failure(self.id, error.into()))
    }

    pub fn notify(&self, value: f32) -> Result<()> {
        self.tx.done(Message::Progress(self.id, value))
    }
}

impl<T> Drop for Resolver<T> {
    fn drop(&mut self) {
        if !self.settled {
            let _ = self.tx.done(Message::Failure(self.id, Error::Dropped.to_string()));
        }
    }
}

impl<T: Send + 'static> Settle for Deferred<T> {
    fn progress(&self, value: f32) {
        self.notify(value);
    }

    fn success(&self, value: Box<dyn Any + Send>) -> Result<(), Error> {
        match value.downcast::<T>() {
            Ok(value) => self.resolve(*value),
            Err(_)    => {
                let error = Error::TypeMismatch { expected: type_name::<T>() };
                self.reject(error.to_string())?;
                Err(error)
            }
        }
    }

    fn failure(&self, error: String) -> Result<(), Error> {
        self.reject(error)
    }
}
