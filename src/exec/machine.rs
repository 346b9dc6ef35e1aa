use std::cell::RefCell;
use std::thread::{Builder, JoinHandle};
use anyhow::{anyhow, Result};
use crossbeam_channel::{unbounded, Receiver, Select, Sender, TryRecvError};
use tracing::{debug, error, warn};
use crate::Error;
use crate::promise::{Deferred, Promise, State};
use super::channel::{oneshot, Rx};
use super::remote::{Message, Remotes, Resolver};
use super::scheduler::{Scheduler, Spawner};

/// A lane hosted on its own thread.
///
/// Promise cells are not `Send`, so everything that touches them runs on the
/// lane: closures are shipped in through a [`Handle`], and other threads
/// settle lane cells through a [`Resolver`].
pub struct Machine {
    name: String,
}

#[derive(Clone)]
pub struct Handle {
    sender: Sender<Command>,
}

pub struct Guard {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

pub struct Lane {
    scheduler: Scheduler,
    remotes:   RefCell<Remotes>,
    handle:    Handle,
}

struct Thread {
    receiver: Receiver<Command>,
    handle:   Handle,
}

pub(crate) enum Command {
    Exec(Box<dyn FnOnce(&Lane) + Send>),
    Done(Message),
    Tick,
    Stop,
}

impl Machine {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn exec(self) -> Result<(Handle, Guard)> {
        let (sender, receiver) = unbounded();

        let handle = Handle { sender };
        let thread = Thread {
            receiver: receiver,
            handle:   handle.clone(),
        };

        let thread = Builder::new().name(self.name).spawn(move || {
            thread.exec();
            debug!("machine finished");
        })?;

        let guard = Guard {
            handle: handle.clone(),
            thread: Some(thread),
        };

        Ok((handle, guard))
    }
}

impl Handle {
    /// Runs `f` on the lane.
    pub fn exec<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&Lane) + Send + 'static,
    {
        self.send(Command::Exec(Box::new(f)))
    }

    /// Runs `f` on the lane and reports how the promise it returns settles.
    ///
    /// A promise resolved without a payload reports `T::default()`. If the
    /// promise is dropped unsettled the receiver reports [`Error::Abandoned`].
    pub fn call<T, F>(&self, f: F) -> Result<Rx<T>>
    where
        T: Clone + Default + Send + 'static,
        F: FnOnce(&Lane) -> Promise<T> + Send + 'static,
    {
        let (tx, rx) = oneshot();
        self.exec(move |lane| {
            f(lane).on_always(move |promise| {
                tx.send(match promise.state() {
                    State::Rejected => Err(Error::Rejected(promise.error())),
                    _               => Ok(promise.result_or_default()),
                });
            });
        })?;
        Ok(rx)
    }

    pub fn tick(&self) -> Result<()> {
        self.send(Command::Tick)
    }

    pub(crate) fn done(&self, message: Message) -> Result<()> {
        self.send(Command::Done(message))
    }

    fn send(&self, cmd: Command) -> Result<()> {
        match self.sender.send(cmd) {
            Ok(()) => Ok(()),
            Err(_) => Err(Error::Terminated.into()),
        }
    }
}

impl Lane {
    fn new(handle: Handle) -> Self {
        Self {
            scheduler: Scheduler::new(),
            remotes:   RefCell::new(Remotes::new()),
            handle:    handle,
        }
    }

    pub fn spawner(&self) -> Spawner {
        self.scheduler.spawner()
    }

    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// A lane cell whose producer may live on any thread.
    pub fn resolver<T: Send + 'static>(&self) -> (Promise<T>, Resolver<T>) {
        let deferred = Deferred::new();
        let promise  = deferred.promise();
        let id       = self.remotes.borrow_mut().insert(deferred);
        (promise, Resolver::new(id, self.handle.clone()))
    }

    /// Remote cells still waiting on their resolver.
    pub fn pending(&self) -> usize {
        self.remotes.borrow().len()
    }

    /// Unfinished tasks on the lane scheduler.
    pub fn tasks(&self) -> usize {
        self.scheduler.len()
    }

    fn settle(&self, message: Message) {
        if let Err(e) = Remotes::settle(&self.remotes, message) {
            warn!("remote settlement failed: {e}");
        }
    }
}

impl Thread {
    fn exec(self) {
        let Self { receiver, handle } = self;

        let lane = Lane::new(handle);
        debug!("machine started");

        loop {
            let mut select = Select::new();
            select.recv(&receiver);
            select.recv(lane.scheduler.woken());
            select.ready();

            loop {
                match receiver.try_recv() {
                    Ok(Command::Exec(f))            => f(&lane),
                    Ok(Command::Done(message))      => lane.settle(message),
                    Ok(Command::Tick)               => (),
                    Ok(Command::Stop)               => return,
                    Err(TryRecvError::Empty)        => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }

            lane.scheduler.tick();
        }
    }
}

impl Guard {
    /// Stops the lane and waits for its thread to exit. Cells still on the
    /// lane are dropped; fails if the lane thread panicked.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        let thread = match self.thread.take() {
            Some(thread) => thread,
            None         => return Ok(()),
        };

        if self.handle.send(Command::Stop).is_err() {
            debug!("machine already stopped");
        }

        let name = thread.thread().name().unwrap_or("unnamed").to_owned();
        thread.join().map_err(|_| anyhow!("lane {name} panicked"))
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!("{e}");
        }
    }
}
