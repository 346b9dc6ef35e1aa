use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::task::{waker, ArcWake};
use tracing::{trace, warn};
use super::executor::{Executor, Task};

/// Cooperative executor for a single lane.
///
/// Work advances in ticks: a tick polls every task that was woken before it
/// started, once. A task that wakes itself (see [`yield_now`]) runs again on
/// the next tick. Wakers are `Send`, so other threads may wake lane tasks.
///
/// [`yield_now`]: super::yield_now
pub struct Scheduler {
    inner: Rc<Inner>,
}

#[derive(Clone)]
pub struct Spawner {
    inner: Weak<Inner>,
}

struct Inner {
    counter:  Cell<u64>,
    tasks:    RefCell<HashMap<u64, Entry>>,
    sender:   Sender<u64>,
    receiver: Receiver<u64>,
}

struct Entry {
    task:  Task,
    waker: Waker,
}

struct Wake {
    id:     u64,
    sender: Sender<u64>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            inner: Rc::new(Inner {
                counter:  Cell::new(0),
                tasks:    RefCell::new(HashMap::new()),
                sender:   sender,
                receiver: receiver,
            }),
        }
    }

    pub fn spawner(&self) -> Spawner {
        Spawner { inner: Rc::downgrade(&self.inner) }
    }

    /// Number of tasks that have not finished.
    pub fn len(&self) -> usize {
        self.inner.tasks.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.len() == 0
    }

    /// Polls the tasks woken so far; returns how many were polled.
    pub fn tick(&self) -> usize {
        let mut seen = HashSet::new();
        let ready = self.inner.receiver.try_iter().filter(|id| seen.insert(*id)).collect::<Vec<_>>();
        ready.into_iter().filter(|id| self.inner.poll(*id)).count()
    }

    pub fn run_until_stalled(&self) -> usize {
        let mut polled = 0;
        while !self.inner.receiver.is_empty() {
            polled += self.tick();
        }
        polled
    }

    /// Runs until every task has finished, sleeping while all of them wait
    /// on something outside the lane.
    pub fn run(&self) {
        loop {
            self.run_until_stalled();
            if self.is_idle() {
                return;
            }
            match self.inner.receiver.recv() {
                Ok(id) => {
                    self.inner.poll(id);
                }
                Err(_) => return,
            }
        }
    }

    pub(crate) fn woken(&self) -> &Receiver<u64> {
        &self.inner.receiver
    }
}

impl Inner {
    fn spawn(&self, task: Task) {
        let id = self.counter.get();
        self.counter.set(id + 1);

        let waker = waker(Arc::new(Wake {
            id:     id,
            sender: self.sender.clone(),
        }));

        self.tasks.borrow_mut().insert(id, Entry { task, waker });
        let _ = self.sender.send(id);
    }

    fn poll(&self, id: u64) -> bool {
        let mut entry = match self.tasks.borrow_mut().remove(&id) {
            Some(entry) => entry,
            None        => return false,
        };

        let mut cx = Context::from_waker(&entry.waker);
        match entry.task.as_mut().poll(&mut cx) {
            Poll::Ready(()) => trace!(id, "task finished"),
            Poll::Pending   => {
                self.tasks.borrow_mut().insert(id, entry);
            }
        }

        true
    }
}

impl Executor for Spawner {
    fn spawn(&self, task: Task) {
        match self.inner.upgrade() {
            Some(inner) => inner.spawn(task),
            None        => warn!("scheduler dropped, task discarded"),
        }
    }
}

impl ArcWake for Wake {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        let _ = arc_self.sender.send(arc_self.id);
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
