use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use super::handle::Promise;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Pending,
    Resolved,
    Rejected,
}

pub(crate) type Shared<T> = Rc<RefCell<Inner<T>>>;

pub(crate) type Callback<T> = Box<dyn FnOnce(&Promise<T>)>;
pub(crate) type Listener<T> = Box<dyn FnMut(&Promise<T>)>;
pub(crate) type Continuation = Box<dyn FnOnce()>;

pub(crate) struct Inner<T> {
    pub state:    State,
    pub result:   Option<T>,
    pub error:    Option<String>,
    pub progress: f32,
    pub done:     Vec<Callback<T>>,
    pub fail:     Vec<Callback<T>>,
    pub always:   Vec<Callback<T>>,
    pub listen:   Vec<Listener<T>>,
    pub queued:   VecDeque<f32>,
    pub notify:   bool,
    pub next:     Option<Continuation>,
}

/// Everything a settlement has to fire, taken out of the cell so that no
/// borrow is held while user code runs.
pub(crate) struct Fired<T> {
    pub first:  Vec<Callback<T>>,
    pub always: Vec<Callback<T>>,
    pub next:   Option<Continuation>,
}

impl<T> Inner<T> {
    pub fn new() -> Shared<T> {
        Rc::new(RefCell::new(Self {
            state:    State::Pending,
            result:   None,
            error:    None,
            progress: 0.0,
            done:     Vec::new(),
            fail:     Vec::new(),
            always:   Vec::new(),
            listen:   Vec::new(),
            queued:   VecDeque::new(),
            notify:   false,
            next:     None,
        }))
    }

    pub fn resolve(&mut self, value: Option<T>) -> Fired<T> {
        self.state  = State::Resolved;
        self.result = value;

        self.fail.clear();
        self.listen.clear();
        self.queued.clear();

        Fired {
            first:  std::mem::take(&mut self.done),
            always: std::mem::take(&mut self.always),
            next:   self.next.take(),
        }
    }

    pub fn reject(&mut self, error: String) -> Fired<T> {
        self.state = State::Rejected;
        self.error = Some(error);

        self.done.clear();
        self.listen.clear();
        self.queued.clear();

        Fired {
            first:  std::mem::take(&mut self.fail),
            always: std::mem::take(&mut self.always),
            next:   self.next.take(),
        }
    }
}

impl<T> Fired<T> {
    /// Runs the settlement callbacks in order and hands back the continuation.
    pub fn fire(self, promise: &Promise<T>) -> Option<Continuation> {
        for callback in self.first {
            callback(promise);
        }
        for callback in self.always {
            callback(promise);
        }
        self.next
    }
}

pub(crate) fn clamp(value: f32) -> f32 {
    match value.is_nan() {
        true  => 0.0,
        false => value.clamp(0.0, 1.0),
    }
}

impl State {
    pub fn is_settled(self) -> bool {
        self != State::Pending
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Pending  => f.write_str("pending"),
            State::Resolved => f.write_str("resolved"),
            State::Rejected => f.write_str("rejected"),
        }
    }
}
