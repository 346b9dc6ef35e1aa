use std::fmt;
use std::future::Future;
use std::rc::Rc;
use tracing::debug;
use crate::exec::Executor;
use super::cell::{Shared, State};
use super::deferred::Deferred;
use super::launch::Launch;
use super::wait::Wait;

/// Observer view of a promise cell.
///
/// Cloning a `Promise` clones the view, not the cell: every clone observes the
/// same settlement. Callbacks registered after the cell has settled fire
/// immediately, so late observers never miss the outcome.
pub struct Promise<T> {
    inner: Shared<T>,
}

impl<T: 'static> Promise<T> {
    pub(crate) fn new(inner: Shared<T>) -> Self {
        Self { inner }
    }

    pub fn state(&self) -> State {
        self.inner.borrow().state
    }

    pub fn is_pending(&self) -> bool {
        self.state() == State::Pending
    }

    pub fn is_resolved(&self) -> bool {
        self.state() == State::Resolved
    }

    pub fn is_rejected(&self) -> bool {
        self.state() == State::Rejected
    }

    /// Rejection message, empty unless the cell was rejected with one.
    pub fn error(&self) -> String {
        self.inner.borrow().error.clone().unwrap_or_default()
    }

    pub fn progress(&self) -> f32 {
        self.inner.borrow().progress
    }

    pub fn on_done<F>(&self, callback: F) -> Self
    where
        F: FnOnce(&Promise<T>) + 'static,
    {
        match self.state() {
            State::Resolved => callback(self),
            State::Pending  => self.inner.borrow_mut().done.push(Box::new(callback)),
            State::Rejected => (),
        }
        self.clone()
    }

    pub fn on_fail<F>(&self, callback: F) -> Self
    where
        F: FnOnce(&Promise<T>) + 'static,
    {
        match self.state() {
            State::Rejected => callback(self),
            State::Pending  => self.inner.borrow_mut().fail.push(Box::new(callback)),
            State::Resolved => (),
        }
        self.clone()
    }

    pub fn on_always<F>(&self, callback: F) -> Self
    where
        F: FnOnce(&Promise<T>) + 'static,
    {
        match self.state() {
            State::Pending => self.inner.borrow_mut().always.push(Box::new(callback)),
            _              => callback(self),
        }
        self.clone()
    }

    /// Listens to future `notify` calls. Never fires at registration.
    pub fn on_progress<F>(&self, listener: F) -> Self
    where
        F: FnMut(&Promise<T>) + 'static,
    {
        if self.is_pending() {
            self.inner.borrow_mut().listen.push(Box::new(listener));
        }
        self.clone()
    }

    /// Chains a stage that runs once this promise resolves.
    ///
    /// The stage gets a fresh [`Deferred`] to settle. If this promise rejects
    /// the stage never runs and the returned promise stays pending; rejection
    /// is not forwarded down the chain. A pending promise holds one
    /// continuation, so chaining twice before it settles drops the first stage.
    pub fn next<U, F>(&self, action: F) -> Promise<U>
    where
        U: 'static,
        F: FnOnce(Deferred<U>) -> anyhow::Result<()> + 'static,
    {
        self.chain(Launch::new(action))
    }

    /// Like [`next`](Self::next), with the stage body spawned on `executor`.
    pub fn next_task<U, E, F, Fut>(&self, executor: &E, action: F) -> Promise<U>
    where
        U:   'static,
        E:   Executor + Clone + 'static,
        F:   FnOnce(Deferred<U>) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        self.chain(Launch::task(executor, action))
    }

    /// Chains an opaque future; the returned promise resolves when it completes.
    pub fn next_future<E, Fut>(&self, executor: &E, future: Fut) -> Promise<()>
    where
        E:   Executor + Clone + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.chain(Launch::future(executor, future))
    }

    /// A payload-free promise that settles the way this one does.
    pub fn signal(&self) -> Promise<()> {
        let done    = Deferred::new();
        let fail    = done.clone();
        let promise = done.promise();

        self.on_done(move |_| {
            let _ = done.resolve(());
        }).on_fail(move |p| {
            let _ = fail.reject(p.error());
        });

        promise
    }

    pub fn wait(&self) -> Wait<T> {
        Wait::new(self.clone())
    }

    fn chain<U: 'static>(&self, launch: Launch<U>) -> Promise<U> {
        let promise = launch.promise();
        match self.state() {
            State::Resolved => {
                launch.run();
            }
            State::Pending  => {
                let next = Box::new(move || {
                    launch.run();
                });
                if self.inner.borrow_mut().next.replace(next).is_some() {
                    debug!("pending continuation replaced");
                }
            }
            State::Rejected => debug!("chain abandoned, promise already rejected"),
        }
        promise
    }
}

impl<T: Clone + 'static> Promise<T> {
    /// Resolved payload, if the cell was resolved with one.
    pub fn result(&self) -> Option<T> {
        self.inner.borrow().result.clone()
    }

    pub fn result_or_default(&self) -> T
    where
        T: Default,
    {
        self.result().unwrap_or_default()
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T> PartialEq for Promise<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Promise")
            .field("state", &inner.state)
            .field("progress", &inner.progress)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use crate::promise::{Deferred, State};

    #[derive(Default)]
    struct Counter {
        done:     Cell<u32>,
        fail:     Cell<u32>,
        always:   Cell<u32>,
        progress: Cell<u32>,
    }

    fn bump(cell: &Cell<u32>) {
        cell.set(cell.get() + 1);
    }

    fn observe(deferred: &Deferred<()>, counter: &Rc<Counter>) {
        let (a, b, c, d) = (counter.clone(), counter.clone(), counter.clone(), counter.clone());
        deferred.promise()
            .on_done(move |_| bump(&a.done))
            .on_fail(move |_| bump(&b.fail))
            .on_always(move |_| bump(&c.always))
            .on_progress(move |_| bump(&d.progress));
    }

    #[test]
    fn done_fires_on_resolve() {
        let counter  = Rc::new(Counter::default());
        let deferred = Deferred::new();
        observe(&deferred, &counter);

        deferred.resolve(()).unwrap();

        assert_eq!(counter.done.get(), 1);
        assert_eq!(counter.fail.get(), 0);
        assert_eq!(counter.always.get(), 1);
        assert_eq!(counter.progress.get(), 0);
    }

    #[test]
    fn fail_fires_on_reject() {
        let counter  = Rc::new(Counter::default());
        let deferred = Deferred::new();
        observe(&deferred, &counter);

        deferred.reject("").unwrap();

        assert_eq!(counter.done.get(), 0);
        assert_eq!(counter.fail.get(), 1);
        assert_eq!(counter.always.get(), 1);
        assert_eq!(counter.progress.get(), 0);
    }

    #[test]
    fn progress_fires_without_settling() {
        let counter  = Rc::new(Counter::default());
        let deferred = Deferred::new();
        observe(&deferred, &counter);

        deferred.notify(1.0);

        assert_eq!(counter.done.get(), 0);
        assert_eq!(counter.fail.get(), 0);
        assert_eq!(counter.progress.get(), 1);
        assert_eq!(deferred.promise().state(), State::Pending);
    }

    #[test]
    fn late_progress_waits_for_notify() {
        let counter  = Rc::new(Counter::default());
        let deferred = Deferred::<()>::new();

        deferred.notify(0.6);
        observe(&deferred, &counter);
        assert_eq!(counter.progress.get(), 0);

        deferred.notify(0.7);
        assert_eq!(counter.progress.get(), 1);
        assert_eq!(deferred.promise().progress(), 0.7);
    }

    #[test]
    fn late_done_fires_once() {
        let counter  = Rc::new(Counter::default());
        let deferred = Deferred::new();
        deferred.resolve(()).unwrap();
        observe(&deferred, &counter);

        assert_eq!(counter.done.get(), 1);
        assert_eq!(counter.fail.get(), 0);
        assert_eq!(counter.always.get(), 1);
    }

    #[test]
    fn late_fail_fires_once() {
        let counter  = Rc::new(Counter::default());
        let deferred = Deferred::new();
        deferred.reject("late").unwrap();
        observe(&deferred, &counter);

        assert_eq!(counter.done.get(), 0);
        assert_eq!(counter.fail.get(), 1);
        assert_eq!(counter.always.get(), 1);
    }

    #[test]
    fn callbacks_fire_in_order() {
        let order    = Rc::new(RefCell::new(Vec::new()));
        let deferred = Deferred::<u8>::new();

        let (a, b, c) = (order.clone(), order.clone(), order.clone());
        deferred.promise()
            .on_always(move |_| a.borrow_mut().push("always"))
            .on_done(move |_| b.borrow_mut().push("done 1"))
            .on_done(move |_| c.borrow_mut().push("done 2"));

        deferred.resolve(1).unwrap();

        assert_eq!(*order.borrow(), ["done 1", "done 2", "always"]);
    }

    #[test]
    fn callback_reads_result() {
        let seen     = Rc::new(RefCell::new(None));
        let deferred = Deferred::<String>::new();

        let slot = seen.clone();
        deferred.promise().on_done(move |p| *slot.borrow_mut() = p.result());
        deferred.resolve("x".to_owned()).unwrap();

        assert_eq!(seen.borrow().as_deref(), Some("x"));
    }

    #[test]
    fn callback_reenters_cell() {
        let fired    = Rc::new(Cell::new(0));
        let deferred = Deferred::<u8>::new();

        let outer = fired.clone();
        deferred.promise().on_done(move |p| {
            let inner = outer.clone();
            p.on_done(move |p| inner.set(p.result_or_default()));
        });
        deferred.resolve(9).unwrap();

        assert_eq!(fired.get(), 9);
    }

    #[test]
    fn signal_mirrors_settlement() {
        let resolved = Deferred::<u8>::new();
        let rejected = Deferred::<u8>::new();
        let a = resolved.promise().signal();
        let b = rejected.promise().signal();

        resolved.resolve(3).unwrap();
        rejected.reject("broken").unwrap();

        assert_eq!(a.state(), State::Resolved);
        assert_eq!(b.state(), State::Rejected);
        assert_eq!(b.error(), "broken");
    }

    #[test]
    fn clones_share_the_cell() {
        let deferred = Deferred::<u8>::new();
        let a = deferred.promise();
        let b = a.clone();

        assert_eq!(a, b);
        assert_ne!(a, Deferred::<u8>::new().promise());

        deferred.resolve(4).unwrap();
        assert_eq!(b.result(), Some(4));
    }
}
