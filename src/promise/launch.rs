use std::future::Future;
use tracing::debug;
use crate::exec::Executor;
use super::deferred::Deferred;
use super::handle::Promise;

type Action<T> = Box<dyn FnOnce(Deferred<T>)>;

/// A stage that has not started yet: a fresh cell plus the action that will
/// drive it. Nothing happens until [`run`](Launch::run).
pub struct Launch<T> {
    deferred: Deferred<T>,
    action:   Action<T>,
}

impl<T: 'static> Launch<T> {
    /// An action that settles its cell synchronously (or hands the
    /// `Deferred` to someone who will). Returning `Err` rejects the cell.
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce(Deferred<T>) -> anyhow::Result<()> + 'static,
    {
        Self::with(Box::new(move |deferred: Deferred<T>| {
            let stage = deferred.clone();
            if let Err(e) = action(deferred) {
                stage.fail_with(e);
            }
        }))
    }

    /// An action whose body runs as a task on `executor`.
    pub fn task<E, F, Fut>(executor: &E, action: F) -> Self
    where
        E:   Executor + Clone + 'static,
        F:   FnOnce(Deferred<T>) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        let executor = executor.clone();
        Self::with(Box::new(move |deferred: Deferred<T>| {
            let stage = deferred.clone();
            let body  = action(deferred);
            executor.spawn(Box::pin(async move {
                if let Err(e) = body.await {
                    stage.fail_with(e);
                }
            }));
        }))
    }

    pub fn promise(&self) -> Promise<T> {
        self.deferred.promise()
    }

    pub fn run(self) -> Promise<T> {
        let Self { deferred, action } = self;
        let promise = deferred.promise();
        action(deferred);
        promise
    }

    fn with(action: Action<T>) -> Self {
        Self {
            deferred: Deferred::new(),
            action:   action,
        }
    }
}

impl Launch<()> {
    /// Wraps a future that knows nothing about promises. Its cell resolves
    /// when the future completes.
    pub fn future<E, Fut>(executor: &E, future: Fut) -> Self
    where
        E:   Executor + Clone + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let executor = executor.clone();
        Self::with(Box::new(move |deferred: Deferred<()>| {
            executor.spawn(Box::pin(async move {
                future.await;
                if let Err(e) = deferred.resolve(()) {
                    debug!("wrapped future finished: {e}");
                }
            }));
        }))
    }
}

/// Runs `action` now with a fresh cell and returns the cell's promise.
pub fn defer<T, F>(action: F) -> Promise<T>
where
    T: 'static,
    F: FnOnce(Deferred<T>) -> anyhow::Result<()> + 'static,
{
    Launch::new(action).run()
}

pub fn defer_task<T, E, F, Fut>(executor: &E, action: F) -> Promise<T>
where
    T:   'static,
    E:   Executor + Clone + 'static,
    F:   FnOnce(Deferred<T>) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<()>> + 'static,
{
    Launch::task(executor, action).run()
}

pub fn defer_future<E, Fut>(executor: &E, future: Fut) -> Promise<()>
where
    E:   Executor + Clone + 'static,
    Fut: Future<Output = ()> + 'static,
{
    Launch::future(executor, future).run()
}
