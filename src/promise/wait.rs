use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};
use crate::Error;
use super::cell::State;
use super::handle::Promise;

/// Future over a promise on the same lane, from [`Promise::wait`].
pub struct Wait<T> {
    promise: Promise<T>,
    waker:   Option<Rc<RefCell<Option<Waker>>>>,
}

impl<T: 'static> Wait<T> {
    pub(crate) fn new(promise: Promise<T>) -> Self {
        Self { promise, waker: None }
    }
}

impl<T: Clone + Default + 'static> Future for Wait<T> {
    type Output = Result<T, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.promise.state() {
            State::Resolved => return Poll::Ready(Ok(self.promise.result_or_default())),
            State::Rejected => return Poll::Ready(Err(Error::Rejected(self.promise.error()))),
            State::Pending  => (),
        }

        match &self.waker {
            Some(slot) => *slot.borrow_mut() = Some(cx.waker().clone()),
            None       => {
                let slot = Rc::new(RefCell::new(Some(cx.waker().clone())));
                let wake = slot.clone();
                self.promise.on_always(move |_| {
                    if let Some(waker) = wake.borrow_mut().take() {
                        waker.wake();
                    }
                });
                self.waker = Some(slot);
            }
        }

        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use crate::Error;
    use crate::exec::Scheduler;
    use crate::promise::{defer_task, Deferred};

    #[test]
    fn wait_for_resolution() {
        let scheduler = Scheduler::new();
        let spawner   = scheduler.spawner();
        let upstream  = Deferred::<u32>::new();

        let input  = upstream.promise();
        let stage  = defer_task::<u32, _, _, _>(&spawner, move |d| async move {
            let value = input.wait().await?;
            d.resolve(value * 2)?;
            anyhow::Ok(())
        });

        scheduler.run_until_stalled();
        assert!(stage.is_pending());
        assert_eq!(scheduler.len(), 1);

        upstream.resolve(21).unwrap();
        scheduler.run();

        assert_eq!(stage.result(), Some(42));
    }

    #[test]
    fn wait_for_rejection() {
        let scheduler = Scheduler::new();
        let upstream  = Deferred::<u32>::new();
        let outcome   = Rc::new(Cell::new(None));

        let input = upstream.promise();
        let seen  = outcome.clone();
        defer_task::<(), _, _, _>(&scheduler.spawner(), move |d| async move {
            let result = input.wait().await;
            seen.set(Some(result == Err(Error::Rejected("gone".into()))));
            d.resolve(())?;
            anyhow::Ok(())
        });

        scheduler.run_until_stalled();
        upstream.reject("gone").unwrap();
        scheduler.run();

        assert_eq!(outcome.get(), Some(true));
    }
}
