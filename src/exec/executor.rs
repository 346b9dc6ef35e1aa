use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use futures::future::LocalBoxFuture;

pub type Task = LocalBoxFuture<'static, ()>;

/// Runs suspendable stages on behalf of a promise chain.
///
/// The stage itself is responsible for settling its cell; an executor only
/// has to start the task and keep polling it whenever it is woken.
pub trait Executor {
    fn spawn(&self, task: Task);
}

/// Suspends the current task for one turn of its executor.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
