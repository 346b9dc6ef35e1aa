use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, warn};
use super::launch::defer;
use super::handle::Promise;

/// Combines promises into one that settles after every input has settled.
///
/// The aggregate resolves with the inputs themselves when none of them
/// failed, and rejects with an empty message otherwise; which input failed
/// is not reported. It never settles early. An empty input resolves at once.
pub fn when<T, I>(promises: I) -> Promise<Vec<Promise<T>>>
where
    T: 'static,
    I: IntoIterator<Item = Promise<T>>,
{
    let promises = promises.into_iter().collect::<Vec<_>>();

    defer(move |deferred| {
        if promises.is_empty() {
            deferred.resolve(promises)?;
            return Ok(());
        }

        let left = Rc::new(Cell::new(promises.len()));
        let fail = Rc::new(Cell::new(false));
        let all  = Rc::new(RefCell::new(Some(promises.clone())));

        for promise in &promises {
            let flag     = fail.clone();
            let fail     = fail.clone();
            let left     = left.clone();
            let all      = all.clone();
            let deferred = deferred.clone();

            promise.on_fail(move |_| {
                flag.set(true);
            }).on_always(move |_| {
                left.set(left.get() - 1);
                if left.get() > 0 {
                    return;
                }

                let inputs = all.borrow_mut().take();
                let result = match (fail.get(), inputs) {
                    (false, Some(inputs)) => deferred.resolve(inputs),
                    _                     => {
                        debug!("fan-in rejected, an input failed");
                        deferred.reject("")
                    }
                };

                if let Err(e) = result {
                    warn!("fan-in settled twice: {e}");
                }
            });
        }

        Ok(())
    })
}
