pub use cell::State;
pub use deferred::Deferred;
pub use handle::Promise;
pub use launch::{defer, defer_future, defer_task, Launch};
pub use wait::Wait;
pub use when::when;

mod cell;
mod deferred;
mod handle;
mod launch;
mod wait;
mod when;
