pub use channel::Rx;
pub use executor::{yield_now, Executor, Task, YieldNow};
pub use machine::{Guard, Handle, Lane, Machine};
pub use remote::Resolver;
pub use scheduler::{Scheduler, Spawner};

#[cfg(feature = "tokio")]
pub use local::Local;

mod channel;
mod executor;
mod machine;
mod remote;
mod scheduler;

#[cfg(feature = "tokio")]
mod local;
