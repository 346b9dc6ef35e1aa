//! Single-assignment promise cells.
//!
//! A [`Deferred`] settles a cell once, as resolved or rejected, and the cell's
//! [`Promise`] views fire their callbacks synchronously on that settlement.
//! Stages chain with [`Promise::next`], fan in with [`when`], and run as
//! tasks on any [`Executor`]. Cells belong to one lane; a [`Machine`] hosts
//! a lane on its own thread for producers elsewhere.

pub use error::Error;
pub use exec::{Executor, Machine, Scheduler, Spawner};
pub use promise::{defer, defer_future, defer_task, when};
pub use promise::{Deferred, Launch, Promise, State, Wait};

pub mod ex;
pub mod exec;
pub mod promise;

mod error;
