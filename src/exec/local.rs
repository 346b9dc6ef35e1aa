use super::executor::{Executor, Task};

/// Spawns stages with `tokio::task::spawn_local`.
///
/// Must be used from inside a `tokio::task::LocalSet`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Local;

impl Executor for Local {
    fn spawn(&self, task: Task) {
        tokio::task::spawn_local(task);
    }
}
