//! Task Manager: a trivial bag of background task handles so that scope
//! exit can await all of them. No prioritization or cancellation trees —
//! cancellation is broadcast by the stop signal and by the owning
//! connection's teardown.

use std::sync::Mutex as StdMutex;

use tokio::task::JoinHandle;

use crate::error::Result;

#[derive(Default)]
pub struct TaskManager {
    handles: StdMutex<Vec<JoinHandle<Result<()>>>>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a handle so `join_all` awaits it at teardown. Takes `&self`
    /// so the manager can be shared (via `Arc`) across the tasks that
    /// spawn work onto it.
    pub fn add(&self, handle: JoinHandle<Result<()>>) {
        self.handles.lock().expect("task manager mutex poisoned").push(handle);
    }

    /// Awaits every tracked task, surfacing the first error encountered
    /// (a join failure or a task's own `Err`). All handles are always
    /// awaited, even if an earlier one failed.
    pub async fn join_all(&self) -> Result<()> {
        let handles = std::mem::take(&mut *self.handles.lock().expect("task manager mutex poisoned"));
        let mut first_error = None;
        for handle in handles {
            let outcome = match handle.await {
                Ok(inner) => inner,
                Err(join_err) => Err(join_err.into()),
            };
            if let Err(err) = outcome {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
