// async_glob.rs
//! Deferred resolution on tokio's blocking pool.
use crate::{
    entry::Entry, error::GlobError, options::Options, reader::Execution, sync::SyncExecution,
    tasks::Task,
};
use futures::{future::BoxFuture, FutureExt};
use tokio::task;

/// Runs each task on the blocking pool and resolves once it is fully read
///
/// The walk itself is [`SyncExecution`]; this only moves it off the async
/// executor so callers can await several tasks at once.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeferredExecution;

impl Execution for DeferredExecution {
    type Output = BoxFuture<'static, Result<Vec<Entry>, GlobError>>;

    /// Schedules one task
    ///
    /// The task and options are cloned into the future, which owns them and
    /// can outlive the caller's borrows.
    ///
    /// # Returns
    ///
    /// A future resolving to every entry of the task
    ///
    /// # Errors
    ///
    /// Resolves to the error [`SyncExecution`] reports, or `GlobError::Join`
    /// when the blocking job panics or is cancelled.
    fn run(&self, task: &Task, options: &Options) -> Self::Output {
        let task = task.clone();
        let options = options.clone();

        async move {
            task::spawn_blocking(move || SyncExecution.run(&task, &options))
                .await
                .map_err(|e| GlobError::Join(e.to_string()))?
        }
        .boxed()
    }
}
