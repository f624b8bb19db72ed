use std::future::Future;
use std::pin::Pin;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Runs work submitted from any thread on one specific tokio runtime.
///
/// Binding spawns a dispatcher task on the given handle that awaits jobs
/// one at a time, so jobs run in submission order. The dispatcher exits
/// once every clone of the scheduler has been dropped.
#[derive(Clone)]
pub struct LoopScheduler {
    tx: mpsc::UnboundedSender<Job>,
}

impl LoopScheduler {
    pub fn bind(handle: &Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();

        handle.spawn(async move {
            while let Some(job) = rx.recv().await {
                job.await;
            }
        });

        Self { tx }
    }

    /// Bind to the runtime of the calling task.
    ///
    /// Panics outside a tokio runtime.
    pub fn current() -> Self {
        Self::bind(&Handle::current())
    }

    /// Queue `job` on the bound runtime. Returns `false` if the runtime has
    /// shut down.
    pub fn schedule<F>(&self, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tx.send(Box::pin(job)).is_ok()
    }
}
