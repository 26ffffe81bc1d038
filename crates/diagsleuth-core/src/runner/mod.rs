/// Background task runner — executes one unit of blocking work per worker
/// thread and streams progress plus a single terminal outcome back to the
/// submitting context over a bounded crossbeam channel.
///
/// The consumer owns a plain receive loop: it drains [`TaskEvent`]s at its
/// own cadence (a UI once per frame, a CLI as fast as they arrive) and never
/// shares mutable state with the worker. All request data is moved into the
/// task closure at submission; nothing is retained by the runner once the
/// `Done` event has been sent.
///
/// Every submission is a single execution attempt: no queue, no retry.
/// Multiple submissions run concurrently, each on its own thread with its
/// own channel.
use crate::error::TaskError;

use crossbeam_channel::{Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error};

/// Maximum number of events that may queue up in a task's channel.
///
/// The consumer is expected to drain continuously; if it falls behind by
/// this many events the worker blocks on `send` rather than consuming
/// unbounded heap. A port scan of the full 65 535-port range emits at most
/// one partial per open port, so in practice the bound is never reached by
/// a live consumer.
pub const EVENT_CHANNEL_CAPACITY: usize = 1_024;

/// One message from a running task. Delivered strictly in the order the
/// worker produced it; `Done` is always the final event.
#[derive(Debug)]
pub enum TaskEvent<P, R> {
    /// Human-readable status line ("Scanning /home/x …").
    Status(String),
    /// One incremental result item (an open port, a duplicate group).
    Partial(P),
    /// The single terminal outcome. No further events follow.
    Done(TaskOutcome<R>),
}

/// Terminal state of a task. Exactly one per submission.
#[derive(Debug)]
pub enum TaskOutcome<R> {
    Succeeded(R),
    Failed(TaskError),
    /// The cancel flag was observed before the work completed.
    Cancelled,
}

/// Handed to the task body: the only way a task talks to the outside world.
///
/// Cloneable senders make the context shareable across a rayon pool inside
/// the task, so parallel sub-work can emit partials directly.
pub struct TaskContext<P, R> {
    events: Sender<TaskEvent<P, R>>,
    cancel: Arc<AtomicBool>,
}

impl<P, R> TaskContext<P, R> {
    /// Emit a status line. Errors are ignored: a consumer that dropped its
    /// receiver has abandoned the task and the worker just runs to the end.
    pub fn status(&self, text: impl Into<String>) {
        let _ = self.events.send(TaskEvent::Status(text.into()));
    }

    /// Emit one incremental result item.
    pub fn partial(&self, item: P) {
        let _ = self.events.send(TaskEvent::Partial(item));
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Loop-boundary cancellation check: `ctx.check_cancelled()?` bails out
    /// of the task with `TaskError::Cancelled`, which the runner maps to
    /// `TaskOutcome::Cancelled`.
    pub fn check_cancelled(&self) -> Result<(), TaskError> {
        if self.is_cancelled() {
            Err(TaskError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Handle to a running or completed task. Dropping the handle does not stop
/// the worker; call [`TaskHandle::cancel`] for that.
pub struct TaskHandle<P, R> {
    /// Receiver for the task's event stream.
    pub events: Receiver<TaskEvent<P, R>>,
    cancel: Arc<AtomicBool>,
    _worker: Option<thread::JoinHandle<()>>,
}

impl<P, R> TaskHandle<P, R> {
    /// Request the task to stop at its next cancellation checkpoint.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Block until the terminal outcome arrives, discarding progress events.
    ///
    /// Convenience for callers that do not render progress (tests, scripted
    /// use). Interactive consumers drain `events` themselves instead.
    pub fn wait(self) -> TaskOutcome<R> {
        for event in self.events.iter() {
            if let TaskEvent::Done(outcome) = event {
                return outcome;
            }
        }
        // The worker always sends Done before exiting; reaching this point
        // means the channel disconnected first, which only a panic inside
        // the runner shim itself could cause.
        TaskOutcome::Failed(TaskError::Panicked(
            "event channel closed without a terminal outcome".into(),
        ))
    }
}

/// Submit a unit of work for background execution.
///
/// Spawns a dedicated named worker thread and returns immediately. The task
/// body receives a [`TaskContext`] for progress emission and cancellation
/// checks; its return value becomes the terminal outcome. A panic inside the
/// body is caught and delivered as `Failed`, never propagated.
pub fn submit<P, R, F>(name: &str, task: F) -> TaskHandle<P, R>
where
    P: Send + 'static,
    R: Send + 'static,
    F: FnOnce(&TaskContext<P, R>) -> Result<R, TaskError> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::bounded::<TaskEvent<P, R>>(EVENT_CHANNEL_CAPACITY);
    let cancel = Arc::new(AtomicBool::new(false));

    let ctx = TaskContext {
        events: tx.clone(),
        cancel: Arc::clone(&cancel),
    };

    let worker = thread::Builder::new()
        .name(format!("diagsleuth-{name}"))
        .spawn(move || {
            debug!("task worker started");
            let result = panic::catch_unwind(AssertUnwindSafe(|| task(&ctx)));
            let outcome = match result {
                Ok(Ok(value)) => TaskOutcome::Succeeded(value),
                Ok(Err(TaskError::Cancelled)) => TaskOutcome::Cancelled,
                Ok(Err(err)) => TaskOutcome::Failed(err),
                Err(payload) => {
                    error!("task worker panicked");
                    TaskOutcome::Failed(TaskError::Panicked(panic_message(payload)))
                }
            };
            let _ = tx.send(TaskEvent::Done(outcome));
        })
        .expect("failed to spawn task worker thread");

    TaskHandle {
        events: rx,
        cancel,
        _worker: Some(worker),
    }
}

/// Best-effort extraction of a panic payload into display text.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
