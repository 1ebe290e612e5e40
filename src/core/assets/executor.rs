//=========================================================================
// Delayed Executor
//=========================================================================
//
// Worker pool that buffers submissions until it is started.
//
//   submit ──(not started)──> pending ──start()──┐
//   submit ──(started)─────────────────────────> channel ──> workers
//   submit ──(shut down)──> abort
//
// Shutdown drops the sender so idle workers exit, then aborts every task
// that has not been picked up. Running tasks finish on their own; they
// are never joined.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error};
use parking_lot::Mutex;

//=== Internal Dependencies ===============================================

use crate::core::errors::AssetError;

//=== Task ================================================================

/// Unit of background work with a cancellation path.
pub(crate) struct Task {
    pub name: String,
    pub run: Box<dyn FnOnce() + Send>,
    pub abort: Box<dyn FnOnce(AssetError) + Send>,
}

impl Task {
    fn cancel(self) {
        let error = AssetError::Cancelled { name: self.name };
        (self.abort)(error);
    }
}

//=== DelayedExecutor =====================================================

struct ExecutorState {
    pending: Vec<Task>,
    sender: Option<Sender<Task>>,
    receiver: Receiver<Task>,
    started: bool,
    handles: Vec<JoinHandle<()>>,
}

pub(crate) struct DelayedExecutor {
    workers: usize,
    state: Mutex<ExecutorState>,
    shut_down: Arc<AtomicBool>,
}

impl DelayedExecutor {
    pub fn new(workers: usize) -> Self {
        let (sender, receiver) = unbounded();
        Self {
            workers: workers.max(1),
            state: Mutex::new(ExecutorState {
                pending: Vec::new(),
                sender: Some(sender),
                receiver,
                started: false,
                handles: Vec::new(),
            }),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag shared with running tasks so they can tell a late finish apart.
    pub fn shut_down_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shut_down)
    }

    pub fn is_running(&self) -> bool {
        let state = self.state.lock();
        state.started && !self.shut_down.load(Ordering::SeqCst)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    pub fn submit(&self, task: Task) {
        let mut state = self.state.lock();
        if self.shut_down.load(Ordering::SeqCst) {
            drop(state);
            task.cancel();
            return;
        }
        if !state.started {
            state.pending.push(task);
            return;
        }
        let rejected = match &state.sender {
            Some(sender) => sender.send(task).err().map(|failed| failed.into_inner()),
            None => Some(task),
        };
        drop(state);
        if let Some(task) = rejected {
            task.cancel();
        }
    }

    /// Spawns the workers and releases buffered tasks. Idempotent.
    pub fn start(&self) -> std::io::Result<()> {
        let mut state = self.state.lock();
        if state.started || self.shut_down.load(Ordering::SeqCst) {
            return Ok(());
        }

        for index in 0..self.workers {
            let receiver = state.receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("aetheric-asset-{}", index))
                .spawn(move || {
                    while let Ok(task) = receiver.recv() {
                        (task.run)();
                    }
                })?;
            state.handles.push(handle);
        }
        state.started = true;
        debug!(target: "assets", "executor started with {} workers", self.workers);

        let pending = std::mem::take(&mut state.pending);
        if let Some(sender) = &state.sender {
            for task in pending {
                if let Err(failed) = sender.send(task) {
                    error!(target: "assets", "worker channel closed while flushing");
                    failed.into_inner().cancel();
                }
            }
        }
        Ok(())
    }

    /// Cancels everything not yet picked up. Does not wait for workers.
    pub fn shutdown(&self) {
        let (pending, queued) = {
            let mut state = self.state.lock();
            if self.shut_down.swap(true, Ordering::SeqCst) {
                return;
            }
            state.sender = None;
            let queued: Vec<Task> = state.receiver.try_iter().collect();
            state.handles.clear();
            (std::mem::take(&mut state.pending), queued)
        };

        let cancelled = pending.len() + queued.len();
        for task in pending.into_iter().chain(queued) {
            task.cancel();
        }
        debug!(target: "assets", "executor shut down, {} tasks cancelled", cancelled);
    }
}

impl Drop for DelayedExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    fn counting_task(name: &str, ran: &Arc<AtomicUsize>, aborted: &Arc<AtomicUsize>) -> Task {
        let ran = ran.clone();
        let aborted = aborted.clone();
        Task {
            name: name.to_string(),
            run: Box::new(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            }),
            abort: Box::new(move |error| {
                assert!(matches!(error, AssetError::Cancelled { .. }));
                aborted.fetch_add(1, Ordering::SeqCst);
            }),
        }
    }

    fn wait_for(counter: &AtomicUsize, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while counter.load(Ordering::SeqCst) < expected && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn tasks_wait_until_started() {
        let executor = DelayedExecutor::new(2);
        let ran = Arc::new(AtomicUsize::new(0));
        let aborted = Arc::new(AtomicUsize::new(0));

        executor.submit(counting_task("a", &ran, &aborted));
        executor.submit(counting_task("b", &ran, &aborted));
        thread::sleep(Duration::from_millis(20));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(!executor.is_running());

        executor.start().unwrap();
        assert!(executor.is_running());
        wait_for(&ran, 2);
        assert_eq!(ran.load(Ordering::SeqCst), 2);
        assert_eq!(aborted.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn shutdown_cancels_pending_and_later_submissions() {
        let executor = DelayedExecutor::new(1);
        let ran = Arc::new(AtomicUsize::new(0));
        let aborted = Arc::new(AtomicUsize::new(0));

        executor.submit(counting_task("queued", &ran, &aborted));
        executor.shutdown();
        assert_eq!(aborted.load(Ordering::SeqCst), 1);

        executor.submit(counting_task("late", &ran, &aborted));
        assert_eq!(aborted.load(Ordering::SeqCst), 2);
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(executor.is_shut_down());
    }

    #[test]
    fn start_after_shutdown_is_a_no_op() {
        let executor = DelayedExecutor::new(1);
        executor.shutdown();
        executor.start().unwrap();
        assert!(!executor.is_running());
    }
}
