use std::sync::mpsc;
use std::time::Duration;

/// Interval a host loop is expected to poll pending results at.
pub const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(24);

#[derive(Debug, PartialEq, Eq)]
pub enum WorkerPoll<T> {
    Pending,
    Ready(T),
    /// The worker exited without sending a result.
    Disconnected,
}

/// Receiving end of a job started with [`spawn_worker`].
#[derive(Debug)]
pub struct PendingResult<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> PendingResult<T> {
    pub fn try_take(&self) -> WorkerPoll<T> {
        match self.rx.try_recv() {
            Ok(result) => WorkerPoll::Ready(result),
            Err(mpsc::TryRecvError::Empty) => WorkerPoll::Pending,
            Err(mpsc::TryRecvError::Disconnected) => WorkerPoll::Disconnected,
        }
    }

    /// Blocks until the worker replies.
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }

    pub fn wait_timeout(&self, timeout: Duration) -> WorkerPoll<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => WorkerPoll::Ready(result),
            Err(mpsc::RecvTimeoutError::Timeout) => WorkerPoll::Pending,
            Err(mpsc::RecvTimeoutError::Disconnected) => WorkerPoll::Disconnected,
        }
    }
}

/// Runs `work` on a background thread. The editor never shares scene state
/// with the worker; results are applied on the owning thread after polling.
pub fn spawn_worker<T, W>(work: W) -> PendingResult<T>
where
    T: Send + 'static,
    W: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<T>();
    std::thread::spawn(move || {
        let result = work();
        if tx.send(result).is_err() {
            tracing::debug!("worker result dropped; receiver gone");
        }
    });
    PendingResult { rx }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_result_is_delivered() {
        let pending = spawn_worker(|| 21 * 2);
        assert_eq!(pending.wait(), Some(42));
    }

    #[test]
    fn panicking_worker_reports_disconnect() {
        let pending = spawn_worker(|| -> u8 { panic!("worker failure") });
        assert_eq!(
            pending.wait_timeout(Duration::from_secs(5)),
            WorkerPoll::Disconnected
        );
    }

    #[test]
    fn try_take_is_pending_until_sent() {
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let pending = spawn_worker(move || {
            let _ = gate_rx.recv();
            "done"
        });
        assert_eq!(pending.try_take(), WorkerPoll::Pending);
        gate_tx.send(()).expect("worker waiting on gate");
        assert_eq!(
            pending.wait_timeout(Duration::from_secs(5)),
            WorkerPoll::Ready("done")
        );
    }
}
