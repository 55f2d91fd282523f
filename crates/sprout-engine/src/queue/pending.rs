use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::error::SubmitError;

/// Creates a connected reply/pending pair.
pub fn promise<T>() -> (Reply<T>, Pending<T>) {
    let (tx, rx) = crossbeam_channel::bounded(1);
    (Reply { tx }, Pending { rx })
}

/// Write side of a job result. Consumed by the render thread.
///
/// Dropping it unsent (the job failed, or was never executed) disconnects
/// the matching [`Pending`].
#[derive(Debug)]
pub struct Reply<T> {
    tx: Sender<T>,
}

impl<T> Reply<T> {
    pub fn send(self, value: T) {
        if self.tx.send(value).is_err() {
            log::trace!("job result dropped: producer stopped waiting");
        }
    }
}

/// Read side of a job result, held by the producer.
#[derive(Debug)]
#[must_use = "a pending result does nothing unless waited on"]
pub struct Pending<T> {
    rx: Receiver<T>,
}

impl<T> Pending<T> {
    /// Blocks until the render thread has executed the job.
    pub fn wait(self) -> Result<T, SubmitError> {
        self.rx.recv().map_err(|_| SubmitError::Disconnected)
    }

    /// Returns the result if it is already available.
    pub fn try_get(&self) -> Option<Result<T, SubmitError>> {
        match self.rx.try_recv() {
            Ok(value) => Some(Ok(value)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SubmitError::Disconnected)),
        }
    }
}
