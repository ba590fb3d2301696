use std::{
    sync::{
        atomic::{
            AtomicBool,
            Ordering,
        },
        Arc,
    },
    thread::JoinHandle,
};

/// Shared cancellation flag checked cooperatively between documents and
/// between row batches. Cancelling mid-document is safe because the atomic
/// writer only ever commits a complete buffer.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct TaskHandle {
    cancel_token: CancelToken,
    join_handle: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn new(cancel_token: CancelToken, join_handle: JoinHandle<()>) -> Self {
        Self { cancel_token, join_handle: Some(join_handle) }
    }

    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.as_ref().map(|h| h.is_finished()).unwrap_or(true)
    }
}
