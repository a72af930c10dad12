//! Cancellation signal threaded through every traversal.

use tokio::sync::watch;

/// Receiving side of a cancellation signal.
///
/// Cheap to clone. A `Cancellation` created with [`Cancellation::none`] never
/// fires.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    receiver: Option<watch::Receiver<bool>>,
}

/// Sending side; firing it cancels every clone of the paired [`Cancellation`]
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl Cancellation {
    pub fn new() -> (CancelHandle, Cancellation) {
        let (sender, receiver) = watch::channel(false);
        (
            CancelHandle { sender },
            Cancellation {
                receiver: Some(receiver),
            },
        )
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.receiver.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once the signal fires. Pending forever if it never can.
    pub async fn cancelled(&self) {
        let Some(receiver) = &self.receiver else {
            return std::future::pending().await;
        };
        let mut receiver = receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                // Handle dropped without firing
                return std::future::pending().await;
            }
        }
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_fires_all_clones() {
        let (handle, cancel) = Cancellation::new();
        let clone = cancel.clone();
        assert!(!clone.is_cancelled());

        let waiter = tokio::spawn(async move { clone.cancelled().await });
        handle.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_none_never_fires() {
        let cancel = Cancellation::none();
        assert!(!cancel.is_cancelled());

        let outcome = tokio::time::timeout(Duration::from_millis(20), cancel.cancelled()).await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_cancel() {
        let (handle, cancel) = Cancellation::new();
        drop(handle);

        let outcome = tokio::time::timeout(Duration::from_millis(20), cancel.cancelled()).await;
        assert!(outcome.is_err());
        assert!(!cancel.is_cancelled());
    }
}
