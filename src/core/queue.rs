//! # Single-slot restart queue.
//!
//! A capacity-1 channel used as a coalescing "run now" token. At most one request
//! is pending at any time; requests made while one is pending are dropped.

use tokio::sync::mpsc;

pub(crate) struct RestartQueue {
    tx: mpsc::Sender<()>,
    rx: mpsc::Receiver<()>,
}

impl RestartQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self { tx, rx }
    }

    /// Requests a run. Returns false if a request was already pending.
    pub(crate) fn request(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.tx.capacity() == 0
    }

    /// Waits for the pending request and consumes it.
    pub(crate) async fn next(&mut self) {
        // The queue owns a sender, so the channel never closes.
        let _ = self.rx.recv().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn duplicate_requests_coalesce() {
        let mut queue = RestartQueue::new();
        assert!(!queue.is_pending());

        assert!(queue.request());
        for _ in 0..5 {
            assert!(!queue.request());
        }
        assert!(queue.is_pending());

        queue.next().await;
        assert!(!queue.is_pending());

        let second = tokio::time::timeout(Duration::from_millis(20), queue.next()).await;
        assert!(second.is_err(), "only one request should have been queued");
    }

    #[tokio::test]
    async fn request_after_consume_is_accepted() {
        let mut queue = RestartQueue::new();
        assert!(queue.request());
        queue.next().await;
        assert!(queue.request());
        assert!(queue.is_pending());
    }
}
