//! Typed handles for poll feeds.

use tokio::sync::mpsc;

/// A live registration for one poll category.
///
/// Dropping the handle deregisters the feed; the poller notices the closed
/// channel on its next pass and stops fetching for that category.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> Subscription<T> {
    pub(crate) fn channel(capacity: usize) -> (mpsc::Sender<T>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }

    /// Wait for the next event. Returns `None` once this feed has been
    /// replaced by a newer subscription or the poller has gone away.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}
