use futures::Stream;
use serde_json::Value;
use tokio::sync::mpsc;

/// Value observed at a subscribed path; `None` when nothing is stored there.
pub type Snapshot = Option<Value>;

type Cancel = Box<dyn FnOnce() + Send + Sync>;

/// Live registration on a store path.
///
/// The current value is delivered first, then one snapshot per relevant write.
/// Dropping the subscription (or calling [`Subscription::unsubscribe`]) removes the
/// registration from the backend.
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Snapshot>,
    cancel: Option<Cancel>,
}

impl Subscription {
    /// Wrap a snapshot receiver and the backend-specific cleanup to run on cancel.
    pub fn new(
        receiver: mpsc::UnboundedReceiver<Snapshot>,
        cancel: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            receiver,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Wait for the next snapshot. Returns `None` once the backend ended the feed.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Remove the registration; no snapshot is observed after this returns.
    pub fn unsubscribe(self) {}

    /// Adapt the subscription into a [`Stream`] of snapshots.
    pub fn into_stream(self) -> impl Stream<Item = Snapshot> + Send + 'static {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .next()
                .await
                .map(|snapshot| (snapshot, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.receiver.close();
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
