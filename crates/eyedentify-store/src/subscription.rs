use eyedentify_types::ScanRecord;
use futures_util::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::StoreError;

/// One emission of a live query: the full current result set, or the error that ended it
pub type Snapshot = Result<Vec<ScanRecord>, StoreError>;

/// Receiving half of a live query.
///
/// Yields the initial result set, then a new full set after every change.
/// A store error is yielded once and ends the subscription. Dropping the
/// subscription (or calling [`Subscription::unsubscribe`]) stops the producer.
pub struct Subscription {
    rx: mpsc::Receiver<Snapshot>,
    cancel: CancellationToken,
    finished: bool,
}

/// Producing half of a live query, held by the store
pub struct SubscriptionSink {
    tx: mpsc::Sender<Snapshot>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn channel(capacity: usize) -> (SubscriptionSink, Subscription) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let cancel = CancellationToken::new();

        let sink = SubscriptionSink {
            tx,
            cancel: cancel.clone(),
        };
        let subscription = Subscription {
            rx,
            cancel,
            finished: false,
        };

        (sink, subscription)
    }

    /// Next snapshot, or `None` once the subscription has ended
    pub async fn next(&mut self) -> Option<Snapshot> {
        if self.finished {
            return None;
        }

        match self.rx.recv().await {
            Some(Ok(records)) => Some(Ok(records)),
            Some(Err(e)) => {
                self.finished = true;
                self.cancel.cancel();
                Some(Err(e))
            }
            None => {
                self.finished = true;
                None
            }
        }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_stream(self) -> impl Stream<Item = Snapshot> + Send {
        futures_util::stream::unfold(self, |mut subscription| async move {
            subscription.next().await.map(|snapshot| (snapshot, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl SubscriptionSink {
    /// Deliver a snapshot. Returns false once the subscriber is gone.
    pub async fn emit(&self, records: Vec<ScanRecord>) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(Ok(records)) => sent.is_ok(),
        }
    }

    /// Surface a terminal error to the subscriber and close the stream
    pub async fn fail(self, error: StoreError) {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {}
            _ = self.tx.send(Err(error)) => {}
        }
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
