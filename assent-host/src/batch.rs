//! Sequential batch negotiation
//!
//! Runs a fixed list of kinds back to back. Negotiations never overlap:
//! there is one visible prompt surface, so the next negotiation only
//! starts once the previous outcome has been handed to the consumer.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;

use assent_api::{PermissionKind, PermissionResult};

use crate::grant::GrantChecker;
use crate::negotiation::{drive, AbortGuard, NegotiationRequest};
use crate::ui::ConsentUi;

/// One item of a batch sequence output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    /// Terminal outcome of this item's negotiation.
    pub result: PermissionResult,
    /// True only on the final item; the sequence closes right after it.
    pub is_last: bool,
}

/// Handle to an in-flight batch sequence.
///
/// Items arrive strictly in input order; a denied item never aborts the
/// batch. Dropping the handle cancels whatever is still running.
#[derive(Debug)]
pub struct BatchSequence {
    rx: mpsc::Receiver<BatchItem>,
    guard: AbortGuard,
}

impl BatchSequence {
    pub(crate) fn spawn(
        checker: Arc<dyn GrantChecker>,
        ui: Arc<dyn ConsentUi>,
        kinds: Vec<PermissionKind>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(run(checker, ui, kinds, tx));
        Self {
            rx,
            guard: AbortGuard::new(task),
        }
    }

    /// Await the next item; `None` once the sequence has closed.
    pub async fn next(&mut self) -> Option<BatchItem> {
        self.rx.recv().await
    }

    /// Consume the handle as a stream of batch items.
    pub fn into_stream(self) -> BatchStream {
        let Self { rx, guard } = self;
        BatchStream {
            inner: ReceiverStream::new(rx),
            _guard: guard,
        }
    }

    /// Drain the remaining items into a vector.
    pub async fn collect(mut self) -> Vec<BatchItem> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item);
        }
        items
    }
}

/// Stream over a batch sequence's items.
#[derive(Debug)]
pub struct BatchStream {
    inner: ReceiverStream<BatchItem>,
    _guard: AbortGuard,
}

impl Stream for BatchStream {
    type Item = BatchItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

async fn run(
    checker: Arc<dyn GrantChecker>,
    ui: Arc<dyn ConsentUi>,
    kinds: Vec<PermissionKind>,
    tx: mpsc::Sender<BatchItem>,
) {
    let count = kinds.len();
    tracing::debug!(count, "starting batch sequence");

    for (index, kind) in kinds.into_iter().enumerate() {
        // Backpressure: hold off occupying the prompt surface until the
        // consumer has taken the previous item.
        let Ok(permit) = tx.reserve().await else {
            tracing::debug!(index, "batch consumer went away");
            return;
        };

        let request = NegotiationRequest::new(kind);
        let result = match drive(checker.clone(), ui.clone(), request).await {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!(index, error = %err, "batch cancelled by consent surface");
                return;
            }
        };

        let is_last = index + 1 == count;
        permit.send(BatchItem { result, is_last });
    }
    // Sender drops here, closing the sequence after the last item.
}
