//! The "run on the UI-affecting thread" hand-off.
//!
//! Asynchronous collaborators never touch session state. They receive a
//! one-shot [`Completion`]; whatever thread finishes the work calls
//! [`Completion::complete`], which posts a [`QueueMessage`] here. The owner of
//! the [`crate::SessionEngine`] drains the queue on its own thread, so session
//! state is only ever mutated from one place and needs no lock.
//!
//! ```text
//! probe / feed / provider thread ──complete()──▶ channel ──pump()──▶ SessionEngine
//! observer handler ──MainQueueHandle::post()──▶ channel ──┘
//! ```
//!
//! A `Completion` dropped without a value posts its fallback failure, so the
//! engine's pending count always settles.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::collaborators::{ProbeResult, SignInResult};
use crate::error::FeedFetchError;
use crate::types::{FeedItem, ProviderKind};

/// Work delivered to the engine's thread.
#[derive(Debug)]
pub enum QueueMessage {
    ConnectivityChecked {
        address: String,
        result: ProbeResult,
    },
    FeedFetched(Result<Vec<FeedItem>, FeedFetchError>),
    SignInFinished {
        provider: ProviderKind,
        result: SignInResult,
    },
    Request(EngineRequest),
}

impl QueueMessage {
    /// Whether this message settles an outstanding [`Completion`].
    pub fn is_completion(&self) -> bool {
        !matches!(self, QueueMessage::Request(_))
    }
}

/// Follow-up actions observers can ask for from inside a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineRequest {
    CheckServerConnection,
    PresentLogin,
    RetryFeed,
    ShowLoadingIndicator,
    SignIn(ProviderKind),
    SignOut,
    DeferLogin,
}

/// Cloneable sender for observers and embedders.
#[derive(Debug, Clone)]
pub struct MainQueueHandle {
    tx: Sender<QueueMessage>,
}

impl MainQueueHandle {
    /// Queues `request`; it runs on the next `pump`.
    pub fn post(&self, request: EngineRequest) {
        if self.tx.send(QueueMessage::Request(request)).is_err() {
            tracing::debug!(?request, "Main queue closed, dropping request");
        }
    }
}

type Wrap<T> = Box<dyn FnOnce(T) -> QueueMessage + Send>;

/// One-shot result slot handed to an asynchronous collaborator.
pub struct Completion<T: Send + 'static> {
    slot: Option<(Sender<QueueMessage>, Wrap<T>)>,
    fallback: fn() -> T,
}

impl<T: Send + 'static> Completion<T> {
    /// Delivers `value` to the engine's thread.
    pub fn complete(mut self, value: T) {
        self.deliver(value);
    }

    fn deliver(&mut self, value: T) {
        if let Some((tx, wrap)) = self.slot.take() {
            // Receiver lives as long as the engine; a send error means it is gone.
            let _ = tx.send(wrap(value));
        }
    }
}

impl<T: Send + 'static> Drop for Completion<T> {
    fn drop(&mut self) {
        if self.slot.is_some() {
            tracing::warn!("Completion dropped without a result, reporting failure");
            let value = (self.fallback)();
            self.deliver(value);
        }
    }
}

impl<T: Send + 'static> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("pending", &self.slot.is_some())
            .finish()
    }
}

/// Receiving side, owned by the engine.
#[derive(Debug)]
pub struct MainQueue {
    tx: Sender<QueueMessage>,
    rx: Receiver<QueueMessage>,
    pending: usize,
}

impl Default for MainQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl MainQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, pending: 0 }
    }

    pub fn handle(&self) -> MainQueueHandle {
        MainQueueHandle {
            tx: self.tx.clone(),
        }
    }

    /// Completions issued and not yet drained.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Issues a completion that wraps its value with `wrap` when delivered.
    pub fn completion<T, W>(&mut self, wrap: W, fallback: fn() -> T) -> Completion<T>
    where
        T: Send + 'static,
        W: FnOnce(T) -> QueueMessage + Send + 'static,
    {
        self.pending += 1;
        Completion {
            slot: Some((self.tx.clone(), Box::new(wrap))),
            fallback,
        }
    }

    /// Next queued message without blocking.
    pub fn try_next(&mut self) -> Option<QueueMessage> {
        let message = self.rx.try_recv().ok()?;
        self.settle(&message);
        Some(message)
    }

    /// Next message, waiting at most `timeout`.
    pub fn next_timeout(&mut self, timeout: Duration) -> Option<QueueMessage> {
        match self.rx.recv_timeout(timeout) {
            Ok(message) => {
                self.settle(&message);
                Some(message)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    fn settle(&mut self, message: &QueueMessage) {
        if message.is_completion() {
            self.pending = self.pending.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn feed_completion(queue: &mut MainQueue) -> Completion<Result<Vec<FeedItem>, FeedFetchError>> {
        queue.completion(QueueMessage::FeedFetched, || {
            Err(FeedFetchError::new("dropped"))
        })
    }

    #[test]
    fn test_completion_from_other_thread_is_delivered() {
        let mut queue = MainQueue::new();
        let completion = feed_completion(&mut queue);
        assert_eq!(queue.pending(), 1);

        thread::spawn(move || completion.complete(Ok(vec![])))
            .join()
            .unwrap();

        match queue.next_timeout(Duration::from_secs(1)) {
            Some(QueueMessage::FeedFetched(Ok(items))) => assert!(items.is_empty()),
            other => panic!("unexpected message: {:?}", other),
        }
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_dropped_completion_posts_fallback() {
        let mut queue = MainQueue::new();
        drop(feed_completion(&mut queue));

        match queue.try_next() {
            Some(QueueMessage::FeedFetched(Err(err))) => assert_eq!(err.message, "dropped"),
            other => panic!("unexpected message: {:?}", other),
        }
        assert_eq!(queue.pending(), 0);
        assert!(queue.try_next().is_none());
    }

    #[test]
    fn test_requests_do_not_touch_pending_count() {
        let mut queue = MainQueue::new();
        let _held = feed_completion(&mut queue);
        queue.handle().post(EngineRequest::RetryFeed);

        match queue.try_next() {
            Some(QueueMessage::Request(EngineRequest::RetryFeed)) => {}
            other => panic!("unexpected message: {:?}", other),
        }
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    fn test_empty_queue_times_out() {
        let mut queue = MainQueue::new();
        assert!(queue.next_timeout(Duration::from_millis(10)).is_none());
    }
}
