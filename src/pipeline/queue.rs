//! Bounded FIFO Queue
//!
//! A thin wrapper over a bounded `tokio::sync::mpsc` channel that exposes the three
//! operations the pipeline needs: a non-blocking push for admission, a non-blocking
//! pop for the drain task, and an awaiting pop for workers.
//!
//! ## Concurrency
//! - Any number of producers may `try_push` concurrently; the channel is the only
//!   synchronization on that path.
//! - Consumers share the receiver behind an async mutex. A consumer holds it only
//!   while waiting for the next item, never while processing it.
//! - `try_reserve` claims a slot before the caller has an item to put in it, so a
//!   move from one queue to another can never fail halfway.

use std::fmt;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

/// Why a push was turned away. The item is handed back.
#[derive(Debug, PartialEq, Eq)]
pub enum PushError<T> {
    Full(T),
    Closed(T),
}

impl<T> PushError<T> {
    pub fn into_inner(self) -> T {
        match self {
            PushError::Full(item) | PushError::Closed(item) => item,
        }
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::Full(_) => write!(f, "queue is full"),
            PushError::Closed(_) => write!(f, "queue is closed"),
        }
    }
}

/// A reserved slot in a [`BoundedQueue`]. Dropping it releases the slot.
pub struct PushSlot<'a, T>(mpsc::Permit<'a, T>);

impl<'a, T> PushSlot<'a, T> {
    pub fn push(self, item: T) {
        self.0.send(item);
    }
}

pub struct BoundedQueue<T> {
    name: &'static str,
    tx: mpsc::Sender<T>,
    rx: Mutex<mpsc::Receiver<T>>,
    closed: CancellationToken,
}

impl<T: Send> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` items.
    ///
    /// # Panics
    /// If `capacity` is zero. `PipelineConfig::validate` rules that out up front.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            name,
            tx,
            rx: Mutex::new(rx),
            closed: CancellationToken::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn try_push(&self, item: T) -> Result<(), PushError<T>> {
        if self.is_closed() {
            return Err(PushError::Closed(item));
        }

        self.tx.try_send(item).map_err(|e| match e {
            mpsc::error::TrySendError::Full(item) => PushError::Full(item),
            mpsc::error::TrySendError::Closed(item) => PushError::Closed(item),
        })
    }

    /// Claims room for one item, or `None` when the queue is full or closed.
    pub fn try_reserve(&self) -> Option<PushSlot<'_, T>> {
        if self.is_closed() {
            return None;
        }
        self.tx.try_reserve().ok().map(PushSlot)
    }

    /// Takes the oldest item without waiting.
    ///
    /// Returns `None` when the queue is empty or another consumer is currently
    /// waiting on it, so it is meant for queues with a single consumer.
    pub fn try_pop(&self) -> Option<T> {
        let mut rx = self.rx.try_lock().ok()?;
        rx.try_recv().ok()
    }

    /// Waits for the oldest item.
    ///
    /// Returns `None` only once the queue is closed and every remaining item has
    /// been handed out.
    pub async fn pop(&self) -> Option<T> {
        let mut rx = self.rx.lock().await;

        tokio::select! {
            biased;
            item = rx.recv() => item,
            _ = self.closed.cancelled() => rx.try_recv().ok(),
        }
    }

    /// Stops accepting pushes. Items already queued can still be popped.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Items queued or slots reserved.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}
