//! Blocking list pops.
//!
//! Each key has a FIFO of waiters, every one holding the sending half of a
//! oneshot channel. Waiters are resolved exactly once: either a push hands
//! them an element, or their deadline passes and they remove themselves from
//! the queue. Both happen under the store lock, and the push side pops the
//! element on the waiter's behalf before releasing it, so no other client can
//! take the element in between.

use std::{
    collections::{HashMap, VecDeque},
    time::Duration,
};

use bytes::Bytes;
use tokio::{sync::oneshot, time::Instant};
use tracing::debug;

use crate::key_value_store::{DataType, Store, StoreError, StoreState, Value};

#[derive(Debug)]
pub(crate) struct Waiter {
    id: u64,
    sender: oneshot::Sender<Bytes>,
}

/// Pending blocking pops, queued per key in arrival order.
#[derive(Debug, Default)]
pub struct WaiterQueues {
    queues: HashMap<String, VecDeque<Waiter>>,
    next_id: u64,
}

impl WaiterQueues {
    pub(crate) fn register(&mut self, key: &str) -> (u64, oneshot::Receiver<Bytes>) {
        let (sender, receiver) = oneshot::channel();
        let id = self.next_id;
        self.next_id += 1;

        self.queues
            .entry(key.to_string())
            .or_default()
            .push_back(Waiter { id, sender });

        (id, receiver)
    }

    /// Removes a waiter that has not been served. Returns `false` if it was
    /// already dequeued.
    pub(crate) fn remove(&mut self, key: &str, id: u64) -> bool {
        let Some(queue) = self.queues.get_mut(key) else {
            return false;
        };

        let before = queue.len();
        queue.retain(|waiter| waiter.id != id);
        let removed = queue.len() != before;

        if queue.is_empty() {
            self.queues.remove(key);
        }

        removed
    }

    pub(crate) fn pop_front(&mut self, key: &str) -> Option<Waiter> {
        let queue = self.queues.get_mut(key)?;
        let waiter = queue.pop_front();

        if queue.is_empty() {
            self.queues.remove(key);
        }

        waiter
    }

    pub fn len(&self, key: &str) -> usize {
        self.queues.get(key).map_or(0, VecDeque::len)
    }
}

impl StoreState {
    /// Hands elements of the list at `key` to its waiters, oldest first,
    /// until one of the two runs out.
    pub(crate) fn serve_waiters(&mut self, key: &str) {
        while self.list_len(key) > 0 {
            let Some(Waiter { id, sender }) = self.waiters.pop_front(key) else {
                break;
            };

            // The client went away without cancelling.
            if sender.is_closed() {
                debug!(key, id, "dropped abandoned waiter");
                continue;
            }

            let Some(value) = self.pop_front(key, 1).ok().and_then(|mut popped| popped.pop())
            else {
                break;
            };

            match sender.send(value) {
                Ok(()) => debug!(key, id, "served blocked client"),
                Err(value) => self.restore_front(key, value),
            }
        }
    }

    fn list_len(&self, key: &str) -> usize {
        match self.entries.get(key) {
            Some(Value {
                data: DataType::List(list),
                ..
            }) => list.len(),
            _ => 0,
        }
    }
}

/// Outcome of starting a blocking pop.
#[derive(Debug)]
pub enum BlockingPop {
    /// The list had data; no waiting needed.
    Ready(Bytes),
    /// The caller was queued and must await [`PendingPop::wait`].
    Pending(PendingPop),
}

/// A queued blocking pop.
#[derive(Debug)]
pub struct PendingPop {
    store: Store,
    key: String,
    id: u64,
    receiver: oneshot::Receiver<Bytes>,
    deadline: Option<Instant>,
}

impl PendingPop {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns a handle able to cancel this waiter once `wait` owns it.
    pub fn handle(&self) -> WaiterHandle {
        WaiterHandle {
            store: self.store.clone(),
            key: self.key.clone(),
            id: self.id,
        }
    }

    /// Suspends until a push serves this waiter or the deadline passes.
    ///
    /// # Returns
    ///
    /// * `Some(Bytes)` - The element popped on this waiter's behalf
    /// * `None` - The timeout elapsed or the waiter was cancelled
    pub async fn wait(self) -> Option<Bytes> {
        let PendingPop {
            store,
            key,
            id,
            mut receiver,
            deadline,
        } = self;

        let received = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, &mut receiver).await.ok(),
            None => Some((&mut receiver).await),
        };

        match received {
            Some(Ok(value)) => Some(value),
            // Sender dropped: the waiter was cancelled.
            Some(Err(_)) => None,
            None => {
                let mut state = store.lock().await;

                if state.waiters.remove(&key, id) {
                    debug!(%key, id, "blocked client timed out");
                    None
                } else {
                    // Served between the deadline and taking the lock.
                    receiver.try_recv().ok()
                }
            }
        }
    }
}

/// Cancels a pending waiter, e.g. when its connection closes.
#[derive(Debug, Clone)]
pub struct WaiterHandle {
    store: Store,
    key: String,
    id: u64,
}

impl WaiterHandle {
    /// Returns `false` if the waiter had already been served or timed out.
    pub async fn cancel(&self) -> bool {
        let mut state = self.store.lock().await;
        let removed = state.waiters.remove(&self.key, self.id);

        if removed {
            debug!(key = %self.key, id = self.id, "cancelled blocked client");
        }

        removed
    }
}

impl Store {
    /// Pops the head of the list at `key`, or queues the caller if there is
    /// nothing to pop.
    ///
    /// `timeout` of `None` waits forever. The deadline starts now, at
    /// registration.
    pub async fn blocking_pop(
        &self,
        key: &str,
        timeout: Option<Duration>,
    ) -> Result<BlockingPop, StoreError> {
        let mut state = self.lock().await;

        if let Some(value) = state.pop_front(key, 1)?.pop() {
            return Ok(BlockingPop::Ready(value));
        }

        let (id, receiver) = state.waiters.register(key);
        debug!(key, id, "client blocked");

        Ok(BlockingPop::Pending(PendingPop {
            store: self.clone(),
            key: key.to_string(),
            id,
            receiver,
            deadline: timeout.and_then(|timeout| Instant::now().checked_add(timeout)),
        }))
    }

    /// Number of clients currently blocked on `key`.
    pub async fn waiter_count(&self, key: &str) -> usize {
        self.lock().await.waiters.len(key)
    }
}
