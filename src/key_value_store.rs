//! The typed, concurrent key space.
//!
//! A [`Store`] is a cheap handle around one mutex-protected [`StoreState`].
//! Every operation takes the lock once, so each is atomic with respect to the
//! others, and list pushes hand data to blocked clients while still holding it
//! (see [`crate::blocking`]).
//!
//! Keys with a TTL expire two ways: lazily, when an operation observes a key
//! whose deadline has passed, and through a background timer spawned by
//! [`Store::set`]. Both paths go through [`StoreState::purge_if_expired`],
//! which only deletes an entry that is still expired, so whichever fires
//! second is a no-op. A key owns at most one timer: overwriting or deleting
//! the key aborts it.
//!
//! String values and list elements are raw bytes; keys are text.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use bytes::Bytes;
use globset::Glob;
use jiff::Timestamp;
use thiserror::Error;
use tokio::{
    sync::{Mutex, MutexGuard},
    task::AbortHandle,
};
use tracing::debug;

use crate::{
    blocking::WaiterQueues,
    stream::{IdSpec, RangeBound, Stream, StreamEntry, StreamError, StreamId},
};

#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error(transparent)]
    Stream(#[from] StreamError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    String(Bytes),
    List(VecDeque<Bytes>),
    Stream(Stream),
}

impl DataType {
    /// Name reported by the TYPE command.
    pub fn type_name(&self) -> &'static str {
        match self {
            DataType::String(_) => "string",
            DataType::List(_) => "list",
            DataType::Stream(_) => "stream",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub data: DataType,
    /// Absolute deadline after which the entry no longer exists.
    pub expiration: Option<Timestamp>,
}

impl Value {
    pub fn new(data: DataType) -> Self {
        Self {
            data,
            expiration: None,
        }
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiration.is_some_and(|expiration| expiration <= now)
    }
}

#[derive(Debug, Default)]
pub struct StoreState {
    pub(crate) entries: HashMap<String, Value>,
    pub(crate) waiters: WaiterQueues,
    /// Background expiry task of each key with a deadline.
    pub(crate) expiry_timers: HashMap<String, AbortHandle>,
}

impl StoreState {
    /// Deletes `key` if its deadline has passed. Returns whether it did.
    pub(crate) fn purge_if_expired(&mut self, key: &str, now: Timestamp) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|value| value.is_expired(now));

        if expired {
            self.remove_entry(key);
            debug!(key, "removed expired key");
        }

        expired
    }

    /// Removes `key` along with its expiry timer.
    pub(crate) fn remove_entry(&mut self, key: &str) -> Option<Value> {
        self.cancel_expiry(key);
        self.entries.remove(key)
    }

    /// Inserts or replaces `key`. A timer left by the previous value is
    /// aborted; the caller schedules one for the new value if it expires.
    pub(crate) fn replace_entry(&mut self, key: String, value: Value) {
        self.cancel_expiry(&key);
        self.entries.insert(key, value);
    }

    pub(crate) fn cancel_expiry(&mut self, key: &str) {
        if let Some(timer) = self.expiry_timers.remove(key) {
            timer.abort();
        }
    }

    pub(crate) fn live_entry(&mut self, key: &str) -> Option<&Value> {
        self.purge_if_expired(key, Timestamp::now());
        self.entries.get(key)
    }

    pub(crate) fn live_entry_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.purge_if_expired(key, Timestamp::now());
        self.entries.get_mut(key)
    }

    pub(crate) fn list_mut(
        &mut self,
        key: &str,
    ) -> Result<Option<&mut VecDeque<Bytes>>, StoreError> {
        match self.live_entry_mut(key) {
            None => Ok(None),
            Some(Value {
                data: DataType::List(list),
                ..
            }) => Ok(Some(list)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// Removes up to `count` elements from the head of a list. Lists left
    /// empty are deleted.
    pub(crate) fn pop_front(&mut self, key: &str, count: usize) -> Result<Vec<Bytes>, StoreError> {
        let Some(list) = self.list_mut(key)? else {
            return Ok(Vec::new());
        };

        let count = count.min(list.len());
        let popped = list.drain(..count).collect::<Vec<Bytes>>();
        let is_empty = list.is_empty();

        if is_empty {
            self.remove_entry(key);
        }

        Ok(popped)
    }

    /// Puts an element back at the head of a list, recreating the list if a
    /// pop emptied it.
    pub(crate) fn restore_front(&mut self, key: &str, value: Bytes) {
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::new(DataType::List(VecDeque::new())));

        if let DataType::List(list) = &mut entry.data {
            list.push_front(value);
        }
    }
}

/// Shared handle to the key space. Clones refer to the same data.
#[derive(Debug, Clone, Default)]
pub struct Store {
    state: Arc<Mutex<StoreState>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().await
    }

    /// Creates or overwrites a string. A `ttl_millis` of 0 means no expiry.
    pub async fn set(&self, key: &str, value: impl Into<Bytes>, ttl_millis: u64) {
        let expiration = (ttl_millis > 0).then(|| expiration_after(ttl_millis));
        let mut state = self.lock().await;

        state.replace_entry(
            key.to_string(),
            Value {
                data: DataType::String(value.into()),
                expiration,
            },
        );

        if let Some(expiration) = expiration {
            self.schedule_expiry(&mut state, key.to_string(), expiration);
        }
    }

    /// Spawns the background deletion for a key with a deadline, replacing
    /// any timer the key already had.
    pub(crate) fn schedule_expiry(
        &self,
        state: &mut StoreState,
        key: String,
        expiration: Timestamp,
    ) {
        let store = self.clone();
        let timer_key = key.clone();
        // One extra millisecond so the timer never wakes before the deadline.
        let delay = Duration::from_millis(millis_until(expiration).saturating_add(1));

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut state = store.lock().await;
            state.purge_if_expired(&timer_key, Timestamp::now());
        });

        if let Some(previous) = state.expiry_timers.insert(key, timer.abort_handle()) {
            previous.abort();
        }
    }

    /// Number of keys with a pending expiry timer.
    pub async fn expiry_timer_count(&self) -> usize {
        self.lock().await.expiry_timers.len()
    }

    /// Returns the string stored at `key`. Missing, expired and non-string
    /// keys all yield `None`.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let mut state = self.lock().await;

        match &state.live_entry(key)?.data {
            DataType::String(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Deletes the given keys and returns how many existed.
    pub async fn delete(&self, keys: &[String]) -> usize {
        let mut state = self.lock().await;

        keys.iter()
            .filter(|key| {
                state.purge_if_expired(key, Timestamp::now());
                state.remove_entry(key).is_some()
            })
            .count()
    }

    /// Appends `values` to the list at `key`, creating it if needed.
    ///
    /// With `at_front` each value is pushed to the head in turn, so
    /// `LPUSH k a b` leaves `[b, a]`. Blocked clients waiting on `key` are
    /// served before the lock is released.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - The list length right after the push
    /// * `Err(StoreError::WrongType)` - If `key` holds another type
    pub async fn push(
        &self,
        key: &str,
        values: Vec<Bytes>,
        at_front: bool,
    ) -> Result<usize, StoreError> {
        let mut state = self.lock().await;

        if values.is_empty() {
            return Ok(state.list_mut(key)?.map_or(0, |list| list.len()));
        }

        state.purge_if_expired(key, Timestamp::now());

        let entry = state
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Value::new(DataType::List(VecDeque::new())));

        let DataType::List(list) = &mut entry.data else {
            return Err(StoreError::WrongType);
        };

        if at_front {
            for value in values {
                list.push_front(value);
            }
        } else {
            list.extend(values);
        }

        let length = list.len();
        state.serve_waiters(key);

        Ok(length)
    }

    /// Removes up to `count` elements from the head of the list at `key`.
    /// A missing key yields an empty result.
    pub async fn pop(&self, key: &str, count: usize) -> Result<Vec<Bytes>, StoreError> {
        self.lock().await.pop_front(key, count)
    }

    pub async fn length(&self, key: &str) -> Result<usize, StoreError> {
        let mut state = self.lock().await;

        Ok(state.list_mut(key)?.map_or(0, |list| list.len()))
    }

    /// Returns the elements between `start` and `end` inclusive. Negative
    /// indexes count from the end; ranges that select nothing are empty.
    pub async fn range(&self, key: &str, start: i64, end: i64) -> Result<Vec<Bytes>, StoreError> {
        let mut state = self.lock().await;

        let Some(list) = state.list_mut(key)? else {
            return Ok(Vec::new());
        };

        let Ok((start, end)) = validate_range_indexes(list, start, end) else {
            return Ok(Vec::new());
        };

        Ok(list.range(start..=end).cloned().collect())
    }

    pub async fn type_of(&self, key: &str) -> &'static str {
        let mut state = self.lock().await;

        state
            .live_entry(key)
            .map_or("none", |value| value.data.type_name())
    }

    /// Returns the live keys matching a glob pattern, sorted.
    pub async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let matcher = Glob::new(pattern)
            .map_err(|e| StoreError::InvalidPattern(e.to_string()))?
            .compile_matcher();

        let state = self.lock().await;
        let now = Timestamp::now();

        let mut keys = state
            .entries
            .iter()
            .filter(|(key, value)| !value.is_expired(now) && matcher.is_match(key.as_str()))
            .map(|(key, _)| key.clone())
            .collect::<Vec<String>>();
        keys.sort();

        Ok(keys)
    }

    /// Appends an entry to the stream at `key`, creating the stream on the
    /// first successful append.
    pub async fn append_stream(
        &self,
        key: &str,
        spec: IdSpec,
        fields: Vec<(String, String)>,
    ) -> Result<StreamId, StoreError> {
        let mut state = self.lock().await;
        let now_ms = now_millis();

        match state.live_entry_mut(key) {
            Some(Value {
                data: DataType::Stream(stream),
                ..
            }) => Ok(stream.append(spec, fields, now_ms)?),
            Some(_) => Err(StoreError::WrongType),
            None => {
                let mut stream = Stream::new();
                let id = stream.append(spec, fields, now_ms)?;
                state
                    .entries
                    .insert(key.to_string(), Value::new(DataType::Stream(stream)));

                Ok(id)
            }
        }
    }

    /// Returns the stream entries in the inclusive range. An unknown key
    /// yields no entries.
    pub async fn range_stream(
        &self,
        key: &str,
        start: RangeBound,
        end: RangeBound,
    ) -> Result<Vec<StreamEntry>, StoreError> {
        let mut state = self.lock().await;

        match state.live_entry(key) {
            None => Ok(Vec::new()),
            Some(Value {
                data: DataType::Stream(stream),
                ..
            }) => Ok(stream.range(start, end).to_vec()),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// Copies every live string entry, the only type snapshots persist.
    pub(crate) async fn string_entries(&self) -> Vec<(String, Bytes, Option<Timestamp>)> {
        let state = self.lock().await;
        let now = Timestamp::now();

        state
            .entries
            .iter()
            .filter(|(_, value)| !value.is_expired(now))
            .filter_map(|(key, value)| match &value.data {
                DataType::String(s) => Some((key.clone(), s.clone(), value.expiration)),
                _ => None,
            })
            .collect()
    }

    /// Inserts entries read from a snapshot and schedules their expiry timers.
    /// Entries replace existing keys of the same name.
    pub(crate) async fn restore(&self, entries: HashMap<String, Value>) {
        let mut state = self.lock().await;

        for (key, value) in entries {
            let expiration = value.expiration;
            state.replace_entry(key.clone(), value);

            if let Some(expiration) = expiration {
                self.schedule_expiry(&mut state, key, expiration);
            }
        }
    }
}

/// Normalizes LRANGE indexes against a list.
///
/// # Returns
///
/// * `Ok((usize, usize))` - Inclusive bounds inside the list
/// * `Err(&str)` - If the range selects nothing
pub fn validate_range_indexes<T>(
    list: &VecDeque<T>,
    start_index: i64,
    end_index: i64,
) -> Result<(usize, usize), &'static str> {
    let len = list.len() as i64;

    if len == 0 {
        return Err("List is empty");
    }

    let mut start = if start_index < 0 {
        len + start_index
    } else {
        start_index
    };
    let mut end = if end_index < 0 {
        len + end_index
    } else {
        end_index
    };

    start = start.max(0);
    end = end.min(len - 1);

    if start >= len {
        return Err("Start index is out of bounds");
    }

    if start > end {
        return Err("Start index is bigger than end index after processing");
    }

    Ok((start as usize, end as usize))
}

pub(crate) fn now_millis() -> u64 {
    u64::try_from(Timestamp::now().as_millisecond()).unwrap_or(0)
}

fn expiration_after(ttl_millis: u64) -> Timestamp {
    let deadline = Timestamp::now()
        .as_millisecond()
        .saturating_add(i64::try_from(ttl_millis).unwrap_or(i64::MAX));

    Timestamp::from_millisecond(deadline).unwrap_or(Timestamp::MAX)
}

fn millis_until(deadline: Timestamp) -> u64 {
    let remaining = deadline
        .as_millisecond()
        .saturating_sub(Timestamp::now().as_millisecond());

    u64::try_from(remaining).unwrap_or(0)
}
