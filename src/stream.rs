//! Stream data type: monotonic entry IDs and range scans.

use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum StreamError {
    #[error("Invalid stream ID specified as stream command argument")]
    InvalidId,
    #[error("The ID specified in XADD must be greater than 0-0")]
    ZeroId,
    #[error("The ID specified in XADD is equal or smaller than the target stream top item")]
    EqualOrSmaller,
}

/// Identifier of a stream entry, ordered by `(ms, seq)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StreamId {
    pub ms: u64,
    pub seq: u64,
}

impl StreamId {
    pub const ZERO: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: u64::MAX,
        seq: u64::MAX,
    };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl FromStr for StreamId {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ms, seq) = s.split_once('-').ok_or(StreamError::InvalidId)?;

        Ok(StreamId {
            ms: parse_component(ms)?,
            seq: parse_component(seq)?,
        })
    }
}

/// The ID argument of XADD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdSpec {
    /// `*`: both parts generated.
    Auto,
    /// `<ms>-*`: sequence generated.
    AutoSequence(u64),
    /// `<ms>-<seq>`
    Explicit(StreamId),
}

impl FromStr for IdSpec {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "*" {
            return Ok(IdSpec::Auto);
        }

        match s.split_once('-') {
            Some((ms, "*")) => Ok(IdSpec::AutoSequence(parse_component(ms)?)),
            Some(_) => Ok(IdSpec::Explicit(s.parse()?)),
            None => Err(StreamError::InvalidId),
        }
    }
}

/// One bound of an XRANGE query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeBound {
    /// `-`
    Min,
    /// `+`
    Max,
    /// `<ms>`: the whole millisecond bucket.
    Millis(u64),
    /// `<ms>-<seq>`
    Exact(StreamId),
}

impl RangeBound {
    fn as_start(&self) -> StreamId {
        match *self {
            RangeBound::Min => StreamId::ZERO,
            RangeBound::Max => StreamId::MAX,
            RangeBound::Millis(ms) => StreamId::new(ms, 0),
            RangeBound::Exact(id) => id,
        }
    }

    fn as_end(&self) -> StreamId {
        match *self {
            RangeBound::Min => StreamId::ZERO,
            RangeBound::Max => StreamId::MAX,
            RangeBound::Millis(ms) => StreamId::new(ms, u64::MAX),
            RangeBound::Exact(id) => id,
        }
    }
}

impl FromStr for RangeBound {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "-" => Ok(RangeBound::Min),
            "+" => Ok(RangeBound::Max),
            s if s.contains('-') => Ok(RangeBound::Exact(s.parse()?)),
            s => Ok(RangeBound::Millis(parse_component(s)?)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamEntry {
    pub id: StreamId,
    /// Field/value pairs in insertion order.
    pub fields: Vec<(String, String)>,
}

/// Entries kept in strictly increasing ID order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stream {
    last_id: StreamId,
    entries: Vec<StreamEntry>,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_id(&self) -> StreamId {
        self.last_id
    }

    pub fn entries(&self) -> &[StreamEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves an XADD ID argument against the current top item.
    ///
    /// # Arguments
    ///
    /// * `spec` - The requested ID
    /// * `now_ms` - Current unix time in milliseconds, used by `*`
    ///
    /// # Returns
    ///
    /// * `Ok(StreamId)` - An ID strictly greater than the last one
    /// * `Err(StreamError::ZeroId)` - If the ID resolves to `0-0`
    /// * `Err(StreamError::EqualOrSmaller)` - If the ID doesn't move the stream forward
    pub fn next_id(&self, spec: IdSpec, now_ms: u64) -> Result<StreamId, StreamError> {
        let id = match spec {
            IdSpec::Auto => {
                // Never go backwards if the clock did.
                let ms = now_ms.max(self.last_id.ms);
                StreamId::new(ms, self.next_sequence(ms))
            }
            IdSpec::AutoSequence(ms) => StreamId::new(ms, self.next_sequence(ms)),
            IdSpec::Explicit(id) => id,
        };

        if id == StreamId::ZERO {
            return Err(StreamError::ZeroId);
        }

        if !self.entries.is_empty() && id <= self.last_id {
            return Err(StreamError::EqualOrSmaller);
        }

        Ok(id)
    }

    fn next_sequence(&self, ms: u64) -> u64 {
        match self.entries.last() {
            Some(last) if last.id.ms == ms => last.id.seq.saturating_add(1),
            _ if ms == 0 => 1,
            _ => 0,
        }
    }

    /// Validates `spec` and appends a new entry.
    pub fn append(
        &mut self,
        spec: IdSpec,
        fields: Vec<(String, String)>,
        now_ms: u64,
    ) -> Result<StreamId, StreamError> {
        let id = self.next_id(spec, now_ms)?;

        self.entries.push(StreamEntry { id, fields });
        self.last_id = id;

        Ok(id)
    }

    /// Returns the entries whose ID lies in the inclusive `[start, end]` range.
    pub fn range(&self, start: RangeBound, end: RangeBound) -> &[StreamEntry] {
        let start = start.as_start();
        let end = end.as_end();

        if start > end {
            return &[];
        }

        let from = self.entries.partition_point(|entry| entry.id < start);
        let to = self.entries.partition_point(|entry| entry.id <= end);

        &self.entries[from..to.max(from)]
    }
}

fn parse_component(s: &str) -> Result<u64, StreamError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StreamError::InvalidId);
    }

    s.parse::<u64>().map_err(|_| StreamError::InvalidId)
}
