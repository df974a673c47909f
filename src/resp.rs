//! Redis Serialization Protocol (RESP) codec.
//!
//! The same tagged value format is used for requests coming from clients and
//! for the replies written back to them. Decoding is incremental: callers feed
//! whatever bytes they have received so far and get back every complete value
//! plus the number of bytes those values occupied, so a trailing partial value
//! can be kept for the next read.
//!
//! Bulk payloads are raw bytes and are never required to be UTF-8.

use bytes::Bytes;
use thiserror::Error;

const CRLF: &[u8; 2] = b"\r\n";

/// Errors produced while decoding RESP input.
#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    /// Not enough bytes to decode a whole value. Never surfaced to clients,
    /// [`RespValue::decode`] stops at the last complete value instead.
    #[error("incomplete input")]
    Incomplete,
    #[error("unknown RESP type byte 0x{0:02X}")]
    UnknownType(u8),
    #[error("line is missing its CRLF terminator")]
    MissingTerminator,
    #[error("invalid length prefix")]
    InvalidLength,
    #[error("invalid integer")]
    InvalidInteger,
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("bulk string is not followed by CRLF")]
    MissingTrailingCrlf,
}

impl RespError {
    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(format!("ERR Protocol error: {}", self))
    }
}

/// Result of [`RespValue::decode`]: the complete values, the bytes they
/// occupy, and the error that stopped decoding early, if any.
pub type Decoded = (Vec<RespValue>, usize, Option<RespError>);

/// A single RESP value.
///
/// Bulk strings and arrays distinguish "absent" (`None`, encoded as a null
/// marker) from "empty" (`Some` of an empty payload).
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Option<Bytes>),
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    pub fn bulk_string(value: impl AsRef<[u8]>) -> Self {
        RespValue::BulkString(Some(Bytes::copy_from_slice(value.as_ref())))
    }

    pub fn null_bulk_string() -> Self {
        RespValue::BulkString(None)
    }

    pub fn array(values: Vec<RespValue>) -> Self {
        RespValue::Array(Some(values))
    }

    pub fn null_array() -> Self {
        RespValue::Array(None)
    }

    /// Builds an array of bulk strings.
    pub fn array_from_strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        RespValue::array(values.into_iter().map(RespValue::bulk_string).collect())
    }

    /// Returns the textual payload of simple strings and of bulk strings
    /// holding valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RespValue::SimpleString(s) => Some(s),
            RespValue::BulkString(Some(bytes)) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Encodes the value into its canonical wire form.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// RespValue::bulk_string("hey").encode();      // b"$3\r\nhey\r\n"
    /// RespValue::null_array().encode();            // b"*-1\r\n"
    /// ```
    pub fn encode(&self) -> Vec<u8> {
        let mut encoded = Vec::new();
        self.encode_into(&mut encoded);

        encoded
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => out.extend_from_slice(format!("+{}\r\n", s).as_bytes()),
            RespValue::Error(s) => out.extend_from_slice(format!("-{}\r\n", s).as_bytes()),
            RespValue::Integer(i) => out.extend_from_slice(format!(":{}\r\n", i).as_bytes()),
            RespValue::BulkString(Some(bytes)) => {
                out.extend_from_slice(format!("${}\r\n", bytes.len()).as_bytes());
                out.extend_from_slice(bytes);
                out.extend_from_slice(CRLF);
            }
            RespValue::BulkString(None) => out.extend_from_slice(b"$-1\r\n"),
            RespValue::Array(Some(values)) => {
                out.extend_from_slice(format!("*{}\r\n", values.len()).as_bytes());

                for value in values {
                    value.encode_into(out);
                }
            }
            RespValue::Array(None) => out.extend_from_slice(b"*-1\r\n"),
        }
    }

    /// Decodes as many complete values as `buffer` holds.
    ///
    /// # Returns
    ///
    /// A `(values, consumed, error)` triple:
    ///
    /// * `values` - Every complete value ahead of the first incomplete or
    ///   malformed one, in order.
    /// * `consumed` - The number of bytes `values` occupy. Bytes past it belong
    ///   to a value that has not fully arrived yet, or to the malformed one.
    /// * `error` - `Some` if decoding stopped at malformed input. Values before
    ///   it are still returned and are valid.
    pub fn decode(buffer: &[u8]) -> Decoded {
        let mut values = Vec::new();
        let mut consumed = 0;

        while consumed < buffer.len() {
            match Self::decode_value(&buffer[consumed..], 0) {
                Ok((value, used)) => {
                    values.push(value);
                    consumed += used;
                }
                Err(RespError::Incomplete) => break,
                Err(e) => return (values, consumed, Some(e)),
            }
        }

        (values, consumed, None)
    }

    fn decode_value(bytes: &[u8], depth: usize) -> Result<(RespValue, usize), RespError> {
        let Some(&type_byte) = bytes.first() else {
            return Err(RespError::Incomplete);
        };
        let line_end = find_crlf(bytes);

        match type_byte {
            b'+' | b'-' | b':' => {
                // A top level line has no length prefix, so a missing terminator
                // can't be told apart from garbage.
                let Some(end) = line_end else {
                    return Err(if depth == 0 {
                        RespError::MissingTerminator
                    } else {
                        RespError::Incomplete
                    });
                };
                let line = line_as_str(&bytes[1..end])?;

                let value = match type_byte {
                    b'+' => RespValue::SimpleString(line.to_string()),
                    b'-' => RespValue::Error(line.to_string()),
                    _ => RespValue::Integer(
                        line.parse::<i64>()
                            .map_err(|_| RespError::InvalidInteger)?,
                    ),
                };

                Ok((value, end + CRLF.len()))
            }
            b'$' => {
                let Some(end) = line_end else {
                    return Err(RespError::Incomplete);
                };
                let cursor = end + CRLF.len();

                let Some(length) = parse_length(&bytes[1..end])? else {
                    return Ok((RespValue::BulkString(None), cursor));
                };

                if bytes.len() < cursor + length + CRLF.len() {
                    return Err(RespError::Incomplete);
                }

                if &bytes[cursor + length..cursor + length + CRLF.len()] != CRLF {
                    return Err(RespError::MissingTrailingCrlf);
                }

                let content = Bytes::copy_from_slice(&bytes[cursor..cursor + length]);

                Ok((
                    RespValue::BulkString(Some(content)),
                    cursor + length + CRLF.len(),
                ))
            }
            b'*' => {
                let Some(end) = line_end else {
                    return Err(RespError::Incomplete);
                };
                let mut cursor = end + CRLF.len();

                let Some(length) = parse_length(&bytes[1..end])? else {
                    return Ok((RespValue::Array(None), cursor));
                };

                let mut elements = Vec::with_capacity(length.min(1024));

                for _ in 0..length {
                    let (element, used) = Self::decode_value(&bytes[cursor..], depth + 1)?;
                    cursor += used;
                    elements.push(element);
                }

                Ok((RespValue::Array(Some(elements)), cursor))
            }
            other => Err(RespError::UnknownType(other)),
        }
    }
}

fn find_crlf(bytes: &[u8]) -> Option<usize> {
    bytes.windows(CRLF.len()).position(|window| window == CRLF)
}

fn line_as_str(line: &[u8]) -> Result<&str, RespError> {
    std::str::from_utf8(line).map_err(|_| RespError::InvalidUtf8)
}

/// Parses a length prefix. `-1` is the null marker and yields `None`.
fn parse_length(line: &[u8]) -> Result<Option<usize>, RespError> {
    let length = line_as_str(line)?
        .parse::<i64>()
        .map_err(|_| RespError::InvalidLength)?;

    match length {
        -1 => Ok(None),
        n if n < 0 => Err(RespError::InvalidLength),
        n => usize::try_from(n)
            .map(Some)
            .map_err(|_| RespError::InvalidLength),
    }
}
