//! Snapshot persistence in an RDB-like binary format.
//!
//! Only string entries are written. Lists and streams have no record type in
//! this format and are left out of snapshots.

mod encoding;
mod opcode;
mod rdb_file_operations;
mod rdb_parser;

use thiserror::Error;

pub use encoding::{decode_length, decode_string, decode_text, encode_length, encode_string};
pub use rdb_file_operations::{encode_snapshot, load_snapshot, read_snapshot, save_snapshot};
pub use rdb_parser::{ParserState, RdbParser};

#[derive(Error, Debug)]
pub enum RdbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid snapshot header")]
    InvalidHeader,
    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),
    #[error("unsupported value type 0x{0:02X}")]
    UnsupportedValueType(u8),
    #[error("unsupported string encoding 0x{0:02X}")]
    UnsupportedEncoding(u8),
    #[error("length {0} does not fit the length encoding")]
    LengthTooLarge(usize),
    #[error("invalid UTF-8 in snapshot string")]
    InvalidUtf8,
    #[error("invalid expiration timestamp")]
    InvalidExpiration,
    /// Not enough bytes for the next record. The parser treats this as a
    /// request for more input; it only escapes once the input has ended.
    #[error("snapshot is truncated")]
    Truncated,
}
