use bytes::Bytes;
use jiff::Timestamp;

use crate::rdb::{
    RdbError,
    encoding::{decode_length, decode_string, decode_text, take, take_array},
};

pub(crate) const MAGIC: &[u8; 5] = b"REDIS";
pub(crate) const VERSION: &[u8; 4] = b"0011";
pub(crate) const HEADER_LEN: usize = MAGIC.len() + VERSION.len();
const MAX_VERSION: u32 = 12;

pub(crate) const AUX_OPCODE: u8 = 0xFA;
pub(crate) const RESIZE_DB_OPCODE: u8 = 0xFB;
pub(crate) const EXPIRATION_MILLISECONDS_OPCODE: u8 = 0xFC;
pub(crate) const EXPIRATION_SECONDS_OPCODE: u8 = 0xFD;
pub(crate) const SELECT_DB_OPCODE: u8 = 0xFE;
pub(crate) const END_OF_FILE_OPCODE: u8 = 0xFF;
pub(crate) const STRING_VALUE_TYPE: u8 = 0x00;

#[derive(Debug, PartialEq)]
pub(crate) enum Record {
    Aux {
        key: String,
        value: String,
    },
    SelectDb(usize),
    ResizeDb {
        table_size: usize,
        expires_size: usize,
    },
    KeyValue {
        key: String,
        value: Bytes,
        expiration: Option<Timestamp>,
    },
    EndOfFile,
}

/// Validates the magic string and version.
///
/// The header is all-or-nothing: fewer than nine bytes is `Truncated`, nine
/// bytes that are not a known signature are an error.
pub(crate) fn parse_header(bytes: &[u8]) -> Result<(u32, usize), RdbError> {
    let header = take(bytes, 0, HEADER_LEN)?;

    if &header[..MAGIC.len()] != MAGIC {
        return Err(RdbError::InvalidHeader);
    }

    let version = std::str::from_utf8(&header[MAGIC.len()..])
        .ok()
        .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<u32>().ok())
        .ok_or(RdbError::InvalidHeader)?;

    if !(1..=MAX_VERSION).contains(&version) {
        return Err(RdbError::UnsupportedVersion(version));
    }

    Ok((version, HEADER_LEN))
}

/// Parses the record starting at `bytes[0]`.
///
/// # Returns
///
/// * `Ok((Record, usize))` - The record and the number of bytes it spans
/// * `Err(RdbError::Truncated)` - If the record is not complete yet
/// * `Err(RdbError)` - If the record cannot be understood
pub(crate) fn parse_record(bytes: &[u8]) -> Result<(Record, usize), RdbError> {
    let opcode = take(bytes, 0, 1)?[0];
    let mut cursor = 1;

    let record = match opcode {
        AUX_OPCODE => {
            let (key, used) = decode_text(&bytes[cursor..])?;
            cursor += used;
            let (value, used) = decode_text(&bytes[cursor..])?;
            cursor += used;

            Record::Aux { key, value }
        }
        SELECT_DB_OPCODE => {
            let (db_number, used) = decode_length(&bytes[cursor..])?;
            cursor += used;

            Record::SelectDb(db_number)
        }
        RESIZE_DB_OPCODE => {
            let (table_size, used) = decode_length(&bytes[cursor..])?;
            cursor += used;
            let (expires_size, used) = decode_length(&bytes[cursor..])?;
            cursor += used;

            Record::ResizeDb {
                table_size,
                expires_size,
            }
        }
        EXPIRATION_MILLISECONDS_OPCODE => {
            let millis = u64::from_le_bytes(take_array(bytes, cursor)?);
            cursor += 8;

            let expiration = i64::try_from(millis)
                .ok()
                .and_then(|millis| Timestamp::from_millisecond(millis).ok())
                .ok_or(RdbError::InvalidExpiration)?;

            let (key, value, used) = parse_string_entry(&bytes[cursor..])?;
            cursor += used;

            Record::KeyValue {
                key,
                value,
                expiration: Some(expiration),
            }
        }
        EXPIRATION_SECONDS_OPCODE => {
            let seconds = u32::from_le_bytes(take_array(bytes, cursor)?);
            cursor += 4;

            let expiration = Timestamp::from_second(i64::from(seconds))
                .map_err(|_| RdbError::InvalidExpiration)?;

            let (key, value, used) = parse_string_entry(&bytes[cursor..])?;
            cursor += used;

            Record::KeyValue {
                key,
                value,
                expiration: Some(expiration),
            }
        }
        END_OF_FILE_OPCODE => Record::EndOfFile,
        _ => {
            let (key, value, used) = parse_string_entry(bytes)?;
            cursor = used;

            Record::KeyValue {
                key,
                value,
                expiration: None,
            }
        }
    };

    Ok((record, cursor))
}

/// Parses a value type byte followed by a string key and a string value.
fn parse_string_entry(bytes: &[u8]) -> Result<(String, Bytes, usize), RdbError> {
    let value_type = take(bytes, 0, 1)?[0];

    if value_type != STRING_VALUE_TYPE {
        return Err(RdbError::UnsupportedValueType(value_type));
    }

    let mut cursor = 1;
    let (key, used) = decode_text(&bytes[cursor..])?;
    cursor += used;
    let (value, used) = decode_string(&bytes[cursor..])?;
    cursor += used;

    Ok((key, value, cursor))
}
