use std::collections::HashMap;

use tracing::debug;

use crate::{
    key_value_store::{DataType, Value},
    rdb::{
        RdbError,
        encoding::take,
        opcode::{
            AUX_OPCODE, END_OF_FILE_OPCODE, Record, SELECT_DB_OPCODE, parse_header, parse_record,
        },
    },
};

/// Position of the parser within the snapshot layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Header,
    Metadata,
    DatabaseSelector,
    KeyValues,
    Done,
}

/// Incremental snapshot reader.
///
/// Bytes can arrive in chunks of any size. Each call to [`RdbParser::parse`]
/// consumes the complete records at the front of its input and reports how
/// many bytes that was. The caller keeps the rest and passes it again, with
/// the next chunk appended.
#[derive(Debug)]
pub struct RdbParser {
    state: ParserState,
    pub version: Option<u32>,
    pub metadata: HashMap<String, String>,
    pub db_number: Option<usize>,
    pub hash_table_size: Option<usize>,
    pub expiry_hash_table_size: Option<usize>,
    pub key_value_store: HashMap<String, Value>,
}

impl Default for RdbParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RdbParser {
    pub fn new() -> Self {
        Self {
            state: ParserState::Header,
            version: None,
            metadata: HashMap::new(),
            db_number: None,
            hash_table_size: None,
            expiry_hash_table_size: None,
            key_value_store: HashMap::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    /// Consumes as many complete records as `bytes` holds.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Bytes consumed. Anything past that must be passed
    ///   again together with the next chunk.
    /// * `Err(RdbError)` - If the header does not match or a record is invalid
    pub fn parse(&mut self, bytes: &[u8]) -> Result<usize, RdbError> {
        let mut consumed = 0;

        while consumed < bytes.len() && !self.is_done() {
            match self.step(&bytes[consumed..]) {
                Ok(used) => consumed += used,
                Err(RdbError::Truncated) => break,
                Err(e) => return Err(e),
            }
        }

        // Whatever follows the end marker is the checksum.
        if self.is_done() {
            consumed = bytes.len();
        }

        Ok(consumed)
    }

    /// Advances by at most one record. Returns 0 when only the state changed.
    fn step(&mut self, bytes: &[u8]) -> Result<usize, RdbError> {
        match self.state {
            ParserState::Header => {
                let (version, used) = parse_header(bytes)?;
                self.version = Some(version);
                self.state = ParserState::Metadata;

                Ok(used)
            }
            ParserState::Metadata => {
                if take(bytes, 0, 1)?[0] != AUX_OPCODE {
                    self.state = ParserState::DatabaseSelector;
                    return Ok(0);
                }

                self.apply_record(bytes)
            }
            ParserState::DatabaseSelector => match take(bytes, 0, 1)?[0] {
                SELECT_DB_OPCODE | END_OF_FILE_OPCODE => self.apply_record(bytes),
                // Anything else means the selector has not arrived yet.
                _ => Err(RdbError::Truncated),
            },
            ParserState::KeyValues => self.apply_record(bytes),
            ParserState::Done => Ok(0),
        }
    }

    fn apply_record(&mut self, bytes: &[u8]) -> Result<usize, RdbError> {
        let (record, used) = parse_record(bytes)?;

        match record {
            Record::Aux { key, value } => {
                debug!(%key, %value, "snapshot metadata");
                self.metadata.insert(key, value);
            }
            Record::SelectDb(db_number) => {
                self.db_number = Some(db_number);
                self.state = ParserState::KeyValues;
            }
            Record::ResizeDb {
                table_size,
                expires_size,
            } => {
                self.hash_table_size = Some(table_size);
                self.expiry_hash_table_size = Some(expires_size);
            }
            Record::KeyValue {
                key,
                value,
                expiration,
            } => {
                self.key_value_store.insert(
                    key,
                    Value {
                        data: DataType::String(value),
                        expiration,
                    },
                );
            }
            Record::EndOfFile => {
                self.state = ParserState::Done;
            }
        }

        Ok(used)
    }
}
