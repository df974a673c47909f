use bytes::{Buf, Bytes, BytesMut};
use jiff::Timestamp;
use tokio::{
    fs::File,
    io::{AsyncRead, AsyncReadExt},
};
use tracing::{debug, info};

use crate::{
    key_value_store::Store,
    rdb::{
        RdbError, RdbParser,
        encoding::{encode_length, encode_string},
        opcode::{
            AUX_OPCODE, END_OF_FILE_OPCODE, EXPIRATION_MILLISECONDS_OPCODE, MAGIC,
            RESIZE_DB_OPCODE, SELECT_DB_OPCODE, STRING_VALUE_TYPE, VERSION,
        },
    },
    server::Config,
};

const CHUNK_SIZE: usize = 4096;
const REDIS_VERSION: &str = "7.2.0";
const CHECKSUM_LEN: usize = 8;

/// Serializes string entries into a complete snapshot file.
///
/// Layout: header, `redis-ver` and `redis-bits` aux fields, database 0
/// selector, table sizes, one record per entry (preceded by its millisecond
/// expiry if it has one), end marker and a zeroed checksum.
pub fn encode_snapshot(entries: &[(String, Bytes, Option<Timestamp>)]) -> Result<Vec<u8>, RdbError> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(VERSION);

    for (key, value) in [("redis-ver", REDIS_VERSION), ("redis-bits", "64")] {
        bytes.push(AUX_OPCODE);
        encode_string(&mut bytes, key.as_bytes())?;
        encode_string(&mut bytes, value.as_bytes())?;
    }

    bytes.extend_from_slice(&[SELECT_DB_OPCODE, 0]);

    let expires = entries
        .iter()
        .filter(|(_, _, expiration)| expiration.is_some())
        .count();
    bytes.push(RESIZE_DB_OPCODE);
    bytes.extend_from_slice(&encode_length(entries.len())?);
    bytes.extend_from_slice(&encode_length(expires)?);

    for (key, value, expiration) in entries {
        if let Some(expiration) = expiration {
            let millis = u64::try_from(expiration.as_millisecond())
                .map_err(|_| RdbError::InvalidExpiration)?;

            bytes.push(EXPIRATION_MILLISECONDS_OPCODE);
            bytes.extend_from_slice(&millis.to_le_bytes());
        }

        bytes.push(STRING_VALUE_TYPE);
        encode_string(&mut bytes, key.as_bytes())?;
        encode_string(&mut bytes, value)?;
    }

    bytes.push(END_OF_FILE_OPCODE);
    bytes.extend_from_slice(&[0; CHECKSUM_LEN]);

    Ok(bytes)
}

/// Writes every live string entry to `{dir}/{dbfilename}`, creating the
/// directory if needed. Returns the number of keys written.
pub async fn save_snapshot(store: &Store, config: &Config) -> Result<usize, RdbError> {
    let mut entries = store.string_entries().await;
    entries.sort();

    let bytes = encode_snapshot(&entries)?;
    let path = config.snapshot_path();

    tokio::fs::create_dir_all(config.dir()).await?;
    tokio::fs::write(&path, bytes).await?;

    info!(path = %path.display(), keys = entries.len(), "saved snapshot");

    Ok(entries.len())
}

/// Feeds a snapshot to an [`RdbParser`] chunk by chunk.
///
/// An empty input is an empty snapshot. Input ending without an end marker is
/// accepted as long as it ends on a record boundary; a trailing partial
/// record is [`RdbError::Truncated`].
pub async fn read_snapshot<R>(mut reader: R) -> Result<RdbParser, RdbError>
where
    R: AsyncRead + Unpin,
{
    let mut parser = RdbParser::new();
    let mut buffer = BytesMut::with_capacity(CHUNK_SIZE);

    loop {
        buffer.reserve(CHUNK_SIZE);

        if reader.read_buf(&mut buffer).await? == 0 {
            break;
        }

        let consumed = parser.parse(&buffer)?;
        buffer.advance(consumed);
    }

    if !buffer.is_empty() {
        return Err(RdbError::Truncated);
    }

    Ok(parser)
}

/// Restores the snapshot at `{dir}/{dbfilename}` into `store`.
///
/// A missing file leaves the store empty. Entries whose expiry has already
/// passed are skipped. Returns the number of keys restored.
pub async fn load_snapshot(store: &Store, config: &Config) -> Result<usize, RdbError> {
    let path = config.snapshot_path();

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "no snapshot found, starting empty");
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };

    let parser = read_snapshot(file).await?;
    let mut entries = parser.key_value_store;

    let now = Timestamp::now();
    let total = entries.len();
    entries.retain(|_, value| !value.is_expired(now));

    if entries.len() < total {
        debug!(skipped = total - entries.len(), "skipped expired snapshot entries");
    }

    let restored = entries.len();
    store.restore(entries).await;

    info!(path = %path.display(), keys = restored, "loaded snapshot");

    Ok(restored)
}
