//! Per-client request loop.
//!
//! Bytes are accumulated in a growable buffer and decoded incrementally:
//! complete requests are executed in arrival order and any trailing partial
//! request stays in the buffer until the rest of it is read.

use std::{net::SocketAddr, sync::Arc};

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use crate::{
    blocking::PendingPop,
    commands::{CommandError, CommandHandler, CommandResult, blpop_reply},
    key_value_store::Store,
    resp::RespValue,
    server::Config,
};

const BUFFER_SIZE: usize = 4096;

/// Serves one client until it disconnects.
///
/// Requests decoded ahead of malformed input are answered first. The
/// malformed input then gets a single protocol error reply and the bytes
/// buffered at that point are discarded; the connection stays open. While a
/// BLPOP is blocked the socket keeps being read so that a disconnect cancels
/// the waiter.
#[instrument(name = "connection", skip_all, fields(client = %client_address))]
pub async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    client_address: SocketAddr,
    store: Store,
    config: Arc<Config>,
) -> tokio::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("client connected");
    let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);

    loop {
        let (requests, consumed, error) = RespValue::decode(&buffer);
        buffer.advance(consumed);
        // A partial request or the malformed bytes. BLPOP may append more
        // while the requests below run.
        let leftover = buffer.len();

        for request in requests {
            let reply = match execute(request, &store, &config).await {
                Ok(CommandResult::Response(reply)) => reply,
                Ok(CommandResult::Blocked(pending)) => {
                    match wait_for_pop(pending, &mut reader, &mut buffer).await? {
                        Some(reply) => reply,
                        None => {
                            info!("client disconnected while blocked");
                            return Ok(());
                        }
                    }
                }
                Err(e) => {
                    debug!(error = %e, "command failed");
                    e.as_resp()
                }
            };

            write_to_stream(&mut writer, &reply).await?;
        }

        let appended = buffer.len() > leftover;

        if let Some(e) = error {
            warn!(error = %e, discarded = leftover, "malformed request");
            buffer.advance(leftover);
            write_to_stream(&mut writer, &e.as_resp()).await?;
        }

        // Bytes read while blocked may already hold the next request.
        if appended {
            continue;
        }

        buffer.reserve(BUFFER_SIZE);

        if reader.read_buf(&mut buffer).await? == 0 {
            info!("client disconnected");
            return Ok(());
        }
    }
}

async fn execute(
    request: RespValue,
    store: &Store,
    config: &Config,
) -> Result<CommandResult, CommandError> {
    let handler = CommandHandler::new(request)?;
    debug!(command = %handler.name, arguments = ?handler.arguments, "executing command");

    handler.handle_command(store, config).await
}

/// Awaits a blocked BLPOP while still reading from the client.
///
/// Bytes that arrive meanwhile are appended to `buffer` and handled once the
/// pop resolves. Returns `None` if the client went away, after cancelling the
/// waiter.
async fn wait_for_pop<R>(
    pending: PendingPop,
    reader: &mut R,
    buffer: &mut BytesMut,
) -> tokio::io::Result<Option<RespValue>>
where
    R: AsyncRead + Unpin,
{
    let key = pending.key().to_string();
    let handle = pending.handle();

    let wait = pending.wait();
    tokio::pin!(wait);

    loop {
        buffer.reserve(BUFFER_SIZE);

        tokio::select! {
            value = &mut wait => return Ok(Some(blpop_reply(&key, value))),
            read = reader.read_buf(buffer) => match read {
                Ok(0) => {
                    if !handle.cancel().await {
                        debug!(%key, "waiter resolved as the client disconnected");
                    }
                    return Ok(None);
                }
                Ok(_) => continue,
                Err(e) => {
                    handle.cancel().await;
                    return Err(e);
                }
            },
        }
    }
}

async fn write_to_stream<W>(writer: &mut W, response: &RespValue) -> tokio::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&response.encode()).await?;
    writer.flush().await?;

    Ok(())
}
