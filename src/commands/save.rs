use crate::{
    commands::command_error::CommandError, key_value_store::Store, rdb::save_snapshot,
    resp::RespValue, server::Config,
};

/// Writes a snapshot synchronously. I/O failures are returned to the client
/// and leave the server running.
pub async fn save(
    store: &Store,
    config: &Config,
    arguments: Vec<String>,
) -> Result<RespValue, CommandError> {
    if !arguments.is_empty() {
        return Err(CommandError::arity("SAVE"));
    }

    save_snapshot(store, config)
        .await
        .map_err(|e| CommandError::Snapshot(e.to_string()))?;

    Ok(RespValue::SimpleString("OK".to_string()))
}
