use std::time::Duration;

use bytes::Bytes;

use crate::{
    blocking::BlockingPop,
    commands::{command_error::CommandError, command_handler::CommandResult},
    key_value_store::Store,
    resp::RespValue,
};

#[derive(Debug, PartialEq)]
pub struct BlpopArguments {
    key: String,
    /// `None` waits forever.
    timeout: Option<Duration>,
}

impl BlpopArguments {
    /// Parses `[key, timeout]`.
    ///
    /// The timeout is in seconds and may be fractional. Zero or negative
    /// means wait forever.
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key, timeout]: [String; 2] = arguments
            .try_into()
            .map_err(|_| CommandError::arity("BLPOP"))?;

        let seconds = timeout
            .parse::<f64>()
            .ok()
            .filter(|seconds| seconds.is_finite())
            .ok_or(CommandError::InvalidTimeout)?;

        let timeout = if seconds <= 0.0 {
            None
        } else {
            Some(Duration::try_from_secs_f64(seconds).map_err(|_| CommandError::InvalidTimeout)?)
        };

        Ok(Self { key, timeout })
    }
}

/// Handles the Redis BLPOP command.
///
/// Pops immediately when the list has data. Otherwise the client is queued
/// behind earlier waiters on the same key and the connection receives a
/// [`CommandResult::Blocked`] to await.
pub async fn blpop(store: &Store, arguments: Vec<String>) -> Result<CommandResult, CommandError> {
    let blpop_arguments = BlpopArguments::parse(arguments)?;

    match store
        .blocking_pop(&blpop_arguments.key, blpop_arguments.timeout)
        .await?
    {
        BlockingPop::Ready(value) => Ok(CommandResult::Response(blpop_reply(
            &blpop_arguments.key,
            Some(value),
        ))),
        BlockingPop::Pending(pending) => Ok(CommandResult::Blocked(pending)),
    }
}

/// `[key, value]` when an element was popped, a null array on timeout.
pub fn blpop_reply(key: &str, value: Option<Bytes>) -> RespValue {
    match value {
        Some(value) => RespValue::array(vec![
            RespValue::bulk_string(key),
            RespValue::BulkString(Some(value)),
        ]),
        None => RespValue::null_array(),
    }
}
