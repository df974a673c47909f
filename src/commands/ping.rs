use bytes::Bytes;

use crate::{commands::command_error::CommandError, resp::RespValue};

#[derive(Debug, PartialEq)]
pub struct PingArguments {
    message: Option<Bytes>,
}

impl PingArguments {
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        if arguments.len() > 1 {
            return Err(CommandError::arity("PING"));
        }

        Ok(Self {
            message: arguments.into_iter().next(),
        })
    }
}

/// Replies `PONG`, or echoes the optional message as a bulk string.
pub fn ping(arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let ping_arguments = PingArguments::parse(arguments)?;

    Ok(match ping_arguments.message {
        Some(message) => RespValue::BulkString(Some(message)),
        None => RespValue::SimpleString("PONG".to_string()),
    })
}
