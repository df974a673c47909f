use bytes::Bytes;

use crate::{commands::command_error::CommandError, resp::RespValue};

/// Handles the Redis ECHO command.
///
/// # Arguments
///
/// * `arguments` - Exactly one argument to echo back, returned byte for byte
///
/// # Returns
///
/// * `Ok(RespValue)` - A bulk string containing the echoed argument
/// * `Err(CommandError::WrongNumberOfArguments)` - If the number of arguments is not exactly 1
///
/// # Examples
///
/// ```ignore
/// // ECHO "hello world"
/// let result = echo(vec![Bytes::from("hello world")]);
/// // Encodes as: "$11\r\nhello world\r\n"
/// ```
pub fn echo(arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let [message]: [Bytes; 1] = arguments
        .try_into()
        .map_err(|_| CommandError::arity("ECHO"))?;

    Ok(RespValue::BulkString(Some(message)))
}
