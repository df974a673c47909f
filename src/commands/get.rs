use crate::{commands::command_error::CommandError, key_value_store::Store, resp::RespValue};

/// Represents the parsed arguments for GET command
#[derive(Debug, PartialEq)]
pub struct GetArguments {
    /// The key name to retrieve from the store
    key: String,
}

impl GetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::arity("GET"))?;

        Ok(Self { key })
    }
}

/// Handles the Redis GET command.
///
/// Expired keys are removed as they are observed. Keys holding a list or a
/// stream read as missing.
///
/// # Returns
///
/// * `Ok(RespValue)` - The value as a bulk string, or a null bulk string
/// * `Err(CommandError::WrongNumberOfArguments)` - If not given exactly one key
///
/// # Examples
///
/// ```ignore
/// // GET mykey
/// let result = get(&store, vec!["mykey".to_string()]).await;
/// // Encodes as: "$5\r\nhello\r\n" or "$-1\r\n"
/// ```
pub async fn get(store: &Store, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let get_arguments = GetArguments::parse(arguments)?;

    Ok(match store.get(&get_arguments.key).await {
        Some(value) => RespValue::BulkString(Some(value)),
        None => RespValue::null_bulk_string(),
    })
}
