use crate::{commands::command_error::CommandError, key_value_store::Store, resp::RespValue};

#[derive(Debug, PartialEq)]
pub struct KeysArguments {
    pub pattern: String,
}

impl KeysArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [pattern]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::arity("KEYS"))?;

        Ok(KeysArguments { pattern })
    }
}

/// Replies with the live keys matching a glob pattern, in sorted order.
pub async fn keys(store: &Store, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let keys_arguments = KeysArguments::parse(arguments)?;
    let keys = store.keys_matching(&keys_arguments.pattern).await?;

    Ok(RespValue::array_from_strings(keys))
}
