use crate::{commands::command_error::CommandError, key_value_store::Store, resp::RespValue};

#[derive(Debug, PartialEq)]
pub struct DelArguments {
    keys: Vec<String>,
}

impl DelArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::arity("DEL"));
        }

        Ok(Self { keys: arguments })
    }
}

/// Deletes every given key and replies with how many existed.
pub async fn del(store: &Store, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let del_arguments = DelArguments::parse(arguments)?;
    let deleted = store.delete(&del_arguments.keys).await;

    Ok(RespValue::Integer(deleted as i64))
}
