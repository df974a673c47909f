use crate::{commands::command_error::CommandError, key_value_store::Store, resp::RespValue};

#[derive(Debug, PartialEq)]
pub struct LlenArguments {
    key: String,
}

impl LlenArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::arity("LLEN"))?;

        Ok(Self { key })
    }
}

/// Handles the Redis LLEN command.
///
/// A missing key has length 0. A key holding another type is a `WRONGTYPE`
/// error.
pub async fn llen(store: &Store, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let llen_arguments = LlenArguments::parse(arguments)?;
    let length = store.length(&llen_arguments.key).await?;

    Ok(RespValue::Integer(length as i64))
}
