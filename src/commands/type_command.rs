use crate::{commands::command_error::CommandError, key_value_store::Store, resp::RespValue};

#[derive(Debug, PartialEq)]
pub struct TypeArguments {
    key: String,
}

impl TypeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key]: [String; 1] = arguments
            .try_into()
            .map_err(|_| CommandError::arity("TYPE"))?;

        Ok(Self { key })
    }
}

/// Replies with `string`, `list`, `stream` or `none`.
pub async fn type_command(store: &Store, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let type_arguments = TypeArguments::parse(arguments)?;
    let type_name = store.type_of(&type_arguments.key).await;

    Ok(RespValue::SimpleString(type_name.to_string()))
}
