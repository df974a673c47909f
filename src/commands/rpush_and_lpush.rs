use bytes::Bytes;

use crate::{
    commands::{command_error::CommandError, command_handler::into_text},
    key_value_store::Store,
    resp::RespValue,
};

#[derive(Debug, PartialEq)]
pub struct PushArrayOperations {
    key: String,
    values: Vec<Bytes>,
}

impl PushArrayOperations {
    pub fn parse(arguments: Vec<Bytes>, should_prepend: bool) -> Result<Self, CommandError> {
        if arguments.len() < 2 {
            return Err(CommandError::arity(if should_prepend {
                "LPUSH"
            } else {
                "RPUSH"
            }));
        }

        let mut iter = arguments.into_iter();

        Ok(Self {
            key: into_text(iter.next().unwrap_or_default())?,
            values: iter.collect(),
        })
    }
}

pub async fn rpush(store: &Store, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    push_array_operations(store, arguments, false).await
}

pub async fn lpush(store: &Store, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    push_array_operations(store, arguments, true).await
}

/// Pushes the values and replies with the list length right after the push.
/// Blocked BLPOP clients are served from the new elements afterwards.
async fn push_array_operations(
    store: &Store,
    arguments: Vec<Bytes>,
    should_prepend: bool,
) -> Result<RespValue, CommandError> {
    let push_array_arguments = PushArrayOperations::parse(arguments, should_prepend)?;

    let length = store
        .push(
            &push_array_arguments.key,
            push_array_arguments.values,
            should_prepend,
        )
        .await?;

    Ok(RespValue::Integer(length as i64))
}
