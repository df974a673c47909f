use crate::{commands::command_error::CommandError, key_value_store::Store, resp::RespValue};

#[derive(Debug, PartialEq)]
pub struct LpopArguments {
    key: String,
    /// `None` when no count was given, which changes the reply shape.
    count: Option<usize>,
}

impl LpopArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() || arguments.len() > 2 {
            return Err(CommandError::arity("LPOP"));
        }

        let count = match arguments.get(1) {
            Some(count) => Some(
                count
                    .parse::<usize>()
                    .map_err(|_| CommandError::NotAnInteger)?,
            ),
            None => None,
        };

        Ok(Self {
            key: arguments[0].clone(),
            count,
        })
    }
}

/// Handles the Redis LPOP command.
///
/// Removes and returns one or more elements from the head of a list.
///
/// # Arguments
///
/// * `store` - The shared key space
/// * `arguments` - A vector containing:
///   - 1 element: [key] - pops one element
///   - 2 elements: [key, count] - pops up to count elements
///
/// # Returns
///
/// * `Ok(RespValue)`:
///   - Without count: bulk string, or null bulk string if nothing was popped
///   - With count: array of elements, or null array if nothing was popped
/// * `Err(CommandError::WrongNumberOfArguments)` - If wrong number of arguments
/// * `Err(CommandError::NotAnInteger)` - If count is not a non-negative integer
/// * `Err(CommandError::Store)` - If the key holds another type
///
/// # Examples
///
/// ```ignore
/// // LPOP mylist
/// let result = lpop(&store, vec!["mylist".to_string()]).await;
/// // Encodes as: "$3\r\nval\r\n" or "$-1\r\n"
///
/// // LPOP mylist 3
/// let result = lpop(&store, vec!["mylist".to_string(), "3".to_string()]).await;
/// // Encodes as: "*3\r\n$3\r\none\r\n$3\r\ntwo\r\n$5\r\nthree\r\n"
/// ```
pub async fn lpop(store: &Store, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let lpop_arguments = LpopArguments::parse(arguments)?;

    let popped = store
        .pop(&lpop_arguments.key, lpop_arguments.count.unwrap_or(1))
        .await?;

    Ok(match (lpop_arguments.count, popped.is_empty()) {
        (None, true) => RespValue::null_bulk_string(),
        (None, false) => RespValue::BulkString(popped.into_iter().next()),
        (Some(_), true) => RespValue::null_array(),
        (Some(_), false) => RespValue::array(
            popped
                .into_iter()
                .map(|value| RespValue::BulkString(Some(value)))
                .collect(),
        ),
    })
}
