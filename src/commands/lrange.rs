use crate::{commands::command_error::CommandError, key_value_store::Store, resp::RespValue};

/// Represents the parsed arguments for the LRANGE command.
#[derive(Debug, PartialEq)]
pub struct LrangeArguments {
    /// The key name to retrieve from the store
    key: String,
    /// The starting index for the range (can be negative to count from the end)
    start_index: i64,
    /// The ending index for the range (can be negative to count from the end)
    end_index: i64,
}

impl LrangeArguments {
    /// Parses and validates the arguments for the LRANGE command.
    ///
    /// # Arguments
    ///
    /// * `arguments` - A vector of command arguments: [key, start_index, end_index]
    ///
    /// # Returns
    ///
    /// * `Ok(LrangeArguments)` - If the arguments are valid
    /// * `Err(CommandError::WrongNumberOfArguments)` - If the number of arguments is not exactly 3
    /// * `Err(CommandError::NotAnInteger)` - If start or end index is not a valid integer
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key, start_index, end_index]: [String; 3] = arguments
            .try_into()
            .map_err(|_| CommandError::arity("LRANGE"))?;

        let Ok(start_index) = start_index.parse::<i64>() else {
            return Err(CommandError::NotAnInteger);
        };

        let Ok(end_index) = end_index.parse::<i64>() else {
            return Err(CommandError::NotAnInteger);
        };

        Ok(Self {
            key,
            start_index,
            end_index,
        })
    }
}

/// Handles the Redis LRANGE command.
///
/// Both indexes are inclusive and may be negative to count from the end of
/// the list. Missing keys and ranges selecting nothing give an empty array.
///
/// # Examples
///
/// ```ignore
/// // LRANGE mylist -2 -1  (last 2 elements)
/// let result = lrange(&store, vec!["mylist".to_string(), "-2".to_string(), "-1".to_string()]).await;
/// // Encodes as: "*2\r\n$4\r\nval4\r\n$4\r\nval5\r\n"
/// ```
pub async fn lrange(store: &Store, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let lrange_arguments = LrangeArguments::parse(arguments)?;

    let values = store
        .range(
            &lrange_arguments.key,
            lrange_arguments.start_index,
            lrange_arguments.end_index,
        )
        .await?;

    Ok(RespValue::array(
        values
            .into_iter()
            .map(|value| RespValue::BulkString(Some(value)))
            .collect(),
    ))
}
