use bytes::Bytes;

use crate::{
    commands::{
        command_error::CommandError,
        command_handler::{into_text, text_arguments},
    },
    key_value_store::Store,
    resp::RespValue,
};

/// Represents the parsed arguments for SET command
#[derive(Debug, PartialEq)]
pub struct SetArguments {
    /// The key name to store the value under
    key: String,
    /// The value to be stored under the given key, kept as raw bytes
    value: Bytes,
    /// Time to live in milliseconds, 0 for none
    ttl_millis: u64,
}

impl SetArguments {
    /// Parses command arguments into a SetArguments structure.
    ///
    /// # Arguments
    ///
    /// * `arguments` - The raw command arguments:
    ///   - Format 1: `[key, value]` - For permanent storage
    ///   - Format 2: `[key, value, "EX", seconds]` - Expiring after whole seconds
    ///   - Format 3: `[key, value, "PX", milliseconds]` - Expiring after milliseconds
    ///
    /// # Returns
    ///
    /// * `Ok(SetArguments)` - Successfully parsed arguments
    /// * `Err(CommandError::WrongNumberOfArguments)` - If fewer than 2 arguments are given
    /// * `Err(CommandError::NotText)` - If the key or an option is not UTF-8
    /// * `Err(CommandError::SyntaxError)` - If the option is not `EX` or `PX`, or its value is missing
    /// * `Err(CommandError::NotAnInteger)` - If the expiration is not an integer
    /// * `Err(CommandError::InvalidExpireTime)` - If the expiration is not positive
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let result = SetArguments::parse(vec!["mykey".into(), "hello".into(), "PX".into(), "1000".into()]);
    /// // Returns: Ok(SetArguments { key: "mykey", value: "hello", ttl_millis: 1000 })
    ///
    /// let result = SetArguments::parse(vec!["mykey".into(), "hello".into(), "KEEPTTL".into()]);
    /// // Returns: Err(CommandError::SyntaxError)
    /// ```
    pub fn parse(arguments: Vec<Bytes>) -> Result<Self, CommandError> {
        let mut iter = arguments.into_iter();

        let (Some(key), Some(value)) = (iter.next(), iter.next()) else {
            return Err(CommandError::arity("SET"));
        };
        let key = into_text(key)?;
        let mut iter = text_arguments(iter.collect())?.into_iter();

        let ttl_millis = match (iter.next(), iter.next(), iter.next()) {
            (None, _, _) => 0,
            (Some(option), Some(amount), None) => {
                let multiplier = match option.to_uppercase().as_str() {
                    "EX" => 1000,
                    "PX" => 1,
                    _ => return Err(CommandError::SyntaxError),
                };

                let amount = amount
                    .parse::<i64>()
                    .map_err(|_| CommandError::NotAnInteger)?;

                u64::try_from(amount)
                    .ok()
                    .filter(|amount| *amount > 0)
                    .and_then(|amount| amount.checked_mul(multiplier))
                    .ok_or_else(|| CommandError::InvalidExpireTime("set".to_string()))?
            }
            _ => return Err(CommandError::SyntaxError),
        };

        Ok(Self {
            key,
            value,
            ttl_millis,
        })
    }
}

/// Handles the Redis SET command.
///
/// Overwrites whatever the key held before, whatever its type.
///
/// # Returns
///
/// * `Ok(RespValue)` - `+OK`
/// * `Err(CommandError)` - If the arguments are invalid, see [`SetArguments::parse`]
pub async fn set(store: &Store, arguments: Vec<Bytes>) -> Result<RespValue, CommandError> {
    let set_arguments = SetArguments::parse(arguments)?;

    store
        .set(
            &set_arguments.key,
            set_arguments.value,
            set_arguments.ttl_millis,
        )
        .await;

    Ok(RespValue::SimpleString("OK".to_string()))
}
