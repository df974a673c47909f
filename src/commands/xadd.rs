use crate::{
    commands::command_error::CommandError,
    key_value_store::Store,
    resp::RespValue,
    stream::IdSpec,
};

#[derive(Debug, PartialEq)]
pub struct XaddArguments {
    key: String,
    id: IdSpec,
    fields: Vec<(String, String)>,
}

impl XaddArguments {
    /// Parses `[key, id, field, value, (field, value)...]`.
    ///
    /// # Returns
    ///
    /// * `Ok(XaddArguments)` - Fields are kept in the order given
    /// * `Err(CommandError::WrongNumberOfArguments)` - If there is no field or a field has no value
    /// * `Err(CommandError::Stream)` - If the ID is malformed
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.len() < 4 || arguments.len() % 2 != 0 {
            return Err(CommandError::arity("XADD"));
        }

        let mut iter = arguments.into_iter();
        let key = iter.next().unwrap_or_default();
        let id = iter.next().unwrap_or_default().parse::<IdSpec>()?;

        let mut fields = Vec::new();

        while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
            fields.push((field, value));
        }

        Ok(Self { key, id, fields })
    }
}

/// Handles the Redis XADD command.
///
/// # Returns
///
/// * `Ok(RespValue)` - The assigned entry ID as a bulk string
/// * `Err(CommandError)` - If the ID is zero, not above the stream's top item,
///   or the key holds another type
///
/// # Examples
///
/// ```ignore
/// // XADD sensor 1526919030474-* temperature 36
/// let result = xadd(&store, args).await;
/// // Encodes as: "$15\r\n1526919030474-0\r\n"
/// ```
pub async fn xadd(store: &Store, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let xadd_arguments = XaddArguments::parse(arguments)?;

    let id = store
        .append_stream(&xadd_arguments.key, xadd_arguments.id, xadd_arguments.fields)
        .await?;

    Ok(RespValue::bulk_string(id.to_string()))
}
