use crate::{
    commands::command_error::CommandError,
    key_value_store::Store,
    resp::RespValue,
    stream::{RangeBound, StreamEntry},
};

#[derive(Debug, PartialEq)]
pub struct XrangeArguments {
    key: String,
    start: RangeBound,
    end: RangeBound,
}

impl XrangeArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        let [key, start, end]: [String; 3] = arguments
            .try_into()
            .map_err(|_| CommandError::arity("XRANGE"))?;

        Ok(Self {
            key,
            start: start.parse()?,
            end: end.parse()?,
        })
    }
}

/// Handles the Redis XRANGE command.
///
/// `-` and `+` stand for the first and last entries. A bound given as
/// milliseconds only covers every sequence number in that millisecond.
pub async fn xrange(store: &Store, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let xrange_arguments = XrangeArguments::parse(arguments)?;

    let entries = store
        .range_stream(
            &xrange_arguments.key,
            xrange_arguments.start,
            xrange_arguments.end,
        )
        .await?;

    Ok(stream_entries_to_resp(&entries))
}

/// Encodes entries as `[[id, [field, value, ...]], ...]`.
pub fn stream_entries_to_resp(entries: &[StreamEntry]) -> RespValue {
    RespValue::array(
        entries
            .iter()
            .map(|entry| {
                RespValue::array(vec![
                    RespValue::bulk_string(entry.id.to_string()),
                    RespValue::array_from_strings(
                        entry
                            .fields
                            .iter()
                            .flat_map(|(field, value)| [field.as_str(), value.as_str()]),
                    ),
                ])
            })
            .collect(),
    )
}
