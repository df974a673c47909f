use bytes::Bytes;

use crate::{
    blocking::PendingPop,
    commands::{
        blpop::blpop,
        command_error::CommandError,
        config_get::config_get,
        del::del,
        echo::echo,
        get::get,
        keys::keys,
        llen::llen,
        lpop::lpop,
        lrange::lrange,
        ping::ping,
        rpush_and_lpush::{lpush, rpush},
        save::save,
        set::set,
        type_command::type_command,
        xadd::xadd,
        xrange::xrange,
    },
    key_value_store::Store,
    resp::RespValue,
    server::Config,
};

#[derive(Debug)]
pub enum CommandResult {
    Response(RespValue),
    /// BLPOP found nothing to pop. The connection awaits the waiter and
    /// writes the reply once it resolves.
    Blocked(PendingPop),
}

/// A decoded request: upper-cased command name plus its raw arguments.
#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub arguments: Vec<Bytes>,
}

impl CommandHandler {
    /// Builds a command from an array of bulk strings, or from an inline
    /// command sent as a simple string (`+PING`). `CONFIG GET` is folded into
    /// a single command name.
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let mut parts = match input {
            RespValue::Array(Some(elements)) => elements
                .into_iter()
                .map(|element| match element {
                    RespValue::BulkString(Some(bytes)) => Ok(bytes),
                    RespValue::SimpleString(s) => Ok(Bytes::from(s)),
                    _ => Err(CommandError::InvalidCommand),
                })
                .collect::<Result<Vec<Bytes>, CommandError>>()?,
            RespValue::SimpleString(line) => line
                .split_whitespace()
                .map(|word| Bytes::copy_from_slice(word.as_bytes()))
                .collect(),
            _ => return Err(CommandError::InvalidCommand),
        }
        .into_iter();

        let Some(name) = parts.next() else {
            return Err(CommandError::InvalidCommand);
        };
        let mut name = into_text(name)?.to_uppercase();

        if name == "CONFIG" {
            let Some(sub_command) = parts.next() else {
                return Err(CommandError::arity("CONFIG"));
            };

            let sub_command = into_text(sub_command)?.to_uppercase();
            if sub_command != "GET" {
                return Err(CommandError::UnknownCommand(format!("CONFIG {}", sub_command)));
            }

            name = "CONFIG GET".to_string();
        }

        Ok(Self {
            name,
            arguments: parts.collect(),
        })
    }

    pub async fn handle_command(
        &self,
        store: &Store,
        config: &Config,
    ) -> Result<CommandResult, CommandError> {
        let arguments = self.arguments.clone();

        // Values stay raw bytes; keys, numbers and options must be text.
        let response = match self.name.as_str() {
            "PING" => ping(arguments)?,
            "ECHO" => echo(arguments)?,
            "SET" => set(store, arguments).await?,
            "RPUSH" => rpush(store, arguments).await?,
            "LPUSH" => lpush(store, arguments).await?,
            "GET" => get(store, text_arguments(arguments)?).await?,
            "DEL" => del(store, text_arguments(arguments)?).await?,
            "LPOP" => lpop(store, text_arguments(arguments)?).await?,
            "LLEN" => llen(store, text_arguments(arguments)?).await?,
            "LRANGE" => lrange(store, text_arguments(arguments)?).await?,
            "BLPOP" => return blpop(store, text_arguments(arguments)?).await,
            "TYPE" => type_command(store, text_arguments(arguments)?).await?,
            "KEYS" => keys(store, text_arguments(arguments)?).await?,
            "XADD" => xadd(store, text_arguments(arguments)?).await?,
            "XRANGE" => xrange(store, text_arguments(arguments)?).await?,
            "CONFIG GET" => config_get(config, text_arguments(arguments)?)?,
            "SAVE" => save(store, config, text_arguments(arguments)?).await?,
            _ => return Err(CommandError::UnknownCommand(self.name.clone())),
        };

        Ok(CommandResult::Response(response))
    }
}

/// Converts an argument that has to be text, such as a key or an option.
pub(crate) fn into_text(argument: Bytes) -> Result<String, CommandError> {
    String::from_utf8(argument.to_vec()).map_err(|_| CommandError::NotText)
}

pub(crate) fn text_arguments(arguments: Vec<Bytes>) -> Result<Vec<String>, CommandError> {
    arguments.into_iter().map(into_text).collect()
}
