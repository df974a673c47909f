use thiserror::Error;

use crate::{key_value_store::StoreError, resp::RespValue, stream::StreamError};

#[derive(Error, Debug, PartialEq)]
pub enum CommandError {
    #[error("invalid command")]
    InvalidCommand,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("syntax error")]
    SyntaxError,
    #[error("argument is not valid UTF-8")]
    NotText,
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error("invalid expire time in '{0}' command")]
    InvalidExpireTime(String),
    #[error("timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("Unknown option or number of arguments for CONFIG GET - '{0}'")]
    UnknownConfigParameter(String),
    #[error("snapshot failed: {0}")]
    Snapshot(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl CommandError {
    pub fn arity(command: &str) -> Self {
        CommandError::WrongNumberOfArguments(command.to_lowercase())
    }

    /// Error reply sent to the client. Type mismatches carry their own
    /// `WRONGTYPE` prefix, everything else is prefixed with `ERR`.
    pub fn as_resp(&self) -> RespValue {
        match self {
            CommandError::Store(StoreError::WrongType) => RespValue::Error(self.to_string()),
            _ => RespValue::Error(format!("ERR {}", self)),
        }
    }

    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.as_resp().encode()).into_owned()
    }
}
