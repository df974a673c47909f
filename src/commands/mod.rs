mod blpop;
mod command_error;
mod command_handler;
mod config_get;
mod del;
mod echo;
mod get;
mod keys;
mod llen;
mod lpop;
mod lrange;
mod ping;
mod rpush_and_lpush;
mod save;
mod set;
mod type_command;
mod xadd;
mod xrange;

pub use blpop::blpop_reply;
pub use command_error::CommandError;
pub use command_handler::{CommandHandler, CommandResult};
pub use xrange::stream_entries_to_resp;
