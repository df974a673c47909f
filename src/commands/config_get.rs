use crate::{commands::CommandError, resp::RespValue, server::Config};

#[derive(Debug, PartialEq)]
pub struct ConfigGetArguments {
    pub parameters: Vec<String>,
}

impl ConfigGetArguments {
    pub fn parse(arguments: Vec<String>) -> Result<Self, CommandError> {
        if arguments.is_empty() {
            return Err(CommandError::arity("CONFIG GET"));
        }

        Ok(ConfigGetArguments {
            parameters: arguments,
        })
    }
}

/// Replies with a flat array of `name, value` pairs, one per requested
/// parameter. Unknown parameters are an error.
pub fn config_get(config: &Config, arguments: Vec<String>) -> Result<RespValue, CommandError> {
    let config_get_arguments = ConfigGetArguments::parse(arguments)?;
    let mut response = Vec::new();

    for parameter in config_get_arguments.parameters {
        let Some(value) = config.get(&parameter) else {
            return Err(CommandError::UnknownConfigParameter(parameter));
        };

        response.push(RespValue::bulk_string(parameter.to_lowercase()));
        response.push(RespValue::bulk_string(value));
    }

    Ok(RespValue::array(response))
}
