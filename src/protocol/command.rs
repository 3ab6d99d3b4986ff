use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::protocol::keyspace::{DbSizeCommand, ExistsCommand};
use crate::protocol::ping::PingCommand;
use crate::protocol::resp::Value;
use crate::protocol::string::{
    GetCommand, GetSetCommand, MGetCommand, MSetCommand, SetCommand, SetNxCommand,
};
use crate::store::Store;

/// Errors reported back to the client as RESP error replies
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),
    #[error("ERR unknown command '{0}'")]
    Unknown(String),
    #[error("ERR invalid argument")]
    InvalidArgument,
    #[error("ERR failed to parse command")]
    Malformed,
}

impl From<CommandError> for Value {
    fn from(err: CommandError) -> Self {
        Value::error(err.to_string())
    }
}

/// A Redis command executed against the store.
///
/// `items` is the whole request array, command name included.
#[async_trait]
pub trait Command: Send + Sync {
    async fn execute(&self, items: &[Value], store: &Store) -> Result<Value, CommandError>;
}

/// Extract a text argument. Keys and values are decoded lossily as UTF-8.
pub fn arg_string(item: &Value) -> Result<String, CommandError> {
    match item {
        Value::BulkString(Some(data)) => Ok(String::from_utf8_lossy(data).into_owned()),
        Value::SimpleString(s) => Ok(s.clone()),
        _ => Err(CommandError::InvalidArgument),
    }
}

/// Check that the request has exactly `expected` items, name included
pub fn check_arity(items: &[Value], expected: usize, name: &'static str) -> Result<(), CommandError> {
    if items.len() != expected {
        return Err(CommandError::WrongArity(name));
    }
    Ok(())
}

/// Registry of commands by upper-cased name
pub struct CommandFactory {
    commands: HashMap<&'static str, Box<dyn Command>>,
}

impl CommandFactory {
    /// Create a factory with every supported command registered
    pub fn init() -> Self {
        let mut factory = Self {
            commands: HashMap::new(),
        };
        factory.register("PING", PingCommand);
        factory.register("GET", GetCommand);
        factory.register("SET", SetCommand);
        factory.register("SETNX", SetNxCommand);
        factory.register("GETSET", GetSetCommand);
        factory.register("MGET", MGetCommand);
        factory.register("MSET", MSetCommand);
        factory.register("EXISTS", ExistsCommand);
        factory.register("DBSIZE", DbSizeCommand);
        factory
    }

    fn register(&mut self, name: &'static str, cmd: impl Command + 'static) {
        self.commands.insert(name, Box::new(cmd));
    }

    /// Parse and execute a RESP request on the given store
    pub async fn execute(&self, value: Value, store: &Store) -> Value {
        match self.dispatch(value, store).await {
            Ok(reply) => reply,
            Err(err) => err.into(),
        }
    }

    async fn dispatch(&self, value: Value, store: &Store) -> Result<Value, CommandError> {
        let items = match value {
            Value::Array(Some(items)) if !items.is_empty() => items,
            _ => return Err(CommandError::Malformed),
        };

        let name = match &items[0] {
            Value::BulkString(Some(data)) => String::from_utf8_lossy(data).to_uppercase(),
            Value::SimpleString(s) => s.to_uppercase(),
            _ => return Err(CommandError::Malformed),
        };

        let cmd = self
            .commands
            .get(name.as_str())
            .ok_or(CommandError::Unknown(name))?;
        cmd.execute(&items, store).await
    }
}
