use async_trait::async_trait;

use crate::protocol::command::{Command, CommandError, arg_string};
use crate::protocol::resp::Value;
use crate::store::Store;

/// PING [message]
pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    async fn execute(&self, items: &[Value], _store: &Store) -> Result<Value, CommandError> {
        match items {
            [_] => Ok(Value::SimpleString("PONG".to_string())),
            [_, msg] => Ok(Value::bulk(Some(arg_string(msg)?))),
            _ => Err(CommandError::WrongArity("ping")),
        }
    }
}
