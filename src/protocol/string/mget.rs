use async_trait::async_trait;

use crate::protocol::command::{Command, CommandError, arg_string};
use crate::protocol::resp::Value;
use crate::store::Store;

/// MGET key [key ...]
pub struct MGetCommand;

#[async_trait]
impl Command for MGetCommand {
    async fn execute(&self, items: &[Value], store: &Store) -> Result<Value, CommandError> {
        if items.len() < 2 {
            return Err(CommandError::WrongArity("mget"));
        }
        let keys = items[1..]
            .iter()
            .map(arg_string)
            .collect::<Result<Vec<_>, _>>()?;

        let values = store
            .get_multiple(&keys)
            .into_iter()
            .map(Value::bulk)
            .collect();
        Ok(Value::Array(Some(values)))
    }
}
