use async_trait::async_trait;

use crate::protocol::command::{Command, CommandError, arg_string};
use crate::protocol::resp::Value;
use crate::store::Store;

/// MSET key value [key value ...]
pub struct MSetCommand;

#[async_trait]
impl Command for MSetCommand {
    async fn execute(&self, items: &[Value], store: &Store) -> Result<Value, CommandError> {
        let args = items.get(1..).unwrap_or_default();
        if args.is_empty() || args.len() % 2 != 0 {
            return Err(CommandError::WrongArity("mset"));
        }

        // Decode everything first so a bad argument writes nothing.
        let pairs = args
            .chunks_exact(2)
            .map(|pair| -> Result<(String, String), CommandError> {
                Ok((arg_string(&pair[0])?, arg_string(&pair[1])?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        store.set_multiple(pairs);
        Ok(Value::ok())
    }
}
