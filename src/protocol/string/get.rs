use async_trait::async_trait;

use crate::protocol::command::{Command, CommandError, arg_string, check_arity};
use crate::protocol::resp::Value;
use crate::store::Store;

/// GET key
///
/// Replies with the null bulk string for an absent key, so clients can tell
/// it apart from a key holding the empty string.
pub struct GetCommand;

#[async_trait]
impl Command for GetCommand {
    async fn execute(&self, items: &[Value], store: &Store) -> Result<Value, CommandError> {
        check_arity(items, 2, "get")?;
        let key = arg_string(&items[1])?;
        Ok(Value::bulk(store.lookup(&key)))
    }
}
