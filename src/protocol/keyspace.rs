//! Commands that inspect the keyspace rather than a single value

use async_trait::async_trait;

use crate::protocol::command::{Command, CommandError, arg_string, check_arity};
use crate::protocol::resp::Value;
use crate::store::Store;

/// EXISTS key [key ...]: number of listed keys that are present,
/// counting repeats
pub struct ExistsCommand;

#[async_trait]
impl Command for ExistsCommand {
    async fn execute(&self, items: &[Value], store: &Store) -> Result<Value, CommandError> {
        if items.len() < 2 {
            return Err(CommandError::WrongArity("exists"));
        }
        let mut count = 0;
        for item in &items[1..] {
            if store.contains(&arg_string(item)?) {
                count += 1;
            }
        }
        Ok(Value::Integer(count))
    }
}

/// DBSIZE
pub struct DbSizeCommand;

#[async_trait]
impl Command for DbSizeCommand {
    async fn execute(&self, items: &[Value], store: &Store) -> Result<Value, CommandError> {
        check_arity(items, 1, "dbsize")?;
        Ok(Value::Integer(store.len() as i64))
    }
}
