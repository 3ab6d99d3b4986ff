use async_trait::async_trait;

use crate::protocol::command::{Command, CommandError};
use crate::protocol::resp::Value;
use crate::protocol::string::set::SetParams;
use crate::store::Store;

/// SETNX key value: `:1` if the key was written, `:0` if it already existed
pub struct SetNxCommand;

#[async_trait]
impl Command for SetNxCommand {
    async fn execute(&self, items: &[Value], store: &Store) -> Result<Value, CommandError> {
        let params = SetParams::parse(items, "setnx")?;
        let written = store.insert_if_absent(params.key, params.value);
        Ok(Value::Integer(i64::from(written)))
    }
}
