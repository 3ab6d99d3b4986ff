use async_trait::async_trait;

use crate::protocol::command::{Command, CommandError};
use crate::protocol::resp::Value;
use crate::protocol::string::set::SetParams;
use crate::store::Store;

/// GETSET key value: stores `value` and replies with the previous value,
/// or the null bulk string if the key was absent
pub struct GetSetCommand;

#[async_trait]
impl Command for GetSetCommand {
    async fn execute(&self, items: &[Value], store: &Store) -> Result<Value, CommandError> {
        let params = SetParams::parse(items, "getset")?;
        Ok(Value::bulk(store.replace(params.key, params.value)))
    }
}
