use async_trait::async_trait;

use crate::protocol::command::{Command, CommandError, arg_string, check_arity};
use crate::protocol::resp::Value;
use crate::store::Store;

/// Parameters shared by the two-argument write commands
#[derive(Debug, Clone, PartialEq)]
pub struct SetParams {
    pub key: String,
    pub value: String,
}

impl SetParams {
    /// Parse `<CMD> key value` from RESP array items
    pub fn parse(items: &[Value], name: &'static str) -> Result<Self, CommandError> {
        check_arity(items, 3, name)?;
        Ok(SetParams {
            key: arg_string(&items[1])?,
            value: arg_string(&items[2])?,
        })
    }
}

/// SET key value
pub struct SetCommand;

#[async_trait]
impl Command for SetCommand {
    async fn execute(&self, items: &[Value], store: &Store) -> Result<Value, CommandError> {
        let params = SetParams::parse(items, "set")?;
        store.set(params.key, params.value);
        Ok(Value::ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::tests::items;

    #[test]
    fn test_set_params_parse_success() {
        let params = SetParams::parse(&items(&["SET", "mykey", "myvalue"]), "set").unwrap();
        assert_eq!(params.key, "mykey");
        assert_eq!(params.value, "myvalue");
    }

    #[test]
    fn test_set_params_parse_wrong_args() {
        assert_eq!(
            SetParams::parse(&items(&["SET", "key"]), "set"),
            Err(CommandError::WrongArity("set"))
        );
    }

    #[tokio::test]
    async fn test_set_cmd_execute_success() {
        let store = Store::new();
        let result = SetCommand.execute(&items(&["SET", "key", "value"]), &store).await;

        assert_eq!(result, Ok(Value::ok()));
        assert_eq!(store.get("key"), "value");
    }

    #[tokio::test]
    async fn test_set_cmd_overwrites() {
        let store = Store::new();
        store.set("key", "old");
        SetCommand
            .execute(&items(&["SET", "key", "new"]), &store)
            .await
            .unwrap();
        assert_eq!(store.get("key"), "new");
    }

    #[tokio::test]
    async fn test_set_cmd_execute_wrong_args() {
        let store = Store::new();
        let result = SetCommand.execute(&items(&["SET", "key"]), &store).await;

        assert_eq!(
            result.map_err(|e| e.to_string()),
            Err("ERR wrong number of arguments for 'set' command".to_string())
        );
        assert!(store.is_empty());
    }
}
