use bytes::{Buf, BytesMut};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::protocol::{CommandFactory, Parser, Value};
use crate::store::Store;

/// Read buffer size per connection
const READ_BUFFER_SIZE: usize = 8192;

/// TCP server speaking RESP in front of a shared [`Store`]
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    cmd_factory: Arc<CommandFactory>,
    store: Arc<Store>,
}

impl Server {
    /// Create and bind TCP server to specified address with a fresh store
    pub async fn bind(addr: &str) -> std::io::Result<Self> {
        Self::bind_with_store(addr, Arc::new(Store::new())).await
    }

    /// Create and bind TCP server serving an existing store
    pub async fn bind_with_store(addr: &str, store: Arc<Store>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("TCP server bound to {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            cmd_factory: Arc::new(CommandFactory::init()),
            store,
        })
    }

    /// Get local listening address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The store shared by all connections
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Process a RESP command and return the response
    async fn process_command(&self, value: Value) -> Value {
        self.cmd_factory.execute(value, &self.store).await
    }

    /// Handle a single client connection
    async fn handle_connection(
        self: Arc<Self>,
        mut stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> std::io::Result<()> {
        // Bytes received but not yet parsed into a complete frame
        let mut pending = BytesMut::with_capacity(READ_BUFFER_SIZE);

        loop {
            let n = stream.read_buf(&mut pending).await?;
            if n == 0 {
                info!("Connection closed by client: {}", peer_addr);
                break;
            }

            loop {
                match Parser::parse(&pending) {
                    Ok(Some((value, consumed))) => {
                        pending.advance(consumed);
                        debug!("Received command from {}: {:?}", peer_addr, value);

                        let response = self.process_command(value).await;
                        stream.write_all(&response.encode()).await?;
                    }
                    // No complete command available
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Protocol error from {}: {}", peer_addr, e);
                        let reply = Value::error(format!("ERR Protocol error: {}", e));
                        stream.write_all(&reply.encode()).await?;
                        stream.shutdown().await?;
                        return Ok(());
                    }
                }
            }
        }

        info!("Connection handler ended for {}", peer_addr);
        Ok(())
    }

    /// Start server, accept and process connections
    pub async fn run(self: Arc<Self>) {
        info!("Server started, listening on {}", self.local_addr);

        loop {
            match self.listener.accept().await {
                Ok((stream, peer_addr)) => {
                    info!("New connection accepted from {}", peer_addr);

                    let server = Arc::clone(&self);

                    // Spawn an independent task for each connection
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream, peer_addr).await {
                            error!("Error handling connection from {}: {}", peer_addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::resp::MAX_NESTING_DEPTH;

    async fn start() -> Arc<Server> {
        let server = Arc::new(Server::bind("127.0.0.1:0").await.unwrap());
        tokio::spawn(Arc::clone(&server).run());
        server
    }

    fn command(parts: &[&str]) -> Vec<u8> {
        Value::Array(Some(
            parts
                .iter()
                .map(|p| Value::BulkString(Some(p.as_bytes().to_vec())))
                .collect(),
        ))
        .encode()
    }

    /// Read exactly one reply frame; `None` if the server closed first
    async fn read_reply(stream: &mut TcpStream, buf: &mut BytesMut) -> Option<Value> {
        loop {
            if let Some((value, consumed)) = Parser::parse(buf).unwrap() {
                buf.advance(consumed);
                return Some(value);
            }
            if stream.read_buf(buf).await.unwrap() == 0 {
                return None;
            }
        }
    }

    async fn roundtrip(stream: &mut TcpStream, buf: &mut BytesMut, parts: &[&str]) -> Value {
        stream.write_all(&command(parts)).await.unwrap();
        read_reply(stream, buf).await.unwrap()
    }

    #[tokio::test]
    async fn test_string_commands_over_tcp() {
        let server = start().await;
        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
        let mut buf = BytesMut::new();

        assert_eq!(
            roundtrip(&mut stream, &mut buf, &["PING"]).await,
            Value::SimpleString("PONG".to_string())
        );
        assert_eq!(
            roundtrip(&mut stream, &mut buf, &["GET", "k"]).await,
            Value::BulkString(None)
        );
        assert_eq!(roundtrip(&mut stream, &mut buf, &["SET", "k", "v"]).await, Value::ok());
        assert_eq!(
            roundtrip(&mut stream, &mut buf, &["SETNX", "k", "x"]).await,
            Value::Integer(0)
        );
        assert_eq!(
            roundtrip(&mut stream, &mut buf, &["GETSET", "k", "w"]).await,
            Value::bulk(Some("v".to_string()))
        );
        assert_eq!(
            roundtrip(&mut stream, &mut buf, &["GET", "k"]).await,
            Value::bulk(Some("w".to_string()))
        );
        assert_eq!(server.store().get("k"), "w");
    }

    #[tokio::test]
    async fn test_pipelined_and_fragmented_requests() {
        let server = start().await;
        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
        let mut buf = BytesMut::new();

        let mut batch = command(&["SET", "a", "1"]);
        batch.extend(command(&["SET", "b", "2"]));
        batch.extend(command(&["MGET", "a", "b"]));

        // Split mid-frame to exercise buffering of partial input
        let (head, tail) = batch.split_at(batch.len() - 7);
        stream.write_all(head).await.unwrap();
        stream.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        stream.write_all(tail).await.unwrap();

        assert_eq!(read_reply(&mut stream, &mut buf).await, Some(Value::ok()));
        assert_eq!(read_reply(&mut stream, &mut buf).await, Some(Value::ok()));
        assert_eq!(
            read_reply(&mut stream, &mut buf).await,
            Some(Value::Array(Some(vec![
                Value::bulk(Some("1".to_string())),
                Value::bulk(Some("2".to_string())),
            ])))
        );
    }

    #[tokio::test]
    async fn test_clients_share_store() {
        let server = start().await;
        let mut first = TcpStream::connect(server.local_addr()).await.unwrap();
        let mut second = TcpStream::connect(server.local_addr()).await.unwrap();
        let mut buf1 = BytesMut::new();
        let mut buf2 = BytesMut::new();

        roundtrip(&mut first, &mut buf1, &["SET", "shared", "yes"]).await;
        assert_eq!(
            roundtrip(&mut second, &mut buf2, &["GET", "shared"]).await,
            Value::bulk(Some("yes".to_string()))
        );
        assert_eq!(
            roundtrip(&mut second, &mut buf2, &["DBSIZE"]).await,
            Value::Integer(1)
        );
    }

    #[tokio::test]
    async fn test_command_errors_keep_connection_open() {
        let server = start().await;
        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
        let mut buf = BytesMut::new();

        assert_eq!(
            roundtrip(&mut stream, &mut buf, &["NOPE"]).await,
            Value::error("ERR unknown command 'NOPE'")
        );
        assert_eq!(
            roundtrip(&mut stream, &mut buf, &["GET"]).await,
            Value::error("ERR wrong number of arguments for 'get' command")
        );
        assert_eq!(
            roundtrip(&mut stream, &mut buf, &["PING"]).await,
            Value::SimpleString("PONG".to_string())
        );
    }

    #[tokio::test]
    async fn test_protocol_error_closes_connection() {
        let server = start().await;
        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
        let mut buf = BytesMut::new();

        stream.write_all(b"?garbage\r\n").await.unwrap();
        match read_reply(&mut stream, &mut buf).await {
            Some(Value::Error(msg)) => assert!(msg.starts_with("ERR Protocol error")),
            other => panic!("expected protocol error, got {:?}", other),
        }
        assert_eq!(read_reply(&mut stream, &mut buf).await, None);
    }

    #[tokio::test]
    async fn test_deeply_nested_request_is_rejected() {
        let server = start().await;
        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
        let mut buf = BytesMut::new();

        stream
            .write_all(&b"*1\r\n".repeat(MAX_NESTING_DEPTH + 1))
            .await
            .unwrap();
        match read_reply(&mut stream, &mut buf).await {
            Some(Value::Error(msg)) => assert!(msg.starts_with("ERR Protocol error")),
            other => panic!("expected protocol error, got {:?}", other),
        }
        assert_eq!(read_reply(&mut stream, &mut buf).await, None);
    }

    #[tokio::test]
    async fn test_nesting_flood_leaves_server_running() {
        let server = start().await;

        // The server hangs up mid-upload, so write and read errors are expected.
        let mut flood = TcpStream::connect(server.local_addr()).await.unwrap();
        let _ = flood.write_all(&b"*1\r\n".repeat(2_000_000)).await;
        let mut sink = Vec::new();
        let _ = flood.read_to_end(&mut sink).await;

        let mut stream = TcpStream::connect(server.local_addr()).await.unwrap();
        let mut buf = BytesMut::new();
        assert_eq!(
            roundtrip(&mut stream, &mut buf, &["PING"]).await,
            Value::SimpleString("PONG".to_string())
        );
    }
}
