//! Redis protocol implementation
//!
//! This module provides RESP (REdis Serialization Protocol) parsing and
//! Redis command handling.

pub mod command;
pub mod keyspace;
pub mod ping;
pub mod resp;
pub mod string;

pub use command::{CommandError, CommandFactory};
pub use resp::{Parser, ProtocolError, Value};
