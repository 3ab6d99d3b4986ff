//! Redis string commands module
//!
//! Each command maps onto one operation of the string store.

pub mod get;
pub mod getset;
pub mod mget;
pub mod mset;
pub mod set;
pub mod setnx;

pub use get::GetCommand;
pub use getset::GetSetCommand;
pub use mget::MGetCommand;
pub use mset::MSetCommand;
pub use set::SetCommand;
pub use setnx::SetNxCommand;
