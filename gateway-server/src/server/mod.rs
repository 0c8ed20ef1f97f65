//! Gateway-facing TCP transport.

pub mod connection;
pub mod listener;

pub use connection::{ConnectionError, Hello, TcpSession, TokenTable};
pub use listener::{Server, ServerConfig};
