//! The transport-facing side of a gateway link.

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::messages::{GatewayDown, GatewayUp};

/// Errors reported by a gateway session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The gateway declined the downlink.
    #[error("Rejected by gateway: {0}")]
    Rejected(String),

    /// The session has been closed.
    #[error("Session closed")]
    Closed,

    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// One connected gateway as seen by the pool.
///
/// `recv_uplink` is only ever polled by the link's receive task, `send_downlink`
/// may be called concurrently from any number of senders. Cancelling the token
/// returned by `context` closes the session.
pub trait GatewaySession: Send + Sync + 'static {
    /// Wait for the next message from the gateway.
    fn recv_uplink(&self) -> BoxFuture<'_, Result<GatewayUp, SessionError>>;

    /// Hand a message to the gateway and wait for it to be accepted or refused.
    fn send_downlink(&self, down: GatewayDown) -> BoxFuture<'_, Result<(), SessionError>>;

    /// Cancellation signal governing the session's lifetime.
    fn context(&self) -> CancellationToken;
}
