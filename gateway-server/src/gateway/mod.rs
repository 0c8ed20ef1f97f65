//! Gateway link management.
//!
//! A gateway connects through some transport, which wraps the connection in a
//! [`GatewaySession`] and registers it with the [`Pool`]. The pool runs one
//! receive task per link, feeding the link's [`UplinkStream`], and routes
//! downlinks to the session currently registered for a gateway.

mod identifiers;
mod link;
mod pool;
mod session;

#[cfg(test)]
pub(crate) mod mock;

pub use identifiers::{FrequencyPlan, GatewayId, InvalidGatewayId};
pub use link::{LinkInfo, LinkState, UplinkStream};
pub use pool::{Pool, PoolConfig, PoolError};
pub use session::{GatewaySession, SessionError};
