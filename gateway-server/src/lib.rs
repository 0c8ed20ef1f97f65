//! Gateway traffic core of a LoRaWAN network server.
//!
//! The [`gateway::Pool`] tracks which gateways are reachable, hands their
//! uplinks to the network server and routes downlinks back to the one session
//! currently representing each gateway. Regional radio parameters come from
//! the `lorawan-band` crate.

pub mod claims;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod messages;
pub mod server;
