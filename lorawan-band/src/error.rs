//! Error types for regional parameter lookups and computations.

use thiserror::Error;

use crate::types::RegionalParametersVersion;

/// Errors returned by band lookups and band computations.
///
/// All of these are configuration or input errors; none of them is worth
/// retrying with the same arguments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BandError {
    /// No band is registered under the given identifier.
    #[error("Band not found: {0}")]
    NotFound(String),

    /// The band exists but does not list the requested regional parameters revision.
    #[error("Band {band} is not defined for regional parameters {version}")]
    UnsupportedVersion {
        band: &'static str,
        version: RegionalParametersVersion,
    },

    /// The data rate index is out of range or refers to an RFU slot.
    #[error("Invalid data rate index: {0}")]
    InvalidDataRate(u8),

    /// The RX1 data rate offset is not allowed in this band.
    #[error("Invalid RX1 data rate offset: {0}")]
    InvalidRx1Offset(u8),

    /// The frequency does not belong to the band's channel plan.
    #[error("Frequency {0} Hz is not part of the channel plan")]
    InvalidFrequency(u32),
}
