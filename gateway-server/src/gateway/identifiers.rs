//! Gateway identifiers and the frequency plan reference a gateway declares.

use std::fmt;
use std::str::FromStr;

use lorawan_band::{Band, BandError};
use serde::{Deserialize, Serialize};

/// The identifier was empty or contained whitespace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid gateway ID: {0:?}")]
pub struct InvalidGatewayId(pub String);

/// Gateway identifier, the routing key of the pool.
///
/// Always non-empty and free of whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GatewayId(String);

impl GatewayId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidGatewayId> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(InvalidGatewayId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GatewayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GatewayId {
    type Err = InvalidGatewayId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for GatewayId {
    type Error = InvalidGatewayId;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<GatewayId> for String {
    fn from(id: GatewayId) -> Self {
        id.0
    }
}

/// The region plan a gateway operates under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrequencyPlan {
    pub band_id: String,
}

impl FrequencyPlan {
    pub fn new(band_id: impl Into<String>) -> Self {
        Self {
            band_id: band_id.into(),
        }
    }

    /// Resolve the plan against the band registry.
    pub fn band(&self) -> Result<&'static Band, BandError> {
        lorawan_band::get(&self.band_id)
    }
}
