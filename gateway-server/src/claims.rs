//! Authorization claims presented by a connecting party.

use serde::{Deserialize, Serialize};

use crate::gateway::GatewayId;

/// Rights that can be granted to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Right {
    UserInfo,
    ApplicationInfo,
    ApplicationTrafficRead,
    ApplicationTrafficDownWrite,
    GatewayInfo,
    /// Connect as the gateway and exchange traffic.
    GatewayLink,
    GatewaySettingsBasic,
    OrganizationInfo,
}

/// The entity a claim is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityIdentifiers {
    User(String),
    Application(String),
    Gateway(GatewayId),
    Organization(String),
}

/// A claim to act on behalf of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub entity: EntityIdentifiers,
    /// Where the claim came from, e.g. `"token"`.
    pub source: String,
    pub rights: Vec<Right>,
}

/// Error returned when a claim does not cover a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimsError {
    #[error("Claims are not for gateway {0}")]
    WrongEntity(GatewayId),

    #[error("Missing rights {missing:?}")]
    MissingRights { missing: Vec<Right> },
}

impl Claims {
    pub fn new(entity: EntityIdentifiers, source: impl Into<String>, rights: Vec<Right>) -> Self {
        Self {
            entity,
            source: source.into(),
            rights,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match &self.entity {
            EntityIdentifiers::User(id) => Some(id),
            _ => None,
        }
    }

    pub fn application_id(&self) -> Option<&str> {
        match &self.entity {
            EntityIdentifiers::Application(id) => Some(id),
            _ => None,
        }
    }

    pub fn gateway_id(&self) -> Option<&GatewayId> {
        match &self.entity {
            EntityIdentifiers::Gateway(id) => Some(id),
            _ => None,
        }
    }

    pub fn organization_id(&self) -> Option<&str> {
        match &self.entity {
            EntityIdentifiers::Organization(id) => Some(id),
            _ => None,
        }
    }

    /// True only if every one of `rights` is held. An empty request is always granted.
    pub fn has_rights(&self, rights: &[Right]) -> bool {
        rights.iter().all(|right| self.rights.contains(right))
    }

    /// Check that these claims allow `rights` on the gateway `gateway_id`.
    pub fn require_gateway(&self, gateway_id: &GatewayId, rights: &[Right]) -> Result<(), ClaimsError> {
        if self.gateway_id() != Some(gateway_id) {
            return Err(ClaimsError::WrongEntity(gateway_id.clone()));
        }
        let missing: Vec<Right> = rights
            .iter()
            .copied()
            .filter(|right| !self.rights.contains(right))
            .collect();
        if !missing.is_empty() {
            return Err(ClaimsError::MissingRights { missing });
        }
        Ok(())
    }
}
