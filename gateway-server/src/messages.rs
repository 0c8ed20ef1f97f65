//! Frame envelopes exchanged with gateways.
//!
//! These carry already decoded radio metadata; the PHY payload itself is
//! opaque bytes handled by the MAC layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Everything a gateway reports in one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayUp {
    #[serde(default)]
    pub uplink_messages: Vec<UplinkMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_status: Option<GatewayStatus>,
}

impl GatewayUp {
    /// Whether the message carries neither uplinks nor a status report.
    pub fn is_empty(&self) -> bool {
        self.uplink_messages.is_empty() && self.gateway_status.is_none()
    }
}

/// A received radio frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UplinkMessage {
    pub raw_payload: Vec<u8>,
    pub settings: RxSettings,
    /// Received signal strength in dBm.
    pub rssi: f32,
    /// Signal to noise ratio in dB.
    pub snr: f32,
}

/// Radio settings an uplink was received with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RxSettings {
    /// Hz
    pub frequency: u32,
    pub data_rate_index: u8,
    /// Gateway concentrator timestamp in microseconds.
    pub timestamp: u32,
}

/// Periodic gateway status report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayStatus {
    /// Gateway local time, RFC 3339.
    pub time: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, f32>,
    #[serde(default)]
    pub versions: BTreeMap<String, String>,
}

/// A message to a gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayDown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downlink_message: Option<DownlinkMessage>,
}

impl GatewayDown {
    pub fn new(downlink_message: DownlinkMessage) -> Self {
        Self {
            downlink_message: Some(downlink_message),
        }
    }
}

/// A radio frame to transmit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownlinkMessage {
    pub raw_payload: Vec<u8>,
    pub settings: TxSettings,
}

/// Radio settings a downlink must be transmitted with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TxSettings {
    pub frequency: u32,
    pub data_rate_index: u8,
    /// dBm EIRP
    pub tx_power: f32,
    /// Concentrator timestamp to transmit at, in microseconds.
    pub timestamp: u32,
}
