//! Value types shared by every band definition.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of data rate slots in every band, used or not.
pub const NUM_DATA_RATES: usize = 16;

/// Number of TXPower steps addressable by LinkADRReq.
pub const NUM_TX_POWER_STEPS: usize = 16;

/// A radio channel: center frequency and the data rates allowed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Center frequency in Hz.
    pub frequency: u32,
    /// Data rate indexes allowed on this channel.
    pub data_rate_indexes: Vec<u8>,
}

impl Channel {
    /// Create a channel allowing every data rate in `min_dr..=max_dr`.
    pub fn new(frequency: u32, min_dr: u8, max_dr: u8) -> Self {
        Self {
            frequency,
            data_rate_indexes: (min_dr..=max_dr).collect(),
        }
    }

    /// Check whether the data rate index is allowed on this channel.
    pub fn supports(&self, data_rate_index: u8) -> bool {
        self.data_rate_indexes.contains(&data_rate_index)
    }
}

/// LoRa channel bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bandwidth {
    Khz125,
    Khz250,
    Khz500,
}

impl Bandwidth {
    /// Bandwidth in Hz.
    pub fn hz(self) -> u32 {
        match self {
            Self::Khz125 => 125_000,
            Self::Khz250 => 250_000,
            Self::Khz500 => 500_000,
        }
    }

    fn from_khz(khz: u32) -> Option<Self> {
        match khz {
            125 => Some(Self::Khz125),
            250 => Some(Self::Khz250),
            500 => Some(Self::Khz500),
            _ => None,
        }
    }
}

/// Modulation parameters of a data rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modulation {
    /// LoRa chirp spread spectrum.
    LoRa {
        spreading_factor: u8,
        bandwidth: Bandwidth,
    },
    /// Frequency shift keying.
    Fsk { bit_rate: u32 },
}

impl fmt::Display for Modulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoRa {
                spreading_factor,
                bandwidth,
            } => write!(f, "SF{}BW{}", spreading_factor, bandwidth.hz() / 1000),
            Self::Fsk { bit_rate } => write!(f, "{}", bit_rate),
        }
    }
}

impl FromStr for Modulation {
    type Err = String;

    /// Parse `SF7BW125` style LoRa data rates or a bare FSK bit rate.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(bit_rate) = s.parse::<u32>() {
            return Ok(Self::Fsk { bit_rate });
        }
        let rest = s
            .strip_prefix("SF")
            .ok_or_else(|| format!("invalid data rate: {}", s))?;
        let (sf, bw) = rest
            .split_once("BW")
            .ok_or_else(|| format!("invalid data rate: {}", s))?;
        let spreading_factor: u8 = sf.parse().map_err(|_| format!("invalid spreading factor: {}", sf))?;
        if !(5..=12).contains(&spreading_factor) {
            return Err(format!("invalid spreading factor: {}", sf));
        }
        let bandwidth = bw
            .parse::<u32>()
            .ok()
            .and_then(Bandwidth::from_khz)
            .ok_or_else(|| format!("invalid bandwidth: {}", bw))?;
        Ok(Self::LoRa {
            spreading_factor,
            bandwidth,
        })
    }
}

/// Maximum payload sizes for one data rate, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxPayloadSize {
    /// Maximum MACPayload size (M).
    pub mac_payload: u16,
    /// Maximum FRMPayload size when FOpts is empty (N).
    pub frm_payload: u16,
}

impl MaxPayloadSize {
    pub const fn new(mac_payload: u16, frm_payload: u16) -> Self {
        Self {
            mac_payload,
            frm_payload,
        }
    }

    /// Field-wise minimum of two limits.
    pub fn min(self, other: Self) -> Self {
        Self {
            mac_payload: self.mac_payload.min(other.mac_payload),
            frm_payload: self.frm_payload.min(other.frm_payload),
        }
    }
}

/// One used slot of a band's data rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRate {
    pub modulation: Modulation,
    /// Limits when the end device must stay compatible with a repeater.
    pub repeater_max_size: MaxPayloadSize,
    /// Limits when no repeater is on the path.
    pub no_repeater_max_size: MaxPayloadSize,
}

/// A regulated frequency range and its maximum on-air time fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DutyCycleRange {
    /// Lowest frequency of the range (inclusive), in Hz.
    pub min_frequency: u32,
    /// Highest frequency of the range (exclusive), in Hz.
    pub max_frequency: u32,
    /// Maximum fraction of time a transmitter may occupy the range.
    pub duty_cycle: f32,
}

impl DutyCycleRange {
    pub fn contains(&self, frequency: u32) -> bool {
        self.min_frequency <= frequency && frequency < self.max_frequency
    }
}

/// Result of a duty cycle lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DutyCycleLimit {
    /// The frequency is outside every regulated range.
    Unrestricted,
    /// The frequency falls in a range limited to this fraction of on-air time.
    Fraction(f32),
}

impl DutyCycleLimit {
    /// The limit as a fraction, 1.0 when unrestricted.
    pub fn fraction(self) -> f32 {
        match self {
            Self::Unrestricted => 1.0,
            Self::Fraction(f) => f,
        }
    }
}

/// RX2 window data rate and frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rx2Parameters {
    pub data_rate_index: u8,
    pub frequency: u32,
}

/// How the beacon broadcast channel is chosen over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconChannelRule {
    /// The band has a single beacon channel.
    Single(u32),
    /// The beacon hops over `count` channels spaced by `step` Hz, moving to the
    /// next one every `period`.
    Hopping {
        base: u32,
        step: u32,
        count: u32,
        period: Duration,
    },
}

impl BeaconChannelRule {
    /// Frequency of the broadcast channel `elapsed` after the beacon epoch.
    pub fn channel(&self, elapsed: Duration) -> u32 {
        match *self {
            Self::Single(frequency) => frequency,
            Self::Hopping {
                base,
                step,
                count,
                period,
            } => {
                let slot = elapsed.as_secs() / period.as_secs().max(1);
                base + step * (slot % u64::from(count)) as u32
            }
        }
    }
}

/// Class B beacon layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Beacon {
    pub data_rate_index: u8,
    pub coding_rate: &'static str,
    pub ping_slot_channels: Vec<u32>,
    pub broadcast: BeaconChannelRule,
}

/// LoRaWAN Regional Parameters revisions a band can be valid under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RegionalParametersVersion {
    /// LoRaWAN 1.0
    V1_0,
    /// LoRaWAN 1.0.1
    V1_0_1,
    /// Regional Parameters 1.0.2 revision A
    V1_0_2,
    /// Regional Parameters 1.0.2 revision B
    V1_0_2RevB,
    /// Regional Parameters 1.1 revision A
    V1_1RevA,
}

impl RegionalParametersVersion {
    pub const ALL: [Self; 5] = [
        Self::V1_0,
        Self::V1_0_1,
        Self::V1_0_2,
        Self::V1_0_2RevB,
        Self::V1_1RevA,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1_0 => "1.0",
            Self::V1_0_1 => "1.0.1",
            Self::V1_0_2 => "1.0.2-a",
            Self::V1_0_2RevB => "1.0.2-b",
            Self::V1_1RevA => "1.1-a",
        }
    }
}

impl fmt::Display for RegionalParametersVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegionalParametersVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.0" => Ok(Self::V1_0),
            "1.0.1" => Ok(Self::V1_0_1),
            "1.0.2" | "1.0.2-a" => Ok(Self::V1_0_2),
            "1.0.2-b" => Ok(Self::V1_0_2RevB),
            "1.1" | "1.1-a" => Ok(Self::V1_1RevA),
            _ => Err(format!("unknown regional parameters version: {}", s)),
        }
    }
}
