//! The immutable per-region parameter set and the pure computations over it.

use std::time::Duration;

use crate::constants::*;
use crate::error::BandError;
use crate::types::*;

/// Receive window and MAC timing constants of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub receive_delay_1: Duration,
    pub receive_delay_2: Duration,
    pub join_accept_delay_1: Duration,
    pub join_accept_delay_2: Duration,
    pub max_fcnt_gap: u32,
    pub adr_ack_limit: u16,
    pub adr_ack_delay: u16,
    pub min_ack_timeout: Duration,
    pub max_ack_timeout: Duration,
}

impl Timing {
    /// Timing used by every band currently defined.
    pub const DEFAULT: Timing = Timing {
        receive_delay_1: RECEIVE_DELAY_1,
        receive_delay_2: RECEIVE_DELAY_2,
        join_accept_delay_1: JOIN_ACCEPT_DELAY_1,
        join_accept_delay_2: JOIN_ACCEPT_DELAY_2,
        max_fcnt_gap: MAX_FCNT_GAP,
        adr_ack_limit: ADR_ACK_LIMIT,
        adr_ack_delay: ADR_ACK_DELAY,
        min_ack_timeout: Duration::from_secs(ACK_TIMEOUT.as_secs() - ACK_TIMEOUT_MARGIN.as_secs()),
        max_ack_timeout: Duration::from_secs(ACK_TIMEOUT.as_secs() + ACK_TIMEOUT_MARGIN.as_secs()),
    };
}

/// Evenly spaced block of channels: `first + step * i` for `i < count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelGrid {
    pub first: u32,
    pub step: u32,
    pub count: u32,
}

impl ChannelGrid {
    pub const fn new(first: u32, step: u32, count: u32) -> Self {
        Self { first, step, count }
    }

    /// Index of `frequency` within this grid. A grid with step 0 holds at most
    /// the single channel at `first`.
    pub fn index_of(&self, frequency: u32) -> Option<u32> {
        let delta = frequency.checked_sub(self.first)?;
        if self.step == 0 {
            return (delta == 0 && self.count > 0).then_some(0);
        }
        if delta % self.step != 0 {
            return None;
        }
        let index = delta / self.step;
        (index < self.count).then_some(index)
    }

    /// Frequency of channel `index`.
    pub fn frequency(&self, index: u32) -> u32 {
        self.first + self.step * index
    }

    /// All channels of the grid, each allowing `min_dr..=max_dr`.
    pub fn channels(&self, min_dr: u8, max_dr: u8) -> Vec<Channel> {
        (0..self.count)
            .map(|i| Channel::new(self.frequency(i), min_dr, max_dr))
            .collect()
    }
}

/// Index of `frequency` in the concatenation of `grids`.
fn channel_index(grids: &[ChannelGrid], frequency: u32) -> Option<u32> {
    let mut first_index = 0;
    for grid in grids {
        if let Some(index) = grid.index_of(frequency) {
            return Some(first_index + index);
        }
        first_index += grid.count;
    }
    None
}

/// Region specific rule mapping an uplink to its RX1 downlink parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rx1Rule {
    /// Downlink on the uplink frequency, data rate lowered by the offset.
    SameChannel,
    /// Effective offsets 6 and 7 raise the data rate by 1 and 2. The result is
    /// kept within `[min, max_data_rate]` where `min` is `dwell_time_min_data_rate`
    /// when the downlink dwell time is limited and 0 otherwise.
    OffsetTable {
        max_data_rate: u8,
        dwell_time_min_data_rate: u8,
    },
    /// Fixed channel plans: data rate from a `[uplink DR][offset]` table,
    /// downlink channel `uplink channel index % downlink.count`.
    FixedChannelPlan {
        data_rates: &'static [&'static [u8]],
        uplink: &'static [ChannelGrid],
        downlink: ChannelGrid,
    },
    /// Same data rate rule as [`Rx1Rule::SameChannel`], downlink channel
    /// `uplink channel index % downlink.count`.
    Remapped {
        uplink: ChannelGrid,
        downlink: ChannelGrid,
    },
}

/// Immutable regional parameter set.
///
/// Bands are built once per process and only handed out as `&'static Band`.
#[derive(Debug, Clone)]
pub struct Band {
    pub id: &'static str,

    pub uplink_channels: Vec<Channel>,
    pub downlink_channels: Vec<Channel>,

    /// Regulated ranges, searched in order.
    pub duty_cycles: Vec<DutyCycleRange>,

    pub data_rates: [Option<DataRate>; NUM_DATA_RATES],

    pub timing: Timing,

    /// Default maximum EIRP in dBm.
    pub default_max_eirp: f32,
    /// Offset to the maximum EIRP in dB, per TXPower step.
    pub tx_offset: [f32; NUM_TX_POWER_STEPS],
    /// Highest TXPower step defined by the band.
    pub max_tx_power_index: u8,

    pub rx1: Rx1Rule,
    pub default_rx2: Rx2Parameters,

    /// Whether a join-accept may carry a CFList.
    pub implements_cf_list: bool,

    pub beacon: Beacon,

    /// Regional parameters revisions this definition is valid under.
    pub regional_parameters: &'static [RegionalParametersVersion],
}

impl Band {
    /// Get a used data rate slot.
    pub fn data_rate(&self, index: u8) -> Option<&DataRate> {
        self.data_rates.get(index as usize)?.as_ref()
    }

    /// Find the lowest index whose modulation matches.
    pub fn find_data_rate(&self, modulation: &Modulation) -> Option<u8> {
        self.data_rates
            .iter()
            .position(|dr| dr.as_ref().map(|dr| &dr.modulation) == Some(modulation))
            .map(|i| i as u8)
    }

    /// Lowest data rate index that is not RFU.
    pub fn lowest_data_rate_index(&self) -> u8 {
        self.data_rates
            .iter()
            .position(Option::is_some)
            .unwrap_or(0) as u8
    }

    /// Whether this definition is valid under the given revision.
    pub fn supports(&self, version: RegionalParametersVersion) -> bool {
        self.regional_parameters.contains(&version)
    }

    /// Compute the RX1 data rate index and frequency for an uplink.
    ///
    /// The returned data rate index is never below [`Band::lowest_data_rate_index`].
    pub fn compute_rx1(
        &self,
        frequency: u32,
        data_rate_index: u8,
        rx1_offset: u8,
        dwell_time_limited: bool,
    ) -> Result<(u8, u32), BandError> {
        if self.data_rate(data_rate_index).is_none() {
            return Err(BandError::InvalidDataRate(data_rate_index));
        }
        let lowest = self.lowest_data_rate_index();

        match self.rx1 {
            Rx1Rule::SameChannel => {
                let dr = data_rate_index.saturating_sub(rx1_offset).max(lowest);
                Ok((dr, frequency))
            }
            Rx1Rule::OffsetTable {
                max_data_rate,
                dwell_time_min_data_rate,
            } => {
                let effective_offset: i16 = match rx1_offset {
                    0..=5 => i16::from(rx1_offset),
                    6 => -1,
                    7 => -2,
                    _ => return Err(BandError::InvalidRx1Offset(rx1_offset)),
                };
                let min = if dwell_time_limited {
                    dwell_time_min_data_rate
                } else {
                    0
                }
                .max(lowest);
                let dr = (i16::from(data_rate_index) - effective_offset)
                    .clamp(i16::from(min), i16::from(max_data_rate));
                Ok((dr as u8, frequency))
            }
            Rx1Rule::FixedChannelPlan {
                data_rates,
                uplink,
                downlink,
            } => {
                let row = data_rates
                    .get(data_rate_index as usize)
                    .ok_or(BandError::InvalidDataRate(data_rate_index))?;
                let dr = *row
                    .get(rx1_offset as usize)
                    .ok_or(BandError::InvalidRx1Offset(rx1_offset))?;
                let channel =
                    channel_index(uplink, frequency).ok_or(BandError::InvalidFrequency(frequency))?;
                let channel = channel
                    .checked_rem(downlink.count)
                    .ok_or(BandError::InvalidFrequency(frequency))?;
                Ok((dr.max(lowest), downlink.frequency(channel)))
            }
            Rx1Rule::Remapped { uplink, downlink } => {
                let channel = uplink
                    .index_of(frequency)
                    .ok_or(BandError::InvalidFrequency(frequency))?;
                let dr = data_rate_index.saturating_sub(rx1_offset).max(lowest);
                let channel = channel
                    .checked_rem(downlink.count)
                    .ok_or(BandError::InvalidFrequency(frequency))?;
                Ok((dr, downlink.frequency(channel)))
            }
        }
    }

    /// Maximum payload size at a data rate.
    ///
    /// When `repeater_compatible` is set, the smaller of the two published
    /// limits is returned.
    pub fn max_payload_size(
        &self,
        data_rate_index: u8,
        repeater_compatible: bool,
    ) -> Result<MaxPayloadSize, BandError> {
        let dr = self
            .data_rate(data_rate_index)
            .ok_or(BandError::InvalidDataRate(data_rate_index))?;
        if repeater_compatible {
            Ok(dr.repeater_max_size.min(dr.no_repeater_max_size))
        } else {
            Ok(dr.no_repeater_max_size)
        }
    }

    /// Duty cycle limit of the first regulated range containing `frequency`.
    pub fn duty_cycle_for(&self, frequency: u32) -> DutyCycleLimit {
        self.duty_cycles
            .iter()
            .find(|range| range.contains(frequency))
            .map(|range| DutyCycleLimit::Fraction(range.duty_cycle))
            .unwrap_or(DutyCycleLimit::Unrestricted)
    }

    /// Beacon broadcast frequency `elapsed` after the beacon epoch.
    pub fn beacon_channel(&self, elapsed: Duration) -> u32 {
        self.beacon.broadcast.channel(elapsed)
    }

    /// Default RX2 data rate index and frequency.
    pub fn default_rx2(&self) -> (u8, u32) {
        (self.default_rx2.data_rate_index, self.default_rx2.frequency)
    }

    /// Transmit power in dBm EIRP for a TXPower step.
    pub fn tx_power(&self, step: u8) -> Option<f32> {
        if step > self.max_tx_power_index {
            return None;
        }
        Some(self.default_max_eirp + self.tx_offset[step as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_grid_index() {
        let grid = ChannelGrid::new(902_300_000, 200_000, 64);
        assert_eq!(grid.index_of(902_300_000), Some(0));
        assert_eq!(grid.index_of(902_500_000), Some(1));
        assert_eq!(grid.index_of(914_900_000), Some(63));
        assert_eq!(grid.index_of(915_100_000), None);
        assert_eq!(grid.index_of(902_400_000), None);
        assert_eq!(grid.index_of(902_000_000), None);
        assert_eq!(grid.frequency(63), 914_900_000);
    }

    #[test]
    fn test_degenerate_grids_do_not_panic() {
        let single = ChannelGrid::new(923_300_000, 0, 8);
        assert_eq!(single.index_of(923_300_000), Some(0));
        assert_eq!(single.index_of(923_500_000), None);
        assert_eq!(single.index_of(923_100_000), None);

        let empty = ChannelGrid::new(923_300_000, 0, 0);
        assert_eq!(empty.index_of(923_300_000), None);
        assert_eq!(ChannelGrid::new(923_300_000, 600_000, 0).index_of(923_300_000), None);
        assert!(empty.channels(0, 5).is_empty());
    }

    #[test]
    fn test_channel_index_spans_grids() {
        let grids = [
            ChannelGrid::new(902_300_000, 200_000, 64),
            ChannelGrid::new(903_000_000, 1_600_000, 8),
        ];
        assert_eq!(channel_index(&grids, 902_300_000), Some(0));
        assert_eq!(channel_index(&grids, 903_000_000), Some(64));
        assert_eq!(channel_index(&grids, 914_200_000), Some(71));
        assert_eq!(channel_index(&grids, 920_000_000), None);
    }

    #[test]
    fn test_default_timing() {
        let timing = Timing::DEFAULT;
        assert_eq!(timing.receive_delay_2, timing.receive_delay_1 + Duration::from_secs(1));
        assert_eq!(timing.min_ack_timeout, Duration::from_secs(1));
        assert_eq!(timing.max_ack_timeout, Duration::from_secs(3));
    }
}
