//! CN470-510 (470..510 MHz)
//!
//! 96 uplink channels and 48 downlink channels; RX1 downlink channel is the
//! uplink channel index modulo 48.
use super::*;
use crate::band::{Band, ChannelGrid, Rx1Rule, Timing};
use crate::constants::{BEACON_CODING_RATE, BEACON_PERIOD};

/// ID of the Chinese 470-510 MHz band.
pub const CN_470_510: &str = "CN_470_510";

const UPLINK: ChannelGrid = ChannelGrid::new(470_300_000, 200_000, 96);
const DOWNLINK: ChannelGrid = ChannelGrid::new(500_300_000, 200_000, 48);
const BEACON: ChannelGrid = ChannelGrid::new(508_300_000, 200_000, 8);

pub(crate) fn band() -> Band {
    Band {
        id: CN_470_510,

        uplink_channels: UPLINK.channels(0, 5),
        downlink_channels: DOWNLINK.channels(0, 5),

        duty_cycles: vec![DutyCycleRange {
            min_frequency: 470_000_000,
            max_frequency: 510_000_000,
            duty_cycle: 1.0,
        }],

        data_rates: data_rates(&[
            lora(12, Bandwidth::Khz125, (59, 51), (59, 51)),
            lora(11, Bandwidth::Khz125, (59, 51), (59, 51)),
            lora(10, Bandwidth::Khz125, (59, 51), (59, 51)),
            lora(9, Bandwidth::Khz125, (123, 115), (123, 115)),
            lora(8, Bandwidth::Khz125, (230, 222), (250, 242)),
            lora(7, Bandwidth::Khz125, (230, 222), (250, 242)),
        ]),

        timing: Timing::DEFAULT,

        default_max_eirp: 19.15,
        tx_offset: tx_offsets(7),
        max_tx_power_index: 7,

        rx1: Rx1Rule::Remapped {
            uplink: UPLINK,
            downlink: DOWNLINK,
        },
        default_rx2: Rx2Parameters {
            data_rate_index: 0,
            frequency: 505_300_000,
        },

        implements_cf_list: false,

        beacon: Beacon {
            data_rate_index: 2,
            coding_rate: BEACON_CODING_RATE,
            ping_slot_channels: (0..BEACON.count).map(|i| BEACON.frequency(i)).collect(),
            broadcast: BeaconChannelRule::Hopping {
                base: BEACON.first,
                step: BEACON.step,
                count: BEACON.count,
                period: BEACON_PERIOD,
            },
        },

        regional_parameters: SINCE_1_0_1,
    }
}
