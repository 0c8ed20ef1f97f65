//! AS923 (915..928 MHz)
//!
//! RX1 data rate depends on the downlink dwell time: with a 400 ms dwell time
//! limit the RX1 data rate never goes below DR2.
use super::*;
use crate::band::{Band, Rx1Rule, Timing};
use crate::constants::BEACON_CODING_RATE;

/// ID of the Asian 923 MHz band.
pub const AS_923: &str = "AS_923";

const BEACON_CHANNEL: u32 = 923_400_000;

pub(crate) fn band() -> Band {
    let channels = vec![Channel::new(923_200_000, 0, 5), Channel::new(923_400_000, 0, 5)];

    Band {
        id: AS_923,

        uplink_channels: channels.clone(),
        downlink_channels: channels,

        duty_cycles: vec![DutyCycleRange {
            min_frequency: 915_000_000,
            max_frequency: 928_000_000,
            duty_cycle: 0.01,
        }],

        data_rates: data_rates(&[
            lora(12, Bandwidth::Khz125, (59, 51), (59, 51)),
            lora(11, Bandwidth::Khz125, (59, 51), (59, 51)),
            lora(10, Bandwidth::Khz125, (59, 51), (59, 51)),
            lora(9, Bandwidth::Khz125, (123, 115), (123, 115)),
            lora(8, Bandwidth::Khz125, (230, 222), (250, 242)),
            lora(7, Bandwidth::Khz125, (230, 222), (250, 242)),
            lora(7, Bandwidth::Khz250, (230, 222), (250, 242)),
            fsk(50_000, (230, 222), (250, 242)),
        ]),

        timing: Timing::DEFAULT,

        default_max_eirp: 16.0,
        tx_offset: tx_offsets(7),
        max_tx_power_index: 7,

        rx1: Rx1Rule::OffsetTable {
            max_data_rate: 5,
            dwell_time_min_data_rate: 2,
        },
        default_rx2: Rx2Parameters {
            data_rate_index: 2,
            frequency: 923_200_000,
        },

        implements_cf_list: true,

        beacon: Beacon {
            data_rate_index: 3,
            coding_rate: BEACON_CODING_RATE,
            ping_slot_channels: vec![BEACON_CHANNEL],
            broadcast: BeaconChannelRule::Single(BEACON_CHANNEL),
        },

        regional_parameters: SINCE_1_0_2,
    }
}
