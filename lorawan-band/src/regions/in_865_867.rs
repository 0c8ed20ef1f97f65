//! IN865-867 (865..867 MHz)
use super::*;
use crate::band::{Band, Rx1Rule, Timing};
use crate::constants::BEACON_CODING_RATE;

/// ID of the Indian 865-867 MHz band.
pub const IN_865_867: &str = "IN_865_867";

const RX2_FREQUENCY: u32 = 866_550_000;

pub(crate) fn band() -> Band {
    let channels = vec![
        Channel::new(865_062_500, 0, 5),
        Channel::new(865_402_500, 0, 5),
        Channel::new(865_985_000, 0, 5),
    ];

    Band {
        id: IN_865_867,

        uplink_channels: channels.clone(),
        downlink_channels: channels,

        duty_cycles: vec![DutyCycleRange {
            min_frequency: 865_000_000,
            max_frequency: 867_000_000,
            duty_cycle: 1.0,
        }],

        data_rates: data_rates(&[
            lora(12, Bandwidth::Khz125, (59, 51), (59, 51)),
            lora(11, Bandwidth::Khz125, (59, 51), (59, 51)),
            lora(10, Bandwidth::Khz125, (59, 51), (59, 51)),
            lora(9, Bandwidth::Khz125, (123, 115), (123, 115)),
            lora(8, Bandwidth::Khz125, (230, 222), (250, 242)),
            lora(7, Bandwidth::Khz125, (230, 222), (250, 242)),
            None, // RFU
            fsk(50_000, (230, 222), (250, 242)),
        ]),

        timing: Timing::DEFAULT,

        default_max_eirp: 30.0,
        tx_offset: tx_offsets(10),
        max_tx_power_index: 10,

        rx1: Rx1Rule::OffsetTable {
            max_data_rate: 5,
            dwell_time_min_data_rate: 0,
        },
        default_rx2: Rx2Parameters {
            data_rate_index: 2,
            frequency: RX2_FREQUENCY,
        },

        implements_cf_list: true,

        beacon: Beacon {
            data_rate_index: 4,
            coding_rate: BEACON_CODING_RATE,
            ping_slot_channels: vec![RX2_FREQUENCY],
            broadcast: BeaconChannelRule::Single(RX2_FREQUENCY),
        },

        regional_parameters: SINCE_1_0_2,
    }
}
