//! EU433 (433.05..434.79 MHz)
use super::*;
use crate::band::{Band, Rx1Rule, Timing};
use crate::constants::BEACON_CODING_RATE;

/// ID of the European 433 MHz band.
pub const EU_433: &str = "EU_433";

const RX2_FREQUENCY: u32 = 434_665_000;

pub(crate) fn band() -> Band {
    let channels = vec![
        Channel::new(433_175_000, 0, 5),
        Channel::new(433_375_000, 0, 5),
        Channel::new(433_575_000, 0, 5),
    ];

    Band {
        id: EU_433,

        uplink_channels: channels.clone(),
        downlink_channels: channels,

        duty_cycles: vec![DutyCycleRange {
            min_frequency: 433_050_000,
            max_frequency: 434_790_000,
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

        default_max_eirp: 12.15,
        tx_offset: tx_offsets(5),
        max_tx_power_index: 5,

        rx1: Rx1Rule::SameChannel,
        default_rx2: Rx2Parameters {
            data_rate_index: 0,
            frequency: RX2_FREQUENCY,
        },

        implements_cf_list: true,

        beacon: Beacon {
            data_rate_index: 3,
            coding_rate: BEACON_CODING_RATE,
            ping_slot_channels: vec![RX2_FREQUENCY],
            broadcast: BeaconChannelRule::Single(RX2_FREQUENCY),
        },

        regional_parameters: SINCE_1_0,
    }
}
