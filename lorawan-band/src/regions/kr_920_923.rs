//! KR920-923 (920..923 MHz)
use super::*;
use crate::band::{Band, Rx1Rule, Timing};
use crate::constants::BEACON_CODING_RATE;

/// ID of the Korean frequency plan.
pub const KR_920_923: &str = "KR_920_923";

const BEACON_CHANNEL: u32 = 923_100_000;

pub(crate) fn band() -> Band {
    let channels = vec![
        Channel::new(922_100_000, 0, 5),
        Channel::new(922_300_000, 0, 5),
        Channel::new(922_500_000, 0, 5),
    ];

    Band {
        id: KR_920_923,

        uplink_channels: channels.clone(),
        downlink_channels: channels,

        duty_cycles: vec![DutyCycleRange {
            min_frequency: 920_000_000,
            max_frequency: 923_000_000,
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

        default_max_eirp: 14.0,
        tx_offset: tx_offsets(7),
        max_tx_power_index: 7,

        rx1: Rx1Rule::SameChannel,
        default_rx2: Rx2Parameters {
            data_rate_index: 0,
            frequency: 921_900_000,
        },

        implements_cf_list: true,

        beacon: Beacon {
            data_rate_index: 3,
            coding_rate: BEACON_CODING_RATE,
            ping_slot_channels: vec![BEACON_CHANNEL],
            broadcast: BeaconChannelRule::Single(BEACON_CHANNEL),
        },

        // No LoRaWAN 1.0 or 1.0.1
        regional_parameters: &[V1_0_2, V1_1RevA],
    }
}
