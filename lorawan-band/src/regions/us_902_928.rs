//! US902-928 (902..928 MHz)
//!
//! 64 uplink channels of 125 kHz, 8 uplink channels of 500 kHz and 8 downlink
//! channels of 500 kHz. RX1 downlink channel is the uplink channel index modulo 8.
use super::*;
use crate::band::{Band, ChannelGrid, Rx1Rule, Timing};
use crate::constants::{BEACON_CODING_RATE, BEACON_PERIOD};

/// ID of the United States 902-928 MHz band.
pub const US_902_928: &str = "US_902_928";

const MAX_EIRP: f32 = 30.0;

const UPLINK_125: ChannelGrid = ChannelGrid::new(902_300_000, 200_000, 64);
const UPLINK_500: ChannelGrid = ChannelGrid::new(903_000_000, 1_600_000, 8);
const DOWNLINK: ChannelGrid = ChannelGrid::new(923_300_000, 600_000, 8);

// [uplink DR][RX1DROffset]
const RX1_DATA_RATES: &[&[u8]] = &[
    &[10, 9, 8, 8],
    &[11, 10, 9, 8],
    &[12, 11, 10, 9],
    &[13, 12, 11, 10],
    &[13, 13, 12, 11],
];

pub(crate) fn band() -> Band {
    let mut uplink_channels = UPLINK_125.channels(0, 3);
    uplink_channels.extend(UPLINK_500.channels(4, 4));

    Band {
        id: US_902_928,

        uplink_channels,
        downlink_channels: DOWNLINK.channels(8, 13),

        duty_cycles: vec![DutyCycleRange {
            min_frequency: 902_000_000,
            max_frequency: 928_000_000,
            duty_cycle: 1.0,
        }],

        data_rates: data_rates(&[
            lora(10, Bandwidth::Khz125, (19, 11), (19, 11)),
            lora(9, Bandwidth::Khz125, (61, 53), (61, 53)),
            lora(8, Bandwidth::Khz125, (133, 125), (133, 125)),
            lora(7, Bandwidth::Khz125, (250, 242), (250, 242)),
            lora(8, Bandwidth::Khz500, (250, 242), (250, 242)),
            None,
            None,
            None,
            lora(12, Bandwidth::Khz500, (41, 33), (61, 53)),
            lora(11, Bandwidth::Khz500, (117, 109), (137, 129)),
            lora(10, Bandwidth::Khz500, (230, 222), (250, 242)),
            lora(9, Bandwidth::Khz500, (230, 222), (250, 242)),
            lora(8, Bandwidth::Khz500, (230, 222), (250, 242)),
            lora(7, Bandwidth::Khz500, (230, 222), (250, 242)),
        ]),

        timing: Timing::DEFAULT,

        default_max_eirp: MAX_EIRP,
        tx_offset: tx_offsets(14),
        max_tx_power_index: 14,

        rx1: Rx1Rule::FixedChannelPlan {
            data_rates: RX1_DATA_RATES,
            uplink: &[UPLINK_125, UPLINK_500],
            downlink: DOWNLINK,
        },
        default_rx2: Rx2Parameters {
            data_rate_index: 8,
            frequency: 923_300_000,
        },

        implements_cf_list: false,

        beacon: Beacon {
            data_rate_index: 8,
            coding_rate: BEACON_CODING_RATE,
            ping_slot_channels: (0..DOWNLINK.count).map(|i| DOWNLINK.frequency(i)).collect(),
            broadcast: BeaconChannelRule::Hopping {
                base: DOWNLINK.first,
                step: DOWNLINK.step,
                count: DOWNLINK.count,
                period: BEACON_PERIOD,
            },
        },

        regional_parameters: SINCE_1_0,
    }
}
