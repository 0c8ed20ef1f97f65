//! EU863-870 (863..870 MHz)
use super::*;
use crate::band::{Band, Rx1Rule, Timing};
use crate::constants::BEACON_CODING_RATE;

/// ID of the European 863-870 MHz band.
pub const EU_863_870: &str = "EU_863_870";

const MAX_EIRP: f32 = 16.0;
const RX2_FREQUENCY: u32 = 869_525_000;

pub(crate) fn band() -> Band {
    let channels = vec![
        Channel::new(868_100_000, 0, 5),
        Channel::new(868_300_000, 0, 5),
        Channel::new(868_500_000, 0, 5),
    ];

    Band {
        id: EU_863_870,

        uplink_channels: channels.clone(),
        downlink_channels: channels,

        // ETSI EN 300 220 sub-bands
        duty_cycles: vec![
            DutyCycleRange { min_frequency: 863_000_000, max_frequency: 865_000_000, duty_cycle: 0.001 },
            DutyCycleRange { min_frequency: 865_000_000, max_frequency: 868_000_000, duty_cycle: 0.01 },
            DutyCycleRange { min_frequency: 868_000_000, max_frequency: 868_600_000, duty_cycle: 0.01 },
            DutyCycleRange { min_frequency: 868_700_000, max_frequency: 869_200_000, duty_cycle: 0.001 },
            DutyCycleRange { min_frequency: 869_400_000, max_frequency: 869_650_000, duty_cycle: 0.1 },
            DutyCycleRange { min_frequency: 869_700_000, max_frequency: 870_000_000, duty_cycle: 0.01 },
        ],

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

        default_max_eirp: MAX_EIRP,
        tx_offset: tx_offsets(7),
        max_tx_power_index: 7,

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

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_rx1_same_channel() {
        let band = band();
        assert_eq!(band.compute_rx1(868_300_000, 5, 0, false), Ok((5, 868_300_000)));
        assert_eq!(band.compute_rx1(868_300_000, 5, 2, false), Ok((3, 868_300_000)));
        assert_eq!(band.compute_rx1(868_300_000, 1, 5, false), Ok((0, 868_300_000)));
    }

    #[test]
    fn test_duty_cycle_sub_bands() {
        let band = band();
        assert_eq!(band.duty_cycle_for(868_100_000), DutyCycleLimit::Fraction(0.01));
        assert_eq!(band.duty_cycle_for(869_525_000), DutyCycleLimit::Fraction(0.1));
        assert_eq!(band.duty_cycle_for(864_000_000), DutyCycleLimit::Fraction(0.001));
        // Gap between 868.6 and 868.7 MHz
        assert_eq!(band.duty_cycle_for(868_650_000), DutyCycleLimit::Unrestricted);
        assert_eq!(band.duty_cycle_for(915_000_000), DutyCycleLimit::Unrestricted);
    }

    #[test]
    fn test_tx_power_steps() {
        let band = band();
        assert_eq!(band.tx_power(0), Some(16.0));
        assert_eq!(band.tx_power(7), Some(2.0));
        assert_eq!(band.tx_power(8), None);
    }

    #[test]
    fn test_beacon_is_constant() {
        let band = band();
        assert_eq!(band.beacon_channel(Duration::ZERO), RX2_FREQUENCY);
        assert_eq!(band.beacon_channel(Duration::from_secs(10_000)), RX2_FREQUENCY);
    }
}
