//! Band definitions, one module per region.

use crate::types::*;

mod as_923;
mod au_915_928;
mod cn_470_510;
mod eu_433;
mod eu_863_870;
mod in_865_867;
mod kr_920_923;
mod us_902_928;

pub use as_923::AS_923;
pub use au_915_928::AU_915_928;
pub use cn_470_510::CN_470_510;
pub use eu_433::EU_433;
pub use eu_863_870::EU_863_870;
pub use in_865_867::IN_865_867;
pub use kr_920_923::KR_920_923;
pub use us_902_928::US_902_928;

use crate::band::Band;
use crate::types::RegionalParametersVersion::*;

/// Revisions for bands defined since LoRaWAN 1.0.
pub(crate) const SINCE_1_0: &[RegionalParametersVersion] = &RegionalParametersVersion::ALL;
/// Revisions for bands introduced with LoRaWAN 1.0.1.
pub(crate) const SINCE_1_0_1: &[RegionalParametersVersion] = &[V1_0_1, V1_0_2, V1_0_2RevB, V1_1RevA];
/// Revisions for bands introduced with Regional Parameters 1.0.2.
pub(crate) const SINCE_1_0_2: &[RegionalParametersVersion] = &[V1_0_2, V1_0_2RevB, V1_1RevA];

/// Every band known to this crate.
pub(crate) fn all() -> Vec<Band> {
    vec![
        eu_863_870::band(),
        us_902_928::band(),
        au_915_928::band(),
        as_923::band(),
        kr_920_923::band(),
        in_865_867::band(),
        cn_470_510::band(),
        eu_433::band(),
    ]
}

/// LoRa data rate slot. Sizes are `(M, N)` pairs.
pub(crate) fn lora(
    spreading_factor: u8,
    bandwidth: Bandwidth,
    repeater: (u16, u16),
    no_repeater: (u16, u16),
) -> Option<DataRate> {
    Some(DataRate {
        modulation: Modulation::LoRa {
            spreading_factor,
            bandwidth,
        },
        repeater_max_size: MaxPayloadSize::new(repeater.0, repeater.1),
        no_repeater_max_size: MaxPayloadSize::new(no_repeater.0, no_repeater.1),
    })
}

/// FSK data rate slot.
pub(crate) fn fsk(bit_rate: u32, repeater: (u16, u16), no_repeater: (u16, u16)) -> Option<DataRate> {
    Some(DataRate {
        modulation: Modulation::Fsk { bit_rate },
        repeater_max_size: MaxPayloadSize::new(repeater.0, repeater.1),
        no_repeater_max_size: MaxPayloadSize::new(no_repeater.0, no_repeater.1),
    })
}

/// Pad the used data rates to the fixed 16 slot table.
pub(crate) fn data_rates(used: &[Option<DataRate>]) -> [Option<DataRate>; NUM_DATA_RATES] {
    let mut table = [None; NUM_DATA_RATES];
    table[..used.len()].copy_from_slice(used);
    table
}

/// TXPower offsets of `-2 dB` per step up to `max_step`, RFU afterwards.
pub(crate) fn tx_offsets(max_step: u8) -> [f32; NUM_TX_POWER_STEPS] {
    let mut offsets = [0.0; NUM_TX_POWER_STEPS];
    for (step, offset) in offsets.iter_mut().enumerate().take(max_step as usize + 1) {
        *offset = -2.0 * step as f32;
    }
    offsets
}
