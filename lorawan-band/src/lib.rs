//! LoRaWAN regional parameters.
//!
//! Every band is an immutable [`Band`] value built once, on first lookup, and
//! handed out as `&'static Band`. A band definition lists the regional
//! parameters revisions it is valid under instead of being duplicated per
//! revision.
//!
//! ```
//! let band = lorawan_band::get("EU_863_870").unwrap();
//! let (dr, frequency) = band.compute_rx1(868_100_000, 5, 2, false).unwrap();
//! assert_eq!((dr, frequency), (3, 868_100_000));
//! ```

mod band;
mod constants;
pub mod error;
pub mod regions;
pub mod types;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

pub use band::{Band, ChannelGrid, Rx1Rule, Timing};
pub use error::BandError;
pub use types::*;

static BANDS: Lazy<BTreeMap<&'static str, Band>> = Lazy::new(|| {
    regions::all()
        .into_iter()
        .map(|band| (band.id, band))
        .collect()
});

/// Look up a band by identifier, e.g. `"KR_920_923"`.
pub fn get(id: &str) -> Result<&'static Band, BandError> {
    BANDS.get(id).ok_or_else(|| BandError::NotFound(id.to_string()))
}

/// Look up a band and check that it is defined for `version`.
pub fn get_for_version(
    id: &str,
    version: RegionalParametersVersion,
) -> Result<&'static Band, BandError> {
    let band = get(id)?;
    if !band.supports(version) {
        return Err(BandError::UnsupportedVersion {
            band: band.id,
            version,
        });
    }
    Ok(band)
}

/// All registered bands, ordered by identifier.
pub fn all() -> impl Iterator<Item = &'static Band> {
    BANDS.values()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regions::{EU_863_870, KR_920_923, US_902_928};

    #[test]
    fn test_lookup() {
        assert_eq!(get(EU_863_870).unwrap().id, EU_863_870);
        assert_eq!(get("XX_000").unwrap_err(), BandError::NotFound("XX_000".to_string()));
        assert_eq!(all().count(), 8);
    }

    #[test]
    fn test_lookup_by_version() {
        assert!(get_for_version(KR_920_923, RegionalParametersVersion::V1_1RevA).is_ok());
        assert_eq!(
            get_for_version(KR_920_923, RegionalParametersVersion::V1_0).unwrap_err(),
            BandError::UnsupportedVersion {
                band: KR_920_923,
                version: RegionalParametersVersion::V1_0,
            }
        );
        assert!(get_for_version(US_902_928, RegionalParametersVersion::V1_0).is_ok());
    }

    #[test]
    fn test_rx1_never_below_lowest_data_rate() {
        for band in all() {
            let lowest = band.lowest_data_rate_index();
            let frequency = band.uplink_channels[0].frequency;
            for dr in band.uplink_channels[0].data_rate_indexes.iter().copied() {
                for offset in 0..8 {
                    if let Ok((rx1_dr, _)) = band.compute_rx1(frequency, dr, offset, true) {
                        assert!(rx1_dr >= lowest, "{} DR{} offset {}", band.id, dr, offset);
                        assert!(band.data_rate(rx1_dr).is_some(), "{} DR{}", band.id, rx1_dr);
                    }
                }
            }
        }
    }

    #[test]
    fn test_repeater_limits_never_exceed_plain_limits() {
        for band in all() {
            for dr in band.data_rates.iter().flatten() {
                let repeater = dr.repeater_max_size;
                let plain = dr.no_repeater_max_size;
                assert!(repeater.mac_payload <= plain.mac_payload, "{}", band.id);
                assert!(repeater.frm_payload <= plain.frm_payload, "{}", band.id);
            }
        }
    }

    #[test]
    fn test_band_invariants() {
        for band in all() {
            assert_eq!(band.data_rates.len(), NUM_DATA_RATES);
            assert!(band.data_rate(band.default_rx2.data_rate_index).is_some(), "{}", band.id);
            assert!(band.data_rate(band.beacon.data_rate_index).is_some(), "{}", band.id);
            assert!(band.tx_power(band.max_tx_power_index).is_some());
            for channel in band.uplink_channels.iter().chain(&band.downlink_channels) {
                for dr in &channel.data_rate_indexes {
                    assert!(band.data_rate(*dr).is_some(), "{} DR{}", band.id, dr);
                }
            }
            assert!(!band.regional_parameters.is_empty());
        }
    }
}
