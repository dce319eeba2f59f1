//! Crop season table.
//!
//! Months in which each crop is normally sown or grown. A month outside a
//! crop's set is a seasonal misalignment. Every [`Crop`] has an entry; a
//! new crop does not compile until it gets one.

use crate::types::{Crop, Month};

use Month::*;

const RICE: &[Month] = &[June, July, August, September, November, December, January];
const WHEAT: &[Month] = &[October, November, December, January, February];
const MAIZE: &[Month] = &[June, July, August, September, October];
const SUGARCANE: &[Month] = &[January, February, March, October, November];
const COTTON: &[Month] = &[June, July, August, September];
const GROUNDNUT: &[Month] = &[June, July, August, September, October];
const SOYBEAN: &[Month] = &[June, July, August, September];
const TOMATO: &[Month] = &[October, November, December, January, February];
const ONION: &[Month] = &[October, November, December, January, February];
const BANANA: &[Month] = &[January, February, March, April, May, June, July, August];
const MANGO: &[Month] = &[January, February, March, April, May];
const TURMERIC: &[Month] = &[June, July, August];
const CHILLI: &[Month] = &[July, August, September, October];
const PULSES: &[Month] = &[June, July, October, November];
const VEGETABLES: &[Month] = &[October, November, December, January, February, March];

/// The in-season months for a crop.
pub fn season_for(crop: Crop) -> &'static [Month] {
    match crop {
        Crop::Rice => RICE,
        Crop::Wheat => WHEAT,
        Crop::Maize => MAIZE,
        Crop::Sugarcane => SUGARCANE,
        Crop::Cotton => COTTON,
        Crop::Groundnut => GROUNDNUT,
        Crop::Soybean => SOYBEAN,
        Crop::Tomato => TOMATO,
        Crop::Onion => ONION,
        Crop::Banana => BANANA,
        Crop::Mango => MANGO,
        Crop::Turmeric => TURMERIC,
        Crop::Chilli => CHILLI,
        Crop::Pulses => PULSES,
        Crop::Vegetables => VEGETABLES,
    }
}

/// Whether `month` lies outside the crop's season.
pub fn is_out_of_season(crop: Crop, month: Month) -> bool {
    !season_for(crop).contains(&month)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_crop_has_a_season() {
        for crop in Crop::ALL {
            let season = season_for(*crop);
            assert!(!season.is_empty(), "{crop} has an empty season");
            assert!(Month::ALL.iter().any(|m| is_out_of_season(*crop, *m)), "{crop}");
        }
    }

    #[test]
    fn test_rice_spans_two_seasons() {
        assert!(!is_out_of_season(Crop::Rice, Month::June));
        assert!(!is_out_of_season(Crop::Rice, Month::January));
        assert!(is_out_of_season(Crop::Rice, Month::October));
        assert!(is_out_of_season(Crop::Rice, Month::March));
    }

    #[test]
    fn test_rabi_crops() {
        assert!(!is_out_of_season(Crop::Wheat, Month::November));
        assert!(is_out_of_season(Crop::Wheat, Month::June));
        assert!(!is_out_of_season(Crop::Vegetables, Month::March));
        assert!(is_out_of_season(Crop::Vegetables, Month::April));
    }
}
