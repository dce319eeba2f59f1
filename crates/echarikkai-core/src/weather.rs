//! Weather observations and farm coordinates.
//!
//! The core never fetches weather; it only defines the summary shape the
//! runtime's client produces and the coordinates it should ask about.

use serde::{Deserialize, Serialize};

use crate::types::Location;
use crate::CoreError;

/// Current conditions at the farm.
///
/// `None` means the value is unavailable, which is not the same as a
/// measured zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    /// Air temperature at 2 m, in °C.
    pub temperature: Option<f64>,

    /// Rain over the current interval, in mm.
    pub rainfall: Option<f64>,

    /// Wind speed at 10 m, in km/h.
    pub wind_speed: Option<f64>,
}

impl WeatherSummary {
    /// A summary with every reading unavailable.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Whether any reading is present.
    pub fn is_available(&self) -> bool {
        self.temperature.is_some() || self.rainfall.is_some() || self.wind_speed.is_some()
    }
}

/// A point on the globe, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validated coordinates.
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidCoordinates`] if either value is non-finite or
    /// outside ±90 / ±180.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if !valid {
            return Err(CoreError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Chennai, used when the plan names no location.
pub const DEFAULT_COORDINATES: Coordinates = Coordinates {
    latitude: 13.0827,
    longitude: 80.2707,
};

/// A representative agricultural centre for each location.
pub fn coordinates_for(location: Location) -> Coordinates {
    let (latitude, longitude) = match location {
        Location::TamilNadu => (13.0827, 80.2707),
        Location::AndhraPradesh => (16.5062, 80.6480),
        Location::Telangana => (17.3850, 78.4867),
        Location::Karnataka => (12.9716, 77.5946),
        Location::Kerala => (8.5241, 76.9366),
        Location::Maharashtra => (18.5204, 73.8567),
        Location::Gujarat => (23.0225, 72.5714),
        Location::Rajasthan => (26.9124, 75.7873),
        Location::Punjab => (30.9010, 75.8573),
        Location::Haryana => (29.1492, 75.7217),
        Location::UttarPradesh => (26.8467, 80.9462),
        Location::MadhyaPradesh => (23.2599, 77.4126),
        Location::WestBengal => (22.5726, 88.3639),
        Location::Odisha => (20.2961, 85.8245),
        Location::Bihar => (25.5941, 85.1376),
        Location::Assam => (26.1445, 91.7362),
        Location::Delhi => (28.7041, 77.1025),
    };

    Coordinates {
        latitude,
        longitude,
    }
}
