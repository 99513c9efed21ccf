//! Sensor reading data model

use serde::{Deserialize, Serialize};

/// Coordinates substituted when acquisition fails
pub const DEFAULT_LATITUDE: f64 = 13.394968;
pub const DEFAULT_LONGITUDE: f64 = 77.728851;

/// One parsed record from the device: GPS coordinate plus the three
/// proximity-sensor distances in centimeters. Produced per poll, consumed by
/// one render/dispatch cycle, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub latitude: f64,
    pub longitude: f64,
    pub distance1: f64,
    pub distance2: f64,
    pub distance3: f64,
}

impl SensorReading {
    /// The reading substituted when acquisition fails: default coordinates,
    /// distances zeroed. The degraded state is flagged separately so the
    /// page can report the fallback instead of presenting it as real data.
    pub fn fallback() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            distance1: 0.0,
            distance2: 0.0,
            distance3: 0.0,
        }
    }

    /// Distances indexed by sensor number (1-based on the page)
    pub fn distances(&self) -> [f64; 3] {
        [self.distance1, self.distance2, self.distance3]
    }
}

/// The shell-side resolution of one poll outcome: the reading actually
/// rendered, plus whether defaults were substituted for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedReading {
    pub reading: SensorReading,
    pub fallback: bool,
}

impl ResolvedReading {
    pub fn live(reading: SensorReading) -> Self {
        Self {
            reading,
            fallback: false,
        }
    }

    pub fn degraded() -> Self {
        Self {
            reading: SensorReading::fallback(),
            fallback: true,
        }
    }
}
