// Sensor channel layout and freshness classes

mod validation;

pub use validation::{
    parse_remote_request, validate_sensor_request, RemotePredictRequest, SensorRequest,
    ValidationError,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;


/// Number of positional channels in every sensor reading.
pub const CHANNEL_COUNT: usize = 4;

/// A single reading: one value per channel, in channel order.
pub type SensorReading = [f64; CHANNEL_COUNT];

/// Freshness score at or above which meat is classified fresh.
pub const FRESH_THRESHOLD: f64 = 0.70;

/// Freshness score at or above which meat is classified spoiled (below fresh).
pub const SPOILED_THRESHOLD: f64 = 0.30;

/// Naming convention used for the two gas channels.
///
/// Both conventions were in use against the same backend; the gateway picks
/// one from configuration instead of hard-coding either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelSet {
    /// NH3, H2S, TEMP, HUMI
    #[default]
    Gas,
    /// Sensor1, Sensor2, TEMP, HUMI
    Generic,
}

impl ChannelSet {
    /// Channels in reading order.
    pub fn channels(self) -> [Channel; CHANNEL_COUNT] {
        let (first, second) = match self {
            ChannelSet::Gas => (
                Channel {
                    name: "NH3",
                    description: "Ammonia (NH3) gas sensor",
                    category: ChannelCategory::Gas,
                    unit: "ppm",
                    fallback_range: FallbackRange::Uniform { min: 25.5, max: 55.5 },
                },
                Channel {
                    name: "H2S",
                    description: "Hydrogen sulfide (H2S) gas sensor",
                    category: ChannelCategory::Gas,
                    unit: "ppm",
                    fallback_range: FallbackRange::Uniform { min: 8.2, max: 23.2 },
                },
            ),
            ChannelSet::Generic => (
                Channel {
                    name: "Sensor1",
                    description: "Primary gas sensor",
                    category: ChannelCategory::Gas,
                    unit: "ppm",
                    fallback_range: FallbackRange::Uniform { min: 25.5, max: 55.5 },
                },
                Channel {
                    name: "Sensor2",
                    description: "Secondary gas sensor",
                    category: ChannelCategory::Gas,
                    unit: "ppm",
                    fallback_range: FallbackRange::Uniform { min: 8.2, max: 23.2 },
                },
            ),
        };

        [
            first,
            second,
            Channel {
                name: "TEMP",
                description: "Ambient temperature sensor",
                category: ChannelCategory::Environmental,
                unit: "°C",
                fallback_range: FallbackRange::Uniform { min: 23.0, max: 24.0 },
            },
            Channel {
                name: "HUMI",
                description: "Air humidity sensor",
                category: ChannelCategory::Environmental,
                unit: "%",
                fallback_range: FallbackRange::Integer { min: 50, max: 70 },
            },
        ]
    }

    /// Channel names in reading order.
    pub fn names(self) -> Vec<String> {
        self.channels().iter().map(|c| c.name.to_string()).collect()
    }
}

impl fmt::Display for ChannelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelSet::Gas => write!(f, "gas"),
            ChannelSet::Generic => write!(f, "generic"),
        }
    }
}

impl FromStr for ChannelSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gas" => Ok(ChannelSet::Gas),
            "generic" => Ok(ChannelSet::Generic),
            other => Err(format!(
                "unknown channel set '{}': expected 'gas' or 'generic'",
                other
            )),
        }
    }
}

/// One named position within a reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub name: &'static str,
    pub description: &'static str,
    pub category: ChannelCategory,
    pub unit: &'static str,
    /// Bounds used when synthesizing a placeholder value for this channel
    pub fallback_range: FallbackRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelCategory {
    Gas,
    Environmental,
}

/// Value range for synthesized channel readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FallbackRange {
    /// Uniform over `[min, max)`
    Uniform { min: f64, max: f64 },
    /// Whole numbers in `[min, max]`
    Integer { min: i64, max: i64 },
}

impl FallbackRange {
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            FallbackRange::Uniform { min, max } => value >= min && value < max,
            FallbackRange::Integer { min, max } => {
                value.fract() == 0.0 && value >= min as f64 && value <= max as f64
            }
        }
    }
}

/// Three-band freshness classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessTier {
    Rotten,
    Spoiled,
    Fresh,
}

impl FreshnessTier {
    /// Classify a freshness score in `[0, 1]`.
    pub fn from_score(score: f64) -> Self {
        if score >= FRESH_THRESHOLD {
            FreshnessTier::Fresh
        } else if score >= SPOILED_THRESHOLD {
            FreshnessTier::Spoiled
        } else {
            FreshnessTier::Rotten
        }
    }

    /// Numeric class id used by the prediction models.
    pub fn class_id(self) -> u8 {
        match self {
            FreshnessTier::Rotten => 0,
            FreshnessTier::Spoiled => 1,
            FreshnessTier::Fresh => 2,
        }
    }

    pub fn class_label(self) -> &'static str {
        self.odor_class().as_str()
    }

    pub fn odor_class(self) -> OdorClass {
        match self {
            FreshnessTier::Rotten => OdorClass::RottenMeat,
            FreshnessTier::Spoiled => OdorClass::SpoiledMeat,
            FreshnessTier::Fresh => OdorClass::FreshMeat,
        }
    }
}

/// Every class the single-model prediction endpoint reports a probability for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OdorClass {
    FishSauce,
    Garlic,
    Lemon,
    Milk,
    FreshMeat,
    SpoiledMeat,
    RottenMeat,
}

impl OdorClass {
    pub const ALL: [OdorClass; 7] = [
        OdorClass::FishSauce,
        OdorClass::Garlic,
        OdorClass::Lemon,
        OdorClass::Milk,
        OdorClass::FreshMeat,
        OdorClass::SpoiledMeat,
        OdorClass::RottenMeat,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OdorClass::FishSauce => "fish_sauce",
            OdorClass::Garlic => "garlic",
            OdorClass::Lemon => "lemon",
            OdorClass::Milk => "milk",
            OdorClass::FreshMeat => "fresh_meat",
            OdorClass::SpoiledMeat => "spoiled_meat",
            OdorClass::RottenMeat => "rotten_meat",
        }
    }

    /// Human-readable label shown next to the class on the dashboard.
    pub fn display_label(self) -> &'static str {
        match self {
            OdorClass::FishSauce => "Fish sauce",
            OdorClass::Garlic => "Garlic",
            OdorClass::Lemon => "Lemon",
            OdorClass::Milk => "Milk",
            OdorClass::FreshMeat => "Fresh meat",
            OdorClass::SpoiledMeat => "Spoiled meat",
            OdorClass::RottenMeat => "Rotten meat",
        }
    }
}
