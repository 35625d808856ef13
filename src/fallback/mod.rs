//! Placeholder payloads served when the prediction backend is unavailable.
//!
//! Every function here is total: no I/O, no fallible steps. Values are drawn
//! from fixed ranges so the dashboard always has something plausible to
//! render. None of this is inference.

mod payload;

pub use payload::{
    ModelCatalog, ModelCatalogEntry, ModelPrediction, ModelPredictions, PredictionMetadata,
    PredictionResult, RemotePredictionResult, SensorCatalog, SensorTypes, ThingSpeakInfo,
};

use crate::sensor::{
    ChannelCategory, ChannelSet, FallbackRange, FreshnessTier, OdorClass, SensorReading,
    CHANNEL_COUNT,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use std::collections::BTreeMap;


/// Maximum per-model deviation from the base freshness score (percentage points)
const MODEL_SCORE_SPREAD: f64 = 4.0;

/// Records the telemetry fetch would have returned
const REMOTE_RECORDS_FETCHED: u32 = 4;

/// Key echoed back when the caller did not send one
const DEMO_API_KEY: &str = "demo_key";

/// Builds fallback payloads for a given channel naming convention.
#[derive(Debug, Clone, Copy)]
pub struct FallbackGenerator {
    channel_set: ChannelSet,
}

impl FallbackGenerator {
    pub fn new(channel_set: ChannelSet) -> Self {
        Self { channel_set }
    }

    pub fn channel_set(&self) -> ChannelSet {
        self.channel_set
    }

    /// Static model catalog: RandomForest, SVM and NeuralNetwork.
    pub fn models(&self) -> ModelCatalog {
        let features = self.channel_set.names();
        let entry = |name: &str, display_name: &str, accuracy: f64, description: &str| {
            ModelCatalogEntry {
                name: name.to_string(),
                display_name: display_name.to_string(),
                accuracy,
                features: features.clone(),
                feature_count: features.len(),
                description: description.to_string(),
            }
        };

        let available_models = vec![
            entry(
                "RandomForest",
                "Random Forest",
                0.92,
                "Random Forest model over the four main sensors",
            ),
            entry(
                "SVM",
                "Support Vector Machine",
                0.89,
                "SVM model tuned for four sensor inputs",
            ),
            entry(
                "NeuralNetwork",
                "Neural Network",
                0.94,
                "Neural network with four sensor inputs",
            ),
        ];

        ModelCatalog {
            total_models: available_models.len(),
            feature_count: features.len(),
            supported_features: features.clone(),
            available_models,
        }
    }

    /// Sensor catalog derived from the configured channels.
    pub fn sensors(&self) -> SensorCatalog {
        let channels = self.channel_set.channels();
        let names_in = |category: ChannelCategory| -> Vec<String> {
            channels
                .iter()
                .filter(|c| c.category == category)
                .map(|c| c.name.to_string())
                .collect()
        };

        SensorCatalog {
            sensor_features: self.channel_set.names(),
            sensor_count: CHANNEL_COUNT,
            sensor_types: SensorTypes {
                gas_sensors: names_in(ChannelCategory::Gas),
                environmental_sensors: names_in(ChannelCategory::Environmental),
            },
            sensor_descriptions: channels
                .iter()
                .map(|c| (c.name.to_string(), format!("{} ({})", c.description, c.unit)))
                .collect(),
        }
    }

    /// Single-model prediction over a freshly randomized reading.
    pub fn prediction<R: Rng + ?Sized>(&self, rng: &mut R) -> PredictionResult {
        let confidence = base_freshness(rng) / 100.0;
        let predicted = FreshnessTier::from_score(confidence).odor_class();

        PredictionResult {
            predicted_class: predicted.as_str().to_string(),
            predicted_label: predicted.display_label().to_string(),
            confidence,
            probabilities: spread_probabilities(rng, predicted, confidence),
            sensor_data: self.reading(rng),
        }
    }

    /// Four-model prediction as if the backend had pulled the reading from ThingSpeak.
    pub fn remote_prediction<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        api_key: Option<&str>,
        now: DateTime<Utc>,
    ) -> RemotePredictionResult {
        let base = base_freshness(rng);
        let input_data = self.reading(rng);
        let predictions = ModelPredictions {
            ann: model_prediction(rng, base),
            random_forest: model_prediction(rng, base),
            xgboost: model_prediction(rng, base),
            knn: model_prediction(rng, base),
        };
        let timestamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);

        RemotePredictionResult {
            input_data,
            predictions,
            metadata: PredictionMetadata {
                timestamp: timestamp.clone(),
                sensor_names: self.channel_set.names(),
                thingspeak: ThingSpeakInfo {
                    records_fetched: REMOTE_RECORDS_FETCHED,
                    latest_entry_time: timestamp,
                    api_key: api_key.unwrap_or(DEMO_API_KEY).to_string(),
                },
            },
        }
    }

    /// One value per channel, each inside that channel's fallback range.
    pub fn reading<R: Rng + ?Sized>(&self, rng: &mut R) -> SensorReading {
        let mut reading = [0.0; CHANNEL_COUNT];
        for (value, channel) in reading.iter_mut().zip(self.channel_set.channels()) {
            *value = match channel.fallback_range {
                FallbackRange::Uniform { min, max } => rng.gen_range(min..max),
                FallbackRange::Integer { min, max } => rng.gen_range(min..=max) as f64,
            };
        }
        reading
    }
}

/// Base freshness in percent, `[0, 100)`.
fn base_freshness<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(0.0..100.0)
}

/// A model's score varies slightly around the base; its label follows its own score.
fn model_prediction<R: Rng + ?Sized>(rng: &mut R, base: f64) -> ModelPrediction {
    let jitter = rng.gen_range(-MODEL_SCORE_SPREAD..=MODEL_SCORE_SPREAD);
    let varied = (base + jitter).clamp(0.0, 100.0);
    let probability = varied / 100.0;
    let tier = FreshnessTier::from_score(probability);

    ModelPrediction {
        class_id: tier.class_id(),
        class_label: tier.class_label().to_string(),
        probability,
    }
}

/// Assigns `confidence` to the predicted class; every other class scores strictly below it.
fn spread_probabilities<R: Rng + ?Sized>(
    rng: &mut R,
    predicted: OdorClass,
    confidence: f64,
) -> BTreeMap<String, f64> {
    OdorClass::ALL
        .into_iter()
        .map(|class| {
            let p = if class == predicted {
                confidence
            } else {
                // gen() is in [0, 1), so this stays below confidence
                confidence * rng.gen::<f64>()
            };
            (class.as_str().to_string(), p)
        })
        .collect()
}
