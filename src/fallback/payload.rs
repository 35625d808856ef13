use crate::sensor::SensorReading;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// GET /models response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub available_models: Vec<ModelCatalogEntry>,
    pub total_models: usize,
    pub feature_count: usize,
    pub supported_features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalogEntry {
    pub name: String,
    pub display_name: String,
    /// Fraction in `[0, 1]`
    pub accuracy: f64,
    pub features: Vec<String>,
    pub feature_count: usize,
    pub description: String,
}

/// GET /sensors response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorCatalog {
    pub sensor_features: Vec<String>,
    pub sensor_count: usize,
    pub sensor_types: SensorTypes,
    pub sensor_descriptions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorTypes {
    pub gas_sensors: Vec<String>,
    pub environmental_sensors: Vec<String>,
}

/// POST /predict response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_class: String,
    pub predicted_label: String,
    pub confidence: f64,
    /// Class name → probability, one entry per odor class
    pub probabilities: BTreeMap<String, f64>,
    pub sensor_data: SensorReading,
}

/// POST /predict/thingspeak response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemotePredictionResult {
    pub input_data: SensorReading,
    pub predictions: ModelPredictions,
    pub metadata: PredictionMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPredictions {
    pub ann: ModelPrediction,
    pub random_forest: ModelPrediction,
    pub xgboost: ModelPrediction,
    pub knn: ModelPrediction,
}

impl ModelPredictions {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ModelPrediction)> {
        [
            ("ann", &self.ann),
            ("random_forest", &self.random_forest),
            ("xgboost", &self.xgboost),
            ("knn", &self.knn),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub class_id: u8,
    pub class_label: String,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionMetadata {
    pub timestamp: String,
    pub sensor_names: Vec<String>,
    pub thingspeak: ThingSpeakInfo,
}

/// Details about the telemetry fetch the backend performed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThingSpeakInfo {
    pub records_fetched: u32,
    pub latest_entry_time: String,
    pub api_key: String,
}
