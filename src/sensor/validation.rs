use super::{ChannelSet, SensorReading, CHANNEL_COUNT};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Validation errors for inbound prediction requests
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidJson(String),
    BodyNotObject,
    MissingSensorData,
    SensorDataNotArray,
    NonNumericValue(usize),
    WrongLength { got: usize, channels: Vec<String> },
    ApiKeyNotString,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidJson(e) => write!(f, "request body is not valid JSON: {}", e),
            ValidationError::BodyNotObject => write!(f, "request body must be a JSON object"),
            ValidationError::MissingSensorData => write!(
                f,
                "sensor_data is required: expected an array of {} numbers",
                CHANNEL_COUNT
            ),
            ValidationError::SensorDataNotArray => {
                write!(f, "sensor_data must be an array of numbers")
            }
            ValidationError::NonNumericValue(i) => {
                write!(f, "sensor_data[{}] must be a number", i)
            }
            ValidationError::WrongLength { got, channels } => write!(
                f,
                "sensor_data requires exactly {} values: {} (got {})",
                CHANNEL_COUNT,
                channels.join(", "),
                got
            ),
            ValidationError::ApiKeyNotString => write!(f, "api_key must be a string"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Normalized body forwarded to the backend's `/predict`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorRequest {
    pub sensor_data: SensorReading,
}

/// Normalized body forwarded to the backend's `/predict/thingspeak`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RemotePredictRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Validates a `/predict` body and extracts the reading.
///
/// Rules:
/// - Body must be a JSON object
/// - `sensor_data` must be present and be an array
/// - Every element must be a number
/// - Exactly one value per channel
pub fn validate_sensor_request(
    body: &[u8],
    channel_set: ChannelSet,
) -> Result<SensorRequest, ValidationError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;

    let object = value.as_object().ok_or(ValidationError::BodyNotObject)?;

    let sensor_data = match object.get("sensor_data") {
        None | Some(Value::Null) => return Err(ValidationError::MissingSensorData),
        Some(v) => v.as_array().ok_or(ValidationError::SensorDataNotArray)?,
    };

    if sensor_data.len() != CHANNEL_COUNT {
        return Err(ValidationError::WrongLength {
            got: sensor_data.len(),
            channels: channel_set.names(),
        });
    }

    let mut reading: SensorReading = [0.0; CHANNEL_COUNT];
    for (i, v) in sensor_data.iter().enumerate() {
        reading[i] = v.as_f64().ok_or(ValidationError::NonNumericValue(i))?;
    }

    Ok(SensorRequest {
        sensor_data: reading,
    })
}

/// Parses a `/predict/thingspeak` body. An empty body means no key.
pub fn parse_remote_request(body: &[u8]) -> Result<RemotePredictRequest, ValidationError> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(RemotePredictRequest::default());
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;
    let object = value.as_object().ok_or(ValidationError::BodyNotObject)?;

    let api_key = match object.get("api_key") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(ValidationError::ApiKeyNotString),
    };

    Ok(RemotePredictRequest { api_key })
}
