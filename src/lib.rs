// Sensor channel schema and request validation
pub mod sensor;

// Placeholder payloads for an unavailable backend
pub mod fallback;

// Prediction backend client
pub mod backend;

// Static and runtime configuration
pub mod config;

// HTTP API
pub mod api;
