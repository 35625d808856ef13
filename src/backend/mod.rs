// Prediction backend integration

mod client;

pub use client::{BackendClient, UpstreamError};

use std::fmt;

/// HTTP method used toward the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// The backend resources the gateway proxies. Each is exposed under the same path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Models,
    Sensors,
    Predict,
    PredictThingSpeak,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Models => "/models",
            Endpoint::Sensors => "/sensors",
            Endpoint::Predict => "/predict",
            Endpoint::PredictThingSpeak => "/predict/thingspeak",
        }
    }

    pub fn method(self) -> Method {
        match self {
            Endpoint::Models | Endpoint::Sensors => Method::Get,
            Endpoint::Predict | Endpoint::PredictThingSpeak => Method::Post,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = match self.method() {
            Method::Get => "GET",
            Method::Post => "POST",
        };
        write!(f, "{} {}", method, self.path())
    }
}
