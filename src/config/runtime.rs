use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// Runtime-adjustable behavior. Changes via PUT /api/admin/config take effect
/// on the next request without restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Serve placeholder payloads instead of 502/504 when the backend fails
    pub fallback_enabled: bool,
    pub body_size_limit_bytes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fallback_enabled: false,
            body_size_limit_bytes: 65_536, // 64 KiB
        }
    }
}

impl RuntimeConfig {
    /// Build from env vars, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("FRESHGATE_FALLBACK_ENABLED") {
            if let Ok(b) = v.parse::<bool>() {
                cfg.fallback_enabled = b;
            }
        }
        if let Some(v) = lookup("FRESHGATE_BODY_SIZE_LIMIT_BYTES") {
            if let Ok(n) = v.parse::<usize>() {
                cfg.body_size_limit_bytes = n;
            }
        }

        cfg
    }
}

pub type SharedRuntimeConfig = Arc<RwLock<RuntimeConfig>>;

pub fn new_runtime_config() -> SharedRuntimeConfig {
    shared(RuntimeConfig::from_env())
}

pub fn shared(cfg: RuntimeConfig) -> SharedRuntimeConfig {
    Arc::new(RwLock::new(cfg))
}

/// Copy of the current values. A poisoned lock still holds valid plain data.
pub fn current(config: &SharedRuntimeConfig) -> RuntimeConfig {
    config
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
