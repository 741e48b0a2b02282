//! Configuration for the coverage processor.

use crate::types::InterpolationMethod;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the coverage processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageProcessorConfig {
    /// Upper bound on a single coverage read.
    #[serde(with = "duration_secs")]
    pub read_timeout: Duration,

    /// Largest output accepted, in cells times bands.
    pub max_output_pixels: u64,

    /// Interpolation used when neither the request nor the coverage names one.
    pub default_interpolation: InterpolationMethod,

    /// Resample bands in parallel.
    pub parallel_bands: bool,
}

impl Default for CoverageProcessorConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            max_output_pixels: 100_000_000,
            default_interpolation: InterpolationMethod::Nearest,
            parallel_bands: true,
        }
    }
}

impl CoverageProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("WCS_READ_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.read_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(val) = std::env::var("WCS_MAX_OUTPUT_PIXELS") {
            if let Ok(pixels) = val.parse() {
                config.max_output_pixels = pixels;
            }
        }

        if let Ok(val) = std::env::var("WCS_DEFAULT_INTERPOLATION") {
            if let Some(method) = InterpolationMethod::parse(&val) {
                config.default_interpolation = method;
            }
        }

        if let Ok(val) = std::env::var("WCS_PARALLEL_BANDS") {
            config.parallel_bands = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.read_timeout.is_zero() {
            return Err("read_timeout must be > 0".to_string());
        }

        if self.max_output_pixels == 0 {
            return Err("max_output_pixels must be > 0".to_string());
        }

        Ok(())
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_max_output_pixels(mut self, pixels: u64) -> Self {
        self.max_output_pixels = pixels;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
