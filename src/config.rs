use anyhow::Result;
use config::{Config, Environment};
use serde::{Deserialize, Serialize};

use crate::camera::CameraPosition;
use crate::location::{DEFAULT_MAXIMUM_AGE_MS, DEFAULT_TIMEOUT_MS};
use crate::upload::{DEFAULT_ENDPOINT_HOST, PHOTOS_PATH};

/// Main configuration structure for geo-snap
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GeoSnapConfig {
    /// Upload endpoint settings
    pub upload: UploadConfig,
    /// Geolocation fetch bounds
    pub location: LocationConfig,
    /// Camera selection
    pub camera: CameraConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Scheme and host of the photo API (build-time default)
    pub host: String,
    /// Path photos are posted to
    pub path: String,
    /// Give up on a single upload request after this long
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LocationConfig {
    /// Bound on the whole position fetch
    pub timeout_ms: u64,
    /// Oldest cached fix that is still acceptable
    pub maximum_age_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CameraConfig {
    pub position: CameraPosition,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level or `EnvFilter` directive string
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for GeoSnapConfig {
    fn default() -> Self {
        Self {
            upload: UploadConfig {
                host: DEFAULT_ENDPOINT_HOST.to_string(),
                path: PHOTOS_PATH.to_string(),
                request_timeout_seconds: 60,
            },
            location: LocationConfig {
                timeout_ms: DEFAULT_TIMEOUT_MS,
                maximum_age_ms: DEFAULT_MAXIMUM_AGE_MS,
            },
            camera: CameraConfig {
                position: CameraPosition::Back,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: true,
            },
        }
    }
}

impl GeoSnapConfig {
    /// Load configuration with precedence:
    /// 1. Default values
    /// 2. Environment variables (prefixed with GEO_SNAP_, `__` between sections)
    ///
    /// There is deliberately no configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(Environment::with_prefix("GEO_SNAP"))
    }

    /// Layer an environment source over the defaults
    pub fn load_from(environment: Environment) -> Result<Self> {
        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let geo_snap_config: GeoSnapConfig = config.try_deserialize()?;
        geo_snap_config.validate()?;
        Ok(geo_snap_config)
    }

    fn validate(&self) -> Result<()> {
        if self.location.timeout_ms == 0 {
            anyhow::bail!("location.timeout_ms must be greater than zero");
        }
        if !self.upload.path.starts_with('/') {
            anyhow::bail!("upload.path must start with '/': {}", self.upload.path);
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<GeoSnapConfig, anyhow::Error>> =
    std::sync::LazyLock::new(GeoSnapConfig::load);

/// Get the global configuration
pub fn config() -> Result<&'static GeoSnapConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let config = config()?;
    tracing::info!(host = %config.upload.host, "Configuration loaded successfully");
    Ok(())
}
