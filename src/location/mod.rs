//! One-shot geolocation fetcher

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::errors::ProviderError;
use crate::types::{Coordinates, PositionFix};

/// Default bound on the whole fetch
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
/// Oldest cached fix that is still acceptable
pub const DEFAULT_MAXIMUM_AGE_MS: u64 = 10_000;

/// Options forwarded to the location provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("no position fix within {after_ms}ms")]
    Timeout { after_ms: u64 },
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("only stale fixes available (age {age_ms}ms)")]
    StaleFix { age_ms: u64 },
}

impl LocationError {
    /// Map a provider failure; a provider-side timeout keeps the bound it was given
    pub fn from_provider(err: ProviderError, timeout_ms: u64) -> Self {
        match err {
            ProviderError::PermissionDenied => LocationError::PermissionDenied,
            ProviderError::Unavailable(msg) | ProviderError::Other(msg) => {
                LocationError::Unavailable(msg)
            }
            ProviderError::Timeout => LocationError::Timeout { after_ms: timeout_ms },
        }
    }
}

/// Platform location service
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Resolve a single position, possibly from the provider's cache
    async fn get_current_position(&self, options: PositionOptions) -> Result<PositionFix, ProviderError>;
}

pub struct GeolocationFetcher {
    provider: Arc<dyn LocationProvider>,
}

impl GeolocationFetcher {
    pub fn new(provider: Arc<dyn LocationProvider>) -> Self {
        Self { provider }
    }

    /// Acquire one high-accuracy fix
    ///
    /// A fix older than `max_age` forces one fresh read with a zero maximum
    /// age. `timeout` bounds both reads together.
    pub async fn fetch_once(&self, timeout: Duration, max_age: Duration) -> Result<Coordinates, LocationError> {
        let timeout_ms = timeout.as_millis() as u64;
        match tokio::time::timeout(timeout, self.resolve(timeout_ms, max_age.as_millis() as u64)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms, "Location fix timed out");
                Err(LocationError::Timeout { after_ms: timeout_ms })
            }
        }
    }

    async fn resolve(&self, timeout_ms: u64, maximum_age_ms: u64) -> Result<Coordinates, LocationError> {
        let options = PositionOptions {
            enable_high_accuracy: true,
            timeout_ms,
            maximum_age_ms,
        };

        let fix = self
            .provider
            .get_current_position(options)
            .await
            .map_err(|e| LocationError::from_provider(e, timeout_ms))?;
        let age_ms = fix.age_ms(Utc::now());
        if age_ms <= maximum_age_ms {
            info!(latitude = fix.coords.latitude, longitude = fix.coords.longitude, age_ms, "Position fix acquired");
            return Ok(fix.coords);
        }

        debug!(age_ms, maximum_age_ms, "Cached fix is stale, forcing a fresh read");
        let fresh = self
            .provider
            .get_current_position(PositionOptions {
                maximum_age_ms: 0,
                ..options
            })
            .await
            .map_err(|e| LocationError::from_provider(e, timeout_ms))?;
        let age_ms = fresh.age_ms(Utc::now());
        if age_ms <= maximum_age_ms {
            info!(latitude = fresh.coords.latitude, longitude = fresh.coords.longitude, age_ms, "Fresh position fix acquired");
            Ok(fresh.coords)
        } else {
            warn!(age_ms, "Fresh read still returned a stale fix");
            Err(LocationError::StaleFix { age_ms })
        }
    }
}
