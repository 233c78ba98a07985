//! Permission gate
//!
//! Wraps the platform permission subsystem. The gate never performs UI side
//! effects itself: when the user has to be told something (a permanent denial
//! that only the system settings screen can undo) it returns an [`Effect`] for
//! the host shell to render.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::{Permission, ProviderError};

/// Answer to a location permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationGrant {
    Granted,
    Denied,
    /// The user chose "never ask again"; only the settings screen can undo it
    PermanentlyDenied,
}

/// Trait for the platform permission subsystem
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Current camera grant, maintained by the device capability layer
    fn query_camera_granted(&self) -> bool;

    /// Prompt the user for camera access
    async fn request_camera_grant(&self) -> bool;

    /// Prompt the user for fine location access
    async fn request_location_grant(&self) -> Result<LocationGrant, ProviderError>;

    /// Open the OS settings screen for this app. Fire-and-forget.
    fn open_settings(&self);
}

/// Declared side effect for the host shell to perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Blocking notice offering navigation to the system settings screen
    PermissionNotice {
        permission: Permission,
        title: String,
        message: String,
    },
}

impl Effect {
    fn never_ask_again(permission: Permission) -> Self {
        let title = match permission {
            Permission::Camera => "Camera Permission",
            Permission::Location => "Location Permission",
        };
        Effect::PermissionNotice {
            permission,
            title: title.to_string(),
            message: format!(
                "You have previously denied {permission} permission and selected \"Never ask again\". \
                 Please go to settings to manually enable the permission."
            ),
        }
    }
}

/// Result of a gated permission request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionOutcome {
    pub granted: bool,
    pub permanent_denial: bool,
    pub effects: Vec<Effect>,
}

impl PermissionOutcome {
    fn granted() -> Self {
        Self {
            granted: true,
            permanent_denial: false,
            effects: Vec::new(),
        }
    }

    fn denied() -> Self {
        Self {
            granted: false,
            permanent_denial: false,
            effects: Vec::new(),
        }
    }
}

pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn PermissionProvider>) -> Self {
        Self { provider }
    }

    pub fn check_camera_permission(&self) -> bool {
        self.provider.query_camera_granted()
    }

    pub async fn request_camera_permission(&self) -> bool {
        let granted = self.provider.request_camera_grant().await;
        info!(granted, "Camera permission requested");
        granted
    }

    /// Ask for location access right after a capture
    ///
    /// Provider failures count as "not granted" for this attempt.
    pub async fn request_location_permission(&self) -> PermissionOutcome {
        match self.provider.request_location_grant().await {
            Ok(LocationGrant::Granted) => PermissionOutcome::granted(),
            Ok(LocationGrant::Denied) => {
                warn!("Location permission denied");
                PermissionOutcome::denied()
            }
            Ok(LocationGrant::PermanentlyDenied) => {
                warn!("Location permission permanently denied, surfacing settings notice");
                PermissionOutcome {
                    granted: false,
                    permanent_denial: true,
                    effects: vec![Effect::never_ask_again(Permission::Location)],
                }
            }
            Err(e) => {
                warn!(error = %e, "Location permission request failed");
                PermissionOutcome::denied()
            }
        }
    }

    pub fn open_settings(&self) {
        info!("Opening system settings");
        self.provider.open_settings();
    }
}
