//! Platform detection and application identity.
//!
//! Both are boundary collaborators: the host application supplies them when
//! building a coordinator.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::platform_tags;
use crate::error::{PushError, PushResult};

/// Device class the coordinator runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Android,
    Ios,
    /// Browser, desktop or anything without a native push service
    Other,
}

impl Platform {
    /// Platform discriminator used for token/user association
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Self::Android => Some(platform_tags::ANDROID),
            Self::Ios => Some(platform_tags::IOS),
            Self::Other => None,
        }
    }

    pub fn is_push_capable(&self) -> bool {
        matches!(self, Self::Android | Self::Ios)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Android => write!(f, "android"),
            Self::Ios => write!(f, "ios"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Answers "which kind of device is this"
pub trait PlatformDetector: Send + Sync {
    fn is_android(&self) -> bool;

    fn is_ios(&self) -> bool;

    fn platform(&self) -> Platform {
        if self.is_android() {
            Platform::Android
        } else if self.is_ios() {
            Platform::Ios
        } else {
            Platform::Other
        }
    }
}

/// Detector with a fixed answer, for hosts that know their platform at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPlatform(pub Platform);

impl PlatformDetector for StaticPlatform {
    fn is_android(&self) -> bool {
        self.0 == Platform::Android
    }

    fn is_ios(&self) -> bool {
        self.0 == Platform::Ios
    }
}

impl StaticPlatform {
    /// Detector for the compilation target (`target_os`)
    pub fn current() -> Self {
        if cfg!(target_os = "android") {
            Self(Platform::Android)
        } else if cfg!(target_os = "ios") {
            Self(Platform::Ios)
        } else {
            Self(Platform::Other)
        }
    }
}

/// Application identity registered with the push service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    pub id: Option<String>,
    pub api_key: Option<String>,
    /// Android sender / project number
    pub gcm_key: Option<String>,
}

impl AppIdentity {
    pub fn new(id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            api_key: Some(api_key.into()),
            gcm_key: None,
        }
    }

    pub fn with_gcm_key(mut self, gcm_key: impl Into<String>) -> Self {
        self.gcm_key = Some(gcm_key.into());
        self
    }

    /// Both `id` and `api_key` must be present and non-empty
    pub fn validate(&self) -> PushResult<()> {
        if is_blank(&self.id) {
            return Err(PushError::MissingIdentity("app_id"));
        }
        if is_blank(&self.api_key) {
            return Err(PushError::MissingIdentity("api_key"));
        }
        Ok(())
    }

    pub fn sender_id(&self) -> Option<&str> {
        self.gcm_key.as_deref().filter(|key| !key.is_empty())
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}
