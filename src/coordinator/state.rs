use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::PushConfig;

/// Readiness of a coordinator. Moves forward only: not ready, then ready.
#[derive(Debug, Clone, Default)]
pub struct ReadinessState {
    pub is_ready: bool,
    /// Configuration resolved by the latest `init`
    pub config: Option<Arc<PushConfig>>,
}

/// Where the coordinator stands in its registration lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationState {
    /// No attempt in flight and no token yet
    Idle,
    /// Exclusivity lock held, waiting for readiness or the backend
    Registering,
    /// A token has been issued and no attempt is in flight
    Registered,
}

impl RegistrationState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Registering)
    }
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Registering => write!(f, "registering"),
            Self::Registered => write!(f, "registered"),
        }
    }
}

impl std::str::FromStr for RegistrationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "registering" => Ok(Self::Registering),
            "registered" => Ok(Self::Registered),
            _ => Err(format!("Invalid registration state: {s}")),
        }
    }
}

impl Default for RegistrationState {
    fn default() -> Self {
        Self::Idle
    }
}
