use crate::domain::value_objects::NetworkType;
use serde::{Deserialize, Serialize};

/// Authoritative reachability signal. `is_online` reflects confirmed
/// internet reachability, not merely a present radio link. Never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectivityState {
    pub is_online: bool,
    pub network_type: NetworkType,
}

impl ConnectivityState {
    pub fn online(network_type: NetworkType) -> Self {
        Self {
            is_online: true,
            network_type,
        }
    }

    pub fn offline() -> Self {
        Self {
            is_online: false,
            network_type: NetworkType::None,
        }
    }

    /// Initial state before the first reachability probe has answered.
    pub fn unknown() -> Self {
        Self {
            is_online: false,
            network_type: NetworkType::Unknown,
        }
    }
}

impl Default for ConnectivityState {
    fn default() -> Self {
        Self::unknown()
    }
}
