use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pairing::PROTOCOL_VERSION;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingSettings {
    /// How long a minted session stays scannable.
    #[serde(default = "default_session_ttl")]
    pub session_ttl: Duration,

    /// How long the approval long-poll may run before the backend reports
    /// expiry. Matches the TTL so the local timer and the backend agree.
    #[serde(default = "default_approval_timeout")]
    pub approval_timeout: Duration,

    #[serde(default = "default_protocol_version")]
    pub protocol_version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySyncSettings {
    /// Envelope poll attempts before giving up with "not ready".
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed spacing between envelope poll attempts.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: Duration,
}

pub(super) fn default_session_ttl() -> Duration {
    Duration::from_secs(300)
}

pub(super) fn default_approval_timeout() -> Duration {
    Duration::from_secs(300)
}

pub(super) fn default_protocol_version() -> u32 {
    PROTOCOL_VERSION
}

pub(super) fn default_max_attempts() -> u32 {
    5
}

pub(super) fn default_retry_delay() -> Duration {
    Duration::from_secs(1)
}
