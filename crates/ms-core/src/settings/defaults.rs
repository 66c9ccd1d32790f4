use super::model::*;

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            session_ttl: default_session_ttl(),
            approval_timeout: default_approval_timeout(),
            protocol_version: default_protocol_version(),
        }
    }
}

impl Default for KeySyncSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
        }
    }
}
