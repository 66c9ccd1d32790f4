//! Scannable pairing payload encoding.
//!
//! The payload is a compact, versioned string; how it gets rendered (QR
//! image, deep link, copy button) is up to the embedding UI. The only
//! contract is that a scanning device can recover the token and the
//! protocol version from the string.
//!
//! Format: `msync:v<version>:<token>[:<routing hint>]`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::PairingToken;

/// Current pairing protocol version.
pub const PROTOCOL_VERSION: u32 = 2;

/// Scheme prefix shared by all payload versions.
const PAYLOAD_SCHEME: &str = "msync";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QrPayloadError {
    #[error("payload does not start with the '{PAYLOAD_SCHEME}' scheme")]
    UnknownScheme,

    #[error("malformed version field: {0}")]
    MalformedVersion(String),

    /// The payload was produced by a newer protocol than this build speaks.
    #[error("unsupported payload version {found} (max supported {PROTOCOL_VERSION})")]
    UnsupportedVersion { found: u32 },

    #[error("payload is missing the pairing token")]
    MissingToken,
}

/// Parsed form of the scannable payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    pub version: u32,
    pub token: PairingToken,
    /// Opaque routing hint for the scanning device (e.g. a regional backend
    /// endpoint). Not interpreted by this core.
    pub routing_hint: Option<String>,
}

impl QrPayload {
    pub fn new(token: PairingToken) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            token,
            routing_hint: None,
        }
    }

    pub fn with_routing_hint(mut self, hint: impl Into<String>) -> Self {
        self.routing_hint = Some(hint.into());
        self
    }

    /// Render the payload string.
    pub fn encode(&self) -> String {
        match &self.routing_hint {
            Some(hint) => format!("{}:v{}:{}:{}", PAYLOAD_SCHEME, self.version, self.token, hint),
            None => format!("{}:v{}:{}", PAYLOAD_SCHEME, self.version, self.token),
        }
    }

    /// Parse a payload string back into its parts.
    ///
    /// Rejects unknown schemes and versions newer than [`PROTOCOL_VERSION`];
    /// older versions still parse so a newer phone can pair an older desktop.
    pub fn parse(input: &str) -> Result<Self, QrPayloadError> {
        let mut parts = input.splitn(4, ':');

        match parts.next() {
            Some(PAYLOAD_SCHEME) => {}
            _ => return Err(QrPayloadError::UnknownScheme),
        }

        let version_field = parts.next().unwrap_or_default();
        let version = version_field
            .strip_prefix('v')
            .ok_or_else(|| QrPayloadError::MalformedVersion(version_field.to_string()))?
            .parse::<u32>()
            .map_err(|_| QrPayloadError::MalformedVersion(version_field.to_string()))?;
        if version > PROTOCOL_VERSION {
            return Err(QrPayloadError::UnsupportedVersion { found: version });
        }

        let token = match parts.next() {
            Some(t) if !t.is_empty() => PairingToken::from(t),
            _ => return Err(QrPayloadError::MissingToken),
        };

        let routing_hint = parts.next().filter(|h| !h.is_empty()).map(str::to_string);

        Ok(Self {
            version,
            token,
            routing_hint,
        })
    }
}

impl std::fmt::Display for QrPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}
