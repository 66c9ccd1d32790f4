use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ids::{PairingToken, TokenError};
use crate::settings::PairingSettings;

use super::qr::QrPayload;

/// Domain separator for the session fingerprint hash.
const FINGERPRINT_CONTEXT: &[u8] = b"mirrorsync.pairing.fingerprint.v1";

/// One attempt at pairing a new device, anchored by a fresh token.
///
/// A session is a value, not an actor: expiry is decided by comparing
/// `expires_at` against a caller-supplied clock so the type stays testable
/// without sleeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingSession {
    pub token: PairingToken,
    pub qr_payload: QrPayload,
    pub expires_at: DateTime<Utc>,
    pub version: u32,
}

impl PairingSession {
    /// Issue a new session with a freshly generated token.
    pub fn issue(settings: &PairingSettings, now: DateTime<Utc>) -> Result<Self, TokenError> {
        let token = PairingToken::generate()?;
        let qr_payload = QrPayload::new(token.clone());
        let ttl = Duration::seconds(settings.session_ttl.as_secs().min(i64::MAX as u64) as i64);
        Ok(Self {
            token,
            version: qr_payload.version,
            qr_payload,
            expires_at: now + ttl,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Time left before expiry, clamped to zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    /// Short human-checkable fingerprint of the session token, rendered as
    /// two base32 groups (`ABCD-EFGH`). Shown next to the QR code so users
    /// can eyeball that both screens talk about the same session.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(FINGERPRINT_CONTEXT);
        hasher.update(self.token.as_str().as_bytes());
        let digest = hasher.finalize();

        let encoded = base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &digest[..5]);
        format!("{}-{}", &encoded[..4], &encoded[4..8])
    }
}
