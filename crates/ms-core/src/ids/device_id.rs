use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Stable local device identifier.
///
/// Generated once per install (uuid v4) and reused across pairing attempts;
/// the embedding app persists it and hands it back through
/// `DeviceIdentityPort`. Key envelopes pushed by the phone are keyed by this
/// id, so it must not change between the approval and the key import.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl_id!(DeviceId);
