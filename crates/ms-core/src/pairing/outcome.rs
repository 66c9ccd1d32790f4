use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, DeviceId};

/// Result of asking the backend what became of a pairing session.
///
/// `Pending` is a normal answer while the other device has not decided yet;
/// everything else is terminal for the session it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingOutcome {
    Pending,
    Approved {
        remote_account_id: AccountId,
        /// Some backends report which device approved; older ones do not.
        remote_device_id: Option<DeviceId>,
    },
    Rejected,
    Expired,
}

impl PairingOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PairingOutcome::Pending)
    }
}
