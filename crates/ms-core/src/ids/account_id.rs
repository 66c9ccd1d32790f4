use serde::{Deserialize, Serialize};

use super::id_macro::impl_id;

/// Identifier of a sync-group account.
///
/// Assigned by the backend when the account was created on the phone; the
/// desktop learns it from the approval outcome and uses it to key envelopes,
/// installed keypairs and cache invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl_id!(AccountId);
