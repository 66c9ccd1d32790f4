//! ID type wrappers for type safety.

pub mod account_id;
pub mod device_id;
mod id_macro;
pub mod token;

pub use account_id::AccountId;
pub use device_id::DeviceId;
pub use token::{PairingToken, TokenError};
