pub mod events;
pub mod service;

pub use events::{PairingEventPort, PairingUiEvent};
pub use service::PairingService;
