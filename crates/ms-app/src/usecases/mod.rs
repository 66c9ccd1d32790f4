pub mod keysync;
pub mod pairing;
