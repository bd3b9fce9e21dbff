pub mod cipher;
pub mod error;
pub mod key;

pub use cipher::{decrypt, encrypt};
pub use error::CryptoError;
pub use key::EscrowKey;
