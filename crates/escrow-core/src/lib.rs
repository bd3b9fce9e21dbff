pub mod constants;
pub mod error;
pub mod fsm;
pub mod types;

pub use constants::*;
pub use error::{ErrorKind, EscrowError};
pub use fsm::{validate_transition, Deal, DealStatus};
pub use types::*;
