pub mod client;
pub mod error;
pub mod mock;

pub use client::{ChainClient, CreatedWallet, SentTransfer, Transfer, WalletVersion};
pub use error::ChainError;
pub use mock::MockChainClient;
