use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ChainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletVersion {
    V4R2,
}

#[derive(Debug, Clone)]
pub struct CreatedWallet {
    pub address: String,
    pub encrypted_mnemonic: String,
    pub version: WalletVersion,
}

#[derive(Debug, Clone)]
pub struct Transfer {
    pub tx_hash: String,
    pub logical_time: u64,
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub source: String,
    pub destination: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SentTransfer {
    pub tx_hash: String,
}

/// Semantic interface to the blockchain. Amounts crossing this boundary are
/// always decimal whole units — the minimal-unit wire format is the concern
/// of the concrete implementation, never of callers.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Generate a fresh mnemonic, derive the wallet, encrypt the mnemonic
    /// exactly once, and return it alongside the user-facing address.
    async fn create_wallet(&self) -> Result<CreatedWallet, ChainError>;

    /// Current balance of `address`, in decimal whole units.
    async fn get_balance(&self, address: &str) -> Result<f64, ChainError>;

    /// Recent incoming transfers to `address`, newest first, capped at `limit`.
    async fn list_incoming(&self, address: &str, limit: usize) -> Result<Vec<Transfer>, ChainError>;

    /// Decrypt `encrypted_mnemonic`, sign, and broadcast a transfer of
    /// `amount` whole units to `to` with an optional comment.
    async fn send(
        &self,
        encrypted_mnemonic: &str,
        to: &str,
        amount: f64,
        comment: Option<&str>,
    ) -> Result<SentTransfer, ChainError>;
}
