use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use escrow_crypto::{decrypt, encrypt, EscrowKey};

use crate::client::{ChainClient, CreatedWallet, SentTransfer, Transfer, WalletVersion};
use crate::error::ChainError;

const FEE_RESERVE: f64 = 0.05;

struct WalletState {
    mnemonic: String,
    balance: f64,
    incoming: Vec<Transfer>,
    deployed: bool,
}

/// In-memory `ChainClient` used by tests and local development. Never
/// touches a real network; deposits are injected via [`MockChainClient::credit`]
/// to drive deterministic scenarios (spec §8).
pub struct MockChainClient {
    key: EscrowKey,
    wallets: Mutex<HashMap<String, WalletState>>,
}

impl MockChainClient {
    pub fn new(key: EscrowKey) -> Self {
        Self {
            key,
            wallets: Mutex::new(HashMap::new()),
        }
    }

    fn random_mnemonic() -> String {
        const WORDS: &[&str] = &[
            "topic", "buzz", "sunny", "fabric", "weasel", "orbit", "tiger", "panel", "custom",
            "glow", "ridge", "humor", "acid", "brisk", "cedar", "drift", "ember", "flock",
            "grove", "husk", "ivory", "joust", "knoll", "lilac",
        ];
        let mut rng = rand::thread_rng();
        (0..24)
            .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn random_address() -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..46)
            .map(|_| {
                let n = rng.gen_range(0..36);
                std::char::from_digit(n, 36).unwrap()
            })
            .collect();
        format!("EQ{}", suffix)
    }

    /// Test/dev hook: credit `address` with an incoming transfer as if it had
    /// arrived on-chain. Also bumps the cached balance so `get_balance`
    /// reflects it without a separate chain round-trip.
    pub fn credit(&self, address: &str, transfer: Transfer) {
        let mut wallets = self.wallets.lock().expect("mock chain lock poisoned");
        if let Some(w) = wallets.get_mut(address) {
            w.balance += transfer.amount;
            w.incoming.insert(0, transfer);
        }
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn create_wallet(&self) -> Result<CreatedWallet, ChainError> {
        let mnemonic = Self::random_mnemonic();
        let address = Self::random_address();
        let encrypted_mnemonic = encrypt(&self.key, &mnemonic);

        let mut wallets = self.wallets.lock().expect("mock chain lock poisoned");
        wallets.insert(
            address.clone(),
            WalletState {
                mnemonic,
                balance: 0.0,
                incoming: Vec::new(),
                deployed: false,
            },
        );

        Ok(CreatedWallet {
            address,
            encrypted_mnemonic,
            version: WalletVersion::V4R2,
        })
    }

    async fn get_balance(&self, address: &str) -> Result<f64, ChainError> {
        let wallets = self.wallets.lock().expect("mock chain lock poisoned");
        wallets
            .get(address)
            .map(|w| w.balance)
            .ok_or_else(|| ChainError::InvalidAddress(address.to_string()))
    }

    async fn list_incoming(&self, address: &str, limit: usize) -> Result<Vec<Transfer>, ChainError> {
        let wallets = self.wallets.lock().expect("mock chain lock poisoned");
        let w = wallets
            .get(address)
            .ok_or_else(|| ChainError::InvalidAddress(address.to_string()))?;
        Ok(w.incoming.iter().take(limit).cloned().collect())
    }

    async fn send(
        &self,
        encrypted_mnemonic: &str,
        to: &str,
        amount: f64,
        comment: Option<&str>,
    ) -> Result<SentTransfer, ChainError> {
        if amount <= FEE_RESERVE {
            return Err(ChainError::InsufficientForFee(amount));
        }
        decrypt(&self.key, encrypted_mnemonic).map_err(|e| ChainError::Rpc(e.to_string()))?;

        // `amount` is the net transfer the caller wants delivered; the fee
        // reserve is withheld from the sender's balance here, not re-derived
        // from it, so callers that already reserved a fee don't pay it twice.
        let mut wallets = self.wallets.lock().expect("mock chain lock poisoned");
        let from_address = wallets
            .iter()
            .find(|(_, w)| w.mnemonic.len() > 0 && w.balance >= amount + FEE_RESERVE)
            .map(|(addr, _)| addr.clone());

        let Some(from_address) = from_address else {
            return Err(ChainError::UndeployedWallet);
        };

        if let Some(w) = wallets.get_mut(&from_address) {
            w.balance -= amount;
            w.deployed = true;
        }

        let tx_hash = format!("{:x}", rand::thread_rng().gen::<u128>());
        wallets.entry(to.to_string()).or_insert_with(|| WalletState {
            mnemonic: String::new(),
            balance: 0.0,
            incoming: Vec::new(),
            deployed: true,
        });
        if let Some(w) = wallets.get_mut(to) {
            w.balance += amount;
            w.incoming.insert(
                0,
                Transfer {
                    tx_hash: tx_hash.clone(),
                    logical_time: 0,
                    timestamp: Utc::now(),
                    amount,
                    source: from_address,
                    destination: to.to_string(),
                    comment: comment.map(|s| s.to_string()),
                },
            );
        }

        Ok(SentTransfer { tx_hash })
    }
}
