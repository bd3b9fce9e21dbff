use std::sync::Arc;

use chrono::Utc;
use escrow_chain::ChainClient;
use escrow_core::{
    DealId, DealStatus, EscrowError, EscrowWallet, TxKind, TxStatus, WalletVersion as CoreWalletVersion,
};
use escrow_crypto::EscrowKey;
use escrow_store::Store;
use tracing::{info, warn};

const FEE_RESERVE: f64 = escrow_core::FEE_RESERVE_WHOLE_UNITS;
const DEPOSIT_SHORTFALL_TOLERANCE: f64 = escrow_core::DEPOSIT_SHORTFALL_TOLERANCE;
const FUNDED_THRESHOLD_RATIO: f64 = escrow_core::FUNDED_THRESHOLD_RATIO;

#[derive(Debug, Clone)]
pub struct EscrowStatus {
    pub address: String,
    pub expected: f64,
    pub current: f64,
    pub is_funded: bool,
    pub last_checked: chrono::DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SettlementReceipt {
    pub amount: f64,
    pub tx_hash: String,
}

fn chain_version_to_core(v: escrow_chain::WalletVersion) -> CoreWalletVersion {
    match v {
        escrow_chain::WalletVersion::V4R2 => CoreWalletVersion::V4R2,
    }
}

/// Orchestrates wallet creation, deposit detection, release, and refund.
/// Grounded on the validate-then-mutate-then-notify order used elsewhere in
/// this codebase for state-changing operations (spec §4.7).
pub struct EscrowService {
    store: Arc<Store>,
    chain: Arc<dyn ChainClient>,
}

impl EscrowService {
    pub fn new(store: Arc<Store>, chain: Arc<dyn ChainClient>) -> Self {
        Self { store, chain }
    }

    /// Idempotent: returns the existing wallet if one was already created
    /// for this deal (I1).
    pub async fn create_wallet(&self, deal_id: DealId) -> Result<EscrowWallet, EscrowError> {
        if let Some(existing) = self.store.get_wallet_by_deal(deal_id)? {
            return Ok(existing);
        }
        // Ensure the deal exists before spending a chain call on it.
        self.store.get_deal(deal_id)?;

        let created = self
            .chain
            .create_wallet()
            .await
            .map_err(|e| EscrowError::Chain(e.to_string()))?;

        let wallet = EscrowWallet {
            id: 0,
            deal_id,
            address: created.address,
            encrypted_mnemonic: created.encrypted_mnemonic,
            version: chain_version_to_core(created.version),
            cached_balance: 0.0,
            last_checked: Utc::now(),
        };
        let wallet = self.store.create_wallet(wallet)?;
        info!(deal_id, address = %wallet.address, "escrow wallet created");
        Ok(wallet)
    }

    pub async fn get_status(&self, deal_id: DealId) -> Result<EscrowStatus, EscrowError> {
        let deal = self.store.get_deal(deal_id)?;
        let mut wallet = self
            .store
            .get_wallet_by_deal(deal_id)?
            .ok_or(EscrowError::WalletNotFound(deal_id))?;

        let current = self
            .chain
            .get_balance(&wallet.address)
            .await
            .map_err(|e| EscrowError::Chain(e.to_string()))?;

        wallet.cached_balance = current;
        wallet.last_checked = Utc::now();
        self.store.put_wallet(&wallet)?;

        let is_funded = current >= FUNDED_THRESHOLD_RATIO * deal.escrow_amount;
        Ok(EscrowStatus {
            address: wallet.address,
            expected: deal.escrow_amount,
            current,
            is_funded,
            last_checked: wallet.last_checked,
        })
    }

    /// Sum incoming transfers; if they meet the funded threshold, transition
    /// `pending|accepted → funded` and record a DEPOSIT row. Safe to call
    /// repeatedly — the DEPOSIT insert is idempotent by `tx_hash`.
    pub async fn verify_deposit(
        &self,
        deal_id: DealId,
        sender_address_hint: Option<&str>,
    ) -> Result<EscrowStatus, EscrowError> {
        let deal = self.store.get_deal(deal_id)?;
        let wallet = self
            .store
            .get_wallet_by_deal(deal_id)?
            .ok_or(EscrowError::WalletNotFound(deal_id))?;

        let transfers = self
            .chain
            .list_incoming(&wallet.address, 50)
            .await
            .map_err(|e| EscrowError::Chain(e.to_string()))?;

        let total: f64 = transfers.iter().map(|t| t.amount).sum();
        let threshold = deal.escrow_amount * (1.0 - DEPOSIT_SHORTFALL_TOLERANCE);
        let is_funded = total >= threshold;

        if is_funded && matches!(deal.status, DealStatus::Pending | DealStatus::Accepted) {
            let from = deal.status;
            let sender = sender_address_hint
                .map(|s| s.to_string())
                .or_else(|| transfers.first().map(|t| t.source.clone()));

            self.store
                .cas_deal_status(deal_id, from, DealStatus::Funded, deal.advertiser_id, |d| {
                    d.deposit_sender = sender.clone();
                })?;

            if let Some(top) = transfers.first() {
                self.store.insert_transaction_idempotent(&escrow_core::EscrowTransaction {
                    wallet_id: wallet.id,
                    tx_hash: top.tx_hash.clone(),
                    kind: TxKind::Deposit,
                    amount: top.amount,
                    from_address: Some(top.source.clone()),
                    to_address: Some(wallet.address.clone()),
                    status: TxStatus::Confirmed,
                })?;
            }
            info!(deal_id, total, "deposit verified, deal funded");
        }

        Ok(EscrowStatus {
            address: wallet.address,
            expected: deal.escrow_amount,
            current: total,
            is_funded,
            last_checked: Utc::now(),
        })
    }

    /// `funded|posted|verified → completed`. Resolves destination as
    /// `destination_hint ?? deal.channel_owner_wallet ?? channel.owner_wallet`.
    pub async fn release(
        &self,
        deal_id: DealId,
        destination_hint: Option<&str>,
    ) -> Result<SettlementReceipt, EscrowError> {
        let deal = self.store.get_deal(deal_id)?;
        if deal.status.is_terminal() {
            return Err(EscrowError::TerminalDeal(deal_id));
        }
        if !matches!(deal.status, DealStatus::Funded | DealStatus::Posted | DealStatus::Verified) {
            return Err(EscrowError::InvalidTransition {
                from: deal.status,
                to: DealStatus::Completed,
                allowed: deal.status.allowed_next().to_vec(),
            });
        }

        let channel = self.store.get_channel(deal.channel_id)?;
        let destination = destination_hint
            .map(|s| s.to_string())
            .or_else(|| deal.channel_owner_wallet.clone())
            .or_else(|| channel.and_then(|c| c.owner_wallet))
            .ok_or(EscrowError::NoDestination(deal_id))?;

        let wallet = self
            .store
            .get_wallet_by_deal(deal_id)?
            .ok_or(EscrowError::WalletNotFound(deal_id))?;

        let balance = self
            .chain
            .get_balance(&wallet.address)
            .await
            .map_err(|e| EscrowError::Chain(e.to_string()))?;
        if balance <= FEE_RESERVE {
            return Err(EscrowError::Chain(escrow_chain::ChainError::InsufficientForFee(balance).to_string()));
        }

        let sendable = balance - FEE_RESERVE;
        let sent = self
            .chain
            .send(&wallet.encrypted_mnemonic, &destination, sendable, Some("escrow release"))
            .await
            .map_err(|e| EscrowError::Chain(e.to_string()))?;

        self.store.insert_transaction_idempotent(&escrow_core::EscrowTransaction {
            wallet_id: wallet.id,
            tx_hash: sent.tx_hash.clone(),
            kind: TxKind::Release,
            amount: sendable,
            from_address: Some(wallet.address.clone()),
            to_address: Some(destination),
            status: TxStatus::Confirmed,
        })?;

        self.store
            .cas_deal_status(deal_id, deal.status, DealStatus::Completed, deal.advertiser_id, |_| {})?;
        info!(deal_id, amount = sendable, "escrow released");

        Ok(SettlementReceipt {
            amount: sendable,
            tx_hash: sent.tx_hash,
        })
    }

    /// Symmetric to [`EscrowService::release`]: destination is
    /// `hint ?? deal.advertiser_wallet`.
    pub async fn refund(
        &self,
        deal_id: DealId,
        destination_hint: Option<&str>,
    ) -> Result<SettlementReceipt, EscrowError> {
        let deal = self.store.get_deal(deal_id)?;
        if deal.status.is_terminal() {
            return Err(EscrowError::TerminalDeal(deal_id));
        }
        if !matches!(deal.status, DealStatus::Funded | DealStatus::Posted | DealStatus::Verified) {
            return Err(EscrowError::InvalidTransition {
                from: deal.status,
                to: DealStatus::Refunded,
                allowed: deal.status.allowed_next().to_vec(),
            });
        }

        let destination = destination_hint
            .map(|s| s.to_string())
            .or_else(|| deal.advertiser_wallet.clone())
            .ok_or(EscrowError::NoDestination(deal_id))?;

        let wallet = self
            .store
            .get_wallet_by_deal(deal_id)?
            .ok_or(EscrowError::WalletNotFound(deal_id))?;

        let balance = self
            .chain
            .get_balance(&wallet.address)
            .await
            .map_err(|e| EscrowError::Chain(e.to_string()))?;
        if balance <= FEE_RESERVE {
            warn!(deal_id, balance, "refund below fee reserve, nothing to send");
            return Err(EscrowError::Chain(escrow_chain::ChainError::InsufficientForFee(balance).to_string()));
        }

        let sendable = balance - FEE_RESERVE;
        let sent = self
            .chain
            .send(&wallet.encrypted_mnemonic, &destination, sendable, Some("escrow refund"))
            .await
            .map_err(|e| EscrowError::Chain(e.to_string()))?;

        self.store.insert_transaction_idempotent(&escrow_core::EscrowTransaction {
            wallet_id: wallet.id,
            tx_hash: sent.tx_hash.clone(),
            kind: TxKind::Refund,
            amount: sendable,
            from_address: Some(wallet.address.clone()),
            to_address: Some(destination),
            status: TxStatus::Confirmed,
        })?;

        self.store
            .cas_deal_status(deal_id, deal.status, DealStatus::Refunded, deal.advertiser_id, |_| {})?;
        info!(deal_id, amount = sendable, "escrow refunded");

        Ok(SettlementReceipt {
            amount: sendable,
            tx_hash: sent.tx_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escrow_chain::{MockChainClient, Transfer};
    use escrow_core::{Channel, Deal};

    fn temp_store(name: &str) -> (Arc<Store>, std::path::PathBuf) {
        use std::time::{SystemTime, UNIX_EPOCH};
        let suffix = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let dir = std::env::temp_dir().join(format!("escrow_service_test_{name}_{suffix}"));
        (Arc::new(Store::open(&dir).unwrap()), dir)
    }

    fn cleanup(dir: std::path::PathBuf) {
        let _ = std::fs::remove_dir_all(dir);
    }

    fn seed_deal(store: &Store) -> Deal {
        store
            .create_channel(Channel {
                id: 0,
                platform_channel_id: 1,
                username: "foo".into(),
                display_name: "Foo".into(),
                category: "news".into(),
                price_per_post: 5.0,
                subscriber_count: 100,
                bot_is_admin: true,
                bot_can_post: true,
                verified: true,
                owner_wallet: Some("EQownerfallback".into()),
            })
            .unwrap();
        store
            .create_deal(Deal {
                id: 0,
                campaign_id: None,
                channel_id: 1,
                advertiser_id: 1,
                status: DealStatus::Accepted,
                escrow_amount: 5.0,
                advertiser_wallet: Some("EQadvertiser".into()),
                channel_owner_wallet: None,
                deposit_sender: None,
                message_id: None,
                posted_at: None,
                hold_hours: None,
                created_at: Utc::now(),
            })
            .unwrap()
    }

    #[tokio::test]
    async fn create_wallet_is_idempotent() {
        let (store, dir) = temp_store("idempotent");
        let deal = seed_deal(&store);
        let chain: Arc<dyn ChainClient> = Arc::new(MockChainClient::new(EscrowKey::generate()));
        let service = EscrowService::new(store.clone(), chain);

        let first = service.create_wallet(deal.id).await.unwrap();
        let second = service.create_wallet(deal.id).await.unwrap();
        assert_eq!(first.address, second.address);
        cleanup(dir);
    }

    #[tokio::test]
    async fn verify_deposit_funds_deal_and_records_transaction_once() {
        let (store, dir) = temp_store("deposit");
        let deal = seed_deal(&store);
        let chain = Arc::new(MockChainClient::new(EscrowKey::generate()));
        let chain_dyn: Arc<dyn ChainClient> = chain.clone();
        let service = EscrowService::new(store.clone(), chain_dyn);

        let wallet = service.create_wallet(deal.id).await.unwrap();
        chain.credit(
            &wallet.address,
            Transfer {
                tx_hash: "H1".into(),
                logical_time: 1,
                timestamp: Utc::now(),
                amount: 5.0,
                source: "EQsender".into(),
                destination: wallet.address.clone(),
                comment: None,
            },
        );

        let status = service.verify_deposit(deal.id, None).await.unwrap();
        assert!(status.is_funded);
        let deal_after = store.get_deal(deal.id).unwrap();
        assert_eq!(deal_after.status, DealStatus::Funded);

        // second call must not duplicate the DEPOSIT row
        service.verify_deposit(deal.id, None).await.unwrap();
        let txs = store.list_transactions_for_wallet(wallet.id).unwrap();
        assert_eq!(txs.len(), 1);
        cleanup(dir);
    }

    #[tokio::test]
    async fn release_on_terminal_deal_is_rejected() {
        let (store, dir) = temp_store("terminal");
        let deal = seed_deal(&store);
        store
            .cas_deal_status(deal.id, DealStatus::Accepted, DealStatus::Cancelled, 1, |_| {})
            .unwrap();
        let chain: Arc<dyn ChainClient> = Arc::new(MockChainClient::new(EscrowKey::generate()));
        let service = EscrowService::new(store.clone(), chain);

        let err = service.release(deal.id, None).await.unwrap_err();
        assert!(matches!(err, EscrowError::TerminalDeal(_)));
        cleanup(dir);
    }
}
