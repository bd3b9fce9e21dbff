use std::path::Path;

use escrow_core::{
    Campaign, CampaignId, Channel, ChannelAdmin, ChannelId, Deal, DealId, DealStatus,
    DealTransition, EscrowError, EscrowTransaction, EscrowWallet, Role, ScheduledPost, User,
    UserId, WalletId,
};
use sled::Tree;

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, EscrowError> {
    bincode::serialize(value).map_err(|e| EscrowError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, EscrowError> {
    bincode::deserialize(bytes).map_err(|e| EscrowError::Serialization(e.to_string()))
}

fn storage_err(e: sled::Error) -> EscrowError {
    EscrowError::Storage(e.to_string())
}

fn channel_admin_key(channel_id: ChannelId, user_id: UserId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&channel_id.to_be_bytes());
    key[8..].copy_from_slice(&user_id.to_be_bytes());
    key
}

fn transition_key(deal_id: DealId, seq: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&deal_id.to_be_bytes());
    key[8..].copy_from_slice(&seq.to_be_bytes());
    key
}

/// Embedded, durable store backing every entity in the data model. Wraps a
/// `sled::Db` plus one named tree per entity and one per secondary unique
/// index — the compare-and-set primitive on `deals` is the only mechanism
/// by which a Deal's status ever changes (spec §4.1, §9).
pub struct Store {
    db: sled::Db,
    users: Tree,
    users_by_telegram: Tree,
    channels: Tree,
    channels_by_username: Tree,
    channel_admins: Tree,
    campaigns: Tree,
    deals: Tree,
    deal_transitions: Tree,
    escrow_wallets: Tree,
    wallets_by_deal: Tree,
    escrow_transactions: Tree,
    tx_by_hash: Tree,
    scheduled_posts: Tree,
    meta: Tree,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EscrowError> {
        let db = sled::open(path).map_err(storage_err)?;
        Ok(Self {
            users: db.open_tree("users").map_err(storage_err)?,
            users_by_telegram: db.open_tree("users_by_telegram").map_err(storage_err)?,
            channels: db.open_tree("channels").map_err(storage_err)?,
            channels_by_username: db.open_tree("channels_by_username").map_err(storage_err)?,
            channel_admins: db.open_tree("channel_admins").map_err(storage_err)?,
            campaigns: db.open_tree("campaigns").map_err(storage_err)?,
            deals: db.open_tree("deals").map_err(storage_err)?,
            deal_transitions: db.open_tree("deal_transitions").map_err(storage_err)?,
            escrow_wallets: db.open_tree("escrow_wallets").map_err(storage_err)?,
            wallets_by_deal: db.open_tree("wallets_by_deal").map_err(storage_err)?,
            escrow_transactions: db.open_tree("escrow_transactions").map_err(storage_err)?,
            tx_by_hash: db.open_tree("tx_by_hash").map_err(storage_err)?,
            scheduled_posts: db.open_tree("scheduled_posts").map_err(storage_err)?,
            meta: db.open_tree("meta").map_err(storage_err)?,
            db,
        })
    }

    pub fn flush(&self) -> Result<(), EscrowError> {
        self.db.flush().map_err(storage_err)?;
        Ok(())
    }

    /// Atomic auto-increment, keyed by name, backed by the `meta` tree —
    /// mirrors the `next_schema_id`-style counter pattern used elsewhere in
    /// this store for generating primary keys without a round-trip lock.
    fn next_id(&self, counter_key: &str) -> Result<u64, EscrowError> {
        let new_bytes = self
            .meta
            .update_and_fetch(counter_key, |old| {
                let current = old
                    .map(|b| u64::from_be_bytes(b.try_into().unwrap_or([0; 8])))
                    .unwrap_or(0);
                Some((current + 1).to_be_bytes().to_vec())
            })
            .map_err(storage_err)?
            .expect("update_and_fetch with a closure that always returns Some never yields None");
        Ok(u64::from_be_bytes(new_bytes.as_ref().try_into().unwrap()))
    }

    // ── Users ────────────────────────────────────────────────────────────

    pub fn put_user(&self, user: &User) -> Result<(), EscrowError> {
        self.users
            .insert(user.id.to_be_bytes(), encode(user)?)
            .map_err(storage_err)?;
        self.users_by_telegram
            .insert(user.telegram_id.to_be_bytes(), user.id.to_be_bytes().to_vec())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_user(&self, id: UserId) -> Result<Option<User>, EscrowError> {
        match self.users.get(id.to_be_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>, EscrowError> {
        match self
            .users_by_telegram
            .get(telegram_id.to_be_bytes())
            .map_err(storage_err)?
        {
            Some(id_bytes) => {
                let id = UserId::from_be_bytes(id_bytes.as_ref().try_into().unwrap());
                self.get_user(id)
            }
            None => Ok(None),
        }
    }

    /// Upsert-by-telegram_id, mirroring `POST /api/auth`.
    pub fn upsert_user_by_telegram_id(&self, telegram_id: i64) -> Result<User, EscrowError> {
        if let Some(existing) = self.get_user_by_telegram_id(telegram_id)? {
            return Ok(existing);
        }
        let id = self.next_id("users")?;
        let user = User {
            id,
            telegram_id,
            payout_wallet: None,
            created_at: chrono::Utc::now(),
        };
        self.put_user(&user)?;
        Ok(user)
    }

    // ── Channels ─────────────────────────────────────────────────────────

    pub fn put_channel(&self, channel: &Channel) -> Result<(), EscrowError> {
        if self.channels.get(channel.id.to_be_bytes()).map_err(storage_err)?.is_none() {
            if self
                .channels_by_username
                .get(channel.username.as_bytes())
                .map_err(storage_err)?
                .is_some()
            {
                return Err(EscrowError::Duplicate {
                    entity: "channel",
                    key: channel.username.clone(),
                });
            }
        }
        self.channels
            .insert(channel.id.to_be_bytes(), encode(channel)?)
            .map_err(storage_err)?;
        self.channels_by_username
            .insert(channel.username.as_bytes(), channel.id.to_be_bytes().to_vec())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_channel(&self, id: ChannelId) -> Result<Option<Channel>, EscrowError> {
        match self.channels.get(id.to_be_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn list_channels(&self) -> Result<Vec<Channel>, EscrowError> {
        self.channels
            .iter()
            .values()
            .map(|v| decode(&v.map_err(storage_err)?))
            .collect()
    }

    pub fn create_channel(&self, mut channel: Channel) -> Result<Channel, EscrowError> {
        channel.id = self.next_id("channels")?;
        self.put_channel(&channel)?;
        Ok(channel)
    }

    // ── Channel admins ───────────────────────────────────────────────────

    pub fn put_channel_admin(&self, admin: &ChannelAdmin) -> Result<(), EscrowError> {
        let key = channel_admin_key(admin.channel_id, admin.user_id);
        self.channel_admins
            .insert(key, encode(admin)?)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_channel_admin(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<Option<ChannelAdmin>, EscrowError> {
        let key = channel_admin_key(channel_id, user_id);
        match self.channel_admins.get(key).map_err(storage_err)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn delete_channel_admin(&self, channel_id: ChannelId, user_id: UserId) -> Result<(), EscrowError> {
        let key = channel_admin_key(channel_id, user_id);
        self.channel_admins.remove(key).map_err(storage_err)?;
        Ok(())
    }

    pub fn list_channel_admins(&self, channel_id: ChannelId) -> Result<Vec<ChannelAdmin>, EscrowError> {
        let prefix = channel_id.to_be_bytes();
        self.channel_admins
            .scan_prefix(prefix)
            .values()
            .map(|v| decode(&v.map_err(storage_err)?))
            .collect()
    }

    // ── Campaigns ────────────────────────────────────────────────────────

    pub fn create_campaign(&self, mut campaign: Campaign) -> Result<Campaign, EscrowError> {
        campaign.id = self.next_id("campaigns")?;
        self.campaigns
            .insert(campaign.id.to_be_bytes(), encode(&campaign)?)
            .map_err(storage_err)?;
        Ok(campaign)
    }

    pub fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>, EscrowError> {
        match self.campaigns.get(id.to_be_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    // ── Deals ────────────────────────────────────────────────────────────

    pub fn create_deal(&self, mut deal: Deal) -> Result<Deal, EscrowError> {
        deal.id = self.next_id("deals")?;
        self.deals
            .insert(deal.id.to_be_bytes(), encode(&deal)?)
            .map_err(storage_err)?;
        Ok(deal)
    }

    pub fn get_deal(&self, id: DealId) -> Result<Deal, EscrowError> {
        match self.deals.get(id.to_be_bytes()).map_err(storage_err)? {
            Some(bytes) => decode(&bytes),
            None => Err(EscrowError::DealNotFound(id)),
        }
    }

    pub fn list_deals(&self) -> Result<Vec<Deal>, EscrowError> {
        self.deals
            .iter()
            .values()
            .map(|v| decode(&v.map_err(storage_err)?))
            .collect()
    }

    /// Persist an update to a deal's non-status fields (escrow amount,
    /// message id, etc.) without going through the CAS status path. Callers
    /// must not use this to change `status` — use [`Store::cas_deal_status`].
    pub fn put_deal(&self, deal: &Deal) -> Result<(), EscrowError> {
        self.deals
            .insert(deal.id.to_be_bytes(), encode(deal)?)
            .map_err(storage_err)?;
        Ok(())
    }

    /// Atomically move `deal_id` from `from` to `to`, and record the audit
    /// row (I4). Returns `EscrowError::ConcurrentModification` if the deal's
    /// observed status no longer matches `from` by the time the compare runs.
    pub fn cas_deal_status(
        &self,
        deal_id: DealId,
        from: DealStatus,
        to: DealStatus,
        actor_id: UserId,
        mutate: impl FnOnce(&mut Deal),
    ) -> Result<Deal, EscrowError> {
        let key = deal_id.to_be_bytes();
        let current_bytes = self
            .deals
            .get(key)
            .map_err(storage_err)?
            .ok_or(EscrowError::DealNotFound(deal_id))?;
        let mut deal: Deal = decode(&current_bytes)?;
        if deal.status != from {
            return Err(EscrowError::ConcurrentModification(deal_id));
        }
        deal.status = to;
        mutate(&mut deal);
        let new_bytes = encode(&deal)?;

        let swapped = self
            .deals
            .compare_and_swap(key, Some(current_bytes.as_ref()), Some(new_bytes))
            .map_err(storage_err)?;
        if swapped.is_err() {
            return Err(EscrowError::ConcurrentModification(deal_id));
        }

        let seq = self.next_id(&format!("deal_transitions:{deal_id}"))?;
        let transition = DealTransition {
            deal_id,
            from_status: from.to_string(),
            to_status: to.to_string(),
            actor_id,
            at: chrono::Utc::now(),
        };
        self.deal_transitions
            .insert(transition_key(deal_id, seq), encode(&transition)?)
            .map_err(storage_err)?;

        Ok(deal)
    }

    pub fn list_transitions(&self, deal_id: DealId) -> Result<Vec<DealTransition>, EscrowError> {
        let prefix = deal_id.to_be_bytes();
        self.deal_transitions
            .scan_prefix(prefix)
            .values()
            .map(|v| decode(&v.map_err(storage_err)?))
            .collect()
    }

    // ── Escrow wallets ───────────────────────────────────────────────────

    pub fn get_wallet_by_deal(&self, deal_id: DealId) -> Result<Option<EscrowWallet>, EscrowError> {
        match self.wallets_by_deal.get(deal_id.to_be_bytes()).map_err(storage_err)? {
            Some(id_bytes) => {
                let id = WalletId::from_be_bytes(id_bytes.as_ref().try_into().unwrap());
                match self.escrow_wallets.get(id.to_be_bytes()).map_err(storage_err)? {
                    Some(bytes) => Ok(Some(decode(&bytes)?)),
                    None => Ok(None),
                }
            }
            None => Ok(None),
        }
    }

    /// Create a wallet for `deal_id`. Enforces I1 (`UNIQUE(deal_id)`) — a
    /// second call for the same deal is a `Duplicate` error; callers that
    /// want idempotent "create-or-return" semantics (spec §4.7) should check
    /// [`Store::get_wallet_by_deal`] first.
    pub fn create_wallet(&self, mut wallet: EscrowWallet) -> Result<EscrowWallet, EscrowError> {
        if self.get_wallet_by_deal(wallet.deal_id)?.is_some() {
            return Err(EscrowError::Duplicate {
                entity: "escrow_wallet",
                key: wallet.deal_id.to_string(),
            });
        }
        wallet.id = self.next_id("escrow_wallets")?;
        self.escrow_wallets
            .insert(wallet.id.to_be_bytes(), encode(&wallet)?)
            .map_err(storage_err)?;
        self.wallets_by_deal
            .insert(wallet.deal_id.to_be_bytes(), wallet.id.to_be_bytes().to_vec())
            .map_err(storage_err)?;
        Ok(wallet)
    }

    pub fn put_wallet(&self, wallet: &EscrowWallet) -> Result<(), EscrowError> {
        self.escrow_wallets
            .insert(wallet.id.to_be_bytes(), encode(wallet)?)
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Escrow transactions ──────────────────────────────────────────────

    /// Insert a transaction row. `UNIQUE(tx_hash)` makes this idempotent:
    /// inserting the same hash twice is a silent no-op, not an error,
    /// matching the "repeated VerifyDeposit is safe" guarantee (spec §5).
    pub fn insert_transaction_idempotent(&self, tx: &EscrowTransaction) -> Result<bool, EscrowError> {
        let inserted = self
            .tx_by_hash
            .compare_and_swap(tx.tx_hash.as_bytes(), None as Option<&[u8]>, Some(encode(tx)?))
            .map_err(storage_err)?
            .is_ok();
        if inserted {
            self.escrow_transactions
                .insert(tx.tx_hash.as_bytes(), encode(tx)?)
                .map_err(storage_err)?;
        }
        Ok(inserted)
    }

    pub fn list_transactions_for_wallet(&self, wallet_id: WalletId) -> Result<Vec<EscrowTransaction>, EscrowError> {
        let all: Vec<EscrowTransaction> = self
            .escrow_transactions
            .iter()
            .values()
            .map(|v| decode::<EscrowTransaction>(&v.map_err(storage_err)?))
            .collect::<Result<_, EscrowError>>()?;
        Ok(all.into_iter().filter(|tx| tx.wallet_id == wallet_id).collect())
    }

    // ── Scheduled posts ──────────────────────────────────────────────────

    pub fn get_scheduled_post(&self, deal_id: DealId) -> Result<Option<ScheduledPost>, EscrowError> {
        match self.scheduled_posts.get(deal_id.to_be_bytes()).map_err(storage_err)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Create a scheduled post for a deal. Enforces I1 (`UNIQUE(deal_id)`).
    pub fn create_scheduled_post(&self, post: ScheduledPost) -> Result<ScheduledPost, EscrowError> {
        let key = post.deal_id.to_be_bytes();
        let inserted = self
            .scheduled_posts
            .compare_and_swap(key, None as Option<&[u8]>, Some(encode(&post)?))
            .map_err(storage_err)?;
        if inserted.is_err() {
            return Err(EscrowError::Duplicate {
                entity: "scheduled_post",
                key: post.deal_id.to_string(),
            });
        }
        Ok(post)
    }

    pub fn put_scheduled_post(&self, post: &ScheduledPost) -> Result<(), EscrowError> {
        self.scheduled_posts
            .insert(post.deal_id.to_be_bytes(), encode(post)?)
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn delete_scheduled_post(&self, deal_id: DealId) -> Result<(), EscrowError> {
        self.scheduled_posts.remove(deal_id.to_be_bytes()).map_err(storage_err)?;
        Ok(())
    }

    pub fn list_scheduled_posts_due(&self, now: chrono::DateTime<chrono::Utc>) -> Result<Vec<ScheduledPost>, EscrowError> {
        let posts: Vec<ScheduledPost> = self
            .scheduled_posts
            .iter()
            .values()
            .map(|v| decode(&v.map_err(storage_err)?))
            .collect::<Result<_, EscrowError>>()?;
        Ok(posts
            .into_iter()
            .filter(|p| {
                matches!(p.status, escrow_core::ScheduledPostStatus::Scheduled) && p.scheduled_time <= now
            })
            .collect())
    }

    pub fn list_scheduled_posts_posted(&self) -> Result<Vec<ScheduledPost>, EscrowError> {
        let posts: Vec<ScheduledPost> = self
            .scheduled_posts
            .iter()
            .values()
            .map(|v| decode(&v.map_err(storage_err)?))
            .collect::<Result<_, EscrowError>>()?;
        Ok(posts
            .into_iter()
            .filter(|p| matches!(p.status, escrow_core::ScheduledPostStatus::Posted) && p.message_id.is_some())
            .collect())
    }

    // ── Roles (convenience, used by escrow-permissions) ─────────────────

    pub fn role_of(&self, channel_id: ChannelId, user_id: UserId) -> Result<Option<Role>, EscrowError> {
        Ok(self.get_channel_admin(channel_id, user_id)?.map(|a| a.role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escrow_core::{CampaignStatus, ScheduledPostStatus, TxKind, TxStatus, WalletVersion};

    fn temp_store(name: &str) -> (Store, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("escrow_store_test_{name}_{}", rand_suffix()));
        let store = Store::open(&dir).expect("open sled store");
        (store, dir)
    }

    fn rand_suffix() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos() as u64
    }

    fn cleanup(dir: std::path::PathBuf) {
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn upsert_user_by_telegram_id_is_idempotent() {
        let (store, dir) = temp_store("users");
        let a = store.upsert_user_by_telegram_id(100).unwrap();
        let b = store.upsert_user_by_telegram_id(100).unwrap();
        assert_eq!(a.id, b.id);
        cleanup(dir);
    }

    #[test]
    fn channel_username_is_unique() {
        let (store, dir) = temp_store("channels");
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
                owner_wallet: None,
            })
            .unwrap();
        let second = store.create_channel(Channel {
            id: 0,
            platform_channel_id: 2,
            username: "foo".into(),
            display_name: "Foo2".into(),
            category: "news".into(),
            price_per_post: 5.0,
            subscriber_count: 100,
            bot_is_admin: true,
            bot_can_post: true,
            verified: true,
            owner_wallet: None,
        });
        assert!(second.is_err());
        cleanup(dir);
    }

    #[test]
    fn wallet_is_unique_per_deal() {
        let (store, dir) = temp_store("wallets");
        let wallet = EscrowWallet {
            id: 0,
            deal_id: 1,
            address: "EQaaa".into(),
            encrypted_mnemonic: "blob".into(),
            version: WalletVersion::V4R2,
            cached_balance: 0.0,
            last_checked: chrono::Utc::now(),
        };
        store.create_wallet(wallet.clone()).unwrap();
        let err = store.create_wallet(wallet).unwrap_err();
        assert!(matches!(err, EscrowError::Duplicate { .. }));
        cleanup(dir);
    }

    #[test]
    fn cas_deal_status_rejects_stale_from() {
        let (store, dir) = temp_store("cas");
        let deal = store
            .create_deal(Deal {
                id: 0,
                campaign_id: None,
                channel_id: 1,
                advertiser_id: 1,
                status: DealStatus::Pending,
                escrow_amount: 5.0,
                advertiser_wallet: None,
                channel_owner_wallet: None,
                deposit_sender: None,
                message_id: None,
                posted_at: None,
                hold_hours: None,
                created_at: chrono::Utc::now(),
            })
            .unwrap();

        let ok = store.cas_deal_status(deal.id, DealStatus::Pending, DealStatus::Accepted, 1, |_| {});
        assert!(ok.is_ok());

        let stale = store.cas_deal_status(deal.id, DealStatus::Pending, DealStatus::Accepted, 1, |_| {});
        assert!(matches!(stale, Err(EscrowError::ConcurrentModification(_))));

        let transitions = store.list_transitions(deal.id).unwrap();
        assert_eq!(transitions.len(), 1);
        cleanup(dir);
    }

    #[test]
    fn concurrent_transition_race_has_exactly_one_winner() {
        use std::sync::Arc;
        use std::thread;

        let (store, dir) = temp_store("race");
        let store = Arc::new(store);
        let deal = store
            .create_deal(Deal {
                id: 0,
                campaign_id: None,
                channel_id: 1,
                advertiser_id: 1,
                status: DealStatus::Pending,
                escrow_amount: 5.0,
                advertiser_wallet: None,
                channel_owner_wallet: None,
                deposit_sender: None,
                message_id: None,
                posted_at: None,
                hold_hours: None,
                created_at: chrono::Utc::now(),
            })
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                let deal_id = deal.id;
                thread::spawn(move || store.cas_deal_status(deal_id, DealStatus::Pending, DealStatus::Accepted, 1, |_| {}).is_ok())
            })
            .collect();

        let wins = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
        assert_eq!(wins, 1);

        let final_deal = store.get_deal(deal.id).unwrap();
        assert_eq!(final_deal.status, DealStatus::Accepted);
        cleanup(dir);
    }

    #[test]
    fn transaction_insert_is_idempotent_by_hash() {
        let (store, dir) = temp_store("tx");
        let tx = EscrowTransaction {
            wallet_id: 1,
            tx_hash: "H1".into(),
            kind: TxKind::Deposit,
            amount: 5.0,
            from_address: Some("EQsender".into()),
            to_address: Some("EQwallet".into()),
            status: TxStatus::Confirmed,
        };
        assert!(store.insert_transaction_idempotent(&tx).unwrap());
        assert!(!store.insert_transaction_idempotent(&tx).unwrap());
        assert_eq!(store.list_transactions_for_wallet(1).unwrap().len(), 1);
        cleanup(dir);
    }

    #[test]
    fn scheduled_post_is_unique_per_deal() {
        let (store, dir) = temp_store("posts");
        let post = ScheduledPost {
            deal_id: 1,
            channel_id: 1,
            text: "ad".into(),
            scheduled_time: chrono::Utc::now(),
            posted_at: None,
            message_id: None,
            hold_hours: 24,
            release_at: None,
            status: ScheduledPostStatus::Scheduled,
            last_verified: None,
        };
        store.create_scheduled_post(post.clone()).unwrap();
        assert!(store.create_scheduled_post(post).is_err());
        cleanup(dir);
    }

    #[test]
    fn campaign_round_trips() {
        let (store, dir) = temp_store("campaign");
        let campaign = store
            .create_campaign(Campaign {
                id: 0,
                advertiser_id: 1,
                title: "Launch".into(),
                text: "ad copy".into(),
                budget: 100.0,
                status: CampaignStatus::Active,
            })
            .unwrap();
        let fetched = store.get_campaign(campaign.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Launch");
        cleanup(dir);
    }
}
