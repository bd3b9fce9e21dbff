mod tick;

use std::sync::Arc;

use chrono::Utc;
use escrow_messaging::MessagingClient;
use escrow_notifier::Notifier;
use escrow_service::EscrowService;
use escrow_store::Store;
use tokio::sync::watch;
use tracing::info;

pub use tick::{run_post_tick, run_verify_tick};

/// Drives the post/verify tick loop on the intervals named in the ambient
/// constants. Owns no state of its own beyond its collaborators — every
/// scheduling decision lives in [`escrow_store::Store`].
pub struct Scheduler {
    store: Arc<Store>,
    messaging: Arc<dyn MessagingClient>,
    service: Arc<EscrowService>,
    notifier: Arc<Notifier>,
}

impl Scheduler {
    pub fn new(
        store: Arc<Store>,
        messaging: Arc<dyn MessagingClient>,
        service: Arc<EscrowService>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            store,
            messaging,
            service,
            notifier,
        }
    }

    /// Run both ticks until `shutdown` fires. The in-flight tick is allowed
    /// to complete — callers are expected to give this the grace period from
    /// `SHUTDOWN_GRACE_SECS` before aborting the task.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut post_interval =
            tokio::time::interval(std::time::Duration::from_secs(escrow_core::POST_TICK_INTERVAL_SECS));
        let mut verify_interval =
            tokio::time::interval(std::time::Duration::from_secs(escrow_core::VERIFY_TICK_INTERVAL_SECS));

        loop {
            tokio::select! {
                _ = post_interval.tick() => {
                    run_post_tick(&self.store, self.messaging.as_ref(), &self.notifier, Utc::now()).await;
                }
                _ = verify_interval.tick() => {
                    run_verify_tick(&self.store, self.messaging.as_ref(), &self.service, &self.notifier, Utc::now()).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("scheduler shutting down");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use escrow_chain::{ChainClient, MockChainClient, Transfer};
    use escrow_core::{Channel, Deal, DealStatus, ScheduledPost, ScheduledPostStatus};
    use escrow_crypto::EscrowKey;
    use escrow_messaging::MockMessagingClient;

    fn temp_store(name: &str) -> (Arc<Store>, std::path::PathBuf) {
        use std::time::{SystemTime, UNIX_EPOCH};
        let suffix = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
        let dir = std::env::temp_dir().join(format!("escrow_scheduler_test_{name}_{suffix}"));
        (Arc::new(Store::open(&dir).unwrap()), dir)
    }

    fn cleanup(dir: std::path::PathBuf) {
        let _ = std::fs::remove_dir_all(dir);
    }

    fn seed_channel(store: &Store, platform_channel_id: i64) -> Channel {
        store
            .create_channel(Channel {
                id: 0,
                platform_channel_id,
                username: format!("c{platform_channel_id}"),
                display_name: "Chan".into(),
                category: "news".into(),
                price_per_post: 5.0,
                subscriber_count: 100,
                bot_is_admin: true,
                bot_can_post: true,
                verified: true,
                owner_wallet: Some("EQowner".into()),
            })
            .unwrap()
    }

    fn seed_deal(store: &Store, channel_id: u64, status: DealStatus) -> Deal {
        store
            .create_deal(Deal {
                id: 0,
                campaign_id: None,
                channel_id,
                advertiser_id: 1,
                status,
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
    async fn post_tick_posts_due_ad_and_advances_deal() {
        let (store, dir) = temp_store("post_due");
        let channel = seed_channel(&store, 10);
        let deal = seed_deal(&store, channel.id, DealStatus::Funded);
        store
            .create_scheduled_post(ScheduledPost {
                deal_id: deal.id,
                channel_id: channel.id,
                text: "buy my thing".into(),
                scheduled_time: Utc::now() - Duration::minutes(1),
                posted_at: None,
                message_id: None,
                hold_hours: 24,
                release_at: None,
                status: ScheduledPostStatus::Scheduled,
                last_verified: None,
            })
            .unwrap();

        let messaging = Arc::new(MockMessagingClient::new());
        let notifier = Arc::new(Notifier::new(Arc::new(NullSink)));

        run_post_tick(&store, messaging.as_ref(), &notifier, Utc::now()).await;

        let post = store.get_scheduled_post(deal.id).unwrap().unwrap();
        assert_eq!(post.status, ScheduledPostStatus::Posted);
        assert!(post.message_id.is_some());
        assert!(post.release_at.is_some());

        let deal_after = store.get_deal(deal.id).unwrap();
        assert_eq!(deal_after.status, DealStatus::Posted);
        assert_eq!(deal_after.message_id, post.message_id);
        cleanup(dir);
    }

    #[tokio::test]
    async fn post_tick_skips_post_whose_channel_was_deleted() {
        let (store, dir) = temp_store("post_missing_channel");
        let deal = seed_deal(&store, 999, DealStatus::Funded);
        store
            .create_scheduled_post(ScheduledPost {
                deal_id: deal.id,
                channel_id: 999,
                text: "buy my thing".into(),
                scheduled_time: Utc::now() - Duration::minutes(1),
                posted_at: None,
                message_id: None,
                hold_hours: 24,
                release_at: None,
                status: ScheduledPostStatus::Scheduled,
                last_verified: None,
            })
            .unwrap();

        let messaging = Arc::new(MockMessagingClient::new());
        let notifier = Arc::new(Notifier::new(Arc::new(NullSink)));

        run_post_tick(&store, messaging.as_ref(), &notifier, Utc::now()).await;

        let post = store.get_scheduled_post(deal.id).unwrap().unwrap();
        assert_eq!(post.status, ScheduledPostStatus::Scheduled);
        let deal_after = store.get_deal(deal.id).unwrap();
        assert_eq!(deal_after.status, DealStatus::Funded);
        cleanup(dir);
    }

    #[tokio::test]
    async fn verify_tick_refunds_when_message_deleted() {
        let (store, dir) = temp_store("verify_refund");
        let channel = seed_channel(&store, 12);
        let deal = seed_deal(&store, channel.id, DealStatus::Posted);
        let chain = Arc::new(MockChainClient::new(EscrowKey::generate()));
        let chain_dyn: Arc<dyn ChainClient> = chain.clone();
        let service = Arc::new(EscrowService::new(store.clone(), chain_dyn));
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

        let messaging = Arc::new(MockMessagingClient::new());
        let sent = messaging.send_channel_message(12, "ad").await.unwrap();
        messaging.delete_message(12, sent.message_id);

        store
            .create_scheduled_post(ScheduledPost {
                deal_id: deal.id,
                channel_id: channel.id,
                text: "ad".into(),
                scheduled_time: Utc::now() - Duration::hours(1),
                posted_at: Some(Utc::now() - Duration::hours(1)),
                message_id: Some(sent.message_id),
                hold_hours: 24,
                release_at: Some(Utc::now() + Duration::hours(23)),
                status: ScheduledPostStatus::Posted,
                last_verified: None,
            })
            .unwrap();

        let notifier = Arc::new(Notifier::new(Arc::new(NullSink)));
        run_verify_tick(&store, messaging.as_ref(), &service, &notifier, Utc::now()).await;

        let post = store.get_scheduled_post(deal.id).unwrap().unwrap();
        assert_eq!(post.status, ScheduledPostStatus::Refunded);
        let deal_after = store.get_deal(deal.id).unwrap();
        assert_eq!(deal_after.status, DealStatus::Refunded);
        cleanup(dir);
    }

    #[tokio::test]
    async fn verify_tick_releases_once_hold_period_elapses() {
        let (store, dir) = temp_store("verify_release");
        let channel = seed_channel(&store, 13);
        let deal = seed_deal(&store, channel.id, DealStatus::Posted);
        let chain = Arc::new(MockChainClient::new(EscrowKey::generate()));
        let chain_dyn: Arc<dyn ChainClient> = chain.clone();
        let service = Arc::new(EscrowService::new(store.clone(), chain_dyn));
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

        let messaging = Arc::new(MockMessagingClient::new());
        let sent = messaging.send_channel_message(13, "ad").await.unwrap();

        let now = Utc::now();
        store
            .create_scheduled_post(ScheduledPost {
                deal_id: deal.id,
                channel_id: channel.id,
                text: "ad".into(),
                scheduled_time: now - Duration::hours(25),
                posted_at: Some(now - Duration::hours(25)),
                message_id: Some(sent.message_id),
                hold_hours: 24,
                release_at: Some(now - Duration::hours(1)),
                status: ScheduledPostStatus::Posted,
                last_verified: None,
            })
            .unwrap();

        let notifier = Arc::new(Notifier::new(Arc::new(NullSink)));
        run_verify_tick(&store, messaging.as_ref(), &service, &notifier, now).await;

        let post = store.get_scheduled_post(deal.id).unwrap().unwrap();
        assert_eq!(post.status, ScheduledPostStatus::Released);
        let deal_after = store.get_deal(deal.id).unwrap();
        assert_eq!(deal_after.status, DealStatus::Completed);
        cleanup(dir);
    }

    #[tokio::test]
    async fn happy_path_pending_to_completed() {
        let (store, dir) = temp_store("happy_path");
        let channel = seed_channel(&store, 20);
        let deal = seed_deal(&store, channel.id, DealStatus::Pending);
        let chain = Arc::new(MockChainClient::new(EscrowKey::generate()));
        let chain_dyn: Arc<dyn ChainClient> = chain.clone();
        let service = Arc::new(EscrowService::new(store.clone(), chain_dyn));

        store
            .cas_deal_status(deal.id, DealStatus::Pending, DealStatus::Accepted, deal.advertiser_id, |_| {})
            .unwrap();

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
        service.verify_deposit(deal.id, None).await.unwrap();
        let funded = store.get_deal(deal.id).unwrap();
        assert_eq!(funded.status, DealStatus::Funded);

        let now = Utc::now();
        store
            .create_scheduled_post(ScheduledPost {
                deal_id: deal.id,
                channel_id: channel.id,
                text: "buy my thing".into(),
                scheduled_time: now - Duration::seconds(1),
                posted_at: None,
                message_id: None,
                hold_hours: 1,
                release_at: None,
                status: ScheduledPostStatus::Scheduled,
                last_verified: None,
            })
            .unwrap();

        let messaging = Arc::new(MockMessagingClient::new());
        let notifier = Arc::new(Notifier::new(Arc::new(NullSink)));

        run_post_tick(&store, messaging.as_ref(), &notifier, now).await;
        let posted_deal = store.get_deal(deal.id).unwrap();
        assert_eq!(posted_deal.status, DealStatus::Posted);
        let post = store.get_scheduled_post(deal.id).unwrap().unwrap();
        assert_eq!(post.status, ScheduledPostStatus::Posted);

        let past_release = now + Duration::hours(2);
        run_verify_tick(&store, messaging.as_ref(), &service, &notifier, past_release).await;

        let completed = store.get_deal(deal.id).unwrap();
        assert_eq!(completed.status, DealStatus::Completed);
        let released_post = store.get_scheduled_post(deal.id).unwrap().unwrap();
        assert_eq!(released_post.status, ScheduledPostStatus::Released);
        let wallet_after = store.get_wallet_by_deal(deal.id).unwrap().unwrap();
        let txs = store.list_transactions_for_wallet(wallet_after.id).unwrap();
        assert!(txs.iter().any(|t| matches!(t.kind, escrow_core::TxKind::Release)));
        cleanup(dir);
    }

    struct NullSink;

    #[async_trait::async_trait]
    impl escrow_notifier::NotificationSink for NullSink {
        async fn deliver(&self, _user_id: escrow_core::UserId, _text: String) {}
    }
}
