use chrono::{DateTime, Utc};
use escrow_core::{DealId, DealStatus, ScheduledPostStatus, UserId};
use escrow_messaging::MessagingClient;
use escrow_notifier::{Event, NotificationContext, Notifier};
use escrow_service::EscrowService;
use escrow_store::Store;
use tracing::{info, warn};

/// Post due scheduled posts (spec §4.8, every 60s). `now` is threaded in
/// explicitly rather than read from the system clock so scenario tests can
/// drive the hold-period boundary deterministically.
pub async fn run_post_tick(
    store: &Store,
    messaging: &dyn MessagingClient,
    notifier: &Notifier,
    now: DateTime<Utc>,
) {
    let due = match store.list_scheduled_posts_due(now) {
        Ok(posts) => posts,
        Err(e) => {
            warn!(error = %e, "post tick: failed to list due posts");
            return;
        }
    };

    for mut post in due {
        let channel = match store.get_channel(post.channel_id) {
            Ok(Some(c)) => c,
            Ok(None) => {
                warn!(deal_id = post.deal_id, "post tick: channel missing, skipping");
                continue;
            }
            Err(e) => {
                warn!(deal_id = post.deal_id, error = %e, "post tick: failed to load channel");
                continue;
            }
        };

        let sent = messaging
            .send_channel_message(channel.platform_channel_id, &post.text)
            .await;

        let message_id = match sent {
            Ok(sent) => sent.message_id,
            Err(e) => {
                // Leave the row as-is; the next tick retries (spec §4.8).
                warn!(deal_id = post.deal_id, error = %e, "post tick: send failed, will retry");
                continue;
            }
        };

        post.status = ScheduledPostStatus::Posted;
        post.message_id = Some(message_id);
        post.posted_at = Some(now);
        post.release_at = Some(now + chrono::Duration::hours(post.hold_hours as i64));
        post.last_verified = Some(now);

        let deal_id = post.deal_id;
        if let Err(e) = store.put_scheduled_post(&post) {
            warn!(deal_id, error = %e, "post tick: failed to persist posted status");
            continue;
        }

        let deal = match store.get_deal(deal_id) {
            Ok(d) => d,
            Err(e) => {
                warn!(deal_id, error = %e, "post tick: deal missing after posting");
                continue;
            }
        };
        let cas = store.cas_deal_status(deal_id, deal.status, DealStatus::Posted, deal.advertiser_id, |d| {
            d.message_id = post.message_id;
            d.posted_at = post.posted_at;
            d.hold_hours = Some(post.hold_hours);
        });
        if let Err(e) = cas {
            warn!(deal_id, error = %e, "post tick: deal transition failed");
            continue;
        }

        info!(deal_id, message_id, "post tick: ad posted");
        notify_deal(store, notifier, deal_id, Event::Posted, &NotificationContext::default()).await;
    }
}

/// Verify live posts and release/refund at the hold boundary (spec §4.8,
/// every 300s).
pub async fn run_verify_tick(
    store: &Store,
    messaging: &dyn MessagingClient,
    service: &EscrowService,
    notifier: &Notifier,
    now: DateTime<Utc>,
) {
    let posted = match store.list_scheduled_posts_posted() {
        Ok(posts) => posts,
        Err(e) => {
            warn!(error = %e, "verify tick: failed to list posted posts");
            return;
        }
    };

    for mut post in posted {
        let deal_id = post.deal_id;
        let channel = match store.get_channel(post.channel_id) {
            Ok(Some(c)) => c,
            _ => continue,
        };
        let Some(message_id) = post.message_id else { continue };

        let exists = match messaging.message_exists(channel.platform_channel_id, message_id).await {
            Ok(exists) => exists,
            Err(e) => {
                // VERIFY_UNKNOWN: no state change, update last_verified, retry next tick.
                warn!(deal_id, error = %e, "verify tick: verify_unknown, retrying next tick");
                post.last_verified = Some(now);
                let _ = store.put_scheduled_post(&post);
                continue;
            }
        };

        if exists {
            let release_at = post.release_at.unwrap_or(now);
            if now >= release_at {
                match service.release(deal_id, None).await {
                    Ok(_) => {
                        post.status = ScheduledPostStatus::Released;
                        post.last_verified = Some(now);
                        let _ = store.put_scheduled_post(&post);
                        info!(deal_id, "verify tick: released");
                        notify_deal(store, notifier, deal_id, Event::Completed, &NotificationContext::default()).await;
                    }
                    Err(e) => warn!(deal_id, error = %e, "verify tick: release failed, retrying next tick"),
                }
            } else {
                post.last_verified = Some(now);
                let _ = store.put_scheduled_post(&post);
            }
        } else {
            warn!(deal_id, message_id, "verify tick: message no longer exists, refunding");
            match service.refund(deal_id, None).await {
                Ok(_) => {
                    post.status = ScheduledPostStatus::Refunded;
                    post.last_verified = Some(now);
                    let _ = store.put_scheduled_post(&post);
                    let ctx = NotificationContext {
                        reason: Some("Advertisement removed or policy violation".to_string()),
                        ..Default::default()
                    };
                    notify_deal(store, notifier, deal_id, Event::Refunded, &ctx).await;
                }
                Err(e) => warn!(deal_id, error = %e, "verify tick: refund failed, retrying next tick"),
            }
        }
    }
}

async fn notify_deal(store: &Store, notifier: &Notifier, deal_id: DealId, event: Event, ctx: &NotificationContext) {
    let deal = match store.get_deal(deal_id) {
        Ok(d) => d,
        Err(_) => return,
    };
    let channel_owner_id: UserId = store
        .list_channel_admins(deal.channel_id)
        .unwrap_or_default()
        .into_iter()
        .find(|a| a.role == escrow_core::Role::Owner)
        .map(|a| a.user_id)
        .unwrap_or(0);
    notifier
        .notify(deal_id, event, deal.advertiser_id, channel_owner_id, ctx, false)
        .await;
}
