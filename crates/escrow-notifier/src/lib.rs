use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use escrow_core::{DealId, UserId, NOTIFICATION_COOLDOWN_SECS};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    Accepted,
    Funded,
    Scheduled,
    Posted,
    Verified,
    Completed,
    Refunded,
    Cancelled,
}

impl Event {
    /// Fixed routing table — spec §4.9.
    pub fn recipients(&self) -> Recipients {
        match self {
            Event::Accepted => Recipients::Advertiser,
            Event::Funded => Recipients::ChannelOwner,
            Event::Scheduled => Recipients::Both,
            Event::Posted => Recipients::Advertiser,
            Event::Verified => Recipients::Both,
            Event::Completed => Recipients::Both,
            Event::Refunded => Recipients::Advertiser,
            Event::Cancelled => Recipients::Both,
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Event::Accepted => "Your deal #{deal_id} for {channel} was accepted.",
            Event::Funded => "Deal #{deal_id} for {channel} has been funded ({amount}).",
            Event::Scheduled => "Deal #{deal_id} is scheduled to post on {channel} at {scheduled_time}.",
            Event::Posted => "Your ad for deal #{deal_id} was posted to {channel}.",
            Event::Verified => "Deal #{deal_id}'s post on {channel} was verified as still live.",
            Event::Completed => "Deal #{deal_id} is complete — escrow released ({amount}).",
            Event::Refunded => "Deal #{deal_id} was refunded: {reason}",
            Event::Cancelled => "Deal #{deal_id} was cancelled.",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Recipients {
    Advertiser,
    ChannelOwner,
    Both,
}

/// Template variables rendered into an event's message. Missing values fall
/// back to the documented defaults (spec §4.9).
#[derive(Debug, Clone, Default)]
pub struct NotificationContext {
    pub channel: Option<String>,
    pub amount: Option<f64>,
    pub hold_hours: Option<u32>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}

impl NotificationContext {
    fn render(&self, deal_id: DealId, template: &str) -> String {
        let channel = self.channel.clone().unwrap_or_else(|| "Channel".to_string());
        let amount = self.amount.unwrap_or(0.0);
        let hold_hours = self.hold_hours.unwrap_or(24);
        let scheduled_time = self
            .scheduled_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "an upcoming time".to_string());
        let reason = self
            .reason
            .clone()
            .unwrap_or_else(|| "Advertisement removed or policy violation".to_string());

        template
            .replace("{deal_id}", &deal_id.to_string())
            .replace("{channel}", &channel)
            .replace("{amount}", &amount.to_string())
            .replace("{hold_hours}", &hold_hours.to_string())
            .replace("{scheduled_time}", &scheduled_time)
            .replace("{reason}", &reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered,
    Throttled,
}

/// Delivery sink — a thin boundary onto the messaging driver, out of scope
/// for this crate's own specification (spec §1).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, user_id: UserId, text: String);
}

/// Templated notifications with a per-`(deal_id, event)` cooldown. The
/// cooldown map is a `DashMap`, not a coarse lock — spec §9 is explicit that
/// a `Mutex<HashMap<...>>` around the whole notifier is the wrong shape here
/// since notifications across unrelated deals must never contend.
pub struct Notifier {
    sink: Arc<dyn NotificationSink>,
    cooldowns: DashMap<(DealId, Event), DateTime<Utc>>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            sink,
            cooldowns: DashMap::new(),
        }
    }

    /// Send `event` for `deal_id` to the routed recipients. `force` bypasses
    /// the cooldown window entirely.
    pub async fn notify(
        &self,
        deal_id: DealId,
        event: Event,
        advertiser_id: UserId,
        channel_owner_id: UserId,
        ctx: &NotificationContext,
        force: bool,
    ) -> NotifyOutcome {
        let now = Utc::now();
        if !force {
            if let Some(last) = self.cooldowns.get(&(deal_id, event)) {
                if (now - *last).num_seconds() < NOTIFICATION_COOLDOWN_SECS {
                    debug!(deal_id, ?event, "notification throttled");
                    return NotifyOutcome::Throttled;
                }
            }
        }

        let text = ctx.render(deal_id, event.template());
        match event.recipients() {
            Recipients::Advertiser => self.sink.deliver(advertiser_id, text).await,
            Recipients::ChannelOwner => self.sink.deliver(channel_owner_id, text).await,
            Recipients::Both => {
                self.sink.deliver(advertiser_id, text.clone()).await;
                self.sink.deliver(channel_owner_id, text).await;
            }
        }

        self.cooldowns.insert((deal_id, event), now);
        NotifyOutcome::Delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(UserId, String)>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn deliver(&self, user_id: UserId, text: String) {
            self.sent.lock().unwrap().push((user_id, text));
        }
    }

    #[tokio::test]
    async fn second_notify_within_cooldown_is_throttled() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone());
        let ctx = NotificationContext::default();

        let first = notifier.notify(1, Event::Posted, 10, 20, &ctx, false).await;
        let second = notifier.notify(1, Event::Posted, 10, 20, &ctx, false).await;

        assert_eq!(first, NotifyOutcome::Delivered);
        assert_eq!(second, NotifyOutcome::Throttled);
        assert_eq!(sink.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn force_bypasses_cooldown() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone());
        let ctx = NotificationContext::default();

        notifier.notify(1, Event::Posted, 10, 20, &ctx, false).await;
        let forced = notifier.notify(1, Event::Posted, 10, 20, &ctx, true).await;

        assert_eq!(forced, NotifyOutcome::Delivered);
        assert_eq!(sink.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn completed_event_notifies_both_parties() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone());
        let ctx = NotificationContext::default();

        notifier.notify(1, Event::Completed, 10, 20, &ctx, false).await;
        let sent = sink.sent.lock().unwrap();
        let recipients: Vec<UserId> = sent.iter().map(|(u, _)| *u).collect();
        assert!(recipients.contains(&10));
        assert!(recipients.contains(&20));
    }

    #[tokio::test]
    async fn missing_variables_use_documented_defaults() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone());
        let ctx = NotificationContext::default();

        notifier.notify(1, Event::Funded, 10, 20, &ctx, false).await;
        let sent = sink.sent.lock().unwrap();
        assert!(sent[0].1.contains("Channel"));
    }
}
