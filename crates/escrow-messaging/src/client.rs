use async_trait::async_trait;

use crate::error::MessagingError;

#[derive(Debug, Clone)]
pub struct BotChannelInfo {
    pub platform_channel_id: i64,
    pub title: String,
    pub subscribers: u64,
    pub bot_is_admin: bool,
    pub bot_can_post: bool,
}

#[derive(Debug, Clone)]
pub struct UserChannelRights {
    pub is_admin: bool,
    pub can_post: bool,
    pub can_manage: bool,
    pub platform_channel_id: i64,
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message_id: i64,
}

/// Semantic interface to the messaging platform.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Verify the bot's own standing on `handle` (e.g. "@channelname").
    async fn verify_bot_on_channel(&self, handle: &str) -> Result<BotChannelInfo, MessagingError>;

    /// Verify `user_id`'s admin rights on `handle`.
    async fn verify_user_on_channel(
        &self,
        user_id: i64,
        handle: &str,
    ) -> Result<UserChannelRights, MessagingError>;

    /// Post `text` to the channel identified by `platform_channel_id`.
    async fn send_channel_message(
        &self,
        platform_channel_id: i64,
        text: &str,
    ) -> Result<SentMessage, MessagingError>;

    /// Check whether a previously sent message still exists.
    ///
    /// Semantics: a message "exists" iff an independent attempt to
    /// reference it (e.g. forwarding it to a bot-owned chat) succeeds. A
    /// "not found"-shaped error maps to `Ok(false)`; a "forwarding
    /// forbidden"-shaped error maps to `Ok(true)` (the message still
    /// exists, the bot simply cannot forward protected content). Any other
    /// failure surfaces as [`MessagingError::VerifyUnknown`].
    ///
    /// The only probe most messaging platforms expose for this is an
    /// actual forward to a bot-owned chat, which is itself a mutating,
    /// potentially rate-limited action — that side effect is inherent to
    /// this call, not an implementation bug (spec §9).
    async fn message_exists(
        &self,
        platform_channel_id: i64,
        message_id: i64,
    ) -> Result<bool, MessagingError>;
}
