use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{BotChannelInfo, MessagingClient, SentMessage, UserChannelRights};
use crate::error::MessagingError;

#[derive(Default)]
struct State {
    channels: HashMap<String, BotChannelInfo>,
    rights: HashMap<(i64, String), UserChannelRights>,
    messages: HashMap<(i64, i64), bool>,
    next_message_id: i64,
}

/// In-memory `MessagingClient` for tests. Existence state is set explicitly
/// via [`MockMessagingClient::delete_message`] rather than simulated network
/// flakiness, so scenario tests (spec §8) are deterministic.
pub struct MockMessagingClient {
    state: Mutex<State>,
}

impl Default for MockMessagingClient {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                next_message_id: 1,
                ..Default::default()
            }),
        }
    }
}

impl MockMessagingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_channel(&self, handle: &str, info: BotChannelInfo) {
        self.state
            .lock()
            .expect("mock messaging lock poisoned")
            .channels
            .insert(handle.to_string(), info);
    }

    pub fn set_user_rights(&self, user_id: i64, handle: &str, rights: UserChannelRights) {
        self.state
            .lock()
            .expect("mock messaging lock poisoned")
            .rights
            .insert((user_id, handle.to_string()), rights);
    }

    /// Mark a previously sent message as deleted (verify-tick will see `false`).
    pub fn delete_message(&self, platform_channel_id: i64, message_id: i64) {
        self.state
            .lock()
            .expect("mock messaging lock poisoned")
            .messages
            .insert((platform_channel_id, message_id), false);
    }
}

#[async_trait]
impl MessagingClient for MockMessagingClient {
    async fn verify_bot_on_channel(&self, handle: &str) -> Result<BotChannelInfo, MessagingError> {
        let state = self.state.lock().expect("mock messaging lock poisoned");
        state
            .channels
            .get(handle)
            .cloned()
            .ok_or_else(|| MessagingError::ChannelNotFound(handle.to_string()))
    }

    async fn verify_user_on_channel(
        &self,
        user_id: i64,
        handle: &str,
    ) -> Result<UserChannelRights, MessagingError> {
        let state = self.state.lock().expect("mock messaging lock poisoned");
        state
            .rights
            .get(&(user_id, handle.to_string()))
            .cloned()
            .ok_or_else(|| MessagingError::AccessDenied(format!("{user_id} has no rights on {handle}")))
    }

    async fn send_channel_message(
        &self,
        platform_channel_id: i64,
        _text: &str,
    ) -> Result<SentMessage, MessagingError> {
        let mut state = self.state.lock().expect("mock messaging lock poisoned");
        let message_id = state.next_message_id;
        state.next_message_id += 1;
        state.messages.insert((platform_channel_id, message_id), true);
        Ok(SentMessage { message_id })
    }

    async fn message_exists(
        &self,
        platform_channel_id: i64,
        message_id: i64,
    ) -> Result<bool, MessagingError> {
        let state = self.state.lock().expect("mock messaging lock poisoned");
        Ok(*state
            .messages
            .get(&(platform_channel_id, message_id))
            .unwrap_or(&false))
    }
}
