pub mod client;
pub mod error;
pub mod mock;

pub use client::{BotChannelInfo, MessagingClient, SentMessage, UserChannelRights};
pub use error::MessagingError;
pub use mock::MockMessagingClient;
