use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type ChannelId = u64;
pub type CampaignId = u64;
pub type DealId = u64;
pub type WalletId = u64;

/// Role lattice: OWNER ⊇ MANAGER ⊇ POSTER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Poster,
    Manager,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Poster => "poster",
            Role::Manager => "manager",
            Role::Owner => "owner",
        }
    }

    /// Derive a role from the platform admin flags, most privileged first.
    pub fn from_platform_flags(can_manage: bool, can_post: bool) -> Role {
        if can_manage {
            Role::Owner
        } else if can_post {
            Role::Manager
        } else {
            Role::Poster
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub telegram_id: i64,
    pub payout_wallet: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub platform_channel_id: i64,
    pub username: String,
    pub display_name: String,
    pub category: String,
    pub price_per_post: f64,
    pub subscriber_count: u64,
    pub bot_is_admin: bool,
    pub bot_can_post: bool,
    pub verified: bool,
    pub owner_wallet: Option<String>,
}

impl Channel {
    /// I5 (data model): a verified channel implies the bot holds admin+post rights.
    pub fn verification_consistent(&self) -> bool {
        !self.verified || (self.bot_is_admin && self.bot_can_post)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelAdmin {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub role: Role,
    pub last_verified: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CampaignStatus {
    Draft,
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub advertiser_id: UserId,
    pub title: String,
    pub text: String,
    pub budget: f64,
    pub status: CampaignStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletVersion {
    V4R2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowWallet {
    pub id: WalletId,
    pub deal_id: DealId,
    pub address: String,
    pub encrypted_mnemonic: String,
    pub version: WalletVersion,
    pub cached_balance: f64,
    pub last_checked: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    Deposit,
    Release,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowTransaction {
    pub wallet_id: WalletId,
    pub tx_hash: String,
    pub kind: TxKind,
    pub amount: f64,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub status: TxStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledPostStatus {
    Scheduled,
    Posted,
    Released,
    Refunded,
}

impl ScheduledPostStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScheduledPostStatus::Released | ScheduledPostStatus::Refunded
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPost {
    pub deal_id: DealId,
    pub channel_id: ChannelId,
    pub text: String,
    pub scheduled_time: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
    pub message_id: Option<i64>,
    pub hold_hours: u32,
    pub release_at: Option<DateTime<Utc>>,
    pub status: ScheduledPostStatus,
    pub last_verified: Option<DateTime<Utc>>,
}

/// Append-only audit row for every successful Deal transition (I4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DealTransition {
    pub deal_id: DealId,
    pub from_status: String,
    pub to_status: String,
    pub actor_id: UserId,
    pub at: DateTime<Utc>,
}
