use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EscrowError;
use crate::types::{CampaignId, ChannelId, DealId, UserId};

/// Deal lifecycle states. Transitions are constrained to the table in
/// [`DealStatus::allowed_next`]; anything else is rejected before it ever
/// reaches the store's compare-and-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Pending,
    Accepted,
    Funded,
    Scheduled,
    Posted,
    Verified,
    Completed,
    Refunded,
    Cancelled,
}

impl DealStatus {
    /// Step number for UI progress display; 0 for terminal failure states.
    pub fn step(&self) -> u8 {
        match self {
            DealStatus::Pending => 1,
            DealStatus::Accepted => 2,
            DealStatus::Funded => 3,
            DealStatus::Scheduled => 3,
            DealStatus::Posted => 4,
            DealStatus::Verified => 5,
            DealStatus::Completed => 6,
            DealStatus::Refunded | DealStatus::Cancelled => 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DealStatus::Completed | DealStatus::Refunded | DealStatus::Cancelled
        )
    }

    /// States directly reachable from this one. Empty for terminal states.
    pub fn allowed_next(&self) -> &'static [DealStatus] {
        use DealStatus::*;
        match self {
            Pending => &[Accepted, Cancelled],
            Accepted => &[Funded, Cancelled],
            Funded => &[Scheduled, Posted, Refunded],
            Scheduled => &[Posted, Cancelled, Refunded],
            Posted => &[Verified, Refunded],
            Verified => &[Completed, Refunded],
            Completed | Refunded | Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: DealStatus) -> bool {
        self.allowed_next().contains(&target)
    }
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DealStatus::Pending => "pending",
            DealStatus::Accepted => "accepted",
            DealStatus::Funded => "funded",
            DealStatus::Scheduled => "scheduled",
            DealStatus::Posted => "posted",
            DealStatus::Verified => "verified",
            DealStatus::Completed => "completed",
            DealStatus::Refunded => "refunded",
            DealStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Validate a requested transition against the table, without touching storage.
/// The store-backed CAS is the actual mutation; this is the pure precondition
/// check shared by the FSM, EscrowService, and the HTTP driver (for the
/// `{error, current_status, allowed_transitions}` 400 response body).
pub fn validate_transition(from: DealStatus, to: DealStatus) -> Result<(), EscrowError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(EscrowError::InvalidTransition {
            from,
            to,
            allowed: from.allowed_next().to_vec(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub campaign_id: Option<CampaignId>,
    pub channel_id: ChannelId,
    pub advertiser_id: UserId,
    pub status: DealStatus,
    pub escrow_amount: f64,
    pub advertiser_wallet: Option<String>,
    pub channel_owner_wallet: Option<String>,
    pub deposit_sender: Option<String>,
    pub message_id: Option<i64>,
    pub posted_at: Option<DateTime<Utc>>,
    pub hold_hours: Option<u32>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Deal {
    /// I5: release_at = posted_at + hold_hours, once both are known.
    pub fn release_at(&self) -> Option<DateTime<Utc>> {
        let posted_at = self.posted_at?;
        let hold_hours = self.hold_hours?;
        Some(posted_at + chrono::Duration::hours(hold_hours as i64))
    }
}
