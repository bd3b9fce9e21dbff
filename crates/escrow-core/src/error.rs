use thiserror::Error;

use crate::fsm::DealStatus;

/// The coordinator's unified error taxonomy.
///
/// Every variant maps onto exactly one of the error kinds in the design
/// (VALIDATION, NOT_FOUND, FORBIDDEN, CONFLICT, EXTERNAL, CONFIG, FATAL) via
/// [`EscrowError::kind`]. Drivers (HTTP, bot) translate `kind()` to a status
/// code; nothing downstream of this enum needs to know about HTTP.
#[derive(Debug, Error)]
pub enum EscrowError {
    // ── VALIDATION ───────────────────────────────────────────────────────
    #[error("validation failed: {0}")]
    Validation(String),

    // ── NOT_FOUND ────────────────────────────────────────────────────────
    #[error("deal {0} not found")]
    DealNotFound(u64),
    #[error("user {0} not found")]
    UserNotFound(u64),
    #[error("channel {0} not found")]
    ChannelNotFound(u64),
    #[error("wallet for deal {0} not found")]
    WalletNotFound(u64),
    #[error("scheduled post for deal {0} not found")]
    ScheduledPostNotFound(u64),

    // ── FORBIDDEN ────────────────────────────────────────────────────────
    #[error("user {user} is not an admin of channel {channel}")]
    NotAnAdmin { user: u64, channel: u64 },
    #[error("role {role} cannot perform {action}")]
    Forbidden { role: String, action: String },

    // ── CONFLICT ─────────────────────────────────────────────────────────
    #[error("invalid transition from {from:?} to {to:?}; allowed: {allowed:?}")]
    InvalidTransition {
        from: DealStatus,
        to: DealStatus,
        allowed: Vec<DealStatus>,
    },
    #[error("concurrent modification on deal {0}")]
    ConcurrentModification(u64),
    #[error("deal {0} is in a terminal state")]
    TerminalDeal(u64),
    #[error("duplicate {entity} for key {key}")]
    Duplicate { entity: &'static str, key: String },
    #[error("no destination address available for deal {0}")]
    NoDestination(u64),

    // ── EXTERNAL ─────────────────────────────────────────────────────────
    #[error("chain error: {0}")]
    Chain(String),
    #[error("messaging error: {0}")]
    Messaging(String),

    // ── CONFIG ───────────────────────────────────────────────────────────
    #[error("configuration error: {0}")]
    Config(String),

    // ── FATAL ────────────────────────────────────────────────────────────
    #[error("data integrity violation on deal {0}: {1}")]
    Fatal(u64, String),

    // ── Storage plumbing ─────────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Coarse error kind, used by drivers to pick an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Forbidden,
    Conflict,
    External,
    Config,
    Fatal,
}

impl EscrowError {
    pub fn kind(&self) -> ErrorKind {
        use EscrowError::*;
        match self {
            Validation(_) => ErrorKind::Validation,
            DealNotFound(_)
            | UserNotFound(_)
            | ChannelNotFound(_)
            | WalletNotFound(_)
            | ScheduledPostNotFound(_) => ErrorKind::NotFound,
            NotAnAdmin { .. } | Forbidden { .. } => ErrorKind::Forbidden,
            InvalidTransition { .. }
            | ConcurrentModification(_)
            | TerminalDeal(_)
            | Duplicate { .. }
            | NoDestination(_) => ErrorKind::Conflict,
            Chain(_) | Messaging(_) => ErrorKind::External,
            Config(_) => ErrorKind::Config,
            Fatal(_, _) => ErrorKind::Fatal,
            Storage(_) | Serialization(_) => ErrorKind::Fatal,
        }
    }
}
