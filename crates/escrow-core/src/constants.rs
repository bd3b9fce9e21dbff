//! ─── Escrow Coordinator Constants ───────────────────────────────────────────
//!
//! Figures governing fee withholding, deposit tolerance, funded threshold,
//! and the Scheduler/Notifier timing windows. Centralized so every crate
//! reads the same numbers instead of re-deriving them.

/// Fee reserve withheld from every outbound Release/Refund, in whole chain units.
pub const FEE_RESERVE_WHOLE_UNITS: f64 = 0.05;

/// Deposit shortfall tolerated versus the expected escrow amount (1%).
pub const DEPOSIT_SHORTFALL_TOLERANCE: f64 = 0.01;

/// A deal is considered funded once current balance reaches this fraction of expected.
pub const FUNDED_THRESHOLD_RATIO: f64 = 0.99;

/// Interval between Scheduler post-ticks (seconds).
pub const POST_TICK_INTERVAL_SECS: u64 = 60;

/// Interval between Scheduler verify-ticks (seconds).
pub const VERIFY_TICK_INTERVAL_SECS: u64 = 300;

/// Notifier per-(deal_id, event) cooldown window (seconds).
pub const NOTIFICATION_COOLDOWN_SECS: i64 = 60;

/// Default hold period applied to a newly scheduled post, in hours.
pub const DEFAULT_HOLD_HOURS: u32 = 24;

/// Bounded timeout recommended for any outbound RPC call (seconds).
pub const RPC_TIMEOUT_SECS: u64 = 30;

/// Grace period given to an in-flight Scheduler tick during shutdown (seconds).
pub const SHUTDOWN_GRACE_SECS: u64 = 5;

/// Default HTTP bind port.
pub const DEFAULT_PORT: u16 = 8000;
