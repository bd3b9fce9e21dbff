use escrow_core::{ChannelAdmin, ChannelId, EscrowError, Role, UserId};
use escrow_messaging::MessagingClient;
use escrow_store::Store;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Deal-mutating actions gated by the role lattice (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AcceptDeal,
    PostAd,
    ReleaseEscrow,
}

impl Action {
    fn minimum_role(&self) -> Role {
        match self {
            Action::AcceptDeal => Role::Manager,
            Action::PostAd => Role::Poster,
            Action::ReleaseEscrow => Role::Manager,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Action::AcceptDeal => "accept_deal",
            Action::PostAd => "post_ad",
            Action::ReleaseEscrow => "release_escrow",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub allowed: bool,
    pub role: Option<Role>,
    pub reason: Option<String>,
}

/// Role resolution for (user, channel) pairs, backed by the `channel_admins`
/// table. Grounded on the teacher's validator-registry shape: a thin
/// read/write wrapper over the store rather than its own in-memory cache,
/// since admin rights must reflect the latest persisted verification.
pub struct Permissions<'a> {
    store: &'a Store,
}

impl<'a> Permissions<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// `Check(user, channel, action)` — spec §4.5.
    pub fn check(&self, user_id: UserId, channel_id: ChannelId, action: Action) -> Result<CheckResult, EscrowError> {
        let admin = self.store.role_of(channel_id, user_id)?;
        let Some(role) = admin else {
            return Ok(CheckResult {
                allowed: false,
                role: None,
                reason: Some("NOT_AN_ADMIN".into()),
            });
        };

        let allowed = role >= action.minimum_role();
        Ok(CheckResult {
            allowed,
            role: Some(role),
            reason: if allowed {
                None
            } else {
                Some(format!("role {role} cannot perform {}", action.name()))
            },
        })
    }

    /// Require `action`, mapping a denial to [`EscrowError::Forbidden`] /
    /// [`EscrowError::NotAnAdmin`] for callers that want a `?`-propagatable result.
    pub fn require(&self, user_id: UserId, channel_id: ChannelId, action: Action) -> Result<Role, EscrowError> {
        let result = self.check(user_id, channel_id, action)?;
        match result.role {
            None => Err(EscrowError::NotAnAdmin {
                user: user_id,
                channel: channel_id,
            }),
            Some(role) if result.allowed => Ok(role),
            Some(role) => Err(EscrowError::Forbidden {
                role: role.to_string(),
                action: action.name().to_string(),
            }),
        }
    }

    /// `ReVerify(user, channel)` — re-checks platform admin rights and either
    /// updates the persisted role or deletes the row entirely if rights were
    /// revoked (I6).
    pub async fn re_verify(
        &self,
        messaging: &dyn MessagingClient,
        user_id: UserId,
        channel_id: ChannelId,
        platform_user_id: i64,
        channel_handle: &str,
    ) -> Result<Option<Role>, EscrowError> {
        let rights = messaging
            .verify_user_on_channel(platform_user_id, channel_handle)
            .await
            .map_err(|e| EscrowError::Messaging(e.to_string()))?;

        if !rights.is_admin {
            info!(user_id, channel_id, "admin rights revoked on re-verify, removing row");
            self.store.delete_channel_admin(channel_id, user_id)?;
            return Ok(None);
        }

        let role = Role::from_platform_flags(rights.can_manage, rights.can_post);
        debug!(user_id, channel_id, %role, "re-verified admin role");
        self.store.put_channel_admin(&ChannelAdmin {
            channel_id,
            user_id,
            role,
            last_verified: chrono::Utc::now(),
        })?;
        Ok(Some(role))
    }
}
