use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use escrow_core::{
    Campaign, CampaignId, CampaignStatus, Channel, ChannelAdmin, ChannelId, Deal, DealId,
    DealStatus, EscrowError, Role, UserId,
};
use escrow_permissions::{Action, Permissions};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

type St = State<Arc<AppState>>;

fn actor_of(deal: &Deal) -> UserId {
    deal.advertiser_id
}

// ── Auth ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct AuthRequest {
    pub telegram_id: i64,
}

pub async fn auth(State(state): St, Json(req): Json<AuthRequest>) -> ApiResult<Json<Value>> {
    let user = state.store.upsert_user_by_telegram_id(req.telegram_id)?;
    Ok(Json(json!({ "success": true, "user": user })))
}

// ── Channels ─────────────────────────────────────────────────────────────

pub async fn list_channels(State(state): St) -> ApiResult<Json<Value>> {
    let channels = state.store.list_channels()?;
    Ok(Json(json!({ "success": true, "channels": channels })))
}

#[derive(Deserialize)]
pub struct CreateChannelRequest {
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

pub async fn create_channel(State(state): St, Json(req): Json<CreateChannelRequest>) -> ApiResult<Json<Value>> {
    let channel = Channel {
        id: 0,
        platform_channel_id: req.platform_channel_id,
        username: req.username,
        display_name: req.display_name,
        category: req.category,
        price_per_post: req.price_per_post,
        subscriber_count: req.subscriber_count,
        bot_is_admin: req.bot_is_admin,
        bot_can_post: req.bot_can_post,
        verified: req.verified,
        owner_wallet: req.owner_wallet,
    };
    if !channel.verification_consistent() {
        return Err(ApiError(EscrowError::Validation(
            "a verified channel requires the bot to hold admin and post rights".into(),
        )));
    }
    let created = state.store.create_channel(channel)?;
    Ok(Json(json!({ "success": true, "channel": created })))
}

// ── Channel admins ───────────────────────────────────────────────────────

pub async fn list_channel_admins(State(state): St, Path(channel_id): Path<ChannelId>) -> ApiResult<Json<Value>> {
    let admins = state.store.list_channel_admins(channel_id)?;
    Ok(Json(json!({ "success": true, "admins": admins })))
}

#[derive(Deserialize)]
pub struct AddChannelAdminRequest {
    pub user_id: UserId,
    pub role: Role,
}

pub async fn add_channel_admin(
    State(state): St,
    Path(channel_id): Path<ChannelId>,
    Json(req): Json<AddChannelAdminRequest>,
) -> ApiResult<Json<Value>> {
    let admin = ChannelAdmin {
        channel_id,
        user_id: req.user_id,
        role: req.role,
        last_verified: Utc::now(),
    };
    state.store.put_channel_admin(&admin)?;
    Ok(Json(json!({ "success": true, "admin": admin })))
}

pub async fn remove_channel_admin(
    State(state): St,
    Path((channel_id, user_id)): Path<(ChannelId, UserId)>,
) -> ApiResult<Json<Value>> {
    state.store.delete_channel_admin(channel_id, user_id)?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct VerifyChannelRequest {
    pub user_id: UserId,
    pub platform_user_id: i64,
    pub channel_handle: String,
}

pub async fn verify_channel(
    State(state): St,
    Path(channel_id): Path<ChannelId>,
    Json(req): Json<VerifyChannelRequest>,
) -> ApiResult<Json<Value>> {
    let perms = Permissions::new(&state.store);
    let role = perms
        .re_verify(
            state.messaging.as_ref(),
            req.user_id,
            channel_id,
            req.platform_user_id,
            &req.channel_handle,
        )
        .await?;
    Ok(Json(json!({ "success": true, "role": role })))
}

#[derive(Deserialize)]
pub struct PermissionCheckRequest {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub action: Action,
}

pub async fn permission_check(State(state): St, Json(req): Json<PermissionCheckRequest>) -> ApiResult<Json<Value>> {
    let perms = Permissions::new(&state.store);
    let result = perms.check(req.user_id, req.channel_id, req.action)?;
    Ok(Json(json!({ "success": true, "result": {
        "allowed": result.allowed,
        "role": result.role,
        "reason": result.reason,
    }})))
}

// ── Campaigns ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateCampaignRequest {
    pub advertiser_id: UserId,
    pub title: String,
    pub text: String,
    pub budget: f64,
}

pub async fn create_campaign(State(state): St, Json(req): Json<CreateCampaignRequest>) -> ApiResult<Json<Value>> {
    let campaign = Campaign {
        id: 0,
        advertiser_id: req.advertiser_id,
        title: req.title,
        text: req.text,
        budget: req.budget,
        status: CampaignStatus::Draft,
    };
    let created = state.store.create_campaign(campaign)?;
    Ok(Json(json!({ "success": true, "campaign": created })))
}

// ── Deals ────────────────────────────────────────────────────────────────

pub async fn list_deals(State(state): St) -> ApiResult<Json<Value>> {
    let deals = state.store.list_deals()?;
    Ok(Json(json!({ "success": true, "deals": deals })))
}

pub async fn get_deal(State(state): St, Path(deal_id): Path<DealId>) -> ApiResult<Json<Value>> {
    let deal = state.store.get_deal(deal_id)?;
    Ok(Json(json!({ "success": true, "deal": deal })))
}

#[derive(Deserialize)]
pub struct CreateDealRequest {
    pub campaign_id: Option<CampaignId>,
    pub channel_id: ChannelId,
    pub advertiser_id: UserId,
    pub escrow_amount: f64,
    pub advertiser_wallet: Option<String>,
}

pub async fn create_deal(State(state): St, Json(req): Json<CreateDealRequest>) -> ApiResult<Json<Value>> {
    if req.escrow_amount <= 0.0 {
        return Err(ApiError(EscrowError::Validation("escrow_amount must be positive".into())));
    }
    let deal = Deal {
        id: 0,
        campaign_id: req.campaign_id,
        channel_id: req.channel_id,
        advertiser_id: req.advertiser_id,
        status: DealStatus::Pending,
        escrow_amount: req.escrow_amount,
        advertiser_wallet: req.advertiser_wallet,
        channel_owner_wallet: None,
        deposit_sender: None,
        message_id: None,
        posted_at: None,
        hold_hours: None,
        created_at: Utc::now(),
    };
    let created = state.store.create_deal(deal)?;
    Ok(Json(json!({ "success": true, "deal": created })))
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    #[serde(alias = "state")]
    pub status: DealStatus,
    pub actor_id: Option<UserId>,
}

async fn do_transition(state: &AppState, deal_id: DealId, req: TransitionRequest) -> ApiResult<Deal> {
    let deal = state.store.get_deal(deal_id)?;
    escrow_core::validate_transition(deal.status, req.status)?;
    let actor = req.actor_id.unwrap_or_else(|| actor_of(&deal));
    let updated = state.store.cas_deal_status(deal_id, deal.status, req.status, actor, |_| {})?;
    Ok(updated)
}

pub async fn deal_status(
    State(state): St,
    Path(deal_id): Path<DealId>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Json<Value>> {
    let deal = do_transition(&state, deal_id, req).await?;
    Ok(Json(json!({ "success": true, "deal": deal })))
}

pub async fn deal_transition(
    State(state): St,
    Path(deal_id): Path<DealId>,
    Json(req): Json<TransitionRequest>,
) -> ApiResult<Json<Value>> {
    let deal = do_transition(&state, deal_id, req).await?;
    Ok(Json(json!({ "success": true, "deal": deal })))
}

#[derive(Deserialize)]
pub struct ActingUserRequest {
    pub user_id: UserId,
}

pub async fn deal_accept(
    State(state): St,
    Path(deal_id): Path<DealId>,
    Json(req): Json<ActingUserRequest>,
) -> ApiResult<Json<Value>> {
    let deal = state.store.get_deal(deal_id)?;
    Permissions::new(&state.store).require(req.user_id, deal.channel_id, Action::AcceptDeal)?;
    escrow_core::validate_transition(deal.status, DealStatus::Accepted)?;
    let updated = state
        .store
        .cas_deal_status(deal_id, deal.status, DealStatus::Accepted, req.user_id, |_| {})?;
    Ok(Json(json!({ "success": true, "deal": updated })))
}

pub async fn deal_post(
    State(state): St,
    Path(deal_id): Path<DealId>,
    Json(req): Json<PostNowRequest>,
) -> ApiResult<Json<Value>> {
    let deal = state.store.get_deal(deal_id)?;
    Permissions::new(&state.store).require(req.user_id, deal.channel_id, Action::PostAd)?;
    do_post_now(&state, deal_id, deal, req).await
}

#[derive(Deserialize)]
pub struct ReleaseRequest {
    pub user_id: UserId,
    pub destination_hint: Option<String>,
}

pub async fn deal_release(
    State(state): St,
    Path(deal_id): Path<DealId>,
    Json(req): Json<ReleaseRequest>,
) -> ApiResult<Json<Value>> {
    let deal = state.store.get_deal(deal_id)?;
    Permissions::new(&state.store).require(req.user_id, deal.channel_id, Action::ReleaseEscrow)?;
    let receipt = state.service.release(deal_id, req.destination_hint.as_deref()).await?;
    Ok(Json(json!({ "success": true, "receipt": { "amount": receipt.amount, "tx_hash": receipt.tx_hash } })))
}

// ── Escrow ───────────────────────────────────────────────────────────────

pub async fn escrow_create(State(state): St, Path(deal_id): Path<DealId>) -> ApiResult<Json<Value>> {
    let wallet = state.service.create_wallet(deal_id).await?;
    Ok(Json(json!({ "success": true, "wallet": wallet })))
}

pub async fn escrow_status(State(state): St, Path(deal_id): Path<DealId>) -> ApiResult<Json<Value>> {
    let status = state.service.get_status(deal_id).await?;
    Ok(Json(json!({ "success": true, "status": {
        "address": status.address,
        "expected": status.expected,
        "current": status.current,
        "is_funded": status.is_funded,
        "last_checked": status.last_checked,
    }})))
}

#[derive(Deserialize, Default)]
pub struct VerifyDepositRequest {
    pub sender_address_hint: Option<String>,
}

pub async fn escrow_verify(
    State(state): St,
    Path(deal_id): Path<DealId>,
    Json(req): Json<VerifyDepositRequest>,
) -> ApiResult<Json<Value>> {
    let status = state.service.verify_deposit(deal_id, req.sender_address_hint.as_deref()).await?;
    Ok(Json(json!({ "success": true, "status": {
        "address": status.address,
        "expected": status.expected,
        "current": status.current,
        "is_funded": status.is_funded,
        "last_checked": status.last_checked,
    }})))
}

#[derive(Deserialize, Default)]
pub struct SettleRequest {
    pub destination_hint: Option<String>,
}

pub async fn escrow_release(
    State(state): St,
    Path(deal_id): Path<DealId>,
    Json(req): Json<SettleRequest>,
) -> ApiResult<Json<Value>> {
    let receipt = state.service.release(deal_id, req.destination_hint.as_deref()).await?;
    Ok(Json(json!({ "success": true, "receipt": { "amount": receipt.amount, "tx_hash": receipt.tx_hash } })))
}

pub async fn escrow_refund(
    State(state): St,
    Path(deal_id): Path<DealId>,
    Json(req): Json<SettleRequest>,
) -> ApiResult<Json<Value>> {
    let receipt = state.service.refund(deal_id, req.destination_hint.as_deref()).await?;
    Ok(Json(json!({ "success": true, "receipt": { "amount": receipt.amount, "tx_hash": receipt.tx_hash } })))
}

pub async fn escrow_transactions(State(state): St, Path(deal_id): Path<DealId>) -> ApiResult<Json<Value>> {
    let wallet = state
        .store
        .get_wallet_by_deal(deal_id)?
        .ok_or(EscrowError::WalletNotFound(deal_id))?;
    let txs = state.store.list_transactions_for_wallet(wallet.id)?;
    Ok(Json(json!({ "success": true, "transactions": txs })))
}

// ── Scheduled posting ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SchedulePostRequest {
    pub user_id: UserId,
    pub text: String,
    pub scheduled_time: DateTime<Utc>,
    pub hold_hours: Option<u32>,
}

pub async fn post_schedule(
    State(state): St,
    Path(deal_id): Path<DealId>,
    Json(req): Json<SchedulePostRequest>,
) -> ApiResult<Json<Value>> {
    let deal = state.store.get_deal(deal_id)?;
    Permissions::new(&state.store).require(req.user_id, deal.channel_id, Action::PostAd)?;
    escrow_core::validate_transition(deal.status, DealStatus::Scheduled)?;

    let post = state.store.create_scheduled_post(escrow_core::ScheduledPost {
        deal_id,
        channel_id: deal.channel_id,
        text: req.text,
        scheduled_time: req.scheduled_time,
        posted_at: None,
        message_id: None,
        hold_hours: req.hold_hours.unwrap_or(escrow_core::DEFAULT_HOLD_HOURS),
        release_at: None,
        status: escrow_core::ScheduledPostStatus::Scheduled,
        last_verified: None,
    })?;

    let updated = state
        .store
        .cas_deal_status(deal_id, deal.status, DealStatus::Scheduled, req.user_id, |_| {})?;
    Ok(Json(json!({ "success": true, "deal": updated, "post": post })))
}

#[derive(Deserialize)]
pub struct PostNowRequest {
    pub user_id: UserId,
    pub text: Option<String>,
    pub hold_hours: Option<u32>,
}

pub async fn post_now(
    State(state): St,
    Path(deal_id): Path<DealId>,
    Json(req): Json<PostNowRequest>,
) -> ApiResult<Json<Value>> {
    let deal = state.store.get_deal(deal_id)?;
    Permissions::new(&state.store).require(req.user_id, deal.channel_id, Action::PostAd)?;
    do_post_now(&state, deal_id, deal, req).await
}

/// Schedules (or re-times) a `ScheduledPost` for immediate send, then drives
/// the scheduler's post tick so the deal actually carries a `message_id`
/// before it is marked `posted` (spec §4.8 invariant I7).
async fn do_post_now(state: &AppState, deal_id: DealId, deal: Deal, req: PostNowRequest) -> ApiResult<Json<Value>> {
    let now = Utc::now();
    match state.store.get_scheduled_post(deal_id)? {
        Some(mut existing) if !existing.status.is_terminal() => {
            existing.scheduled_time = now;
            if let Some(text) = req.text {
                existing.text = text;
            }
            state.store.put_scheduled_post(&existing)?;
        }
        _ => {
            escrow_core::validate_transition(deal.status, DealStatus::Scheduled)?;
            state.store.create_scheduled_post(escrow_core::ScheduledPost {
                deal_id,
                channel_id: deal.channel_id,
                text: req.text.unwrap_or_default(),
                scheduled_time: now,
                posted_at: None,
                message_id: None,
                hold_hours: req.hold_hours.unwrap_or(escrow_core::DEFAULT_HOLD_HOURS),
                release_at: None,
                status: escrow_core::ScheduledPostStatus::Scheduled,
                last_verified: None,
            })?;
            state
                .store
                .cas_deal_status(deal_id, deal.status, DealStatus::Scheduled, req.user_id, |_| {})?;
        }
    }

    escrow_scheduler::run_post_tick(&state.store, state.messaging.as_ref(), &state.notifier, now).await;

    let post = state.store.get_scheduled_post(deal_id)?;
    let deal_after = state.store.get_deal(deal_id)?;
    Ok(Json(json!({ "success": true, "deal": deal_after, "post": post })))
}

pub async fn post_cancel(
    State(state): St,
    Path(deal_id): Path<DealId>,
    Json(req): Json<ActingUserRequest>,
) -> ApiResult<Json<Value>> {
    let deal = state.store.get_deal(deal_id)?;
    Permissions::new(&state.store).require(req.user_id, deal.channel_id, Action::PostAd)?;
    if deal.status != DealStatus::Scheduled {
        return Err(EscrowError::InvalidTransition {
            from: deal.status,
            to: DealStatus::Funded,
            allowed: deal.status.allowed_next().to_vec(),
        }
        .into());
    }

    state.store.delete_scheduled_post(deal_id)?;
    let updated = state
        .store
        .cas_deal_status(deal_id, deal.status, DealStatus::Funded, req.user_id, |_| {})?;
    Ok(Json(json!({ "success": true, "deal": updated })))
}

pub async fn post_verify(State(state): St, Path(deal_id): Path<DealId>) -> ApiResult<Json<Value>> {
    escrow_scheduler::run_verify_tick(
        &state.store,
        state.messaging.as_ref(),
        &state.service,
        &state.notifier,
        Utc::now(),
    )
    .await;
    let post = state.store.get_scheduled_post(deal_id)?;
    let deal = state.store.get_deal(deal_id)?;
    Ok(Json(json!({ "success": true, "deal": deal, "post": post })))
}

// ── Health ───────────────────────────────────────────────────────────────

pub async fn health(State(state): St) -> Json<Value> {
    let store_ok = state.store.flush().is_ok();
    Json(json!({ "success": true, "store": if store_ok { "ok" } else { "degraded" } }))
}
