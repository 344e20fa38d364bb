use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use crate::data::matches::MatchId;
use crate::data::player::{PlayerId, SkillRatings};
use crate::server::api::{
    self, BalanceRequest, BalanceResponse, CreateMatchRequest, ManualVariantRequest,
    ManualVariantResponse, MatchResponse, SignupRequest, SignupStatusRequest, StatusResponse,
    VariantsResponse,
};
use crate::server::error::{ApiError, ApiResult};
use crate::server::logging::log_requests;
use crate::variants::{ServiceError, VariantId, VariantService};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<VariantService>,
}

impl AppState {
    pub fn new(service: Arc<VariantService>) -> Self {
        Self { service }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/balance", post(balance_preview))
        .route("/api/matches", post(create_match))
        .route("/api/matches/:match_id", get(get_match))
        .route("/api/matches/:match_id/signups", post(sign_up))
        .route(
            "/api/matches/:match_id/signups/:player_id",
            put(set_signup_status).delete(withdraw),
        )
        .route("/api/players/:player_id/ratings", put(put_ratings))
        .route(
            "/api/matches/:match_id/variants",
            get(list_variants).post(generate_variants),
        )
        .route("/api/matches/:match_id/variants/manual", post(save_manual))
        .route("/api/variants/:variant_id/apply", post(apply_variant))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

/// Runs a service call on the blocking pool; generation fans out on rayon and store writes may
/// hit the filesystem.
async fn blocking<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&VariantService) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|err| ApiError::internal(format!("worker task failed: {err}")))?
        .map_err(ApiError::from)
}

async fn health() -> Json<serde_json::Value> {
    Json(api::health_payload())
}

async fn balance_preview(
    payload: Result<Json<BalanceRequest>, JsonRejection>,
) -> ApiResult<Json<BalanceResponse>> {
    let Json(request) = payload?;
    let response = tokio::task::spawn_blocking(move || api::balance_payload(request))
        .await
        .map_err(|err| ApiError::internal(format!("worker task failed: {err}")))??;
    Ok(Json(response))
}

async fn create_match(
    State(state): State<AppState>,
    payload: Result<Json<CreateMatchRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MatchResponse>)> {
    let Json(request) = payload?;
    let record = blocking(&state, move |service| {
        service.create_match(request.format, request.kickoff)
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(MatchResponse {
            status: "ok",
            record,
            teams: Default::default(),
            recommended_variant: None,
        }),
    ))
}

async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
) -> ApiResult<Json<MatchResponse>> {
    let response = blocking(&state, move |service| {
        let record = service.match_record(match_id)?;
        let teams = service.live_teams(match_id)?;
        let recommended_variant = service
            .list_variants(match_id)?
            .into_iter()
            .find(|variant| variant.recommended)
            .map(|variant| variant.id);
        Ok(MatchResponse {
            status: "ok",
            record,
            teams,
            recommended_variant,
        })
    })
    .await?;
    Ok(Json(response))
}

async fn sign_up(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<Json<MatchResponse>> {
    let Json(request) = payload?;
    if request.player_id.trim().is_empty() {
        return Err(ApiError::bad_request("player_id must not be empty"));
    }
    blocking(&state, move |service| {
        service.sign_up(match_id, &request.player_id, request.ratings)
    })
    .await?;
    get_match(State(state), Path(match_id)).await
}

async fn set_signup_status(
    State(state): State<AppState>,
    Path((match_id, player_id)): Path<(MatchId, PlayerId)>,
    payload: Result<Json<SignupStatusRequest>, JsonRejection>,
) -> ApiResult<Json<MatchResponse>> {
    let Json(request) = payload?;
    blocking(&state, move |service| {
        service.set_status(match_id, &player_id, request.status)
    })
    .await?;
    get_match(State(state), Path(match_id)).await
}

async fn withdraw(
    State(state): State<AppState>,
    Path((match_id, player_id)): Path<(MatchId, PlayerId)>,
) -> ApiResult<Json<MatchResponse>> {
    blocking(&state, move |service| service.withdraw(match_id, &player_id)).await?;
    get_match(State(state), Path(match_id)).await
}

async fn put_ratings(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
    payload: Result<Json<SkillRatings>, JsonRejection>,
) -> ApiResult<Json<StatusResponse>> {
    let Json(ratings) = payload?;
    blocking(&state, move |service| service.set_ratings(&player_id, ratings)).await?;
    Ok(Json(StatusResponse::ok()))
}

async fn list_variants(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
) -> ApiResult<Json<VariantsResponse>> {
    let variants = blocking(&state, move |service| service.list_variants(match_id)).await?;
    Ok(Json(VariantsResponse {
        status: "ok",
        variants,
    }))
}

async fn generate_variants(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
) -> ApiResult<Json<VariantsResponse>> {
    let variants = blocking(&state, move |service| service.regenerate(match_id)).await?;
    Ok(Json(VariantsResponse {
        status: "ok",
        variants,
    }))
}

async fn save_manual(
    State(state): State<AppState>,
    Path(match_id): Path<MatchId>,
    payload: Result<Json<ManualVariantRequest>, JsonRejection>,
) -> ApiResult<Json<ManualVariantResponse>> {
    let Json(request) = payload?;
    let outcome = blocking(&state, move |service| {
        service.save_and_apply_manual(match_id, &request.light, &request.dark)
    })
    .await?;
    Ok(Json(ManualVariantResponse {
        status: "ok",
        variant_id: outcome.variant_id,
        mean_delta: outcome.mean_delta,
    }))
}

async fn apply_variant(
    State(state): State<AppState>,
    Path(variant_id): Path<VariantId>,
) -> ApiResult<Json<StatusResponse>> {
    blocking(&state, move |service| service.apply(variant_id)).await?;
    Ok(Json(StatusResponse::ok()))
}
