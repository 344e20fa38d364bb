use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::balance::{
    balance, check_balance_input, mean_delta, resolve, BalanceAlgorithm, BalanceInputError,
    TeamPartition,
};
use crate::data::format::MatchFormat;
use crate::data::matches::{MatchRecord, SignupStatus};
use crate::data::player::{PlayerId, RatedPlayer, RosterEntry, SkillRatings};
use crate::server::error::ApiError;
use crate::variants::{Variant, VariantId};


#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub errors: Vec<ValidationIssue>,
}

pub fn health_payload() -> serde_json::Value {
    serde_json::json!({
        "status": "ok",
        "service": "calciotto-api",
        "version": env!("CARGO_PKG_VERSION")
    })
}

// ---- stateless preview ----

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceRequest {
    pub players: Vec<RosterEntry>,
    pub per_team: Option<usize>,
    pub seed: Option<u64>,
    pub algorithm: Option<BalanceAlgorithm>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub status: &'static str,
    pub algorithm: BalanceAlgorithm,
    pub per_team: usize,
    pub seed: u64,
    pub score: f64,
    pub mean_delta: f64,
    pub light: Vec<PlayerId>,
    pub dark: Vec<PlayerId>,
    /// Players beyond `2 * per_team` that did not make either side.
    pub unassigned: Vec<PlayerId>,
}

pub fn balance_payload(request: BalanceRequest) -> Result<BalanceResponse, ApiError> {
    let per_team = request
        .per_team
        .unwrap_or_else(|| (request.players.len() / 2).max(1));
    let players = validate_balance_request(&request, per_team)?;
    let seed = request.seed.unwrap_or(0);
    let algorithm = request.algorithm.unwrap_or_default();

    let outcome = balance(&players, per_team, seed, algorithm);
    let TeamPartition { light, dark } = outcome.partition;
    let delta = mean_delta(resolve(&players, &light), resolve(&players, &dark));
    let assigned: HashSet<&PlayerId> = light.iter().chain(&dark).collect();
    let unassigned = players
        .iter()
        .filter(|p| !assigned.contains(&p.id))
        .map(|p| p.id.clone())
        .collect();

    Ok(BalanceResponse {
        status: "ok",
        algorithm,
        per_team,
        seed,
        score: outcome.score,
        mean_delta: delta,
        light,
        dark,
        unassigned,
    })
}

fn validate_balance_request(
    request: &BalanceRequest,
    per_team: usize,
) -> Result<Vec<RatedPlayer>, ApiError> {
    let mut roster_messages = Vec::new();
    let mut per_team_messages = Vec::new();
    let mut player_messages = Vec::new();
    let named = request
        .players
        .iter()
        .map(|entry| entry.id.as_str())
        .filter(|id| !id.trim().is_empty());
    for problem in check_balance_input(named, per_team) {
        match problem {
            BalanceInputError::NoPlayers => roster_messages.push(problem.to_string()),
            BalanceInputError::PerTeamOutOfRange(_) => per_team_messages.push(problem.to_string()),
            BalanceInputError::DuplicatePlayer(_) => player_messages.push(problem.to_string()),
        }
    }

    let mut seen = HashSet::new();
    let mut players = Vec::with_capacity(request.players.len());
    for entry in &request.players {
        if entry.id.trim().is_empty() {
            player_messages.push("player id must not be empty".to_string());
            continue;
        }
        if !seen.insert(entry.id.as_str()) {
            continue;
        }
        match RatedPlayer::new(entry.id.clone(), entry.ratings) {
            Ok(player) => players.push(player),
            Err(err) => player_messages.push(format!("player '{}': {err}", entry.id)),
        }
    }

    let errors: Vec<ValidationIssue> = [
        ("players", roster_messages),
        ("per_team", per_team_messages),
        ("players", player_messages),
    ]
    .into_iter()
    .filter(|(_, messages)| !messages.is_empty())
    .map(|(field, messages)| ValidationIssue { field, messages })
    .collect();

    if errors.is_empty() {
        return Ok(players);
    }

    Err(ApiError::Validation(ValidationErrorResponse {
        status: "error",
        message: "Validation failed",
        errors,
    }))
}

// ---- matches ----

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMatchRequest {
    #[serde(default)]
    pub format: MatchFormat,
    pub kickoff: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchResponse {
    pub status: &'static str,
    #[serde(rename = "match")]
    pub record: MatchRecord,
    pub teams: TeamPartition,
    pub recommended_variant: Option<VariantId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub player_id: PlayerId,
    pub ratings: Option<SkillRatings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupStatusRequest {
    pub status: SignupStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

// ---- variants ----

#[derive(Debug, Clone, Serialize)]
pub struct VariantsResponse {
    pub status: &'static str,
    pub variants: Vec<Variant>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManualVariantRequest {
    pub light: Vec<PlayerId>,
    pub dark: Vec<PlayerId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManualVariantResponse {
    pub status: &'static str,
    pub variant_id: VariantId,
    pub mean_delta: f64,
}
