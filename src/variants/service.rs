//! Variant orchestration: generate ranked splits for a match's starters, apply one to the live
//! teams, save the manual V4 split, and keep everything in step with roster changes.
//!
//! Every operation that touches a match runs under that match's lock, so a regeneration can not
//! interleave with another regeneration, an apply or a signup on the same match. Different
//! matches proceed independently.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::balance::greedy_local::{balance_greedy_local_report, DEFAULT_MAX_SWAP_ROUNDS};
use crate::balance::{mean_delta, resolve, TeamPartition};
use crate::data::format::MatchFormat;
use crate::data::matches::{MatchId, MatchRecord, Signup, SignupStatus, TeamAssignment, TeamSide};
use crate::data::player::{PlayerId, RatedPlayer, SkillRatings};
use crate::notify::{match_topic, NoopPublisher, Publisher};
use crate::variants::error::ServiceError;
use crate::variants::ranking::{rank_candidates, Candidate};
use crate::variants::store::{InMemoryStore, MatchStore};
use crate::variants::types::{
    ManualVariantOutcome, Variant, VariantAlgorithm, VariantId, VariantKind,
};

const LOG_TARGET: &str = "calciotto::variants";

/// How a batch of generated variants is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Algorithm runs per batch. Only the best three are kept.
    pub runs: usize,
    /// Swap-round budget per run, cycled when there are more runs than entries.
    pub swap_rounds: Vec<usize>,
    /// Fixed base seed. When unset the current time in milliseconds is used.
    pub base_seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            runs: VariantKind::GENERATED.len(),
            swap_rounds: vec![DEFAULT_MAX_SWAP_ROUNDS, 150, 100],
            base_seed: None,
        }
    }
}

impl GenerationConfig {
    fn swap_rounds_for(&self, run: usize) -> usize {
        if self.swap_rounds.is_empty() {
            DEFAULT_MAX_SWAP_ROUNDS
        } else {
            self.swap_rounds[run % self.swap_rounds.len()]
        }
    }
}

#[derive(Debug, Default)]
struct MatchLocks {
    locks: Mutex<HashMap<MatchId, Arc<Mutex<()>>>>,
}

impl MatchLocks {
    /// Entries nobody holds any more are dropped on every call, so the map stays bounded by the
    /// number of matches with an operation in flight.
    fn handle(&self, match_id: MatchId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(match_id).or_default())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

pub struct VariantService {
    store: Arc<dyn MatchStore>,
    publisher: Arc<dyn Publisher>,
    config: GenerationConfig,
    locks: MatchLocks,
}

impl VariantService {
    pub fn new(
        store: Arc<dyn MatchStore>,
        publisher: Arc<dyn Publisher>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            store,
            publisher,
            config,
            locks: MatchLocks::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(NoopPublisher),
            GenerationConfig::default(),
        )
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    // ---- matches and roster ----

    pub fn create_match(
        &self,
        format: MatchFormat,
        kickoff: Option<DateTime<Utc>>,
    ) -> Result<MatchRecord, ServiceError> {
        let record = MatchRecord::new(format, kickoff);
        self.store.insert_match(record.clone())?;
        info!(target: LOG_TARGET, match_id = %record.id, %format, "match created");
        Ok(record)
    }

    pub fn match_record(&self, match_id: MatchId) -> Result<MatchRecord, ServiceError> {
        self.store
            .load_match(match_id)?
            .ok_or(ServiceError::MatchNotFound(match_id))
    }

    pub fn set_ratings(&self, player_id: &str, ratings: SkillRatings) -> Result<(), ServiceError> {
        ratings.validate()?;
        self.store.save_ratings(player_id, ratings)?;
        debug!(target: LOG_TARGET, %player_id, "ratings saved");
        Ok(())
    }

    pub fn ratings(&self, player_id: &str) -> Result<Option<SkillRatings>, ServiceError> {
        Ok(self.store.load_ratings(player_id)?)
    }

    /// Signs a player up. Starters are admitted until the format's capacity is reached, later
    /// signups go to the reserve list. Ratings may be supplied here; a player without ratings on
    /// file is rejected.
    pub fn sign_up(
        &self,
        match_id: MatchId,
        player_id: &str,
        ratings: Option<SkillRatings>,
    ) -> Result<Signup, ServiceError> {
        let handle = self.locks.handle(match_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut record = self.match_record(match_id)?;
        if record.signup(player_id).is_some() {
            return Err(ServiceError::AlreadySignedUp(player_id.to_string()));
        }
        match ratings {
            Some(ratings) => self.set_ratings(player_id, ratings)?,
            None => self.require_ratings(player_id)?,
        }

        let status = if record.starter_count() < record.format.capacity() {
            SignupStatus::Starter
        } else {
            SignupStatus::Reserve
        };
        let signup = Signup {
            player_id: player_id.to_string(),
            status,
            signed_up_at: Utc::now(),
        };
        record.signups.push(signup.clone());
        self.save_signups(&record)?;
        info!(target: LOG_TARGET, %match_id, %player_id, %status, "player signed up");

        if status == SignupStatus::Starter {
            self.refresh_locked(&record)?;
        }
        self.publish_roster(match_id);
        Ok(signup)
    }

    pub fn set_status(
        &self,
        match_id: MatchId,
        player_id: &str,
        status: SignupStatus,
    ) -> Result<Signup, ServiceError> {
        let handle = self.locks.handle(match_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut record = self.match_record(match_id)?;
        let starters = record.starter_count();
        let capacity = record.format.capacity();
        let signup = record
            .signups
            .iter_mut()
            .find(|s| s.player_id == player_id)
            .ok_or_else(|| ServiceError::NotSignedUp(player_id.to_string()))?;
        let previous = signup.status;
        if previous == status {
            return Ok(signup.clone());
        }
        if status == SignupStatus::Starter {
            if starters >= capacity {
                warn!(target: LOG_TARGET, %match_id, %player_id, capacity, "promotion rejected: starters full");
                return Err(ServiceError::StartersFull { match_id, capacity });
            }
            self.require_ratings(player_id)?;
        }
        signup.status = status;
        let updated = signup.clone();
        self.save_signups(&record)?;
        info!(target: LOG_TARGET, %match_id, %player_id, from = %previous, to = %status, "signup status changed");

        if previous == SignupStatus::Starter || status == SignupStatus::Starter {
            self.refresh_locked(&record)?;
        }
        self.publish_roster(match_id);
        Ok(updated)
    }

    /// Removes a signup. When a starter leaves, the earliest reserve takes the spot.
    pub fn withdraw(&self, match_id: MatchId, player_id: &str) -> Result<(), ServiceError> {
        let handle = self.locks.handle(match_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let mut record = self.match_record(match_id)?;
        let index = record
            .signups
            .iter()
            .position(|s| s.player_id == player_id)
            .ok_or_else(|| ServiceError::NotSignedUp(player_id.to_string()))?;
        let removed = record.signups.remove(index);

        if removed.status == SignupStatus::Starter {
            if let Some(reserve) = record
                .signups
                .iter_mut()
                .find(|s| s.status == SignupStatus::Reserve)
            {
                reserve.status = SignupStatus::Starter;
                info!(target: LOG_TARGET, %match_id, player_id = %reserve.player_id, "reserve promoted");
            }
        }
        self.save_signups(&record)?;
        info!(target: LOG_TARGET, %match_id, %player_id, "player withdrew");

        if removed.status == SignupStatus::Starter {
            self.refresh_locked(&record)?;
        }
        self.publish_roster(match_id);
        Ok(())
    }

    // ---- variants ----

    /// Replaces the match's variants with a fresh ranked batch. Does not touch the live teams;
    /// see [VariantService::regenerate] for generate-then-apply.
    pub fn generate(&self, match_id: MatchId) -> Result<Vec<VariantId>, ServiceError> {
        let handle = self.locks.handle(match_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let record = self.match_record(match_id)?;
        self.generate_locked(&record)
    }

    /// Generates a new batch and applies V1, as one step under the match lock.
    pub fn regenerate(&self, match_id: MatchId) -> Result<Vec<Variant>, ServiceError> {
        let handle = self.locks.handle(match_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let record = self.match_record(match_id)?;
        let ids = self.generate_locked(&record)?;
        if let Some(best) = ids.first() {
            let variant = self
                .store
                .load_variant(*best)?
                .ok_or(ServiceError::VariantNotFound(*best))?;
            self.apply_locked(&variant)?;
        }
        Ok(self.store.list_variants(match_id)?)
    }

    /// Copies a variant into the live team assignments and makes it the recommended one.
    pub fn apply(&self, variant_id: VariantId) -> Result<(), ServiceError> {
        let match_id = self
            .store
            .load_variant(variant_id)?
            .ok_or(ServiceError::VariantNotFound(variant_id))?
            .match_id;

        let handle = self.locks.handle(match_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        // Reload under the lock: a concurrent regeneration may have replaced it.
        let variant = self
            .store
            .load_variant(variant_id)?
            .ok_or(ServiceError::VariantNotFound(variant_id))?;
        self.apply_locked(&variant)
    }

    /// Stores an admin-authored split as V4, replacing any earlier one. Every id must belong to a
    /// current starter; otherwise nothing is written.
    pub fn save_manual(
        &self,
        match_id: MatchId,
        light: &[PlayerId],
        dark: &[PlayerId],
    ) -> Result<ManualVariantOutcome, ServiceError> {
        let handle = self.locks.handle(match_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let variant = self.save_manual_locked(match_id, light, dark)?;
        Ok(ManualVariantOutcome {
            variant_id: variant.id,
            mean_delta: variant.mean_delta,
        })
    }

    /// Saves the manual split and applies it in one step under the match lock, so a concurrent
    /// regeneration can not drop the new V4 before it reaches the live teams.
    pub fn save_and_apply_manual(
        &self,
        match_id: MatchId,
        light: &[PlayerId],
        dark: &[PlayerId],
    ) -> Result<ManualVariantOutcome, ServiceError> {
        let handle = self.locks.handle(match_id);
        let _guard = handle.lock().unwrap_or_else(PoisonError::into_inner);

        let variant = self.save_manual_locked(match_id, light, dark)?;
        self.apply_locked(&variant)?;
        Ok(ManualVariantOutcome {
            variant_id: variant.id,
            mean_delta: variant.mean_delta,
        })
    }

    fn save_manual_locked(
        &self,
        match_id: MatchId,
        light: &[PlayerId],
        dark: &[PlayerId],
    ) -> Result<Variant, ServiceError> {
        let record = self.match_record(match_id)?;
        let mut seen = HashSet::new();
        for player_id in light.iter().chain(dark) {
            if !seen.insert(player_id.as_str()) {
                warn!(target: LOG_TARGET, %match_id, %player_id, "manual split rejected: duplicate");
                return Err(ServiceError::DuplicatePlayer(player_id.clone()));
            }
            if !record.is_starter(player_id) {
                warn!(target: LOG_TARGET, %match_id, %player_id, "manual split rejected: not a starter");
                return Err(ServiceError::NotAStarter(player_id.clone()));
            }
        }

        let light_players = self.rated_players(light)?;
        let dark_players = self.rated_players(dark)?;
        let delta = mean_delta(&light_players, &dark_players);

        let replaced = self.store.delete_variant_kind(match_id, VariantKind::V4)?;
        let variant = Variant {
            id: Uuid::new_v4(),
            match_id,
            ordinal: VariantKind::V4.ordinal(),
            kind: VariantKind::V4,
            algorithm: VariantAlgorithm::Manual,
            seed: None,
            score: 0.0,
            mean_delta: delta,
            computed_best: false,
            recommended: false,
            light: light.to_vec(),
            dark: dark.to_vec(),
            created_at: Utc::now(),
        };
        let variant_id = variant.id;
        self.store.insert_variant(variant.clone())?;

        info!(target: LOG_TARGET, %match_id, %variant_id, mean_delta = delta, replaced, "manual variant saved");
        self.publisher.publish(
            &match_topic(match_id),
            json!({ "event": "manual_variant_saved", "variant_id": variant_id, "mean_delta": delta }),
        );
        Ok(variant)
    }

    pub fn list_variants(&self, match_id: MatchId) -> Result<Vec<Variant>, ServiceError> {
        self.match_record(match_id)?;
        Ok(self.store.list_variants(match_id)?)
    }

    pub fn variant(&self, variant_id: VariantId) -> Result<Variant, ServiceError> {
        self.store
            .load_variant(variant_id)?
            .ok_or(ServiceError::VariantNotFound(variant_id))
    }

    /// The split currently shown for the match. Empty until a variant has been applied.
    pub fn live_teams(&self, match_id: MatchId) -> Result<TeamPartition, ServiceError> {
        self.match_record(match_id)?;
        let mut partition = TeamPartition::default();
        for assignment in self.store.load_assignments(match_id)? {
            match assignment.side {
                TeamSide::Light => partition.light.push(assignment.player_id),
                TeamSide::Dark => partition.dark.push(assignment.player_id),
            }
        }
        Ok(partition)
    }

    // ---- internals; callers hold the match lock ----

    fn generate_locked(&self, record: &MatchRecord) -> Result<Vec<VariantId>, ServiceError> {
        let match_id = record.id;
        let starters = self.load_starters(record)?;
        let per_team = record.format.per_team();

        let removed = self.store.delete_variants(match_id)?;
        let base_seed = self
            .config
            .base_seed
            .unwrap_or_else(|| Utc::now().timestamp_millis().unsigned_abs());

        let candidates: Vec<Candidate> = (0..self.config.runs.max(1))
            .into_par_iter()
            .map(|run| {
                let seed = base_seed.wrapping_add(run as u64);
                let rounds = self.config.swap_rounds_for(run);
                let report = balance_greedy_local_report(&starters, per_team, seed, rounds);
                let partition = report.outcome.partition;
                let mean_delta = mean_delta(
                    resolve(&starters, &partition.light),
                    resolve(&starters, &partition.dark),
                );
                debug!(
                    target: LOG_TARGET,
                    %match_id,
                    seed,
                    rounds_budget = rounds,
                    rounds_used = report.rounds,
                    swaps = report.swaps,
                    greedy_score = report.greedy_score,
                    score = report.outcome.score,
                    mean_delta,
                    "balancing run finished"
                );
                Candidate {
                    partition,
                    seed,
                    score: report.outcome.score,
                    mean_delta,
                }
            })
            .collect();

        let created_at = Utc::now();
        let mut ids = Vec::with_capacity(VariantKind::GENERATED.len());
        for (kind, candidate) in rank_candidates(candidates) {
            let variant = Variant {
                id: Uuid::new_v4(),
                match_id,
                ordinal: kind.ordinal(),
                kind,
                algorithm: VariantAlgorithm::GreedyLocal,
                seed: Some(candidate.seed),
                score: candidate.score,
                mean_delta: candidate.mean_delta,
                computed_best: kind == VariantKind::V1,
                recommended: kind == VariantKind::V1,
                light: candidate.partition.light,
                dark: candidate.partition.dark,
                created_at,
            };
            ids.push(variant.id);
            self.store.insert_variant(variant)?;
        }

        info!(
            target: LOG_TARGET,
            %match_id,
            starters = starters.len(),
            per_team,
            removed,
            generated = ids.len(),
            "variants generated"
        );
        self.publisher.publish(
            &match_topic(match_id),
            json!({ "event": "variants_generated", "variant_ids": ids }),
        );
        Ok(ids)
    }

    fn apply_locked(&self, variant: &Variant) -> Result<(), ServiceError> {
        let match_id = variant.match_id;
        self.match_record(match_id)?;
        self.store.ensure_teams(match_id)?;

        let assignments: Vec<TeamAssignment> = variant
            .light
            .iter()
            .map(|id| (TeamSide::Light, id))
            .chain(variant.dark.iter().map(|id| (TeamSide::Dark, id)))
            .map(|(side, player_id)| TeamAssignment {
                side,
                player_id: player_id.clone(),
            })
            .collect();
        self.store.replace_assignments(match_id, assignments)?;
        self.store.mark_recommended(match_id, variant.id)?;

        info!(target: LOG_TARGET, %match_id, variant_id = %variant.id, kind = %variant.kind, "variant applied");
        self.publisher.publish(
            &match_topic(match_id),
            json!({ "event": "variant_applied", "variant_id": variant.id, "kind": variant.kind }),
        );
        Ok(())
    }

    /// Brings variants and live teams back in line after the starter set changed.
    fn refresh_locked(&self, record: &MatchRecord) -> Result<(), ServiceError> {
        if record.starter_count() == 0 {
            let removed = self.store.delete_variants(record.id)?;
            self.store.replace_assignments(record.id, Vec::new())?;
            info!(target: LOG_TARGET, match_id = %record.id, removed, "no starters left, variants cleared");
            return Ok(());
        }

        let ids = self.generate_locked(record)?;
        if let Some(best) = ids.first() {
            let variant = self
                .store
                .load_variant(*best)?
                .ok_or(ServiceError::VariantNotFound(*best))?;
            self.apply_locked(&variant)?;
        }
        Ok(())
    }

    fn load_starters(&self, record: &MatchRecord) -> Result<Vec<RatedPlayer>, ServiceError> {
        let starter_ids = record.starter_ids();
        if starter_ids.is_empty() {
            return Err(ServiceError::NoStarters(record.id));
        }
        self.rated_players(&starter_ids)
    }

    fn rated_players(&self, ids: &[PlayerId]) -> Result<Vec<RatedPlayer>, ServiceError> {
        ids.iter()
            .map(|id| {
                let ratings = self
                    .store
                    .load_ratings(id)?
                    .ok_or_else(|| ServiceError::MissingRatings(id.clone()))?;
                Ok(RatedPlayer::new(id.clone(), ratings)?)
            })
            .collect()
    }

    fn require_ratings(&self, player_id: &str) -> Result<(), ServiceError> {
        match self.store.load_ratings(player_id)? {
            Some(_) => Ok(()),
            None => Err(ServiceError::MissingRatings(player_id.to_string())),
        }
    }

    fn save_signups(&self, record: &MatchRecord) -> Result<(), ServiceError> {
        if self.store.save_signups(record.id, record.signups.clone())? {
            Ok(())
        } else {
            Err(ServiceError::MatchNotFound(record.id))
        }
    }

    fn publish_roster(&self, match_id: MatchId) {
        self.publisher.publish(
            &match_topic(match_id),
            json!({ "event": "roster_changed" }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_rounds_cycle_and_fall_back() {
        let config = GenerationConfig::default();
        assert_eq!(config.swap_rounds_for(0), 200);
        assert_eq!(config.swap_rounds_for(2), 100);
        assert_eq!(config.swap_rounds_for(3), 200);

        let empty = GenerationConfig {
            swap_rounds: vec![],
            ..GenerationConfig::default()
        };
        assert_eq!(empty.swap_rounds_for(5), DEFAULT_MAX_SWAP_ROUNDS);
    }

    #[test]
    fn generation_config_fills_missing_fields() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"base_seed": 9}"#).expect("partial config");
        assert_eq!(config.runs, 3);
        assert_eq!(config.base_seed, Some(9));
    }

    #[test]
    fn match_locks_are_shared_per_match() {
        let locks = MatchLocks::default();
        let id = Uuid::new_v4();
        assert!(Arc::ptr_eq(&locks.handle(id), &locks.handle(id)));
        assert!(!Arc::ptr_eq(&locks.handle(id), &locks.handle(Uuid::new_v4())));
    }

    #[test]
    fn match_locks_drop_released_entries() {
        let locks = MatchLocks::default();
        for _ in 0..50 {
            drop(locks.handle(Uuid::new_v4()));
        }
        assert_eq!(locks.len(), 1);

        let held_id = Uuid::new_v4();
        let held = locks.handle(held_id);
        let _other = locks.handle(Uuid::new_v4());
        assert_eq!(locks.len(), 2);
        assert!(Arc::ptr_eq(&held, &locks.handle(held_id)));
    }
}
