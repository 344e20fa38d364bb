//! Persistence collaborator for matches, ratings, variants and live teams.
//!
//! The service only talks to [MatchStore]. Both bundled backends keep the whole dataset in a
//! [StoreState] behind a mutex; [JsonFileStore] additionally rewrites a JSON snapshot after every
//! mutation.

pub mod in_memory;
pub mod json_file;

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::data::matches::{MatchId, MatchRecord, Signup, TeamAssignment, TeamRecord, TeamSide};
use crate::data::player::{PlayerId, SkillRatings};
use crate::variants::error::StoreError;
use crate::variants::types::{Variant, VariantId, VariantKind};

pub use in_memory::InMemoryStore;
pub use json_file::JsonFileStore;

pub trait MatchStore: Send + Sync {
    fn insert_match(&self, record: MatchRecord) -> Result<(), StoreError>;

    fn load_match(&self, match_id: MatchId) -> Result<Option<MatchRecord>, StoreError>;

    /// Replaces the signup list. Returns false when the match does not exist.
    fn save_signups(&self, match_id: MatchId, signups: Vec<Signup>) -> Result<bool, StoreError>;

    fn load_ratings(&self, player_id: &str) -> Result<Option<SkillRatings>, StoreError>;

    fn save_ratings(&self, player_id: &str, ratings: SkillRatings) -> Result<(), StoreError>;

    /// Variants of a match ordered by ordinal.
    fn list_variants(&self, match_id: MatchId) -> Result<Vec<Variant>, StoreError>;

    fn load_variant(&self, variant_id: VariantId) -> Result<Option<Variant>, StoreError>;

    fn insert_variant(&self, variant: Variant) -> Result<(), StoreError>;

    /// Deletes every variant of the match. Returns how many were removed.
    fn delete_variants(&self, match_id: MatchId) -> Result<usize, StoreError>;

    fn delete_variant_kind(&self, match_id: MatchId, kind: VariantKind)
        -> Result<usize, StoreError>;

    /// Flags `variant_id` as recommended and clears the flag on every other variant of the match.
    fn mark_recommended(&self, match_id: MatchId, variant_id: VariantId)
        -> Result<(), StoreError>;

    /// Creates the light and dark team records if missing and returns both.
    fn ensure_teams(&self, match_id: MatchId) -> Result<Vec<TeamRecord>, StoreError>;

    fn load_teams(&self, match_id: MatchId) -> Result<Vec<TeamRecord>, StoreError>;

    fn replace_assignments(
        &self,
        match_id: MatchId,
        assignments: Vec<TeamAssignment>,
    ) -> Result<(), StoreError>;

    fn load_assignments(&self, match_id: MatchId) -> Result<Vec<TeamAssignment>, StoreError>;
}

/// Everything a store persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub matches: BTreeMap<MatchId, MatchRecord>,
    #[serde(default)]
    pub ratings: BTreeMap<PlayerId, SkillRatings>,
    #[serde(default)]
    pub variants: BTreeMap<VariantId, Variant>,
    #[serde(default)]
    pub teams: BTreeMap<MatchId, Vec<TeamRecord>>,
    #[serde(default)]
    pub assignments: BTreeMap<MatchId, Vec<TeamAssignment>>,
}

/// Closure-based access to a [StoreState]. Any backend implementing it gets [MatchStore].
pub trait StateBackend: Send + Sync {
    fn read<R>(&self, f: impl FnOnce(&StoreState) -> R) -> Result<R, StoreError>;

    fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> Result<R, StoreError>;
}

impl<B: StateBackend> MatchStore for B {
    fn insert_match(&self, record: MatchRecord) -> Result<(), StoreError> {
        self.write(|state| {
            state.matches.insert(record.id, record);
        })
    }

    fn load_match(&self, match_id: MatchId) -> Result<Option<MatchRecord>, StoreError> {
        self.read(|state| state.matches.get(&match_id).cloned())
    }

    fn save_signups(&self, match_id: MatchId, signups: Vec<Signup>) -> Result<bool, StoreError> {
        self.write(|state| match state.matches.get_mut(&match_id) {
            Some(record) => {
                record.signups = signups;
                true
            }
            None => false,
        })
    }

    fn load_ratings(&self, player_id: &str) -> Result<Option<SkillRatings>, StoreError> {
        self.read(|state| state.ratings.get(player_id).copied())
    }

    fn save_ratings(&self, player_id: &str, ratings: SkillRatings) -> Result<(), StoreError> {
        self.write(|state| {
            state.ratings.insert(player_id.to_string(), ratings);
        })
    }

    fn list_variants(&self, match_id: MatchId) -> Result<Vec<Variant>, StoreError> {
        self.read(|state| {
            let mut variants: Vec<Variant> = state
                .variants
                .values()
                .filter(|v| v.match_id == match_id)
                .cloned()
                .collect();
            variants.sort_by_key(|v| v.ordinal);
            variants
        })
    }

    fn load_variant(&self, variant_id: VariantId) -> Result<Option<Variant>, StoreError> {
        self.read(|state| state.variants.get(&variant_id).cloned())
    }

    fn insert_variant(&self, variant: Variant) -> Result<(), StoreError> {
        self.write(|state| {
            state.variants.insert(variant.id, variant);
        })
    }

    fn delete_variants(&self, match_id: MatchId) -> Result<usize, StoreError> {
        self.write(|state| {
            let before = state.variants.len();
            state.variants.retain(|_, v| v.match_id != match_id);
            before - state.variants.len()
        })
    }

    fn delete_variant_kind(
        &self,
        match_id: MatchId,
        kind: VariantKind,
    ) -> Result<usize, StoreError> {
        self.write(|state| {
            let before = state.variants.len();
            state
                .variants
                .retain(|_, v| !(v.match_id == match_id && v.kind == kind));
            before - state.variants.len()
        })
    }

    fn mark_recommended(
        &self,
        match_id: MatchId,
        variant_id: VariantId,
    ) -> Result<(), StoreError> {
        self.write(|state| {
            for variant in state.variants.values_mut() {
                if variant.match_id == match_id {
                    variant.recommended = variant.id == variant_id;
                }
            }
        })
    }

    fn ensure_teams(&self, match_id: MatchId) -> Result<Vec<TeamRecord>, StoreError> {
        self.write(|state| {
            let teams = state.teams.entry(match_id).or_default();
            for side in TeamSide::BOTH {
                if !teams.iter().any(|t| t.side == side) {
                    teams.push(TeamRecord {
                        match_id,
                        side,
                        created_at: Utc::now(),
                    });
                }
            }
            teams.clone()
        })
    }

    fn load_teams(&self, match_id: MatchId) -> Result<Vec<TeamRecord>, StoreError> {
        self.read(|state| state.teams.get(&match_id).cloned().unwrap_or_default())
    }

    fn replace_assignments(
        &self,
        match_id: MatchId,
        assignments: Vec<TeamAssignment>,
    ) -> Result<(), StoreError> {
        self.write(|state| {
            if assignments.is_empty() {
                state.assignments.remove(&match_id);
            } else {
                state.assignments.insert(match_id, assignments);
            }
        })
    }

    fn load_assignments(&self, match_id: MatchId) -> Result<Vec<TeamAssignment>, StoreError> {
        self.read(|state| state.assignments.get(&match_id).cloned().unwrap_or_default())
    }
}
