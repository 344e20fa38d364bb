use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::balance::{BalanceAlgorithm, TeamPartition};
use crate::data::matches::MatchId;
use crate::data::player::PlayerId;

pub type VariantId = Uuid;

/// V1..V3 are generated and ranked best-first; V4 is the single manual slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VariantKind {
    V1,
    V2,
    V3,
    V4,
}

impl VariantKind {
    pub const GENERATED: [VariantKind; 3] = [VariantKind::V1, VariantKind::V2, VariantKind::V3];

    pub fn ordinal(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
            Self::V4 => 4,
        }
    }

    pub fn is_manual(self) -> bool {
        self == Self::V4
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.ordinal())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantAlgorithm {
    GreedyLocal,
    RandomSeeded,
    Manual,
}

impl From<BalanceAlgorithm> for VariantAlgorithm {
    fn from(algorithm: BalanceAlgorithm) -> Self {
        match algorithm {
            BalanceAlgorithm::GreedyLocal => Self::GreedyLocal,
            BalanceAlgorithm::RandomSeeded => Self::RandomSeeded,
        }
    }
}

/// A persisted candidate split for a match.
///
/// `computed_best` is fixed when the batch is generated and marks the best-ranked split.
/// `recommended` follows the last applied variant, so it reflects what the admin chose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub match_id: MatchId,
    pub ordinal: u8,
    pub kind: VariantKind,
    pub algorithm: VariantAlgorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub score: f64,
    pub mean_delta: f64,
    pub computed_best: bool,
    pub recommended: bool,
    pub light: Vec<PlayerId>,
    pub dark: Vec<PlayerId>,
    pub created_at: DateTime<Utc>,
}

impl Variant {
    pub fn partition(&self) -> TeamPartition {
        TeamPartition {
            light: self.light.clone(),
            dark: self.dark.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ManualVariantOutcome {
    pub variant_id: VariantId,
    pub mean_delta: f64,
}
