pub mod greedy_local;
pub mod random_seeded;
pub mod rng;
pub mod scoring;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::player::{PlayerId, RatedPlayer};

pub use greedy_local::{balance_greedy_local, DEFAULT_MAX_SWAP_ROUNDS};
pub use random_seeded::balance_random_seeded;
pub use scoring::{balance_score, mean_delta, score_profiles, AxisMeans, TeamProfile};

/// Two disjoint teams of player ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPartition {
    pub light: Vec<PlayerId>,
    pub dark: Vec<PlayerId>,
}

impl TeamPartition {
    pub fn len(&self) -> usize {
        self.light.len() + self.dark.len()
    }

    pub fn is_empty(&self) -> bool {
        self.light.is_empty() && self.dark.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceOutcome {
    pub partition: TeamPartition,
    pub score: f64,
}

/// Which balancing algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceAlgorithm {
    /// Seeded shuffle then slice. Cheap baseline.
    RandomSeeded,
    /// Greedy seeding followed by pairwise-swap local search. The production path.
    GreedyLocal,
}

impl Default for BalanceAlgorithm {
    fn default() -> Self {
        Self::GreedyLocal
    }
}

impl BalanceAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RandomSeeded => "random_seeded",
            Self::GreedyLocal => "greedy_local",
        }
    }
}

impl fmt::Display for BalanceAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BalanceAlgorithm {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "random_seeded" | "random" => Ok(Self::RandomSeeded),
            "greedy_local" | "greedy" => Ok(Self::GreedyLocal),
            other => Err(format!("unknown balancing algorithm '{other}'")),
        }
    }
}

pub fn balance(
    players: &[RatedPlayer],
    per_team: usize,
    seed: u64,
    algorithm: BalanceAlgorithm,
) -> BalanceOutcome {
    match algorithm {
        BalanceAlgorithm::RandomSeeded => balance_random_seeded(players, per_team, seed),
        BalanceAlgorithm::GreedyLocal => {
            balance_greedy_local(players, per_team, seed, DEFAULT_MAX_SWAP_ROUNDS)
        }
    }
}

/// Upper bound for `per_team` in an ad-hoc run: an eleven-a-side squad.
pub const MAX_PER_TEAM: usize = 11;

/// A reason an ad-hoc roster can not be balanced as given.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceInputError {
    #[error("roster has no players")]
    NoPlayers,
    #[error("per_team must be between 1 and {max}, got {0}", max = MAX_PER_TEAM)]
    PerTeamOutOfRange(usize),
    #[error("duplicate player id '{0}'")]
    DuplicatePlayer(PlayerId),
}

/// Checks the roster ids and team size of an ad-hoc run, reporting every problem found.
pub fn check_balance_input<'a>(
    ids: impl IntoIterator<Item = &'a str>,
    per_team: usize,
) -> Vec<BalanceInputError> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for id in ids {
        if !seen.insert(id) {
            duplicates.push(BalanceInputError::DuplicatePlayer(id.to_string()));
        }
    }
    if seen.is_empty() {
        problems.push(BalanceInputError::NoPlayers);
    }
    if !(1..=MAX_PER_TEAM).contains(&per_team) {
        problems.push(BalanceInputError::PerTeamOutOfRange(per_team));
    }
    problems.extend(duplicates);
    problems
}

/// Resolves a partition's ids back to players, ignoring ids missing from `players`.
pub(crate) fn resolve<'a>(players: &'a [RatedPlayer], ids: &[PlayerId]) -> Vec<&'a RatedPlayer> {
    ids.iter()
        .filter_map(|id| players.iter().find(|p| &p.id == id))
        .collect()
}
