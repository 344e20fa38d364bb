//! Greedy seeding followed by first-improvement pairwise-swap local search.
//!
//! Phase 1 walks players strongest-first (mean plus a small seeded jitter so different seeds give
//! different starting points) and drops each one on the side that keeps the score lowest.
//! Phase 2 scans every light/dark pair and commits a swap as soon as it lowers the score by more
//! than [IMPROVEMENT_EPSILON]; scans repeat until one finds nothing or the round cap is reached.

use crate::balance::rng::Lcg;
use crate::balance::scoring::{balance_score, AxisMeans};
use crate::balance::{BalanceOutcome, TeamPartition};
use crate::data::player::{Axis, RatedPlayer};

pub const DEFAULT_MAX_SWAP_ROUNDS: usize = 200;
/// Swaps must beat the current score by more than this to count as an improvement.
pub const IMPROVEMENT_EPSILON: f64 = 1e-9;
/// Jitter added to each player's mean before sorting lies in `[-JITTER / 2, JITTER / 2)`.
const JITTER: f64 = 0.1;

/// Full result of a greedy-local run, including the score before local search.
#[derive(Debug, Clone, PartialEq)]
pub struct GreedyLocalReport {
    pub outcome: BalanceOutcome,
    pub greedy_score: f64,
    pub rounds: usize,
    pub swaps: usize,
}

pub fn balance_greedy_local(
    players: &[RatedPlayer],
    per_team: usize,
    seed: u64,
    max_swap_rounds: usize,
) -> BalanceOutcome {
    balance_greedy_local_report(players, per_team, seed, max_swap_rounds).outcome
}

pub fn balance_greedy_local_report(
    players: &[RatedPlayer],
    per_team: usize,
    seed: u64,
    max_swap_rounds: usize,
) -> GreedyLocalReport {
    let (mut light, mut dark) = greedy_seed(players, per_team, seed);
    let greedy_score = TeamSums::of(&light).score_against(&TeamSums::of(&dark));
    let search = local_search(&mut light, &mut dark, max_swap_rounds);

    GreedyLocalReport {
        outcome: BalanceOutcome {
            partition: TeamPartition {
                light: light.iter().map(|p| p.id.clone()).collect(),
                dark: dark.iter().map(|p| p.id.clone()).collect(),
            },
            score: search.score,
        },
        greedy_score,
        rounds: search.rounds,
        swaps: search.swaps,
    }
}

/// Phase 1. Ties go to the light side.
pub fn greedy_seed<'a>(
    players: &'a [RatedPlayer],
    per_team: usize,
    seed: u64,
) -> (Vec<&'a RatedPlayer>, Vec<&'a RatedPlayer>) {
    let mut rng = Lcg::new(seed);
    let mut ordered: Vec<(f64, &RatedPlayer)> = players
        .iter()
        .map(|player| (player.mean + (rng.next_f64() - 0.5) * JITTER, player))
        .collect();
    ordered.sort_by(|left, right| right.0.total_cmp(&left.0));

    let mut light: Vec<&RatedPlayer> = Vec::with_capacity(per_team);
    let mut dark: Vec<&RatedPlayer> = Vec::with_capacity(per_team);
    let mut light_sums = TeamSums::default();
    let mut dark_sums = TeamSums::default();

    for (_, player) in ordered {
        let to_light = if light.len() >= per_team {
            false
        } else if dark.len() >= per_team {
            true
        } else {
            let score_light = light_sums.with(player).score_against(&dark_sums);
            let score_dark = dark_sums.with(player).score_against(&light_sums);
            score_light <= score_dark
        };

        if to_light {
            light_sums = light_sums.with(player);
            light.push(player);
        } else {
            dark_sums = dark_sums.with(player);
            dark.push(player);
        }
    }

    (light, dark)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalSearchStats {
    pub score: f64,
    pub rounds: usize,
    pub swaps: usize,
}

/// Phase 2. Mutates both teams in place; team sizes never change.
pub fn local_search<'a>(
    light: &mut [&'a RatedPlayer],
    dark: &mut [&'a RatedPlayer],
    max_rounds: usize,
) -> LocalSearchStats {
    let mut light_sums = TeamSums::of(light);
    let mut dark_sums = TeamSums::of(dark);
    let mut current = light_sums.score_against(&dark_sums);
    let mut rounds = 0;
    let mut swaps = 0;

    while rounds < max_rounds {
        rounds += 1;
        let mut improved = false;

        for i in 0..light.len() {
            for j in 0..dark.len() {
                let next_light = light_sums.swapped(light[i], dark[j]);
                let next_dark = dark_sums.swapped(dark[j], light[i]);
                let candidate = next_light.score_against(&next_dark);
                if candidate < current - IMPROVEMENT_EPSILON {
                    std::mem::swap(&mut light[i], &mut dark[j]);
                    light_sums = next_light;
                    dark_sums = next_dark;
                    current = candidate;
                    swaps += 1;
                    improved = true;
                }
            }
        }

        if !improved {
            break;
        }
    }

    LocalSearchStats {
        score: current,
        rounds,
        swaps,
    }
}

/// Running sums for a team so candidate moves are scored without rescanning the roster.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct TeamSums {
    axes: [f64; 6],
    mean: f64,
    count: usize,
}

impl TeamSums {
    fn of(players: &[&RatedPlayer]) -> Self {
        players
            .iter()
            .fold(Self::default(), |sums, player| sums.with(player))
    }

    fn with(mut self, player: &RatedPlayer) -> Self {
        for axis in Axis::ALL {
            self.axes[axis.index()] += f64::from(player.rating(axis));
        }
        self.mean += player.mean;
        self.count += 1;
        self
    }

    fn swapped(mut self, out: &RatedPlayer, incoming: &RatedPlayer) -> Self {
        for axis in Axis::ALL {
            self.axes[axis.index()] +=
                f64::from(incoming.rating(axis)) - f64::from(out.rating(axis));
        }
        self.mean += incoming.mean - out.mean;
        self
    }

    fn axis_means(&self) -> AxisMeans {
        let divisor = self.count.max(1) as f64;
        AxisMeans(self.axes.map(|sum| sum / divisor))
    }

    fn team_mean(&self) -> f64 {
        self.mean / self.count.max(1) as f64
    }

    fn score_against(&self, other: &Self) -> f64 {
        balance_score(
            &self.axis_means(),
            self.team_mean(),
            &other.axis_means(),
            other.team_mean(),
        )
    }
}
