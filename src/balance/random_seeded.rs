use crate::balance::rng::Lcg;
use crate::balance::scoring::score_teams;
use crate::balance::{BalanceOutcome, TeamPartition};
use crate::data::player::RatedPlayer;

/// Shuffles the pool with a seeded LCG and slices it: the first `per_team` players go light,
/// the next `per_team` go dark. Players beyond `2 * per_team` are left out of both teams.
pub fn balance_random_seeded(players: &[RatedPlayer], per_team: usize, seed: u64) -> BalanceOutcome {
    let mut shuffled: Vec<&RatedPlayer> = players.iter().collect();
    deterministic_shuffle(&mut shuffled, seed);

    let light_end = per_team.min(shuffled.len());
    let dark_end = (per_team * 2).min(shuffled.len());
    let light = &shuffled[..light_end];
    let dark = &shuffled[light_end..dark_end];

    BalanceOutcome {
        score: score_teams(light, dark),
        partition: TeamPartition {
            light: light.iter().map(|p| p.id.clone()).collect(),
            dark: dark.iter().map(|p| p.id.clone()).collect(),
        },
    }
}

fn deterministic_shuffle<T>(items: &mut [T], seed: u64) {
    if items.len() < 2 {
        return;
    }

    let mut rng = Lcg::new(seed);
    for index in (1..items.len()).rev() {
        let swap_index = rng.next_index(index + 1);
        items.swap(index, swap_index);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::balance_random_seeded;
    use crate::data::player::{RatedPlayer, SkillRatings};

    fn pool(n: usize) -> Vec<RatedPlayer> {
        (0..n)
            .map(|i| {
                RatedPlayer::new(format!("p{i}"), SkillRatings::uniform((i % 5) as u8 + 1))
                    .expect("valid ratings")
            })
            .collect()
    }

    #[test]
    fn same_seed_same_partition() {
        let players = pool(10);
        let first = balance_random_seeded(&players, 5, 42);
        let second = balance_random_seeded(&players, 5, 42);
        assert_eq!(first.partition, second.partition);
        assert_eq!(first.score.to_bits(), second.score.to_bits());
    }

    #[test]
    fn different_seeds_usually_shuffle_differently() {
        let players = pool(16);
        let distinct: HashSet<Vec<String>> = (0..8)
            .map(|seed| balance_random_seeded(&players, 8, seed * 1000 + 17).partition.light)
            .collect();
        assert!(distinct.len() > 1, "seeds should not all agree");
    }

    #[test]
    fn covers_pool_when_it_fits() {
        let players = pool(6);
        let outcome = balance_random_seeded(&players, 3, 9);
        assert_eq!(outcome.partition.light.len(), 3);
        assert_eq!(outcome.partition.dark.len(), 3);
        let placed: HashSet<&String> = outcome
            .partition
            .light
            .iter()
            .chain(outcome.partition.dark.iter())
            .collect();
        assert_eq!(placed.len(), 6);
    }

    #[test]
    fn drops_overflow_and_handles_small_pools() {
        let players = pool(9);
        let outcome = balance_random_seeded(&players, 3, 1);
        assert_eq!(outcome.partition.len(), 6);

        let few = pool(4);
        let outcome = balance_random_seeded(&few, 3, 1);
        assert_eq!(outcome.partition.light.len(), 3);
        assert_eq!(outcome.partition.dark.len(), 1);

        let outcome = balance_random_seeded(&[], 3, 1);
        assert!(outcome.partition.is_empty());
        assert_eq!(outcome.score, 0.0);
    }
}
