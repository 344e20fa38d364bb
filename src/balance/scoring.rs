//! Dissimilarity score between two teams.
//!
//! `score = 0.7 * sum_axes |axis_mean_a - axis_mean_b| + 0.3 * |team_mean_a - team_mean_b|`.
//! Lower is better; 0 means the two teams are indistinguishable on every axis.

use crate::data::player::{Axis, RatedPlayer};

pub const AXIS_WEIGHT: f64 = 0.7;
pub const MEAN_WEIGHT: f64 = 0.3;

/// Per-axis arithmetic means of a team, indexed by [Axis::index]. All zero for an empty team.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisMeans(pub [f64; 6]);

impl AxisMeans {
    pub fn get(&self, axis: Axis) -> f64 {
        self.0[axis.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        Axis::ALL.iter().map(move |axis| (*axis, self.get(*axis)))
    }
}

/// Aggregates of a team needed for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TeamProfile {
    pub axis_means: AxisMeans,
    pub mean: f64,
    pub size: usize,
}

impl TeamProfile {
    pub fn of<'a, I>(players: I) -> Self
    where
        I: IntoIterator<Item = &'a RatedPlayer>,
    {
        let mut sums = [0.0_f64; 6];
        let mut mean_sum = 0.0;
        let mut size = 0usize;
        for player in players {
            for axis in Axis::ALL {
                sums[axis.index()] += f64::from(player.rating(axis));
            }
            mean_sum += player.mean;
            size += 1;
        }
        let divisor = size.max(1) as f64;
        Self {
            axis_means: AxisMeans(sums.map(|sum| sum / divisor)),
            mean: mean_sum / divisor,
            size,
        }
    }
}

/// Scores two teams from their axis means and overall means. Symmetric in its arguments.
pub fn balance_score(
    axis_means_a: &AxisMeans,
    team_mean_a: f64,
    axis_means_b: &AxisMeans,
    team_mean_b: f64,
) -> f64 {
    let axis_gap: f64 = Axis::ALL
        .iter()
        .map(|axis| (axis_means_a.get(*axis) - axis_means_b.get(*axis)).abs())
        .sum();
    AXIS_WEIGHT * axis_gap + MEAN_WEIGHT * (team_mean_a - team_mean_b).abs()
}

pub fn score_profiles(a: &TeamProfile, b: &TeamProfile) -> f64 {
    balance_score(&a.axis_means, a.mean, &b.axis_means, b.mean)
}

pub fn score_teams(a: &[&RatedPlayer], b: &[&RatedPlayer]) -> f64 {
    score_profiles(
        &TeamProfile::of(a.iter().copied()),
        &TeamProfile::of(b.iter().copied()),
    )
}

/// Absolute difference of the two teams' average player means. The human-facing summary.
pub fn mean_delta<'a, A, B>(light: A, dark: B) -> f64
where
    A: IntoIterator<Item = &'a RatedPlayer>,
    B: IntoIterator<Item = &'a RatedPlayer>,
{
    (TeamProfile::of(light).mean - TeamProfile::of(dark).mean).abs()
}
