//! Rated players: six skill axes scored 1..=5 and their arithmetic mean.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub type PlayerId = String;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Defense,
    Attack,
    Speed,
    Power,
    Technique,
    Shot,
}

impl Axis {
    pub const ALL: [Axis; 6] = [
        Axis::Defense,
        Axis::Attack,
        Axis::Speed,
        Axis::Power,
        Axis::Technique,
        Axis::Shot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Defense => "defense",
            Self::Attack => "attack",
            Self::Speed => "speed",
            Self::Power => "power",
            Self::Technique => "technique",
            Self::Shot => "shot",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RatingError {
    #[error("{axis} rating {value} is outside {MIN_RATING}..={MAX_RATING}")]
    OutOfRange { axis: Axis, value: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRatings {
    pub defense: u8,
    pub attack: u8,
    pub speed: u8,
    pub power: u8,
    pub technique: u8,
    pub shot: u8,
}

impl SkillRatings {
    /// Same rating on every axis. Handy for fixtures.
    pub fn uniform(value: u8) -> Self {
        Self {
            defense: value,
            attack: value,
            speed: value,
            power: value,
            technique: value,
            shot: value,
        }
    }

    pub fn get(&self, axis: Axis) -> u8 {
        match axis {
            Axis::Defense => self.defense,
            Axis::Attack => self.attack,
            Axis::Speed => self.speed,
            Axis::Power => self.power,
            Axis::Technique => self.technique,
            Axis::Shot => self.shot,
        }
    }

    pub fn validate(&self) -> Result<(), RatingError> {
        for axis in Axis::ALL {
            let value = self.get(axis);
            if !(MIN_RATING..=MAX_RATING).contains(&value) {
                return Err(RatingError::OutOfRange { axis, value });
            }
        }
        Ok(())
    }

    pub fn mean(&self) -> f64 {
        let total: u32 = Axis::ALL.iter().map(|axis| u32::from(self.get(*axis))).sum();
        f64::from(total) / Axis::ALL.len() as f64
    }
}

/// A player ready for balancing. Ratings are validated on construction and the mean is cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedPlayer {
    pub id: PlayerId,
    pub ratings: SkillRatings,
    pub mean: f64,
}

impl RatedPlayer {
    pub fn new(id: impl Into<PlayerId>, ratings: SkillRatings) -> Result<Self, RatingError> {
        ratings.validate()?;
        Ok(Self {
            id: id.into(),
            mean: ratings.mean(),
            ratings,
        })
    }

    pub fn rating(&self, axis: Axis) -> u8 {
        self.ratings.get(axis)
    }
}

/// One entry of a roster file: `{ "id": ..., "defense": 3, ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PlayerId,
    #[serde(flatten)]
    pub ratings: SkillRatings,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RosterFile {
    Wrapped { players: Vec<RosterEntry> },
    Bare(Vec<RosterEntry>),
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("unable to read roster: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to parse roster: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("player '{id}': {source}")]
    Rating { id: PlayerId, source: RatingError },
}

/// Parse a roster from JSON: either a bare array or `{ "players": [...] }`.
pub fn parse_roster(raw: &str) -> Result<Vec<RatedPlayer>, RosterError> {
    let entries = match serde_json::from_str::<RosterFile>(raw)? {
        RosterFile::Wrapped { players } => players,
        RosterFile::Bare(players) => players,
    };
    entries
        .into_iter()
        .map(|entry| {
            RatedPlayer::new(entry.id.clone(), entry.ratings)
                .map_err(|source| RosterError::Rating { id: entry.id, source })
        })
        .collect()
}

pub fn load_roster(path: impl AsRef<Path>) -> Result<Vec<RatedPlayer>, RosterError> {
    let raw = fs::read_to_string(path)?;
    parse_roster(&raw)
}
