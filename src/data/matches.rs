//! Match, signup and live-team records shared by the roster and variant services.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::data::format::MatchFormat;
use crate::data::player::PlayerId;

pub type MatchId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupStatus {
    Starter,
    Reserve,
    NextTime,
}

impl SignupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Reserve => "reserve",
            Self::NextTime => "next_time",
        }
    }
}

impl fmt::Display for SignupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signup {
    pub player_id: PlayerId,
    pub status: SignupStatus,
    pub signed_up_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub format: MatchFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kickoff: Option<DateTime<Utc>>,
    #[serde(default)]
    pub signups: Vec<Signup>,
}

impl MatchRecord {
    pub fn new(format: MatchFormat, kickoff: Option<DateTime<Utc>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            format,
            kickoff,
            signups: Vec::new(),
        }
    }

    pub fn signup(&self, player_id: &str) -> Option<&Signup> {
        self.signups.iter().find(|s| s.player_id == player_id)
    }

    /// Starter ids in signup order.
    pub fn starter_ids(&self) -> Vec<PlayerId> {
        self.signups
            .iter()
            .filter(|s| s.status == SignupStatus::Starter)
            .map(|s| s.player_id.clone())
            .collect()
    }

    pub fn starter_count(&self) -> usize {
        self.signups
            .iter()
            .filter(|s| s.status == SignupStatus::Starter)
            .count()
    }

    pub fn is_starter(&self, player_id: &str) -> bool {
        self.signup(player_id)
            .is_some_and(|s| s.status == SignupStatus::Starter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    Light,
    Dark,
}

impl TeamSide {
    pub const BOTH: [TeamSide; 2] = [TeamSide::Light, TeamSide::Dark];
}

/// The two live team records of a match. Created on first application of a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub match_id: MatchId,
    pub side: TeamSide,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamAssignment {
    pub side: TeamSide,
    pub player_id: PlayerId,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn signup(id: &str, status: SignupStatus) -> Signup {
        Signup {
            player_id: id.to_string(),
            status,
            signed_up_at: Utc::now(),
        }
    }

    #[test]
    fn starters_keep_signup_order() {
        let mut record = MatchRecord::new(MatchFormat::ThreeASide, None);
        record.signups = vec![
            signup("c", SignupStatus::Starter),
            signup("a", SignupStatus::Reserve),
            signup("b", SignupStatus::Starter),
            signup("d", SignupStatus::NextTime),
        ];
        assert_eq!(record.starter_ids(), vec!["c".to_string(), "b".to_string()]);
        assert_eq!(record.starter_count(), 2);
        assert!(record.is_starter("b"));
        assert!(!record.is_starter("a"));
        assert!(!record.is_starter("nobody"));
    }
}
