use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported sport sizes. The per-team size drives both admission and balancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchFormat {
    #[serde(rename = "3v3")]
    ThreeASide,
    #[serde(rename = "5v5")]
    FiveASide,
    #[serde(rename = "8v8")]
    EightASide,
    #[serde(rename = "11v11")]
    ElevenASide,
}

impl MatchFormat {
    pub fn per_team(self) -> usize {
        match self {
            Self::ThreeASide => 3,
            Self::FiveASide => 5,
            Self::EightASide => 8,
            Self::ElevenASide => 11,
        }
    }

    /// Starters admitted before new signups fall through to the reserve list.
    pub fn capacity(self) -> usize {
        self.per_team() * 2
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeASide => "3v3",
            Self::FiveASide => "5v5",
            Self::EightASide => "8v8",
            Self::ElevenASide => "11v11",
        }
    }
}

impl Default for MatchFormat {
    fn default() -> Self {
        Self::EightASide
    }
}

impl fmt::Display for MatchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown match format '{0}', expected one of 3v3, 5v5, 8v8, 11v11")]
pub struct UnknownFormat(pub String);

impl FromStr for MatchFormat {
    type Err = UnknownFormat;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "3v3" | "3" => Ok(Self::ThreeASide),
            "5v5" | "5" => Ok(Self::FiveASide),
            "8v8" | "8" => Ok(Self::EightASide),
            "11v11" | "11" => Ok(Self::ElevenASide),
            _ => Err(UnknownFormat(raw.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MatchFormat;

    #[test]
    fn per_team_table() {
        assert_eq!(MatchFormat::ThreeASide.per_team(), 3);
        assert_eq!(MatchFormat::FiveASide.per_team(), 5);
        assert_eq!(MatchFormat::EightASide.per_team(), 8);
        assert_eq!(MatchFormat::ElevenASide.per_team(), 11);
        assert_eq!(MatchFormat::ElevenASide.capacity(), 22);
    }

    #[test]
    fn parses_and_serializes_short_names() {
        assert_eq!("5v5".parse::<MatchFormat>(), Ok(MatchFormat::FiveASide));
        assert_eq!(" 11V11 ".parse::<MatchFormat>(), Ok(MatchFormat::ElevenASide));
        assert!("7v7".parse::<MatchFormat>().is_err());
        assert_eq!(
            serde_json::to_string(&MatchFormat::ThreeASide).expect("serialize"),
            "\"3v3\""
        );
    }
}
