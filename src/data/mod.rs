pub mod format;
pub mod matches;
pub mod player;
pub mod validate;

pub use format::MatchFormat;
pub use matches::{
    MatchId, MatchRecord, Signup, SignupStatus, TeamAssignment, TeamRecord, TeamSide,
};
pub use player::{
    load_roster, parse_roster, Axis, PlayerId, RatedPlayer, RatingError, RosterError,
    SkillRatings,
};
