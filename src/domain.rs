//! Match records and the vocabulary shared by every pipeline stage.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use ordinalizer::Ordinal;
use serde::{Deserialize, Serialize};
use strum_macros::{EnumCount, EnumIter};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}
impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Scheduled,
    InPlay,
    Finished,
    Postponed,
    Cancelled,
}

impl FromStr for MatchStatus {
    type Err = InvalidRecord;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" | "timed" => Ok(MatchStatus::Scheduled),
            "in_play" | "live" | "paused" => Ok(MatchStatus::InPlay),
            "finished" | "" => Ok(MatchStatus::Finished),
            "postponed" | "suspended" => Ok(MatchStatus::Postponed),
            "cancelled" | "canceled" => Ok(MatchStatus::Cancelled),
            _ => Err(InvalidRecord::Status(s.to_string())),
        }
    }
}

/// Full-time result from the home side's point of view. The ordinal doubles as the class index
/// of the outcome label.
#[derive(
    Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Ordinal, EnumCount, EnumIter, Serialize, Deserialize,
)]
pub enum MatchResult {
    Home,
    Draw,
    Away,
}
impl MatchResult {
    pub fn from_goals(home_goals: u8, away_goals: u8) -> Self {
        match home_goals.cmp(&away_goals) {
            std::cmp::Ordering::Greater => MatchResult::Home,
            std::cmp::Ordering::Equal => MatchResult::Draw,
            std::cmp::Ordering::Less => MatchResult::Away,
        }
    }

    pub fn label(&self) -> char {
        match self {
            MatchResult::Home => 'H',
            MatchResult::Draw => 'D',
            MatchResult::Away => 'A',
        }
    }

    pub fn from_label(label: char) -> Option<Self> {
        match label.to_ascii_uppercase() {
            'H' => Some(MatchResult::Home),
            'D' => Some(MatchResult::Draw),
            'A' => Some(MatchResult::Away),
            _ => None,
        }
    }

    /// The result as experienced by the team playing on the given `side`.
    pub fn outcome_for(&self, side: Side) -> TeamOutcome {
        match (self, side) {
            (MatchResult::Draw, _) => TeamOutcome::Draw,
            (MatchResult::Home, Side::Home) | (MatchResult::Away, Side::Away) => TeamOutcome::Win,
            _ => TeamOutcome::Loss,
        }
    }
}

impl Display for MatchResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Signed result from a single team's perspective.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum TeamOutcome {
    Win,
    Draw,
    Loss,
}
impl TeamOutcome {
    pub fn signum(&self) -> i8 {
        match self {
            TeamOutcome::Win => 1,
            TeamOutcome::Draw => 0,
            TeamOutcome::Loss => -1,
        }
    }

    pub fn points(&self) -> u8 {
        match self {
            TeamOutcome::Win => 3,
            TeamOutcome::Draw => 1,
            TeamOutcome::Loss => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub date: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u8,
    pub away_goals: u8,
    pub status: MatchStatus,
}
impl MatchRecord {
    pub fn finished(
        date: DateTime<Utc>,
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        home_goals: u8,
        away_goals: u8,
    ) -> Self {
        Self {
            date,
            home_team: home_team.into(),
            away_team: away_team.into(),
            home_goals,
            away_goals,
            status: MatchStatus::Finished,
        }
    }

    pub fn result(&self) -> MatchResult {
        MatchResult::from_goals(self.home_goals, self.away_goals)
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    /// Goals `(for, against)` from the perspective of the given `side`.
    pub fn goals(&self, side: Side) -> (u8, u8) {
        match side {
            Side::Home => (self.home_goals, self.away_goals),
            Side::Away => (self.away_goals, self.home_goals),
        }
    }

    pub fn validate(&self) -> Result<(), InvalidRecord> {
        if self.home_team.trim().is_empty() || self.away_team.trim().is_empty() {
            return Err(InvalidRecord::MissingTeam);
        }
        if self.home_team == self.away_team {
            return Err(InvalidRecord::SameTeam(self.home_team.clone()));
        }
        Ok(())
    }
}

/// An upcoming pairing with no result yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub date: Option<DateTime<Utc>>,
    pub home_team: String,
    pub away_team: String,
}
impl Fixture {
    pub fn new(home_team: impl Into<String>, away_team: impl Into<String>) -> Self {
        Self {
            date: None,
            home_team: home_team.into(),
            away_team: away_team.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidRecord {
    #[error("missing team name")]
    MissingTeam,

    #[error("team {0} cannot play itself")]
    SameTeam(String),

    #[error("unsupported match status {0:?}")]
    Status(String),

    #[error("unparseable date {0:?}")]
    Date(String),

    #[error("unparseable goals {0:?}")]
    Goals(String),
}

/// Parses either an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (taken as midnight UTC).
pub fn parse_date(s: &str) -> Result<DateTime<Utc>, InvalidRecord> {
    let s = s.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(s) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| Utc.from_utc_datetime(&datetime))
        .ok_or_else(|| InvalidRecord::Date(s.to_string()))
}
