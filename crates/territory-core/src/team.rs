//! Teams, base ownership, and the fixed four-slot team map.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use crate::ValidationError;

/// One of the four competing teams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// Red team.
    Red,
    /// Green team.
    Green,
    /// Blue team.
    Blue,
    /// Yellow team.
    Yellow,
}

impl Team {
    /// All teams in canonical iteration order.
    pub const ALL: [Team; 4] = [Team::Red, Team::Green, Team::Blue, Team::Yellow];

    /// Lowercase wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Team::Red => "red",
            Team::Green => "green",
            Team::Blue => "blue",
            Team::Yellow => "yellow",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Team {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "red" => Ok(Team::Red),
            "green" => Ok(Team::Green),
            "blue" => Ok(Team::Blue),
            "yellow" => Ok(Team::Yellow),
            _ => Err(ValidationError::UnknownTeam(s.to_string())),
        }
    }
}

/// Permanent owner of a base: neutral until a team captures it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Owner {
    /// Not yet captured.
    #[default]
    Neutral,
    /// Captured by a team.
    Team(Team),
}

impl Owner {
    /// Whether the base is still uncaptured.
    pub fn is_neutral(self) -> bool {
        matches!(self, Owner::Neutral)
    }

    /// The capturing team, if any.
    pub fn team(self) -> Option<Team> {
        match self {
            Owner::Neutral => None,
            Owner::Team(t) => Some(t),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Neutral => f.write_str("neutral"),
            Owner::Team(t) => fmt::Display::fmt(t, f),
        }
    }
}

impl TryFrom<String> for Owner {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.eq_ignore_ascii_case("neutral") {
            return Ok(Owner::Neutral);
        }
        s.parse().map(Owner::Team)
    }
}

impl From<Owner> for String {
    fn from(o: Owner) -> Self {
        o.to_string()
    }
}

impl From<Team> for Owner {
    fn from(t: Team) -> Self {
        Owner::Team(t)
    }
}

/// A value per team, laid out in canonical team order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMap<T> {
    /// Red slot.
    pub red: T,
    /// Green slot.
    pub green: T,
    /// Blue slot.
    pub blue: T,
    /// Yellow slot.
    pub yellow: T,
}

impl<T> TeamMap<T> {
    /// Build a map by evaluating `f` for every team.
    pub fn from_fn(mut f: impl FnMut(Team) -> T) -> Self {
        Self {
            red: f(Team::Red),
            green: f(Team::Green),
            blue: f(Team::Blue),
            yellow: f(Team::Yellow),
        }
    }

    /// Iterate `(team, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Team, &T)> + '_ {
        Team::ALL.into_iter().map(move |t| (t, &self[t]))
    }

    /// Apply `f` to every slot.
    pub fn map<U>(&self, mut f: impl FnMut(Team, &T) -> U) -> TeamMap<U> {
        TeamMap::from_fn(|t| f(t, &self[t]))
    }
}

impl<T> Index<Team> for TeamMap<T> {
    type Output = T;

    fn index(&self, team: Team) -> &T {
        match team {
            Team::Red => &self.red,
            Team::Green => &self.green,
            Team::Blue => &self.blue,
            Team::Yellow => &self.yellow,
        }
    }
}

impl<T> IndexMut<Team> for TeamMap<T> {
    fn index_mut(&mut self, team: Team) -> &mut T {
        match team {
            Team::Red => &mut self.red,
            Team::Green => &mut self.green,
            Team::Blue => &mut self.blue,
            Team::Yellow => &mut self.yellow,
        }
    }
}

/// Floating score distribution; sums to 100 at every snapshot boundary.
pub type Scores = TeamMap<f64>;

impl Scores {
    /// The 25/25/25/25 split every base starts from.
    pub fn equal_split() -> Self {
        TeamMap::from_fn(|_| 25.0)
    }

    /// Sum of all four scores.
    pub fn total(&self) -> f64 {
        self.iter().map(|(_, v)| *v).sum()
    }

    /// Highest-scoring team and its score; ties go to the earlier team.
    pub fn leader(&self) -> (Team, f64) {
        let mut best = (Team::Red, self.red);
        for (t, v) in self.iter().skip(1) {
            if *v > best.1 {
                best = (t, *v);
            }
        }
        best
    }
}
