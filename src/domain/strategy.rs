use serde::{Deserialize, Serialize};
use std::fmt;

/// Concurrency-control strategy selected for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Strategy {
    /// Read, then write only if the version is unchanged; retry on conflict
    #[default]
    Optimistic,
    /// Hold an exclusive row lock for the whole read-modify-write
    Pessimistic,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Optimistic => "optimistic",
            Strategy::Pessimistic => "pessimistic",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "optimistic" => Ok(Strategy::Optimistic),
            "pessimistic" => Ok(Strategy::Pessimistic),
            _ => Err(format!("Invalid strategy: {s}")),
        }
    }
}

impl TryFrom<String> for Strategy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}
