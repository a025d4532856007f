use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::LiftError;

/// Primary key of any owned row
///
/// Identifiers cross the API boundary as base-10 strings; `parse` is the only
/// way in from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(i64);

impl RowId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Parse a string-encoded identifier
    ///
    /// Accepts only ASCII digits whose value fits an `i64`.
    pub fn parse(s: &str) -> Result<Self, LiftError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LiftError::invalid_argument(format!(
                "identifier '{}' is not a base-10 integer",
                s
            )));
        }
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| LiftError::invalid_argument(format!("identifier '{}' is out of range", s)))
    }
}

impl FromStr for RowId {
    type Err = LiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the user at the root of every ownership chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Zero is never issued by the principal resolver
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl FromStr for UserId {
    type Err = LiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RowId::parse(s).map(|id| UserId(id.get()))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
