//! Migration destination parsing
//!
//! A destination is what the user passes to `strata migrate -d`. It is
//! resolved against the current and latest schema versions into the list of
//! versions the migrator should visit in order.

use crate::error::{CoreError, CoreResult};
use std::fmt;
use std::str::FromStr;

/// Where a migrate run should end up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// The most recent migration (`last`)
    Last,
    /// A specific version (`42`)
    Absolute(i32),
    /// N steps forward from the current version (`+3`)
    Forward(i32),
    /// N steps backward from the current version (`-2`)
    Backward(i32),
    /// N steps backward then forward again to the current version (`-+1`)
    Redo(i32),
}

impl Destination {
    /// Versions to migrate to, in order, given the database's current version
    /// and the sequence of the last known migration.
    ///
    /// Only `Redo` produces more than one target. Targets are not range
    /// checked here; the migrator reports out of range versions.
    pub fn targets(&self, current: i32, last: i32) -> Vec<i32> {
        match *self {
            Destination::Last => vec![last],
            Destination::Absolute(v) => vec![v],
            Destination::Forward(n) => vec![current.saturating_add(n)],
            Destination::Backward(n) => vec![current.saturating_sub(n)],
            Destination::Redo(n) => vec![current.saturating_sub(n), current],
        }
    }
}

fn parse_steps(original: &str, digits: &str) -> CoreResult<i32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::InvalidDestination {
            value: original.to_string(),
            reason: "expected last, N, +N, -N or -+N".to_string(),
        });
    }
    digits
        .parse::<i32>()
        .map_err(|e| CoreError::InvalidDestination {
            value: original.to_string(),
            reason: e.to_string(),
        })
}

impl FromStr for Destination {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let s = s.trim();
        if s == "last" {
            return Ok(Destination::Last);
        }
        if let Some(rest) = s.strip_prefix("-+") {
            if !rest.is_empty() {
                return parse_steps(s, rest).map(Destination::Redo);
            }
        }
        if s.len() >= 2 {
            if let Some(rest) = s.strip_prefix('-') {
                return parse_steps(s, rest).map(Destination::Backward);
            }
            if let Some(rest) = s.strip_prefix('+') {
                return parse_steps(s, rest).map(Destination::Forward);
            }
        }
        parse_steps(s, s).map(Destination::Absolute)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Last => write!(f, "last"),
            Destination::Absolute(v) => write!(f, "{v}"),
            Destination::Forward(n) => write!(f, "+{n}"),
            Destination::Backward(n) => write!(f, "-{n}"),
            Destination::Redo(n) => write!(f, "-+{n}"),
        }
    }
}

#[cfg(test)]
#[path = "destination_test.rs"]
mod tests;
