//! Catalog keys: which subject, which behavioral state, which frequency band.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

// ============================================================================
// Band
// ============================================================================

/// Canonical frequency band over which coherence is measured.
///
/// Declaration order is significant: the rows of one recording are laid out
/// in this order (delta first, high-gamma last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
    HighGamma,
}

impl Band {
    pub const ALL: [Band; 6] = [
        Band::Delta,
        Band::Theta,
        Band::Alpha,
        Band::Beta,
        Band::Gamma,
        Band::HighGamma,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
            Band::HighGamma => "high_gamma",
        }
    }

    /// Frequency range in Hz as `(low, high)`. High-gamma is open-ended.
    pub fn frequency_range(self) -> (f64, Option<f64>) {
        match self {
            Band::Delta => (1.0, Some(4.0)),
            Band::Theta => (4.0, Some(8.0)),
            Band::Alpha => (8.0, Some(12.0)),
            Band::Beta => (12.0, Some(30.0)),
            Band::Gamma => (30.0, Some(100.0)),
            Band::HighGamma => (100.0, None),
        }
    }

    /// Band for the `index`-th row of a recording, if any.
    pub fn from_row_index(index: usize) -> Option<Band> {
        Band::ALL.get(index).copied()
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Band {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Band::ALL
            .into_iter()
            .find(|b| b.name() == normalized)
            .ok_or_else(|| Error::InvalidParameter(format!("unknown band '{s}'")))
    }
}

// ============================================================================
// State
// ============================================================================

/// Behavioral state during the recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Rest,
    Film,
}

impl State {
    pub const ALL: [State; 2] = [State::Rest, State::Film];

    pub fn name(self) -> &'static str {
        match self {
            State::Rest => "rest",
            State::Film => "film",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for State {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(State::Rest),
            "film" => Ok(State::Film),
            _ => Err(Error::InvalidParameter(format!("unknown state '{s}'"))),
        }
    }
}

// ============================================================================
// CatalogKey
// ============================================================================

/// Composite identifier of one recording: `(subject, state, band)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CatalogKey {
    pub subject: String,
    pub state: State,
    pub band: Band,
}

impl CatalogKey {
    pub fn new(subject: impl Into<String>, state: State, band: Band) -> Self {
        Self { subject: subject.into(), state, band }
    }
}

impl fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.state, self.band)
    }
}
