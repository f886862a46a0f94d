//! Dispute periods
//!
//! A dispute moves through five periods. Period-change events carry the
//! arbitrator's numeric encoding; the mapping is a strict lookup and unknown
//! numbers are rejected rather than mapped to a fallback.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle period of a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Parties submit evidence
    Evidence,
    /// Jurors commit hidden votes
    Commit,
    /// Jurors reveal or cast votes
    Vote,
    /// The ruling may be appealed
    Appeal,
    /// The ruling is final and executable
    Execution,
}

impl Period {
    /// All periods in lifecycle order
    pub const ALL: [Period; 5] = [
        Period::Evidence,
        Period::Commit,
        Period::Vote,
        Period::Appeal,
        Period::Execution,
    ];

    /// Look up a period by its numeric encoding.
    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number)).copied()
    }

    /// Numeric encoding used by the arbitrator contract.
    pub fn number(self) -> u8 {
        match self {
            Period::Evidence => 0,
            Period::Commit => 1,
            Period::Vote => 2,
            Period::Appeal => 3,
            Period::Execution => 4,
        }
    }

    /// Lower-case period name
    pub fn as_str(self) -> &'static str {
        match self {
            Period::Evidence => "evidence",
            Period::Commit => "commit",
            Period::Vote => "vote",
            Period::Appeal => "appeal",
            Period::Execution => "execution",
        }
    }

    /// Whether a dispute in this period still counts as open.
    pub fn is_open(self) -> bool {
        self != Period::Execution
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
