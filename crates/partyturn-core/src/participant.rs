//! Participant identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A participant, identified solely by its 0-based seat index.
///
/// Elimination is modeled as absence from the roster, never as a flag on
/// the participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub usize);

impl ParticipantId {
    /// Returns the seat index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl From<usize> for ParticipantId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}
