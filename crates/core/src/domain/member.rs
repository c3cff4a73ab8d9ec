// Queue Member Domain Model

use serde::{Deserialize, Serialize};

/// Opaque identity for one admission attempt.
///
/// Authenticated callers use a stable identity (repeated registration from the
/// same caller collapses to one queue slot); anonymous callers receive a
/// freshly minted identity they must echo back on every subsequent call.
pub type Token = String;

/// Member state, inferred from set membership.
///
/// `Unregistered` and the terminal released/evicted states are never stored:
/// absence from both the wait set and the active set means the token is out of
/// the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberState {
    Unregistered,
    Waiting,
    Active,
}

impl std::fmt::Display for MemberState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MemberState::Unregistered => write!(f, "UNREGISTERED"),
            MemberState::Waiting => write!(f, "WAITING"),
            MemberState::Active => write!(f, "ACTIVE"),
        }
    }
}

/// Client-facing queue position read model (not persisted).
///
/// `rank` is the 1-based position among currently waiting members, `0` for an
/// allowed/active token, and `-1` for a token found in neither set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub rank: i64,
    pub allowed: bool,
    pub message: String,
}

impl QueueStatus {
    /// Token holds an active slot; the caller may proceed.
    pub fn active() -> Self {
        Self {
            rank: 0,
            allowed: true,
            message: "admitted".to_string(),
        }
    }

    /// Token is waiting at 1-based position `rank`.
    pub fn waiting(rank: i64) -> Self {
        Self {
            rank,
            allowed: false,
            message: format!("waiting at position {}", rank),
        }
    }

    /// Token is in neither set; the caller should register again.
    pub fn not_registered() -> Self {
        Self {
            rank: -1,
            allowed: false,
            message: "not registered".to_string(),
        }
    }

    pub fn state(&self) -> MemberState {
        if self.allowed {
            MemberState::Active
        } else if self.rank > 0 {
            MemberState::Waiting
        } else {
            MemberState::Unregistered
        }
    }
}
