/// Visit state definitions for tracking crawl progress
///
/// Every canonical URL the frontier has seen is in exactly one of these states.
use std::fmt;

/// Represents the current state of a URL in the crawl process
///
/// Transitions only move forward: `Pending` → `InFlight` → `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitState {
    /// Discovered and queued, not yet claimed by a worker
    Pending,

    /// Claimed by a worker and currently being processed
    InFlight,

    /// Processing finished, whatever the outcome
    Done,
}

impl VisitState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if a worker may still claim this URL
    pub fn is_claimable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if the URL has been claimed (in flight or done)
    ///
    /// Claimed URLs count against the page budget.
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::InFlight | Self::Done)
    }

    /// Returns whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: VisitState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InFlight) | (Self::InFlight, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for VisitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
