//! Generation tokens for "latest request wins".
//!
//! Each outgoing read gets a token from its tracker. When the response comes
//! back the token is checked; anything but the most recently issued token is
//! stale and its result is dropped. No network cancellation is involved.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    pub const fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestOnly {
    issued: u64,
    in_flight: bool,
}

impl LatestOnly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a token that supersedes every earlier one.
    pub fn issue(&mut self) -> Generation {
        self.issued += 1;
        self.in_flight = true;
        Generation(self.issued)
    }

    /// Supersedes outstanding tokens without issuing a new request.
    pub fn invalidate(&mut self) {
        self.issued += 1;
        self.in_flight = false;
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.in_flight && generation.0 == self.issued
    }

    /// Accepts `generation` if it is current and marks the slot idle.
    /// Returns `false` for stale or already-completed tokens.
    pub fn complete(&mut self, generation: Generation) -> bool {
        if self.is_current(generation) {
            self.in_flight = false;
            true
        } else {
            false
        }
    }

    pub const fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Token of the request still awaited, if any.
    pub const fn current(&self) -> Option<Generation> {
        if self.in_flight {
            Some(Generation(self.issued))
        } else {
            None
        }
    }
}
