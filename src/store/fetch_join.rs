//! Join of independent sub-fetches into one logical fetch.
//!
//! ```text
//! Idle ──begin──→ Pending{a, b} ──complete(a)──→ Pending{b} ──complete(b)──→ Idle (Joined)
//!                      │
//!                      └──deadline passed without progress──→ Idle (Expired)
//! ```
//!
//! A `begin` while pending is dropped, so at most one logical fetch is in
//! flight. Each `begin` gets a new generation; deadline checks carry the
//! generation they were scheduled for, so a check left over from an earlier
//! fetch never resets a later one.

use std::fmt::Debug;
use std::time::{Duration, Instant};

/// Externally visible fetch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Pending { remaining: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinProgress {
    /// Not part of the current fetch (idle, or already completed).
    Ignored,
    Partial { remaining: usize },
    /// Last outstanding part landed; the machine is idle again.
    Joined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeadlineCheck<K> {
    /// Check belongs to a finished or superseded fetch.
    Stale,
    /// Progress was made recently; check again after `remaining`.
    NotYet { remaining: Duration },
    /// Force-reset to idle. `missing` lists parts that never landed.
    Expired { missing: Vec<K> },
}

#[derive(Debug)]
enum JoinState<K> {
    Idle,
    Pending {
        outstanding: Vec<K>,
        generation: u64,
        last_progress: Instant,
    },
}

#[derive(Debug)]
pub struct FetchJoin<K> {
    state: JoinState<K>,
    generation: u64,
    timeout: Duration,
}

impl<K: Copy + PartialEq + Debug> FetchJoin<K> {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: JoinState::Idle,
            generation: 0,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn status(&self) -> FetchStatus {
        match &self.state {
            JoinState::Idle => FetchStatus::Idle,
            JoinState::Pending { outstanding, .. } => FetchStatus::Pending {
                remaining: outstanding.len(),
            },
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, JoinState::Idle)
    }

    /// Start a fetch over `parts`. Returns the new generation, or `None` when
    /// a fetch is already pending (or `parts` is empty).
    pub fn begin(&mut self, parts: &[K], now: Instant) -> Option<u64> {
        if !self.is_idle() || parts.is_empty() {
            return None;
        }
        let mut outstanding = Vec::with_capacity(parts.len());
        for part in parts {
            if !outstanding.contains(part) {
                outstanding.push(*part);
            }
        }
        self.generation += 1;
        self.state = JoinState::Pending {
            outstanding,
            generation: self.generation,
            last_progress: now,
        };
        Some(self.generation)
    }

    pub fn complete(&mut self, part: K, now: Instant) -> JoinProgress {
        let JoinState::Pending {
            outstanding,
            last_progress,
            ..
        } = &mut self.state
        else {
            return JoinProgress::Ignored;
        };
        let Some(index) = outstanding.iter().position(|p| *p == part) else {
            return JoinProgress::Ignored;
        };
        outstanding.swap_remove(index);
        *last_progress = now;
        if outstanding.is_empty() {
            self.state = JoinState::Idle;
            JoinProgress::Joined
        } else {
            JoinProgress::Partial {
                remaining: outstanding.len(),
            }
        }
    }

    /// Deadline is `timeout` after the most recent progress (or the start).
    pub fn check_deadline(&mut self, generation: u64, now: Instant) -> DeadlineCheck<K> {
        let JoinState::Pending {
            outstanding,
            generation: current,
            last_progress,
        } = &self.state
        else {
            return DeadlineCheck::Stale;
        };
        if *current != generation {
            return DeadlineCheck::Stale;
        }
        let elapsed = now.saturating_duration_since(*last_progress);
        if elapsed < self.timeout {
            return DeadlineCheck::NotYet {
                remaining: self.timeout - elapsed,
            };
        }
        let missing = outstanding.clone();
        self.state = JoinState::Idle;
        DeadlineCheck::Expired { missing }
    }
}
