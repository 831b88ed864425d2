//! # Processing States
//!
//! One request walks this machine once; every path ends in a terminal state.
//!
//! ```text
//!   RECEIVED ──► VALIDATING ──┬──► VALIDATION_FAILED
//!                             │
//!                             └──► ALLOCATING ──┬──► ALLOCATION_FAILED
//!                                               │
//!                                               └──► WRITING ──┬──► WRITE_FAILED
//!                                                              │
//!                                                              └──► COMMITTED
//! ```
//!
//! There is no edge back from a terminal state, so a failed request is never
//! retried by the processor itself.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingState {
    #[default]
    Received,
    Validating,
    ValidationFailed,
    Allocating,
    AllocationFailed,
    Writing,
    WriteFailed,
    Committed,
}

impl ProcessingState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProcessingState::Received => "RECEIVED",
            ProcessingState::Validating => "VALIDATING",
            ProcessingState::ValidationFailed => "VALIDATION_FAILED",
            ProcessingState::Allocating => "ALLOCATING",
            ProcessingState::AllocationFailed => "ALLOCATION_FAILED",
            ProcessingState::Writing => "WRITING",
            ProcessingState::WriteFailed => "WRITE_FAILED",
            ProcessingState::Committed => "COMMITTED",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProcessingState::ValidationFailed
                | ProcessingState::AllocationFailed
                | ProcessingState::WriteFailed
                | ProcessingState::Committed
        )
    }

    pub const fn is_failure(&self) -> bool {
        matches!(
            self,
            ProcessingState::ValidationFailed
                | ProcessingState::AllocationFailed
                | ProcessingState::WriteFailed
        )
    }

    /// Whether `next` is a legal successor of this state.
    pub const fn can_advance_to(&self, next: ProcessingState) -> bool {
        use ProcessingState::*;
        matches!(
            (self, next),
            (Received, Validating)
                | (Validating, ValidationFailed)
                | (Validating, Allocating)
                | (Allocating, AllocationFailed)
                | (Allocating, Writing)
                | (Writing, WriteFailed)
                | (Writing, Committed)
        )
    }

    /// Moves to `next`, refusing edges the machine does not have.
    pub fn advance(self, next: ProcessingState) -> CoreResult<ProcessingState> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// The failure state reachable from this working state.
    pub fn fail(self) -> CoreResult<ProcessingState> {
        let next = match self {
            ProcessingState::Validating => ProcessingState::ValidationFailed,
            ProcessingState::Allocating => ProcessingState::AllocationFailed,
            ProcessingState::Writing => ProcessingState::WriteFailed,
            other => {
                return Err(CoreError::InvalidTransition {
                    from: other.to_string(),
                    to: "failure".to_string(),
                })
            }
        };
        self.advance(next)
    }
}

impl fmt::Display for ProcessingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
