//! engine::outcome
//!
//! Result of a lock engine operation.
//!
//! Every public operation reports back as an [`Outcome`]: either finished with
//! a short message and a count, or cancelled with a [`CancelReason`]. A
//! cancelled outcome never leaves a partial mutation behind except for
//! reconcile fixups, which are corrections rather than edits.
//!
//! # Example
//!
//! ```
//! use meshlock::engine::outcome::{messages, CancelReason, Outcome};
//!
//! let outcome = Outcome::veto(messages::LOCKED_IN_SELECTION);
//! assert!(outcome.is_cancelled());
//! assert_eq!(outcome.reason(), Some(CancelReason::Veto));
//! assert_eq!(outcome.count(), 0);
//! ```

use std::fmt;

use serde::Serialize;

use crate::host::HostError;

/// User-facing messages shared by operations and their tests.
pub mod messages {
    pub const NOT_EDITABLE: &str = "object is not an editable mesh";
    pub const NO_SELECTION: &str = "no selection";
    pub const NO_LOCKED: &str = "no locked elements";
    pub const NOT_REVEALED: &str = "begin unlock selection first";
    pub const MISSING_LOCK_DATA: &str = "lock data not found";
    pub const NO_LOCKED_IN_SELECTION: &str =
        "selection contains no locked vertices; select the locked vertices to unlock";
    pub const UNLOCK_CANCELLED: &str = "unlock mode cancelled";
    pub const SELECT_TO_UNLOCK: &str = "select locked vertices, then unlock selection";
    pub const NOTHING_TO_DELETE: &str = "nothing to delete";
    pub const NOTHING_TO_MOVE: &str = "nothing to move";
    pub const LOCKED_IN_SELECTION: &str = "locked elements in selection";
    pub const FULL_DELETE: &str = "cannot delete everything while locked elements exist";
    pub const FULL_MOVE: &str = "cannot move everything while locked elements exist";
}

/// Why an operation was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// A precondition did not hold; nothing was changed.
    Precondition,
    /// A guard refused the edit; the native operator was never invoked.
    Veto,
    /// The host reported an error the operation could not absorb.
    Host,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Precondition => write!(f, "precondition"),
            CancelReason::Veto => write!(f, "veto"),
            CancelReason::Host => write!(f, "host"),
        }
    }
}

/// Result of an engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The operation completed.
    Finished {
        /// Short report line.
        message: String,
        /// Number of vertices affected (meaning depends on the operation).
        count: usize,
    },

    /// The operation was cancelled.
    Cancelled {
        /// Category of the cancellation.
        reason: CancelReason,
        /// Short warning line.
        message: String,
    },
}

impl Outcome {
    /// A finished outcome.
    pub fn finished(message: impl Into<String>, count: usize) -> Self {
        Outcome::Finished {
            message: message.into(),
            count,
        }
    }

    /// A cancelled outcome.
    pub fn cancelled(reason: CancelReason, message: impl Into<String>) -> Self {
        Outcome::Cancelled {
            reason,
            message: message.into(),
        }
    }

    /// Cancelled on a failed precondition.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::cancelled(CancelReason::Precondition, message)
    }

    /// Cancelled by a guard.
    pub fn veto(message: impl Into<String>) -> Self {
        Self::cancelled(CancelReason::Veto, message)
    }

    /// Cancelled by a host error.
    pub fn host(error: &HostError) -> Self {
        Self::cancelled(CancelReason::Host, error.to_string())
    }

    /// Check if the operation finished.
    pub fn is_finished(&self) -> bool {
        matches!(self, Outcome::Finished { .. })
    }

    /// Check if the operation was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled { .. })
    }

    /// Check if a guard vetoed the operation.
    pub fn is_veto(&self) -> bool {
        self.reason() == Some(CancelReason::Veto)
    }

    /// Cancellation reason, if cancelled.
    pub fn reason(&self) -> Option<CancelReason> {
        match self {
            Outcome::Finished { .. } => None,
            Outcome::Cancelled { reason, .. } => Some(*reason),
        }
    }

    /// The report line.
    pub fn message(&self) -> &str {
        match self {
            Outcome::Finished { message, .. } | Outcome::Cancelled { message, .. } => message,
        }
    }

    /// Affected count (0 when cancelled).
    pub fn count(&self) -> usize {
        match self {
            Outcome::Finished { count, .. } => *count,
            Outcome::Cancelled { .. } => 0,
        }
    }

    /// Convert to a Result, treating cancellation as an error.
    pub fn into_result(self) -> Result<usize, String> {
        match self {
            Outcome::Finished { count, .. } => Ok(count),
            Outcome::Cancelled { message, .. } => Err(message),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}
