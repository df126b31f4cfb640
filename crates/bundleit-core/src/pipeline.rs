//! Pipeline run state machine.
//!
//! A run moves through the steps strictly in order. `Failed` can be entered
//! from any non-terminal state and is absorbing; there is no resumption.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::RunId;

/// State of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Configured,
    Fetched,
    VersionResolved,
    Built,
    Hashed,
    Uploaded,
    Registered,
    Done,
    Failed {
        /// Last state reached before the failure.
        after: Box<PipelineState>,
        message: String,
    },
}

impl PipelineState {
    /// The state that follows this one on success.
    pub fn successor(&self) -> Option<PipelineState> {
        use PipelineState::*;
        match self {
            Configured => Some(Fetched),
            Fetched => Some(VersionResolved),
            VersionResolved => Some(Built),
            Built => Some(Hashed),
            Hashed => Some(Uploaded),
            Uploaded => Some(Registered),
            Registered => Some(Done),
            Done | Failed { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PipelineState::Done)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Configured => write!(f, "configured"),
            PipelineState::Fetched => write!(f, "fetched"),
            PipelineState::VersionResolved => write!(f, "version-resolved"),
            PipelineState::Built => write!(f, "built"),
            PipelineState::Hashed => write!(f, "hashed"),
            PipelineState::Uploaded => write!(f, "uploaded"),
            PipelineState::Registered => write!(f, "registered"),
            PipelineState::Done => write!(f, "done"),
            PipelineState::Failed { after, .. } => write!(f, "failed after {after}"),
        }
    }
}

/// Rejected state change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid pipeline transition from {from} to {to}")]
pub struct TransitionError {
    pub from: String,
    pub to: String,
}

/// A state entered at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub state: PipelineState,
    pub at: DateTime<Utc>,
}

/// Record of one pipeline run.
///
/// The history is never empty: it starts with `Configured` and only grows.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub id: RunId,
    history: Vec<Transition>,
}

impl PipelineRun {
    /// Start a run in the `Configured` state.
    pub fn new() -> Self {
        Self {
            id: RunId::new(),
            history: vec![Transition {
                state: PipelineState::Configured,
                at: Utc::now(),
            }],
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.last().state
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.first().at
    }

    /// Every state entered so far, oldest first.
    pub fn history(&self) -> &[Transition] {
        &self.history
    }

    /// Move to `next`, which must be the successor of the current state.
    pub fn advance(&mut self, next: PipelineState) -> Result<(), TransitionError> {
        if self.state().successor().as_ref() != Some(&next) {
            return Err(TransitionError {
                from: self.state().to_string(),
                to: next.to_string(),
            });
        }
        self.push(next);
        Ok(())
    }

    /// Enter `Failed`. Does nothing if the run already ended.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.state().is_terminal() {
            return;
        }
        let after = Box::new(self.state().clone());
        self.push(PipelineState::Failed {
            after,
            message: message.into(),
        });
    }

    /// Time from the first to the last transition.
    pub fn elapsed(&self) -> chrono::Duration {
        self.last().at - self.started_at()
    }

    fn first(&self) -> &Transition {
        &self.history[0]
    }

    fn last(&self) -> &Transition {
        &self.history[self.history.len() - 1]
    }

    fn push(&mut self, state: PipelineState) {
        self.history.push(Transition {
            state,
            at: Utc::now(),
        });
    }
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}
