//! Checkpoint flags and the stage labels derived from them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the three ordered warehouse checkpoints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Checkpoint {
    Label,
    Packing,
    Dispatch,
}

impl Checkpoint {
    /// All checkpoints in scan order.
    pub const ALL: [Checkpoint; 3] = [Checkpoint::Label, Checkpoint::Packing, Checkpoint::Dispatch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Checkpoint::Label => "label",
            Checkpoint::Packing => "packing",
            Checkpoint::Dispatch => "dispatch",
        }
    }

    /// The checkpoint that must be done before this one, if any.
    pub fn previous(&self) -> Option<Checkpoint> {
        match self {
            Checkpoint::Label => None,
            Checkpoint::Packing => Some(Checkpoint::Label),
            Checkpoint::Dispatch => Some(Checkpoint::Packing),
        }
    }

    /// The step an operator moves on to after this checkpoint.
    pub fn following(&self) -> NextStep {
        match self {
            Checkpoint::Label => NextStep::Packing,
            Checkpoint::Packing => NextStep::Dispatch,
            Checkpoint::Dispatch => NextStep::Completed,
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown checkpoint name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown checkpoint '{0}', expected label, packing or dispatch")]
pub struct UnknownCheckpoint(pub String);

impl FromStr for Checkpoint {
    type Err = UnknownCheckpoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "label" => Ok(Checkpoint::Label),
            "packing" => Ok(Checkpoint::Packing),
            "dispatch" => Ok(Checkpoint::Dispatch),
            _ => Err(UnknownCheckpoint(s.to_string())),
        }
    }
}

/// What an operator should scan next for a group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    Label,
    Packing,
    Dispatch,
    Completed,
}

impl From<Checkpoint> for NextStep {
    fn from(checkpoint: Checkpoint) -> Self {
        match checkpoint {
            Checkpoint::Label => NextStep::Label,
            Checkpoint::Packing => NextStep::Packing,
            Checkpoint::Dispatch => NextStep::Dispatch,
        }
    }
}

/// Per-item status flags.
///
/// Checkpoint flags only ever move from false to true, except through the
/// inconsistency repair. `cancelled` is terminal and leaves the other flags
/// untouched so reports can tell how far an item got before cancellation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanStatus {
    #[serde(default)]
    pub label: bool,
    #[serde(default)]
    pub packing: bool,
    #[serde(default)]
    pub dispatch: bool,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub cancelled: bool,
}

impl ScanStatus {
    /// Whether the given checkpoint flag is set.
    pub fn is_done(&self, checkpoint: Checkpoint) -> bool {
        match checkpoint {
            Checkpoint::Label => self.label,
            Checkpoint::Packing => self.packing,
            Checkpoint::Dispatch => self.dispatch,
        }
    }

    /// Set the given checkpoint flag.
    pub fn mark(&mut self, checkpoint: Checkpoint) {
        match checkpoint {
            Checkpoint::Label => self.label = true,
            Checkpoint::Packing => self.packing = true,
            Checkpoint::Dispatch => self.dispatch = true,
        }
    }

    /// Whether every checkpoint before `checkpoint` is done.
    pub fn prerequisites_met(&self, checkpoint: Checkpoint) -> bool {
        match checkpoint {
            Checkpoint::Label => true,
            Checkpoint::Packing => self.label,
            Checkpoint::Dispatch => self.label && self.packing,
        }
    }

    /// First checkpoint not yet done, or `None` once dispatched.
    pub fn next_checkpoint(&self) -> Option<Checkpoint> {
        Checkpoint::ALL.into_iter().find(|cp| !self.is_done(*cp))
    }

    /// Checkpoint this item is paused at, inferred from which flags are set.
    pub fn held_checkpoint(&self) -> Option<Checkpoint> {
        if self.pending {
            self.next_checkpoint()
        } else {
            None
        }
    }

    pub fn any_checkpoint_done(&self) -> bool {
        self.label || self.packing || self.dispatch
    }

    /// `dispatch => packing => label`.
    pub fn is_consistent(&self) -> bool {
        (!self.packing || self.label) && (!self.dispatch || (self.label && self.packing))
    }

    /// Clear checkpoint flags whose prerequisites are missing.
    ///
    /// Returns true if anything changed.
    pub fn repair(&mut self) -> bool {
        let before = *self;
        if self.packing && !self.label {
            self.packing = false;
        }
        if self.dispatch && !(self.label && self.packing) {
            self.dispatch = false;
        }
        before != *self
    }
}

/// Stage shown on dashboards and the spreadsheet mirror.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Label,
    LabelHold,
    PackingPending,
    PackingHold,
    Packing,
    DispatchPending,
    Dispatch,
    DispatchCancelled,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Label,
        Stage::LabelHold,
        Stage::PackingPending,
        Stage::PackingHold,
        Stage::Packing,
        Stage::DispatchPending,
        Stage::Dispatch,
        Stage::DispatchCancelled,
    ];

    /// Stage column text.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Label => "Label",
            Stage::LabelHold => "Label Hold",
            Stage::PackingPending => "Packing Pending",
            Stage::PackingHold => "Packing Hold",
            Stage::Packing => "Packing",
            Stage::DispatchPending => "Dispatch Pending",
            Stage::Dispatch => "Dispatch",
            Stage::DispatchCancelled => "Dispatch Cancelled",
        }
    }

    /// Status column text.
    pub fn status_label(&self) -> &'static str {
        match self {
            Stage::Label => "Label yet to Scan",
            Stage::LabelHold => "Label Hold",
            Stage::PackingPending => "Packing Pending Shipment",
            Stage::PackingHold => "Packing Hold",
            Stage::Packing => "Packing Scanned",
            Stage::DispatchPending => "Dispatch Pending",
            Stage::Dispatch => "Dispatched",
            Stage::DispatchCancelled => "Cancelled",
        }
    }

    pub fn is_hold(&self) -> bool {
        matches!(
            self,
            Stage::LabelHold | Stage::PackingHold | Stage::DispatchPending
        )
    }
}

/// Derive the stage of an item from its flags.
///
/// This is the only place flags are turned into a stage; the API, the
/// dashboard and the spreadsheet mirror all go through it.
pub fn stage_of(status: &ScanStatus) -> Stage {
    if status.cancelled {
        Stage::DispatchCancelled
    } else if status.dispatch {
        Stage::Dispatch
    } else if status.label && status.packing && status.pending {
        Stage::DispatchPending
    } else if status.packing {
        Stage::Packing
    } else if status.label && status.pending {
        Stage::PackingHold
    } else if status.label {
        Stage::PackingPending
    } else if status.pending {
        Stage::LabelHold
    } else {
        Stage::Label
    }
}
