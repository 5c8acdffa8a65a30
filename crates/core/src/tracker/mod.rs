//! Shipment line items, their checkpoint flags and scan history.

mod status;
mod types;

pub use status::{stage_of, Checkpoint, NextStep, ScanStatus, Stage, UnknownCheckpoint};
pub use types::{
    tracking_key, EventKind, EventOutcome, ScanEvent, ScanProgress, TrackerRecord,
};
