//! Upload reconciliation - turns uploaded shipment rows into tracker records.

mod keys;
mod reconciler;
mod types;

pub use keys::{mint_record_id, sanitize_key};
pub use reconciler::UploadReconciler;
pub use types::*;
