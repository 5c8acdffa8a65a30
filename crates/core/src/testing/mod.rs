//! Testing utilities: fixtures and a fault-injecting catalog.
//!
//! # Example
//!
//! ```rust,ignore
//! use shiptrack_core::testing::{fixtures, FlakyCatalog};
//!
//! let catalog = fixtures::in_memory_catalog();
//! fixtures::seed_group(catalog.as_ref(), "AWB1", &["1", "2"]);
//!
//! // Fail the next two catalog calls with a transient error.
//! let flaky = FlakyCatalog::new(catalog);
//! flaky.fail_next(2);
//! ```

mod flaky_catalog;

pub use flaky_catalog::FlakyCatalog;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use crate::catalog::{SqliteTrackerCatalog, TrackerCatalog};
    use crate::tracker::{ScanStatus, TrackerRecord};
    use crate::upload::UploadRow;

    /// Create an empty in-memory SQLite catalog.
    pub fn in_memory_catalog() -> Arc<dyn TrackerCatalog> {
        Arc::new(SqliteTrackerCatalog::in_memory().expect("in-memory catalog"))
    }

    /// Create a tracker record with reasonable defaults.
    pub fn record(id: &str, tracking_id: &str, channel_id: &str) -> TrackerRecord {
        TrackerRecord::new(id, tracking_id)
            .with_channel_id(channel_id)
            .with_sku_codes(format!("SKU-{}", channel_id), format!("EAN-{}", id))
            .with_courier("Delhivery")
    }

    /// Insert one record per channel id, all sharing `tracking_id`.
    ///
    /// Ids are `{tracking_id}-{n}` (1-based, insertion order); SKU codes are
    /// `SKU-{channel_id}`. Every status starts all-false.
    pub fn seed_group(
        catalog: &dyn TrackerCatalog,
        tracking_id: &str,
        channel_ids: &[&str],
    ) -> Vec<TrackerRecord> {
        seed_group_with_courier(catalog, tracking_id, channel_ids, "Delhivery")
    }

    /// Like [`seed_group`], with an explicit courier.
    pub fn seed_group_with_courier(
        catalog: &dyn TrackerCatalog,
        tracking_id: &str,
        channel_ids: &[&str],
        courier: &str,
    ) -> Vec<TrackerRecord> {
        channel_ids
            .iter()
            .enumerate()
            .map(|(i, channel_id)| {
                let id = format!("{}-{}", tracking_id, i + 1);
                let record = record(&id, tracking_id, channel_id).with_courier(courier);
                catalog
                    .create_record(&record, &ScanStatus::default())
                    .expect("seed record");
                record
            })
            .collect()
    }

    /// Checkpoint flags with `pending` and `cancelled` cleared.
    pub fn status(label: bool, packing: bool, dispatch: bool) -> ScanStatus {
        ScanStatus {
            label,
            packing,
            dispatch,
            ..Default::default()
        }
    }

    /// Create an upload row.
    pub fn upload_row(tracking_id: &str, sku_code: &str, channel_id: &str) -> UploadRow {
        UploadRow::new(tracking_id)
            .with_sku_code(sku_code)
            .with_channel_id(channel_id)
            .with_courier("Delhivery")
    }
}
