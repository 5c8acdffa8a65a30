//! Types for upload reconciliation.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::tracker::TrackerRecord;
use crate::workflow::Retryable;

/// How rows that collide with known tracking ids are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Drop colliding rows.
    Skip,
    /// Create a new record for every row.
    #[default]
    Allow,
    /// Overwrite the first existing record of the tracking id.
    Update,
}

impl DuplicatePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicatePolicy::Skip => "skip",
            DuplicatePolicy::Allow => "allow",
            DuplicatePolicy::Update => "update",
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuplicatePolicy {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(DuplicatePolicy::Skip),
            "allow" => Ok(DuplicatePolicy::Allow),
            "update" => Ok(DuplicatePolicy::Update),
            other => Err(UploadError::InvalidPolicy(other.to_string())),
        }
    }
}

/// One uploaded shipment row, as produced by the bulk file parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadRow {
    pub tracking_id: String,
    pub channel_id: String,
    pub order_id: String,
    pub sub_order_id: String,
    pub courier: String,
    pub channel_name: String,
    pub sku_code: String,
    pub alternate_sku_code: String,
    pub product_sku_code: String,
    pub channel_listing_id: String,
    pub quantity: Option<u32>,
    pub amount: Option<f64>,
    pub payment_mode: String,
    pub order_status: String,
    pub buyer_city: String,
    pub buyer_state: String,
    pub buyer_pincode: String,
    pub invoice_number: String,
}

impl UploadRow {
    pub fn new(tracking_id: impl Into<String>) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            ..Default::default()
        }
    }

    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    pub fn with_sku_code(mut self, sku_code: impl Into<String>) -> Self {
        self.sku_code = sku_code.into();
        self
    }

    pub fn with_courier(mut self, courier: impl Into<String>) -> Self {
        self.courier = courier.into();
        self
    }

    /// Build a fresh record with the given id.
    pub fn to_record(&self, id: String) -> TrackerRecord {
        let mut record = TrackerRecord::new(id, self.tracking_id.trim());
        self.apply_to(&mut record);
        record
    }

    /// Copy this row's fields onto an existing record, keeping its id and creation time.
    pub fn apply_to(&self, record: &mut TrackerRecord) {
        record.tracking_id = self.tracking_id.trim().to_string();
        record.channel_id = self.channel_id.trim().to_string();
        record.order_id = self.order_id.clone();
        record.sub_order_id = self.sub_order_id.clone();
        record.courier = self.courier.trim().to_string();
        record.channel_name = self.channel_name.clone();
        record.sku_code = self.sku_code.trim().to_string();
        record.alternate_sku_code = self.alternate_sku_code.trim().to_string();
        record.product_sku_code = self.product_sku_code.clone();
        record.channel_listing_id = self.channel_listing_id.clone();
        record.quantity = self.quantity.unwrap_or(1);
        record.amount = self.amount;
        record.payment_mode = self.payment_mode.clone();
        record.order_status = self.order_status.clone();
        record.buyer_city = self.buyer_city.clone();
        record.buyer_state = self.buyer_state.clone();
        record.buyer_pincode = self.buyer_pincode.clone();
        record.invoice_number = self.invoice_number.clone();
        record.last_updated = Utc::now();
    }
}

/// Why a row was not written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Same tracking id and SKU already seen in this upload.
    DuplicateInBatch,
    /// Tracking id already stored and the policy is `skip`.
    ExistingTrackingId,
    MissingTrackingId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRow {
    pub tracking_id: String,
    pub sku_code: String,
    pub reason: SkipReason,
}

/// Outcome of one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub created_ids: Vec<String>,
    pub updated_ids: Vec<String>,
    pub skipped_rows: Vec<SkippedRow>,
}

/// Errors for upload operations.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid duplicate policy '{0}', expected skip, allow or update")]
    InvalidPolicy(String),

    #[error("Failed to load existing trackers: {0}")]
    Load(#[source] CatalogError),

    #[error("Upload has {count} rows, the limit is {max}")]
    TooManyRows { count: usize, max: usize },

    /// The batch write failed. Nothing from this upload was stored.
    #[error("Failed to write upload: {0}")]
    Store(#[source] CatalogError),
}

impl UploadError {
    pub fn is_transient(&self) -> bool {
        match self {
            UploadError::Load(source) | UploadError::Store(source) => source.is_transient(),
            _ => false,
        }
    }
}

impl Retryable for UploadError {
    fn is_transient(&self) -> bool {
        UploadError::is_transient(self)
    }
}
