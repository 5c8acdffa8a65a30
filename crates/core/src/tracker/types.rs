//! Tracker record and scan history types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Checkpoint;

/// One physical line item (SKU) of a shipment.
///
/// Several records share a `tracking_id` when a shipment carries more than one
/// SKU; `id` is unique across the whole catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackerRecord {
    /// Stable, sanitized, globally unique identifier.
    pub id: String,
    /// Shipment-level tracking identifier shared by all items of a shipment.
    pub tracking_id: String,
    /// Tie-break ordering key for item selection. May be empty.
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub sub_order_id: String,
    /// Primary product code printed on the item (G-code).
    #[serde(default)]
    pub sku_code: String,
    /// Secondary product code (EAN).
    #[serde(default)]
    pub alternate_sku_code: String,
    #[serde(default)]
    pub product_sku_code: String,
    #[serde(default)]
    pub channel_listing_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub courier: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub payment_mode: String,
    #[serde(default)]
    pub order_status: String,
    #[serde(default)]
    pub buyer_city: String,
    #[serde(default)]
    pub buyer_state: String,
    #[serde(default)]
    pub buyer_pincode: String,
    #[serde(default)]
    pub invoice_number: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

fn default_quantity() -> u32 {
    1
}

impl TrackerRecord {
    /// Create a record with only the identifying fields set.
    pub fn new(id: impl Into<String>, tracking_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            tracking_id: tracking_id.into(),
            channel_id: String::new(),
            order_id: String::new(),
            sub_order_id: String::new(),
            sku_code: String::new(),
            alternate_sku_code: String::new(),
            product_sku_code: String::new(),
            channel_listing_id: String::new(),
            quantity: default_quantity(),
            amount: None,
            courier: String::new(),
            channel_name: String::new(),
            payment_mode: String::new(),
            order_status: String::new(),
            buyer_city: String::new(),
            buyer_state: String::new(),
            buyer_pincode: String::new(),
            invoice_number: String::new(),
            created_at: now,
            last_updated: now,
        }
    }

    pub fn with_channel_id(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    pub fn with_sku_codes(
        mut self,
        sku_code: impl Into<String>,
        alternate_sku_code: impl Into<String>,
    ) -> Self {
        self.sku_code = sku_code.into();
        self.alternate_sku_code = alternate_sku_code.into();
        self
    }

    pub fn with_courier(mut self, courier: impl Into<String>) -> Self {
        self.courier = courier.into();
        self
    }

    /// Case-insensitive key used for grouping by tracking id.
    pub fn tracking_key(&self) -> String {
        tracking_key(&self.tracking_id)
    }

    /// Whether `code` matches either of this item's product codes.
    pub fn matches_product(&self, code: &str) -> bool {
        let code = code.trim();
        if code.is_empty() {
            return false;
        }
        [&self.sku_code, &self.alternate_sku_code]
            .into_iter()
            .any(|candidate| !candidate.is_empty() && candidate.trim().eq_ignore_ascii_case(code))
    }
}

/// Normalize a tracking identifier for case-insensitive comparison.
pub fn tracking_key(tracking_id: &str) -> String {
    tracking_id.trim().to_uppercase()
}

/// Kind of action recorded in the scan history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Label,
    Packing,
    Dispatch,
    Pending,
    Unhold,
    Cancelled,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Label => "label",
            EventKind::Packing => "packing",
            EventKind::Dispatch => "dispatch",
            EventKind::Pending => "pending",
            EventKind::Unhold => "unhold",
            EventKind::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "label" => Some(EventKind::Label),
            "packing" => Some(EventKind::Packing),
            "dispatch" => Some(EventKind::Dispatch),
            "pending" => Some(EventKind::Pending),
            "unhold" => Some(EventKind::Unhold),
            "cancelled" => Some(EventKind::Cancelled),
            _ => None,
        }
    }
}

impl From<Checkpoint> for EventKind {
    fn from(checkpoint: Checkpoint) -> Self {
        match checkpoint {
            Checkpoint::Label => EventKind::Label,
            Checkpoint::Packing => EventKind::Packing,
            Checkpoint::Dispatch => EventKind::Dispatch,
        }
    }
}

/// Result recorded alongside a scan event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    /// Checkpoint scanned directly.
    Scanned,
    /// Checkpoint completed by resuming a hold.
    CompletedOnResume,
    Held,
    Resumed,
    Cancelled,
}

impl EventOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOutcome::Scanned => "scanned",
            EventOutcome::CompletedOnResume => "completed_on_resume",
            EventOutcome::Held => "held",
            EventOutcome::Resumed => "resumed",
            EventOutcome::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "scanned" => Some(EventOutcome::Scanned),
            "completed_on_resume" => Some(EventOutcome::CompletedOnResume),
            "held" => Some(EventOutcome::Held),
            "resumed" => Some(EventOutcome::Resumed),
            "cancelled" => Some(EventOutcome::Cancelled),
            _ => None,
        }
    }
}

/// Immutable, append-only record of one scan, hold, unhold or cancellation.
///
/// History only. Current state always comes from [`ScanStatus`](super::ScanStatus).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    /// Assigned by the catalog on insert; zero before that.
    pub id: i64,
    pub tracking_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracker_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub outcome: EventOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ScanEvent {
    /// Event scoped to a single item.
    pub fn for_item(record: &TrackerRecord, kind: EventKind, outcome: EventOutcome) -> Self {
        Self {
            id: 0,
            tracking_id: record.tracking_id.clone(),
            tracker_id: Some(record.id.clone()),
            kind,
            outcome,
            reason: None,
            product_code: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_product_code(mut self, product_code: Option<String>) -> Self {
        self.product_code = product_code;
        self
    }
}

/// Scanned/total counts for one group at one checkpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanProgress {
    pub scanned: usize,
    pub total: usize,
}

impl ScanProgress {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.scanned >= self.total
    }

    /// Percentage rounded to one decimal place.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let raw = self.scanned as f64 / self.total as f64 * 100.0;
        (raw * 10.0).round() / 10.0
    }
}
