//! Ingest uploaded rows against the catalog under a duplicate policy.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use super::{
    mint_record_id, DuplicatePolicy, SkipReason, SkippedRow, UploadError, UploadRow,
    UploadSummary,
};
use crate::catalog::{CatalogError, RecordWrite, TrackerCatalog};
use crate::metrics;
use crate::tracker::{tracking_key, ScanStatus, TrackerRecord};
use crate::workflow::{KeyedLocks, RetryPolicy};

/// Fresh ids are re-minted this many times if they happen to collide.
const MAX_ID_ATTEMPTS: usize = 3;

/// Creates, updates or skips uploaded rows.
///
/// An upload holds the locks of every tracking id it names while it reads
/// the stored groups and writes its batch, and the batch lands in one
/// catalog transaction. A transient store failure restarts the whole
/// upload under the retry policy; since nothing from a failed attempt was
/// stored, a retry never duplicates rows.
pub struct UploadReconciler {
    catalog: Arc<dyn TrackerCatalog>,
    locks: Arc<KeyedLocks>,
    retry: RetryPolicy,
    max_rows: usize,
}

impl UploadReconciler {
    pub fn new(catalog: Arc<dyn TrackerCatalog>) -> Self {
        Self {
            catalog,
            locks: Arc::new(KeyedLocks::new()),
            retry: RetryPolicy::default(),
            max_rows: usize::MAX,
        }
    }

    /// Share a lock table with the scan workflow.
    pub fn with_locks(mut self, locks: Arc<KeyedLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Reject uploads with more than `max_rows` rows.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Ingest `rows` in order.
    ///
    /// Duplicates within the batch are keyed on (tracking id, SKU code) and
    /// collisions with stored groups on the tracking id alone, both
    /// case-insensitively. Records created by this upload never count as
    /// stored.
    pub fn ingest(
        &self,
        rows: &[UploadRow],
        policy: DuplicatePolicy,
    ) -> Result<UploadSummary, UploadError> {
        if rows.len() > self.max_rows {
            return Err(UploadError::TooManyRows {
                count: rows.len(),
                max: self.max_rows,
            });
        }

        let tracking_ids: Vec<&str> = rows
            .iter()
            .map(|row| row.tracking_id.trim())
            .filter(|id| !id.is_empty())
            .collect();

        let summary = self.retry.run("upload", || {
            self.locks
                .with_locks(tracking_ids.iter().copied(), || self.apply(rows, policy))
        })?;

        metrics::UPLOAD_ROWS
            .with_label_values(&["created"])
            .inc_by(summary.created as u64);
        metrics::UPLOAD_ROWS
            .with_label_values(&["updated"])
            .inc_by(summary.updated as u64);
        metrics::UPLOAD_ROWS
            .with_label_values(&["skipped"])
            .inc_by(summary.skipped as u64);

        info!(
            policy = %policy,
            rows = rows.len(),
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped,
            "Upload reconciled"
        );

        Ok(summary)
    }

    /// Plan and write the batch. Caller holds the group locks.
    fn apply(
        &self,
        rows: &[UploadRow],
        policy: DuplicatePolicy,
    ) -> Result<UploadSummary, UploadError> {
        let mut attempt = 1;
        loop {
            let (writes, summary) = self.plan(rows, policy)?;
            if writes.is_empty() {
                return Ok(summary);
            }

            match self.catalog.write_records(&writes) {
                Ok(()) => {
                    for write in &writes {
                        let record = write.record();
                        debug!(
                            tracking_id = %record.tracking_id,
                            tracker_id = %record.id,
                            "Stored tracker from upload"
                        );
                    }
                    return Ok(summary);
                }
                // Only freshly minted ids can collide; plan again with new ones.
                Err(CatalogError::AlreadyExists(id)) if attempt < MAX_ID_ATTEMPTS => {
                    debug!(tracker_id = %id, attempt, "Minted id collided, retrying");
                    attempt += 1;
                }
                Err(source) => return Err(UploadError::Store(source)),
            }
        }
    }

    fn plan(
        &self,
        rows: &[UploadRow],
        policy: DuplicatePolicy,
    ) -> Result<(Vec<RecordWrite>, UploadSummary), UploadError> {
        // First stored record per tracking key, looked up on first sight.
        let mut stored: HashMap<String, Option<TrackerRecord>> = HashMap::new();
        let mut seen_in_batch: HashSet<(String, String)> = HashSet::new();
        let mut writes = Vec::new();
        let mut summary = UploadSummary::default();

        for row in rows {
            let tracking_id = row.tracking_id.trim();
            if tracking_id.is_empty() {
                Self::skip(&mut summary, row, SkipReason::MissingTrackingId);
                continue;
            }

            let key = tracking_key(tracking_id);
            let batch_key = (key.clone(), row.sku_code.trim().to_uppercase());

            if policy != DuplicatePolicy::Allow {
                if seen_in_batch.contains(&batch_key) {
                    Self::skip(&mut summary, row, SkipReason::DuplicateInBatch);
                    continue;
                }

                if !stored.contains_key(&key) {
                    let group = self
                        .catalog
                        .get_group(tracking_id)
                        .map_err(UploadError::Load)?;
                    stored.insert(key.clone(), group.into_iter().next());
                }

                if let Some(Some(current)) = stored.get(&key) {
                    if policy == DuplicatePolicy::Skip {
                        Self::skip(&mut summary, row, SkipReason::ExistingTrackingId);
                        continue;
                    }

                    let mut record = current.clone();
                    row.apply_to(&mut record);
                    summary.updated += 1;
                    summary.updated_ids.push(record.id.clone());
                    writes.push(RecordWrite::Update(record.clone()));
                    stored.insert(key, Some(record));
                    seen_in_batch.insert(batch_key);
                    continue;
                }
            }

            let record = row.to_record(mint_record_id(&row.tracking_id));
            summary.created += 1;
            summary.created_ids.push(record.id.clone());
            writes.push(RecordWrite::Create {
                record,
                status: ScanStatus::default(),
            });
            seen_in_batch.insert(batch_key);
        }

        Ok((writes, summary))
    }

    fn skip(summary: &mut UploadSummary, row: &UploadRow, reason: SkipReason) {
        summary.skipped += 1;
        summary.skipped_rows.push(SkippedRow {
            tracking_id: row.tracking_id.trim().to_string(),
            sku_code: row.sku_code.trim().to_string(),
            reason,
        });
    }
}
