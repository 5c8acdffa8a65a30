pub mod catalog;
pub mod config;
pub mod metrics;
pub mod mirror;
pub mod progress;
pub mod testing;
pub mod tracker;
pub mod upload;
pub mod workflow;

pub use catalog::{
    CatalogError, EventFilter, RecordWrite, SqliteTrackerCatalog, StatusChange, TrackerCatalog,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatabaseConfig,
    MirrorConfig, SanitizedConfig, ServerConfig, UploadConfig, WorkflowConfig,
};
pub use mirror::{
    build_snapshot, JsonFileSink, MirrorError, MirrorRow, MirrorSnapshot, SnapshotSink,
};
pub use progress::{
    CheckpointCounts, CheckpointProgress, CourierBucket, CourierStats, DashboardStats,
    GroupProgress, ProgressAggregator, StageCount,
};
pub use tracker::{
    stage_of, tracking_key, Checkpoint, EventKind, EventOutcome, NextStep, ScanEvent,
    ScanProgress, ScanStatus, Stage, TrackerRecord, UnknownCheckpoint,
};
pub use upload::{
    mint_record_id, sanitize_key, DuplicatePolicy, SkipReason, SkippedRow, UploadError,
    UploadReconciler, UploadRow, UploadSummary,
};
pub use workflow::{
    BatchScanOutcome, CancelOutcome, ClearReport, ErrorKind, GroupMember, GroupResolver,
    HoldCancelManager, HoldOutcome, KeyedLocks, Maintenance, PackingDetails, PackingItem,
    PackingOutcome, RepairReport, RetryPolicy, Retryable, ScanWorkflowEngine, TrackingGroup,
    UnholdOutcome, Workflow, WorkflowError,
};
