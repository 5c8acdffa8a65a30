use std::sync::Arc;

use shiptrack_core::{
    Config, DuplicatePolicy, JsonFileSink, ProgressAggregator, RetryPolicy, SanitizedConfig,
    SnapshotSink, TrackerCatalog, UploadReconciler, Workflow,
};

/// Shared application state
pub struct AppState {
    config: Config,
    catalog: Arc<dyn TrackerCatalog>,
    workflow: Workflow,
    uploads: UploadReconciler,
    progress: ProgressAggregator,
    mirror: Option<Arc<dyn SnapshotSink>>,
}

impl AppState {
    pub fn new(config: Config, catalog: Arc<dyn TrackerCatalog>) -> Self {
        let retry = RetryPolicy::from_config(&config.workflow);
        let mirror = config
            .mirror
            .path
            .as_ref()
            .map(|path| Arc::new(JsonFileSink::new(path)) as Arc<dyn SnapshotSink>);

        let workflow = Workflow::new(Arc::clone(&catalog), retry);
        let uploads = UploadReconciler::new(Arc::clone(&catalog))
            .with_locks(Arc::clone(workflow.locks()))
            .with_retry(retry)
            .with_max_rows(config.upload.max_rows);

        Self {
            workflow,
            uploads,
            progress: ProgressAggregator::new(Arc::clone(&catalog)),
            catalog,
            mirror,
            config,
        }
    }

    /// Replace the configured mirror destination.
    pub fn with_mirror_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.mirror = Some(sink);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn catalog(&self) -> &dyn TrackerCatalog {
        self.catalog.as_ref()
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn uploads(&self) -> &UploadReconciler {
        &self.uploads
    }

    pub fn progress(&self) -> &ProgressAggregator {
        &self.progress
    }

    pub fn mirror(&self) -> Option<&dyn SnapshotSink> {
        self.mirror.as_deref()
    }

    pub fn default_policy(&self) -> DuplicatePolicy {
        self.config.upload.default_policy
    }
}
