use super::ProcessingStage;

/// Events emitted while a resume moves through the pipeline. Extracted text
/// and structured data stay out of events (they can be large); pollers read
/// those from the record.
pub enum ProgressEvent {
    Stage {
        stage: ProcessingStage,
        message: String,
    },
    Completed {
        candidate_id: Option<String>,
    },
    Failed {
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests and fire-and-forget callers.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}
