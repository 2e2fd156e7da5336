pub mod context;
pub mod progress;
pub mod runner;

pub use context::UploadedFile;
pub use progress::{NoopProgress, ProgressEvent, ProgressReporter};
pub use runner::{ProcessingOutcome, ProcessingStatus, ResumePipeline};

/// Overall status of one uploaded resume. `Failed` is reachable only from
/// text extraction; every later stage degrades instead of aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeStatus {
    Processing,
    TextExtracted,
    Analyzed,
    Completed,
    Failed,
}

impl ResumeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::TextExtracted => "TEXT_EXTRACTED",
            Self::Analyzed => "ANALYZED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

/// Fine-grained position within the pipeline, stored alongside the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    TextExtraction,
    ReadyForAnalysis,
    LlmExtraction,
    CandidateCreation,
    Completed,
    TextExtractionFailed,
}

impl ProcessingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextExtraction => "TEXT_EXTRACTION",
            Self::ReadyForAnalysis => "READY_FOR_ANALYSIS",
            Self::LlmExtraction => "LLM_EXTRACTION",
            Self::CandidateCreation => "CANDIDATE_CREATION",
            Self::Completed => "COMPLETED",
            Self::TextExtractionFailed => "TEXT_EXTRACTION_FAILED",
        }
    }
}

/// Status of a single processing-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Started,
    Completed,
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_match_stored_form() {
        assert_eq!(ResumeStatus::Processing.as_str(), "PROCESSING");
        assert_eq!(ResumeStatus::TextExtracted.as_str(), "TEXT_EXTRACTED");
        assert_eq!(ResumeStatus::Analyzed.as_str(), "ANALYZED");
        assert_eq!(ResumeStatus::Completed.as_str(), "COMPLETED");
        assert_eq!(ResumeStatus::Failed.as_str(), "FAILED");
        assert_eq!(ProcessingStage::TextExtractionFailed.as_str(), "TEXT_EXTRACTION_FAILED");
        assert_eq!(StepStatus::Started.as_str(), "STARTED");
    }
}
