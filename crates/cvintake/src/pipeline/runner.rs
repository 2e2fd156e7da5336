//! The processing pipeline for one uploaded resume.
//!
//! Stages run strictly in order: text extraction, quality assessment, file
//! relocation, structured extraction, candidate materialization. Text
//! extraction is the only stage whose failure is fatal to the upload; every
//! later stage degrades to a fallback and is recorded in the processing
//! log. Each invocation owns its intermediate artifacts — nothing is shared
//! across concurrent uploads except the skill catalog, whose upsert is
//! atomic at the storage layer.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::candidate;
use crate::config::Config;
use crate::db::candidate_repo::CandidateRow;
use crate::db::log_repo::LogRow;
use crate::db::resume_repo::ResumeRow;
use crate::db::{log_repo, resume_repo, Database, DatabaseError};
use crate::llm::{CompletionService, ResumeAnalyzer};
use crate::processor::{ExtractedText, ExtractorRegistry};
use crate::processor::quality::{assess_text_quality, QualityAssessment};
use crate::sanitize;
use crate::storage::FileStorage;

use super::context::UploadedFile;
use super::progress::{ProgressEvent, ProgressReporter};
use super::{ProcessingStage, ResumeStatus, StepStatus};

/// Log step names, preserved as the external polling contract.
const STEP_TEXT_EXTRACTION: &str = "TEXT_EXTRACTION";
const STEP_FILE_RELOCATION: &str = "FILE_RELOCATION";
const STEP_LLM_EXTRACTION: &str = "LLM_EXTRACTION";
const STEP_CANDIDATE_CREATION: &str = "CANDIDATE_CREATION";

/// How many log entries a status poll returns.
const STATUS_LOG_LIMIT: u32 = 10;

/// Terminal result for one processed upload.
#[derive(Debug)]
pub struct ProcessingOutcome {
    pub success: bool,
    pub resume: ResumeRow,
    pub candidate: Option<CandidateRow>,
    pub quality: Option<QualityAssessment>,
    pub error: Option<String>,
}

/// Snapshot served to status pollers: the record plus its newest log rows.
#[derive(Debug)]
pub struct ProcessingStatus {
    pub resume: ResumeRow,
    pub logs: Vec<LogRow>,
}

pub struct ResumePipeline {
    db: Database,
    extractors: ExtractorRegistry,
    analyzer: ResumeAnalyzer,
    storage: FileStorage,
}

impl ResumePipeline {
    /// Production constructor — builds sub-components from config.
    pub fn from_config(
        config: &Config,
        db: Database,
        service: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            db,
            extractors: ExtractorRegistry::new(&config.ocr),
            analyzer: ResumeAnalyzer::new(service, &config.llm),
            storage: FileStorage::new(&config.storage.processed_directory),
        }
    }

    /// DI constructor — inject specific sub-components.
    pub fn new(
        db: Database,
        extractors: ExtractorRegistry,
        analyzer: ResumeAnalyzer,
        storage: FileStorage,
    ) -> Self {
        Self {
            db,
            extractors,
            analyzer,
            storage,
        }
    }

    /// Runs the full pipeline for one uploaded file.
    ///
    /// Returns `Err` only when record-keeping itself fails; extraction
    /// failures terminate in the outcome with `success == false` and a
    /// `FAILED` record.
    pub async fn process_file(
        &self,
        upload: UploadedFile,
        uploader_id: Option<&str>,
        progress: &dyn ProgressReporter,
    ) -> Result<ProcessingOutcome, DatabaseError> {
        let resume_id = Uuid::new_v4().to_string();
        let processing_id = generate_processing_id();

        let span = info_span!("pipeline",
            resume_id = %resume_id,
            filename = %sanitize::redact_path(&upload.path),
        );

        self.run_stages(upload, uploader_id, resume_id, processing_id, progress)
            .instrument(span)
            .await
    }

    async fn run_stages(
        &self,
        upload: UploadedFile,
        uploader_id: Option<&str>,
        resume_id: String,
        processing_id: String,
        progress: &dyn ProgressReporter,
    ) -> Result<ProcessingOutcome, DatabaseError> {
        let resume_id = resume_id.as_str();
        let processing_id = processing_id.as_str();

        self.create_record(&upload, uploader_id, resume_id, processing_id)?;

        // Stage 1: text extraction — the only fatal stage.
        progress.report(ProgressEvent::Stage {
            stage: ProcessingStage::TextExtraction,
            message: "Extracting text from document...".to_string(),
        });

        let extracted = {
            let _step = info_span!("extract_text").entered();
            log_repo::append(
                &self.db,
                resume_id,
                STEP_TEXT_EXTRACTION,
                StepStatus::Started.as_str(),
                Some(&format!("Extracting text for {}", processing_id)),
                None,
                &now(),
            )?;

            match self.extractors.extract(&upload.path, upload.format) {
                Ok(extracted) => extracted,
                Err(e) => {
                    let message = e.to_string();
                    log_repo::append(
                        &self.db,
                        resume_id,
                        STEP_TEXT_EXTRACTION,
                        StepStatus::Failed.as_str(),
                        Some(&format!("Text extraction failed for {}", processing_id)),
                        Some(&message),
                        &now(),
                    )?;
                    resume_repo::update_status(
                        &self.db,
                        resume_id,
                        ResumeStatus::Failed.as_str(),
                        ProcessingStage::TextExtractionFailed.as_str(),
                        &now(),
                    )?;
                    progress.report(ProgressEvent::Failed {
                        error: message.clone(),
                    });

                    let resume = self.reload(resume_id)?;
                    return Ok(ProcessingOutcome {
                        success: false,
                        resume,
                        candidate: None,
                        quality: None,
                        error: Some(message),
                    });
                }
            }
        };

        // Stage 2: quality assessment (pure) + persist extraction results.
        let quality = assess_text_quality(&extracted.text);
        resume_repo::update_extraction(
            &self.db,
            resume_id,
            &extracted.text,
            ResumeStatus::TextExtracted.as_str(),
            ProcessingStage::ReadyForAnalysis.as_str(),
            &now(),
        )?;
        resume_repo::merge_metadata(
            &self.db,
            resume_id,
            "text_extraction",
            &extraction_metadata(&extracted, &quality),
            &now(),
        )?;
        log_repo::append(
            &self.db,
            resume_id,
            STEP_TEXT_EXTRACTION,
            StepStatus::Completed.as_str(),
            Some(&format!(
                "Text extraction completed for {}. Quality: {}",
                processing_id,
                quality.quality.as_str()
            )),
            None,
            &now(),
        )?;

        // Stage 3: relocate the upload to durable storage. Non-fatal — the
        // record keeps the original path when the move fails.
        self.relocate_upload(&upload, resume_id, processing_id)?;

        // Stage 4: structured extraction. Degrades to the heuristic
        // fallback; never aborts the pipeline.
        progress.report(ProgressEvent::Stage {
            stage: ProcessingStage::LlmExtraction,
            message: "Extracting structured data...".to_string(),
        });
        log_repo::append(
            &self.db,
            resume_id,
            STEP_LLM_EXTRACTION,
            StepStatus::Started.as_str(),
            None,
            None,
            &now(),
        )?;

        let extraction = self.analyzer.extract(&extracted.text).await;

        resume_repo::merge_metadata(
            &self.db,
            resume_id,
            "structured_data",
            &serde_json::to_value(&extraction.data).unwrap_or_default(),
            &now(),
        )?;
        resume_repo::merge_metadata(
            &self.db,
            resume_id,
            "llm_extraction",
            &json!({
                "used_fallback": extraction.used_fallback,
                "model": extraction.model,
                "skills_found": extraction.data.skills.len(),
                "experience_entries": extraction.data.experience.len(),
            }),
            &now(),
        )?;
        log_repo::append(
            &self.db,
            resume_id,
            STEP_LLM_EXTRACTION,
            StepStatus::Completed.as_str(),
            Some(if extraction.used_fallback {
                "Structured extraction used heuristic fallback"
            } else {
                "Structured extraction completed"
            }),
            None,
            &now(),
        )?;
        resume_repo::update_status(
            &self.db,
            resume_id,
            ResumeStatus::Analyzed.as_str(),
            ProcessingStage::CandidateCreation.as_str(),
            &now(),
        )?;

        // Stage 5: candidate materialization — atomic; a failure leaves the
        // record terminal at ANALYZED with text and structured data intact.
        progress.report(ProgressEvent::Stage {
            stage: ProcessingStage::CandidateCreation,
            message: "Creating candidate record...".to_string(),
        });
        log_repo::append(
            &self.db,
            resume_id,
            STEP_CANDIDATE_CREATION,
            StepStatus::Started.as_str(),
            None,
            None,
            &now(),
        )?;

        let today = Utc::now().date_naive();
        let (candidate, materialize_error) =
            match candidate::materialize(&self.db, &extraction.data, resume_id, today) {
                Ok(candidate) => {
                    resume_repo::set_candidate(&self.db, resume_id, &candidate.id, &now())?;
                    resume_repo::merge_metadata(
                        &self.db,
                        resume_id,
                        "candidate_creation",
                        &json!({
                            "candidate_id": candidate.id,
                            "full_name": candidate.full_name,
                            "years_experience": candidate.years_experience,
                        }),
                        &now(),
                    )?;
                    log_repo::append(
                        &self.db,
                        resume_id,
                        STEP_CANDIDATE_CREATION,
                        StepStatus::Completed.as_str(),
                        Some(&format!("Candidate {} created", candidate.id)),
                        None,
                        &now(),
                    )?;
                    resume_repo::update_status(
                        &self.db,
                        resume_id,
                        ResumeStatus::Completed.as_str(),
                        ProcessingStage::Completed.as_str(),
                        &now(),
                    )?;
                    (Some(candidate), None)
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!("candidate materialization failed: {}", message);
                    log_repo::append(
                        &self.db,
                        resume_id,
                        STEP_CANDIDATE_CREATION,
                        StepStatus::Failed.as_str(),
                        Some("Candidate creation failed; structured data retained"),
                        Some(&message),
                        &now(),
                    )?;
                    (None, Some(message))
                }
            };

        progress.report(ProgressEvent::Completed {
            candidate_id: candidate.as_ref().map(|c| c.id.clone()),
        });

        let resume = self.reload(resume_id)?;
        Ok(ProcessingOutcome {
            success: true,
            resume,
            candidate,
            quality: Some(quality),
            error: materialize_error,
        })
    }

    /// Returns the record plus its most recent log entries for polling.
    pub fn get_status(&self, resume_id: &str) -> Result<ProcessingStatus, DatabaseError> {
        let resume = resume_repo::find_by_id(&self.db, resume_id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("resume {}", resume_id)))?;
        let logs = log_repo::recent(&self.db, resume_id, STATUS_LOG_LIMIT)?;
        Ok(ProcessingStatus { resume, logs })
    }

    /// Removes a failed upload: stored file, log rows, resume row. Explicit
    /// operation — records are never deleted automatically.
    pub fn cleanup_failed(&self, resume_id: &str) -> Result<(), DatabaseError> {
        let resume = resume_repo::find_by_id(&self.db, resume_id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("resume {}", resume_id)))?;

        if let Err(e) = self.storage.remove(std::path::Path::new(&resume.file_path)) {
            warn!("failed to remove stored file during cleanup: {}", e);
        }

        log_repo::delete_for_resume(&self.db, resume_id)?;
        resume_repo::delete(&self.db, resume_id)?;
        Ok(())
    }

    /// Connectivity probe for health checks; reported, never thrown.
    pub async fn test_connection(&self) -> crate::llm::ConnectionStatus {
        self.analyzer.test_connection().await
    }

    fn create_record(
        &self,
        upload: &UploadedFile,
        uploader_id: Option<&str>,
        resume_id: &str,
        processing_id: &str,
    ) -> Result<(), DatabaseError> {
        let timestamp = now();
        let metadata = json!({
            "original_filename": upload.original_name,
            "detected_type": upload.format.extension(),
            "uploaded_at": timestamp,
        });

        resume_repo::insert(
            &self.db,
            &ResumeRow {
                id: resume_id.to_string(),
                processing_id: processing_id.to_string(),
                original_file_name: upload.original_name.clone(),
                file_path: upload.path.display().to_string(),
                file_size: upload.size,
                file_type: upload.format.as_tag().to_string(),
                mime_type: upload.mime_type.clone(),
                uploaded_by: uploader_id.map(String::from),
                status: ResumeStatus::Processing.as_str().to_string(),
                processing_stage: ProcessingStage::TextExtraction.as_str().to_string(),
                extracted_text: None,
                metadata: metadata.to_string(),
                candidate_id: None,
                uploaded_at: timestamp.clone(),
                updated_at: timestamp,
            },
        )
    }

    fn relocate_upload(
        &self,
        upload: &UploadedFile,
        resume_id: &str,
        processing_id: &str,
    ) -> Result<(), DatabaseError> {
        match self
            .storage
            .relocate(&upload.path, processing_id, upload.format.extension())
        {
            Ok(stored_path) => {
                resume_repo::update_file_path(
                    &self.db,
                    resume_id,
                    &stored_path.display().to_string(),
                    &now(),
                )?;
                log_repo::append(
                    &self.db,
                    resume_id,
                    STEP_FILE_RELOCATION,
                    StepStatus::Completed.as_str(),
                    Some("File moved to processed storage"),
                    None,
                    &now(),
                )?;
            }
            Err(e) => {
                // Non-fatal: extraction already succeeded, the record keeps
                // pointing at the original path.
                warn!("file relocation failed: {}", e);
                log_repo::append(
                    &self.db,
                    resume_id,
                    STEP_FILE_RELOCATION,
                    StepStatus::Failed.as_str(),
                    Some("File relocation failed; keeping original path"),
                    Some(&e.to_string()),
                    &now(),
                )?;
            }
        }
        Ok(())
    }

    fn reload(&self, resume_id: &str) -> Result<ResumeRow, DatabaseError> {
        resume_repo::find_by_id(&self.db, resume_id)?
            .ok_or_else(|| DatabaseError::NotFound(format!("resume {}", resume_id)))
    }
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

/// `proc_{millis}_{suffix}`, unique per upload and readable in logs.
fn generate_processing_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("proc_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
}

/// Metadata summary of the extraction; the full text lives in its own
/// column, not in the bag.
fn extraction_metadata(
    extracted: &ExtractedText,
    quality: &QualityAssessment,
) -> serde_json::Value {
    json!({
        "method": extracted.method,
        "ocr_confidence": extracted.ocr_confidence,
        "page_or_image_count": extracted.page_or_image_count,
        "note": extracted.note,
        "extracted_at": extracted.extracted_at.to_rfc3339(),
        "word_count": quality.word_count,
        "character_count": quality.character_count,
        "quality_assessment": serde_json::to_value(quality).unwrap_or_default(),
    })
}
