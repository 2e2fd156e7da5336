//! cvintake — resume ingestion and candidate extraction.
//!
//! The pipeline takes an uploaded resume document (PDF, DOCX, DOC, TXT),
//! extracts plain text (falling back to OCR for image-based documents),
//! asks a completion service for structured fields, and materializes the
//! result into a relational candidate graph. Text extraction is the only
//! fatal stage; everything downstream degrades to a fallback rather than
//! aborting, on the theory that partial structured data beats no data.

pub mod candidate;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod processor;
pub mod sanitize;
pub mod storage;

pub use config::{load_config, Config};
pub use db::Database;
pub use error::{ConfigError, CvintakeError, ProcessError, Result, StorageError};
pub use llm::{CompletionService, GroqClient, ResumeAnalyzer, ResumeData};
pub use pipeline::{ProcessingOutcome, ResumePipeline, UploadedFile};
pub use processor::{DocumentFormat, ExtractedText, ExtractorRegistry};
