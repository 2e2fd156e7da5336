pub mod client;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod schema;

pub use client::{Completion, CompletionOptions, CompletionService, GroqClient, LlmError};
pub use orchestrator::{ConnectionStatus, Extraction, ResumeAnalyzer};
pub use parser::parse_extraction_response;
pub use schema::{
    Certification, CertificationDetail, EducationEntry, ExperienceEntry, PersonalInfo, ResumeData,
};
