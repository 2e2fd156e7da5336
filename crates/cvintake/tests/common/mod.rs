//! Test harness for isolated pipeline execution.
//!
//! `TestHarness` wires a full `ResumePipeline` against an in-memory
//! database, temp upload/processed directories, and a scripted completion
//! service, so end-to-end tests never touch the network.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use cvintake::config::{LlmConfig, OcrConfig};
use cvintake::llm::{Completion, CompletionOptions, CompletionService, LlmError, ResumeAnalyzer};
use cvintake::pipeline::ResumePipeline;
use cvintake::processor::ExtractorRegistry;
use cvintake::storage::FileStorage;
use cvintake::Database;

/// Completion service returning one canned response for every prompt.
pub struct CannedCompletion {
    pub response: String,
}

#[async_trait]
impl CompletionService for CannedCompletion {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        Ok(Completion {
            text: self.response.clone(),
            model: Some("canned-test-model".to_string()),
        })
    }

    fn model_name(&self) -> &str {
        "canned-test-model"
    }
}

/// Completion service that is always down.
pub struct UnreachableCompletion;

#[async_trait]
impl CompletionService for UnreachableCompletion {
    async fn complete(
        &self,
        _prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<Completion, LlmError> {
        Err(LlmError::Api {
            status: 503,
            message: "service unreachable".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "unreachable-model"
    }
}

/// Isolated environment: temp dirs, in-memory database, scripted service.
pub struct TestHarness {
    temp_dir: TempDir,
    pub upload_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub db: Database,
    pub pipeline: ResumePipeline,
}

impl TestHarness {
    /// Harness with a canned model response.
    pub fn with_response(response: &str) -> Self {
        Self::build(Arc::new(CannedCompletion {
            response: response.to_string(),
        }))
    }

    /// Harness whose completion service always fails.
    pub fn with_dead_service() -> Self {
        Self::build(Arc::new(UnreachableCompletion))
    }

    fn build(service: Arc<dyn CompletionService>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let upload_dir = temp_dir.path().join("uploads");
        let processed_dir = temp_dir.path().join("processed");
        std::fs::create_dir_all(&upload_dir).unwrap();

        let db = Database::open_in_memory().unwrap();

        let ocr = OcrConfig {
            // Keep the DPI low: rasterization only happens in OCR-path
            // tests and degrades gracefully when poppler is absent.
            dpi: 150,
            ..OcrConfig::default()
        };

        let pipeline = ResumePipeline::new(
            db.clone(),
            ExtractorRegistry::new(&ocr),
            ResumeAnalyzer::new(service, &LlmConfig::default()),
            FileStorage::new(&processed_dir),
        );

        Self {
            temp_dir,
            upload_dir,
            processed_dir,
            db,
            pipeline,
        }
    }

    /// Stages a file in the upload directory.
    pub fn write_upload(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.upload_dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }
}

/// Canned model response matching the Jane Doe fixture resume.
pub const JANE_RESPONSE: &str = r#"{
  "personal_info": {
    "name": "Jane Doe",
    "email": "jane@x.com",
    "phone": null,
    "address": null,
    "linkedin": null,
    "github": null
  },
  "summary": "Engineer at Acme Corp.",
  "skills": ["Python", "SQL"],
  "experience": [
    {
      "company": "Acme Corp",
      "position": "Engineer",
      "start_date": "2019-01-01",
      "end_date": "2021-01-01",
      "is_current": false,
      "description": null
    }
  ],
  "education": [],
  "certifications": []
}"#;

/// Fixture resume text fed through the txt path.
pub const JANE_RESUME_TEXT: &str =
    "Jane Doe\njane@x.com\nSkills: Python, SQL\nExperience: Acme Corp, Engineer, 2019-01-01 to 2021-01-01";

/// Builds a minimal one-page PDF; `content_text == None` produces an empty
/// text layer, which routes the extraction through OCR.
pub fn build_pdf(content_text: Option<&str>) -> Vec<u8> {
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.new_object_id();
    let resources_id = doc.new_object_id();
    let page_id = doc.new_object_id();

    doc.objects.insert(
        font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        }),
    );

    doc.objects.insert(
        resources_id,
        Object::Dictionary(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        }),
    );

    let mut page_dict = dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => resources_id,
    };

    if let Some(text) = content_text {
        let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", text);
        let content_id = doc.new_object_id();
        doc.objects
            .insert(content_id, Object::Stream(Stream::new(dictionary! {}, content.into_bytes())));
        page_dict.set("Contents", content_id);
    }

    doc.objects.insert(page_id, Object::Dictionary(page_dict));

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut pdf_bytes = Vec::new();
    doc.save_to(&mut pdf_bytes).unwrap();
    pdf_bytes
}
