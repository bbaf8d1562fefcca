use crate::jobs::JobStatus;

/// Input of a single pipeline run.
pub struct PipelineContext {
    pub job_id: String,
    /// Name as submitted; sanitized before it reaches storage.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl PipelineContext {
    pub fn new(job_id: impl Into<String>, filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            job_id: job_id.into(),
            filename: filename.into(),
            bytes,
        }
    }
}

/// Text and language tag handed to the analysis stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisInput {
    pub text: String,
    pub language: Option<String>,
}

impl AnalysisInput {
    /// Prefers the translation, tagged with the target language. Without one,
    /// falls back to the extracted text tagged with the detected code.
    pub fn select(
        extracted_text: &str,
        translated_text: &str,
        target_language: &str,
        detected_code: Option<&str>,
    ) -> Self {
        if translated_text.is_empty() {
            Self {
                text: extracted_text.to_string(),
                language: detected_code.map(str::to_string),
            }
        } else {
            Self {
                text: translated_text.to_string(),
                language: Some(target_language.to_string()),
            }
        }
    }
}

/// Progress message shown when a stage starts.
pub fn stage_message(status: JobStatus, target_language: &str) -> String {
    match status {
        JobStatus::Persisting => "Persisting document".to_string(),
        JobStatus::ExtractingText => "Extracting text".to_string(),
        JobStatus::DetectingLanguage => "Detecting language".to_string(),
        JobStatus::Translating => format!("Translating to {}", target_language),
        JobStatus::AnalyzingSentiment => "Analyzing sentiment".to_string(),
        JobStatus::ExtractingKeyPhrases => "Extracting key phrases".to_string(),
        JobStatus::Queued => "Queued".to_string(),
        JobStatus::Done => "Completed".to_string(),
        JobStatus::Error => "Processing failed".to_string(),
    }
}
