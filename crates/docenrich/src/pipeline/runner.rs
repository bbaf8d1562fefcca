use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::adapters::{Adapters, DocumentHandle};
use crate::config::Config;
use crate::error::{AdapterError, ConfigError};
use crate::jobs::{JobResult, JobStatus, META_BLOB_URL, META_DETECTED_LANGUAGE_CODE};
use crate::sanitize;

use super::config::PipelineConfig;
use super::context::{stage_message, AnalysisInput, PipelineContext};
use super::error::PipelineError;
use super::languages;
use super::progress::{ProgressEvent, ProgressReporter};

const STORAGE: &str = "storage service";
const EXTRACTION: &str = "text extraction service";
const LANGUAGE: &str = "language service";
const TRANSLATION: &str = "translation service";

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    adapters: Adapters,
}

impl Pipeline {
    pub fn new(config: Arc<PipelineConfig>, adapters: Adapters) -> Self {
        Self { config, adapters }
    }

    /// Production constructor: HTTP adapters built from config.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            Arc::new(PipelineConfig::from_config(config)),
            Adapters::from_config(config)?,
        ))
    }

    /// Runs every stage for one document.
    ///
    /// Progress, including the terminal state, is recorded through `progress`;
    /// the returned value mirrors what was recorded.
    pub async fn run(
        &self,
        ctx: PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<JobResult, PipelineError> {
        let span = info_span!("pipeline", job_id = %ctx.job_id, filename = %ctx.filename);

        async {
            let outcome = self.run_stages(&ctx, progress).await;
            match &outcome {
                Ok(result) => info!(detected_lang = %result.detected_lang, "Pipeline completed"),
                Err(e) => {
                    warn!(error = %e, "Pipeline failed");
                    // Rejected when the job already ended, e.g. after a cancel
                    if let Err(report_err) = progress.report(ProgressEvent::Failed {
                        error: e.to_string(),
                    }) {
                        debug!(error = %report_err, "Failure not recorded");
                    }
                }
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run_stages(
        &self,
        ctx: &PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<JobResult, PipelineError> {
        let handle = self
            .step_persist(ctx, progress)
            .instrument(info_span!("persist"))
            .await?;

        let extracted_text = self
            .step_extract_text(&handle, progress)
            .instrument(info_span!("extract_text"))
            .await?;

        let detected_code = self
            .step_detect_language(&extracted_text, progress)
            .instrument(info_span!("detect_language"))
            .await?;

        let translated_text = self
            .step_translate(&extracted_text, progress)
            .instrument(info_span!("translate"))
            .await?;

        let input = AnalysisInput::select(
            &extracted_text,
            &translated_text,
            &self.config.target_language,
            detected_code.as_deref(),
        );

        let sentiment = self
            .step_analyze(JobStatus::AnalyzingSentiment, &input, progress)
            .instrument(info_span!("analyze_sentiment"))
            .await?;

        let key_phrases = self
            .step_analyze(JobStatus::ExtractingKeyPhrases, &input, progress)
            .instrument(info_span!("extract_key_phrases"))
            .await?;

        let result = JobResult {
            blob_url: handle.into_string(),
            extracted_text,
            detected_lang: languages::display_name(detected_code.as_deref()),
            translated_text,
            sentiment,
            key_phrases,
        };

        progress.report(ProgressEvent::Completed {
            result: result.clone(),
        })?;

        Ok(result)
    }

    fn enter(&self, status: JobStatus, progress: &dyn ProgressReporter) -> Result<(), PipelineError> {
        progress.report(ProgressEvent::Stage {
            status,
            message: stage_message(status, &self.config.target_language),
        })?;
        Ok(())
    }

    /// Awaits an adapter call under the per-stage deadline.
    async fn call<T, F>(&self, service: &str, call: F) -> Result<T, AdapterError>
    where
        F: Future<Output = Result<T, AdapterError>>,
    {
        match tokio::time::timeout(self.config.stage_timeout, call).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AdapterError::Timeout {
                service: service.to_string(),
                after: self.config.stage_timeout,
            }),
        }
    }

    async fn step_persist(
        &self,
        ctx: &PipelineContext,
        progress: &dyn ProgressReporter,
    ) -> Result<DocumentHandle, PipelineError> {
        self.enter(JobStatus::Persisting, progress)?;

        let name = sanitize::secure_filename(&ctx.filename);
        let handle = self
            .call(STORAGE, self.adapters.store.store(&ctx.bytes, &name))
            .await
            .map_err(PipelineError::stage(JobStatus::Persisting))?;

        debug!(handle = %handle.redacted(), bytes = ctx.bytes.len(), "Document persisted");
        progress.report(ProgressEvent::Metadata {
            key: META_BLOB_URL,
            value: handle.as_str().to_string(),
        })?;

        Ok(handle)
    }

    async fn step_extract_text(
        &self,
        handle: &DocumentHandle,
        progress: &dyn ProgressReporter,
    ) -> Result<String, PipelineError> {
        self.enter(JobStatus::ExtractingText, progress)?;

        let text = self
            .call(EXTRACTION, self.adapters.extractor.extract(handle))
            .await
            .map_err(PipelineError::stage(JobStatus::ExtractingText))?;

        debug!(chars = text.chars().count(), "Text extracted");
        Ok(text)
    }

    /// Never fails on adapter errors: detection only labels the document.
    async fn step_detect_language(
        &self,
        text: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<Option<String>, PipelineError> {
        self.enter(JobStatus::DetectingLanguage, progress)?;

        if is_blank(text) {
            debug!("No text, language unknown");
            return Ok(None);
        }

        let code = match self
            .call(LANGUAGE, self.adapters.detector.detect(text))
            .await
        {
            Ok(code) => code,
            Err(e) if e.is_unavailable() => {
                debug!(error = %e, "Language detection skipped");
                None
            }
            Err(e) => {
                warn!(error = %e, "Language detection failed, continuing as unknown");
                None
            }
        };

        if let Some(code) = &code {
            debug!(code = %code, "Language detected");
            progress.report(ProgressEvent::Metadata {
                key: META_DETECTED_LANGUAGE_CODE,
                value: code.clone(),
            })?;
        }

        Ok(code)
    }

    async fn step_translate(
        &self,
        text: &str,
        progress: &dyn ProgressReporter,
    ) -> Result<String, PipelineError> {
        self.enter(JobStatus::Translating, progress)?;

        if is_blank(text) {
            debug!("No text, translation skipped");
            return Ok(String::new());
        }

        let to = &self.config.target_language;
        let translated = self
            .call(TRANSLATION, self.adapters.translator.translate(text, to))
            .await
            .map_err(PipelineError::stage(JobStatus::Translating))?;

        debug!(to = %to, chars = translated.chars().count(), "Text translated");
        Ok(translated)
    }

    /// Shared by both analysis stages. Runs on empty input too. An
    /// unconfigured analyzer leaves the payload empty; any other failure ends
    /// the job.
    async fn step_analyze(
        &self,
        stage: JobStatus,
        input: &AnalysisInput,
        progress: &dyn ProgressReporter,
    ) -> Result<Option<Value>, PipelineError> {
        self.enter(stage, progress)?;

        let language = input.language.as_deref();
        let analyzer = &self.adapters.analyzer;
        let outcome = match stage {
            JobStatus::AnalyzingSentiment => {
                self.call(LANGUAGE, analyzer.sentiment(&input.text, language))
                    .await
            }
            _ => {
                self.call(LANGUAGE, analyzer.key_phrases(&input.text, language))
                    .await
            }
        };

        match outcome {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.is_unavailable() => {
                debug!(error = %e, "Analysis skipped");
                Ok(None)
            }
            Err(source) => Err(PipelineError::Stage { stage, source }),
        }
    }
}

/// Whitespace-only text is treated as no text.
fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{DocumentStore, LanguageDetector, TextAnalyzer, TextExtractor, Translator};
    use crate::error::JobStoreError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone, Copy, PartialEq)]
    enum Mode {
        Ok,
        Unavailable,
        Broken,
        Hang,
    }

    struct Fakes {
        store: Mode,
        extract: Mode,
        detect: Mode,
        translate: Mode,
        analyze: Mode,
        text: String,
        calls: Mutex<Vec<&'static str>>,
        analyzed: Mutex<Vec<(String, Option<String>)>>,
    }

    impl Fakes {
        fn new(text: &str) -> Self {
            Self {
                store: Mode::Ok,
                extract: Mode::Ok,
                detect: Mode::Ok,
                translate: Mode::Ok,
                analyze: Mode::Ok,
                text: text.to_string(),
                calls: Mutex::new(Vec::new()),
                analyzed: Mutex::new(Vec::new()),
            }
        }

        async fn behave(&self, name: &'static str, mode: Mode) -> Result<(), AdapterError> {
            self.calls.lock().unwrap().push(name);
            match mode {
                Mode::Ok => Ok(()),
                Mode::Unavailable => Err(AdapterError::Unavailable(name.to_string())),
                Mode::Broken => Err(AdapterError::Transport {
                    service: name.to_string(),
                    message: "connection refused".to_string(),
                }),
                Mode::Hang => std::future::pending().await,
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentStore for Fakes {
        async fn store(&self, _bytes: &[u8], name: &str) -> Result<DocumentHandle, AdapterError> {
            self.behave("store", self.store).await?;
            Ok(DocumentHandle::new(format!("https://blob.test/uploads/{}?sig=x", name)))
        }
    }

    #[async_trait]
    impl TextExtractor for Fakes {
        async fn extract(&self, _handle: &DocumentHandle) -> Result<String, AdapterError> {
            self.behave("extract", self.extract).await?;
            Ok(self.text.clone())
        }
    }

    #[async_trait]
    impl LanguageDetector for Fakes {
        async fn detect(&self, _text: &str) -> Result<Option<String>, AdapterError> {
            self.behave("detect", self.detect).await?;
            Ok(Some("en".to_string()))
        }
    }

    #[async_trait]
    impl Translator for Fakes {
        async fn translate(&self, text: &str, to: &str) -> Result<String, AdapterError> {
            self.behave("translate", self.translate).await?;
            Ok(format!("[{}] {}", to, text))
        }
    }

    #[async_trait]
    impl TextAnalyzer for Fakes {
        async fn sentiment(&self, text: &str, language: Option<&str>) -> Result<Value, AdapterError> {
            self.behave("sentiment", self.analyze).await?;
            self.analyzed
                .lock()
                .unwrap()
                .push((text.to_string(), language.map(str::to_string)));
            Ok(json!({ "documents": [{ "sentiment": "neutral" }] }))
        }

        async fn key_phrases(
            &self,
            _text: &str,
            _language: Option<&str>,
        ) -> Result<Value, AdapterError> {
            self.behave("key_phrases", self.analyze).await?;
            Ok(json!({ "documents": [{ "keyPhrases": ["invoice"] }] }))
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        statuses: Mutex<Vec<JobStatus>>,
        metadata: Mutex<Vec<(&'static str, String)>>,
        failure: Mutex<Option<String>>,
    }

    impl ProgressReporter for RecordingProgress {
        fn report(&self, event: ProgressEvent) -> Result<(), JobStoreError> {
            match event {
                ProgressEvent::Stage { status, .. } => self.statuses.lock().unwrap().push(status),
                ProgressEvent::Metadata { key, value } => {
                    self.metadata.lock().unwrap().push((key, value))
                }
                ProgressEvent::Completed { .. } => {
                    self.statuses.lock().unwrap().push(JobStatus::Done)
                }
                ProgressEvent::Failed { error } => {
                    self.statuses.lock().unwrap().push(JobStatus::Error);
                    *self.failure.lock().unwrap() = Some(error);
                }
            }
            Ok(())
        }
    }

    fn pipeline(fakes: Arc<Fakes>, stage_timeout: Duration) -> Pipeline {
        let adapters = Adapters {
            store: fakes.clone(),
            extractor: fakes.clone(),
            detector: fakes.clone(),
            translator: fakes.clone(),
            analyzer: fakes,
        };
        let config = PipelineConfig {
            target_language: "es".to_string(),
            stage_timeout,
        };
        Pipeline::new(Arc::new(config), adapters)
    }

    async fn run(fakes: &Arc<Fakes>) -> (Result<JobResult, PipelineError>, RecordingProgress) {
        let pipeline = pipeline(Arc::clone(fakes), Duration::from_secs(5));
        let progress = RecordingProgress::default();
        let ctx = PipelineContext::new("job-1", "my invoice.png", b"PNG".to_vec());
        let outcome = pipeline.run(ctx, &progress).await;
        (outcome, progress)
    }

    #[tokio::test]
    async fn test_full_run() {
        let fakes = Arc::new(Fakes::new("Hello world"));
        let (outcome, progress) = run(&fakes).await;
        let result = outcome.unwrap();

        assert_eq!(
            *progress.statuses.lock().unwrap(),
            JobStatus::PIPELINE[1..].to_vec()
        );
        assert_eq!(result.blob_url, "https://blob.test/uploads/my_invoice.png?sig=x");
        assert_eq!(result.extracted_text, "Hello world");
        assert_eq!(result.detected_lang, "English");
        assert_eq!(result.translated_text, "[es] Hello world");
        assert!(result.sentiment.is_some());
        assert!(result.key_phrases.is_some());

        let metadata = progress.metadata.lock().unwrap().clone();
        assert_eq!(metadata[0].0, META_BLOB_URL);
        assert_eq!(metadata[1], (META_DETECTED_LANGUAGE_CODE, "en".to_string()));

        // Analysis sees the translation, tagged with the target language
        assert_eq!(
            *fakes.analyzed.lock().unwrap(),
            vec![("[es] Hello world".to_string(), Some("es".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_empty_text_skips_detection_and_translation() {
        let fakes = Arc::new(Fakes::new(""));
        let (outcome, progress) = run(&fakes).await;
        let result = outcome.unwrap();

        assert_eq!(result.detected_lang, "unknown");
        assert_eq!(result.translated_text, "");
        assert!(result.sentiment.is_some());
        assert!(result.key_phrases.is_some());
        assert_eq!(
            fakes.calls(),
            vec!["store", "extract", "sentiment", "key_phrases"]
        );
        assert_eq!(*fakes.analyzed.lock().unwrap(), vec![(String::new(), None)]);
        assert_eq!(progress.statuses.lock().unwrap().last(), Some(&JobStatus::Done));
    }

    #[tokio::test]
    async fn test_whitespace_text_skips_detection_and_translation() {
        let fakes = Arc::new(Fakes::new("  \n\t "));
        let (outcome, _progress) = run(&fakes).await;
        let result = outcome.unwrap();

        assert_eq!(result.detected_lang, "unknown");
        assert_eq!(result.translated_text, "");
        assert_eq!(
            fakes.calls(),
            vec!["store", "extract", "sentiment", "key_phrases"]
        );
    }

    #[tokio::test]
    async fn test_persist_failure_halts() {
        let mut fakes = Fakes::new("Hello");
        fakes.store = Mode::Broken;
        let fakes = Arc::new(fakes);
        let (outcome, progress) = run(&fakes).await;

        let err = outcome.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Stage {
                stage: JobStatus::Persisting,
                ..
            }
        ));
        assert_eq!(fakes.calls(), vec!["store"]);
        assert_eq!(
            *progress.statuses.lock().unwrap(),
            vec![JobStatus::Persisting, JobStatus::Error]
        );
        assert_eq!(
            progress.failure.lock().unwrap().as_deref(),
            Some("request to store failed: connection refused")
        );
    }

    #[tokio::test]
    async fn test_detection_failure_is_absorbed() {
        for mode in [Mode::Broken, Mode::Unavailable] {
            let mut fakes = Fakes::new("Hello");
            fakes.detect = mode;
            let fakes = Arc::new(fakes);
            let (outcome, progress) = run(&fakes).await;

            let result = outcome.unwrap();
            assert_eq!(result.detected_lang, "unknown");
            assert!(progress
                .metadata
                .lock()
                .unwrap()
                .iter()
                .all(|(key, _)| *key != META_DETECTED_LANGUAGE_CODE));
        }
    }

    #[tokio::test]
    async fn test_unavailable_translator_is_fatal() {
        let mut fakes = Fakes::new("Hello");
        fakes.translate = Mode::Unavailable;
        let fakes = Arc::new(fakes);
        let (outcome, _) = run(&fakes).await;

        assert!(matches!(
            outcome.unwrap_err(),
            PipelineError::Stage {
                stage: JobStatus::Translating,
                ..
            }
        ));
        assert_eq!(fakes.calls(), vec!["store", "extract", "detect", "translate"]);
    }

    #[tokio::test]
    async fn test_unavailable_analyzer_leaves_payloads_empty() {
        let mut fakes = Fakes::new("Hello");
        fakes.analyze = Mode::Unavailable;
        let fakes = Arc::new(fakes);
        let (outcome, _) = run(&fakes).await;

        let result = outcome.unwrap();
        assert!(result.sentiment.is_none());
        assert!(result.key_phrases.is_none());
        assert_eq!(result.translated_text, "[es] Hello");
    }

    #[tokio::test]
    async fn test_broken_analyzer_is_fatal() {
        let mut fakes = Fakes::new("Hello");
        fakes.analyze = Mode::Broken;
        let fakes = Arc::new(fakes);
        let (outcome, progress) = run(&fakes).await;

        assert!(matches!(
            outcome.unwrap_err(),
            PipelineError::Stage {
                stage: JobStatus::AnalyzingSentiment,
                ..
            }
        ));
        assert_eq!(
            progress.statuses.lock().unwrap().last(),
            Some(&JobStatus::Error)
        );
        assert!(!fakes.calls().contains(&"key_phrases"));
    }

    #[tokio::test]
    async fn test_stage_timeout() {
        let mut fakes = Fakes::new("Hello");
        fakes.extract = Mode::Hang;
        let pipeline = pipeline(Arc::new(fakes), Duration::from_millis(50));
        let progress = RecordingProgress::default();

        let err = pipeline
            .run(PipelineContext::new("job-1", "a.png", b"x".to_vec()), &progress)
            .await
            .unwrap_err();

        match err {
            PipelineError::Stage {
                stage: JobStatus::ExtractingText,
                source: AdapterError::Timeout { after, .. },
            } => assert_eq!(after, Duration::from_millis(50)),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_progress_halts() {
        struct Closed;
        impl ProgressReporter for Closed {
            fn report(&self, _event: ProgressEvent) -> Result<(), JobStoreError> {
                Err(JobStoreError::Terminal("job-1".to_string()))
            }
        }

        let fakes = Arc::new(Fakes::new("Hello"));
        let pipeline = pipeline(Arc::clone(&fakes), Duration::from_secs(5));
        let err = pipeline
            .run(PipelineContext::new("job-1", "a.png", b"x".to_vec()), &Closed)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Halted(JobStoreError::Terminal(_))));
        assert!(fakes.calls().is_empty());
    }
}
