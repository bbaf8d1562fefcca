//! In-process collaborators with scripted behavior and call recording.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use docenrich::{
    AdapterError, Adapters, DocumentHandle, DocumentStore, LanguageDetector, TextAnalyzer,
    TextExtractor, Translator,
};

/// How a fake adapter answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    /// Collaborator not configured.
    Unavailable,
    /// Collaborator unreachable.
    Fail,
    Panic,
    /// Waits for a permit from [`FakeServices::release`], then succeeds.
    Gated,
}

pub struct FakeServices {
    text: String,
    language: Option<String>,
    store: Behavior,
    extract: Behavior,
    detect: Behavior,
    translate: Behavior,
    analyze: Behavior,
    gate: Semaphore,
    calls: Mutex<Vec<String>>,
}

impl FakeServices {
    /// All adapters succeed; OCR yields `text`, detection yields `en`.
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            language: Some("en".to_string()),
            store: Behavior::Succeed,
            extract: Behavior::Succeed,
            detect: Behavior::Succeed,
            translate: Behavior::Succeed,
            analyze: Behavior::Succeed,
            gate: Semaphore::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_language(mut self, language: Option<&str>) -> Self {
        self.language = language.map(str::to_string);
        self
    }

    pub fn with_store(mut self, behavior: Behavior) -> Self {
        self.store = behavior;
        self
    }

    pub fn with_extract(mut self, behavior: Behavior) -> Self {
        self.extract = behavior;
        self
    }

    pub fn with_detect(mut self, behavior: Behavior) -> Self {
        self.detect = behavior;
        self
    }

    pub fn with_translate(mut self, behavior: Behavior) -> Self {
        self.translate = behavior;
        self
    }

    pub fn with_analyze(mut self, behavior: Behavior) -> Self {
        self.analyze = behavior;
        self
    }

    /// Lets `permits` gated calls proceed.
    pub fn release(&self, permits: usize) {
        self.gate.add_permits(permits);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, adapter: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.as_str() == adapter)
            .count()
    }

    pub fn adapters(self: &Arc<Self>) -> Adapters {
        Adapters {
            store: self.clone(),
            extractor: self.clone(),
            detector: self.clone(),
            translator: self.clone(),
            analyzer: self.clone(),
        }
    }

    async fn act(&self, adapter: &str, behavior: Behavior) -> Result<(), AdapterError> {
        self.calls.lock().unwrap().push(adapter.to_string());
        match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Unavailable => Err(AdapterError::Unavailable(adapter.to_string())),
            Behavior::Fail => Err(AdapterError::Transport {
                service: adapter.to_string(),
                message: "connection refused".to_string(),
            }),
            Behavior::Panic => panic!("{} exploded", adapter),
            Behavior::Gated => {
                self.gate.acquire().await.unwrap().forget();
                Ok(())
            }
        }
    }
}

#[async_trait]
impl DocumentStore for FakeServices {
    async fn store(&self, _bytes: &[u8], name: &str) -> Result<DocumentHandle, AdapterError> {
        self.act("store", self.store).await?;
        Ok(DocumentHandle::new(format!(
            "https://blob.test/uploads/{}?sig=test",
            name
        )))
    }
}

#[async_trait]
impl TextExtractor for FakeServices {
    async fn extract(&self, _handle: &DocumentHandle) -> Result<String, AdapterError> {
        self.act("extract", self.extract).await?;
        Ok(self.text.clone())
    }
}

#[async_trait]
impl LanguageDetector for FakeServices {
    async fn detect(&self, _text: &str) -> Result<Option<String>, AdapterError> {
        self.act("detect", self.detect).await?;
        Ok(self.language.clone())
    }
}

#[async_trait]
impl Translator for FakeServices {
    async fn translate(&self, text: &str, to: &str) -> Result<String, AdapterError> {
        self.act("translate", self.translate).await?;
        Ok(format!("[{}] {}", to, text))
    }
}

#[async_trait]
impl TextAnalyzer for FakeServices {
    async fn sentiment(&self, text: &str, language: Option<&str>) -> Result<Value, AdapterError> {
        self.act("sentiment", self.analyze).await?;
        Ok(json!({ "documents": [{ "sentiment": "neutral", "language": language, "chars": text.len() }] }))
    }

    async fn key_phrases(
        &self,
        _text: &str,
        _language: Option<&str>,
    ) -> Result<Value, AdapterError> {
        self.act("key_phrases", self.analyze).await?;
        Ok(json!({ "documents": [{ "keyPhrases": ["invoice", "total"] }] }))
    }
}
