//! Job status state machine.

use serde::{Deserialize, Serialize};

/// Status of a job as it moves through the pipeline.
///
/// The non-terminal variants are ordered: each is entered only from its
/// immediate predecessor. `Error` is reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Persisting,
    ExtractingText,
    DetectingLanguage,
    Translating,
    AnalyzingSentiment,
    ExtractingKeyPhrases,
    Done,
    Error,
}

impl JobStatus {
    /// The fixed pipeline order, from `Queued` to `Done`.
    pub const PIPELINE: [JobStatus; 8] = [
        JobStatus::Queued,
        JobStatus::Persisting,
        JobStatus::ExtractingText,
        JobStatus::DetectingLanguage,
        JobStatus::Translating,
        JobStatus::AnalyzingSentiment,
        JobStatus::ExtractingKeyPhrases,
        JobStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Persisting => "persisting",
            JobStatus::ExtractingText => "extracting_text",
            JobStatus::DetectingLanguage => "detecting_language",
            JobStatus::Translating => "translating",
            JobStatus::AnalyzingSentiment => "analyzing_sentiment",
            JobStatus::ExtractingKeyPhrases => "extracting_key_phrases",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    /// Returns the status that follows this one on the success path.
    pub fn next(&self) -> Option<JobStatus> {
        match self {
            JobStatus::Queued => Some(JobStatus::Persisting),
            JobStatus::Persisting => Some(JobStatus::ExtractingText),
            JobStatus::ExtractingText => Some(JobStatus::DetectingLanguage),
            JobStatus::DetectingLanguage => Some(JobStatus::Translating),
            JobStatus::Translating => Some(JobStatus::AnalyzingSentiment),
            JobStatus::AnalyzingSentiment => Some(JobStatus::ExtractingKeyPhrases),
            JobStatus::ExtractingKeyPhrases => Some(JobStatus::Done),
            JobStatus::Done | JobStatus::Error => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }

    /// Returns true if `to` may directly follow `self`.
    pub fn can_transition_to(&self, to: JobStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == JobStatus::Error || self.next() == Some(to)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
