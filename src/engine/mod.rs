//! The backend capability seam.
//!
//! A [`SpeechEngine`] is anything that can turn text into audio: a remote
//! serverless endpoint in production, a scripted mock in tests. The
//! dispatcher only ever sees this trait, so new engines plug in through
//! the registry without touching routing code.

pub mod http;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// How a backend call failed. The dispatcher retries `Transient` failures
/// up to its configured attempt budget; `Permanent` failures are returned
/// immediately.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("transient backend failure: {0}")]
    Transient(String),

    #[error("backend failure: {0}")]
    Permanent(String),
}

/// One synthesis request as a backend engine sees it: validated text plus
/// the caller's optional rendering parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisJob {
    pub text: String,
    pub voice: Option<String>,
    pub speed: Option<f64>,
    pub language: Option<String>,
    pub format: Option<String>,
}

/// Audio produced by a backend engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub audio: Vec<u8>,
    pub format: String,
}

/// A named text-to-speech backend reachable through the registry.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn synthesize(&self, job: &SynthesisJob) -> Result<SynthesizedAudio, EngineError>;
}
