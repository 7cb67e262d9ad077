use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{EngineError, SpeechEngine, SynthesisJob, SynthesizedAudio};

/// One scripted outcome for the mock engine.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return this audio.
    Success(Vec<u8>),
    /// Fail in a way the dispatcher is allowed to retry.
    Transient(String),
    /// Fail in a way the dispatcher must not retry.
    Permanent(String),
    /// Never resolve. Exercises the dispatcher's per-attempt timeout.
    Hang,
}

/// A scripted engine for tests. Yields pre-defined outcomes in order,
/// repeating the last one once the script runs out, and counts every call
/// so tests can assert "the backend was never reached".
pub struct MockEngine {
    script: Vec<MockOutcome>,
    calls: AtomicUsize,
}

impl MockEngine {
    pub fn new(script: Vec<MockOutcome>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    /// An engine that always succeeds with the given audio.
    pub fn succeeding(audio: impl Into<Vec<u8>>) -> Self {
        Self::new(vec![MockOutcome::Success(audio.into())])
    }

    /// How many times `synthesize` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechEngine for MockEngine {
    async fn synthesize(&self, _job: &SynthesisJob) -> Result<SynthesizedAudio, EngineError> {
        let i = self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self
            .script
            .get(i)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or(MockOutcome::Permanent("mock script is empty".to_string()));

        match outcome {
            MockOutcome::Success(audio) => Ok(SynthesizedAudio {
                audio,
                format: "mp3".to_string(),
            }),
            MockOutcome::Transient(msg) => Err(EngineError::Transient(msg)),
            MockOutcome::Permanent(msg) => Err(EngineError::Permanent(msg)),
            MockOutcome::Hang => std::future::pending().await,
        }
    }
}
