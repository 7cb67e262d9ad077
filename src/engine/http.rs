use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

use super::{EngineError, SpeechEngine, SynthesisJob, SynthesizedAudio};

/// A TTS backend spoken to over HTTP with the serverless JSON envelope:
/// POST `{"input": {...}}`, expect `{"output": {"audio_base64", ...}}`.
pub struct HttpEngine {
    url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpEngine {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            url: url.into(),
            api_key,
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn classify_status(status: reqwest::StatusCode, body: &str) -> EngineError {
        // 5xx means the engine itself is struggling and a retry may land
        // on a healthy worker. Anything else won't improve by retrying.
        if status.is_server_error() {
            EngineError::Transient(format!("engine returned {status}: {body}"))
        } else {
            EngineError::Permanent(format!("engine returned {status}: {body}"))
        }
    }

    fn classify_send_error(e: &reqwest::Error) -> EngineError {
        if e.is_timeout() || e.is_connect() {
            EngineError::Transient(format!("engine unreachable: {e}"))
        } else {
            EngineError::Permanent(format!("request failed: {e}"))
        }
    }
}

#[async_trait]
impl SpeechEngine for HttpEngine {
    async fn synthesize(&self, job: &SynthesisJob) -> Result<SynthesizedAudio, EngineError> {
        let body = Envelope {
            input: JobInput {
                text: &job.text,
                voice: job.voice.as_deref(),
                speed: job.speed,
                language: job.language.as_deref(),
                format: job.format.as_deref(),
            },
        };

        let mut req = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| Self::classify_send_error(&e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &text));
        }

        let reply: Reply = resp
            .json()
            .await
            .map_err(|e| EngineError::Permanent(format!("unparseable engine response: {e}")))?;

        let output = reply
            .output
            .ok_or_else(|| EngineError::Permanent("engine response has no output".to_string()))?;

        let audio = BASE64
            .decode(output.audio_base64.as_bytes())
            .map_err(|e| EngineError::Permanent(format!("invalid audio encoding: {e}")))?;

        Ok(SynthesizedAudio {
            audio,
            format: output.audio_format.unwrap_or_else(|| "mp3".to_string()),
        })
    }
}

// --- wire types ---

#[derive(Serialize)]
struct Envelope<'a> {
    input: JobInput<'a>,
}

#[derive(Serialize)]
struct JobInput<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    voice: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

#[derive(Deserialize)]
struct Reply {
    output: Option<Output>,
}

#[derive(Deserialize)]
struct Output {
    audio_base64: String,
    audio_format: Option<String>,
}
