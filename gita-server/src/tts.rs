//! ElevenLabs text-to-speech client.
//!
//! Speech is a best-effort add-on to an answer: callers log a failure
//! and return the text without audio rather than failing the request.

use std::time::Duration;

use gita_rag::{GitaError, Result};
use serde::Serialize;
use serde_json::Value;

const ELEVENLABS_BASE_URL: &str = "https://api.elevenlabs.io/v1";

/// Speech rendering is slower than text generation.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Deep male voice used for the Krishna persona ("Adam").
const VOICE_ID: &str = "pNInz6obpgDQGcFmaJgB";

/// Multilingual model so Hindi answers are voiced correctly.
const MODEL_ID: &str = "eleven_multilingual_v2";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f64,
    similarity_boost: f64,
}

/// Client for the ElevenLabs text-to-speech API.
pub struct ElevenLabsClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    voice_id: String,
}

impl ElevenLabsClient {
    /// Create a client with the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`GitaError::Config`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GitaError::Config("ElevenLabs API key must not be empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| GitaError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            base_url: ELEVENLABS_BASE_URL.to_string(),
            voice_id: VOICE_ID.to_string(),
        })
    }

    /// Override the base URL (for testing against a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the voice.
    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }

    /// Render `text` to MP3 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`GitaError::Audio`] on any transport or API failure.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!("{}/text-to-speech/{}", self.base_url, self.voice_id);
        let body = SpeechRequest {
            text,
            model_id: MODEL_ID,
            voice_settings: VoiceSettings { stability: 0.4, similarity_boost: 0.75 },
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GitaError::Audio(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("detail").map(|d| d.to_string()))
                .unwrap_or_else(|| "no error detail".to_string());
            return Err(GitaError::Audio(format!("API returned {status}: {detail}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GitaError::Audio(format!("failed to read audio body: {e}")))?;
        Ok(bytes.to_vec())
    }
}
