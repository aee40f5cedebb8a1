//! Shared application state.

use std::path::PathBuf;
use std::sync::Arc;

use gita_rag::GitaEngine;

use crate::tts::ElevenLabsClient;

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    /// The question-answering engine.
    pub engine: Arc<GitaEngine>,
    /// Text-to-speech client, absent when no ElevenLabs key is
    /// configured. Requests asking for audio then get text only.
    pub tts: Option<Arc<ElevenLabsClient>>,
    /// Directory where generated MP3 files are written.
    pub audio_dir: PathBuf,
    /// Base URL prefixed to audio file paths in responses.
    pub public_base_url: String,
}
