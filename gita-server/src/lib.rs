//! HTTP layer for the Gita question-answering pipeline.
//!
//! The crate is mostly a thin shell: request validation and error
//! mapping live here, everything else delegates to [`gita_rag`].

pub mod routes;
pub mod state;
pub mod tts;

pub use routes::router;
pub use state::AppState;
pub use tts::ElevenLabsClient;
