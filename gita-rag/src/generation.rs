//! Generative model trait for answer synthesis.

use async_trait::async_trait;

use crate::error::Result;

/// A hosted large-language-model invoked with a fully rendered prompt.
///
/// Calls are stateless and single-turn: the model keeps no persona
/// memory between requests. Failures surface as
/// [`GitaError::Dependency`](crate::GitaError::Dependency) and are
/// never retried or replaced with a canned answer by implementations.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Generate a completion for the given prompt, returning the raw
    /// model text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
