//! The question-answering engine facade.

use std::sync::Arc;

use crate::config::Config;
use crate::document::Answer;
use crate::embedding::EmbeddingProvider;
use crate::error::{GitaError, Result};
use crate::generation::GenerativeModel;
use crate::retriever::Retriever;
use crate::synthesize::{OutputLanguage, Synthesizer};
use crate::vectorstore::VectorStore;

/// Retrieval plus synthesis behind one entry point.
///
/// Constructed once at process startup with its dependencies injected;
/// there is no global state and no lazy initialization hidden in the
/// request path (the retriever's one-shot manifest check is the single
/// synchronization point). Shared freely across concurrent requests.
///
/// # Example
///
/// ```rust,ignore
/// use gita_rag::{Config, GitaEngine, OutputLanguage};
///
/// let engine = GitaEngine::new(embedder, store, model, Config::default());
/// let answer = engine
///     .ask("What is selfless action?", "Swami Sivananda", OutputLanguage::English)
///     .await?;
/// ```
pub struct GitaEngine {
    retriever: Retriever,
    synthesizer: Synthesizer,
    config: Config,
}

impl GitaEngine {
    /// Create an engine from injected collaborators.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        model: Arc<dyn GenerativeModel>,
        config: Config,
    ) -> Self {
        let retriever = Retriever::new(embedder, store, config.collection.clone());
        let synthesizer = Synthesizer::new(model);
        Self { retriever, synthesizer, config }
    }

    /// Answer one question as Lord Krishna, grounded in the named
    /// author's commentaries.
    ///
    /// Zero retrieved passages yields the fixed apology answer with an
    /// empty source list, as a success rather than an error.
    ///
    /// # Errors
    ///
    /// - [`GitaError::Input`] if `query` or `author` is blank.
    /// - Retrieval and synthesis errors propagate unchanged.
    pub async fn ask(
        &self,
        query: &str,
        author: &str,
        language: OutputLanguage,
    ) -> Result<Answer> {
        if query.trim().is_empty() {
            return Err(GitaError::Input("query must not be empty".to_string()));
        }
        if author.trim().is_empty() {
            return Err(GitaError::Input("author must not be empty".to_string()));
        }

        let results = self.retriever.retrieve(query, author, self.config.top_k).await?;
        self.synthesizer.synthesize(query, &results, language).await
    }
}
