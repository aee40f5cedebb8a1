//! Prompt construction and answer synthesis.
//!
//! The prompt is a structured [`PromptTemplate`] with named slots
//! (persona, language directive, numbered passage blocks, query),
//! validated before rendering, so malformed metadata cannot corrupt
//! the prompt silently. Rendering is deterministic.

use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::document::{Answer, SearchResult, SourceDocument};
use crate::error::{GitaError, Result};
use crate::generation::GenerativeModel;

/// The fixed persona preamble. The voice is grounded only in the
/// supplied passages and must not reveal that it is an AI or that
/// passages were provided.
const PERSONA: &str = "You are Lord Krishna. Your tone is that of a wise and loving guide \
speaking to a cherished friend. Your goal is to bring clarity and peace, not to be a \
distant, academic scholar.";

const PERSONA_RULES: &str = "\
- Use simple language that is easy for anyone to understand. Explain profound truths with clarity and high impact.
- Address the seeker directly with warmth, using phrases like 'My dear friend,' 'O, seeker,' or 'Listen with your heart.'
- Your wisdom must come *only* from the 'Relevant Passages' provided. Weave their core message into your own words.
- Never mention that you are an AI or that you were given passages. Speak as if this knowledge is your own divine truth.";

const APOLOGY_ENGLISH: &str = "My dear seeker, I could not find a specific passage for your \
query in my teachings. Perhaps you could ask in another way?";

const APOLOGY_HINDI: &str = "मेरे प्रिय साधक, मुझे आपके प्रश्न के लिए मेरे उपदेशों में कोई विशेष प्रसंग नहीं मिला। संभव है आप किसी और तरह से पूछ सकें?";

/// The language the answer must be written in.
///
/// Any unrecognized request value falls back to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLanguage {
    #[default]
    English,
    Hindi,
}

impl OutputLanguage {
    /// Parse a request value; unrecognized values default to English.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("hindi") {
            OutputLanguage::Hindi
        } else {
            OutputLanguage::English
        }
    }

    /// The prompt rule directing the model's output language.
    fn directive(&self) -> &'static str {
        match self {
            OutputLanguage::English => "Your final response MUST be in English.",
            OutputLanguage::Hindi => {
                "Your final response MUST be in Hindi (using Devanagari script)."
            }
        }
    }

    /// The fixed no-sources apology in this language.
    pub fn apology(&self) -> &'static str {
        match self {
            OutputLanguage::English => APOLOGY_ENGLISH,
            OutputLanguage::Hindi => APOLOGY_HINDI,
        }
    }
}

impl<'de> Deserialize<'de> for OutputLanguage {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(OutputLanguage::from_name(&name))
    }
}

/// One retrieved passage rendered into the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PassageBlock {
    /// 1-based display number, matching retrieval order.
    pub number: usize,
    pub chapter: u32,
    pub verse: u32,
    /// The verse in its original Devanagari script.
    pub shloka_sanskrit: String,
    /// The retrieved commentary text.
    pub commentary: String,
}

impl From<(usize, &SearchResult)> for PassageBlock {
    fn from((i, result): (usize, &SearchResult)) -> Self {
        Self {
            number: i + 1,
            chapter: result.chunk.metadata.chapter,
            verse: result.chunk.metadata.verse,
            shloka_sanskrit: result.chunk.metadata.shloka_sanskrit.clone(),
            commentary: result.chunk.text.clone(),
        }
    }
}

/// The structured prompt with named slots, validated before rendering.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    language: OutputLanguage,
    passages: Vec<PassageBlock>,
    query: String,
}

impl PromptTemplate {
    /// Build a template from retrieved passages in result order.
    pub fn new(query: impl Into<String>, results: &[SearchResult], language: OutputLanguage) -> Self {
        Self {
            language,
            passages: results.iter().enumerate().map(PassageBlock::from).collect(),
            query: query.into(),
        }
    }

    /// Check the slots before rendering.
    ///
    /// # Errors
    ///
    /// Returns [`GitaError::Config`] if the query is blank, there are
    /// no passages, or a passage has empty commentary text. An empty
    /// context must never reach the generative model.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(GitaError::Config("prompt template: query slot is empty".to_string()));
        }
        if self.passages.is_empty() {
            return Err(GitaError::Config("prompt template: no passages to ground on".to_string()));
        }
        if self.passages.iter().any(|p| p.commentary.trim().is_empty()) {
            return Err(GitaError::Config(
                "prompt template: passage with empty commentary".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the full prompt. Deterministic for identical inputs.
    pub fn render(&self) -> Result<String> {
        self.validate()?;

        let mut passages = String::new();
        for p in &self.passages {
            passages.push_str(&format!(
                "Passage {} (from Chapter {}, Verse {}):\nShloka: {}\nCommentary: {}\n\n",
                p.number, p.chapter, p.verse, p.shloka_sanskrit, p.commentary
            ));
        }

        Ok(format!(
            "{PERSONA}\n\n\
             Follow these essential rules:\n\
             - {directive}\n\
             {PERSONA_RULES}\n\n\
             Relevant Passages:\n\
             ---\n\
             {passages}\
             ---\n\
             My cherished friend has this question: \"{query}\"\n\n\
             Now, speak to them with love and clarity.",
            directive = self.language.directive(),
            query = self.query,
        ))
    }
}

/// Assembles the grounded prompt and delegates to the generative model.
pub struct Synthesizer {
    model: Arc<dyn GenerativeModel>,
}

impl Synthesizer {
    /// Create a synthesizer over a generative model.
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Produce the final answer for one query.
    ///
    /// An empty retrieval result short-circuits to the fixed apology
    /// in the requested language with an empty source list; the
    /// generative model is never invoked on that path. Otherwise the
    /// model's raw text is returned along with every retrieved passage
    /// projected into [`SourceDocument`]s, in retrieval order.
    ///
    /// # Errors
    ///
    /// Returns [`GitaError::Dependency`] if the generative model call
    /// fails. The failure is not retried and never falls back to a
    /// canned answer.
    pub async fn synthesize(
        &self,
        query: &str,
        results: &[SearchResult],
        language: OutputLanguage,
    ) -> Result<Answer> {
        if results.is_empty() {
            info!(?language, "no passages retrieved, returning apology without generation");
            return Ok(Answer { answer: language.apology().to_string(), sources: Vec::new() });
        }

        let prompt = PromptTemplate::new(query, results, language).render()?;
        let answer = self.model.generate(&prompt).await?;

        let sources: Vec<SourceDocument> =
            results.iter().map(|r| SourceDocument::from(&r.chunk)).collect();

        info!(source_count = sources.len(), ?language, "synthesized answer");

        Ok(Answer { answer, sources })
    }
}
