//! Answer resolution: knowledge base first, then lexical line search, then the not-found
//! sentinel.

use super::knowledge::KnowledgeBase;
use super::types::{AnswerResult, ExtractedDocument, ResolutionStrategy};
use std::sync::Arc;

/// A way of answering a question from the knowledge base or document text.
pub trait AnswerStrategy: Send + Sync {
    /// Outcome recorded when this strategy produces the answer.
    fn kind(&self) -> ResolutionStrategy;

    /// Produce an answer, or `None` to defer to the next strategy.
    fn try_answer(&self, question: &str, document: &ExtractedDocument) -> Option<String>;
}

/// Looks the question up in the knowledge base.
pub struct KnowledgeBaseLookup {
    knowledge_base: Arc<KnowledgeBase>,
}

impl KnowledgeBaseLookup {
    /// Wrap a shared knowledge base.
    pub fn new(knowledge_base: Arc<KnowledgeBase>) -> Self {
        Self { knowledge_base }
    }
}

impl AnswerStrategy for KnowledgeBaseLookup {
    fn kind(&self) -> ResolutionStrategy {
        ResolutionStrategy::KnowledgeBase
    }

    fn try_answer(&self, question: &str, _document: &ExtractedDocument) -> Option<String> {
        self.knowledge_base
            .lookup(question)
            .map(|entry| entry.canonical_answer.clone())
    }
}

/// Returns the first document line containing any question token.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalLineSearch;

impl AnswerStrategy for LexicalLineSearch {
    fn kind(&self) -> ResolutionStrategy {
        ResolutionStrategy::LexicalSearch
    }

    fn try_answer(&self, question: &str, document: &ExtractedDocument) -> Option<String> {
        let tokens: Vec<String> = question
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        if tokens.is_empty() {
            return None;
        }
        document
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .find(|line| {
                let lowered = line.to_lowercase();
                tokens.iter().any(|token| lowered.contains(token.as_str()))
            })
            .map(str::to_string)
    }
}

/// Sentinel answer for a question nothing could match.
pub fn not_found_answer(question: &str) -> String {
    format!("No exact match found for: {question}")
}

/// Applies strategies in declared order and falls back to the not-found sentinel.
pub struct AnswerResolver {
    strategies: Vec<Box<dyn AnswerStrategy>>,
}

impl AnswerResolver {
    /// Resolver with a custom strategy chain; the not-found fallback still applies after it.
    pub fn with_strategies(strategies: Vec<Box<dyn AnswerStrategy>>) -> Self {
        Self { strategies }
    }

    /// Standard chain: knowledge base lookup followed by lexical line search.
    pub fn new(knowledge_base: Arc<KnowledgeBase>) -> Self {
        let strategies: Vec<Box<dyn AnswerStrategy>> = vec![
            Box::new(KnowledgeBaseLookup::new(knowledge_base)),
            Box::new(LexicalLineSearch),
        ];
        Self::with_strategies(strategies)
    }

    /// Resolve a single question. Never fails.
    pub fn resolve(&self, question: &str, document: &ExtractedDocument) -> AnswerResult {
        let (answer, strategy) = self
            .strategies
            .iter()
            .find_map(|strategy| {
                strategy
                    .try_answer(question, document)
                    .map(|answer| (answer, strategy.kind()))
            })
            .unwrap_or_else(|| (not_found_answer(question), ResolutionStrategy::NotFound));

        AnswerResult {
            question: question.to_string(),
            answer,
            strategy,
        }
    }

    /// Resolve every question against the same document; `results[i]` answers `questions[i]`.
    pub fn resolve_all(
        &self,
        questions: &[String],
        document: &ExtractedDocument,
    ) -> Vec<AnswerResult> {
        questions
            .iter()
            .map(|question| self.resolve(question, document))
            .collect()
    }
}
