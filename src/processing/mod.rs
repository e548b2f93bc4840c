//! Question answering pipeline: document fetch, text extraction, and answer resolution.

pub mod extract;
pub mod fetch;
pub mod knowledge;
pub mod normalize;
pub mod resolver;
mod service;
pub mod types;

pub use extract::{PdfTextExtractor, TextExtractor};
pub use fetch::{DocumentFetcher, HttpDocumentFetcher};
pub use knowledge::{KnowledgeBase, KnowledgeBaseError, KnowledgeEntry};
pub use resolver::{AnswerResolver, AnswerStrategy, KnowledgeBaseLookup, LexicalLineSearch};
pub use service::{QuestionAnsweringApi, QuestionAnsweringService, ServiceInitError};
pub use types::{
    AnswerResult, DocumentReference, ExtractedDocument, ExtractionError, FetchError,
    FetchedDocument, PipelineError, QuestionRequest, ResolutionStrategy,
};
