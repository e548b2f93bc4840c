//! Core data types and error definitions for the question answering pipeline.

use crate::auth::AuthError;
use axum::body::Bytes;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while retrieving a remote document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP layer failed before a usable response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Upstream did not answer within the configured timeout.
    #[error("Document request timed out after {0:?}")]
    Timeout(Duration),
    /// Upstream responded with a non-success status.
    #[error("Unexpected response ({status}) from document host: {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the document host.
        status: StatusCode,
        /// Body excerpt associated with the failing response.
        body: String,
    },
    /// Response body exceeded the configured document size limit.
    #[error("Document exceeds the {limit} byte limit")]
    TooLarge {
        /// Maximum accepted size in bytes.
        limit: usize,
    },
    /// Upstream returned a success status with no content.
    #[error("Document host returned an empty body")]
    EmptyBody,
}

/// Errors raised when a document cannot be turned into text at all.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Buffer is not a readable PDF.
    #[error("Document is not a readable PDF: {0}")]
    Unparsable(String),
    /// PDF parsed but has no pages to read.
    #[error("PDF document contains no pages")]
    NoPages,
    /// Blocking extraction task panicked or was cancelled.
    #[error("Extraction task failed: {0}")]
    Task(String),
}

/// Request-level failures. Each variant aborts the whole request.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Access gate refused the credential.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Request shape was invalid (missing document, no questions, bad URL).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Remote document could not be retrieved.
    #[error("Failed to fetch document: {0}")]
    Fetch(#[from] FetchError),
    /// Document bytes could not be read as a PDF.
    #[error("Failed to extract document text: {0}")]
    Extraction(#[from] ExtractionError),
}

impl PipelineError {
    /// Stable machine-readable category for API consumers.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Auth(_) => "unauthorized",
            Self::InvalidInput(_) => "invalid_input",
            Self::Fetch(_) => "fetch_failed",
            Self::Extraction(_) => "extraction_failed",
        }
    }
}

/// Where the document for a request comes from. Exactly one source per request.
#[derive(Debug, Clone)]
pub enum DocumentReference {
    /// Remote document fetched with a single GET.
    Url(Url),
    /// Bytes uploaded with the request.
    Upload(Bytes),
}

impl DocumentReference {
    /// Build a reference from the optional URL and upload supplied by a caller.
    pub fn from_parts(url: Option<String>, upload: Option<Bytes>) -> Result<Self, PipelineError> {
        let url = url
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        match (url, upload) {
            (Some(_), Some(_)) => Err(PipelineError::InvalidInput(
                "provide either a document URL or an uploaded file, not both".into(),
            )),
            (None, None) => Err(PipelineError::InvalidInput(
                "a document URL or an uploaded file is required".into(),
            )),
            (Some(raw), None) => parse_document_url(&raw).map(Self::Url),
            (None, Some(bytes)) if bytes.is_empty() => Err(PipelineError::InvalidInput(
                "uploaded document is empty".into(),
            )),
            (None, Some(bytes)) => Ok(Self::Upload(bytes)),
        }
    }
}

fn parse_document_url(raw: &str) -> Result<Url, PipelineError> {
    let url = Url::parse(raw)
        .map_err(|err| PipelineError::InvalidInput(format!("invalid document URL '{raw}': {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PipelineError::InvalidInput(format!(
            "unsupported document URL scheme '{other}'"
        ))),
    }
}

/// A validated question answering request.
#[derive(Debug, Clone)]
pub struct QuestionRequest {
    /// Source of the policy document.
    pub document: DocumentReference,
    /// Questions in caller order; answers are returned in the same order.
    pub questions: Vec<String>,
}

impl QuestionRequest {
    /// Validate the request shape.
    pub fn new(document: DocumentReference, questions: Vec<String>) -> Result<Self, PipelineError> {
        if questions.is_empty() {
            return Err(PipelineError::InvalidInput(
                "at least one question is required".into(),
            ));
        }
        Ok(Self {
            document,
            questions,
        })
    }
}

/// Raw document bytes acquired for a single request.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Document contents.
    pub bytes: Bytes,
    /// Human-readable origin (URL or `upload`) used in logs.
    pub origin: String,
    /// Hex SHA-256 of the bytes, used to correlate log lines for the same document.
    pub sha256: String,
}

/// Text pulled out of a document, page by page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    pages: Vec<String>,
    full_text: String,
}

impl ExtractedDocument {
    /// Assemble a document from per-page text; `full_text` joins pages with newlines.
    pub fn from_pages(pages: Vec<String>) -> Self {
        let full_text = pages.join("\n");
        Self { pages, full_text }
    }

    /// Per-page text in document order. Failed pages are empty strings.
    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    /// Concatenated text of every page.
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Number of pages, including pages that yielded no text.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Lines of the full text in order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.full_text.lines()
    }
}

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStrategy {
    /// Matched a knowledge base trigger fragment.
    KnowledgeBase,
    /// Matched a line of the document text.
    LexicalSearch,
    /// Nothing matched; the answer is the not-found sentinel.
    NotFound,
}

/// Answer for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerResult {
    /// Question exactly as supplied.
    pub question: String,
    /// Answer text returned to the caller.
    pub answer: String,
    /// Strategy that produced the answer.
    pub strategy: ResolutionStrategy,
}
