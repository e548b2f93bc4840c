//! Question answering service coordinating the access gate, fetch, extraction, and resolution.

use crate::{
    auth::authorize,
    config::Config,
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        extract::{PdfTextExtractor, TextExtractor},
        fetch::{DocumentFetcher, HttpDocumentFetcher, acquire_document},
        knowledge::{KnowledgeBase, KnowledgeBaseError},
        resolver::AnswerResolver,
        types::{AnswerResult, ExtractedDocument, ExtractionError, PipelineError, QuestionRequest},
    },
};
use async_trait::async_trait;
use axum::body::Bytes;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

/// Errors raised while assembling the service at startup.
#[derive(Debug, Error)]
pub enum ServiceInitError {
    /// Knowledge base file could not be loaded.
    #[error("Failed to load knowledge base: {0}")]
    KnowledgeBase(#[from] KnowledgeBaseError),
    /// HTTP client for document downloads could not be built.
    #[error("Failed to build document HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Runs the full question answering pipeline for one request at a time.
///
/// The knowledge base and resolver are built once and shared read-only across requests; each
/// request owns its document bytes and extracted text until the answers are assembled.
pub struct QuestionAnsweringService {
    access_token: String,
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Arc<dyn TextExtractor>,
    resolver: Arc<AnswerResolver>,
    knowledge_base_entries: usize,
    upload_limit: usize,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the pipeline used by the HTTP surface.
#[async_trait]
pub trait QuestionAnsweringApi: Send + Sync {
    /// Check the presented `Authorization` header value.
    fn authorize(&self, credential: Option<&str>) -> Result<(), PipelineError>;

    /// Fetch, extract, and answer every question in order.
    async fn answer(&self, request: QuestionRequest) -> Result<Vec<AnswerResult>, PipelineError>;

    /// Largest accepted request body in bytes.
    fn upload_limit(&self) -> usize;

    /// Number of knowledge base entries loaded at startup.
    fn knowledge_base_entries(&self) -> usize;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl QuestionAnsweringService {
    /// Assemble a service from explicit components.
    pub fn new(
        access_token: impl Into<String>,
        fetcher: Arc<dyn DocumentFetcher>,
        knowledge_base: Arc<KnowledgeBase>,
    ) -> Self {
        let knowledge_base_entries = knowledge_base.len();
        Self {
            access_token: access_token.into(),
            fetcher,
            extractor: Arc::new(PdfTextExtractor::new()),
            resolver: Arc::new(AnswerResolver::new(knowledge_base)),
            knowledge_base_entries,
            upload_limit: crate::config::DEFAULT_MAX_DOCUMENT_BYTES,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Build the production service: HTTP fetcher, PDF extractor, configured knowledge base.
    pub fn from_config(config: &Config) -> Result<Self, ServiceInitError> {
        let knowledge_base = match &config.knowledge_base_path {
            Some(path) => {
                let kb = KnowledgeBase::from_json_file(path)?;
                tracing::info!(
                    path = %path.display(),
                    entries = kb.len(),
                    "Loaded knowledge base file"
                );
                kb
            }
            None => KnowledgeBase::builtin(),
        };
        let fetcher = HttpDocumentFetcher::new(config.fetch_timeout, config.max_document_bytes)?;
        tracing::info!(
            knowledge_base_entries = knowledge_base.len(),
            "Question answering service initialized"
        );
        Ok(Self::new(
            config.api_bearer_token.clone(),
            Arc::new(fetcher),
            Arc::new(knowledge_base),
        )
        .with_upload_limit(config.max_document_bytes))
    }

    /// Replace the text extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the resolver, e.g. with a custom strategy chain.
    pub fn with_resolver(mut self, resolver: AnswerResolver) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Override the request body limit.
    pub fn with_upload_limit(mut self, limit: usize) -> Self {
        self.upload_limit = limit;
        self
    }

    /// Apply the access gate.
    pub fn authorize(&self, credential: Option<&str>) -> Result<(), PipelineError> {
        authorize(credential, &self.access_token).map_err(|error| {
            self.metrics.record_rejected();
            tracing::warn!(error = %error, "Rejected request at access gate");
            PipelineError::from(error)
        })
    }

    /// Gate, then answer.
    pub async fn run(
        &self,
        credential: Option<&str>,
        request: QuestionRequest,
    ) -> Result<Vec<AnswerResult>, PipelineError> {
        self.authorize(credential)?;
        self.answer(request).await
    }

    /// Fetch the document, extract its text, and resolve every question in order.
    pub async fn answer(
        &self,
        request: QuestionRequest,
    ) -> Result<Vec<AnswerResult>, PipelineError> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("answer", %request_id, questions = request.questions.len());
        let outcome = self.answer_inner(request).instrument(span).await;
        if outcome.is_err() {
            self.metrics.record_failed();
        }
        outcome
    }

    async fn answer_inner(
        &self,
        request: QuestionRequest,
    ) -> Result<Vec<AnswerResult>, PipelineError> {
        let QuestionRequest {
            document,
            questions,
        } = request;

        let fetched = acquire_document(self.fetcher.as_ref(), document)
            .await
            .inspect_err(|error| tracing::error!(error = %error, "Document fetch failed"))?;
        tracing::info!(
            origin = %fetched.origin,
            sha256 = %fetched.sha256,
            bytes = fetched.bytes.len(),
            "Document acquired"
        );

        let extracted = self
            .extract(fetched.bytes)
            .await
            .inspect_err(|error| tracing::error!(error = %error, "Document extraction failed"))?;

        let answers = self.resolver.resolve_all(&questions, &extracted);
        self.metrics.record_completed(
            extracted.page_count(),
            answers.iter().map(|answer| answer.strategy),
        );
        tracing::info!(
            pages = extracted.page_count(),
            answers = answers.len(),
            "Questions answered"
        );
        Ok(answers)
    }

    async fn extract(&self, bytes: Bytes) -> Result<ExtractedDocument, ExtractionError> {
        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || extractor.extract(&bytes))
            .await
            .map_err(|err| ExtractionError::Task(err.to_string()))?
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl QuestionAnsweringApi for QuestionAnsweringService {
    fn authorize(&self, credential: Option<&str>) -> Result<(), PipelineError> {
        QuestionAnsweringService::authorize(self, credential)
    }

    async fn answer(&self, request: QuestionRequest) -> Result<Vec<AnswerResult>, PipelineError> {
        QuestionAnsweringService::answer(self, request).await
    }

    fn upload_limit(&self) -> usize {
        self.upload_limit
    }

    fn knowledge_base_entries(&self) -> usize {
        self.knowledge_base_entries
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        QuestionAnsweringService::metrics_snapshot(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::extract::fixtures::pdf_with_pages;
    use crate::processing::resolver::{AnswerStrategy, LexicalLineSearch};
    use crate::processing::types::{DocumentReference, FetchError, ResolutionStrategy};
    use reqwest::{StatusCode, Url};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TOKEN: &str = "test-token";

    struct StubFetcher {
        calls: AtomicUsize,
        response: Result<Bytes, StatusCode>,
    }

    impl StubFetcher {
        fn serving(bytes: Vec<u8>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: Ok(Bytes::from(bytes)),
            })
        }

        fn failing(status: StatusCode) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: Err(status),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DocumentFetcher for StubFetcher {
        async fn fetch(&self, _url: &Url) -> Result<Bytes, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(bytes) => Ok(bytes.clone()),
                Err(status) => Err(FetchError::UnexpectedStatus {
                    status: *status,
                    body: "upstream said no".into(),
                }),
            }
        }
    }

    fn service(fetcher: Arc<StubFetcher>) -> QuestionAnsweringService {
        let kb = KnowledgeBase::new([(
            "grace period for premium payment",
            "Thirty days.",
        )])
        .expect("kb");
        QuestionAnsweringService::new(TOKEN, fetcher, Arc::new(kb))
    }

    fn url_request(questions: &[&str]) -> QuestionRequest {
        let document = DocumentReference::Url(
            Url::parse("https://example.org/policy.pdf").expect("url"),
        );
        QuestionRequest::new(
            document,
            questions.iter().map(|q| q.to_string()).collect(),
        )
        .expect("request")
    }

    #[tokio::test]
    async fn answers_follow_question_order_with_kb_precedence() {
        let fetcher = StubFetcher::serving(pdf_with_pages(&[
            Some("The grace period for premium payment is fifteen days"),
            Some("Dental treatment is excluded"),
        ]));
        let service = service(fetcher.clone());

        let answers = service
            .run(
                Some("Bearer test-token"),
                url_request(&[
                    "Is dental covered?",
                    "What is the grace period for premium payment?",
                    "Xylophone zygote",
                ]),
            )
            .await
            .expect("answers");

        assert_eq!(answers.len(), 3);
        assert_eq!(answers[0].question, "Is dental covered?");
        assert_eq!(answers[1].strategy, ResolutionStrategy::KnowledgeBase);
        assert_eq!(answers[1].answer, "Thirty days.");
        assert_eq!(answers[2].strategy, ResolutionStrategy::NotFound);
        assert_eq!(answers[2].answer, "No exact match found for: Xylophone zygote");
        assert_eq!(fetcher.calls(), 1);

        let snapshot = service.metrics_snapshot();
        assert_eq!(snapshot.requests_completed, 1);
        assert_eq!(snapshot.questions_answered, 3);
        assert_eq!(snapshot.knowledge_base_answers, 1);
        assert_eq!(snapshot.last_page_count, Some(2));
    }

    #[tokio::test]
    async fn rejected_credentials_never_fetch() {
        let fetcher = StubFetcher::serving(pdf_with_pages(&[Some("text")]));
        let service = service(fetcher.clone());

        for credential in [None, Some("Basic test-token"), Some("Bearer wrong")] {
            let error = service
                .run(credential, url_request(&["anything"]))
                .await
                .expect_err("gate rejects");
            assert_eq!(error.category(), "unauthorized");
        }

        assert_eq!(fetcher.calls(), 0);
        assert_eq!(service.metrics_snapshot().requests_rejected, 3);
    }

    #[tokio::test]
    async fn uploads_skip_the_fetcher() {
        let fetcher = StubFetcher::serving(Vec::new());
        let service = service(fetcher.clone());
        let document = DocumentReference::Upload(Bytes::from(pdf_with_pages(&[Some(
            "Room rent is capped",
        )])));
        let request =
            QuestionRequest::new(document, vec!["room limits".into()]).expect("request");

        let answers = service
            .run(Some("Bearer test-token"), request)
            .await
            .expect("answers");

        assert_eq!(answers[0].strategy, ResolutionStrategy::LexicalSearch);
        assert!(answers[0].answer.contains("Room rent is capped"));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_request() {
        let fetcher = StubFetcher::failing(StatusCode::NOT_FOUND);
        let service = service(fetcher.clone());

        let error = service
            .run(Some("Bearer test-token"), url_request(&["q1", "q2"]))
            .await
            .expect_err("fetch fails");

        assert_eq!(error.category(), "fetch_failed");
        assert!(error.to_string().contains("upstream said no"));
        assert_eq!(service.metrics_snapshot().requests_failed, 1);
    }

    #[tokio::test]
    async fn unreadable_document_aborts_request() {
        let fetcher = StubFetcher::serving(b"definitely not a pdf".to_vec());
        let service = service(fetcher);

        let error = service
            .run(Some("Bearer test-token"), url_request(&["q1"]))
            .await
            .expect_err("extraction fails");

        assert_eq!(error.category(), "extraction_failed");
    }

    struct FixedExtractor(ExtractedDocument);

    impl TextExtractor for FixedExtractor {
        fn extract(&self, _bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn injected_extractor_is_used() {
        let fetcher = StubFetcher::serving(b"ignored".to_vec());
        let service = service(fetcher).with_extractor(Arc::new(FixedExtractor(
            ExtractedDocument::from_pages(vec!["Ambulance cover up to 2000".into()]),
        )));

        let answers = service
            .answer(url_request(&["ambulance"]))
            .await
            .expect("answers");

        assert_eq!(answers[0].answer, "Ambulance cover up to 2000");
    }

    struct PageCount;

    impl AnswerStrategy for PageCount {
        fn kind(&self) -> ResolutionStrategy {
            ResolutionStrategy::KnowledgeBase
        }

        fn try_answer(&self, question: &str, document: &ExtractedDocument) -> Option<String> {
            question
                .to_lowercase()
                .contains("how many pages")
                .then(|| format!("{} pages", document.page_count()))
        }
    }

    #[tokio::test]
    async fn injected_strategy_chain_replaces_default_resolution() {
        let fetcher = StubFetcher::serving(pdf_with_pages(&[
            Some("The grace period for premium payment is fifteen days"),
            Some("Schedule of benefits"),
        ]));
        let strategies: Vec<Box<dyn AnswerStrategy>> =
            vec![Box::new(PageCount), Box::new(LexicalLineSearch)];
        let service =
            service(fetcher).with_resolver(AnswerResolver::with_strategies(strategies));

        let answers = service
            .run(
                Some("Bearer test-token"),
                url_request(&[
                    "How many pages does the policy have?",
                    "What is the grace period for premium payment?",
                    "Xylophone zygote",
                ]),
            )
            .await
            .expect("answers");

        assert_eq!(answers[0].answer, "2 pages");
        assert_eq!(answers[0].strategy, ResolutionStrategy::KnowledgeBase);
        // The service's knowledge base is bypassed by the injected chain.
        assert_eq!(answers[1].strategy, ResolutionStrategy::LexicalSearch);
        assert_eq!(
            answers[1].answer,
            "The grace period for premium payment is fifteen days"
        );
        assert_eq!(answers[2].strategy, ResolutionStrategy::NotFound);
    }
}
