//! HTTP surface for the policy QA service.
//!
//! - `POST /hackrx/run` – Answer questions about a policy PDF. Requires
//!   `Authorization: Bearer <token>`. Accepts JSON (`{"documents": "<url>", "questions": [..]}`)
//!   or `multipart/form-data` with a `file` part and one or more `questions` parts. Returns
//!   `{"answers": [..]}` in question order.
//! - `GET /health` – Liveness probe with the loaded knowledge base size.
//! - `GET /metrics` – Request and answer counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! The bearer token is checked before the request body is read, so a rejected request never
//! buffers an upload or triggers a download.

use crate::processing::{DocumentReference, PipelineError, QuestionAnsweringApi, QuestionRequest};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Fixed detail returned for every access gate failure.
const UNAUTHORIZED_DETAIL: &str = "Missing or invalid Authorization header";

/// Build the HTTP router exposing the question answering API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: QuestionAnsweringApi + 'static,
{
    let body_limit = service.upload_limit();
    Router::new()
        .route("/hackrx/run", post(run_questions::<S>))
        .route("/health", get(health::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

/// JSON request body for `POST /hackrx/run`.
#[derive(Deserialize)]
struct RunRequest {
    /// URL of the policy PDF.
    #[serde(default)]
    documents: Option<String>,
    /// Questions to answer, in order.
    #[serde(default)]
    questions: Vec<String>,
}

/// Success response for `POST /hackrx/run`.
#[derive(Serialize)]
struct RunResponse {
    answers: Vec<String>,
}

/// Answer questions about a policy document.
async fn run_questions<S>(
    State(service): State<Arc<S>>,
    request: Request,
) -> Result<Json<RunResponse>, AppError>
where
    S: QuestionAnsweringApi,
{
    let credential = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_string());
    service.authorize(credential.as_deref())?;

    let question_request = if is_multipart(request.headers()) {
        read_multipart(request).await?
    } else {
        read_json(request).await?
    };
    let question_count = question_request.questions.len();

    let answers = service.answer(question_request).await?;
    tracing::info!(questions = question_count, "Run request completed");
    Ok(Json(RunResponse {
        answers: answers.into_iter().map(|result| result.answer).collect(),
    }))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().starts_with("multipart/form-data"))
}

async fn read_json(request: Request) -> Result<QuestionRequest, PipelineError> {
    let Json(RunRequest {
        documents,
        questions,
    }) = Json::<RunRequest>::from_request(request, &())
        .await
        .map_err(|rejection| PipelineError::InvalidInput(rejection.body_text()))?;
    let document = DocumentReference::from_parts(documents, None)?;
    QuestionRequest::new(document, questions)
}

async fn read_multipart(request: Request) -> Result<QuestionRequest, PipelineError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| PipelineError::InvalidInput(rejection.body_text()))?;

    let mut url = None;
    let mut upload: Option<Bytes> = None;
    let mut questions = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| PipelineError::InvalidInput(err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" | "document" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| PipelineError::InvalidInput(err.body_text()))?;
                upload = Some(bytes);
            }
            "documents" | "document_url" => {
                url = Some(read_text_field(field).await?);
            }
            "questions" | "question" => {
                let value = read_text_field(field).await?;
                questions.extend(parse_question_field(&value));
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let document = DocumentReference::from_parts(url, upload)?;
    QuestionRequest::new(document, questions)
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
) -> Result<String, PipelineError> {
    field
        .text()
        .await
        .map_err(|err| PipelineError::InvalidInput(err.body_text()))
}

/// A `questions` part holds either a JSON array of questions or a single question.
fn parse_question_field(value: &str) -> Vec<String> {
    let trimmed = value.trim();
    if trimmed.starts_with('[') {
        if let Ok(list) = serde_json::from_str::<Vec<String>>(trimmed) {
            return list;
        }
    }
    if trimmed.is_empty() {
        Vec::new()
    } else {
        vec![value.to_string()]
    }
}

/// Response body for `GET /health`.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    knowledge_base_entries: usize,
}

async fn health<S>(State(service): State<Arc<S>>) -> Json<HealthResponse>
where
    S: QuestionAnsweringApi,
{
    Json(HealthResponse {
        status: "ok",
        knowledge_base_entries: service.knowledge_base_entries(),
    })
}

/// Return a snapshot of request and answer counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: QuestionAnsweringApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "run",
                method: "POST",
                path: "/hackrx/run",
                description: "Answer questions about a policy PDF given by URL or multipart upload. Requires a bearer token. Response returns { \"answers\": [string] } in question order.",
                request_example: Some(json!({
                    "documents": "https://example.org/policy.pdf",
                    "questions": [
                        "What is the grace period for premium payment?",
                        "Does this policy cover maternity expenses?"
                    ]
                })),
            },
            CommandDescriptor {
                name: "health",
                method: "GET",
                path: "/health",
                description: "Liveness probe reporting the number of knowledge base entries.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return request and answer counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

struct AppError(PipelineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = self.0;
        let status = status_for(&error);
        let detail = match &error {
            PipelineError::Auth(_) => UNAUTHORIZED_DETAIL.to_string(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %error, "Run request failed");
        } else {
            tracing::info!(status = status.as_u16(), error = %error, "Run request refused");
        }

        let body = Json(json!({
            "error": error.category(),
            "detail": detail,
        }));
        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

fn status_for(error: &PipelineError) -> StatusCode {
    use crate::processing::FetchError;

    match error {
        PipelineError::Auth(_) => StatusCode::UNAUTHORIZED,
        PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        PipelineError::Fetch(FetchError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
        PipelineError::Fetch(_) => StatusCode::BAD_GATEWAY,
        PipelineError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self(inner)
    }
}
