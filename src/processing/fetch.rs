//! Document acquisition: remote download or upload pass-through.

use super::types::{DocumentReference, FetchError, FetchedDocument};
use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::{Client, Url};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Longest upstream error body echoed back in a [`FetchError::UnexpectedStatus`].
const ERROR_BODY_EXCERPT: usize = 512;

/// Interface implemented by remote document sources.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Retrieve the document at `url` with a single attempt.
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError>;
}

/// Fetches documents over HTTP(S) with a bounded timeout and size limit.
pub struct HttpDocumentFetcher {
    client: Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpDocumentFetcher {
    /// Build a fetcher whose requests give up after `timeout` and reject bodies over `max_bytes`.
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("policy-qa/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        tracing::debug!(
            timeout_secs = timeout.as_secs_f32(),
            max_bytes,
            "Initialized document HTTP client"
        );
        Ok(Self {
            client,
            timeout,
            max_bytes,
        })
    }

    fn map_transport_error(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Http(error)
        }
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_EXCERPT).collect();
            let error = FetchError::UnexpectedStatus { status, body };
            tracing::error!(url = %url, error = %error, "Document fetch failed");
            return Err(error);
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
        }

        let mut buffer = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|err| self.map_transport_error(err))?
        {
            if buffer.len() + chunk.len() > self.max_bytes {
                return Err(FetchError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            buffer.extend_from_slice(&chunk);
        }

        if buffer.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        tracing::debug!(url = %url, bytes = buffer.len(), "Document downloaded");
        Ok(Bytes::from(buffer))
    }
}

/// Resolve a document reference to bytes. Uploads never touch the network.
pub async fn acquire_document(
    fetcher: &dyn DocumentFetcher,
    reference: DocumentReference,
) -> Result<FetchedDocument, FetchError> {
    let (bytes, origin) = match reference {
        DocumentReference::Url(url) => {
            let bytes = fetcher.fetch(&url).await?;
            (bytes, url.to_string())
        }
        DocumentReference::Upload(bytes) => (bytes, "upload".to_string()),
    };
    let sha256 = hex::encode(Sha256::digest(&bytes));
    Ok(FetchedDocument {
        bytes,
        origin,
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fetcher(timeout: Duration, max_bytes: usize) -> HttpDocumentFetcher {
        HttpDocumentFetcher::new(timeout, max_bytes).expect("client")
    }

    #[tokio::test]
    async fn downloads_document_bytes() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/policy.pdf");
                then.status(200)
                    .header("content-type", "application/pdf")
                    .body("%PDF-1.5 body");
            })
            .await;

        let url = Url::parse(&server.url("/policy.pdf")).expect("url");
        let bytes = fetcher(Duration::from_secs(5), 1024)
            .fetch(&url)
            .await
            .expect("fetch succeeds");

        assert_eq!(&bytes[..], b"%PDF-1.5 body");
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/missing.pdf");
                then.status(404).body("not here");
            })
            .await;

        let url = Url::parse(&server.url("/missing.pdf")).expect("url");
        let error = fetcher(Duration::from_secs(5), 1024)
            .fetch(&url)
            .await
            .expect_err("404 fails");

        match error {
            FetchError::UnexpectedStatus { status, body } => {
                assert_eq!(status.as_u16(), 404);
                assert_eq!(body, "not here");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/slow.pdf");
                then.status(200)
                    .body("%PDF")
                    .delay(Duration::from_millis(1500));
            })
            .await;

        let url = Url::parse(&server.url("/slow.pdf")).expect("url");
        let error = fetcher(Duration::from_millis(100), 1024)
            .fetch(&url)
            .await
            .expect_err("timeout");

        assert!(matches!(error, FetchError::Timeout(_)), "got {error:?}");
    }

    #[tokio::test]
    async fn oversized_and_empty_bodies_are_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/big.pdf");
                then.status(200).body(vec![b'x'; 64]);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/empty.pdf");
                then.status(200);
            })
            .await;

        let client = fetcher(Duration::from_secs(5), 16);
        let big = Url::parse(&server.url("/big.pdf")).expect("url");
        assert!(matches!(
            client.fetch(&big).await,
            Err(FetchError::TooLarge { limit: 16 })
        ));

        let empty = Url::parse(&server.url("/empty.pdf")).expect("url");
        assert!(matches!(
            client.fetch(&empty).await,
            Err(FetchError::EmptyBody)
        ));
    }

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DocumentFetcher for CountingFetcher {
        async fn fetch(&self, _url: &Url) -> Result<Bytes, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from_static(b"remote"))
        }
    }

    #[tokio::test]
    async fn uploads_pass_through_without_fetching() {
        let fetcher = CountingFetcher {
            calls: AtomicUsize::new(0),
        };
        let document = acquire_document(
            &fetcher,
            DocumentReference::Upload(Bytes::from_static(b"uploaded")),
        )
        .await
        .expect("upload accepted");

        assert_eq!(&document.bytes[..], b"uploaded");
        assert_eq!(document.origin, "upload");
        assert_eq!(document.sha256.len(), 64);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);

        let url = Url::parse("https://example.org/policy.pdf").expect("url");
        let remote = acquire_document(&fetcher, DocumentReference::Url(url))
            .await
            .expect("remote");
        assert_eq!(remote.origin, "https://example.org/policy.pdf");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
