use crate::processing::ResolutionStrategy;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing request and answer activity.
#[derive(Default)]
pub struct PipelineMetrics {
    requests_completed: AtomicU64,
    requests_rejected: AtomicU64,
    requests_failed: AtomicU64,
    questions_answered: AtomicU64,
    knowledge_base_answers: AtomicU64,
    lexical_answers: AtomicU64,
    not_found_answers: AtomicU64,
    last_page_count: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request turned away by the access gate.
    pub fn record_rejected(&self) {
        self.requests_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that failed during fetch or extraction.
    pub fn record_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed request, its page count, and how each question was answered.
    pub fn record_completed<I>(&self, page_count: usize, strategies: I)
    where
        I: IntoIterator<Item = ResolutionStrategy>,
    {
        self.requests_completed.fetch_add(1, Ordering::Relaxed);
        self.last_page_count
            .store(page_count as u64, Ordering::Relaxed);
        for strategy in strategies {
            self.questions_answered.fetch_add(1, Ordering::Relaxed);
            let counter = match strategy {
                ResolutionStrategy::KnowledgeBase => &self.knowledge_base_answers,
                ResolutionStrategy::LexicalSearch => &self.lexical_answers,
                ResolutionStrategy::NotFound => &self.not_found_answers,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let completed = self.requests_completed.load(Ordering::Relaxed);
        MetricsSnapshot {
            requests_completed: completed,
            requests_rejected: self.requests_rejected.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
            knowledge_base_answers: self.knowledge_base_answers.load(Ordering::Relaxed),
            lexical_answers: self.lexical_answers.load(Ordering::Relaxed),
            not_found_answers: self.not_found_answers.load(Ordering::Relaxed),
            last_page_count: (completed > 0)
                .then(|| self.last_page_count.load(Ordering::Relaxed)),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Requests that produced an answer list.
    pub requests_completed: u64,
    /// Requests rejected by the access gate.
    pub requests_rejected: u64,
    /// Requests aborted by a fetch, extraction, or input error.
    pub requests_failed: u64,
    /// Total questions answered across completed requests.
    pub questions_answered: u64,
    /// Answers served from the knowledge base.
    pub knowledge_base_answers: u64,
    /// Answers served by lexical line search.
    pub lexical_answers: u64,
    /// Questions that fell through to the not-found sentinel.
    pub not_found_answers: u64,
    /// Page count of the most recently processed document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_page_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_requests_and_strategies() {
        let metrics = PipelineMetrics::new();
        metrics.record_completed(
            3,
            [
                ResolutionStrategy::KnowledgeBase,
                ResolutionStrategy::LexicalSearch,
                ResolutionStrategy::NotFound,
                ResolutionStrategy::KnowledgeBase,
            ],
        );
        metrics.record_completed(7, [ResolutionStrategy::NotFound]);
        metrics.record_rejected();
        metrics.record_failed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_completed, 2);
        assert_eq!(snapshot.requests_rejected, 1);
        assert_eq!(snapshot.requests_failed, 1);
        assert_eq!(snapshot.questions_answered, 5);
        assert_eq!(snapshot.knowledge_base_answers, 2);
        assert_eq!(snapshot.lexical_answers, 1);
        assert_eq!(snapshot.not_found_answers, 2);
        assert_eq!(snapshot.last_page_count, Some(7));
    }

    #[test]
    fn empty_snapshot_has_no_page_count() {
        let snapshot = PipelineMetrics::new().snapshot();
        assert_eq!(snapshot.requests_completed, 0);
        assert_eq!(snapshot.last_page_count, None);
    }
}
