//! Answer knowledge base: ordered trigger fragments mapped to canonical answers.

use super::normalize::normalize_phrase;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Errors raised while building a knowledge base.
#[derive(Debug, Error)]
pub enum KnowledgeBaseError {
    /// An entry's trigger fragment was blank after normalization.
    #[error("knowledge base entry {index} has an empty trigger fragment")]
    EmptyFragment {
        /// Zero-based position of the offending entry.
        index: usize,
    },
    /// Knowledge base file could not be read.
    #[error("failed to read knowledge base file {path}: {source}")]
    Io {
        /// Path that failed to open.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Knowledge base file was not a JSON array of entries.
    #[error("failed to parse knowledge base file {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// A single trigger fragment and the answer it produces.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KnowledgeEntry {
    /// Normalized fragment searched for inside questions.
    pub trigger_fragment: String,
    /// Answer returned when the fragment matches.
    pub canonical_answer: String,
}

/// Immutable, ordered table of knowledge entries. The first matching entry wins.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    /// Build a knowledge base from `(fragment, answer)` pairs, preserving their order.
    pub fn new<I, F, A>(pairs: I) -> Result<Self, KnowledgeBaseError>
    where
        I: IntoIterator<Item = (F, A)>,
        F: AsRef<str>,
        A: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .enumerate()
            .map(|(index, (fragment, answer))| {
                let trigger_fragment = normalize_phrase(fragment.as_ref());
                if trigger_fragment.is_empty() {
                    return Err(KnowledgeBaseError::EmptyFragment { index });
                }
                Ok(KnowledgeEntry {
                    trigger_fragment,
                    canonical_answer: answer.into(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Knowledge base populated with the built-in policy answers.
    pub fn builtin() -> Self {
        let entries = BUILTIN_ENTRIES
            .iter()
            .map(|(fragment, answer)| KnowledgeEntry {
                trigger_fragment: normalize_phrase(fragment),
                canonical_answer: (*answer).to_string(),
            })
            .collect();
        Self { entries }
    }

    /// Load a knowledge base from a JSON array of `{trigger_fragment, canonical_answer}` objects.
    pub fn from_json_file(path: &Path) -> Result<Self, KnowledgeBaseError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| KnowledgeBaseError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|err| match err {
            KnowledgeBaseError::Parse { source, .. } => KnowledgeBaseError::Parse {
                path: display,
                source,
            },
            other => other,
        })
    }

    /// Parse a knowledge base from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, KnowledgeBaseError> {
        let entries: Vec<KnowledgeEntry> =
            serde_json::from_str(raw).map_err(|source| KnowledgeBaseError::Parse {
                path: "<inline>".into(),
                source,
            })?;
        Self::new(
            entries
                .into_iter()
                .map(|entry| (entry.trigger_fragment, entry.canonical_answer)),
        )
    }

    /// Return the first entry whose fragment appears in the question, ignoring case.
    pub fn lookup(&self, question: &str) -> Option<&KnowledgeEntry> {
        let normalized = normalize_phrase(question);
        self.entries
            .iter()
            .find(|entry| normalized.contains(&entry.trigger_fragment))
    }

    /// Entries in match order.
    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// More specific fragments precede the general ones they contain.
const BUILTIN_ENTRIES: &[(&str, &str)] = &[
    (
        "grace period for premium payment",
        "A grace period of thirty days is provided for premium payment after the due date to renew or continue the policy without losing continuity benefits.",
    ),
    (
        "waiting period for pre-existing diseases",
        "There is a waiting period of thirty-six (36) months of continuous coverage from the first policy inception for pre-existing diseases and their direct complications to be covered.",
    ),
    (
        "waiting period for cataract surgery",
        "The policy has a specific waiting period of two (2) years for cataract surgery.",
    ),
    (
        "maternity expenses",
        "Yes, the policy covers maternity expenses, including childbirth and lawful medical termination of pregnancy. To be eligible, the female insured person must have been continuously covered for at least 24 months. The benefit is limited to two deliveries or terminations during the policy period.",
    ),
    (
        "organ donor",
        "Yes, the policy indemnifies the medical expenses for the organ donor's hospitalization for the purpose of harvesting the organ, provided the organ is for an insured person and the donation complies with the Transplantation of Human Organs Act, 1994.",
    ),
    (
        "no claim discount",
        "A No Claim Discount of 5% on the base premium is offered on renewal for a one-year policy term if no claims were made in the preceding year. The maximum aggregate NCD is capped at 5% of the total base premium.",
    ),
    (
        "preventive health check",
        "Yes, the policy reimburses expenses for health check-ups at the end of every block of two continuous policy years, provided the policy has been renewed without a break, subject to the limits specified in the Table of Benefits.",
    ),
    (
        "define a 'hospital'",
        "A hospital is defined as an institution with at least 10 inpatient beds (in towns with a population below ten lakhs) or 15 beds (in all other places), with qualified nursing staff and medical practitioners available 24/7, a fully equipped operation theatre, and daily records of patients.",
    ),
    (
        "ayush",
        "The policy covers medical expenses for inpatient treatment under Ayurveda, Yoga, Naturopathy, Unani, Siddha, and Homeopathy systems up to the Sum Insured limit, provided the treatment is taken in an AYUSH Hospital.",
    ),
    (
        "room rent",
        "Yes, for Plan A, the daily room rent is capped at 1% of the Sum Insured, and ICU charges are capped at 2% of the Sum Insured. These limits do not apply if the treatment is for a listed procedure in a Preferred Provider Network (PPN).",
    ),
    (
        "waiting period",
        "Specific waiting periods apply: thirty days from inception for illnesses, thirty-six months for pre-existing diseases, and two years for listed conditions such as cataract surgery.",
    ),
    (
        "grace period",
        "A grace period of thirty days is provided for premium payment after the due date.",
    ),
];
