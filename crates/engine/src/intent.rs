//! Intent classification: decides which retrieval paths a question uses.

use crate::order_numbers::contains_order_number;
use salesrag_core::retrieval::Intent;

/// Words that mark a question as asking for explanatory, document-backed content.
pub const SEMANTIC_KEYWORDS: [&str; 7] = [
    "explain",
    "describe",
    "policy",
    "context",
    "about",
    "meaning",
    "information",
];

/// Maps a raw question to an [`Intent`]. Must be pure and deterministic.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, question: &str) -> Intent;
}

/// Order-number and keyword based classifier.
///
/// | order number | keyword | intent     |
/// |--------------|---------|------------|
/// | yes          | yes     | hybrid     |
/// | yes          | no      | structured |
/// | no           | yes     | vector     |
/// | no           | no      | hybrid     |
#[derive(Debug, Clone)]
pub struct KeywordIntentClassifier {
    keywords: Vec<String>,
}

impl KeywordIntentClassifier {
    pub fn new() -> Self {
        Self::with_keywords(SEMANTIC_KEYWORDS)
    }

    /// Use a custom keyword set. Keywords are matched case-insensitively as substrings.
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .collect(),
        }
    }

    fn has_semantic_keyword(&self, question: &str) -> bool {
        let lowered = question.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

impl Default for KeywordIntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier for KeywordIntentClassifier {
    fn classify(&self, question: &str) -> Intent {
        match (
            contains_order_number(question),
            self.has_semantic_keyword(question),
        ) {
            (true, true) => Intent::Hybrid,
            (true, false) => Intent::Structured,
            (false, true) => Intent::Vector,
            (false, false) => Intent::Hybrid,
        }
    }
}
