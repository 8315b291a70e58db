use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::validation::{Outcome, Validator};

/// KeywordValidator
///
/// Rejects text containing a banned keyword as a whole word, ignoring case.
/// Text is split into words on every non-alphanumeric character, so "Spam!" matches
/// "spam" but "spammer" does not. A multi-word entry ("free money") matches the same
/// words appearing consecutively.
///
/// The keyword set is fixed at construction and only read afterwards; picking up new
/// keywords means building a new validator.
pub struct KeywordValidator {
    // Each entry already split into lowercase words. Ordered so the reported keyword
    // is the same across runs when several entries match.
    keywords: BTreeSet<Vec<String>>,
}

impl KeywordValidator {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| words(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();

        Self { keywords }
    }

    /// The active keyword set, each entry rendered as its normalized words.
    pub fn keywords(&self) -> Vec<String> {
        self.keywords.iter().map(|k| k.join(" ")).collect()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    fn first_match(&self, text: &str) -> Option<String> {
        let text_words = words(text);
        if text_words.is_empty() {
            return None;
        }

        // Earliest position in the text wins; ties go to the first keyword in set order.
        (0..text_words.len()).find_map(|start| {
            self.keywords
                .iter()
                .find(|keyword| text_words[start..].starts_with(keyword.as_slice()))
                .map(|keyword| keyword.join(" "))
        })
    }
}

#[async_trait]
impl Validator for KeywordValidator {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn check(&self, text: &str) -> Outcome {
        match self.first_match(text) {
            Some(keyword) => {
                tracing::warn!(keyword = %keyword, "banned keyword found");
                Outcome::invalid(format!("banned keyword \"{keyword}\""))
            }
            None => Outcome::Valid,
        }
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
