//! Canonical titles: one spelling per film across all venues.

use regex::Regex;

use crate::domain::model::{AggregateShowings, CanonicalShowings};
use crate::utils::error::{DigestError, Result};

pub struct TitleNormalizer {
    excluded_keywords: Vec<String>,
    noise_phrases: Vec<String>,
    punctuation: Regex,
    whitespace: Regex,
}

impl TitleNormalizer {
    /// Keywords and phrases are upper-cased here, so configuration may use any case.
    pub fn new(excluded_keywords: &[String], noise_phrases: &[String]) -> Result<Self> {
        // parentheses survive so trailing "(…)" annotations can be cut as a whole
        let punctuation = Regex::new(r"[\p{P}&&[^()]]")
            .map_err(|e| DigestError::processing(format!("punctuation pattern: {}", e)))?;
        let whitespace = Regex::new(r"[\s\p{Zs}]+")
            .map_err(|e| DigestError::processing(format!("whitespace pattern: {}", e)))?;

        Ok(Self {
            excluded_keywords: upper_non_empty(excluded_keywords),
            noise_phrases: upper_non_empty(noise_phrases),
            punctuation,
            whitespace,
        })
    }

    fn is_excluded(&self, upper: &str) -> bool {
        self.excluded_keywords.iter().any(|kw| upper.contains(kw.as_str()))
    }

    fn collapse(&self, title: &str) -> String {
        self.whitespace.replace_all(title, " ").into_owned()
    }

    /// Removes noise phrases and collapses whitespace until nothing changes.
    fn strip_noise(&self, title: &str) -> String {
        let mut current = self.collapse(title);
        // removing one phrase can splice together another one
        loop {
            let removed = self
                .noise_phrases
                .iter()
                .fold(current.clone(), |acc, phrase| acc.replace(phrase.as_str(), ""));
            let next = self.collapse(&removed);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    /// Canonical form of `raw`, or `None` when the title is excluded.
    pub fn normalize(&self, raw: &str) -> Option<String> {
        let upper = raw.to_uppercase();
        if self.is_excluded(&upper) {
            return None;
        }

        let without_punctuation = self.punctuation.replace_all(&upper, " ");
        let cleaned = self.strip_noise(&without_punctuation);
        let canonical = strip_trailing_parentheticals(&cleaned);

        if canonical.is_empty() || self.is_excluded(&canonical) {
            return None;
        }
        Some(canonical)
    }

    /// Merges raw titles sharing a canonical form and orders each title's
    /// showings by time.
    pub fn canonicalize(&self, aggregate: AggregateShowings) -> CanonicalShowings {
        let mut canonical = CanonicalShowings::new();
        let mut excluded = 0usize;

        for (raw, showings) in aggregate.into_inner() {
            match self.normalize(&raw) {
                Some(title) => {
                    if title != raw {
                        tracing::debug!("🔤 {:?} -> {:?}", raw, title);
                    }
                    canonical.entry(title).or_default().extend(showings);
                }
                None => {
                    tracing::debug!("🚫 excluded {:?}", raw);
                    excluded += 1;
                }
            }
        }

        for showings in canonical.values_mut() {
            showings.sort_by_key(|s| s.time);
        }

        tracing::info!(
            "🔤 {} canonical titles ({} excluded)",
            canonical.len(),
            excluded
        );
        canonical
    }
}

fn upper_non_empty(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Drops `(…)` groups from the end of the title as long as the title does not
/// itself open with `(`. An unmatched `)` stops the stripping.
fn strip_trailing_parentheticals(title: &str) -> String {
    let mut title = title.trim().to_string();

    while title.ends_with(')') && !title.starts_with('(') {
        let Some(open) = matching_open_paren(&title) else {
            break;
        };
        title.truncate(open);
        title = title.trim_end().to_string();
    }

    title
}

fn matching_open_paren(title: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in title.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
