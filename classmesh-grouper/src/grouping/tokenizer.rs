//! Class name and tag normalization
//!
//! Turns a class name plus its tag names into a [`TokenSet`]: lowercase ASCII
//! alphanumeric words, denylisted words removed, deduplicated and sorted.

use classmesh_common::config::GroupingConfig;
use std::collections::{BTreeSet, HashSet};

/// Words that carry no subject information (applied to names and tags)
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "introduction",
    "intro",
    "advanced",
    "fundamentals",
    "to",
    "and",
    "of",
    "for",
    "the",
    "ii",
    "i",
    "iii",
    "iv",
    "unit",
    "course",
    "study",
];

/// University abbreviations that leak into class names (applied to names only)
pub const DEFAULT_INSTITUTION_NOISE: &[&str] = &[
    "rmit", "monash", "unsw", "unimelb", "uq", "usyd", "anu", "uts", "uwa",
];

/// Deduplicated, lexicographically sorted normalized tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet(BTreeSet<String>);

impl TokenSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// Tokens in ascending order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_set(&self) -> &BTreeSet<String> {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for TokenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Immutable denylists injected into the [`Tokenizer`]
#[derive(Debug, Clone)]
pub struct Denylists {
    stopwords: HashSet<String>,
    institution_noise: HashSet<String>,
}

impl Denylists {
    /// Build denylists from arbitrary word lists (entries are lowercased)
    pub fn new<S, N>(stopwords: S, institution_noise: N) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        Self {
            stopwords: stopwords
                .into_iter()
                .map(|w| w.as_ref().trim().to_ascii_lowercase())
                .collect(),
            institution_noise: institution_noise
                .into_iter()
                .map(|w| w.as_ref().trim().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Built-in lists, each replaced wholesale by the config when present
    pub fn from_config(config: &GroupingConfig) -> Self {
        let defaults = Self::default();
        Self {
            stopwords: match &config.stopwords {
                Some(words) => Self::new(words, DEFAULT_INSTITUTION_NOISE).stopwords,
                None => defaults.stopwords,
            },
            institution_noise: match &config.institution_noise {
                Some(words) => Self::new(DEFAULT_STOPWORDS, words).institution_noise,
                None => defaults.institution_noise,
            },
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    pub fn is_institution_noise(&self, token: &str) -> bool {
        self.institution_noise.contains(token)
    }
}

impl Default for Denylists {
    fn default() -> Self {
        Self::new(DEFAULT_STOPWORDS, DEFAULT_INSTITUTION_NOISE)
    }
}

/// Name/tag normalizer
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    denylists: Denylists,
}

impl Tokenizer {
    pub fn new(denylists: Denylists) -> Self {
        Self { denylists }
    }

    pub fn denylists(&self) -> &Denylists {
        &self.denylists
    }

    /// Normalize a class name and its tags into a [`TokenSet`]
    ///
    /// Institution noise is only stripped from the name; tags are not expected
    /// to carry university names. Empty input yields an empty set.
    pub fn normalize<T>(&self, name: &str, tags: &[T]) -> TokenSet
    where
        T: AsRef<str>,
    {
        let name_tokens = words(name).filter(|t| {
            !self.denylists.is_stopword(t) && !self.denylists.is_institution_noise(t)
        });

        let tag_tokens = tags
            .iter()
            .flat_map(|tag| words(tag.as_ref()))
            .filter(|t| !self.denylists.is_stopword(t));

        name_tokens.chain(tag_tokens).collect()
    }
}

/// Maximal runs of ASCII letters/digits, lowercased
fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
}
