//! Jurisdiction rule data
//!
//! Confusable characters and boilerplate vocabulary are configuration, not code.
//! The defaults encode Argentine plates; other jurisdictions supply their own
//! tables through the `[rules]` section of the config file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use super::ambiguity::AmbiguityMap;
use super::normalize::normalize;

/// Longest normalized token that can still be part of a plate
pub const MAX_TOKEN_LEN: usize = 8;

/// Known non-plate vocabulary (country names, government boilerplate, slogans)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct IgnoreSet {
    words: BTreeSet<String>,
}

impl IgnoreSet {
    /// Build from raw words; each is normalized so it compares against tokens
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|word| normalize(word.as_ref()))
            .filter(|word| !word.is_empty())
            .collect();
        Self { words }
    }

    /// Exact match against a normalized token
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl From<Vec<String>> for IgnoreSet {
    fn from(words: Vec<String>) -> Self {
        Self::new(words)
    }
}

impl From<IgnoreSet> for Vec<String> {
    fn from(set: IgnoreSet) -> Self {
        set.words.into_iter().collect()
    }
}

/// Read-only rule tables shared by every recognition call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateRules {
    /// Words discarded before any candidate is built
    pub ignore_words: IgnoreSet,
    /// Confusable characters used for correction
    pub ambiguity: AmbiguityMap,
}

impl Default for PlateRules {
    fn default() -> Self {
        Self::argentina()
    }
}

impl PlateRules {
    /// Argentine plates (legacy, Mercosur and motorcycle layouts)
    pub fn argentina() -> Self {
        let ambiguity = AmbiguityMap::new([
            ('0', vec!['0', 'O', 'D']),
            ('O', vec!['O', '0', 'D']),
            ('D', vec!['D', 'O', '0']),
            ('1', vec!['1', 'I', 'L']),
            ('I', vec!['I', '1', 'L']),
            ('L', vec!['L', '1', 'I']),
            ('2', vec!['2', 'Z']),
            ('Z', vec!['Z', '2']),
            ('5', vec!['5', 'S']),
            ('S', vec!['S', '5']),
            ('8', vec!['8', 'B']),
            ('B', vec!['B', '8']),
            ('4', vec!['4', 'A']),
            ('A', vec!['A', '4']),
            ('V', vec!['V', 'Y']),
            ('Y', vec!['Y', 'V']),
            ('N', vec!['N', 'M']),
            ('M', vec!['M', 'N']),
            ('C', vec!['C', 'G']),
            ('G', vec!['G', 'C']),
        ]);

        let ignore_words = IgnoreSet::new([
            "ARGENTINA", "REPUBLICA", "MERCOSUR", "AUTOMOTOR", "NACIONAL", "BLOG", "CO",
            "WWW", "FECOSUR", "FECOSURR", "DE", "DEL", "OFICIAL", "VEHICULO", "VEHICULOS",
            "GOBIERNO", "PODER", "EJECUTIVO",
        ]);

        Self {
            ignore_words,
            ambiguity,
        }
    }

    /// Rule tables with no vocabulary and no confusable characters
    pub fn empty() -> Self {
        Self {
            ignore_words: IgnoreSet::default(),
            ambiguity: AmbiguityMap::default(),
        }
    }

    /// Whether a normalized token is noise: known vocabulary or longer than any plate
    pub fn should_ignore(&self, token: &str) -> bool {
        self.ignore_words.contains(token) || token.chars().count() > MAX_TOKEN_LEN
    }

    /// Log asymmetric ambiguity entries; returns how many were found
    pub fn check(&self) -> usize {
        let pairs = self.ambiguity.asymmetric_pairs();
        for (from, to) in &pairs {
            warn!(
                "Ambiguity table maps '{}' to '{}' but not back; corrections from '{}' to '{}' are impossible",
                from, to, to, from
            );
        }
        pairs.len()
    }
}
