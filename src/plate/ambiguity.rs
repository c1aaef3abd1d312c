//! Visually confusable characters
//!
//! OCR regularly swaps glyphs such as `0`/`O`/`D` or `8`/`B`. The expander
//! enumerates every string reachable by substituting each character with one of
//! its confusable variants, lazily, so the search can stop at the first variant
//! that validates.

use itertools::structs::MultiProduct;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::vec;
use thiserror::Error;

/// Rule table keyed by single-character strings, as written in TOML
pub type KeyedTable = BTreeMap<String, Vec<char>>;

/// An ambiguity table key that is not exactly one character
#[derive(Debug, Error, PartialEq, Eq)]
#[error("ambiguity key {0:?} must be exactly one character")]
pub struct InvalidAmbiguityKey(pub String);

/// Character to ordered confusable variants, always including the character
/// itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "KeyedTable", into = "KeyedTable")]
pub struct AmbiguityMap {
    table: BTreeMap<char, Vec<char>>,
}

impl AmbiguityMap {
    /// Build a map from `(char, variants)` entries.
    ///
    /// Variant order is kept as given. The identity variant is inserted at the
    /// front only when missing, and repeated variants are dropped, keeping
    /// first occurrences.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (char, Vec<char>)>,
    {
        let table = entries
            .into_iter()
            .map(|(c, variants)| {
                let identity = (!variants.contains(&c)).then_some(c);
                let ordered: Vec<char> = identity.into_iter().chain(variants).unique().collect();
                (c, ordered)
            })
            .collect();
        Self { table }
    }

    /// Variants of `c`, or `None` when `c` is not ambiguous
    pub fn variants_of(&self, c: char) -> Option<&[char]> {
        self.table.get(&c).map(Vec::as_slice)
    }

    /// Number of characters with confusable variants
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Pairs `(x, y)` where `x` may be read as `y` but `y` never as `x`.
    ///
    /// Any such pair silently excludes corrections in one direction.
    pub fn asymmetric_pairs(&self) -> Vec<(char, char)> {
        self.table
            .iter()
            .flat_map(|(&from, variants)| variants.iter().map(move |&to| (from, to)))
            .filter(|&(from, to)| from != to)
            .filter(|&(from, to)| {
                self.variants_of(to)
                    .map_or(true, |back| !back.contains(&from))
            })
            .collect()
    }

    /// Number of strings [`expand`](Self::expand) yields for `text`
    pub fn variant_count(&self, text: &str) -> usize {
        text.chars()
            .map(|c| self.variants_of(c).map_or(1, <[char]>::len))
            .fold(1usize, usize::saturating_mul)
    }

    /// Lazily enumerate every ambiguity variant of `text`.
    ///
    /// Order is the cartesian product with the last position varying fastest,
    /// each position following its table order. With identity-first tables the
    /// first item is `text` itself. Calling again restarts the sequence.
    pub fn expand(&self, text: &str) -> Variants {
        let positions: Vec<vec::IntoIter<char>> = text
            .chars()
            .map(|c| match self.variants_of(c) {
                Some(variants) => variants.to_vec(),
                None => vec![c],
            })
            .map(Vec::into_iter)
            .collect();

        Variants {
            product: positions.into_iter().multi_cartesian_product(),
        }
    }
}

impl TryFrom<KeyedTable> for AmbiguityMap {
    type Error = InvalidAmbiguityKey;

    fn try_from(table: KeyedTable) -> Result<Self, Self::Error> {
        let entries = table
            .into_iter()
            .map(|(key, variants)| match key.chars().exactly_one() {
                Ok(c) => Ok((c, variants)),
                Err(_) => Err(InvalidAmbiguityKey(key)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(entries))
    }
}

impl From<AmbiguityMap> for KeyedTable {
    fn from(map: AmbiguityMap) -> Self {
        map.table
            .into_iter()
            .map(|(c, variants)| (c.to_string(), variants))
            .collect()
    }
}

/// Lazy sequence of ambiguity variants produced by [`AmbiguityMap::expand`]
#[derive(Clone)]
pub struct Variants {
    product: MultiProduct<vec::IntoIter<char>>,
}

impl Iterator for Variants {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.product.next().map(String::from_iter)
    }
}
