//! Plate grammars
//!
//! Each grammar is a fixed sequence of character classes checked position by
//! position. Only lengths 6, 7 and 8 can ever validate.

use serde::Serialize;
use std::fmt;

/// Character class at one plate position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Letter,
    Digit,
}

impl Class {
    fn accepts(self, c: char) -> bool {
        match self {
            Class::Letter => c.is_ascii_alphabetic(),
            Class::Digit => c.is_ascii_digit(),
        }
    }
}

use Class::{Digit as D, Letter as L};

/// Recognized plate layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateFormat {
    /// 3 letters + 3 digits (ABC123)
    Legacy,
    /// 2 letters + 3 digits + 2 letters (AB123CD)
    Mercosur,
    /// 1 letter + 3 digits + 3 letters (A123BCD)
    Motorcycle,
    /// 1 letter + 3 digits + 4 letters (A123BCDE)
    Extended,
    /// 3 letters + 5 digits, only accepted by the raw priority rule
    Priority,
}

const LEGACY: [Class; 6] = [L, L, L, D, D, D];
const MERCOSUR: [Class; 7] = [L, L, D, D, D, L, L];
const MOTORCYCLE: [Class; 7] = [L, D, D, D, L, L, L];
const EXTENDED: [Class; 8] = [L, D, D, D, L, L, L, L];
const PRIORITY: [Class; 8] = [L, L, L, D, D, D, D, D];

impl PlateFormat {
    fn pattern(self) -> &'static [Class] {
        match self {
            PlateFormat::Legacy => &LEGACY,
            PlateFormat::Mercosur => &MERCOSUR,
            PlateFormat::Motorcycle => &MOTORCYCLE,
            PlateFormat::Extended => &EXTENDED,
            PlateFormat::Priority => &PRIORITY,
        }
    }

    /// Whether `text` matches this layout exactly
    pub fn matches(self, text: &str) -> bool {
        let pattern = self.pattern();
        text.chars().count() == pattern.len()
            && text.chars().zip(pattern).all(|(c, class)| class.accepts(c))
    }

    /// Human readable name
    pub fn label(self) -> &'static str {
        match self {
            PlateFormat::Legacy => "legacy",
            PlateFormat::Mercosur => "mercosur",
            PlateFormat::Motorcycle => "motorcycle",
            PlateFormat::Extended => "extended",
            PlateFormat::Priority => "priority",
        }
    }
}

impl fmt::Display for PlateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify `text` against the general grammars, keyed by length.
///
/// The priority layout is not part of the general grammar and never returned here.
pub fn classify(text: &str) -> Option<PlateFormat> {
    let candidates: &[PlateFormat] = match text.chars().count() {
        6 => &[PlateFormat::Legacy],
        7 => &[PlateFormat::Mercosur, PlateFormat::Motorcycle],
        8 => &[PlateFormat::Extended],
        _ => return None,
    };
    candidates.iter().copied().find(|format| format.matches(text))
}

/// Format validator: does `text` match any recognized plate grammar
pub fn is_valid_plate(text: &str) -> bool {
    classify(text).is_some()
}

/// Stricter raw rule tried before any other strategy: 3 letters followed by 5 digits
pub fn is_priority_plate(text: &str) -> bool {
    PlateFormat::Priority.matches(text)
}
