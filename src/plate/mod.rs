//! Plate resolution core
//!
//! Pure, synchronous text processing: normalization, grammar validation,
//! ambiguity expansion and the tiered candidate search. Nothing here performs
//! I/O or fails.

pub mod ambiguity;
pub mod format;
pub mod normalize;
pub mod rules;
pub mod search;

pub use ambiguity::{AmbiguityMap, InvalidAmbiguityKey, Variants};
pub use format::{classify, is_priority_plate, is_valid_plate, PlateFormat};
pub use normalize::normalize;
pub use rules::{IgnoreSet, PlateRules};
pub use search::{CandidateSearch, PlateMatch, Tier, Token};
