//! Candidate search
//!
//! Turns normalized OCR tokens into a single plate by trying strategies in a
//! fixed order. The first strategy that produces a valid plate wins, and within
//! a strategy the first match in its enumeration order wins.

use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::format::{classify, is_priority_plate, PlateFormat};
use super::rules::PlateRules;

/// Plate lengths probed by the sliding window, in order
const WINDOW_LENGTHS: [usize; 3] = [6, 7, 8];

/// A normalized OCR token with the confidence of its fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Normalized text (`A-Z0-9`)
    pub text: String,
    /// Confidence of the originating fragment (0.0 - 1.0)
    pub confidence: f64,
}

impl Token {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

/// Search strategy, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Raw pair in reading order matching 3 letters + 5 digits
    PriorityRaw,
    /// Raw pair in reading order matching a plate grammar
    RawPair,
    /// Raw pair in either order
    PermutedPair,
    /// Pair in either order after ambiguity correction
    PermutedPairCorrected,
    /// Single token as read
    Single,
    /// Single token after ambiguity correction
    SingleCorrected,
    /// Windows over every non-ignored token, confidence filter not applied
    SlidingWindow,
}

impl Tier {
    /// All tiers in the order they are tried
    pub const ALL: [Tier; 7] = [
        Tier::PriorityRaw,
        Tier::RawPair,
        Tier::PermutedPair,
        Tier::PermutedPairCorrected,
        Tier::Single,
        Tier::SingleCorrected,
        Tier::SlidingWindow,
    ];

    /// 1-based position in the search order
    pub fn rank(self) -> usize {
        self as usize + 1
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::PriorityRaw => "priority raw pair",
            Tier::RawPair => "raw pair",
            Tier::PermutedPair => "permuted pair",
            Tier::PermutedPairCorrected => "permuted pair (corrected)",
            Tier::Single => "single token",
            Tier::SingleCorrected => "single token (corrected)",
            Tier::SlidingWindow => "sliding window",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier {} ({})", self.rank(), self.label())
    }
}

/// A resolved plate and the trace of how it was found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlateMatch {
    /// Plate text
    pub plate: String,
    /// Layout the plate matched
    pub format: PlateFormat,
    /// Strategy that produced it
    pub tier: Tier,
    /// Whether ambiguity correction changed any character
    pub corrected: bool,
    /// Tokens (or the window) the plate was built from
    pub sources: Vec<String>,
}

/// Candidate search over one set of tokens
///
/// Holds only borrowed, read-only rule data, so one instance can be shared
/// across threads.
#[derive(Debug, Clone, Copy)]
pub struct CandidateSearch<'a> {
    rules: &'a PlateRules,
    min_confidence: f64,
}

/// Token lists a search works on
struct Pools<'t> {
    /// Confident, non-ignored tokens (tiers 1-6)
    confident: Vec<&'t str>,
    /// Every non-ignored token regardless of confidence (tier 7)
    fallback: Vec<&'t str>,
}

impl<'a> CandidateSearch<'a> {
    pub fn new(rules: &'a PlateRules, min_confidence: f64) -> Self {
        Self {
            rules,
            min_confidence,
        }
    }

    /// Run every tier in order over `tokens` (already in reading order).
    ///
    /// Returns `None` when no tier produces a valid plate.
    pub fn search(&self, tokens: &[Token]) -> Option<PlateMatch> {
        let pools = self.pools(tokens);
        debug!("Cleaned tokens: {:?}", pools.confident);

        let found = Tier::ALL
            .iter()
            .find_map(|&tier| self.run_tier(tier, &pools));

        match &found {
            Some(m) => debug!(
                "{} matched '{}' from {:?} (corrected: {})",
                m.tier, m.plate, m.sources, m.corrected
            ),
            None => debug!("No tier produced a valid plate"),
        }
        found
    }

    fn pools<'t>(&self, tokens: &'t [Token]) -> Pools<'t> {
        let kept: Vec<&'t Token> = tokens
            .iter()
            .filter(|token| !self.rules.should_ignore(&token.text))
            .collect();

        Pools {
            confident: kept
                .iter()
                .copied()
                .filter(|token| token.confidence >= self.min_confidence)
                .map(|token| token.text.as_str())
                .collect(),
            fallback: kept.iter().copied().map(|token| token.text.as_str()).collect(),
        }
    }

    fn run_tier(&self, tier: Tier, pools: &Pools<'_>) -> Option<PlateMatch> {
        let tokens = &pools.confident;
        match tier {
            Tier::PriorityRaw => self.priority_raw(tokens),
            Tier::RawPair => self.raw_pair(tokens),
            Tier::PermutedPair => self.permuted_pair(tokens, false),
            Tier::PermutedPairCorrected => self.permuted_pair(tokens, true),
            Tier::Single => self.single(tokens, false),
            Tier::SingleCorrected => self.single(tokens, true),
            Tier::SlidingWindow => self.sliding_window(&pools.fallback),
        }
    }

    /// Tier 1: 3 letters + 5 digits, returned verbatim with no correction
    fn priority_raw(&self, tokens: &[&str]) -> Option<PlateMatch> {
        tokens.iter().tuple_combinations().find_map(|(a, b)| {
            let combined = format!("{a}{b}");
            is_priority_plate(&combined).then(|| PlateMatch {
                plate: combined,
                format: PlateFormat::Priority,
                tier: Tier::PriorityRaw,
                corrected: false,
                sources: vec![a.to_string(), b.to_string()],
            })
        })
    }

    /// Tier 2: pairs in reading order, as read
    fn raw_pair(&self, tokens: &[&str]) -> Option<PlateMatch> {
        tokens.iter().tuple_combinations().find_map(|(a, b)| {
            let combined = format!("{a}{b}");
            raw_match(&combined, Tier::RawPair, vec![a.to_string(), b.to_string()])
        })
    }

    /// Tiers 3 and 4: pairs in both orders, optionally corrected
    fn permuted_pair(&self, tokens: &[&str], corrected: bool) -> Option<PlateMatch> {
        let tier = if corrected {
            Tier::PermutedPairCorrected
        } else {
            Tier::PermutedPair
        };

        tokens.iter().permutations(2).find_map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            let combined = format!("{a}{b}");
            let sources = vec![a.to_string(), b.to_string()];
            if corrected {
                self.corrected_match(&combined, tier, sources)
            } else {
                raw_match(&combined, tier, sources)
            }
        })
    }

    /// Tiers 5 and 6: each token alone, optionally corrected
    fn single(&self, tokens: &[&str], corrected: bool) -> Option<PlateMatch> {
        tokens.iter().find_map(|token| {
            let sources = vec![token.to_string()];
            if corrected {
                self.corrected_match(token, Tier::SingleCorrected, sources)
            } else {
                raw_match(token, Tier::Single, sources)
            }
        })
    }

    /// Tier 7: slide each plate length over all tokens joined in reading order.
    ///
    /// Every position of length 6 is tried before any of length 7. Each window
    /// is checked as read, then corrected.
    fn sliding_window(&self, tokens: &[&str]) -> Option<PlateMatch> {
        let combined: Vec<char> = tokens.concat().chars().collect();
        debug!("Sliding window over {:?}", String::from_iter(&combined));

        WINDOW_LENGTHS.iter().find_map(|&len| {
            combined.windows(len).find_map(|window| {
                let candidate = String::from_iter(window);
                let sources = vec![candidate.clone()];
                raw_match(&candidate, Tier::SlidingWindow, sources.clone())
                    .or_else(|| self.corrected_match(&candidate, Tier::SlidingWindow, sources))
            })
        })
    }

    /// First ambiguity variant of `text` that validates.
    ///
    /// Substitution preserves length, so text that can never be a plate is not expanded.
    fn corrected_match(&self, text: &str, tier: Tier, sources: Vec<String>) -> Option<PlateMatch> {
        if !WINDOW_LENGTHS.contains(&text.chars().count()) {
            return None;
        }

        self.rules.ambiguity.expand(text).find_map(|variant| {
            let format = classify(&variant)?;
            Some(PlateMatch {
                corrected: variant != text,
                plate: variant,
                format,
                tier,
                sources: sources.clone(),
            })
        })
    }
}

/// `text` as read, when it validates
fn raw_match(text: &str, tier: Tier, sources: Vec<String>) -> Option<PlateMatch> {
    classify(text).map(|format| PlateMatch {
        plate: text.to_string(),
        format,
        tier,
        corrected: false,
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate::AmbiguityMap;

    fn tokens(items: &[(&str, f64)]) -> Vec<Token> {
        items.iter().map(|&(text, conf)| Token::new(text, conf)).collect()
    }

    fn search(items: &[(&str, f64)]) -> Option<PlateMatch> {
        let rules = PlateRules::argentina();
        CandidateSearch::new(&rules, 0.5).search(&tokens(items))
    }

    #[test]
    fn test_raw_pair_in_reading_order() {
        let found = search(&[("AB1", 0.9), ("23CD", 0.8)]).unwrap();
        assert_eq!(found.plate, "AB123CD");
        assert_eq!(found.tier, Tier::RawPair);
        assert_eq!(found.format, PlateFormat::Mercosur);
        assert_eq!(found.sources, vec!["AB1", "23CD"]);
        assert!(!found.corrected);
    }

    #[test]
    fn test_priority_rule_wins_over_raw_pair() {
        // (AB1, 23CD) validates under tier 2 and comes first in reading order
        let found = search(&[("AB1", 0.9), ("23CD", 0.9), ("ABC", 0.9), ("12345", 0.9)]).unwrap();
        assert_eq!(found.plate, "ABC12345");
        assert_eq!(found.tier, Tier::PriorityRaw);
        assert_eq!(found.format, PlateFormat::Priority);
    }

    #[test]
    fn test_priority_rule_is_not_corrected() {
        // 'O' would be a digit after correction, but tier 1 only takes raw text
        let found = search(&[("ABC", 0.9), ("1234O", 0.9)]);
        assert!(found.map_or(true, |m| m.tier != Tier::PriorityRaw));
    }

    #[test]
    fn test_permuted_pair() {
        let found = search(&[("23CD", 0.9), ("AB1", 0.8)]).unwrap();
        assert_eq!(found.plate, "AB123CD");
        assert_eq!(found.tier, Tier::PermutedPair);
        assert_eq!(found.sources, vec!["AB1", "23CD"]);
    }

    #[test]
    fn test_permuted_pair_with_correction() {
        let found = search(&[("O8C", 0.9), ("45Z", 0.8)]).unwrap();
        assert_eq!(found.plate, "OBC452");
        assert_eq!(found.tier, Tier::PermutedPairCorrected);
        assert_eq!(found.format, PlateFormat::Legacy);
        assert!(found.corrected);
    }

    #[test]
    fn test_single_token() {
        let found = search(&[("XYZ", 0.9), ("AB123CD", 0.9)]).unwrap();
        assert_eq!(found.plate, "AB123CD");
        assert_eq!(found.tier, Tier::Single);
    }

    #[test]
    fn test_single_token_with_correction() {
        let found = search(&[("A8I23CD", 0.9)]).unwrap();
        assert_eq!(found.plate, "AB123CD");
        assert_eq!(found.tier, Tier::SingleCorrected);
        assert!(found.corrected);
    }

    #[test]
    fn test_correction_follows_table_order() {
        let rules = PlateRules {
            ambiguity: AmbiguityMap::new([('S', vec!['5', 'S']), ('5', vec!['5', 'S'])]),
            ..PlateRules::empty()
        };
        let found = CandidateSearch::new(&rules, 0.5)
            .search(&tokens(&[("AS12SCD", 0.9)]))
            .unwrap();
        assert_eq!(found.plate, "A512SCD");
        assert_eq!(found.tier, Tier::SingleCorrected);
    }

    #[test]
    fn test_threshold_compares_at_full_precision() {
        let found = search(&[("AB1", 0.499_999_99), ("23CD", 0.9)]);
        assert!(found.map_or(true, |m| m.tier != Tier::RawPair));
    }

    #[test]
    fn test_ignored_words_never_contribute() {
        // Without the ignore list "L123AB" + "DE" would validate as L123ABDE
        let found = search(&[("DE", 0.9), ("L123AB", 0.9)]).unwrap();
        assert_eq!(found.plate, "LIZ348");
        assert_eq!(found.tier, Tier::SingleCorrected);
        assert!(found.sources.iter().all(|s| s != "DE"));

        let rules = PlateRules::empty();
        let unfiltered = CandidateSearch::new(&rules, 0.5)
            .search(&tokens(&[("DE", 0.9), ("L123AB", 0.9)]))
            .unwrap();
        assert_eq!(unfiltered.plate, "L123ABDE");
        assert_eq!(unfiltered.tier, Tier::PermutedPair);
    }

    #[test]
    fn test_long_tokens_are_noise() {
        assert!(search(&[("BUENOSAIRES", 0.9)]).is_none());
    }

    #[test]
    fn test_sliding_window_uses_low_confidence_tokens() {
        let found = search(&[("AB123CD", 0.3)]).unwrap();
        assert_eq!(found.plate, "AB123CD");
        assert_eq!(found.tier, Tier::SlidingWindow);
        assert!(!found.corrected);
    }

    #[test]
    fn test_sliding_window_prefers_shorter_lengths() {
        // Contains both XAB123 (6) and AB123CD (7); every length 6 window goes first
        let found = search(&[("XAB", 0.1), ("123CD", 0.1)]).unwrap();
        assert_eq!(found.plate, "XAB123");
        assert_eq!(found.format, PlateFormat::Legacy);
        assert_eq!(found.tier, Tier::SlidingWindow);
    }

    #[test]
    fn test_sliding_window_skips_ignored_tokens() {
        let found = search(&[("MERCOSUR", 0.2), ("AB1", 0.2), ("23CD", 0.2)]).unwrap();
        assert_eq!(found.plate, "AB123CD");
        assert_eq!(found.sources, vec!["AB123CD"]);
    }

    #[test]
    fn test_no_match() {
        assert!(search(&[("HELLO", 0.9)]).is_none());
        assert!(search(&[]).is_none());
    }

    #[test]
    fn test_confidence_threshold_is_inclusive() {
        let found = search(&[("AB1", 0.5), ("23CD", 0.5)]).unwrap();
        assert_eq!(found.tier, Tier::RawPair);
    }

    #[test]
    fn test_tier_ranks() {
        assert_eq!(Tier::PriorityRaw.rank(), 1);
        assert_eq!(Tier::SlidingWindow.rank(), 7);
        assert_eq!(Tier::RawPair.to_string(), "tier 2 (raw pair)");
    }
}
