//! Lexicon-driven rule scoring
//!
//! Three curated phrase sets drive a signed severity score:
//!
//! | tier | weight | effect on confidence |
//! |---|---|---|
//! | strong | +5 | any hit forces `HIGH` |
//! | medium | +2 | 3+ hits give `MEDIUM` |
//! | positive | −2 | none |
//!
//! Matching is substring containment on the lowercased text, not token
//! matching: an entry hits anywhere in the string, including inside longer
//! words. Embedded slurs are caught, and so is `"chó"` inside the harmless
//! `"chóng"`. That false-positive rate is the accepted price. Each entry
//! counts once per text no matter how often it occurs.

use aho_corasick::AhoCorasick;
use commentguard_core::{ConfidenceTier, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const BUILTIN_STRONG: &[&str] = &[
    "đm", "vcl", "vl", "lồn", "cặc", "đéo", "cc", "cmm", "đkm", "cmnl", "buồi",
    "vãi lồn", "vãi cả lồn", "địt mẹ", "địt con mẹ", "cứt", "địt", "đụ",
    "namkiki", "backy", "parky", "nam kỳ", "bắc kỳ", "nam cầy", "bắc cụ",
    "chịch", "xoạc", "bú lồn", "bú cu", "bú cặc", "bú tý", "hiếp", "dâm",
    "cút", "xéo", "chết đi", "súc vật", "ngu học", "thất học", "lừa đảo", "gian thương",
];

const BUILTIN_MEDIUM: &[&str] = &[
    "ngu", "đần", "khùng", "điên", "chó", "óc chó",
    "mất dạy", "vô học", "ngu người", "ngớ ngẩn", "mày", "tao",
    "fake", "pha ke", "đểu", "dỏm", "nát",
];

const BUILTIN_POSITIVE: &[&str] = &[
    "cảm ơn", "cám ơn", "thanks", "tốt", "hay",
    "đẹp", "yêu", "thương", "chúc", "vui",
    "tuyệt", "xuất sắc", "tốt bụng", "nhân hậu",
    "xịn", "chất", "êm", "vừa vặn", "giao nhanh", "nhiệt tình", "uy tín", "legit",
];

/// Version tag of the built-in lexicons
pub const BUILTIN_LEXICON_VERSION: &str = "builtin-1";

/// Minimum number of `!` that adds the exclamation bonus
const EXCLAMATION_THRESHOLD: usize = 3;

/// Lexicon tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LexiconTier {
    Strong,
    Medium,
    Positive,
}

impl LexiconTier {
    /// Score contribution of one hit
    pub fn weight(self) -> i32 {
        match self {
            Self::Strong => 5,
            Self::Medium => 2,
            Self::Positive => -2,
        }
    }

    /// Entries of the built-in lexicon for this tier
    pub fn builtin_entries(self) -> &'static [&'static str] {
        match self {
            Self::Strong => BUILTIN_STRONG,
            Self::Medium => BUILTIN_MEDIUM,
            Self::Positive => BUILTIN_POSITIVE,
        }
    }
}

/// Immutable set of lowercase phrases for one tier
pub struct Lexicon {
    tier: LexiconTier,
    entries: Vec<String>,
    matcher: AhoCorasick,
}

impl Lexicon {
    /// Build a lexicon. Entries are trimmed, lowercased and deduplicated.
    pub fn new<I, S>(tier: LexiconTier, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique = BTreeSet::new();
        for entry in entries {
            let entry = entry.as_ref().trim().to_lowercase();
            if entry.is_empty() {
                return Err(Error::config(format!("empty entry in {tier:?} lexicon")));
            }
            unique.insert(entry);
        }
        let entries: Vec<String> = unique.into_iter().collect();

        let matcher = AhoCorasick::new(&entries).map_err(|e| {
            Error::classifier(format!("Failed to build {tier:?} lexicon matcher: {e}"))
        })?;

        Ok(Self {
            tier,
            entries,
            matcher,
        })
    }

    pub fn tier(&self) -> LexiconTier {
        self.tier
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct entries occurring anywhere in `lowered`.
    ///
    /// `lowered` must already be lowercase.
    pub fn count_hits(&self, lowered: &str) -> usize {
        let mut seen = vec![false; self.entries.len()];
        for m in self.matcher.find_overlapping_iter(lowered) {
            seen[m.pattern().as_usize()] = true;
        }
        seen.into_iter().filter(|hit| *hit).count()
    }

    /// Entries occurring in `lowered`, in lexicon order
    pub fn matched_entries(&self, lowered: &str) -> Vec<&str> {
        let mut seen = vec![false; self.entries.len()];
        for m in self.matcher.find_overlapping_iter(lowered) {
            seen[m.pattern().as_usize()] = true;
        }
        self.entries
            .iter()
            .zip(seen)
            .filter(|(_, hit)| *hit)
            .map(|(entry, _)| entry.as_str())
            .collect()
    }
}

impl std::fmt::Debug for Lexicon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexicon")
            .field("tier", &self.tier)
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Per-text rule evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleBreakdown {
    pub strong_hits: usize,
    pub medium_hits: usize,
    pub positive_hits: usize,

    /// Text has cased characters and none of them is lowercase
    pub all_caps: bool,

    /// Number of `!` characters
    pub exclamations: usize,

    /// Signed severity score
    pub score: i32,

    pub tier: ConfidenceTier,
}

/// Rule scorer over the three lexicon tiers
#[derive(Debug)]
pub struct LexiconScorer {
    version: String,
    strong: Lexicon,
    medium: Lexicon,
    positive: Lexicon,
}

impl LexiconScorer {
    pub fn new(
        version: impl Into<String>,
        strong: Lexicon,
        medium: Lexicon,
        positive: Lexicon,
    ) -> Result<Self> {
        for (lexicon, expected) in [
            (&strong, LexiconTier::Strong),
            (&medium, LexiconTier::Medium),
            (&positive, LexiconTier::Positive),
        ] {
            if lexicon.tier() != expected {
                return Err(Error::config(format!(
                    "expected a {expected:?} lexicon, got {:?}",
                    lexicon.tier()
                )));
            }
        }

        Ok(Self {
            version: version.into(),
            strong,
            medium,
            positive,
        })
    }

    /// Scorer over the built-in shoe-shop lexicons
    pub fn builtin() -> Result<Self> {
        Self::new(
            BUILTIN_LEXICON_VERSION,
            Lexicon::new(LexiconTier::Strong, BUILTIN_STRONG)?,
            Lexicon::new(LexiconTier::Medium, BUILTIN_MEDIUM)?,
            Lexicon::new(LexiconTier::Positive, BUILTIN_POSITIVE)?,
        )
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn lexicon(&self, tier: LexiconTier) -> &Lexicon {
        match tier {
            LexiconTier::Strong => &self.strong,
            LexiconTier::Medium => &self.medium,
            LexiconTier::Positive => &self.positive,
        }
    }

    /// Score a text. Pure: same text and lexicons, same breakdown.
    ///
    /// The caps bonus looks at `text` as given. Normalized text is lowercase,
    /// so the bonus only fires when raw text is scored directly.
    pub fn score(&self, text: &str) -> RuleBreakdown {
        let lowered = text.to_lowercase();

        let strong_hits = self.strong.count_hits(&lowered);
        let medium_hits = self.medium.count_hits(&lowered);
        let positive_hits = self.positive.count_hits(&lowered);
        let all_caps = is_all_caps(text);
        let exclamations = text.chars().filter(|c| *c == '!').count();

        let mut score = LexiconTier::Strong.weight() * strong_hits as i32
            + LexiconTier::Medium.weight() * medium_hits as i32
            + LexiconTier::Positive.weight() * positive_hits as i32;
        if all_caps {
            score += 1;
        }
        if exclamations >= EXCLAMATION_THRESHOLD {
            score += 1;
        }

        RuleBreakdown {
            strong_hits,
            medium_hits,
            positive_hits,
            all_caps,
            exclamations,
            score,
            tier: ConfidenceTier::from_hits(strong_hits, medium_hits),
        }
    }

    /// Matched entries per tier, for reporting
    pub fn explain<'a>(&'a self, text: &str) -> Vec<(LexiconTier, Vec<&'a str>)> {
        let lowered = text.to_lowercase();
        [&self.strong, &self.medium, &self.positive]
            .into_iter()
            .map(|lexicon| (lexicon.tier(), lexicon.matched_entries(&lowered)))
            .collect()
    }
}

fn is_all_caps(text: &str) -> bool {
    let mut cased = false;
    for ch in text.chars() {
        if ch.is_lowercase() {
            return false;
        }
        if ch.is_uppercase() {
            cased = true;
        }
    }
    cased
}
