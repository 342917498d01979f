//! Text normalization for informal Vietnamese comments
//!
//! Every downstream component (lexicon scoring, n-gram features, training)
//! works on [`NormalizedText`], never on raw input. A single pass applies, in
//! order:
//!
//! 1. Unicode NFC composition, then lowercasing
//! 2. URL stripping (`http…` / `www…` up to the next whitespace)
//! 3. whole-word slang expansion, in [`SlangMap`] order
//! 4. collapsing any character repeated 3+ times down to 2
//! 5. replacing characters other than word characters, whitespace and `,.!?`
//!    with a space
//! 6. whitespace collapsing and trimming
//! 7. substituting [`EMPTY_PLACEHOLDER`] for an empty result
//!
//! Step 4 and step 2 can expose a new slang key or URL (`"ccc"` → `"cc"`), so
//! the pass is repeated until the text stops changing. This makes
//! normalization idempotent.
//!
//! Composing first matters for Vietnamese: keyboards and copy-paste often
//! produce decomposed diacritics (`"lừa"` as `u` + U+031B + U+0300), which
//! would otherwise never match the precomposed lexicon and slang entries.

use commentguard_core::{Error, Result};
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;
use unicode_normalization::UnicodeNormalization;

/// Substituted for input that normalizes to nothing
pub const EMPTY_PLACEHOLDER: &str = "empty";

/// Upper bound on normalization passes
const MAX_PASSES: usize = 8;

/// Default slang table, applied in this order
const BUILTIN_SLANG: &[(&str, &str)] = &[
    ("ko", "không"),
    ("k", "không"),
    ("kh", "không"),
    ("r", "rồi"),
    ("dc", "được"),
    ("vs", "với"),
    ("mn", "mọi người"),
    ("lun", "luôn"),
    ("bik", "biết"),
    ("bt", "biết"),
    ("j", "gì"),
    ("vcl", "vãi cả lồn"),
    ("vl", "vãi lồn"),
    ("đkm", "địt con mẹ"),
    ("đm", "địt mẹ"),
    ("cmm", "con mẹ mày"),
    ("cc", "cái cặc"),
    ("tk", "thằng"),
    ("loz", "lồn"),
    ("djt", "địt"),
    ("namkii", "nam kỳ chó"),
    ("backy", "bắc kỳ"),
    ("dcm", "địt con mẹ"),
    ("dm", "địt mẹ"),
    ("shop", "cửa hàng"),
    ("sp", "sản phẩm"),
    ("rep", "trả lời"),
    ("ship", "giao hàng"),
];

/// Canonical lowercase text produced by [`Normalizer`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// True when the input normalized to nothing
    pub fn is_placeholder(&self) -> bool {
        self.0 == EMPTY_PLACEHOLDER
    }

    /// Number of characters (not bytes)
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn word_count(&self) -> usize {
        self.0.split_whitespace().count()
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One slang substitution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlangEntry {
    /// Informal token, matched as a whole word
    pub from: String,

    /// Canonical expansion
    pub to: String,
}

/// Versioned, ordered slang table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlangMap {
    /// Version tag recorded in model artifacts
    pub version: String,

    /// Substitutions, applied in order
    pub entries: Vec<SlangEntry>,
}

impl SlangMap {
    pub fn new(version: impl Into<String>, entries: Vec<SlangEntry>) -> Self {
        Self {
            version: version.into(),
            entries,
        }
    }

    /// The built-in shoe-shop slang table
    pub fn builtin() -> Self {
        Self::new(
            "builtin-1",
            BUILTIN_SLANG
                .iter()
                .map(|(from, to)| SlangEntry {
                    from: from.to_string(),
                    to: to.to_string(),
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SlangMap {
    fn default() -> Self {
        Self::builtin()
    }
}

struct SlangRule {
    pattern: Regex,
    expansion: String,
}

/// Deterministic text canonicalizer
pub struct Normalizer {
    url: Regex,
    disallowed: Regex,
    slang: Vec<SlangRule>,
    slang_version: String,
}

impl Normalizer {
    /// Build a normalizer for the given slang table.
    ///
    /// Rejects empty keys and expansions that contain any key as a whole
    /// word, since those would keep rewriting on every pass.
    pub fn new(slang: &SlangMap) -> Result<Self> {
        let url = Regex::new(r"(?:http|www)\S+")
            .map_err(|e| Error::config(format!("Failed to build URL matcher: {e}")))?;
        let disallowed = Regex::new(r"[^\w\s,.!?]")
            .map_err(|e| Error::config(format!("Failed to build character filter: {e}")))?;

        let mut rules = Vec::with_capacity(slang.entries.len());
        for entry in &slang.entries {
            let key = entry.from.trim().to_lowercase();
            if key.is_empty() {
                return Err(Error::config("slang entry with an empty key"));
            }
            let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&key))).map_err(|e| {
                Error::config(format!("Failed to build slang matcher for '{key}': {e}"))
            })?;
            rules.push(SlangRule {
                pattern,
                expansion: entry.to.trim().to_lowercase(),
            });
        }

        for rule in &rules {
            if let Some(other) = rules.iter().find(|r| r.pattern.is_match(&rule.expansion)) {
                return Err(Error::config(format!(
                    "slang expansion '{}' contains the key matched by '{}'",
                    rule.expansion,
                    other.pattern.as_str()
                )));
            }
        }

        Ok(Self {
            url,
            disallowed,
            slang: rules,
            slang_version: slang.version.clone(),
        })
    }

    /// Normalizer using the built-in slang table
    pub fn with_builtin_slang() -> Result<Self> {
        Self::new(&SlangMap::builtin())
    }

    pub fn slang_version(&self) -> &str {
        &self.slang_version
    }

    /// Canonicalize raw text. Never fails.
    pub fn normalize(&self, raw: &str) -> NormalizedText {
        let mut current = self.pass(raw);
        for _ in 1..MAX_PASSES {
            let next = self.pass(&current);
            if next == current {
                return NormalizedText(current);
            }
            current = next;
        }

        warn!(
            passes = MAX_PASSES,
            text = %current,
            "Normalization did not reach a fixed point"
        );
        NormalizedText(current)
    }

    /// Canonicalize optional input; absent input maps to the placeholder
    pub fn normalize_opt(&self, raw: Option<&str>) -> NormalizedText {
        match raw {
            Some(text) => self.normalize(text),
            None => NormalizedText(EMPTY_PLACEHOLDER.to_string()),
        }
    }

    /// Canonicalize a batch
    pub fn normalize_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<NormalizedText> {
        texts.iter().map(|t| self.normalize(t.as_ref())).collect()
    }

    fn pass(&self, text: &str) -> String {
        let lowered = text.nfc().collect::<String>().to_lowercase();
        let mut text = self.url.replace_all(&lowered, "").into_owned();

        for rule in &self.slang {
            if rule.pattern.is_match(&text) {
                text = rule
                    .pattern
                    .replace_all(&text, NoExpand(&rule.expansion))
                    .into_owned();
            }
        }

        let text = collapse_repeats(&text);
        let text = self.disallowed.replace_all(&text, " ");
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

        if text.is_empty() {
            EMPTY_PLACEHOLDER.to_string()
        } else {
            text
        }
    }
}

/// Keep at most two consecutive copies of any character
fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = None;
    let mut run = 0usize;

    for ch in text.chars() {
        if prev == Some(ch) {
            run += 1;
        } else {
            prev = Some(ch);
            run = 1;
        }
        if run <= 2 {
            out.push(ch);
        }
    }

    out
}
