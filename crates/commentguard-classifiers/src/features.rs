//! Hybrid feature construction
//!
//! A [`FeatureVector`] is the concatenation of
//! - a sparse, L2-normalized TF-IDF vector over unigrams and bigrams of a
//!   fitted [`Vocabulary`], and
//! - [`DENSE_FEATURES`] rule-derived scalars: rule score, strong / medium /
//!   positive hit counts, character length, word count, and a 0/1 flag for
//!   any strong hit.

use crate::lexicon::LexiconScorer;
use crate::normalizer::NormalizedText;
use commentguard_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Width of the dense block
pub const DENSE_FEATURES: usize = 7;

/// Names of the dense columns, in order
pub const DENSE_FEATURE_NAMES: [&str; DENSE_FEATURES] = [
    "rule_score",
    "strong_hits",
    "medium_hits",
    "positive_hits",
    "char_length",
    "word_count",
    "any_strong",
];

/// Tokens are runs of at least two word characters
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

/// Vocabulary fitting parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyParams {
    /// Keep at most this many terms, by total corpus count
    pub max_features: usize,

    /// Minimum number of documents a term must occur in
    pub min_df: usize,

    /// Maximum fraction of documents a term may occur in
    pub max_df: f64,

    /// Longest n-gram (1 = unigrams only)
    pub max_ngram: usize,
}

impl Default for VocabularyParams {
    fn default() -> Self {
        Self {
            max_features: 1200,
            min_df: 2,
            max_df: 0.8,
            max_ngram: 2,
        }
    }
}

/// Sparse + dense feature vector
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    terms: Vec<(usize, f64)>,
    dense: [f64; DENSE_FEATURES],
    vocabulary_size: usize,
}

impl FeatureVector {
    /// Build a vector from parts. Term indices must be below
    /// `vocabulary_size`; they are sorted and must be unique.
    pub fn from_parts(
        mut terms: Vec<(usize, f64)>,
        dense: [f64; DENSE_FEATURES],
        vocabulary_size: usize,
    ) -> Result<Self> {
        terms.sort_by_key(|(index, _)| *index);
        if let Some((index, _)) = terms.iter().find(|(index, _)| *index >= vocabulary_size) {
            return Err(Error::Dimension {
                expected: vocabulary_size,
                found: index + 1,
            });
        }
        if terms.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(Error::classifier("duplicate term index in feature vector"));
        }
        Ok(Self {
            terms,
            dense,
            vocabulary_size,
        })
    }

    /// Non-zero TF-IDF weights as `(term index, weight)`, ascending by index
    pub fn terms(&self) -> &[(usize, f64)] {
        &self.terms
    }

    pub fn dense(&self) -> &[f64; DENSE_FEATURES] {
        &self.dense
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    /// Total width: vocabulary terms followed by the dense block
    pub fn dimension(&self) -> usize {
        self.vocabulary_size + DENSE_FEATURES
    }

    /// Dot product with a weight vector of length [`Self::dimension`]
    pub fn dot(&self, weights: &[f64]) -> f64 {
        let offset = self.vocabulary_size;
        self.terms.iter().map(|(i, v)| weights[*i] * v).sum::<f64>()
            + self
                .dense
                .iter()
                .enumerate()
                .map(|(k, v)| weights[offset + k] * v)
                .sum::<f64>()
    }

    /// Add `scale * self` into a weight-shaped accumulator
    pub fn add_scaled_to(&self, scale: f64, acc: &mut [f64]) {
        let offset = self.vocabulary_size;
        for (i, v) in &self.terms {
            acc[*i] += scale * v;
        }
        for (k, v) in self.dense.iter().enumerate() {
            acc[offset + k] += scale * v;
        }
    }

    /// Copy with the dense block multiplied column-wise
    pub fn with_dense_scaled(&self, factors: &[f64; DENSE_FEATURES]) -> Self {
        let mut dense = self.dense;
        for (value, factor) in dense.iter_mut().zip(factors) {
            *value *= factor;
        }
        Self {
            terms: self.terms.clone(),
            dense,
            vocabulary_size: self.vocabulary_size,
        }
    }

    /// Materialize as a dense row of a training design matrix
    pub fn to_dense_row(&self) -> Vec<f64> {
        let mut row = vec![0.0; self.dimension()];
        self.add_scaled_to(1.0, &mut row);
        row
    }
}

/// Fitted n-gram vocabulary with smoothed inverse document frequencies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "VocabularyData", into = "VocabularyData")]
pub struct Vocabulary {
    terms: Vec<String>,
    idf: Vec<f64>,
    index: HashMap<String, usize>,
    n_documents: usize,
    max_ngram: usize,
}

/// Serialized form of [`Vocabulary`]
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VocabularyData {
    terms: Vec<String>,
    idf: Vec<f64>,
    n_documents: usize,
    max_ngram: usize,
}

impl TryFrom<VocabularyData> for Vocabulary {
    type Error = Error;

    fn try_from(data: VocabularyData) -> Result<Self> {
        if data.terms.len() != data.idf.len() {
            return Err(Error::config(format!(
                "vocabulary has {} terms but {} idf weights",
                data.terms.len(),
                data.idf.len()
            )));
        }
        if data.max_ngram == 0 {
            return Err(Error::config("vocabulary max_ngram must be at least 1"));
        }
        let index: HashMap<String, usize> = data
            .terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();
        if index.len() != data.terms.len() {
            return Err(Error::config("vocabulary contains duplicate terms"));
        }
        Ok(Self {
            terms: data.terms,
            idf: data.idf,
            index,
            n_documents: data.n_documents,
            max_ngram: data.max_ngram,
        })
    }
}

impl From<Vocabulary> for VocabularyData {
    fn from(vocabulary: Vocabulary) -> Self {
        Self {
            terms: vocabulary.terms,
            idf: vocabulary.idf,
            n_documents: vocabulary.n_documents,
            max_ngram: vocabulary.max_ngram,
        }
    }
}

impl Vocabulary {
    /// Fit a vocabulary on a corpus.
    ///
    /// Terms occurring in fewer than `min_df` documents or in more than
    /// `max_df * n` documents are pruned; the `max_features` most frequent
    /// survivors are kept, ties broken by term order.
    pub fn fit(texts: &[NormalizedText], params: &VocabularyParams) -> Result<Self> {
        if texts.is_empty() {
            return Err(Error::training("cannot fit a vocabulary on an empty corpus"));
        }
        if params.max_ngram == 0 {
            return Err(Error::config("max_ngram must be at least 1"));
        }
        if !(0.0..=1.0).contains(&params.max_df) {
            return Err(Error::config(format!(
                "max_df must be a fraction in [0, 1], got {}",
                params.max_df
            )));
        }

        let n_documents = texts.len();
        let max_doc_count = params.max_df * n_documents as f64;
        if max_doc_count < params.min_df as f64 {
            return Err(Error::config(format!(
                "max_df {} admits {max_doc_count} documents, fewer than min_df {}",
                params.max_df, params.min_df
            )));
        }

        let mut term_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut doc_counts: BTreeMap<String, usize> = BTreeMap::new();
        for text in texts {
            let grams = ngrams(text.as_str(), params.max_ngram);
            let unique: BTreeSet<&String> = grams.iter().collect();
            for term in unique {
                *doc_counts.entry(term.clone()).or_insert(0) += 1;
            }
            for term in grams {
                *term_counts.entry(term).or_insert(0) += 1;
            }
        }
        let candidates = doc_counts.len();

        let mut kept: Vec<(String, usize)> = doc_counts
            .into_iter()
            .filter(|(_, df)| *df >= params.min_df && *df as f64 <= max_doc_count)
            .collect();
        if kept.is_empty() {
            return Err(Error::training(
                "no terms remain after document-frequency pruning; lower min_df or raise max_df",
            ));
        }

        if kept.len() > params.max_features {
            kept.sort_by(|(a, _), (b, _)| term_counts[b].cmp(&term_counts[a]).then(a.cmp(b)));
            kept.truncate(params.max_features);
            kept.sort_by(|(a, _), (b, _)| a.cmp(b));
        }

        let n = n_documents as f64;
        let (terms, idf): (Vec<String>, Vec<f64>) = kept
            .into_iter()
            .map(|(term, df)| {
                let weight = ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0;
                (term, weight)
            })
            .unzip();

        debug!(
            documents = n_documents,
            candidates,
            kept = terms.len(),
            "Fitted n-gram vocabulary"
        );

        Vocabulary::try_from(VocabularyData {
            terms,
            idf,
            n_documents,
            max_ngram: params.max_ngram,
        })
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.index_of(term).map(|i| self.idf[i])
    }

    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    /// L2-normalized TF-IDF weights for one text
    pub fn weigh(&self, text: &str) -> Vec<(usize, f64)> {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in ngrams(text, self.max_ngram) {
            if let Some(&i) = self.index.get(&term) {
                *counts.entry(i).or_insert(0.0) += 1.0;
            }
        }

        let mut weights: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(i, count)| (i, count * self.idf[i]))
            .collect();

        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut weights {
                *w /= norm;
            }
        }
        weights
    }
}

/// Tokens of two or more word characters
pub fn tokenize(text: &str) -> Vec<&str> {
    token_pattern().find_iter(text).map(|m| m.as_str()).collect()
}

/// All n-grams for `1..=max_n`, unigrams first
pub fn ngrams(text: &str, max_n: usize) -> Vec<String> {
    let tokens = tokenize(text);
    let mut grams = Vec::new();
    for n in 1..=max_n.max(1) {
        if tokens.len() < n {
            break;
        }
        for window in tokens.windows(n) {
            grams.push(window.join(" "));
        }
    }
    grams
}

/// Builds [`FeatureVector`]s from normalized text
pub struct FeatureBuilder {
    scorer: Arc<LexiconScorer>,
    params: VocabularyParams,
    vocabulary: Option<Vocabulary>,
}

impl FeatureBuilder {
    /// Unfitted builder. [`Self::fit_vocabulary`] must run before
    /// [`Self::transform`].
    pub fn new(scorer: Arc<LexiconScorer>, params: VocabularyParams) -> Self {
        Self {
            scorer,
            params,
            vocabulary: None,
        }
    }

    /// Builder around an already fitted vocabulary
    pub fn with_vocabulary(scorer: Arc<LexiconScorer>, vocabulary: Vocabulary) -> Self {
        Self {
            scorer,
            params: VocabularyParams {
                max_ngram: vocabulary.max_ngram,
                ..VocabularyParams::default()
            },
            vocabulary: Some(vocabulary),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref()
    }

    pub fn scorer(&self) -> &Arc<LexiconScorer> {
        &self.scorer
    }

    /// Fit (or refit) the n-gram vocabulary
    pub fn fit_vocabulary(&mut self, texts: &[NormalizedText]) -> Result<&Vocabulary> {
        let vocabulary = Vocabulary::fit(texts, &self.params)?;
        Ok(self.vocabulary.insert(vocabulary))
    }

    /// Feature vectors for a batch, in input order
    pub fn transform(&self, texts: &[NormalizedText]) -> Result<Vec<FeatureVector>> {
        let vocabulary = self
            .vocabulary
            .as_ref()
            .ok_or(Error::UninitializedVocabulary)?;

        Ok(texts
            .iter()
            .map(|text| FeatureVector {
                terms: vocabulary.weigh(text.as_str()),
                dense: self.dense_features(text),
                vocabulary_size: vocabulary.len(),
            })
            .collect())
    }

    /// Feature vector for a single text
    pub fn transform_one(&self, text: &NormalizedText) -> Result<FeatureVector> {
        let vocabulary = self
            .vocabulary
            .as_ref()
            .ok_or(Error::UninitializedVocabulary)?;

        Ok(FeatureVector {
            terms: vocabulary.weigh(text.as_str()),
            dense: self.dense_features(text),
            vocabulary_size: vocabulary.len(),
        })
    }

    /// The rule-derived block; needs no vocabulary
    pub fn dense_features(&self, text: &NormalizedText) -> [f64; DENSE_FEATURES] {
        let rules = self.scorer.score(text.as_str());
        [
            rules.score as f64,
            rules.strong_hits as f64,
            rules.medium_hits as f64,
            rules.positive_hits as f64,
            text.char_len() as f64,
            text.word_count() as f64,
            if rules.strong_hits > 0 { 1.0 } else { 0.0 },
        ]
    }
}

impl std::fmt::Debug for FeatureBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureBuilder")
            .field("params", &self.params)
            .field("vocabulary_size", &self.vocabulary.as_ref().map(Vocabulary::len))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::Normalizer;

    fn corpus(texts: &[&str]) -> Vec<NormalizedText> {
        Normalizer::with_builtin_slang().unwrap().normalize_all(texts)
    }

    fn builder() -> FeatureBuilder {
        FeatureBuilder::new(
            Arc::new(LexiconScorer::builtin().unwrap()),
            VocabularyParams::default(),
        )
    }

    #[test]
    fn test_ngrams_skip_single_char_tokens() {
        assert_eq!(
            ngrams("giày a đẹp quá", 2),
            vec!["giày", "đẹp", "quá", "giày đẹp", "đẹp quá"]
        );
        assert_eq!(ngrams("giày đẹp", 1), vec!["giày", "đẹp"]);
        assert!(ngrams("a b", 2).is_empty());
    }

    #[test]
    fn test_document_frequency_pruning() {
        let texts = corpus(&[
            "giày đẹp lắm",
            "giày đẹp quá",
            "giày xấu lắm",
            "đế giày êm",
            "size nhỏ",
        ]);
        let vocabulary = Vocabulary::fit(&texts, &VocabularyParams::default()).unwrap();

        // "giày" is in 4/5 documents (80%): kept. "lắm" and "đẹp" in 2: kept.
        assert!(vocabulary.index_of("giày").is_some());
        assert!(vocabulary.index_of("lắm").is_some());
        assert!(vocabulary.index_of("giày đẹp").is_some());
        // single-document terms are dropped
        assert!(vocabulary.index_of("size").is_none());
        assert!(vocabulary.index_of("xấu").is_none());

        let terms = vocabulary.terms();
        let mut sorted = terms.to_vec();
        sorted.sort();
        assert_eq!(terms, sorted.as_slice());
    }

    #[test]
    fn test_max_df_drops_ubiquitous_terms() {
        let texts = corpus(&["giày đẹp", "giày xấu", "giày êm", "giày đẹp"]);
        let vocabulary = Vocabulary::fit(&texts, &VocabularyParams::default()).unwrap();
        // in 4/4 documents, above 80%
        assert!(vocabulary.index_of("giày").is_none());
        assert!(vocabulary.index_of("đẹp").is_some());
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let texts = corpus(&["aa bb qq", "aa bb", "aa dd", "bb dd ee", "ff gg"]);
        let params = VocabularyParams {
            max_features: 2,
            max_ngram: 1,
            ..VocabularyParams::default()
        };
        let vocabulary = Vocabulary::fit(&texts, &params).unwrap();
        assert_eq!(vocabulary.terms(), &["aa".to_string(), "bb".to_string()]);
    }

    #[test]
    fn test_idf_is_smoothed() {
        let texts = corpus(&["giày đẹp", "giày xấu", "dép đẹp", "dép xấu", "khác"]);
        let vocabulary = Vocabulary::fit(&texts, &VocabularyParams::default()).unwrap();
        let expected = (6.0f64 / 3.0).ln() + 1.0;
        assert!((vocabulary.idf("giày").unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_fit_errors() {
        assert!(Vocabulary::fit(&[], &VocabularyParams::default()).is_err());

        let texts = corpus(&["một", "hai", "ba"]);
        let err = Vocabulary::fit(&texts, &VocabularyParams::default()).unwrap_err();
        assert!(matches!(err, Error::Training(_)));

        let params = VocabularyParams {
            min_df: 5,
            ..VocabularyParams::default()
        };
        let texts = corpus(&["giày", "giày", "giày"]);
        assert!(matches!(
            Vocabulary::fit(&texts, &params),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let builder = builder();
        let texts = corpus(&["giày đẹp"]);
        assert!(matches!(
            builder.transform(&texts),
            Err(Error::UninitializedVocabulary)
        ));
        assert!(matches!(
            builder.transform_one(&texts[0]),
            Err(Error::UninitializedVocabulary)
        ));
    }

    #[test]
    fn test_transform_produces_normalized_hybrid_vectors() {
        let mut builder = builder();
        let texts = corpus(&["giày đẹp lắm", "giày đẹp quá", "giày xấu lắm", "dép xấu quá"]);
        builder.fit_vocabulary(&texts).unwrap();
        let size = builder.vocabulary().unwrap().len();

        let vectors = builder.transform(&corpus(&["giày đẹp lắm", "lừa đảo"])).unwrap();
        assert_eq!(vectors.len(), 2);

        let first = &vectors[0];
        assert_eq!(first.dimension(), size + DENSE_FEATURES);
        let norm: f64 = first.terms().iter().map(|(_, w)| w * w).sum();
        assert!((norm - 1.0).abs() < 1e-9);
        // "đẹp" is a positive hit: score -2
        assert_eq!(first.dense()[0], -2.0);
        assert_eq!(first.dense()[3], 1.0);
        assert_eq!(first.dense()[4], 12.0);
        assert_eq!(first.dense()[5], 3.0);

        let second = &vectors[1];
        assert!(second.terms().is_empty());
        assert_eq!(second.dense()[0], 5.0);
        assert_eq!(second.dense()[1], 1.0);
        assert_eq!(second.dense()[6], 1.0);
    }

    #[test]
    fn test_vocabulary_serde_round_trip() {
        let texts = corpus(&["giày đẹp", "giày xấu", "dép đẹp", "dép xấu", "khác"]);
        let vocabulary = Vocabulary::fit(&texts, &VocabularyParams::default()).unwrap();
        let json = serde_json::to_string(&vocabulary).unwrap();
        let restored: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.terms(), vocabulary.terms());
        assert_eq!(restored.weigh("giày đẹp"), vocabulary.weigh("giày đẹp"));
    }

    #[test]
    fn test_vocabulary_rejects_mismatched_weights() {
        let json = r#"{"terms":["a","b"],"idf":[1.0],"n_documents":2,"max_ngram":2}"#;
        assert!(serde_json::from_str::<Vocabulary>(json).is_err());
    }

    #[test]
    fn test_from_parts_validates_indices() {
        let dense = [0.0; DENSE_FEATURES];
        assert!(FeatureVector::from_parts(vec![(3, 1.0)], dense, 3).is_err());
        assert!(FeatureVector::from_parts(vec![(1, 1.0), (1, 2.0)], dense, 3).is_err());

        let vector = FeatureVector::from_parts(vec![(2, 0.5), (0, 1.0)], dense, 3).unwrap();
        assert_eq!(vector.terms(), &[(0, 1.0), (2, 0.5)]);
        assert_eq!(vector.to_dense_row().len(), 3 + DENSE_FEATURES);
    }
}
