//! TF-IDF vectorization of normalized tag tokens
//!
//! Every input string is one document. Features are word unigrams and bigrams
//! (words are runs of two or more word characters). Weights are raw term
//! counts times the smoothed idf `ln((1 + n) / (1 + df)) + 1`, and each row
//! is L2-normalized.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::OnceLock;

use crate::error::{AnalyzerError, Result};

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("word pattern is valid"))
}

/// Sparse row with entries sorted by feature index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn from_sorted(entries: Vec<(usize, f64)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_zero(&self) -> bool {
        self.entries.iter().all(|(_, v)| *v == 0.0)
    }

    pub fn squared_norm(&self) -> f64 {
        self.entries.iter().map(|(_, v)| v * v).sum()
    }

    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.entries.iter().map(|(i, v)| v * dense[*i]).sum()
    }

    /// Squared Euclidean distance to a dense point whose squared norm is known
    pub fn squared_distance(&self, dense: &[f64], dense_squared_norm: f64) -> f64 {
        (self.squared_norm() - 2.0 * self.dot_dense(dense) + dense_squared_norm).max(0.0)
    }

    pub fn add_to(&self, dense: &mut [f64]) {
        for (i, v) in &self.entries {
            dense[*i] += v;
        }
    }

    pub fn to_dense(&self, dimensions: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dimensions];
        self.add_to(&mut dense);
        dense
    }

    /// Bit-exact key, used to count distinct rows
    pub(crate) fn fingerprint(&self) -> Vec<(usize, u64)> {
        self.entries
            .iter()
            .filter(|(_, v)| *v != 0.0)
            .map(|(i, v)| (*i, v.to_bits()))
            .collect()
    }
}

/// Document-by-feature TF-IDF matrix
#[derive(Debug, Clone, PartialEq)]
pub struct TfIdfMatrix {
    vocabulary: Vec<String>,
    idf: Vec<f64>,
    rows: Vec<SparseVector>,
}

impl TfIdfMatrix {
    /// Feature names in column order
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn feature_index(&self, feature: &str) -> Option<usize> {
        self.vocabulary
            .binary_search_by(|f| f.as_str().cmp(feature))
            .ok()
    }

    /// Number of distinct rows
    pub fn distinct_rows(&self) -> usize {
        self.rows
            .iter()
            .map(SparseVector::fingerprint)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// TF-IDF vectorizer over unigrams and bigrams
#[derive(Debug, Clone)]
pub struct TagVectorizer {
    ngram_range: (usize, usize),
}

impl TagVectorizer {
    pub fn new() -> Self {
        Self { ngram_range: (1, 2) }
    }

    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        let min_n = min_n.max(1);
        self.ngram_range = (min_n, max_n.max(min_n));
        self
    }

    /// Terms of one document, in order of occurrence
    pub fn analyze(&self, document: &str) -> Vec<String> {
        let words: Vec<&str> = word_pattern()
            .find_iter(document)
            .map(|m| m.as_str())
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > words.len() {
                break;
            }
            terms.extend(words.windows(n).map(|w| w.join(" ")));
        }
        terms
    }

    /// Learn the vocabulary and idf from `documents` and return their weights
    pub fn fit_transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<TfIdfMatrix> {
        if documents.is_empty() {
            return Err(AnalyzerError::EmptyCorpus);
        }

        let analyzed: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| self.analyze(doc.as_ref()))
            .collect();

        let vocabulary: Vec<String> = analyzed
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: BTreeMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        let mut document_frequency = vec![0usize; vocabulary.len()];
        let mut counts: Vec<BTreeMap<usize, f64>> = Vec::with_capacity(analyzed.len());
        for terms in &analyzed {
            let mut tf: BTreeMap<usize, f64> = BTreeMap::new();
            for term in terms {
                *tf.entry(index[term.as_str()]).or_insert(0.0) += 1.0;
            }
            for feature in tf.keys() {
                document_frequency[*feature] += 1;
            }
            counts.push(tf);
        }

        let n_documents = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|df| ((1.0 + n_documents) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .into_iter()
            .map(|tf| {
                let mut entries: Vec<(usize, f64)> = tf
                    .into_iter()
                    .map(|(feature, count)| (feature, count * idf[feature]))
                    .collect();
                let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, v) in entries.iter_mut() {
                        *v /= norm;
                    }
                }
                SparseVector::from_sorted(entries)
            })
            .collect();

        Ok(TfIdfMatrix {
            vocabulary,
            idf,
            rows,
        })
    }
}

impl Default for TagVectorizer {
    fn default() -> Self {
        Self::new()
    }
}
