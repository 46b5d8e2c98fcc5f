use crate::document::Corpus;
use crate::normalizer::Normalizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Frozen, lexically sorted set of terms with a term -> column lookup
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: BTreeMap<String, usize>,
}

impl Vocabulary {
    pub fn new<I: IntoIterator<Item = String>>(terms: I) -> Self {
        let terms: Vec<String> = terms
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { terms, index }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn position(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Documents x terms raw counts, rows keyed by filename
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTermMatrix {
    labels: Vec<String>,
    vocabulary: Vocabulary,
    counts: Vec<Vec<u32>>,
}

/// Count term occurrences per document; the vocabulary is the union of all tokens
pub fn build_term_counts(docs: &[(String, Vec<String>)]) -> DocumentTermMatrix {
    let vocabulary = Vocabulary::new(docs.iter().flat_map(|(_, tokens)| tokens.iter().cloned()));

    let counts = docs
        .iter()
        .map(|(_, tokens)| {
            let mut row = vec![0u32; vocabulary.len()];
            for token in tokens {
                if let Some(col) = vocabulary.position(token) {
                    row[col] += 1;
                }
            }
            row
        })
        .collect();

    debug!(
        documents = docs.len(),
        terms = vocabulary.len(),
        "Built document-term matrix"
    );

    DocumentTermMatrix {
        labels: docs.iter().map(|(label, _)| label.clone()).collect(),
        vocabulary,
        counts,
    }
}

impl DocumentTermMatrix {
    /// Normalize every document of the corpus and count its terms
    pub fn from_corpus(corpus: &Corpus, normalizer: &Normalizer) -> Self {
        let docs: Vec<(String, Vec<String>)> = corpus
            .iter()
            .map(|d| (d.filename.clone(), normalizer.normalize(&d.content)))
            .collect();
        build_term_counts(&docs)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn row(&self, doc: usize) -> &[u32] {
        &self.counts[doc]
    }

    pub fn rows(&self) -> &[Vec<u32>] {
        &self.counts
    }

    pub fn count(&self, label: &str, term: &str) -> u32 {
        let row = self.labels.iter().position(|l| l == label);
        let col = self.vocabulary.position(term);
        match (row, col) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    pub fn n_docs(&self) -> usize {
        self.labels.len()
    }

    pub fn n_terms(&self) -> usize {
        self.vocabulary.len()
    }

    /// Number of documents in which the term at `col` occurs
    pub fn doc_frequency(&self, col: usize) -> usize {
        self.counts.iter().filter(|row| row[col] > 0).count()
    }

    /// Total occurrences of each term across the corpus
    pub fn term_totals(&self) -> Vec<u64> {
        let mut totals = vec![0u64; self.n_terms()];
        for row in &self.counts {
            for (total, &c) in totals.iter_mut().zip(row) {
                *total += u64::from(c);
            }
        }
        totals
    }

    /// Most frequent terms, ties broken alphabetically
    pub fn top_terms(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> = self
            .vocabulary
            .terms()
            .iter()
            .cloned()
            .zip(self.term_totals())
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    /// Keep only terms whose sparsity (share of documents lacking them) is below `max_sparsity`
    pub fn remove_sparse_terms(&self, max_sparsity: f64) -> Self {
        let n = self.n_docs() as f64;
        let keep: Vec<usize> = (0..self.n_terms())
            .filter(|&col| 1.0 - self.doc_frequency(col) as f64 / n < max_sparsity)
            .collect();

        let vocabulary = Vocabulary::new(keep.iter().map(|&c| self.vocabulary.terms[c].clone()));
        let counts = self
            .counts
            .iter()
            .map(|row| keep.iter().map(|&c| row[c]).collect())
            .collect();

        debug!(
            before = self.n_terms(),
            after = vocabulary.len(),
            max_sparsity,
            "Removed sparse terms"
        );

        Self {
            labels: self.labels.clone(),
            vocabulary,
            counts,
        }
    }
}

/// Row scaling applied when weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalization {
    None,
    /// Scale each weighted row to unit Euclidean length
    #[default]
    L2,
    /// Divide raw counts by the document's token total before IDF weighting
    TermFrequency,
}

/// Documents x terms real-valued weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfIdfMatrix {
    labels: Vec<String>,
    terms: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl TfIdfMatrix {
    pub fn new(labels: Vec<String>, terms: Vec<String>, rows: Vec<Vec<f64>>) -> Self {
        Self {
            labels,
            terms,
            rows,
        }
    }

    /// Unweighted view of a count matrix
    pub fn from_counts(matrix: &DocumentTermMatrix) -> Self {
        Self {
            labels: matrix.labels.clone(),
            terms: matrix.vocabulary.terms.clone(),
            rows: matrix
                .counts
                .iter()
                .map(|row| row.iter().map(|&c| f64::from(c)).collect())
                .collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn row(&self, doc: usize) -> &[f64] {
        &self.rows[doc]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_docs(&self) -> usize {
        self.labels.len()
    }

    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn weight(&self, label: &str, term: &str) -> Option<f64> {
        let r = self.labels.iter().position(|l| l == label)?;
        let c = self.terms.iter().position(|t| t == term)?;
        Some(self.rows[r][c])
    }

    pub fn norm(&self, doc: usize) -> f64 {
        l2_norm(&self.rows[doc])
    }

    /// Copy with every non-zero row scaled to unit length
    pub fn l2_normalized(&self) -> Self {
        Self {
            labels: self.labels.clone(),
            terms: self.terms.clone(),
            rows: self.rows.iter().map(|r| scale_to_unit(r)).collect(),
        }
    }
}

pub(crate) fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

fn scale_to_unit(v: &[f64]) -> Vec<f64> {
    let norm = l2_norm(v);
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

/// Vocabulary and IDF weights frozen from a training matrix.
///
/// `idf(t) = log2(N / df(t))`, unsmoothed: a term found in every document
/// weighs zero everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedVectorizer {
    vocabulary: Vocabulary,
    idf: Vec<f64>,
    documents: usize,
}

impl FittedVectorizer {
    pub fn fit(matrix: &DocumentTermMatrix) -> Self {
        let n = matrix.n_docs() as f64;
        let idf = (0..matrix.n_terms())
            .map(|col| {
                let df = matrix.doc_frequency(col) as f64;
                if df > 0.0 {
                    (n / df).log2()
                } else {
                    0.0
                }
            })
            .collect();

        Self {
            vocabulary: matrix.vocabulary.clone(),
            idf,
            documents: matrix.n_docs(),
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.position(term).map(|c| self.idf[c])
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Weight a count matrix against the frozen vocabulary.
    ///
    /// Columns are matched by term; terms unknown to the fitted vocabulary are dropped.
    pub fn transform(&self, matrix: &DocumentTermMatrix, normalization: Normalization) -> TfIdfMatrix {
        let columns: Vec<Option<usize>> = self
            .vocabulary
            .terms()
            .iter()
            .map(|t| matrix.vocabulary.position(t))
            .collect();

        let rows = matrix
            .counts
            .iter()
            .map(|counts| {
                let total: u64 = counts.iter().map(|&c| u64::from(c)).sum();
                let weighted: Vec<f64> = columns
                    .iter()
                    .zip(&self.idf)
                    .map(|(col, idf)| {
                        let raw = col.map(|c| f64::from(counts[c])).unwrap_or(0.0);
                        let tf = match normalization {
                            Normalization::TermFrequency if total > 0 => raw / total as f64,
                            _ => raw,
                        };
                        tf * idf
                    })
                    .collect();

                match normalization {
                    Normalization::L2 => scale_to_unit(&weighted),
                    _ => weighted,
                }
            })
            .collect();

        TfIdfMatrix {
            labels: matrix.labels.clone(),
            terms: self.vocabulary.terms.clone(),
            rows,
        }
    }
}

/// Fit on `matrix` and weight it; `normalize` selects L2 row scaling
pub fn weight_tfidf(matrix: &DocumentTermMatrix, normalize: bool) -> TfIdfMatrix {
    let normalization = if normalize {
        Normalization::L2
    } else {
        Normalization::None
    };
    FittedVectorizer::fit(matrix).transform(matrix, normalization)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &str) -> Vec<String> {
        words.split_whitespace().map(str::to_string).collect()
    }

    fn sample() -> DocumentTermMatrix {
        build_term_counts(&[
            ("a.txt".to_string(), tokens("union economy economy war")),
            ("b.txt".to_string(), tokens("union peace")),
            ("c.txt".to_string(), tokens("union economy tax")),
        ])
    }

    #[test]
    fn test_vocabulary_serializes_in_term_order() {
        let vocabulary = Vocabulary::new(["zeta", "alpha", "mid"].map(String::from));
        let json = serde_json::to_string(&vocabulary).unwrap();
        assert_eq!(
            json,
            r#"{"terms":["alpha","mid","zeta"],"index":{"alpha":0,"mid":1,"zeta":2}}"#
        );
    }

    #[test]
    fn test_build_term_counts() {
        let dtm = sample();
        assert_eq!(
            dtm.vocabulary().terms(),
            &["economy", "peace", "tax", "union", "war"]
        );
        assert_eq!(dtm.count("a.txt", "economy"), 2);
        assert_eq!(dtm.count("b.txt", "economy"), 0);
        assert_eq!(dtm.count("c.txt", "missing"), 0);
        assert_eq!(dtm.doc_frequency(3), 3);
    }

    #[test]
    fn test_term_in_every_document_weighs_zero() {
        let tfidf = weight_tfidf(&sample(), false);
        for label in ["a.txt", "b.txt", "c.txt"] {
            assert_eq!(tfidf.weight(label, "union"), Some(0.0));
        }
    }

    #[test]
    fn test_unnormalized_weights() {
        let tfidf = weight_tfidf(&sample(), false);
        let expected = 2.0 * (3.0f64 / 2.0).log2();
        let got = tfidf.weight("a.txt", "economy").unwrap_or_default();
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn test_l2_rows_have_unit_length() {
        let tfidf = weight_tfidf(&sample(), true);
        for doc in 0..tfidf.n_docs() {
            assert!((tfidf.norm(doc) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_term_frequency_normalization() {
        let dtm = sample();
        let tfidf = FittedVectorizer::fit(&dtm).transform(&dtm, Normalization::TermFrequency);
        let expected = 0.5 * (3.0f64 / 2.0).log2();
        let got = tfidf.weight("a.txt", "economy").unwrap_or_default();
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn test_transform_uses_frozen_vocabulary() {
        let fitted = FittedVectorizer::fit(&sample());
        let other = build_term_counts(&[("d.txt".to_string(), tokens("war unknown war"))]);
        let tfidf = fitted.transform(&other, Normalization::None);

        assert_eq!(tfidf.n_terms(), 5);
        let expected = 2.0 * 3.0f64.log2();
        assert!((tfidf.weight("d.txt", "war").unwrap_or_default() - expected).abs() < 1e-12);
        assert_eq!(tfidf.weight("d.txt", "unknown"), None);
    }

    #[test]
    fn test_remove_sparse_terms() {
        let dtm = sample().remove_sparse_terms(0.5);
        assert_eq!(dtm.vocabulary().terms(), &["economy", "union"]);
        assert_eq!(dtm.count("a.txt", "economy"), 2);
    }

    #[test]
    fn test_top_terms() {
        let top = sample().top_terms(2);
        assert_eq!(
            top,
            vec![("economy".to_string(), 3), ("union".to_string(), 3)]
        );
    }
}
