use crate::assignment::ClusterAssignment;
use crate::config::AnalysisConfig;
use crate::distance::{cosine_distance, DistanceMatrix};
use crate::document::Corpus;
use crate::hierarchy::{agglomerate, cut_tree, evaluate_cuts, ClusterTree, CutQuality};
use crate::kmeans::KMeansResult;
use crate::loader::load_corpus;
use crate::normalizer::Normalizer;
use crate::pca::{project_pca, PcaProjection};
use crate::report;
use crate::snapshot;
use crate::vectorizer::{DocumentTermMatrix, FittedVectorizer, TfIdfMatrix};
use crate::wordfreq::{cluster_word_frequencies, word_frequencies, WordCount};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Every intermediate and final table of one run
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub corpus: Corpus,
    /// Files left out of the corpus, with the reason
    pub skipped: Vec<String>,
    pub term_matrix: DocumentTermMatrix,
    pub vectorizer: FittedVectorizer,
    pub tfidf: TfIdfMatrix,
    pub distances: DistanceMatrix,
    pub tree: ClusterTree,
    pub hierarchical: ClusterAssignment,
    pub cuts: Vec<CutQuality>,
    pub kmeans: KMeansResult,
    pub pca: PcaProjection,
    pub words: Vec<WordCount>,
    /// Word frequencies per k-means cluster, cluster `id` at index `id - 1`
    pub cluster_words: Vec<Vec<WordCount>>,
}

/// Fixed sequence of stages: normalize, count, weight, distances,
/// hierarchical clustering and cut evaluation, k-means, PCA, word counts
pub struct Pipeline {
    config: AnalysisConfig,
    model: Normalizer,
    cloud: Normalizer,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model: Normalizer::new(config.model_normalizer()),
            cloud: Normalizer::new(config.cloud_normalizer()),
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load the corpus from `dir`, or from the `cache` snapshot when that file exists
    pub fn load(&self, dir: &Path, cache: Option<&Path>) -> Result<(Corpus, Vec<String>)> {
        let mut skipped = Vec::new();
        let mut parse = || -> crate::Result<Corpus> {
            let report = load_corpus(dir)?;
            skipped = report.skipped.iter().map(|e| e.to_string()).collect();
            Ok(report.corpus)
        };

        let corpus = match cache {
            Some(path) => snapshot::load_or_build(path, parse)
                .with_context(|| format!("Failed to load corpus via snapshot {}", path.display()))?,
            None => parse().with_context(|| format!("Failed to load corpus from {}", dir.display()))?,
        };
        Ok((corpus, skipped))
    }

    /// Document-term counts after normalization and optional sparse-term pruning
    pub fn term_matrix(&self, corpus: &Corpus) -> DocumentTermMatrix {
        let dtm = DocumentTermMatrix::from_corpus(corpus, &self.model);
        match self.config.max_sparsity {
            Some(s) => dtm.remove_sparse_terms(s),
            None => dtm,
        }
    }

    /// Cut-quality table for choosing the number of clusters
    pub fn cut_table(&self, corpus: &Corpus) -> Result<Vec<CutQuality>> {
        let dtm = self.term_matrix(corpus);
        let tfidf = FittedVectorizer::fit(&dtm).transform(&dtm, self.config.normalization);
        let distances = cosine_distance(&tfidf)?;
        let tree = agglomerate(&distances, &self.config.linkage)?;
        Ok(evaluate_cuts(&tree, &distances)?.collect())
    }

    pub fn word_table(&self, corpus: &Corpus, top: usize) -> Vec<WordCount> {
        word_frequencies(corpus, &self.cloud, top)
    }

    pub fn run(&self, corpus: Corpus, skipped: Vec<String>) -> Result<Analysis> {
        let term_matrix = self.term_matrix(&corpus);
        info!(
            documents = term_matrix.n_docs(),
            terms = term_matrix.n_terms(),
            "Vectorizing corpus"
        );

        let vectorizer = FittedVectorizer::fit(&term_matrix);
        let tfidf = vectorizer.transform(&term_matrix, self.config.normalization);
        let distances = cosine_distance(&tfidf).context("Failed to compute distances")?;

        let tree = agglomerate(&distances, &self.config.linkage)?;
        let hierarchical = cut_tree(&tree, self.config.clusters)
            .with_context(|| format!("Failed to cut tree into {} clusters", self.config.clusters))?;
        let cuts: Vec<CutQuality> = evaluate_cuts(&tree, &distances)?.collect();
        info!(
            linkage = %self.config.linkage,
            clusters = hierarchical.cluster_count(),
            "Hierarchical clustering done"
        );

        // k-means and PCA require unit-length rows whatever weighting was chosen
        let unit = tfidf.l2_normalized();
        let kmeans = self
            .config
            .kmeans()
            .fit(&unit)
            .context("Failed to run k-means")?;
        info!(
            converged = kmeans.converged,
            within_ss = kmeans.total_within_ss(),
            "k-means done"
        );
        let pca = project_pca(&unit)?;

        let words = word_frequencies(&corpus, &self.cloud, self.config.top_words);
        let cluster_words =
            cluster_word_frequencies(&corpus, &self.cloud, &kmeans.assignment, self.config.top_words);

        Ok(Analysis {
            corpus,
            skipped,
            term_matrix,
            vectorizer,
            tfidf,
            distances,
            tree,
            hierarchical,
            cuts,
            kmeans,
            pca,
            words,
            cluster_words,
        })
    }
}

impl Analysis {
    /// Write every table as CSV plus the full analysis as JSON into `dir`
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        write_table(dir, "terms.csv", |w| Ok(report::write_term_matrix(w, &self.term_matrix)?))?;
        write_table(dir, "distances.csv", |w| Ok(report::write_distances(w, &self.distances)?))?;
        write_table(dir, "hclust.csv", |w| Ok(report::write_assignment(w, &self.hierarchical)?))?;
        write_table(dir, "kmeans.csv", |w| Ok(report::write_assignment(w, &self.kmeans.assignment)?))?;
        write_table(dir, "cuts.csv", |w| Ok(report::write_cuts(w, &self.cuts)?))?;
        write_table(dir, "pca.csv", |w| Ok(report::write_pca(w, &self.pca)?))?;
        write_table(dir, "wordfreq.csv", |w| Ok(report::write_word_frequencies(w, &self.words)?))?;
        write_table(dir, "analysis.json", |w| Ok(serde_json::to_writer_pretty(w, self)?))?;

        info!("Wrote analysis to {}", dir.display());
        Ok(())
    }
}

/// Create `dir/name`, fill it and flush, so a failed write is reported
fn write_table<F>(dir: &Path, name: &str, body: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let path = dir.join(name);
    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    body(&mut writer)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn doc(name: &str, body: &str) -> Document {
        Document::new(
            name.to_string(),
            vec!["Annual Message".to_string(), "Date".to_string()],
            body.to_string(),
        )
    }

    #[test]
    fn test_run_pipeline() -> Result<()> {
        let corpus = Corpus::new(vec![
            doc("a_1900.txt", "tariff railroads tariff gold"),
            doc("b_1901.txt", "tariff railroads gold silver"),
            doc("c_2000.txt", "internet terrorism security"),
            doc("d_2001.txt", "terrorism security internet homeland"),
        ])?;
        let config = AnalysisConfig {
            clusters: 2,
            kmeans_restarts: 10,
            ..Default::default()
        };

        let analysis = Pipeline::new(config)?.run(corpus, Vec::new())?;

        assert_eq!(analysis.hierarchical.ids(), &[1, 1, 2, 2]);
        assert_eq!(analysis.kmeans.assignment.ids(), &[1, 1, 2, 2]);
        assert_eq!(analysis.cuts.len(), 3);
        assert_eq!(analysis.tree.merges().len(), 3);
        assert_eq!(analysis.cluster_words.len(), 2);
        Ok(())
    }

    #[test]
    fn test_write_to_flushes_complete_tables() -> Result<()> {
        let corpus = Corpus::new(vec![
            doc("a_1900.txt", "tariff railroads tariff gold"),
            doc("b_1901.txt", "tariff railroads gold silver"),
            doc("c_2000.txt", "internet terrorism security"),
        ])?;
        let config = AnalysisConfig {
            clusters: 2,
            kmeans_restarts: 10,
            ..Default::default()
        };
        let analysis = Pipeline::new(config)?.run(corpus, Vec::new())?;

        let dir = std::env::temp_dir().join(format!("address-cluster-write-{}", std::process::id()));
        analysis.write_to(&dir)?;
        let distances = fs::read_to_string(dir.join("distances.csv"))?;
        let json = fs::read_to_string(dir.join("analysis.json"))?;
        fs::remove_dir_all(&dir)?;

        let rows: Vec<&str> = distances.lines().collect();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|row| row.split(',').count() == 4));
        assert!(distances.ends_with('\n'));
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
        Ok(())
    }

    #[test]
    fn test_pipeline_rejects_bad_k() -> Result<()> {
        let corpus = Corpus::new(vec![doc("a.txt", "alpha beta"), doc("b.txt", "gamma delta")])?;
        let config = AnalysisConfig {
            clusters: 2,
            ..Default::default()
        };
        assert!(Pipeline::new(config)?.run(corpus, Vec::new()).is_err());
        Ok(())
    }
}
