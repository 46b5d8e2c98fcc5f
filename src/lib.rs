pub mod assignment;
pub mod config;
pub mod distance;
pub mod document;
pub mod error;
pub mod hierarchy;
pub mod kmeans;
pub mod loader;
pub mod normalizer;
pub mod pca;
pub mod pipeline;
pub mod report;
pub mod snapshot;
pub mod vectorizer;
pub mod wordfreq;

// Re-export commonly used types
pub use assignment::ClusterAssignment;
pub use config::AnalysisConfig;
pub use distance::{cosine_distance, DistanceMatrix};
pub use document::{Corpus, Document};
pub use hierarchy::{agglomerate, cut_tree, evaluate_cuts, ClusterTree, CutQuality, Linkage, LinkageCriterion};
pub use kmeans::{KMeans, KMeansResult};
pub use loader::{load_corpus, parse_document, LoadReport};
pub use normalizer::{Normalizer, NormalizerConfig, StopWords};
pub use pca::{project_pca, PcaProjection};
pub use pipeline::{Analysis, Pipeline};
pub use vectorizer::{build_term_counts, weight_tfidf, DocumentTermMatrix, FittedVectorizer, Normalization, TfIdfMatrix};

// Re-export error types
pub use error::{ClusterError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, body: &str) -> Document {
        Document::new(
            name.to_string(),
            vec!["State of the Union".to_string(), "Address".to_string()],
            body.to_string(),
        )
    }

    #[test]
    fn test_basic_workflow() -> Result<()> {
        let corpus = Corpus::new(vec![
            doc("A_1990.txt", "budget deficit taxes"),
            doc("B_1991.txt", "taxes budget deficit"),
            doc("C_1992.txt", "education schools teachers"),
        ])?;

        let dtm = DocumentTermMatrix::from_corpus(&corpus, &Normalizer::default());
        let tfidf = weight_tfidf(&dtm, true);
        let distances = cosine_distance(&tfidf)?;

        assert!(distances.between("A_1990.txt", "B_1991.txt").unwrap_or(1.0).abs() < 1e-12);
        assert_eq!(distances.between("A_1990.txt", "C_1992.txt"), Some(1.0));
        assert_eq!(distances.between("B_1991.txt", "C_1992.txt"), Some(1.0));

        let tree = agglomerate(&distances, &Linkage::Ward)?;
        let assignment = cut_tree(&tree, 2)?;
        assert_eq!(assignment.members(1), vec!["A_1990.txt", "B_1991.txt"]);
        assert_eq!(assignment.members(2), vec!["C_1992.txt"]);

        Ok(())
    }

    #[test]
    fn test_fully_filtered_document_is_neutral() -> Result<()> {
        let corpus = Corpus::new(vec![
            doc("A.txt", "railroads and canals"),
            doc("B.txt", "canals and harbors"),
            doc("C.txt", "and the of to 1812"),
        ])?;

        let dtm = DocumentTermMatrix::from_corpus(&corpus, &Normalizer::default());
        assert!(dtm.row(2).iter().all(|&c| c == 0));

        let distances = cosine_distance(&weight_tfidf(&dtm, true))?;
        assert_eq!(distances.between("C.txt", "A.txt"), Some(1.0));
        assert_eq!(distances.between("C.txt", "B.txt"), Some(1.0));
        Ok(())
    }

    #[test]
    fn test_empty_vocabulary() -> Result<()> {
        let corpus = Corpus::new(vec![doc("A.txt", "the and of"), doc("B.txt", "to be or not")])?;
        let dtm = DocumentTermMatrix::from_corpus(&corpus, &Normalizer::default());

        assert!(matches!(
            cosine_distance(&weight_tfidf(&dtm, true)),
            Err(ClusterError::EmptyVocabulary)
        ));
        assert!(matches!(
            KMeans::new(1).fit(&weight_tfidf(&dtm, true)),
            Err(ClusterError::EmptyVocabulary)
        ));
        Ok(())
    }
}
