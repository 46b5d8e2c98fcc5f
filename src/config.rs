use crate::error::{ClusterError, Result};
use crate::hierarchy::Linkage;
use crate::kmeans::KMeans;
use crate::normalizer::{NormalizerConfig, StopWords};
use crate::vectorizer::Normalization;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for one analysis run, loadable from a JSON file.
///
/// Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Stem tokens before counting
    pub stem: bool,
    /// Added to the English list used for vectorizing
    pub extra_stop_words: Vec<String>,
    /// Added to the extended list used for word-frequency tables
    pub cloud_stop_words: Vec<String>,
    pub normalization: Normalization,
    /// Drop terms missing from at least this share of documents
    pub max_sparsity: Option<f64>,
    pub linkage: Linkage,
    pub clusters: usize,
    pub kmeans_max_iterations: usize,
    pub kmeans_seed: u64,
    pub kmeans_restarts: usize,
    pub top_words: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stem: false,
            extra_stop_words: Vec::new(),
            cloud_stop_words: Vec::new(),
            normalization: Normalization::L2,
            max_sparsity: None,
            linkage: Linkage::Ward,
            clusters: 4,
            kmeans_max_iterations: 100,
            kmeans_seed: 42,
            kmeans_restarts: 1,
            top_words: 50,
        }
    }
}

impl AnalysisConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ClusterError::io(path, e))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.clusters == 0 {
            return Err(ClusterError::Config("clusters must be at least 1".to_string()));
        }
        if self.kmeans_max_iterations == 0 {
            return Err(ClusterError::Config(
                "kmeans_max_iterations must be at least 1".to_string(),
            ));
        }
        if self.kmeans_restarts == 0 {
            return Err(ClusterError::Config(
                "kmeans_restarts must be at least 1".to_string(),
            ));
        }
        if let Some(s) = self.max_sparsity {
            if !(s > 0.0 && s <= 1.0) {
                return Err(ClusterError::Config(format!(
                    "max_sparsity must be in (0, 1], got {}",
                    s
                )));
            }
        }
        Ok(())
    }

    /// Normalizer settings for vectorizing
    pub fn model_normalizer(&self) -> NormalizerConfig {
        NormalizerConfig {
            stop_words: StopWords::english().with_words(&self.extra_stop_words),
            stem: self.stem,
        }
    }

    /// Normalizer settings for word-frequency tables; never stemmed
    pub fn cloud_normalizer(&self) -> NormalizerConfig {
        NormalizerConfig {
            stop_words: StopWords::extended().with_words(&self.cloud_stop_words),
            stem: false,
        }
    }

    pub fn kmeans(&self) -> KMeans {
        KMeans::new(self.clusters)
            .with_seed(self.kmeans_seed)
            .with_max_iterations(self.kmeans_max_iterations)
            .with_restarts(self.kmeans_restarts)
    }
}
