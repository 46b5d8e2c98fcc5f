use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One cluster id per document; ids are contiguous from 1, numbered in order
/// of first appearance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    labels: Vec<String>,
    ids: Vec<usize>,
}

impl ClusterAssignment {
    /// Relabel arbitrary group keys into contiguous ids starting at 1
    pub fn from_groups(labels: Vec<String>, groups: &[usize]) -> Self {
        let mut remap: HashMap<usize, usize> = HashMap::new();
        let ids = groups
            .iter()
            .map(|g| {
                let next = remap.len() + 1;
                *remap.entry(*g).or_insert(next)
            })
            .collect();
        Self { labels, ids }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn cluster_count(&self) -> usize {
        self.ids.iter().copied().max().unwrap_or(0)
    }

    pub fn cluster_of(&self, label: &str) -> Option<usize> {
        let i = self.labels.iter().position(|l| l == label)?;
        Some(self.ids[i])
    }

    /// Document indices grouped by cluster, index 0 holding cluster 1
    pub fn clusters(&self) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); self.cluster_count()];
        for (doc, &id) in self.ids.iter().enumerate() {
            groups[id - 1].push(doc);
        }
        groups
    }

    pub fn members(&self, id: usize) -> Vec<&str> {
        self.labels
            .iter()
            .zip(&self.ids)
            .filter(|&(_, &c)| c == id)
            .map(|(l, _)| l.as_str())
            .collect()
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.clusters().iter().map(Vec::len).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(String::as_str).zip(self.ids.iter().copied())
    }
}
