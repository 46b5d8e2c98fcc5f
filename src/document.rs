use crate::error::{ClusterError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

lazy_static::lazy_static! {
    static ref YEAR_PATTERN: Regex = Regex::new(r"\d{4}").expect("valid year pattern");
}

/// Document represents one transcript of the corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    pub headers: Vec<String>,
    pub content: String,
    pub char_count: usize,
    #[serde(default)]
    pub year: Option<u16>,
}

impl Document {
    pub fn new(filename: String, headers: Vec<String>, content: String) -> Self {
        let char_count = content.chars().count();
        let year = year_from_filename(&filename);
        Self {
            filename,
            headers,
            content,
            char_count,
            year,
        }
    }
}

/// First four-digit run in a filename, if any
pub fn year_from_filename(filename: &str) -> Option<u16> {
    YEAR_PATTERN
        .find(filename)
        .and_then(|m| m.as_str().parse().ok())
}

/// Ordered collection of documents with unique filenames
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Result<Self> {
        let mut seen = HashSet::new();
        for doc in &documents {
            if !seen.insert(doc.filename.as_str()) {
                return Err(ClusterError::DuplicateDocument(doc.filename.clone()));
            }
        }
        Ok(Self { documents })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.filename == filename)
    }

    pub fn filenames(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.filename.clone()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> Document {
        Document::new(
            name.to_string(),
            vec!["State of the Union".to_string(), "Address".to_string()],
            "We the people".to_string(),
        )
    }

    #[test]
    fn test_year_from_filename() {
        assert_eq!(year_from_filename("Obama_2013.txt"), Some(2013));
        assert_eq!(year_from_filename("sotu-1946-truman.txt"), Some(1946));
        assert_eq!(year_from_filename("undated.txt"), None);
        assert_eq!(year_from_filename("v12.txt"), None);
    }

    #[test]
    fn test_document_char_count() {
        let d = doc("Bush_2002.txt");
        assert_eq!(d.char_count, 13);
        assert_eq!(d.year, Some(2002));
    }

    #[test]
    fn test_corpus_rejects_duplicates() {
        let err = Corpus::new(vec![doc("a_2001.txt"), doc("a_2001.txt")]).unwrap_err();
        assert!(matches!(err, ClusterError::DuplicateDocument(name) if name == "a_2001.txt"));
    }

    #[test]
    fn test_corpus_keeps_order() -> Result<()> {
        let corpus = Corpus::new(vec![doc("b.txt"), doc("a.txt")])?;
        assert_eq!(corpus.filenames(), vec!["b.txt", "a.txt"]);
        assert!(corpus.get("a.txt").is_some());
        Ok(())
    }
}
