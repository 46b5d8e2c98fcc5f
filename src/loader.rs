use crate::document::{Corpus, Document};
use crate::error::{ClusterError, Result};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Number of metadata lines at the top of every transcript
pub const HEADER_LINES: usize = 2;

/// Outcome of loading a directory: the corpus plus files that were skipped
#[derive(Debug)]
pub struct LoadReport {
    pub corpus: Corpus,
    pub skipped: Vec<ClusterError>,
}

/// Parse a transcript: two header lines, then body lines joined by single spaces.
/// Body lines of one character or less are dropped.
pub fn parse_document(filename: &str, text: &str) -> Result<Document> {
    let mut lines = text.lines();
    let headers: Vec<String> = lines
        .by_ref()
        .take(HEADER_LINES)
        .map(|l| l.trim_end().to_string())
        .collect();

    if headers.len() < HEADER_LINES {
        return Err(ClusterError::MalformedDocument {
            filename: filename.to_string(),
            header_lines: headers.len(),
        });
    }

    let content = lines
        .map(str::trim)
        .filter(|l| l.chars().count() > 1)
        .collect::<Vec<_>>()
        .join(" ");

    Ok(Document::new(filename.to_string(), headers, content))
}

/// Load every regular file in `dir`, in lexical filename order.
///
/// Malformed or unreadable files are left out of the corpus and reported in
/// [`LoadReport::skipped`]; a directory with no usable file is an error.
pub fn load_corpus<P: AsRef<Path>>(dir: P) -> Result<LoadReport> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| ClusterError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ClusterError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut documents = Vec::new();
    let mut skipped = Vec::new();

    for path in paths {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let parsed = fs::read_to_string(&path)
            .map_err(|e| ClusterError::io(&path, e))
            .and_then(|text| parse_document(&filename, &text));

        match parsed {
            Ok(doc) => {
                if doc.year.is_none() {
                    debug!("No year found in filename '{}'", filename);
                }
                debug!(file = %filename, chars = doc.char_count, "Loaded document");
                documents.push(doc);
            }
            Err(err) => {
                warn!("Skipping '{}': {}", filename, err);
                skipped.push(err);
            }
        }
    }

    if documents.is_empty() {
        return Err(ClusterError::EmptyCorpus);
    }

    let corpus = Corpus::new(documents)?;
    info!(
        documents = corpus.len(),
        skipped = skipped.len(),
        "Loaded corpus from {}",
        dir.display()
    );

    Ok(LoadReport { corpus, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() -> Result<()> {
        let text = "State of the Union Address\nJanuary 8, 1790\n\nFellow-Citizens of the Senate:\n \nI embrace with great satisfaction\n";
        let doc = parse_document("Washington_1790.txt", text)?;

        assert_eq!(doc.headers, vec!["State of the Union Address", "January 8, 1790"]);
        assert_eq!(
            doc.content,
            "Fellow-Citizens of the Senate: I embrace with great satisfaction"
        );
        assert_eq!(doc.year, Some(1790));
        Ok(())
    }

    #[test]
    fn test_parse_drops_single_char_lines() -> Result<()> {
        let doc = parse_document("x.txt", "h1\nh2\na\nbody text\n.\n")?;
        assert_eq!(doc.content, "body text");
        Ok(())
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_document("short.txt", "only one line").unwrap_err();
        assert!(matches!(
            err,
            ClusterError::MalformedDocument { header_lines: 1, .. }
        ));
    }

    #[test]
    fn test_parse_headers_only() -> Result<()> {
        let doc = parse_document("h.txt", "h1\nh2")?;
        assert!(doc.content.is_empty());
        assert_eq!(doc.char_count, 0);
        Ok(())
    }
}
