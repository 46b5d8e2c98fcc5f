use crate::document::Corpus;
use crate::error::{ClusterError, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Write the loaded corpus so later runs can skip parsing the transcripts
pub fn save<P: AsRef<Path>>(path: P, corpus: &Corpus) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| ClusterError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, corpus)?;
    writer.flush().map_err(|e| ClusterError::io(path, e))?;

    info!(documents = corpus.len(), "Saved corpus snapshot to {}", path.display());
    Ok(())
}

/// Read a snapshot written by [`save`]
pub fn load<P: AsRef<Path>>(path: P) -> Result<Corpus> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ClusterError::io(path, e))?;
    let snapshot: Corpus = bincode::deserialize_from(BufReader::new(file))?;

    // Re-check the uniqueness invariant on data we did not build ourselves
    let corpus = Corpus::new(snapshot.documents().to_vec())?;
    info!(documents = corpus.len(), "Loaded corpus snapshot from {}", path.display());
    Ok(corpus)
}

/// Load the snapshot when it exists, otherwise build the corpus and save it
pub fn load_or_build<P, F>(path: P, build: F) -> Result<Corpus>
where
    P: AsRef<Path>,
    F: FnOnce() -> Result<Corpus>,
{
    let path = path.as_ref();
    if path.exists() {
        return load(path);
    }
    let corpus = build()?;
    save(path, &corpus)?;
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use std::path::PathBuf;

    fn scratch_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("address-cluster-{}-{}", std::process::id(), name))
    }

    fn corpus() -> Corpus {
        Corpus::new(vec![Document::new(
            "Lincoln_1862.txt".to_string(),
            vec!["Annual Message".to_string(), "December 1, 1862".to_string()],
            "Fellow citizens, we cannot escape history".to_string(),
        )])
        .unwrap()
    }

    #[test]
    fn test_snapshot_round_trip() -> Result<()> {
        let path = scratch_file("round-trip.bin");
        save(&path, &corpus())?;
        let loaded = load(&path)?;
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, corpus());
        assert_eq!(loaded.documents()[0].year, Some(1862));
        Ok(())
    }

    #[test]
    fn test_load_or_build_uses_existing_snapshot() -> Result<()> {
        let path = scratch_file("cached.bin");
        let built = load_or_build(&path, || Ok(corpus()))?;
        let cached = load_or_build(&path, || Err(ClusterError::EmptyCorpus))?;
        std::fs::remove_file(&path).ok();

        assert_eq!(built, cached);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let err = load(scratch_file("missing.bin")).unwrap_err();
        assert!(matches!(err, ClusterError::Io { .. }));
    }
}
