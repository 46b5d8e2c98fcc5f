use crate::assignment::ClusterAssignment;
use crate::document::Corpus;
use crate::normalizer::Normalizer;
use crate::vectorizer::build_term_counts;
use serde::{Deserialize, Serialize};

/// One row of a word-cloud table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Most frequent words over the documents selected by `include`
fn top_words<F>(corpus: &Corpus, normalizer: &Normalizer, top: usize, include: F) -> Vec<WordCount>
where
    F: Fn(usize) -> bool,
{
    let docs: Vec<(String, Vec<String>)> = corpus
        .iter()
        .enumerate()
        .filter(|(i, _)| include(*i))
        .map(|(_, d)| (d.filename.clone(), normalizer.normalize(&d.content)))
        .collect();

    build_term_counts(&docs)
        .top_terms(top)
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect()
}

/// Corpus-wide word frequencies, highest first
pub fn word_frequencies(corpus: &Corpus, normalizer: &Normalizer, top: usize) -> Vec<WordCount> {
    top_words(corpus, normalizer, top, |_| true)
}

/// Word frequencies per cluster, cluster `id` at index `id - 1`
pub fn cluster_word_frequencies(
    corpus: &Corpus,
    normalizer: &Normalizer,
    assignment: &ClusterAssignment,
    top: usize,
) -> Vec<Vec<WordCount>> {
    (1..=assignment.cluster_count())
        .map(|id| top_words(corpus, normalizer, top, |doc| assignment.ids()[doc] == id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::normalizer::StopWords;

    fn corpus() -> Corpus {
        let doc = |name: &str, body: &str| {
            Document::new(name.to_string(), vec![String::new(), String::new()], body.to_string())
        };
        Corpus::new(vec![
            doc("a_1901.txt", "We will build canals and canals and railroads"),
            doc("b_1902.txt", "The canals of the nation"),
            doc("c_2001.txt", "Terror and security; security first"),
        ])
        .unwrap()
    }

    #[test]
    fn test_word_frequencies_use_extended_list() {
        let normalizer = Normalizer::with_stop_words(StopWords::extended());
        let words = word_frequencies(&corpus(), &normalizer, 2);

        assert_eq!(
            words,
            vec![
                WordCount { word: "canals".into(), count: 3 },
                WordCount { word: "security".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_cluster_word_frequencies() {
        let normalizer = Normalizer::with_stop_words(StopWords::extended());
        let assignment = ClusterAssignment::from_groups(corpus().filenames(), &[0, 0, 1]);
        let clouds = cluster_word_frequencies(&corpus(), &normalizer, &assignment, 1);

        assert_eq!(clouds.len(), 2);
        assert_eq!(clouds[0][0].word, "canals");
        assert_eq!(clouds[1][0].word, "security");
    }
}
