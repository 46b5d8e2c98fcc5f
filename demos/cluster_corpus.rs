use address_cluster::{
    agglomerate, cosine_distance, cut_tree, evaluate_cuts, project_pca, weight_tfidf, Corpus, Document,
    DocumentTermMatrix, KMeans, Linkage, Normalizer, StopWords,
};
use address_cluster::wordfreq::word_frequencies;

fn address(filename: &str, body: &str) -> Document {
    Document::new(
        filename.to_string(),
        vec!["State of the Union Address".to_string(), "Joint session".to_string()],
        body.to_string(),
    )
}

fn main() -> anyhow::Result<()> {
    println!("=== Address Clustering Example ===\n");

    let corpus = Corpus::new(vec![
        address("Roosevelt_1934.txt", "Relief and recovery for farmers, workers and banks. The depression is receding."),
        address("Roosevelt_1935.txt", "Social security for workers; relief for farmers; recovery of banks."),
        address("Truman_1946.txt", "Peace, reconversion of industry and security for returning veterans."),
        address("Bush_2002.txt", "Terrorism threatens our security. Homeland defense demands vigilance."),
        address("Bush_2003.txt", "We defeat terrorism abroad and protect the homeland with vigilance."),
        address("Obama_2010.txt", "Jobs, recovery and a fair economy for workers and families."),
    ])?;
    println!("Loaded {} documents\n", corpus.len());

    // Example 1: vectorize
    let dtm = DocumentTermMatrix::from_corpus(&corpus, &Normalizer::default());
    let tfidf = weight_tfidf(&dtm, true);
    println!("--- Example 1: {} terms in the vocabulary ---", dtm.n_terms());
    for (term, count) in dtm.top_terms(5) {
        println!("  {:<12} {}", term, count);
    }

    // Example 2: distances
    let distances = cosine_distance(&tfidf)?;
    println!("\n--- Example 2: cosine distances from Bush_2002.txt ---");
    for label in distances.labels() {
        if let Some(d) = distances.between("Bush_2002.txt", label) {
            println!("  {:<20} {:.3}", label, d);
        }
    }

    // Example 3: compare linkages
    println!("\n--- Example 3: 3-cluster cuts per linkage ---");
    for linkage in [Linkage::Ward, Linkage::Average, Linkage::McQuitty] {
        let tree = agglomerate(&distances, &linkage)?;
        let assignment = cut_tree(&tree, 3)?;
        println!("  {:<9} {:?}", linkage.to_string(), assignment.ids());
    }

    // Example 4: cut quality
    println!("\n--- Example 4: cut quality (ward) ---");
    let tree = agglomerate(&distances, &Linkage::Ward)?;
    for cut in evaluate_cuts(&tree, &distances)? {
        match cut.mean_intra_distance {
            Some(d) => println!("  level {} -> {} clusters, intra {:.3}", cut.cut_level, cut.clusters, d),
            None => println!("  level {} -> {} clusters, all singletons", cut.cut_level, cut.clusters),
        }
    }

    // Example 5: k-means and PCA
    println!("\n--- Example 5: k-means (k = 3, seed 42) ---");
    let kmeans = KMeans::new(3).with_restarts(5).fit(&tfidf)?;
    let pca = project_pca(&tfidf)?;
    for ((label, id), (x, y)) in kmeans.assignment.iter().zip(&pca.points) {
        println!("  {:<20} cluster {}  ({:+.3}, {:+.3})", label, id, x, y);
    }

    // Example 6: word cloud table
    println!("\n--- Example 6: word frequencies (extended stop words) ---");
    let cloud = Normalizer::with_stop_words(StopWords::extended());
    for word in word_frequencies(&corpus, &cloud, 5) {
        println!("  {:<12} {}", word.word, word.count);
    }

    println!("\n=== Example Complete ===");

    Ok(())
}
