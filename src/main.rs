use address_cluster::{AnalysisConfig, Linkage, Pipeline};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Cluster presidential address transcripts", long_about = None)]
struct Cli {
    /// JSON file with analysis settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full pipeline and write every table
    Analyze {
        /// Directory of transcripts
        #[arg(short, long)]
        dir: PathBuf,

        /// Output directory for CSV and JSON tables
        #[arg(short, long, default_value = "analysis")]
        out: PathBuf,

        /// Number of clusters for tree cutting and k-means
        #[arg(short, long)]
        k: Option<usize>,

        /// ward, ward-d2, average, mcquitty, single or complete
        #[arg(short, long)]
        linkage: Option<String>,

        /// Seed for k-means initialization
        #[arg(short, long)]
        seed: Option<u64>,

        /// Corpus snapshot to reuse (created when missing)
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Print the cut-quality table of the hierarchical clustering
    Cuts {
        #[arg(short, long)]
        dir: PathBuf,

        #[arg(short, long)]
        linkage: Option<String>,
    },

    /// Print the most frequent words with the extended stop-word list
    Words {
        #[arg(short, long)]
        dir: PathBuf,

        #[arg(short, long, default_value_t = 25)]
        top: usize,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn parse_linkage(config: &mut AnalysisConfig, linkage: Option<String>) -> Result<()> {
    if let Some(name) = linkage {
        config.linkage = name.parse::<Linkage>()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("address_cluster=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Analyze {
            dir,
            out,
            k,
            linkage,
            seed,
            snapshot,
        } => {
            if let Some(k) = k {
                config.clusters = k;
            }
            if let Some(seed) = seed {
                config.kmeans_seed = seed;
            }
            parse_linkage(&mut config, linkage)?;

            let pipeline = Pipeline::new(config)?;
            let (corpus, skipped) = pipeline.load(&dir, snapshot.as_deref())?;
            info!(documents = corpus.len(), skipped = skipped.len(), "Corpus ready");

            let analysis = pipeline.run(corpus, skipped)?;
            analysis.write_to(&out)?;

            println!(
                "Clustered {} documents ({} linkage, k = {})",
                analysis.corpus.len(),
                pipeline.config().linkage,
                pipeline.config().clusters
            );
            for (id, members) in analysis.hierarchical.clusters().iter().enumerate() {
                let names: Vec<&str> = members
                    .iter()
                    .map(|&doc| analysis.hierarchical.labels()[doc].as_str())
                    .collect();
                println!("  cluster {}: {}", id + 1, names.join(", "));
            }
            for reason in &analysis.skipped {
                println!("  skipped: {}", reason);
            }
            println!("Tables written to {}", out.display());
        }

        Commands::Cuts { dir, linkage } => {
            parse_linkage(&mut config, linkage)?;
            let pipeline = Pipeline::new(config)?;
            let (corpus, _) = pipeline.load(&dir, None)?;

            println!("{:>9} {:>8} {:>10} {:>10}", "cut_level", "clusters", "mean_size", "intra");
            for cut in pipeline.cut_table(&corpus)? {
                let intra = cut
                    .mean_intra_distance
                    .map(|d| format!("{:.4}", d))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:>9} {:>8} {:>10.2} {:>10}",
                    cut.cut_level, cut.clusters, cut.mean_cluster_size, intra
                );
            }
        }

        Commands::Words { dir, top } => {
            let pipeline = Pipeline::new(config)?;
            let (corpus, _) = pipeline.load(&dir, None)?;

            for word in pipeline.word_table(&corpus, top) {
                println!("{:>6}  {}", word.count, word.word);
            }
        }
    }

    Ok(())
}
