//! cinerec - content-based movie recommendations from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cinerec_cluster::project_2d;
use cinerec_corpus::Corpus;
use cinerec_embed::{EmbedConfig, Embedder, HashEmbedder, OpenAiCompat};
use cinerec_recommend::{BlendStrategy, BuildOptions, Recommendation, Recommender};

/// Content-based movie recommendation CLI.
///
/// `build` embeds and clusters a movie catalogue into an artifact
/// directory; `like` and `search` answer queries against those artifacts.
#[derive(Parser)]
#[command(name = "cinerec")]
#[command(about = "Content-based movie recommendations")]
#[command(version)]
struct Cli {
    /// Corpus file (';'-delimited, columns: title, synopsis, genres)
    #[arg(short = 'd', long, global = true, default_value = "data/movies.csv")]
    data: PathBuf,

    /// Artifact directory (vectors + cluster labels)
    #[arg(short = 'a', long, global = true, default_value = "data/vectorized")]
    artifacts: PathBuf,

    /// Use the local deterministic hash embedder instead of a remote API
    #[arg(long, global = true)]
    local: bool,

    /// API key for the embedding endpoint (or OPENAI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Base URL of an OpenAI-compatible embedding endpoint
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Embedding model name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Embedding dimension override
    #[arg(long, global = true)]
    dim: Option<usize>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed and cluster the corpus, writing artifacts
    Build {
        /// Cluster count (default: chosen from corpus size)
        #[arg(short = 'k', long)]
        clusters: Option<usize>,

        /// Skip clustering entirely
        #[arg(long)]
        no_cluster: bool,

        /// Clustering seed
        #[arg(long, default_value_t = cinerec_cluster::kmeans::DEFAULT_SEED)]
        seed: u64,

        /// Also print a 2-D projection of the clustered corpus
        #[arg(long)]
        plot: bool,
    },

    /// Movies similar to an existing title
    Like {
        title: String,

        /// Number of results
        #[arg(short = 'n', long, default_value_t = 5)]
        top_k: usize,
    },

    /// Movies matching a free-text query
    Search {
        query: String,

        /// Number of results
        #[arg(short = 'n', long, default_value_t = 5)]
        top_k: usize,

        /// Bias results toward the query's inferred cluster
        #[arg(long)]
        cluster_filter: bool,

        /// Use multiplicative score boosting instead of the quota split
        #[arg(long)]
        boost: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    }

    let embedder = make_embedder(&cli)?;
    let corpus = Corpus::load(&cli.data)
        .with_context(|| format!("loading corpus from {}", cli.data.display()))?;

    match &cli.command {
        Commands::Build {
            clusters,
            no_cluster,
            seed,
            plot,
        } => {
            let opts = BuildOptions {
                cluster: !no_cluster,
                k: *clusters,
                seed: *seed,
                ..Default::default()
            };
            let rec = Recommender::build(corpus, embedder, opts).await?;
            rec.save_artifacts(&cli.artifacts)?;
            println!(
                "indexed {} movies into {}",
                rec.corpus().len(),
                cli.artifacts.display()
            );

            if *plot {
                let coords = project_2d(rec.vectors(), *seed);
                for (movie, (x, y)) in rec.corpus().iter().zip(coords) {
                    println!("{:>8.3} {:>8.3}  {}", x, y, movie.title);
                }
            }
        }

        Commands::Like { title, top_k } => {
            let rec = load(&cli, corpus, embedder, BlendStrategy::default())?;
            let results = rec.recommend_by_title(title, *top_k)?;
            println!("Movies similar to '{title}':");
            print_results(&results);
        }

        Commands::Search {
            query,
            top_k,
            cluster_filter,
            boost,
        } => {
            let blend = if *boost {
                BlendStrategy::boost()
            } else {
                BlendStrategy::default()
            };
            let rec = load(&cli, corpus, embedder, blend)?;
            let results = rec.recommend_by_query(query, *top_k, *cluster_filter).await?;
            println!("Results for '{query}':");
            print_results(&results);
        }
    }

    Ok(())
}

fn make_embedder(cli: &Cli) -> Result<Arc<dyn Embedder>> {
    if cli.local {
        return Ok(Arc::new(HashEmbedder::new(cli.dim.unwrap_or(0))));
    }

    let api_key = cli
        .api_key
        .clone()
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .unwrap_or_default();

    let mut cfg = EmbedConfig::default();
    if let Some(model) = &cli.model {
        cfg = cfg.with_model(model);
    }
    if let Some(url) = &cli.base_url {
        cfg = cfg.with_base_url(url);
    }
    if let Some(dim) = cli.dim {
        cfg = cfg.with_dimension(dim);
    }

    let embedder =
        OpenAiCompat::with_config(&api_key, cfg).context("initializing embedding backend")?;
    Ok(Arc::new(embedder))
}

fn load(
    cli: &Cli,
    corpus: Corpus,
    embedder: Arc<dyn Embedder>,
    blend: BlendStrategy,
) -> Result<Recommender> {
    Recommender::load_artifacts(&cli.artifacts, corpus, embedder, blend).with_context(|| {
        format!(
            "loading artifacts from {} (run 'cinerec build' first)",
            cli.artifacts.display()
        )
    })
}

fn print_results(results: &[Recommendation]) {
    if results.is_empty() {
        println!("  no results");
        return;
    }
    for r in results {
        println!("{:>3}. {} (similarity: {:.3})", r.rank, r.title, r.similarity);
        if !r.genres.is_empty() {
            println!("     genres: {}", r.genres.join(", "));
        }
        if let Some(excerpt) = &r.excerpt {
            println!("     {excerpt}");
        }
    }
}
