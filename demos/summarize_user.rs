use anyhow::{bail, Context};
use clap::Parser;
use listening_dashboard::analytics::{summarize, unique_artists};
use listening_dashboard::api::{DataSource, DirSource, HttpSource};
use listening_dashboard::catalog::{load_genres, load_index, load_user};
use listening_dashboard::config::{DashboardConfig, DataLayout};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Print every dashboard aggregate for one user of an export.
#[derive(Parser, Debug)]
struct Args {
    /// Export root: a local directory or an http(s) base URL holding index.json and data/
    #[arg(long)]
    root: String,

    /// User identifier as listed in the index
    #[arg(long)]
    user: String,

    /// Optional TOML config; its limits and load strategy are used, its layout is replaced by --root
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            DashboardConfig::from_toml_str(&raw)?
        }
        None => DashboardConfig::default(),
    };

    if args.root.starts_with("http://") || args.root.starts_with("https://") {
        config.layout = DataLayout::rooted_at(&args.root);
        run(&HttpSource::new(), &config, &args.user).await
    } else {
        config.layout = DataLayout::rooted_at("");
        run(&DirSource::new(&args.root), &config, &args.user).await
    }
}

async fn run<S: DataSource>(source: &S, config: &DashboardConfig, user: &str) -> anyhow::Result<()> {
    let index = load_index(source, &config.layout).await?;
    let Some(files) = index.0.get(user) else {
        bail!("{} is not in the index (known: {})", user, index.users().collect::<Vec<_>>().join(", "));
    };

    let record = load_user(source, &config.layout, user, files, config.load_strategy).await?;
    let genres = load_genres(source, &config.layout, user).await;
    let summary = summarize(&record, &genres, &config.limits);

    println!("--- {} ---", summary.user);
    println!("Music plays: {}, podcast plays: {}, distinct artists: {}",
        record.streaming_history.music.len(),
        record.streaming_history.podcast.len(),
        unique_artists(&record).len());

    println!("\nPlaylists");
    for p in &summary.playlists {
        println!("  {:<30} {}", p.name, p.count);
    }

    println!("\nTop library artists");
    for a in &summary.top_artists {
        println!("  {:<30} {}", a.name, a.value);
    }

    println!("\nGenres");
    for g in &summary.genres {
        println!("  {:<30} {}", g.name, g.value);
    }

    println!("\nAverage play length by time of day");
    for b in &summary.time_of_day {
        println!("  {:<8} {:>8.1}s  ({} plays)", b.label, b.mean_seconds, b.events);
    }

    println!("\nMinutes per month");
    for m in &summary.monthly {
        println!("  {}  {:>10.1}", m.month, m.minutes);
    }

    println!("\nTop track per month");
    for t in &summary.top_tracks {
        println!("  {}  {} - {} ({} min)", t.month, t.track, t.artist, t.ms_played / 60_000);
    }

    println!("\nTop searches");
    for s in &summary.searches {
        println!("  {:<30} {}", s.name, s.value);
    }

    Ok(())
}
