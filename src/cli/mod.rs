use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::{
    config::{self, Config},
    http::server::HttpServer,
    library::{
        catalog::Catalog,
        wiki::{WikiClient, YearLookup},
    },
};

#[derive(Parser)]
#[command(name = "hitplay")]
#[command(version = "0.1")]
#[command(about = "Music trivia party game for a local music library")]
pub struct Cli {
    /// Path to the config TOML file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the music library and write the answer key
    Index,
    /// Print the answer key
    List,
    /// Run the http server hosting the game
    Serve,
}

/// Entrypoint for CLI
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::Config::load(&cli.config)?;

    match &cli.command {
        Commands::Index => index(&cfg),
        Commands::List => list(&cfg),
        Commands::Serve => serve(cfg),
    }
}

fn index(cfg: &Config) -> anyhow::Result<()> {
    let wiki = cfg
        .catalog
        .wiki_lookup
        .then(WikiClient::new)
        .transpose()
        .with_context(|| "Failed to set up the Wikipedia client")?;
    let catalog = Catalog::build(
        &cfg.library,
        cfg.catalog.shuffle,
        wiki.as_ref().map(|w| w as &dyn YearLookup),
    )
    .with_context(|| "Failed to scan the music library")?;
    if catalog.tracks.is_empty() {
        anyhow::bail!("No playable music files found");
    }

    print_catalog(&catalog);
    catalog
        .save(&cfg.catalog.path)
        .with_context(|| "Failed to write the answer key")?;
    println!(
        "Wrote {} tracks to {}",
        catalog.tracks.len(),
        cfg.catalog.path.to_string_lossy()
    );
    Ok(())
}

fn list(cfg: &Config) -> anyhow::Result<()> {
    let catalog = load_catalog(cfg)?;
    println!(
        "Answer key generated {} contains {} tracks",
        catalog.generated_at.format("%Y-%m-%d %H:%M"),
        catalog.tracks.len()
    );
    print_catalog(&catalog);
    Ok(())
}

fn serve(cfg: Config) -> anyhow::Result<()> {
    let catalog = load_catalog(&cfg)?;
    let http_server = HttpServer::new(catalog, cfg.game, cfg.http);

    println!(
        "HitPlay running at http://{}:{}/",
        http_server.config.bind_addr, http_server.config.port
    );
    http_server.run();
    Ok(())
}

fn load_catalog(cfg: &Config) -> anyhow::Result<Catalog> {
    Catalog::load(&cfg.catalog.path).with_context(|| {
        format!(
            "Failed to load the answer key {}, run \"index\" first",
            cfg.catalog.path.to_string_lossy()
        )
    })
}

fn print_catalog(catalog: &Catalog) {
    for entry in &catalog.tracks {
        let record = &entry.record;
        println!(
            "{} {} - {} - {}",
            record.emoji, record.performer, record.title, record.release_year
        );
        println!("    {}", entry.path.to_string_lossy());
    }
}
