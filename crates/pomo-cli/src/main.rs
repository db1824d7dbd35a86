mod config;
mod essay;
mod export;
mod metaphrase;
mod notes;
mod paragraph;
mod sentence;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pomo_core::MetafictionLevel;
use pomo_kb::KnowledgeBase;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use config::FileConfig;
use essay::EssayOptions;

#[derive(Parser)]
#[command(name = "pomo", about = "Coherence-driven postmodern essay generator")]
struct Cli {
    /// Path to a knowledge-base JSON file (defaults to the bundled dataset)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an essay to stdout (and optionally a Markdown file)
    Generate {
        /// Seed for the run; omitted means a fresh random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Theme key; omitted means a seeded random pick
        #[arg(long)]
        theme: Option<String>,

        /// Metafiction level: subtle | moderate | highly_self_aware
        #[arg(long)]
        metafiction: Option<String>,

        /// Number of body sections
        #[arg(long)]
        sections: Option<usize>,

        /// Write the essay to this Markdown file as well
        #[arg(long)]
        out: Option<PathBuf>,

        /// Config file path (defaults to ./pomo.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List available themes
    Themes,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn load_kb(data: Option<&Path>) -> Result<KnowledgeBase> {
    match data {
        Some(path) => KnowledgeBase::from_file(path)
            .with_context(|| format!("failed to load knowledge base {}", path.display())),
        None => KnowledgeBase::bundled().context("failed to load bundled knowledge base"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Generate {
            seed,
            theme,
            metafiction,
            sections,
            out,
            config,
        } => cmd_generate(
            &cli,
            *seed,
            theme.as_deref(),
            metafiction.as_deref(),
            *sections,
            out.as_deref(),
            config.as_deref(),
        ),
        Commands::Themes => cmd_themes(&cli),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_generate(
    cli: &Cli,
    seed: Option<u64>,
    theme: Option<&str>,
    metafiction: Option<&str>,
    sections: Option<usize>,
    out: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<()> {
    let kb = load_kb(cli.data.as_deref())?;
    let file_config = FileConfig::load(config_path)?;

    // Flags beat the config file; the config file beats defaults. The seed
    // is minted up front so every later choice, including a random theme,
    // replays from it.
    let seed = seed
        .or(file_config.seed)
        .unwrap_or_else(|| rand::rng().random::<u32>() as u64);

    let theme = match theme.or(file_config.theme.as_deref()) {
        Some(key) => {
            if kb.snapshot.theme(key).is_none() {
                let known = kb.snapshot.theme_keys().join(", ");
                bail!("unknown theme '{key}' (available: {known})");
            }
            key.to_string()
        }
        None => {
            let keys = kb.snapshot.theme_keys();
            let mut rng = SmallRng::seed_from_u64(seed);
            keys[rng.random_range(0..keys.len())].to_string()
        }
    };

    let level: MetafictionLevel = metafiction
        .or(file_config.metafiction.as_deref())
        .unwrap_or("moderate")
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let sections = sections.or(file_config.sections).unwrap_or(4).clamp(1, 8);

    eprintln!("generating: theme={theme} seed={seed} level={level} sections={sections}");

    let options = EssayOptions {
        seed,
        theme,
        level,
        sections,
    };
    let essay = essay::generate(kb, &options)?;

    println!("{}", essay.markdown);

    if let Some(path) = out {
        export::write_markdown(&essay, path, &export::today_string())?;
        eprintln!("exported to {}", path.display());
    }

    Ok(())
}

fn cmd_themes(cli: &Cli) -> Result<()> {
    let kb = load_kb(cli.data.as_deref())?;
    for (key, description) in kb.theme_listing() {
        println!("{key:<28} {description}");
    }
    Ok(())
}
