use std::{path::PathBuf, sync::Arc, time::Instant};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use console::style;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use ytldr_core::{Config, MemoryStore, Summarizer, VideoId};

mod serve;
mod ui;

#[derive(Parser)]
#[command(name = "ytldr")]
#[command(about = "Summarize YouTube videos from their captions with a local Ollama model")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Ollama server URL (overrides YTLDR_OLLAMA_URL / OLLAMA_HOST)
    #[arg(long, global = true)]
    ollama_url: Option<String>,

    /// Summary cache file (overrides YTLDR_CACHE_FILE)
    #[arg(long, global = true)]
    cache_file: Option<PathBuf>,

    /// Keep summaries in memory only for this run
    #[arg(long, global = true)]
    no_persist: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a video with timestamps
    Summarize {
        /// Video URL or 11-character id
        video: String,

        /// Model to generate with
        #[arg(short, long)]
        model: Option<String>,

        /// Ignore the cached summary and regenerate it
        #[arg(short, long)]
        force: bool,
    },
    /// Print the English transcript
    Transcript {
        /// Video URL or 11-character id
        video: String,
    },
    /// List models available on the Ollama server
    Models,
    /// Answer JSON-line requests on stdin
    Serve,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(url) = &cli.ollama_url {
        config = config.with_ollama_base_url(url);
    }
    if let Some(path) = &cli.cache_file {
        config = config.with_cache_path(path);
    }
    if let Command::Summarize {
        model: Some(model), ..
    } = &cli.command
    {
        config = config.with_default_model(model);
    }
    config.validate()?;
    Ok(config)
}

fn build_summarizer(config: &Config, no_persist: bool) -> Result<Summarizer> {
    let summarizer = if no_persist {
        Summarizer::with_store(config, Arc::new(MemoryStore::new()))
    } else {
        Summarizer::from_config(config)
    };
    summarizer.context("Failed to set up the summarizer")
}

async fn summarize(
    summarizer: &Summarizer,
    video: &str,
    model: Option<&str>,
    force: bool,
) -> Result<()> {
    let video_id = VideoId::parse(video)?;

    eprintln!(
        "\n{}  {}\n",
        style("ytldr").cyan().bold(),
        style(format!("{video_id} · {}", model.unwrap_or(summarizer.default_model()))).dim()
    );
    ui::rule();

    let started = Instant::now();
    let cached = if force {
        None
    } else {
        summarizer.cache().get(&video_id, model).await
    };

    let summary = match cached {
        Some(summary) => {
            eprintln!(
                "{} Summary {}",
                style("✓").green().bold(),
                style("(cached)").dim()
            );
            summary
        }
        None => {
            let spinner = ui::create_spinner("Fetching captions and generating summary...");
            match summarizer.summarize(&video_id, model, true).await {
                Ok(summary) => {
                    ui::done(&spinner, "Summary generated", started.elapsed());
                    summary
                }
                Err(e) => {
                    ui::failed(&spinner, "Summary failed");
                    return Err(e.into());
                }
            }
        }
    };

    ui::rule();
    println!("{summary}");
    Ok(())
}

async fn transcript(summarizer: &Summarizer, video: &str) -> Result<()> {
    let video_id = VideoId::parse(video)?;

    let started = Instant::now();
    let spinner = ui::create_spinner("Fetching captions...");
    match summarizer.transcript(&video_id).await {
        Ok(text) => {
            ui::done(&spinner, "Transcript fetched", started.elapsed());
            println!("{text}");
            Ok(())
        }
        Err(e) => {
            ui::failed(&spinner, "No transcript");
            Err(e.into())
        }
    }
}

async fn models(summarizer: &Summarizer) -> Result<()> {
    let models = summarizer.list_models().await?;
    if models.is_empty() {
        eprintln!("{}", style("No models installed").yellow());
    }
    for name in models {
        let marker = if name == summarizer.default_model() {
            style("*").cyan().bold().to_string()
        } else {
            " ".to_string()
        };
        println!("{marker} {name}");
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    let summarizer = build_summarizer(&config, cli.no_persist)?;

    match cli.command {
        Command::Summarize {
            video,
            model,
            force,
        } => summarize(&summarizer, &video, model.as_deref(), force).await,
        Command::Transcript { video } => transcript(&summarizer, &video).await,
        Command::Models => models(&summarizer).await,
        Command::Serve => serve::run(summarizer).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}
