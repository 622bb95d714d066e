//! `blockrev` command line: prepare pipeline configuration and rewrite markup.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::info;

use blockrev::{BlockrevConfig, TaskBuilder, TaskConfig};

/// Build-block driven asset pipeline configuration and revved reference rewriting.
#[derive(Parser)]
#[command(name = "blockrev", version, about, long_about = None)]
struct Cli {
  /// Verbosity level (-v, -vv).
  #[arg(short, long, action = ArgAction::Count, global = true)]
  verbose: u8,

  /// Log format.
  #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
  log_format: LogFormat,

  /// Configuration file (defaults to blockrev.config.{json,yaml,yml} in the working directory).
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
  Text,
  Json,
}

#[derive(Subcommand)]
enum Command {
  /// Generate the pipeline configuration for the build blocks of FILES.
  Prepare {
    /// Flow target to use from the configuration.
    #[arg(long)]
    target: Option<String>,

    /// JSON configuration to extend.
    #[arg(long)]
    base: Option<PathBuf>,

    /// Write the configuration here instead of stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Documents to scan (paths or glob patterns).
    #[arg(required = true)]
    files: Vec<String>,
  },
  /// Replace build blocks and point references at revved assets, in place.
  Rewrite {
    /// Pattern catalog to apply (html, css, or a type with configured patterns).
    #[arg(long = "type", default_value = "html")]
    content_type: String,

    /// Documents to rewrite (paths or glob patterns).
    #[arg(required = true)]
    files: Vec<String>,
  },
}

fn init_tracing(cli: &Cli) {
  use tracing_subscriber::{EnvFilter, fmt};

  let filter = match cli.verbose {
    0 => "blockrev=info",
    1 => "blockrev=debug",
    _ => "blockrev=trace",
  };
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  match cli.log_format {
    LogFormat::Text => fmt()
      .with_env_filter(env_filter)
      .with_target(false)
      .with_writer(std::io::stderr)
      .init(),
    LogFormat::Json => fmt()
      .json()
      .with_env_filter(env_filter)
      .with_writer(std::io::stderr)
      .init(),
  }
}

fn load_config(path: Option<&Path>) -> Result<BlockrevConfig> {
  match path {
    Some(path) => BlockrevConfig::from_path(path)
      .with_context(|| format!("failed to load configuration {}", path.display())),
    None => Ok(BlockrevConfig::discover(&std::env::current_dir()?)),
  }
}

fn load_base(path: &Path) -> Result<TaskConfig> {
  let content =
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
  let value: serde_json::Value = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse {}", path.display()))?;
  match value {
    serde_json::Value::Object(map) => Ok(map),
    _ => bail!("{} must contain a JSON object", path.display()),
  }
}

fn run(cli: Cli) -> Result<()> {
  let config = load_config(cli.config.as_deref())?;
  let builder = TaskBuilder::new(".", config);

  match cli.command {
    Command::Prepare {
      target,
      base,
      out,
      files,
    } => {
      let base = base.as_deref().map(load_base).transpose()?;
      let files = builder.expand_files(&files)?;
      let aggregate = builder
        .prepare(&files, target.as_deref(), base)
        .context("failed to prepare pipeline configuration")?;
      let json = serde_json::to_string_pretty(&aggregate)?;

      match out {
        Some(path) => {
          fs::write(&path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", path.display()))?;
          info!(path = %path.display(), "wrote pipeline configuration");
        }
        None => println!("{json}"),
      }
    }
    Command::Rewrite {
      content_type,
      files,
    } => {
      let files = builder.expand_files(&files)?;
      let outcomes = builder
        .rewrite(&files, &content_type)
        .context("failed to rewrite documents")?;
      let changed = outcomes.iter().filter(|outcome| outcome.changed).count();
      info!(files = outcomes.len(), changed, "rewrite finished");
    }
  }

  Ok(())
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(&cli);
  run(cli)
}
