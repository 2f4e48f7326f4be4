mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use stackpack_lib::config::Settings;

use crate::cmd::{cmd_build, cmd_digest, cmd_fetch, cmd_name};
use crate::output::{OutputFormat, print_error};

/// stackpack - build and fingerprint deployment packages for infrastructure stacks
#[derive(Parser)]
#[command(name = "stackpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Configuration file (default: ./stackpack.toml when present)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the deployment package for a source directory
  Build {
    /// Directory containing the sources and build descriptor
    #[arg(default_value = ".")]
    source_dir: PathBuf,

    /// Build descriptor, relative to the source directory
    #[arg(long)]
    dockerfile: Option<PathBuf>,

    /// Tag for the build image
    #[arg(long)]
    tag: Option<String>,
  },

  /// Print the base64 SHA-256 digest of files
  Digest {
    /// Files to digest
    #[arg(required = true)]
    files: Vec<PathBuf>,
  },

  /// Download an object from cloud storage
  Fetch {
    /// Object key
    #[arg(long)]
    key: String,

    /// Local destination path
    #[arg(long)]
    out: PathBuf,

    /// Bucket (default: storage.bucket from the configuration)
    #[arg(long)]
    bucket: Option<String>,
  },

  /// Print stack-scoped resource names
  Name {
    /// Resource names to scope
    #[arg(required = true)]
    resources: Vec<String>,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::FAILURE
    }
  }
}

fn run(cli: Cli) -> Result<()> {
  let config = cli.config.as_deref();
  let load_settings = || Settings::load(config).context("Failed to load configuration");

  match cli.command {
    Commands::Build {
      source_dir,
      dockerfile,
      tag,
    } => cmd_build(&load_settings()?, &source_dir, dockerfile, tag, cli.output),
    Commands::Digest { files } => cmd_digest(&files, cli.output),
    Commands::Fetch { key, out, bucket } => {
      cmd_fetch(&load_settings()?, bucket.as_deref(), &key, &out, cli.output)
    }
    Commands::Name { resources } => cmd_name(load_settings()?, &resources, cli.output),
  }
}
