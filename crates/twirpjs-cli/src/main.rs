//! twirpjs CLI
//!
//! Runs as a protoc plugin when invoked without a subcommand
//! (`protoc --plugin=protoc-gen-twirpjs --twirpjs_out=gen ...`), or generates
//! from a descriptor set on disk with `generate`.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use twirpjs_codegen::descriptor::{decode_descriptor_set, decode_descriptor_set_json};
use twirpjs_codegen::{generate, GeneratorConfig, Schema};

mod plugin;

const LOG_ENV: &str = "TWIRPJS_LOG";

#[derive(Parser)]
#[command(name = "protoc-gen-twirpjs")]
#[command(
    author,
    version,
    about = "Generate typed JavaScript clients for Twirp services"
)]
struct Cli {
    /// Log at debug level (overridden by TWIRPJS_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Generator config JSON; every key is optional.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate clients from a descriptor set on disk.
    ///
    /// `.json` inputs are read as Buf descriptor set JSON
    /// (`buf build --as-file-descriptor-set -o descriptor.json`); anything
    /// else as a binary `FileDescriptorSet`.
    Generate {
        /// Descriptor set file.
        descriptor: PathBuf,
        /// File to generate for (as named in the descriptor set). Repeatable.
        #[arg(short, long = "file", required = true)]
        files: Vec<String>,
        /// Output directory.
        #[arg(short, long)]
        out: PathBuf,
        /// Plugin-style parameter string (`prefix=rpc,csrf=false`).
        #[arg(long)]
        param: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        None => plugin::run(config),
        Some(Commands::Generate {
            descriptor,
            files,
            out,
            param,
        }) => cmd_generate(&descriptor, &files, &out, param.as_deref(), config),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    let Some(path) = path else {
        return Ok(GeneratorConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    GeneratorConfig::from_json(&text).with_context(|| format!("in {}", path.display()))
}

fn read_schema(path: &Path) -> Result<Schema> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let schema = if is_json {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        decode_descriptor_set_json(&text)?
    } else {
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        decode_descriptor_set(&bytes)?
    };
    Ok(schema)
}

fn cmd_generate(
    descriptor: &Path,
    files: &[String],
    out: &Path,
    param: Option<&str>,
    mut config: GeneratorConfig,
) -> Result<()> {
    if let Some(param) = param {
        config.apply_parameter(param)?;
    }

    println!(
        "{} {}",
        "Generating".green().bold(),
        descriptor.display()
    );
    let schema = read_schema(descriptor)?;

    // Generate everything before writing anything.
    let artifacts = files
        .iter()
        .map(|f| generate(&schema, f, &config).with_context(|| format!("generating {f}")))
        .collect::<Result<Vec<_>>>()?;

    for artifact in &artifacts {
        let path = out.join(&artifact.name);
        let parent = path
            .parent()
            .ok_or_else(|| anyhow!("output path {} has no parent", path.display()))?;
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
        fs::write(&path, &artifact.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("  {} {}", "→".cyan(), path.display());
    }
    Ok(())
}
