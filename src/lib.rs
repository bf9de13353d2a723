//! Audiofolder: folder-of-media dataset resolution.
//!
//! Given files already partitioned into named splits, audiofolder classifies
//! them into media, metadata sidecars and ignored files, joins sidecar rows to
//! media files by relative path, infers categorical labels from enclosing
//! directories, and generates one example per media file, lazily and in a
//! deterministic order. Media content is never decoded.
//!
//! # Modules
//!
//! - [`config`]: Builder configuration and its validation
//! - [`files`]: File references, splits and archive access
//! - [`metadata`]: Sidecar metadata loading (`metadata.jsonl`, `metadata.csv`)
//! - [`labels`]: Directory-derived label inference
//! - [`generate`]: Activation rules, schema and the example cursor
//! - [`builder`]: Per-split orchestration
//! - [`discover`]: Turning a local directory into split-keyed files
//! - [`error`]: Error types for audiofolder operations

pub mod builder;
pub mod config;
pub mod discover;
pub mod error;
pub mod files;
pub mod generate;
pub mod labels;
pub mod metadata;

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

pub use builder::AudioFolder;
pub use config::{DataFiles, FolderConfig, MediaKind};
pub use error::AudioFolderError;
pub use files::{AccessMode, FileRef, Split, SplitFiles};
pub use generate::{Example, Feature, Features, GenerationPlan, PreparedSplit};

/// The audiofolder CLI application.
#[derive(Parser)]
#[command(name = "audiofolder")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Generate examples for every split of a local dataset.
    Generate(GenerateArgs),
    /// Print the declared column schema of every split.
    Schema(SourceArgs),
}

/// Where the dataset lives and how to resolve it.
#[derive(clap::Args)]
struct SourceArgs {
    /// Dataset directory, or a single .zip archive.
    input: PathBuf,

    /// Config name (characters limited to [A-Za-z0-9._-]).
    #[arg(long, default_value = "default")]
    name: String,

    /// Only resolve this split.
    #[arg(long)]
    split: Option<String>,

    /// Force labels off (`--drop-labels`) or on when inferable
    /// (`--drop-labels false`). Automatic when omitted.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    drop_labels: Option<bool>,

    /// Force metadata off (`--drop-metadata`) or on when present
    /// (`--drop-metadata false`). Automatic when omitted.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    drop_metadata: Option<bool>,

    /// Read archives sequentially instead of with random access.
    #[arg(long)]
    streaming: bool,

    /// Media kind ('audio' or 'image').
    #[arg(long, default_value = "audio")]
    media: String,
}

/// Arguments for the generate subcommand.
#[derive(clap::Args)]
struct GenerateArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output format ('jsonl' or 'summary').
    #[arg(long, default_value = "jsonl")]
    output: String,
}

/// Run the audiofolder CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), AudioFolderError> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Some(Commands::Generate(args)) => run_generate(args),
        Some(Commands::Schema(args)) => run_schema(args),
        None => {
            println!("audiofolder {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Folder-of-media dataset resolution.");
            println!();
            println!("Run 'audiofolder --help' for usage information.");
            Ok(())
        }
    }
}

fn parse_media_kind(media: &str) -> Result<MediaKind, AudioFolderError> {
    match media {
        "audio" => Ok(MediaKind::Audio),
        "image" => Ok(MediaKind::Image),
        other => Err(AudioFolderError::UnsupportedFormat(format!(
            "media kind '{other}' (supported: audio, image)"
        ))),
    }
}

fn access_mode(streaming: bool) -> AccessMode {
    if streaming {
        AccessMode::Streamed
    } else {
        AccessMode::Materialized
    }
}

/// Discovers splits on disk and plans each selected one.
fn plan_from_args(args: &SourceArgs) -> Result<Vec<GenerationPlan>, AudioFolderError> {
    let media_kind = parse_media_kind(&args.media)?;
    let mut splits = discover::discover_local_splits(&args.input)?;

    if let Some(wanted) = &args.split {
        let selected = splits.get(wanted).cloned().ok_or_else(|| {
            AudioFolderError::LayoutInvalid {
                path: args.input.clone(),
                message: format!(
                    "split '{wanted}' not found. Available splits: {}",
                    splits.names().join(", ")
                ),
            }
        })?;
        splits = SplitFiles::new().with_split(selected.name(), selected.files().to_vec());
    }

    let config = FolderConfig::new(args.name.clone(), splits)?
        .with_drop_labels(args.drop_labels)
        .with_drop_metadata(args.drop_metadata)
        .with_media_kind(media_kind);

    AudioFolder::new(config).split_generators(access_mode(args.streaming))
}

/// Execute the generate subcommand.
fn run_generate(args: GenerateArgs) -> Result<(), AudioFolderError> {
    let plans = plan_from_args(&args.source)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match args.output.as_str() {
        "jsonl" => {
            for plan in &plans {
                for result in plan.examples() {
                    let (idx, example) = result?;
                    let line = json!({
                        "split": plan.split_name(),
                        "idx": idx,
                        "example": example.to_json(),
                    });
                    writeln!(out, "{line}")?;
                }
            }
        }
        "summary" => {
            for plan in &plans {
                write_summary(&mut out, plan)?;
            }
        }
        other => {
            return Err(AudioFolderError::UnsupportedFormat(format!(
                "output '{other}' (supported: jsonl, summary)"
            )));
        }
    }

    out.flush()?;
    Ok(())
}

fn write_summary(out: &mut impl Write, plan: &GenerationPlan) -> Result<(), AudioFolderError> {
    let mut count = 0usize;
    for result in plan.examples() {
        result?;
        count += 1;
    }

    writeln!(out, "split: {} ({count} examples)", plan.split_name())?;
    writeln!(
        out,
        "  metadata: {} ({} rows)",
        if plan.add_metadata() { "yes" } else { "no" },
        plan.metadata().len()
    )?;
    writeln!(out, "  labels: {}", if plan.add_labels() { "yes" } else { "no" })?;
    for (column, feature) in plan.features().iter() {
        let kind = match feature {
            Feature::Media { media } => format!("media({})", media.as_str()),
            Feature::ClassLabel { names } => format!("class_label[{}]", names.join(", ")),
            Feature::Value { dtype } => format!("value({})", dtype.as_str()),
        };
        writeln!(out, "  {column}: {kind}")?;
    }
    Ok(())
}

/// Execute the schema subcommand.
fn run_schema(args: SourceArgs) -> Result<(), AudioFolderError> {
    let plans = plan_from_args(&args)?;
    let schema: serde_json::Map<String, serde_json::Value> = plans
        .iter()
        .map(|plan| (plan.split_name().to_string(), json!(plan.features())))
        .collect();

    println!("{:#}", serde_json::Value::Object(schema));
    Ok(())
}
