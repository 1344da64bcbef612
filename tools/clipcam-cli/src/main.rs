//! Clipcam CLI — inspect timelines and camera paths from a project dump.
//!
//! Usage:
//!   clipcam layout <PROJECT>           Show the frame layout and contiguous groups
//!   clipcam detect <EVENTS>            Detect zoom blocks in a telemetry log
//!   clipcam path <PROJECT>             Build the full camera path
//!   clipcam info <PROJECT>             Show project information
//!   clipcam config [--write]           Show or write the effective config

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clipcam_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "clipcam",
    about = "Timeline resolution and virtual camera tooling for screen recordings",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/clipcam/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the frame layout of every track
    Layout {
        /// Path to the project JSON
        project: PathBuf,

        /// Override the project frame rate
        #[arg(long)]
        fps: Option<f64>,

        /// Show the active item(s) at this frame
        #[arg(long)]
        frame: Option<i64>,
    },

    /// Detect zoom blocks in a telemetry event log
    Detect {
        /// Path to the events JSONL file
        events: PathBuf,

        /// Recording width in pixels
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Recording height in pixels
        #[arg(long, default_value = "1080")]
        height: u32,

        /// Start of the source range (ms)
        #[arg(long, default_value = "0")]
        start_ms: f64,

        /// End of the source range (ms); defaults to the last event
        #[arg(long)]
        end_ms: Option<f64>,

        /// Maximum zooms in any minute
        #[arg(long)]
        max_per_minute: Option<f64>,

        /// Minimum gap between zooms (ms)
        #[arg(long)]
        min_gap_ms: Option<f64>,

        /// Print the blocks as zoom effects bound to this clip, as JSON
        #[arg(long)]
        clip_id: Option<String>,
    },

    /// Build the full camera path for a project
    Path {
        /// Path to the project JSON
        project: PathBuf,

        /// Attach telemetry to a recording: <RECORDING_ID>=<EVENTS_JSONL>
        #[arg(long = "events", value_name = "ID=PATH")]
        events: Vec<String>,

        /// Write every frame snapshot as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the snapshot of a single frame
        #[arg(long)]
        frame: Option<i64>,
    },

    /// Show project information
    Info {
        /// Path to the project JSON
        project: PathBuf,
    },

    /// Show the effective configuration
    Config {
        /// Write it back to the config file (creating it with defaults)
        #[arg(long)]
        write: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    clipcam_common::logging::init_logging_with_verbosity(&config.logging, cli.verbose);

    match cli.command {
        Commands::Layout { project, fps, frame } => commands::layout::run(project, fps, frame),
        Commands::Detect {
            events,
            width,
            height,
            start_ms,
            end_ms,
            max_per_minute,
            min_gap_ms,
            clip_id,
        } => commands::detect::run(
            &config,
            commands::detect::DetectArgs {
                events,
                width,
                height,
                start_ms,
                end_ms,
                max_per_minute,
                min_gap_ms,
                clip_id,
            },
        ),
        Commands::Path {
            project,
            events,
            output,
            frame,
        } => commands::path::run(&config, project, events, output, frame),
        Commands::Info { project } => commands::info::run(project),
        Commands::Config { write } => commands::config::run(&config, cli.config, write),
    }
}
