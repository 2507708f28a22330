//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    adjust::AdjustCommands, loops::LoopsCommands, profile::ProfileCommands,
};
use crate::cli::filters::{ModeArg, StateArg};
use crate::core::config::STATE_DIR_ENV;

#[derive(Parser, Debug)]
#[command(name = "wingtrim")]
#[command(author, version, about = "Paraglider line-trim tuning")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Directory holding the persisted session state
    #[arg(long, global = true, env = STATE_DIR_ENV)]
    pub state_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for lists, text for single values
    #[default]
    Auto,
    /// Bordered table
    Table,
    /// JSON
    Json,
    /// YAML
    Yaml,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a wide measurement sheet, replacing the current one
    Import(ImportArgs),

    /// Write the current sheet back out
    Export(ExportArgs),

    /// Show the session summary
    Status,

    /// Per-line deviations
    Lines(LinesArgs),

    /// Mean deviation of every group side
    Groups,

    /// Deviation series of one lane, ordered by line number
    Series(SeriesArgs),

    /// Loop count hints for every group side
    Suggest,

    /// Loop plan that brings group means toward zero
    Plan(PlanArgs),

    /// Per-group trim adjustments
    #[command(subcommand)]
    Adjust(AdjustCommands),

    /// Maillon loop types, assignments and presets
    #[command(subcommand)]
    Loops(LoopsCommands),

    /// Wing profiles (line-to-group mappings)
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Show or set the workflow step
    Step(StepArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Wide CSV file (comma, semicolon or tab separated)
    pub file: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Destination file
    pub file: PathBuf,

    /// Write measurements with loops and adjustments applied
    #[arg(long)]
    pub applied: bool,
}

#[derive(clap::Args, Debug)]
pub struct LinesArgs {
    /// Which state to show
    #[arg(long, short = 's', default_value = "after")]
    pub state: StateArg,

    /// Only lines with this prefix letter
    #[arg(long, short = 'l')]
    pub lane: Option<char>,

    /// Only lines outside the warning band
    #[arg(long)]
    pub flagged: bool,
}

#[derive(clap::Args, Debug)]
pub struct SeriesArgs {
    /// Line prefix letter, e.g. A
    pub prefix: char,

    /// How the two sides are combined
    #[arg(long, short = 'm', default_value = "average")]
    pub mode: ModeArg,

    /// Which state to plot
    #[arg(long, short = 's', default_value = "after")]
    pub state: StateArg,

    /// Draw the series as a braille chart
    #[arg(long)]
    pub plot: bool,
}

#[derive(clap::Args, Debug)]
pub struct PlanArgs {
    /// Lanes to include, e.g. ABC (default: config plan_lanes, else all)
    #[arg(long)]
    pub lanes: Option<String>,

    /// Add the plan to the adjustments
    #[arg(long)]
    pub apply: bool,
}

#[derive(clap::Args, Debug)]
pub struct StepArgs {
    /// Step to switch to (import, profile, loops, trim)
    pub step: Option<String>,

    /// Advance to the following step
    #[arg(long, conflicts_with = "step")]
    pub next: bool,
}

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
