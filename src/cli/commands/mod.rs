//! CLI command implementations

pub mod adjust;
pub mod import;
pub mod lines;
pub mod loops;
pub mod plan;
pub mod profile;
pub mod session;
pub mod utils;

use miette::Result;

use crate::cli::args::{Cli, Commands};

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let global = &cli.global;
    match cli.command {
        Commands::Import(args) => import::run_import(args, global),
        Commands::Export(args) => import::run_export(args, global),
        Commands::Status => session::run_status(global),
        Commands::Lines(args) => lines::run_lines(args, global),
        Commands::Groups => lines::run_groups(global),
        Commands::Series(args) => lines::run_series(args, global),
        Commands::Suggest => lines::run_suggest(global),
        Commands::Plan(args) => plan::run(args, global),
        Commands::Adjust(cmd) => adjust::run(cmd, global),
        Commands::Loops(cmd) => loops::run(cmd, global),
        Commands::Profile(cmd) => profile::run(cmd, global),
        Commands::Step(args) => session::run_step(args, global),
        Commands::Completions(args) => session::run_completions(args),
    }
}
