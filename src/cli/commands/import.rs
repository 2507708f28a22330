//! `wingtrim import` / `wingtrim export` - wide measurement sheets

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;

use crate::cli::args::{ExportArgs, ImportArgs};
use crate::cli::commands::utils::open_workbench;
use crate::cli::output::{print_structured, print_success};
use crate::cli::GlobalOpts;

pub fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let mut bench = open_workbench(global)?;
    let text = fs::read_to_string(&args.file)
        .map_err(|e| miette::miette!("Cannot read {}: {}", args.file.display(), e))?;

    let summary = bench.import_csv(&text).into_diagnostic()?;

    if print_structured(&summary, global.format)? {
        return Ok(());
    }

    print_success(&format!(
        "Imported {} lines from {}",
        style(summary.lines).cyan(),
        style(args.file.display()).yellow()
    ));
    if !summary.name.is_empty() {
        println!("   Wing: {}", style(&summary.name).bold());
    }
    println!(
        "   {} rows, delimiter {:?}, tolerance {} mm",
        summary.rows,
        summary.delimiter,
        bench.tolerance()
    );
    if let Some(key) = bench.active_profile_key() {
        println!("   Profile: {}", style(key).cyan());
    }
    Ok(())
}

pub fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let bench = open_workbench(global)?;
    let content = bench.export_csv(args.applied).into_diagnostic()?;
    fs::write(&args.file, content).into_diagnostic()?;

    let what = if args.applied {
        "trimmed measurements"
    } else {
        "measurements"
    };
    print_success(&format!(
        "Exported {} to {}",
        what,
        style(args.file.display()).yellow()
    ));
    Ok(())
}
