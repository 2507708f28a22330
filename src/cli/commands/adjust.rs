//! `wingtrim adjust` - per-group trim adjustments

use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::commands::utils::open_workbench;
use crate::cli::filters::SideArg;
use crate::cli::output::{effective_format, print_json, print_rows, print_success, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::numeric::format_signed_mm;

#[derive(Subcommand, Debug)]
pub enum AdjustCommands {
    /// Set a group side to an absolute adjustment
    Set(ValueArgs),

    /// Add to a group side's adjustment
    Add(ValueArgs),

    /// Remove adjustments
    Reset(ResetArgs),

    /// List every adjustment
    Show,
}

#[derive(clap::Args, Debug)]
pub struct ValueArgs {
    /// Group name, e.g. AR1
    pub group: String,

    /// Side (l, r or both)
    pub side: SideArg,

    /// Millimetres; positive lengthens
    #[arg(allow_negative_numbers = true)]
    pub mm: f64,
}

#[derive(clap::Args, Debug)]
pub struct ResetArgs {
    /// Group name; omit together with --all to clear the table
    #[arg(required_unless_present = "all")]
    pub group: Option<String>,

    /// Side (l, r or both)
    #[arg(default_value = "both")]
    pub side: SideArg,

    /// Clear every adjustment
    #[arg(long, conflicts_with = "group")]
    pub all: bool,
}

#[derive(Debug, Serialize, Tabled)]
struct AdjustmentRow {
    #[tabled(rename = "GROUP|SIDE")]
    key: String,
    #[tabled(rename = "MM")]
    mm: String,
}

pub fn run(cmd: AdjustCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        AdjustCommands::Set(args) => run_set(args, false, global),
        AdjustCommands::Add(args) => run_set(args, true, global),
        AdjustCommands::Reset(args) => run_reset(args, global),
        AdjustCommands::Show => run_show(global),
    }
}

fn run_set(args: ValueArgs, accumulate: bool, global: &GlobalOpts) -> Result<()> {
    if !args.mm.is_finite() {
        return Err(miette::miette!("Adjustment must be a finite number"));
    }
    let group = args.group.trim();
    if group.is_empty() {
        return Err(miette::miette!("Group name must not be empty"));
    }

    let mut bench = open_workbench(global)?;
    for side in args.side.sides() {
        if accumulate {
            bench.add_adjustment(group, *side, args.mm);
        } else {
            bench.set_adjustment(group, *side, args.mm);
        }
    }

    let totals: Vec<String> = args
        .side
        .sides()
        .iter()
        .map(|side| {
            format!(
                "{}|{} = {} mm",
                group,
                side,
                format_signed_mm(bench.adjustments().get(group, *side))
            )
        })
        .collect();
    print_success(&totals.join(", "));
    Ok(())
}

fn run_reset(args: ResetArgs, global: &GlobalOpts) -> Result<()> {
    let mut bench = open_workbench(global)?;
    match args.group {
        Some(group) if !args.all => {
            for side in args.side.sides() {
                bench.reset_adjustment(&group, *side);
            }
            print_success(&format!("Reset {} ({})", group, args.side));
        }
        _ => {
            bench.reset_adjustments();
            print_success("Cleared all adjustments");
        }
    }
    Ok(())
}

fn run_show(global: &GlobalOpts) -> Result<()> {
    let bench = open_workbench(global)?;

    match effective_format(global.format, true) {
        OutputFormat::Json => return print_json(bench.adjustments()),
        OutputFormat::Yaml => return print_yaml(bench.adjustments()),
        _ => {}
    }

    if bench.adjustments().is_empty() {
        println!("{}", style("No adjustments").dim());
        return Ok(());
    }

    let rows: Vec<AdjustmentRow> = bench
        .adjustments()
        .iter()
        .map(|(key, mm)| AdjustmentRow {
            key: key.to_string(),
            mm: format_signed_mm(mm),
        })
        .collect();
    print_rows(&rows, global.format)
}
