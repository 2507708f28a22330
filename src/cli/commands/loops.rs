//! `wingtrim loops` - maillon loop types, assignments and presets

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::commands::utils::open_workbench;
use crate::cli::filters::SideArg;
use crate::cli::output::{effective_format, print_json, print_rows, print_success, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::line_id::LineId;
use crate::core::numeric::format_signed_mm;

#[derive(Subcommand, Debug)]
pub enum LoopsCommands {
    /// Define, redefine or remove a loop type
    Type(TypeArgs),

    /// List loop types
    Types,

    /// Assign a loop type to a line side
    Set(AssignArgs),

    /// Show the current loop assignments
    Show,

    /// Reset every line to the baseline loop
    Clear,

    /// Saved loop setups
    #[command(subcommand)]
    Preset(PresetCommands),
}

#[derive(Subcommand, Debug)]
pub enum PresetCommands {
    /// Save the current setup under a name
    Save { name: String },

    /// Replace the current setup with a saved one
    Load { name: String },

    /// Delete a saved setup
    Delete { name: String },

    /// List saved setups
    List,
}

#[derive(clap::Args, Debug)]
pub struct TypeArgs {
    /// Loop type name, e.g. L1
    pub name: String,

    /// Signed length change in mm (negative shortens)
    #[arg(allow_negative_numbers = true, required_unless_present = "remove")]
    pub mm: Option<f64>,

    /// Remove the type instead
    #[arg(long, conflicts_with = "mm")]
    pub remove: bool,
}

#[derive(clap::Args, Debug)]
pub struct AssignArgs {
    /// Line label, e.g. A3
    pub line: String,

    /// Side (l, r or both)
    pub side: SideArg,

    /// Loop type name
    pub loop_type: String,
}

#[derive(Debug, Serialize, Tabled)]
struct TypeRow {
    #[tabled(rename = "TYPE")]
    name: String,
    #[tabled(rename = "MM")]
    mm: String,
}

#[derive(Debug, Serialize, Tabled)]
struct AssignmentRow {
    #[tabled(rename = "LINE|SIDE")]
    key: String,
    #[tabled(rename = "TYPE")]
    loop_type: String,
    #[tabled(rename = "MM")]
    mm: String,
}

#[derive(Debug, Serialize, Tabled)]
struct PresetRow {
    #[tabled(rename = "PRESET")]
    name: String,
    #[tabled(rename = "ASSIGNMENTS")]
    assignments: usize,
    #[tabled(rename = "SAVED")]
    saved: String,
}

pub fn run(cmd: LoopsCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        LoopsCommands::Type(args) => run_type(args, global),
        LoopsCommands::Types => run_types(global),
        LoopsCommands::Set(args) => run_set(args, global),
        LoopsCommands::Show => run_show(global),
        LoopsCommands::Clear => run_clear(global),
        LoopsCommands::Preset(cmd) => run_preset(cmd, global),
    }
}

fn run_type(args: TypeArgs, global: &GlobalOpts) -> Result<()> {
    let mut bench = open_workbench(global)?;
    if args.remove {
        bench.remove_loop_type(&args.name).into_diagnostic()?;
        print_success(&format!("Removed loop type {}", style(&args.name).cyan()));
        return Ok(());
    }

    let mm = args
        .mm
        .ok_or_else(|| miette::miette!("Loop length in mm is required"))?;
    bench.set_loop_type(&args.name, mm).into_diagnostic()?;
    print_success(&format!(
        "Loop type {} = {} mm",
        style(args.name.trim()).cyan(),
        format_signed_mm(mm)
    ));
    Ok(())
}

fn run_types(global: &GlobalOpts) -> Result<()> {
    let bench = open_workbench(global)?;

    match effective_format(global.format, true) {
        OutputFormat::Json => return print_json(bench.loop_types()),
        OutputFormat::Yaml => return print_yaml(bench.loop_types()),
        _ => {}
    }

    let rows: Vec<TypeRow> = bench
        .loop_types()
        .iter()
        .map(|(name, mm)| TypeRow {
            name: name.to_string(),
            mm: format_signed_mm(mm),
        })
        .collect();
    print_rows(&rows, global.format)
}

fn run_set(args: AssignArgs, global: &GlobalOpts) -> Result<()> {
    let id = LineId::parse(&args.line)
        .ok_or_else(|| miette::miette!("Invalid line label '{}'. Expected e.g. A3", args.line))?;
    let loop_type = args.loop_type.trim();

    let mut bench = open_workbench(global)?;
    for side in args.side.sides() {
        bench
            .assign_loop(&id.to_string(), *side, loop_type)
            .into_diagnostic()?;
    }
    print_success(&format!(
        "{} ({}) uses loop {}",
        style(id).cyan(),
        args.side,
        style(loop_type).yellow()
    ));
    Ok(())
}

fn run_show(global: &GlobalOpts) -> Result<()> {
    let bench = open_workbench(global)?;

    match effective_format(global.format, true) {
        OutputFormat::Json => return print_json(bench.loop_setup()),
        OutputFormat::Yaml => return print_yaml(bench.loop_setup()),
        _ => {}
    }

    if bench.loop_setup().is_empty() {
        println!("{}", style("Every line uses the baseline loop").dim());
        return Ok(());
    }

    let rows: Vec<AssignmentRow> = bench
        .loop_setup()
        .iter()
        .map(|(key, loop_type)| AssignmentRow {
            key: key.to_string(),
            loop_type: loop_type.to_string(),
            mm: match bench.loop_types().get(loop_type) {
                Some(mm) => format_signed_mm(mm),
                None => "unknown (0.0)".to_string(),
            },
        })
        .collect();
    print_rows(&rows, global.format)
}

fn run_clear(global: &GlobalOpts) -> Result<()> {
    let mut bench = open_workbench(global)?;
    bench.clear_loops();
    print_success("Every line reset to the baseline loop");
    Ok(())
}

fn run_preset(cmd: PresetCommands, global: &GlobalOpts) -> Result<()> {
    let mut bench = open_workbench(global)?;
    match cmd {
        PresetCommands::Save { name } => {
            bench.save_preset(&name).into_diagnostic()?;
            print_success(&format!(
                "Saved {} assignment(s) as preset {}",
                bench.loop_setup().len(),
                style(name.trim()).cyan()
            ));
        }
        PresetCommands::Load { name } => {
            bench.load_preset(&name).into_diagnostic()?;
            print_success(&format!("Loaded preset {}", style(&name).cyan()));
        }
        PresetCommands::Delete { name } => {
            bench.delete_preset(&name).into_diagnostic()?;
            print_success(&format!("Deleted preset {}", style(&name).cyan()));
        }
        PresetCommands::List => {
            match effective_format(global.format, true) {
                OutputFormat::Json => return print_json(bench.loop_presets()),
                OutputFormat::Yaml => return print_yaml(bench.loop_presets()),
                _ => {}
            }
            let rows: Vec<PresetRow> = bench
                .loop_presets()
                .iter()
                .map(|(name, preset)| PresetRow {
                    name: name.to_string(),
                    assignments: preset.setup.len(),
                    saved: preset.saved.format("%Y-%m-%d %H:%M").to_string(),
                })
                .collect();
            print_rows(&rows, global.format)?;
        }
    }
    Ok(())
}
