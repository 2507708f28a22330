//! `wingtrim profile` - line-to-group mappings

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tabled::Tabled;

use crate::cli::commands::utils::open_workbench;
use crate::cli::helpers::{parse_lane, truncate_str};
use crate::cli::output::{print_rows, print_structured, print_success, print_warning};
use crate::cli::GlobalOpts;
use crate::core::line_id::LANES;
use crate::core::numeric::format_number;
use crate::core::validate::validate_profile_set;
use crate::entities::profile::{missing_lanes, Profile};

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List stored profiles
    List,

    /// Show a profile (default: the active one)
    Show { key: Option<String> },

    /// Make a profile the active one
    Use { key: String },

    /// Create a profile, optionally copied from another
    New(NewArgs),

    /// Append a line range to a profile lane
    Range(RangeArgs),

    /// Check profiles for structural errors and overlapping ranges
    Validate {
        /// Profile document to check instead of the stored profiles
        file: Option<PathBuf>,
    },

    /// Merge profiles from a JSON document
    Import { file: PathBuf },

    /// Write every profile as a JSON document (stdout if no file)
    Export { file: Option<PathBuf> },

    /// Delete a profile
    #[command(name = "rm")]
    Remove { key: String },
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Profile key
    pub key: String,

    /// Display name (default: the key)
    #[arg(long)]
    pub name: Option<String>,

    /// Length change of one loop in mm
    #[arg(long)]
    pub mm_per_loop: Option<f64>,

    /// Copy the mapping of an existing profile
    #[arg(long)]
    pub from: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RangeArgs {
    /// Profile key
    pub key: String,

    /// Lane letter (A-D)
    pub lane: char,

    /// First line number
    pub min: i64,

    /// Last line number
    pub max: i64,

    /// Group name, e.g. AR1
    pub group: String,
}

#[derive(Debug, Serialize, Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    active: String,
    #[tabled(rename = "KEY")]
    key: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "MM/LOOP")]
    mm_per_loop: String,
    #[tabled(rename = "GROUPS")]
    groups: usize,
}

pub fn run(cmd: ProfileCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProfileCommands::List => run_list(global),
        ProfileCommands::Show { key } => run_show(key, global),
        ProfileCommands::Use { key } => run_use(key, global),
        ProfileCommands::New(args) => run_new(args, global),
        ProfileCommands::Range(args) => run_range(args, global),
        ProfileCommands::Validate { file } => run_validate(file, global),
        ProfileCommands::Import { file } => run_import(file, global),
        ProfileCommands::Export { file } => run_export(file, global),
        ProfileCommands::Remove { key } => run_remove(key, global),
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let bench = open_workbench(global)?;
    let active = bench.active_profile_key().map(str::to_string);

    if print_structured(bench.profiles(), global.format)? {
        return Ok(());
    }

    let rows: Vec<ProfileRow> = bench
        .profiles()
        .iter()
        .map(|(key, profile)| ProfileRow {
            active: if active.as_deref() == Some(key) { "*" } else { "" }.to_string(),
            key: key.to_string(),
            name: truncate_str(&profile.name, 30),
            mm_per_loop: format_number(profile.mm_per_loop),
            groups: profile.declared_groups().len(),
        })
        .collect();
    print_rows(&rows, global.format)
}

fn run_show(key: Option<String>, global: &GlobalOpts) -> Result<()> {
    let bench = open_workbench(global)?;
    let (key, profile) = match key {
        Some(key) => {
            let profile = bench
                .profiles()
                .get(&key)
                .cloned()
                .ok_or_else(|| miette::miette!("Profile '{}' not found", key))?;
            (key, profile)
        }
        None => (
            bench.active_profile_key().unwrap_or("default").to_string(),
            bench.active_profile().into_owned(),
        ),
    };

    if print_structured(&profile, global.format)? {
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("Key").bold(), style(&key).cyan());
    println!("{}: {}", style("Name").bold(), style(&profile.name).yellow());
    println!(
        "{}: {} mm",
        style("Loop step").bold(),
        format_number(profile.mm_per_loop)
    );
    println!("{}", style("─".repeat(60)).dim());

    for lane in LANES {
        let ranges = profile.lane_ranges(lane);
        if ranges.is_empty() {
            println!("  {}  {}", style(lane).bold(), style("(no ranges)").dim());
            continue;
        }
        let text: Vec<String> = ranges
            .iter()
            .map(|r| format!("{}{}-{}{} → {}", lane, r.min, lane, r.max, r.group))
            .collect();
        println!("  {}  {}", style(lane).bold(), text.join(", "));
    }

    for error in profile.validate(&key) {
        print_warning(&error);
    }
    Ok(())
}

fn run_use(key: String, global: &GlobalOpts) -> Result<()> {
    let mut bench = open_workbench(global)?;
    bench.set_active_profile(&key).into_diagnostic()?;
    print_success(&format!("Active profile is now {}", style(&key).cyan()));
    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    if let Some(mm) = args.mm_per_loop.filter(|mm| !mm.is_finite()) {
        return Err(miette::miette!("Loop step must be a finite number, got {}", mm));
    }

    let mut bench = open_workbench(global)?;
    if bench.profiles().contains(&args.key) {
        return Err(miette::miette!(
            "Profile '{}' already exists. Remove it first with 'wingtrim profile rm {}'",
            args.key,
            args.key
        ));
    }

    let mut profile = match &args.from {
        Some(source) => bench
            .profiles()
            .get(source)
            .cloned()
            .ok_or_else(|| miette::miette!("Profile '{}' not found", source))?,
        None => Profile::default(),
    };
    profile.name = args.name.clone().unwrap_or_else(|| args.key.clone());
    if let Some(mm) = args.mm_per_loop {
        profile.mm_per_loop = mm;
    }
    for lane in missing_lanes(&profile) {
        profile.mapping.insert(lane.to_string(), Vec::new());
    }

    let warnings = bench.upsert_profile(&args.key, profile).into_diagnostic()?;
    print_success(&format!("Created profile {}", style(&args.key).cyan()));
    for warning in warnings {
        print_warning(&warning);
    }
    Ok(())
}

fn run_range(args: RangeArgs, global: &GlobalOpts) -> Result<()> {
    let lane = parse_lane(args.lane)
        .filter(|l| LANES.contains(l))
        .ok_or_else(|| miette::miette!("Invalid lane '{}': expected A-D", args.lane))?;

    let mut bench = open_workbench(global)?;
    let profile = bench
        .profiles()
        .get(&args.key)
        .cloned()
        .ok_or_else(|| miette::miette!("Profile '{}' not found", args.key))?
        .with_range(lane, args.min, args.max, args.group.trim());

    let warnings = bench.upsert_profile(&args.key, profile).into_diagnostic()?;
    print_success(&format!(
        "{}: {}{}-{}{} → {}",
        style(&args.key).cyan(),
        lane,
        args.min,
        lane,
        args.max,
        args.group.trim()
    ));
    for warning in warnings {
        print_warning(&warning);
    }
    Ok(())
}

fn run_validate(file: Option<PathBuf>, global: &GlobalOpts) -> Result<()> {
    let (errors, checked) = match &file {
        Some(path) => {
            let content = fs::read_to_string(path).into_diagnostic()?;
            let document: serde_json::Value = serde_json::from_str(&content).into_diagnostic()?;
            let count = document.as_object().map(|o| o.len()).unwrap_or(0);
            (validate_profile_set(&document), count)
        }
        None => {
            let bench = open_workbench(global)?;
            (bench.profiles().validate(), bench.profiles().len())
        }
    };

    if print_structured(&errors, global.format)? {
        return if errors.is_empty() {
            Ok(())
        } else {
            Err(miette::miette!("{} validation error(s)", errors.len()))
        };
    }

    if errors.is_empty() {
        print_success(&format!("{} profile(s) valid", checked));
        return Ok(());
    }

    for error in &errors {
        println!("{} {}", style("✗").red(), error);
    }
    Err(miette::miette!(
        "{} validation error(s) in {} profile(s)",
        errors.len(),
        checked
    ))
}

fn run_import(file: PathBuf, global: &GlobalOpts) -> Result<()> {
    let content = fs::read_to_string(&file)
        .map_err(|e| miette::miette!("Cannot read {}: {}", file.display(), e))?;

    let mut bench = open_workbench(global)?;
    let result = bench.import_profiles(&content).into_diagnostic()?;

    print_success(&format!(
        "Imported {} profile(s): {}",
        result.imported.len(),
        result.imported.join(", ")
    ));
    for warning in &result.warnings {
        print_warning(warning);
    }
    Ok(())
}

fn run_export(file: Option<PathBuf>, global: &GlobalOpts) -> Result<()> {
    let bench = open_workbench(global)?;
    let document = bench.export_profiles().into_diagnostic()?;
    match file {
        Some(path) => {
            fs::write(&path, document).into_diagnostic()?;
            print_success(&format!(
                "Exported {} profile(s) to {}",
                bench.profiles().len(),
                style(path.display()).yellow()
            ));
        }
        None => println!("{}", document),
    }
    Ok(())
}

fn run_remove(key: String, global: &GlobalOpts) -> Result<()> {
    let mut bench = open_workbench(global)?;
    bench.remove_profile(&key).into_diagnostic()?;
    print_success(&format!("Removed profile {}", style(&key).cyan()));
    Ok(())
}
