//! `wingtrim status`, `step` and `completions`

use clap::CommandFactory;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::args::{Cli, CompletionsArgs, StepArgs};
use crate::cli::commands::utils::{open_workbench, state_dir};
use crate::cli::output::{print_structured, print_success};
use crate::cli::GlobalOpts;
use crate::core::deviation::Severity;
use crate::core::plan::LaneFilter;
use crate::core::workbench::WorkflowStep;

#[derive(Debug, Serialize)]
struct Status {
    state_dir: String,
    step: WorkflowStep,
    wing: Option<String>,
    lines: usize,
    tolerance: f64,
    correction: f64,
    profile: Option<String>,
    groups: usize,
    adjustments: usize,
    loop_assignments: usize,
    yellow: usize,
    red: usize,
}

pub fn run_status(global: &GlobalOpts) -> Result<()> {
    let bench = open_workbench(global)?;
    let computation = bench.compute(LaneFilter::all());

    let count = |severity: Severity| {
        computation
            .lines
            .iter()
            .flat_map(|line| [&line.left.after, &line.right.after])
            .filter(|result| result.severity == severity)
            .count()
    };

    let status = Status {
        state_dir: state_dir(global).display().to_string(),
        step: bench.step(),
        wing: bench.sheet().map(|s| s.meta.display_name()),
        lines: bench.sheet().map(|s| s.line_count()).unwrap_or(0),
        tolerance: bench.tolerance(),
        correction: bench.meta().correction,
        profile: bench.active_profile_key().map(str::to_string),
        groups: computation.stats.len(),
        adjustments: bench.adjustments().len(),
        loop_assignments: bench.loop_setup().len(),
        yellow: count(Severity::Yellow),
        red: count(Severity::Red),
    };

    if print_structured(&status, global.format)? {
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("Step").bold(), style(status.step).cyan());
    match &status.wing {
        Some(wing) => println!(
            "{}: {} ({} lines)",
            style("Sheet").bold(),
            style(if wing.is_empty() { "(unnamed)" } else { wing.as_str() }).yellow(),
            status.lines
        ),
        None => println!("{}: {}", style("Sheet").bold(), style("none imported").dim()),
    }
    println!(
        "{}: {} mm, correction {} mm",
        style("Tolerance").bold(),
        status.tolerance,
        status.correction
    );
    println!(
        "{}: {}",
        style("Profile").bold(),
        status.profile.as_deref().unwrap_or("built-in default")
    );
    println!(
        "{}: {} group side(s), {} adjustment(s), {} loop assignment(s)",
        style("Trim").bold(),
        status.groups,
        status.adjustments,
        status.loop_assignments
    );
    if status.red > 0 || status.yellow > 0 {
        println!(
            "{}: {} red, {} yellow",
            style("Flagged").bold(),
            style(status.red).red(),
            style(status.yellow).yellow()
        );
    }
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style(format!("State: {}", status.state_dir)).dim());
    Ok(())
}

pub fn run_step(args: StepArgs, global: &GlobalOpts) -> Result<()> {
    let mut bench = open_workbench(global)?;

    let target = match (&args.step, args.next) {
        (Some(step), _) => Some(
            step.parse::<WorkflowStep>()
                .map_err(|e| miette::miette!("{}", e))?,
        ),
        (None, true) => Some(bench.step().next()),
        (None, false) => None,
    };

    match target {
        Some(step) => {
            bench.set_step(step);
            print_success(&format!("Step is now {}", style(step).cyan()));
        }
        None => {
            if print_structured(&bench.step(), global.format)? {
                return Ok(());
            }
            let current = bench.step();
            let trail: Vec<String> = WorkflowStep::ALL
                .iter()
                .map(|step| {
                    if *step == current {
                        style(format!("[{}]", step)).cyan().bold().to_string()
                    } else {
                        step.to_string()
                    }
                })
                .collect();
            println!("{}", trail.join(" → "));
        }
    }
    Ok(())
}

pub fn run_completions(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(args.shell, &mut cmd, "wingtrim", &mut std::io::stdout());
    Ok(())
}
