//! `wingtrim plan` - loop corrections toward zero group means

use console::style;
use miette::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::args::PlanArgs;
use crate::cli::commands::utils::{open_workbench, resolve_lanes};
use crate::cli::output::{effective_format, print_json, print_rows, print_success, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::line_id::Side;
use crate::core::numeric::format_signed_mm;
use crate::core::plan::TargetProposal;

#[derive(Debug, Serialize, Tabled)]
struct ProposalRow {
    #[tabled(rename = "GROUP")]
    group: String,
    #[tabled(rename = "SIDE")]
    side: Side,
    #[tabled(rename = "MEAN")]
    current: String,
    #[tabled(rename = "LOOPS")]
    loops: String,
    #[tabled(rename = "CHANGE")]
    extra: String,
    #[tabled(rename = "PREDICTED")]
    predicted: String,
}

impl From<&TargetProposal> for ProposalRow {
    fn from(p: &TargetProposal) -> Self {
        Self {
            group: p.group.clone(),
            side: p.side,
            current: format_signed_mm(p.current_mean),
            loops: format!("{:+}", p.loops_to_apply_signed),
            extra: format_signed_mm(p.extra_mm),
            predicted: format_signed_mm(p.predicted_mean),
        }
    }
}

pub fn run(args: PlanArgs, global: &GlobalOpts) -> Result<()> {
    let mut bench = open_workbench(global)?;
    let lanes = resolve_lanes(args.lanes.as_deref(), bench.config())?;

    let plan = if args.apply {
        bench.apply_plan(lanes)
    } else {
        bench.compute(lanes).plan
    };

    match effective_format(global.format, true) {
        OutputFormat::Json => return print_json(&plan),
        OutputFormat::Yaml => return print_yaml(&plan),
        _ => {}
    }

    if plan.is_empty() {
        println!(
            "{} Every group in lanes {} is within one loop of nominal",
            style("✓").green(),
            lanes
        );
        return Ok(());
    }

    let rows: Vec<ProposalRow> = plan.iter().map(ProposalRow::from).collect();
    print_rows(&rows, global.format)?;

    if args.apply {
        print_success(&format!(
            "Added {} correction(s) to the adjustments",
            plan.len()
        ));
    } else {
        println!(
            "{}",
            style("Run with --apply to add these corrections to the adjustments").dim()
        );
    }
    Ok(())
}
