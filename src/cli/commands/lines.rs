//! `wingtrim lines`, `groups`, `series` and `suggest` - computed views

use console::style;
use miette::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::args::{LinesArgs, SeriesArgs};
use crate::cli::commands::utils::open_workbench;
use crate::cli::helpers::{format_delta, format_optional, parse_lane, styled_delta};
use crate::cli::output::{effective_format, print_json, print_rows, print_yaml};
use crate::cli::viz;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::aggregate::{self, LineStates, StateKind};
use crate::core::deviation::Severity;
use crate::core::line_id::Side;
use crate::core::numeric::format_signed_mm;
use crate::core::plan::LaneFilter;

#[derive(Debug, Serialize, Tabled)]
struct LineRow {
    #[tabled(rename = "LINE")]
    line: String,
    #[tabled(rename = "GROUP")]
    group: String,
    #[tabled(rename = "NOMINAL")]
    nominal: String,
    #[tabled(rename = "L MEAS")]
    left_measured: String,
    #[tabled(rename = "L LOOP")]
    left_loop: String,
    #[tabled(rename = "L DEV")]
    left_delta: String,
    #[tabled(rename = "R MEAS")]
    right_measured: String,
    #[tabled(rename = "R LOOP")]
    right_loop: String,
    #[tabled(rename = "R DEV")]
    right_delta: String,
}

fn is_flagged(line: &LineStates, state: StateKind) -> bool {
    Side::ALL.iter().any(|side| {
        matches!(
            line.side(*side).state(state).severity,
            Severity::Yellow | Severity::Red
        )
    })
}

pub fn run_lines(args: LinesArgs, global: &GlobalOpts) -> Result<()> {
    let bench = open_workbench(global)?;
    if bench.sheet().is_none() {
        return Err(miette::miette!(
            "No measurement sheet has been imported. Run 'wingtrim import <file>' first"
        ));
    }

    let state = StateKind::from(args.state);
    let lane = match args.lane {
        Some(c) => Some(parse_lane(c).ok_or_else(|| miette::miette!("Invalid lane '{}'", c))?),
        None => None,
    };

    let computation = bench.compute(LaneFilter::all());
    let lines: Vec<&LineStates> = computation
        .lines
        .iter()
        .filter(|line| match lane {
            Some(lane) => line.line_id.map(|id| id.prefix) == Some(lane),
            None => true,
        })
        .filter(|line| !args.flagged || is_flagged(line, state))
        .collect();

    match effective_format(global.format, true) {
        OutputFormat::Json => return print_json(&lines),
        OutputFormat::Yaml => return print_yaml(&lines),
        _ => {}
    }

    let colored = global.format == OutputFormat::Auto;
    let delta_text = |line: &LineStates, side: Side| {
        let result = line.side(side).state(state);
        if colored {
            styled_delta(result)
        } else {
            format_delta(result)
        }
    };

    let rows: Vec<LineRow> = lines
        .iter()
        .map(|line| LineRow {
            line: line.label.clone(),
            group: line.group.clone().unwrap_or_else(|| "-".to_string()),
            nominal: format_optional(Some(line.nominal)),
            left_measured: format_optional(line.left.measured),
            left_loop: line.left.loop_type.clone(),
            left_delta: delta_text(line, Side::Left),
            right_measured: format_optional(line.right.measured),
            right_loop: line.right.loop_type.clone(),
            right_delta: delta_text(line, Side::Right),
        })
        .collect();

    println!(
        "{} state, tolerance {} mm",
        style(state).bold(),
        bench.tolerance()
    );
    print_rows(&rows, global.format)
}

#[derive(Debug, Serialize, Tabled)]
struct GroupRow {
    #[tabled(rename = "GROUP")]
    group: String,
    #[tabled(rename = "SIDE")]
    side: Side,
    #[tabled(rename = "MEAN")]
    mean: String,
    #[tabled(rename = "LINES")]
    samples: usize,
    #[tabled(rename = "ADJUST")]
    adjustment: String,
    #[tabled(rename = "")]
    bar: String,
}

pub fn run_groups(global: &GlobalOpts) -> Result<()> {
    let bench = open_workbench(global)?;
    let overview = bench.group_overview();

    match effective_format(global.format, true) {
        OutputFormat::Json => return print_json(&overview),
        OutputFormat::Yaml => return print_yaml(&overview),
        _ => {}
    }

    let tolerance = bench.tolerance();
    let rows: Vec<GroupRow> = overview
        .iter()
        .map(|entry| GroupRow {
            group: entry.group.clone(),
            side: entry.side,
            mean: entry
                .mean_delta
                .map(format_signed_mm)
                .unwrap_or_else(|| "-".to_string()),
            samples: entry.samples,
            adjustment: format_signed_mm(entry.adjustment),
            bar: entry
                .mean_delta
                .map(|mean| viz::render_deviation_bar(mean, tolerance))
                .unwrap_or_default(),
        })
        .collect();

    if let Some(key) = bench.active_profile_key() {
        println!("Profile {}", style(key).cyan());
    }
    print_rows(&rows, global.format)
}

#[derive(Debug, Serialize, Tabled)]
struct SeriesRow {
    #[tabled(rename = "LINE")]
    line: String,
    #[tabled(rename = "DEVIATION")]
    value: String,
}

pub fn run_series(args: SeriesArgs, global: &GlobalOpts) -> Result<()> {
    let bench = open_workbench(global)?;
    let prefix = parse_lane(args.prefix)
        .ok_or_else(|| miette::miette!("Invalid line prefix '{}'", args.prefix))?;

    let computation = bench.compute(LaneFilter::all());
    let points = aggregate::series(
        &computation.lines,
        prefix,
        args.mode.into(),
        args.state.into(),
    );

    match effective_format(global.format, true) {
        OutputFormat::Json => return print_json(&points),
        OutputFormat::Yaml => return print_yaml(&points),
        _ => {}
    }

    if args.plot {
        println!(
            "{}",
            viz::render_series_plot(
                &points,
                prefix,
                bench.tolerance(),
                viz::PLOT_WIDTH,
                viz::PLOT_HEIGHT
            )
        );
        return Ok(());
    }

    let rows: Vec<SeriesRow> = points
        .iter()
        .map(|point| SeriesRow {
            line: format!("{}{}", prefix, point.index),
            value: format_signed_mm(point.value),
        })
        .collect();
    print_rows(&rows, global.format)
}

#[derive(Debug, Serialize, Tabled)]
struct SuggestionRow {
    #[tabled(rename = "GROUP")]
    group: String,
    #[tabled(rename = "SIDE")]
    side: Side,
    #[tabled(rename = "MEAN")]
    mean: String,
    #[tabled(rename = "LOOPS")]
    loops: i64,
    #[tabled(rename = "ACTION")]
    action: String,
    #[tabled(rename = "OUT OF TOL")]
    out_of_tol: String,
}

pub fn run_suggest(global: &GlobalOpts) -> Result<()> {
    let bench = open_workbench(global)?;
    let computation = bench.compute(LaneFilter::all());
    let suggestions = aggregate::suggest(
        &computation.stats,
        bench.active_profile().step(),
        bench.tolerance(),
    );

    match effective_format(global.format, true) {
        OutputFormat::Json => return print_json(&suggestions),
        OutputFormat::Yaml => return print_yaml(&suggestions),
        _ => {}
    }

    let rows: Vec<SuggestionRow> = suggestions
        .iter()
        .map(|s| SuggestionRow {
            group: s.group.clone(),
            side: s.side,
            mean: format_signed_mm(s.mean_delta),
            loops: s.loops_signed,
            action: s.action.to_string(),
            out_of_tol: if s.out_of_tol { "yes" } else { "" }.to_string(),
        })
        .collect();
    print_rows(&rows, global.format)
}
