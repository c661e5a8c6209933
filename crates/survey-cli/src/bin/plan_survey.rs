//! Plan a photogrammetry survey from a JSON request.
//!
//! Writes the flight plan as JSON to stdout (or `--output`), or a one-line
//! summary per mission with `--summary`.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use survey_cli::{init_tracing, load_request, load_rules, RULES_ENV};
use survey_core::{plan_survey, TracingSink};

/// Plan battery-bounded survey missions for an area of interest
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Survey request JSON (AOI, camera, mission parameters)
    #[arg(long)]
    request: PathBuf,

    /// Planner rules JSON; missing fields keep their defaults
    #[arg(long, env = RULES_ENV)]
    rules: Option<PathBuf>,

    /// Override the request's heading (degrees)
    #[arg(long, allow_hyphen_values = true)]
    heading: Option<f64>,

    /// Write the plan here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print a human readable summary instead of JSON
    #[arg(long)]
    summary: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs)?;

    let mut request = load_request(&args.request)?;
    if let Some(heading) = args.heading {
        request.mission.heading_deg = Some(heading);
    }
    let rules = load_rules(args.rules.as_deref())?;

    tracing::info!(request = %args.request.display(), "Planning survey...");
    let plan = plan_survey(&request, &rules, &TracingSink).context("survey planning failed")?;

    let rendered = if args.summary {
        let mut text = format!("{}\n", plan.summary());
        for mission in &plan.missions {
            text.push_str(&format!(
                "  #{} (id {}): {} lines, {:.1} min, {} photos, {:.0} m path\n",
                mission.sequence,
                mission.id,
                mission.flight_lines.len(),
                mission.estimated_time_min,
                mission.photo_count,
                mission.path_length_m,
            ));
        }
        text
    } else {
        serde_json::to_string_pretty(&plan).context("failed to serialize flight plan")? + "\n"
    };

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("failed to write plan to {}", path.display()))?;
            tracing::info!(output = %path.display(), missions = plan.mission_count, "Plan written");
        }
        None => io::stdout()
            .write_all(rendered.as_bytes())
            .context("failed to write plan to stdout")?,
    }
    Ok(())
}
