//! Survey CLI - command line harness around `survey_core`.
//!
//! Provides the `plan_survey` binary, which reads a survey request and
//! optional planner rules as JSON and writes the resulting flight plan.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use survey_core::{PlannerRules, SurveyRequest};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable naming a rules file when `--rules` is not given.
pub const RULES_ENV: &str = "SURVEY_RULES";

/// Install the global tracing subscriber.
pub fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("survey_core=info".parse()?)
        .add_directive("survey_cli=info".parse()?);
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {what} in {}", path.display()))
}

pub fn load_request(path: &Path) -> Result<SurveyRequest> {
    read_json(path, "survey request")
}

/// Rules from `path`, or defaults when no path is given.
pub fn load_rules(path: Option<&Path>) -> Result<PlannerRules> {
    match path {
        Some(path) => read_json(path, "planner rules"),
        None => Ok(PlannerRules::default()),
    }
}
