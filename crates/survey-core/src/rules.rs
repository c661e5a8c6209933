//! Tunable constants for the survey planner.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// Configuration for the planning pipeline.
///
/// Timing constants (photo trigger, turn penalty) are field estimates rather
/// than physically derived values, so they are exposed here instead of being
/// hard-coded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerRules {
    /// Fraction of usable battery time a mission may consume
    pub battery_safety_factor: f64,
    /// Seconds charged per photo in time estimates
    pub photo_trigger_s: f64,
    /// Seconds charged per flight line for the turn onto it
    pub turn_penalty_s: f64,
    /// Maximum number of parallel lines generated for one strip
    pub max_lines_per_strip: usize,
    /// Maximum number of strips carved out of one AOI
    pub max_strips: usize,
    /// Maximum number of missions kept after splitting and merging
    pub max_missions: usize,
    /// Iterations of the strip-width binary search
    pub width_search_iterations: usize,
    /// Bank angle used for the turn radius (degrees)
    pub bank_angle_deg: f64,
    /// Fraction added to raw line length beyond the polygon extent
    pub line_length_buffer: f64,
    /// Upper bound on the distance between classified waypoints (meters)
    pub max_sample_step_m: f64,
    /// Sample step is also bounded by this multiple of the line spacing
    pub sample_step_spacing_factor: f64,
    /// Sample step never exceeds coverage width divided by this value
    pub coverage_sample_divisor: f64,
    /// Smallest sample step ever used (meters)
    pub min_sample_step_m: f64,
    /// Line spacing / photo interval below this is flagged as a quality risk
    pub min_practical_spacing: f64,
    /// Heading changes below this are joined with a straight connector (degrees)
    pub straight_turn_threshold_deg: f64,
    /// Heading changes above this are joined with a U-turn arc (degrees)
    pub uturn_threshold_deg: f64,
    /// Connector gap cap as a multiple of the average line gap
    pub connector_gap_factor: f64,
    /// Connector gap cap never drops below this (meters)
    pub min_connector_gap_m: f64,
    /// Gentle-curve offset cap as a fraction of the turn radius
    pub curve_offset_fraction: f64,
    /// Number of arc steps in a U-turn
    pub arc_samples: usize,
    /// Sequencer tries every line as a start when a mission has at most this many lines
    pub exhaustive_start_limit: usize,
    /// Headings evaluated when no manual heading is given (degrees)
    pub candidate_headings_deg: Vec<f64>,
}

impl Default for PlannerRules {
    fn default() -> Self {
        Self {
            battery_safety_factor: 0.9,
            photo_trigger_s: 2.0,
            turn_penalty_s: 30.0,
            max_lines_per_strip: 1_000,
            max_strips: 100,
            max_missions: 100,
            width_search_iterations: 20,
            bank_angle_deg: 25.0,
            line_length_buffer: 0.2,
            max_sample_step_m: 5.0,
            sample_step_spacing_factor: 1.2,
            coverage_sample_divisor: 50.0,
            min_sample_step_m: 0.5,
            min_practical_spacing: 0.5,
            straight_turn_threshold_deg: 30.0,
            uturn_threshold_deg: 150.0,
            connector_gap_factor: 3.0,
            min_connector_gap_m: 50.0,
            curve_offset_fraction: 0.3,
            arc_samples: 8,
            exhaustive_start_limit: 48,
            candidate_headings_deg: vec![0.0, 90.0],
        }
    }
}

impl PlannerRules {
    /// Per-mission time budget in minutes after the safety reserve.
    pub fn mission_budget_min(&self, max_battery_min: f64) -> f64 {
        max_battery_min * self.battery_safety_factor
    }

    /// Reject rule sets the pipeline cannot run with, such as a zero sample
    /// step or inverted turn thresholds.
    pub fn validate(&self) -> Result<()> {
        if !(self.battery_safety_factor > 0.0 && self.battery_safety_factor <= 1.0) {
            return Err(PlanError::parameter(
                "battery_safety_factor",
                format!("{} is outside (0, 1]", self.battery_safety_factor),
            ));
        }
        non_negative("photo_trigger_s", self.photo_trigger_s)?;
        non_negative("turn_penalty_s", self.turn_penalty_s)?;
        at_least_one("max_lines_per_strip", self.max_lines_per_strip)?;
        at_least_one("max_strips", self.max_strips)?;
        at_least_one("max_missions", self.max_missions)?;
        at_least_one("width_search_iterations", self.width_search_iterations)?;
        at_least_one("arc_samples", self.arc_samples)?;
        if !(self.bank_angle_deg > 0.0 && self.bank_angle_deg < 90.0) {
            return Err(PlanError::parameter(
                "bank_angle_deg",
                format!("{} is outside (0, 90)", self.bank_angle_deg),
            ));
        }
        non_negative("line_length_buffer", self.line_length_buffer)?;
        positive("max_sample_step_m", self.max_sample_step_m)?;
        positive("sample_step_spacing_factor", self.sample_step_spacing_factor)?;
        positive("min_sample_step_m", self.min_sample_step_m)?;
        // 0 disables the width bound.
        non_negative("coverage_sample_divisor", self.coverage_sample_divisor)?;
        non_negative("min_practical_spacing", self.min_practical_spacing)?;
        non_negative("straight_turn_threshold_deg", self.straight_turn_threshold_deg)?;
        if !(self.uturn_threshold_deg > self.straight_turn_threshold_deg
            && self.uturn_threshold_deg <= 180.0)
        {
            return Err(PlanError::parameter(
                "uturn_threshold_deg",
                format!(
                    "{} must lie in ({}, 180]",
                    self.uturn_threshold_deg, self.straight_turn_threshold_deg
                ),
            ));
        }
        non_negative("connector_gap_factor", self.connector_gap_factor)?;
        non_negative("min_connector_gap_m", self.min_connector_gap_m)?;
        non_negative("curve_offset_fraction", self.curve_offset_fraction)?;

        if self.candidate_headings_deg.is_empty() {
            return Err(PlanError::parameter(
                "candidate_headings_deg",
                "at least one candidate heading is required",
            ));
        }
        if let Some(bad) = self
            .candidate_headings_deg
            .iter()
            .find(|heading| !heading.is_finite())
        {
            return Err(PlanError::parameter(
                "candidate_headings_deg",
                format!("heading {bad} is not finite"),
            ));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PlanError::parameter(field, format!("{value} must be positive")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PlanError::parameter(field, format!("{value} must be non-negative")))
    }
}

fn at_least_one(field: &'static str, value: usize) -> Result<()> {
    if value >= 1 {
        Ok(())
    } else {
        Err(PlanError::parameter(field, "must be at least 1"))
    }
}
