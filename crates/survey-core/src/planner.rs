//! End-to-end survey planning: validation, heading selection and aggregation.

use rayon::prelude::*;

use crate::camera::CaptureGeometry;
use crate::chainer::MissionChainer;
use crate::diagnostics::{DiagnosticKind, DiagnosticsSink};
use crate::error::{PlanError, Result};
use crate::models::{FlightPlan, MissionParams, Polygon, SurveyRequest};
use crate::partition::{FlightTimeModel, MissionPartitioner};
use crate::rules::PlannerRules;
use crate::sequencer::PathSequencer;
use crate::spatial::normalize_bearing;

/// Finest supported ground sample distance (cm/px).
pub const MIN_GSD_CM: f64 = 0.5;
/// Coarsest supported ground sample distance (cm/px).
pub const MAX_GSD_CM: f64 = 50.0;

pub struct SurveyPlanner<'a> {
    rules: &'a PlannerRules,
    sink: &'a dyn DiagnosticsSink,
}

/// Plan a survey with the given rules, reporting diagnostics to `sink`.
pub fn plan_survey(
    request: &SurveyRequest,
    rules: &PlannerRules,
    sink: &dyn DiagnosticsSink,
) -> Result<FlightPlan> {
    SurveyPlanner::new(rules, sink).plan(request)
}

impl<'a> SurveyPlanner<'a> {
    pub fn new(rules: &'a PlannerRules, sink: &'a dyn DiagnosticsSink) -> Self {
        Self { rules, sink }
    }

    /// Validate the request, evaluate each candidate heading and keep the
    /// fastest plan. Ties keep the earlier candidate.
    pub fn plan(&self, request: &SurveyRequest) -> Result<FlightPlan> {
        validate_request(request)?;
        self.rules.validate()?;
        let aoi = Polygon::new(request.aoi.outer.clone(), request.aoi.holes.clone())?;
        let geometry = CaptureGeometry::compute(&request.camera, &request.mission);
        self.report_quality(&geometry);

        let headings = self.candidate_headings(&request.mission)?;
        let plans: Vec<Option<FlightPlan>> = headings
            .par_iter()
            .map(|heading| self.evaluate_heading(&aoi, &geometry, &request.mission, *heading))
            .collect();

        let mut best: Option<FlightPlan> = None;
        for plan in plans.into_iter().flatten() {
            if best
                .as_ref()
                .map_or(true, |current| plan.total_time_min < current.total_time_min)
            {
                best = Some(plan);
            }
        }

        let Some(plan) = best else {
            self.sink.error(
                DiagnosticKind::NoCoverage,
                format!("no flight lines could be generated for headings {headings:?}"),
            );
            return Err(PlanError::NoCoverage { headings });
        };
        self.sink.info(
            DiagnosticKind::PlanSelected,
            format!("selected heading {:.1}°: {}", plan.heading_deg, plan.summary()),
        );
        Ok(plan)
    }

    fn candidate_headings(&self, params: &MissionParams) -> Result<Vec<f64>> {
        if let Some(heading) = params.heading_deg {
            return Ok(vec![normalize_bearing(heading)]);
        }
        Ok(self
            .rules
            .candidate_headings_deg
            .iter()
            .map(|heading| normalize_bearing(*heading))
            .collect())
    }

    fn report_quality(&self, geometry: &CaptureGeometry) {
        let minimum = self.rules.min_practical_spacing;
        if geometry.line_spacing_m < minimum {
            self.sink.warn(
                DiagnosticKind::LowSpacing,
                format!(
                    "line spacing {:.3} m is below the practical minimum of {minimum} m",
                    geometry.line_spacing_m
                ),
            );
        }
        if geometry.photo_spacing_m < minimum {
            self.sink.warn(
                DiagnosticKind::LowPhotoInterval,
                format!(
                    "photo spacing {:.3} m ({:.3} s) is below the practical minimum of {minimum} m",
                    geometry.photo_spacing_m, geometry.photo_interval_s
                ),
            );
        }
        if geometry.interval_limited {
            self.sink.info(
                DiagnosticKind::CameraIntervalLimited,
                format!(
                    "photo interval raised to the camera minimum of {:.2} s; photo spacing is now {:.2} m",
                    geometry.photo_interval_s, geometry.photo_spacing_m
                ),
            );
        }
    }

    /// Full partition, sequence and chain pipeline for one heading.
    fn evaluate_heading(
        &self,
        aoi: &Polygon,
        geometry: &CaptureGeometry,
        params: &MissionParams,
        heading_deg: f64,
    ) -> Option<FlightPlan> {
        let time = FlightTimeModel::new(geometry, params.speed_mps, self.rules);
        let budget_min = self.rules.mission_budget_min(params.max_battery_min);
        let drafts = MissionPartitioner::new(self.rules, self.sink).partition(
            aoi,
            heading_deg,
            geometry.line_spacing_m,
            budget_min,
            &time,
        );
        if drafts.is_empty() {
            self.sink.warn(
                DiagnosticKind::HeadingFailed,
                format!("heading {heading_deg:.1}° produced no missions"),
            );
            return None;
        }

        let sequencer = PathSequencer::new(self.rules, aoi, params.speed_mps);
        let missions = drafts
            .into_iter()
            .map(|draft| sequencer.sequence(draft))
            .collect();
        let chained = MissionChainer::new(&sequencer).chain(missions);
        let missions = chained.missions;

        let total_time_min = missions.iter().map(|m| m.estimated_time_min).sum();
        let total_photos = missions.iter().map(|m| m.photo_count).sum();
        let total_distance_m = missions.iter().map(|m| m.path_length_m).sum();
        let plan = FlightPlan {
            heading_deg,
            mission_count: missions.len(),
            battery_count: missions.len(),
            missions,
            total_time_min,
            total_photos,
            area_m2: aoi.area_m2(),
            altitude_m: geometry.altitude_m,
            line_spacing_m: geometry.line_spacing_m,
            photo_interval_s: geometry.photo_interval_s,
            photo_spacing_m: geometry.photo_spacing_m,
            total_distance_m,
            transit_distance_m: chained.transit_distance_m,
        };
        self.sink.info(
            DiagnosticKind::HeadingEvaluated,
            format!(
                "heading {:.1}°: {} mission(s), {:.1} min",
                heading_deg, plan.mission_count, plan.total_time_min
            ),
        );
        Some(plan)
    }
}

/// Check every request parameter. GSD is checked first so an out-of-range
/// value is reported before anything else.
pub fn validate_request(request: &SurveyRequest) -> Result<()> {
    let params = &request.mission;
    if !(MIN_GSD_CM..=MAX_GSD_CM).contains(&params.gsd_cm) {
        return Err(PlanError::InvalidGsd {
            gsd_cm: params.gsd_cm,
            min: MIN_GSD_CM,
            max: MAX_GSD_CM,
        });
    }

    positive("speed_mps", params.speed_mps)?;
    positive("max_battery_min", params.max_battery_min)?;
    overlap("front_overlap_pct", params.front_overlap_pct)?;
    overlap("side_overlap_pct", params.side_overlap_pct)?;
    if let Some(heading) = params.heading_deg {
        if !heading.is_finite() {
            return Err(PlanError::parameter("heading_deg", "must be finite"));
        }
    }

    let camera = &request.camera;
    positive("sensor_width_mm", camera.sensor_width_mm)?;
    positive("sensor_height_mm", camera.sensor_height_mm)?;
    positive("focal_length_mm", camera.focal_length_mm)?;
    if camera.image_width_px == 0 {
        return Err(PlanError::parameter("image_width_px", "must be positive"));
    }
    if camera.image_height_px == 0 {
        return Err(PlanError::parameter("image_height_px", "must be positive"));
    }
    if !(camera.min_photo_interval_s.is_finite() && camera.min_photo_interval_s >= 0.0) {
        return Err(PlanError::parameter(
            "min_photo_interval_s",
            format!("{} must be a non-negative number", camera.min_photo_interval_s),
        ));
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PlanError::parameter(field, format!("{value} must be positive")))
    }
}

fn overlap(field: &'static str, value: f64) -> Result<()> {
    if (0.0..100.0).contains(&value) {
        Ok(())
    } else {
        Err(PlanError::parameter(field, format!("{value}% is outside [0, 100)")))
    }
}
