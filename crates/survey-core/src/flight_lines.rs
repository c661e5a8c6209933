//! Parallel flight line generation clipped to a polygon's interior.
//!
//! Raw lines are laid out perpendicular to the heading across the polygon's
//! coverage width, clipped to the bounding rectangle, sampled, and split into
//! maximal interior runs. Concavities and holes therefore produce several
//! shorter lines instead of one line crossing a gap.

use crate::diagnostics::{DiagnosticKind, DiagnosticsSink};
use crate::models::{Coordinate, Polygon};
use crate::rules::PlannerRules;
use crate::spatial::{clip_segment_to_rect, distance, lerp, HeadingFrame};

/// Boundary lines are pulled this far inside the coverage width so that they
/// classify as interior instead of lying exactly on an edge.
pub(crate) const BOUNDARY_INSET_M: f64 = 0.05;
/// Floor on any sample step, whatever the rules say.
const MIN_SAMPLE_STEP_M: f64 = 0.01;
/// Bisection steps used to move a run endpoint onto the boundary.
const BOUNDARY_REFINE_STEPS: usize = 12;
const COUNT_EPSILON: f64 = 1e-6;

pub struct FlightLineGenerator<'a> {
    rules: &'a PlannerRules,
    sink: &'a dyn DiagnosticsSink,
}

/// Layout of raw lines across a polygon for a given heading.
#[derive(Debug, Clone)]
struct LineLayout {
    frame: HeadingFrame,
    min_along: f64,
    max_along: f64,
    coverage_width_m: f64,
    offsets: Vec<f64>,
}

impl<'a> FlightLineGenerator<'a> {
    pub fn new(rules: &'a PlannerRules, sink: &'a dyn DiagnosticsSink) -> Self {
        Self { rules, sink }
    }

    /// Generate interior flight line segments covering `area`.
    ///
    /// When `constraint` is given, a sample must also lie inside it (used to
    /// clip partition strips against the true AOI). Segments are returned in
    /// perpendicular order, and along the heading within one raw line. Each
    /// segment holds every interior sample, so consecutive waypoints are at
    /// most one sample step apart.
    pub fn generate(
        &self,
        area: &Polygon,
        heading_deg: f64,
        spacing_m: f64,
        constraint: Option<&Polygon>,
    ) -> Vec<Vec<Coordinate>> {
        let frame = HeadingFrame::new(area.bounds().center(), heading_deg);
        self.generate_in_frame(area, &frame, spacing_m, constraint)
    }

    /// Same as [`FlightLineGenerator::generate`] but measuring coverage in a
    /// caller-supplied frame.
    pub fn generate_in_frame(
        &self,
        area: &Polygon,
        frame: &HeadingFrame,
        spacing_m: f64,
        constraint: Option<&Polygon>,
    ) -> Vec<Vec<Coordinate>> {
        if !(spacing_m.is_finite() && spacing_m > 0.0) {
            return Vec::new();
        }
        let Some(layout) = self.layout(area, *frame, spacing_m) else {
            return Vec::new();
        };
        let step = self.sample_step(spacing_m, layout.coverage_width_m);
        self.trace(area, &layout, step, constraint)
    }

    /// Lines at caller-chosen perpendicular offsets of `frame`.
    ///
    /// Partition strips use this so that every strip's lines sit on one
    /// AOI-wide grid.
    pub fn generate_at_offsets(
        &self,
        area: &Polygon,
        frame: &HeadingFrame,
        offsets: &[f64],
        spacing_m: f64,
        constraint: Option<&Polygon>,
    ) -> Vec<Vec<Coordinate>> {
        if !(spacing_m.is_finite() && spacing_m > 0.0) || offsets.is_empty() {
            return Vec::new();
        }
        let Some((min_along, max_along, min_perp, max_perp)) = frame.extent(area.outer()) else {
            return Vec::new();
        };
        let layout = LineLayout {
            frame: *frame,
            min_along,
            max_along,
            coverage_width_m: max_perp - min_perp,
            offsets: offsets.to_vec(),
        };
        let step = self.sample_step(spacing_m, layout.coverage_width_m);
        self.trace(area, &layout, step, constraint)
    }

    /// Whole-area lines sampled at the finest configured step.
    ///
    /// Last resort when regular sampling misses slivers thinner than a step.
    pub fn generate_dense(
        &self,
        area: &Polygon,
        frame: &HeadingFrame,
        spacing_m: f64,
    ) -> Vec<Vec<Coordinate>> {
        if !(spacing_m.is_finite() && spacing_m > 0.0) {
            return Vec::new();
        }
        let Some(layout) = self.layout(area, *frame, spacing_m) else {
            return Vec::new();
        };
        let step = self.rules.min_sample_step_m.max(MIN_SAMPLE_STEP_M);
        self.trace(area, &layout, step, None)
    }

    fn trace(
        &self,
        area: &Polygon,
        layout: &LineLayout,
        sample_step: f64,
        constraint: Option<&Polygon>,
    ) -> Vec<Vec<Coordinate>> {
        let half_length =
            (layout.max_along - layout.min_along) * (1.0 + self.rules.line_length_buffer) / 2.0;
        let mid_along = (layout.min_along + layout.max_along) / 2.0;
        let rect = area.bounds();
        let is_interior = |point: Coordinate| {
            area.contains(point) && constraint.map_or(true, |outer| outer.contains(point))
        };

        let mut segments = Vec::new();
        for offset in &layout.offsets {
            let raw_start = layout.frame.to_geo(mid_along - half_length, *offset);
            let raw_end = layout.frame.to_geo(mid_along + half_length, *offset);
            let Some((start, end)) = clip_segment_to_rect(raw_start, raw_end, &rect) else {
                continue;
            };
            segments.extend(interior_runs(start, end, sample_step, &is_interior));
        }
        segments
    }

    fn layout(&self, area: &Polygon, frame: HeadingFrame, spacing_m: f64) -> Option<LineLayout> {
        let (min_along, max_along, min_perp, max_perp) = frame.extent(area.outer())?;
        let coverage_width_m = max_perp - min_perp;

        let offsets = if spacing_m >= coverage_width_m {
            let (_, centroid_perp) = frame.to_local(area.centroid());
            vec![centroid_perp]
        } else {
            let mut count = (coverage_width_m / spacing_m - COUNT_EPSILON).ceil() as usize + 1;
            let max_lines = self.rules.max_lines_per_strip.max(2);
            if count > max_lines {
                self.sink.warn(
                    DiagnosticKind::LineCapApplied,
                    format!(
                        "{} lines needed at {:.2} m spacing over {:.1} m; capped at {}",
                        count, spacing_m, coverage_width_m, max_lines
                    ),
                );
                count = max_lines;
            }
            let inset = BOUNDARY_INSET_M.min(coverage_width_m / 4.0);
            let usable = coverage_width_m - 2.0 * inset;
            let step = usable / (count - 1) as f64;
            let mid_perp = (min_perp + max_perp) / 2.0;
            let first = (count - 1) as f64 / 2.0;
            (0..count)
                .map(|i| mid_perp + (i as f64 - first) * step)
                .collect()
        };

        Some(LineLayout {
            frame,
            min_along,
            max_along,
            coverage_width_m,
            offsets,
        })
    }

    /// Distance between classified samples along a raw line.
    fn sample_step(&self, spacing_m: f64, coverage_width_m: f64) -> f64 {
        let rules = self.rules;
        let mut step = rules
            .max_sample_step_m
            .min(spacing_m * rules.sample_step_spacing_factor);
        if rules.coverage_sample_divisor > 0.0 && coverage_width_m > 0.0 {
            step = step.min(coverage_width_m / rules.coverage_sample_divisor);
        }
        step.max(rules.min_sample_step_m).max(MIN_SAMPLE_STEP_M)
    }
}

/// Split the segment `start..end` into maximal runs of interior samples.
fn interior_runs<F>(
    start: Coordinate,
    end: Coordinate,
    step_m: f64,
    is_interior: &F,
) -> Vec<Vec<Coordinate>>
where
    F: Fn(Coordinate) -> bool,
{
    let length = distance(start, end);
    let steps = ((length / step_m).ceil() as usize).max(1);
    let sample = |i: usize| lerp(start, end, i as f64 / steps as f64);

    let mut runs = Vec::new();
    let mut run_start: Option<usize> = None;
    for i in 0..=steps {
        let inside = is_interior(sample(i));
        match (inside, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(first)) => {
                push_run(&mut runs, first, i - 1, steps, &sample, is_interior);
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(first) = run_start {
        push_run(&mut runs, first, steps, steps, &sample, is_interior);
    }
    runs
}

/// Emit samples `first..=last`, extended at each end by the point refined
/// toward the boundary.
fn push_run<S, F>(
    runs: &mut Vec<Vec<Coordinate>>,
    first: usize,
    last: usize,
    steps: usize,
    sample: &S,
    is_interior: &F,
) where
    S: Fn(usize) -> Coordinate,
    F: Fn(Coordinate) -> bool,
{
    let mut run: Vec<Coordinate> = Vec::with_capacity(last - first + 3);
    if first > 0 {
        run.push(refine_boundary(sample(first - 1), sample(first), is_interior));
    }
    for i in first..=last {
        let point = sample(i);
        if run.last() != Some(&point) {
            run.push(point);
        }
    }
    if last < steps {
        let tail = refine_boundary(sample(last + 1), sample(last), is_interior);
        if run.last() != Some(&tail) {
            run.push(tail);
        }
    }
    if run.len() >= 2 {
        runs.push(run);
    }
}

/// Bisect between an exterior and an interior sample, returning the interior
/// point closest to the boundary.
fn refine_boundary<F>(outside: Coordinate, inside: Coordinate, is_interior: &F) -> Coordinate
where
    F: Fn(Coordinate) -> bool,
{
    let mut out = outside;
    let mut inn = inside;
    for _ in 0..BOUNDARY_REFINE_STEPS {
        let mid = lerp(out, inn, 0.5);
        if is_interior(mid) {
            inn = mid;
        } else {
            out = mid;
        }
    }
    inn
}
