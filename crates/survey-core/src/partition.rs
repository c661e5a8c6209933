//! Battery-bounded partitioning of an AOI into heading-aligned strips.
//!
//! Lines sit on one grid spanning the AOI's whole perpendicular width, with
//! the outermost lines just inside both edges. The grid is consumed strip by
//! strip. Each strip is the widest one whose estimated flight time fits the
//! mission budget, found by a bounded binary search over width. Strips are
//! then double-clipped against the AOI, over-budget strips split, undersized
//! neighbours merged and the mission count capped.

use serde::{Deserialize, Serialize};

use crate::camera::CaptureGeometry;
use crate::diagnostics::{DiagnosticKind, DiagnosticsSink};
use crate::flight_lines::{FlightLineGenerator, BOUNDARY_INSET_M};
use crate::models::{Coordinate, FlightLine, Polygon};
use crate::rules::PlannerRules;
use crate::spatial::HeadingFrame;

const WIDTH_EPSILON: f64 = 1e-6;
/// Strip rectangles extend this far past the AOI along the heading.
const STRIP_ALONG_PAD_M: f64 = 1.0;

/// Time and photo estimates for flight lines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightTimeModel {
    pub speed_mps: f64,
    pub photo_spacing_m: f64,
    pub photo_trigger_s: f64,
    pub turn_penalty_s: f64,
}

impl FlightTimeModel {
    pub fn new(geometry: &CaptureGeometry, speed_mps: f64, rules: &PlannerRules) -> Self {
        Self {
            speed_mps,
            photo_spacing_m: geometry.photo_spacing_m,
            photo_trigger_s: rules.photo_trigger_s,
            turn_penalty_s: rules.turn_penalty_s,
        }
    }

    /// Photos along one line, including both ends.
    pub fn photos(&self, length_m: f64) -> u64 {
        if length_m <= 0.0 || self.photo_spacing_m <= 0.0 {
            return 1;
        }
        (length_m / self.photo_spacing_m).floor() as u64 + 1
    }

    /// Minutes to fly one line: cruise + photo triggers + turn onto the line.
    pub fn line_minutes(&self, length_m: f64) -> f64 {
        let cruise_s = length_m / self.speed_mps;
        let photo_s = self.photos(length_m) as f64 * self.photo_trigger_s;
        (cruise_s + photo_s + self.turn_penalty_s) / 60.0
    }

    pub fn lines_minutes(&self, lines: &[FlightLine]) -> f64 {
        lines.iter().map(|line| self.line_minutes(line.length_m)).sum()
    }

    pub fn lines_photos(&self, lines: &[FlightLine]) -> u64 {
        lines.iter().map(|line| self.photos(line.length_m)).sum()
    }
}

/// A partitioned mission before path sequencing.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionDraft {
    pub id: usize,
    pub flight_lines: Vec<FlightLine>,
    pub estimated_time_min: f64,
    pub photo_count: u64,
    pub coverage_polygon: Vec<Coordinate>,
}

pub struct MissionPartitioner<'a> {
    rules: &'a PlannerRules,
    sink: &'a dyn DiagnosticsSink,
}

/// Perpendicular offsets of every flight line across the AOI.
///
/// Offsets are computed on demand since a fine spacing over a wide AOI can
/// call for far more lines than are ever generated.
#[derive(Debug, Clone, Copy)]
struct LineGrid {
    min_perp: f64,
    max_perp: f64,
    first: f64,
    step: f64,
    count: usize,
}

impl LineGrid {
    /// Grid over `[min_perp, max_perp]`. An AOI no wider than one spacing
    /// gets a single line through its centroid.
    fn new(min_perp: f64, max_perp: f64, spacing_m: f64, centroid_perp: f64) -> Self {
        let width = max_perp - min_perp;
        if width <= spacing_m {
            return Self {
                min_perp,
                max_perp,
                first: centroid_perp,
                step: spacing_m,
                count: 1,
            };
        }
        let count = lines_for_width(width, spacing_m);
        let inset = BOUNDARY_INSET_M.min(width / 4.0);
        Self {
            min_perp,
            max_perp,
            first: min_perp + inset,
            step: (width - 2.0 * inset) / (count - 1) as f64,
            count,
        }
    }

    fn offset(&self, index: usize) -> f64 {
        self.first + index as f64 * self.step
    }

    /// Lines covered by a strip of `width_m` starting on a grid line.
    fn lines_in(&self, width_m: f64) -> usize {
        (width_m / self.step + WIDTH_EPSILON).floor() as usize + 1
    }

    /// Perpendicular bounds of the strip holding lines `first..=last`.
    /// Inner borders fall halfway between neighbouring lines.
    fn strip_bounds(&self, first: usize, last: usize) -> (f64, f64) {
        let low = if first == 0 {
            self.min_perp
        } else {
            (self.offset(first - 1) + self.offset(first)) / 2.0
        };
        let high = if last + 1 >= self.count {
            self.max_perp
        } else {
            (self.offset(last) + self.offset(last + 1)) / 2.0
        };
        (low, high)
    }
}

/// Number of lines needed to cover a strip of the given width.
pub fn lines_for_width(width_m: f64, spacing_m: f64) -> usize {
    if width_m < spacing_m {
        1
    } else {
        (width_m / spacing_m - WIDTH_EPSILON).ceil() as usize + 1
    }
}

impl<'a> MissionPartitioner<'a> {
    pub fn new(rules: &'a PlannerRules, sink: &'a dyn DiagnosticsSink) -> Self {
        Self { rules, sink }
    }

    /// Slice `aoi` into missions that each fit `budget_min`.
    ///
    /// Returns an empty list only when even the whole-AOI fallback produced no
    /// flight lines.
    pub fn partition(
        &self,
        aoi: &Polygon,
        heading_deg: f64,
        spacing_m: f64,
        budget_min: f64,
        time: &FlightTimeModel,
    ) -> Vec<MissionDraft> {
        let frame = HeadingFrame::new(aoi.bounds().center(), heading_deg);
        let Some((min_along, max_along, min_perp, max_perp)) = frame.extent(aoi.outer()) else {
            return Vec::new();
        };
        let along_length = max_along - min_along;
        let line_minutes = time.line_minutes(along_length);

        if line_minutes > budget_min {
            self.sink.warn(
                DiagnosticKind::UnsplittableStrip,
                format!(
                    "a single {:.0} m line needs {:.1} min, over the {:.1} min budget",
                    along_length, line_minutes, budget_min
                ),
            );
        }

        let (_, centroid_perp) = frame.to_local(aoi.centroid());
        let grid = LineGrid::new(min_perp, max_perp, spacing_m, centroid_perp);
        let generator = FlightLineGenerator::new(self.rules, self.sink);
        let mut groups: Vec<Vec<Vec<Coordinate>>> = Vec::new();
        let mut next = 0usize;
        let mut strips = 0usize;

        while next < grid.count {
            if strips >= self.rules.max_strips {
                self.sink.warn(
                    DiagnosticKind::StripCapReached,
                    format!(
                        "strip cap of {} reached with {} of {} lines unplanned",
                        self.rules.max_strips,
                        grid.count - next,
                        grid.count
                    ),
                );
                break;
            }
            strips += 1;

            let take = self.lines_per_strip(&grid, grid.count - next, budget_min, line_minutes);
            let last = next + take - 1;
            let (low, high) = grid.strip_bounds(next, last);
            let offsets: Vec<f64> = (next..=last).map(|k| grid.offset(k)).collect();
            next = last + 1;

            let corners = [
                frame.to_geo(min_along - STRIP_ALONG_PAD_M, low),
                frame.to_geo(max_along + STRIP_ALONG_PAD_M, low),
                frame.to_geo(max_along + STRIP_ALONG_PAD_M, high),
                frame.to_geo(min_along - STRIP_ALONG_PAD_M, high),
            ];
            let Ok(strip) = Polygon::new(corners.to_vec(), Vec::new()) else {
                self.sink.warn(
                    DiagnosticKind::StripSkipped,
                    format!("strip {} is degenerate ({:.2} m wide)", strips, high - low),
                );
                continue;
            };

            let lines =
                generator.generate_at_offsets(&strip, &frame, &offsets, spacing_m, Some(aoi));
            if lines.is_empty() {
                self.sink.warn(
                    DiagnosticKind::StripSkipped,
                    format!(
                        "strip {} ({:.1}..{:.1} m) produced no flight lines",
                        strips, low, high
                    ),
                );
                continue;
            }
            groups.push(lines);
        }

        if groups.is_empty() {
            self.sink.warn(
                DiagnosticKind::FallbackMission,
                format!(
                    "no strip produced flight lines at heading {:.1}°; trying a single whole-AOI mission",
                    heading_deg
                ),
            );
            let lines = generator.generate_dense(aoi, &frame, spacing_m);
            if lines.is_empty() {
                return Vec::new();
            }
            groups.push(lines);
        }

        let drafts: Vec<MissionDraft> = groups
            .into_iter()
            .map(|lines| build_draft(lines, time))
            .collect();
        let drafts = self.split_over_budget(drafts, budget_min, time);
        let drafts = self.merge_adjacent(drafts, budget_min);
        let mut drafts = self.cap_missions(drafts);

        for (id, draft) in drafts.iter_mut().enumerate() {
            draft.id = id;
            for (index, line) in draft.flight_lines.iter_mut().enumerate() {
                line.mission_id = id;
                line.index = index;
            }
            draft.coverage_polygon = coverage_rectangle(&draft.flight_lines, &frame, spacing_m);
        }
        drafts
    }

    /// Lines in the widest strip whose estimate fits the budget, out of the
    /// `remaining` grid lines.
    ///
    /// Always at least one line: a line over budget still gets its own strip.
    fn lines_per_strip(
        &self,
        grid: &LineGrid,
        remaining: usize,
        budget_min: f64,
        line_minutes: f64,
    ) -> usize {
        let minutes = |width: f64| grid.lines_in(width) as f64 * line_minutes;
        let remaining_width = (remaining - 1) as f64 * grid.step;

        let lines = if remaining == 1 || minutes(grid.step) > budget_min {
            1
        } else if minutes(remaining_width) <= budget_min {
            remaining
        } else {
            let mut lo = grid.step;
            let mut hi = remaining_width;
            for _ in 0..self.rules.width_search_iterations {
                let mid = (lo + hi) / 2.0;
                if minutes(mid) <= budget_min {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            grid.lines_in(lo).min(remaining)
        };

        let cap = self.rules.max_lines_per_strip.max(1);
        if lines > cap {
            self.sink.warn(
                DiagnosticKind::LineCapApplied,
                format!("strip of {} lines capped at {}", lines, cap),
            );
            return cap;
        }
        lines
    }

    /// Greedily split missions whose actual lines exceed the budget.
    fn split_over_budget(
        &self,
        drafts: Vec<MissionDraft>,
        budget_min: f64,
        time: &FlightTimeModel,
    ) -> Vec<MissionDraft> {
        let mut out = Vec::with_capacity(drafts.len());
        for draft in drafts {
            if draft.estimated_time_min <= budget_min || draft.flight_lines.len() < 2 {
                out.push(draft);
                continue;
            }
            let original_time = draft.estimated_time_min;
            let mut pieces: Vec<Vec<FlightLine>> = Vec::new();
            let mut current: Vec<FlightLine> = Vec::new();
            let mut current_min = 0.0;
            for line in draft.flight_lines {
                let line_min = time.line_minutes(line.length_m);
                if !current.is_empty() && current_min + line_min > budget_min {
                    pieces.push(std::mem::take(&mut current));
                    current_min = 0.0;
                }
                current_min += line_min;
                current.push(line);
            }
            if !current.is_empty() {
                pieces.push(current);
            }
            self.sink.info(
                DiagnosticKind::MissionSplit,
                format!(
                    "mission of {:.1} min split into {} to fit {:.1} min",
                    original_time,
                    pieces.len(),
                    budget_min
                ),
            );
            out.extend(pieces.into_iter().map(|lines| {
                let estimated_time_min = time.lines_minutes(&lines);
                let photo_count = time.lines_photos(&lines);
                MissionDraft {
                    id: 0,
                    flight_lines: lines,
                    estimated_time_min,
                    photo_count,
                    coverage_polygon: Vec::new(),
                }
            }));
        }
        out
    }

    /// Single greedy pass merging neighbours whose combined time still fits.
    fn merge_adjacent(&self, drafts: Vec<MissionDraft>, budget_min: f64) -> Vec<MissionDraft> {
        let before = drafts.len();
        let mut merged: Vec<MissionDraft> = Vec::with_capacity(before);
        for draft in drafts {
            match merged.last_mut() {
                Some(last) if last.estimated_time_min + draft.estimated_time_min <= budget_min => {
                    last.estimated_time_min += draft.estimated_time_min;
                    last.photo_count += draft.photo_count;
                    last.flight_lines.extend(draft.flight_lines);
                }
                _ => merged.push(draft),
            }
        }
        if merged.len() < before {
            self.sink.info(
                DiagnosticKind::MissionsMerged,
                format!("merged {} missions into {}", before, merged.len()),
            );
        }
        merged
    }

    /// Keep at most `max_missions` missions, dropping the rest.
    fn cap_missions(&self, mut drafts: Vec<MissionDraft>) -> Vec<MissionDraft> {
        let cap = self.rules.max_missions;
        if drafts.len() > cap {
            let dropped: usize = drafts[cap..].iter().map(|d| d.flight_lines.len()).sum();
            self.sink.warn(
                DiagnosticKind::MissionCapReached,
                format!(
                    "{} missions exceed the cap of {}; {} flight lines dropped",
                    drafts.len(),
                    cap,
                    dropped
                ),
            );
            drafts.truncate(cap);
        }
        drafts
    }
}

fn build_draft(lines: Vec<Vec<Coordinate>>, time: &FlightTimeModel) -> MissionDraft {
    let flight_lines: Vec<FlightLine> = lines
        .into_iter()
        .enumerate()
        .map(|(index, coordinates)| FlightLine::new(0, index, coordinates))
        .collect();
    MissionDraft {
        id: 0,
        estimated_time_min: time.lines_minutes(&flight_lines),
        photo_count: time.lines_photos(&flight_lines),
        flight_lines,
        coverage_polygon: Vec::new(),
    }
}

/// Heading-aligned rectangle around the lines, widened by half a spacing.
fn coverage_rectangle(lines: &[FlightLine], frame: &HeadingFrame, spacing_m: f64) -> Vec<Coordinate> {
    let points: Vec<Coordinate> = lines
        .iter()
        .flat_map(|line| line.coordinates.iter().copied())
        .collect();
    let Some((min_along, max_along, min_perp, max_perp)) = frame.extent(&points) else {
        return Vec::new();
    };
    let half = spacing_m / 2.0;
    vec![
        frame.to_geo(min_along, min_perp - half),
        frame.to_geo(max_along, min_perp - half),
        frame.to_geo(max_along, max_perp + half),
        frame.to_geo(min_along, max_perp + half),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingSink, NullSink};
    use crate::spatial::destination;

    const METERS_PER_DEG_AT_EQUATOR: f64 = 111_194.9;

    /// Point `east_m`, `north_m` from `origin`.
    fn at(origin: Coordinate, east_m: f64, north_m: f64) -> Coordinate {
        destination(destination(origin, 90.0, east_m), 0.0, north_m)
    }

    fn rect_polygon(origin: Coordinate, width_m: f64, height_m: f64) -> Polygon {
        let east = destination(origin, 90.0, width_m);
        let north = destination(origin, 0.0, height_m);
        let ring = vec![
            origin,
            Coordinate::new(origin.lat, east.lon),
            Coordinate::new(north.lat, east.lon),
            Coordinate::new(north.lat, origin.lon),
        ];
        Polygon::new(ring, Vec::new()).unwrap()
    }

    fn model() -> FlightTimeModel {
        FlightTimeModel {
            speed_mps: 10.0,
            photo_spacing_m: 20.0,
            photo_trigger_s: 2.0,
            turn_penalty_s: 30.0,
        }
    }

    #[test]
    fn lines_for_width_counts_both_edges() {
        assert_eq!(lines_for_width(5.0, 10.0), 1);
        assert_eq!(lines_for_width(10.0, 10.0), 2);
        assert_eq!(lines_for_width(200.0, 10.0), 21);
        assert_eq!(lines_for_width(201.0, 10.0), 22);
    }

    #[test]
    fn line_minutes_include_photos_and_turn() {
        // 1000 m at 10 m/s = 100 s, 51 photos * 2 s = 102 s, turn 30 s
        let minutes = model().line_minutes(1_000.0);
        assert!((minutes - 232.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn small_area_fits_one_mission() {
        let rules = PlannerRules::default();
        let partitioner = MissionPartitioner::new(&rules, &NullSink);
        let aoi = rect_polygon(Coordinate::new(45.0, 7.0), 100.0, 300.0);
        let drafts = partitioner.partition(&aoi, 0.0, 20.0, 60.0, &model());
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].flight_lines.len(), 6);
        assert_eq!(drafts[0].coverage_polygon.len(), 4);
    }

    #[test]
    fn missions_respect_budget() {
        let rules = PlannerRules::default();
        let sink = CollectingSink::new();
        let partitioner = MissionPartitioner::new(&rules, &sink);
        let aoi = rect_polygon(Coordinate::new(45.0, 7.0), 600.0, 800.0);
        let budget = 20.0 * rules.battery_safety_factor;
        let drafts = partitioner.partition(&aoi, 0.0, 15.0, budget, &model());

        assert!(drafts.len() > 1, "expected several missions");
        for draft in &drafts {
            assert!(
                draft.estimated_time_min <= budget + 1e-9,
                "mission {} takes {:.2} min",
                draft.id,
                draft.estimated_time_min
            );
            for line in &draft.flight_lines {
                assert_eq!(line.mission_id, draft.id);
                for point in &line.coordinates {
                    assert!(aoi.contains(*point));
                }
            }
        }
    }

    #[test]
    fn strips_do_not_duplicate_border_lines() {
        let rules = PlannerRules::default();
        let partitioner = MissionPartitioner::new(&rules, &NullSink);
        let aoi = rect_polygon(Coordinate::new(0.0, 0.0), 400.0, 1_000.0);
        let drafts = partitioner.partition(&aoi, 0.0, 20.0, 15.0, &model());
        let mut lons: Vec<f64> = drafts
            .iter()
            .flat_map(|d| d.flight_lines.iter().map(|l| l.start().lon))
            .collect();
        lons.sort_by(|a, b| a.total_cmp(b));
        for pair in lons.windows(2) {
            let gap_m = (pair[1] - pair[0]) * 111_194.9;
            assert!(gap_m > 15.0, "lines only {gap_m:.2} m apart");
        }
    }

    #[test]
    fn adjacent_small_strips_are_merged() {
        let rules = PlannerRules::default();
        let partitioner = MissionPartitioner::new(&rules, &NullSink);
        let draft = |minutes: f64| MissionDraft {
            id: 0,
            flight_lines: vec![FlightLine::new(
                0,
                0,
                vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.001, 0.0)],
            )],
            estimated_time_min: minutes,
            photo_count: 3,
            coverage_polygon: Vec::new(),
        };
        let merged = partitioner.merge_adjacent(vec![draft(5.0), draft(6.0), draft(9.0)], 12.0);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].flight_lines.len(), 2);
        assert!((merged[0].estimated_time_min - 11.0).abs() < 1e-9);
    }

    #[test]
    fn oversized_single_line_is_kept_and_flagged() {
        let rules = PlannerRules::default();
        let sink = CollectingSink::new();
        let partitioner = MissionPartitioner::new(&rules, &sink);
        let aoi = rect_polygon(Coordinate::new(10.0, 10.0), 60.0, 5_000.0);
        let drafts = partitioner.partition(&aoi, 0.0, 30.0, 3.0, &model());
        assert!(!drafts.is_empty());
        assert!(drafts.iter().all(|d| d.flight_lines.len() == 1));
        assert!(sink.count(DiagnosticKind::UnsplittableStrip) >= 1);
    }

    #[test]
    fn far_edge_is_covered() {
        let rules = PlannerRules::default();
        let partitioner = MissionPartitioner::new(&rules, &NullSink);
        let origin = Coordinate::new(0.0, 0.0);
        let aoi = rect_polygon(origin, 112.0, 1_000.0);
        let drafts = partitioner.partition(&aoi, 0.0, 10.0, 44.0, &model());

        let mut east_m: Vec<f64> = drafts
            .iter()
            .flat_map(|d| d.flight_lines.iter())
            .map(|line| (line.start().lon - origin.lon) * METERS_PER_DEG_AT_EQUATOR)
            .collect();
        east_m.sort_by(|a, b| a.total_cmp(b));

        assert_eq!(east_m.len(), 13, "112 m at 10 m spacing needs 13 lines");
        assert!(east_m[0] < 1.0, "west edge gap {:.2} m", east_m[0]);
        let east_gap = 112.0 - east_m[east_m.len() - 1];
        assert!(east_gap < 1.0, "east edge gap {east_gap:.2} m");
        for pair in east_m.windows(2) {
            assert!(pair[1] - pair[0] <= 10.0 + 1e-6, "lines {:.2} m apart", pair[1] - pair[0]);
        }
    }

    /// Two 50 m bars joined by a 1 m wide corridor; heading 0 lines over the
    /// corridor miss it between samples.
    fn twin_bars(origin: Coordinate) -> Polygon {
        let ring = vec![
            at(origin, 0.0, 0.0),
            at(origin, 50.0, 0.0),
            at(origin, 50.0, 1.2),
            at(origin, 250.0, 1.2),
            at(origin, 250.0, 0.0),
            at(origin, 300.0, 0.0),
            at(origin, 300.0, 500.0),
            at(origin, 250.0, 500.0),
            at(origin, 250.0, 2.2),
            at(origin, 50.0, 2.2),
            at(origin, 50.0, 500.0),
            at(origin, 0.0, 500.0),
        ];
        Polygon::new(ring, Vec::new()).unwrap()
    }

    #[test]
    fn strips_without_interior_are_skipped() {
        let mut rules = PlannerRules::default();
        rules.coverage_sample_divisor = 0.0;
        let sink = CollectingSink::new();
        let partitioner = MissionPartitioner::new(&rules, &sink);
        let aoi = twin_bars(Coordinate::new(0.0, 0.0));
        // One 500 m line (2.2 min) per strip.
        let drafts = partitioner.partition(&aoi, 0.0, 20.0, 2.5, &model());

        assert_eq!(drafts.len(), 6, "three lines per bar");
        assert_eq!(sink.count(DiagnosticKind::StripSkipped), 10);
        assert_eq!(sink.count(DiagnosticKind::FallbackMission), 0);
        for draft in &drafts {
            assert_eq!(draft.flight_lines.len(), 1);
            for point in &draft.flight_lines[0].coordinates {
                assert!(aoi.contains(*point));
            }
        }
    }

    #[test]
    fn thin_aoi_falls_back_to_dense_whole_area_mission() {
        let mut rules = PlannerRules::default();
        rules.coverage_sample_divisor = 0.0;
        let sink = CollectingSink::new();
        let partitioner = MissionPartitioner::new(&rules, &sink);
        // Lines run 2 m north-south; strip samples land only on the padding.
        let aoi = rect_polygon(Coordinate::new(0.0, 0.0), 200.0, 2.0);
        let drafts = partitioner.partition(&aoi, 0.0, 20.0, 60.0, &model());

        assert_eq!(sink.count(DiagnosticKind::StripSkipped), 1);
        assert_eq!(sink.count(DiagnosticKind::FallbackMission), 1);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].flight_lines.len(), 11);
        for line in &drafts[0].flight_lines {
            for point in &line.coordinates {
                assert!(aoi.contains(*point));
            }
        }
    }

    #[test]
    fn strip_cap_stops_partitioning() {
        let mut rules = PlannerRules::default();
        rules.max_strips = 2;
        let sink = CollectingSink::new();
        let partitioner = MissionPartitioner::new(&rules, &sink);
        let aoi = rect_polygon(Coordinate::new(45.0, 7.0), 600.0, 800.0);
        // 800 m lines take 3.2 min, so five fit in 18 min.
        let drafts = partitioner.partition(&aoi, 0.0, 15.0, 18.0, &model());

        let lines: usize = drafts.iter().map(|d| d.flight_lines.len()).sum();
        assert_eq!(drafts.len(), 2);
        assert_eq!(lines, 10);
        assert_eq!(sink.count(DiagnosticKind::StripCapReached), 1);
    }

    #[test]
    fn mission_count_is_capped_after_merging() {
        let mut rules = PlannerRules::default();
        rules.max_missions = 2;
        let sink = CollectingSink::new();
        let partitioner = MissionPartitioner::new(&rules, &sink);
        let aoi = rect_polygon(Coordinate::new(45.0, 7.0), 600.0, 800.0);
        let drafts = partitioner.partition(&aoi, 0.0, 15.0, 18.0, &model());

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[1].id, 1);
        assert_eq!(sink.count(DiagnosticKind::MissionCapReached), 1);
        assert_eq!(sink.count(DiagnosticKind::StripCapReached), 0);
    }

    #[test]
    fn over_budget_draft_is_split_in_order() {
        let rules = PlannerRules::default();
        let sink = CollectingSink::new();
        let partitioner = MissionPartitioner::new(&rules, &sink);
        let time = model();
        let origin = Coordinate::new(30.0, 30.0);
        let lines: Vec<Vec<Coordinate>> = (0..4)
            .map(|i| {
                let start = at(origin, i as f64 * 20.0, 0.0);
                vec![start, destination(start, 0.0, 1_000.0)]
            })
            .collect();
        let draft = build_draft(lines, &time);
        assert!(draft.estimated_time_min > 8.0);

        let pieces = partitioner.split_over_budget(vec![draft], 8.0, &time);
        assert_eq!(pieces.len(), 2);
        for piece in &pieces {
            assert_eq!(piece.flight_lines.len(), 2);
            assert!(piece.estimated_time_min <= 8.0);
        }
        assert!(pieces[0].flight_lines[1].start().lon < pieces[1].flight_lines[0].start().lon);
        assert_eq!(sink.count(DiagnosticKind::MissionSplit), 1);
    }
}
