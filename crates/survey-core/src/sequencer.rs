//! Flight line ordering and turn synthesis inside one mission.

use crate::models::{ConnectorKind, Coordinate, FlightLine, Mission, PathSegment, Polygon};
use crate::partition::MissionDraft;
use crate::rules::PlannerRules;
use crate::spatial::{self, distance, heading_delta, initial_bearing, lerp, turn_radius};

/// One directed visit of a flight line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineVisit {
    pub line_index: usize,
    pub reversed: bool,
}

impl LineVisit {
    pub const fn new(line_index: usize, reversed: bool) -> Self {
        Self {
            line_index,
            reversed,
        }
    }

    pub fn flipped(self) -> Self {
        Self::new(self.line_index, !self.reversed)
    }
}

/// Visits in path order, read back from a mission's line segments.
pub fn visits(mission: &Mission) -> Vec<LineVisit> {
    mission
        .path
        .iter()
        .filter_map(|segment| match segment {
            PathSegment::Line {
                line_index,
                reversed,
                ..
            } => Some(LineVisit::new(*line_index, *reversed)),
            PathSegment::Connector { .. } => None,
        })
        .collect()
}

pub struct PathSequencer<'a> {
    rules: &'a PlannerRules,
    aoi: &'a Polygon,
    turn_radius_m: f64,
}

impl<'a> PathSequencer<'a> {
    pub fn new(rules: &'a PlannerRules, aoi: &'a Polygon, speed_mps: f64) -> Self {
        Self {
            rules,
            aoi,
            turn_radius_m: turn_radius(speed_mps, rules.bank_angle_deg),
        }
    }

    pub fn turn_radius_m(&self) -> f64 {
        self.turn_radius_m
    }

    /// Sequence a partitioned mission into a flyable path.
    pub fn sequence(&self, draft: MissionDraft) -> Mission {
        let order = self.order(&draft.flight_lines);
        let mission = Mission {
            id: draft.id,
            sequence: draft.id,
            flight_lines: draft.flight_lines,
            path: Vec::new(),
            estimated_time_min: draft.estimated_time_min,
            photo_count: draft.photo_count,
            path_length_m: 0.0,
            coverage_polygon: draft.coverage_polygon,
            start_point: Coordinate::new(0.0, 0.0),
            end_point: Coordinate::new(0.0, 0.0),
        };
        self.with_order(mission, &order)
    }

    /// Rebuild `mission`'s path for the given visit order.
    pub fn with_order(&self, mut mission: Mission, order: &[LineVisit]) -> Mission {
        mission.path = self.build_path(&mission.flight_lines, order);
        mission.path_length_m = mission
            .path
            .iter()
            .map(|segment| spatial::path_length(segment.coordinates()))
            .sum();
        let first = mission.path.first().and_then(|s| s.coordinates().first());
        let last = mission.path.last().and_then(|s| s.coordinates().last());
        if let (Some(first), Some(last)) = (first, last) {
            mission.start_point = *first;
            mission.end_point = *last;
        }
        mission
    }

    /// Nearest-neighbour visit order.
    ///
    /// Small missions try every line and direction as the start and keep the
    /// shortest total transition length. Larger ones only try both ends of the
    /// first and last lines.
    pub fn order(&self, lines: &[FlightLine]) -> Vec<LineVisit> {
        let n = lines.len();
        if n == 0 {
            return Vec::new();
        }
        let starts: Vec<usize> = if n <= self.rules.exhaustive_start_limit {
            (0..n).collect()
        } else if n == 1 {
            vec![0]
        } else {
            vec![0, n - 1]
        };

        let mut best: Option<(f64, Vec<LineVisit>)> = None;
        for start in starts {
            for reversed in [false, true] {
                let (cost, order) = nearest_neighbour(lines, LineVisit::new(start, reversed));
                if best.as_ref().map_or(true, |(best_cost, _)| cost < *best_cost) {
                    best = Some((cost, order));
                }
            }
        }
        best.map(|(_, order)| order).unwrap_or_default()
    }

    /// Line segments for each visit with connectors between close neighbours.
    pub fn build_path(&self, lines: &[FlightLine], order: &[LineVisit]) -> Vec<PathSegment> {
        let gaps: Vec<f64> = order
            .windows(2)
            .map(|pair| {
                distance(
                    lines[pair[0].line_index].exit(pair[0].reversed),
                    lines[pair[1].line_index].entry(pair[1].reversed),
                )
            })
            .collect();
        let average_gap = if gaps.is_empty() {
            0.0
        } else {
            gaps.iter().sum::<f64>() / gaps.len() as f64
        };
        let gap_cap =
            (self.rules.connector_gap_factor * average_gap).max(self.rules.min_connector_gap_m);

        let mut path = Vec::with_capacity(order.len() * 2);
        for (position, visit) in order.iter().enumerate() {
            let line = &lines[visit.line_index];
            if position > 0 {
                let previous = order[position - 1];
                let gap = gaps[position - 1];
                if gap <= gap_cap {
                    path.push(self.connector(&lines[previous.line_index], previous, line, *visit));
                }
            }
            path.push(PathSegment::Line {
                line_index: visit.line_index,
                reversed: visit.reversed,
                coordinates: line.traversal(visit.reversed),
            });
        }
        path
    }

    fn connector(
        &self,
        from: &FlightLine,
        from_visit: LineVisit,
        to: &FlightLine,
        to_visit: LineVisit,
    ) -> PathSegment {
        let exit = from.exit(from_visit.reversed);
        let entry = to.entry(to_visit.reversed);
        let heading_out = from.heading(from_visit.reversed);
        let delta = heading_delta(heading_out, to.heading(to_visit.reversed));

        if delta.abs() < self.rules.straight_turn_threshold_deg {
            PathSegment::Connector {
                kind: ConnectorKind::Straight,
                coordinates: vec![exit, entry],
            }
        } else if delta.abs() > self.rules.uturn_threshold_deg {
            PathSegment::Connector {
                kind: ConnectorKind::UTurn,
                coordinates: self.u_turn(exit, heading_out, entry),
            }
        } else {
            PathSegment::Connector {
                kind: ConnectorKind::Curve,
                coordinates: self.curve(exit, entry, delta),
            }
        }
    }

    /// Semicircle leaving `exit` on `heading`, then straight onto `entry`.
    fn u_turn(&self, exit: Coordinate, heading: f64, entry: Coordinate) -> Vec<Coordinate> {
        let r = self.turn_radius_m;
        let right_center = spatial::destination(exit, heading + 90.0, r);
        let left_center = spatial::destination(exit, heading - 90.0, r);
        let right_end = spatial::destination(exit, heading + 90.0, 2.0 * r);
        let left_end = spatial::destination(exit, heading - 90.0, 2.0 * r);

        let right_inside = self.aoi.contains(right_center);
        let left_inside = self.aoi.contains(left_center);
        let turn_right = if right_inside != left_inside {
            right_inside
        } else {
            distance(right_end, entry) <= distance(left_end, entry)
        };

        let samples = self.rules.arc_samples.max(2);
        let (center, start_angle, sweep) = if turn_right {
            (right_center, heading - 90.0, 180.0)
        } else {
            (left_center, heading + 90.0, -180.0)
        };

        let mut coordinates = vec![exit];
        for k in 1..=samples {
            let angle = start_angle + sweep * k as f64 / samples as f64;
            let point = spatial::destination(center, angle, r);
            if self.aoi.contains(point) {
                coordinates.push(point);
            }
        }
        coordinates.push(entry);
        coordinates
    }

    /// Three-point connector bulging away from the turn.
    fn curve(&self, exit: Coordinate, entry: Coordinate, delta: f64) -> Vec<Coordinate> {
        let gap = distance(exit, entry);
        let chord = initial_bearing(exit, entry);
        let side = if delta > 0.0 { -90.0 } else { 90.0 };
        let amplitude = (0.2 * gap).min(self.rules.curve_offset_fraction * self.turn_radius_m);

        let mut coordinates = vec![exit];
        for t in [0.25, 0.5, 0.75] {
            let base = lerp(exit, entry, t);
            let offset = amplitude * (std::f64::consts::PI * t).sin();
            let curved = spatial::destination(base, chord + side, offset);
            coordinates.push(if self.aoi.contains(curved) { curved } else { base });
        }
        coordinates.push(entry);
        coordinates
    }
}

/// Greedy tour from `start`; returns (sum of transition distances, order).
fn nearest_neighbour(lines: &[FlightLine], start: LineVisit) -> (f64, Vec<LineVisit>) {
    let mut visited = vec![false; lines.len()];
    visited[start.line_index] = true;
    let mut order = Vec::with_capacity(lines.len());
    order.push(start);
    let mut cursor = lines[start.line_index].exit(start.reversed);
    let mut cost = 0.0;

    while order.len() < lines.len() {
        let mut best: Option<(f64, LineVisit)> = None;
        for (index, line) in lines.iter().enumerate() {
            if visited[index] {
                continue;
            }
            for reversed in [false, true] {
                let d = distance(cursor, line.entry(reversed));
                if best.map_or(true, |(best_d, _)| d < best_d) {
                    best = Some((d, LineVisit::new(index, reversed)));
                }
            }
        }
        let Some((d, next)) = best else {
            break;
        };
        visited[next.line_index] = true;
        cost += d;
        cursor = lines[next.line_index].exit(next.reversed);
        order.push(next);
    }
    (cost, order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::destination;

    fn parallel_lines(count: usize, spacing_m: f64, length_m: f64) -> Vec<FlightLine> {
        let origin = Coordinate::new(47.0, 8.0);
        (0..count)
            .map(|i| {
                let start = destination(origin, 90.0, spacing_m * i as f64);
                let end = destination(start, 0.0, length_m);
                FlightLine::new(0, i, vec![start, end])
            })
            .collect()
    }

    fn square_aoi() -> Polygon {
        let sw = destination(Coordinate::new(47.0, 8.0), 225.0, 200.0);
        let ne = destination(Coordinate::new(47.0, 8.0), 45.0, 1_600.0);
        Polygon::new(
            vec![
                sw,
                Coordinate::new(sw.lat, ne.lon),
                ne,
                Coordinate::new(ne.lat, sw.lon),
            ],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn order_is_serpentine_for_parallel_lines() {
        let rules = PlannerRules::default();
        let aoi = square_aoi();
        let sequencer = PathSequencer::new(&rules, &aoi, 10.0);
        let lines = parallel_lines(6, 30.0, 500.0);
        let order = sequencer.order(&lines);

        assert_eq!(order.len(), 6);
        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            assert_eq!(a.line_index.abs_diff(b.line_index), 1, "{order:?}");
            assert_ne!(a.reversed, b.reversed, "{order:?}");
        }
    }

    #[test]
    fn serpentine_uses_u_turns() {
        let rules = PlannerRules::default();
        let aoi = square_aoi();
        let sequencer = PathSequencer::new(&rules, &aoi, 10.0);
        let lines = parallel_lines(4, 30.0, 500.0);
        let order = sequencer.order(&lines);
        let path = sequencer.build_path(&lines, &order);

        let connectors: Vec<&PathSegment> = path.iter().filter(|s| !s.is_line()).collect();
        assert_eq!(connectors.len(), 3);
        for connector in connectors {
            match connector {
                PathSegment::Connector { kind, coordinates } => {
                    assert_eq!(*kind, ConnectorKind::UTurn);
                    assert!(coordinates.len() >= 2);
                    for point in coordinates {
                        assert!(aoi.contains(*point));
                    }
                }
                PathSegment::Line { .. } => unreachable!(),
            }
        }
    }

    #[test]
    fn distant_lines_are_left_unconnected() {
        let rules = PlannerRules::default();
        let aoi = square_aoi();
        let sequencer = PathSequencer::new(&rules, &aoi, 10.0);
        let mut lines = parallel_lines(6, 20.0, 300.0);
        let far_start = destination(lines[5].start(), 90.0, 900.0);
        lines.push(FlightLine::new(0, 6, vec![far_start, destination(far_start, 0.0, 300.0)]));

        let order = sequencer.order(&lines);
        let path = sequencer.build_path(&lines, &order);
        let line_segments = path.iter().filter(|s| s.is_line()).count();
        let connectors = path.len() - line_segments;
        // Five 20 m hops plus one 900 m hop: cap is 3 * 1000 / 6 = 500 m.
        assert_eq!(line_segments, 7);
        assert_eq!(connectors, 5);
    }

    #[test]
    fn straight_connector_joins_collinear_runs() {
        let rules = PlannerRules::default();
        let aoi = square_aoi();
        let sequencer = PathSequencer::new(&rules, &aoi, 10.0);
        let origin = Coordinate::new(47.0, 8.0);
        let gap_start = destination(origin, 0.0, 200.0);
        let second_start = destination(gap_start, 0.0, 30.0);
        let lines = vec![
            FlightLine::new(0, 0, vec![origin, gap_start]),
            FlightLine::new(0, 1, vec![second_start, destination(second_start, 0.0, 200.0)]),
        ];
        let order = sequencer.order(&lines);
        let path = sequencer.build_path(&lines, &order);
        assert_eq!(path.len(), 3);
        assert!(matches!(
            path[1],
            PathSegment::Connector {
                kind: ConnectorKind::Straight,
                ..
            }
        ));
    }

    #[test]
    fn mission_endpoints_follow_path() {
        let rules = PlannerRules::default();
        let aoi = square_aoi();
        let sequencer = PathSequencer::new(&rules, &aoi, 10.0);
        let lines = parallel_lines(3, 25.0, 400.0);
        let draft = MissionDraft {
            id: 4,
            flight_lines: lines,
            estimated_time_min: 5.0,
            photo_count: 60,
            coverage_polygon: Vec::new(),
        };
        let mission = sequencer.sequence(draft);
        let waypoints = mission.waypoints();
        assert_eq!(mission.start_point, waypoints[0]);
        assert_eq!(mission.end_point, *waypoints.last().unwrap());
        assert!(mission.path_length_m > 1_200.0);
        assert_eq!(visits(&mission).len(), 3);
    }

    /// Point `east_m`, `north_m` from (47, 8).
    fn at(east_m: f64, north_m: f64) -> Coordinate {
        destination(destination(Coordinate::new(47.0, 8.0), 90.0, east_m), 0.0, north_m)
    }

    fn rect_aoi(west_m: f64, south_m: f64, east_m: f64, north_m: f64) -> Polygon {
        Polygon::new(
            vec![
                at(west_m, south_m),
                at(east_m, south_m),
                at(east_m, north_m),
                at(west_m, north_m),
            ],
            Vec::new(),
        )
        .unwrap()
    }

    /// Connector between two lines flown in their stored direction.
    fn single_connector(
        sequencer: &PathSequencer,
        lines: &[FlightLine],
    ) -> (ConnectorKind, Vec<Coordinate>) {
        let order = [LineVisit::new(0, false), LineVisit::new(1, false)];
        match sequencer.build_path(lines, &order).remove(1) {
            PathSegment::Connector { kind, coordinates } => (kind, coordinates),
            other => panic!("expected a connector, got {other:?}"),
        }
    }

    /// North-bound line ending at the origin, then an east-bound line 30 m
    /// north-east of it.
    fn quarter_turn_lines() -> Vec<FlightLine> {
        vec![
            FlightLine::new(0, 0, vec![at(0.0, -100.0), at(0.0, 0.0)]),
            FlightLine::new(0, 1, vec![at(30.0, 30.0), at(230.0, 30.0)]),
        ]
    }

    #[test]
    fn curve_offset_is_capped_by_turn_radius() {
        let rules = PlannerRules::default();
        let aoi = square_aoi();
        let sequencer = PathSequencer::new(&rules, &aoi, 10.0);
        let lines = quarter_turn_lines();
        let (kind, coordinates) = single_connector(&sequencer, &lines);

        assert_eq!(kind, ConnectorKind::Curve);
        assert_eq!(coordinates.len(), 5);
        let (exit, entry) = (coordinates[0], coordinates[4]);
        // 0.2 * 42.4 m gap is wider than 0.3 * 26.2 m radius, so the radius wins.
        let cap = rules.curve_offset_fraction * sequencer.turn_radius_m();
        assert!(cap < 0.2 * distance(exit, entry));
        let offset = distance(coordinates[2], lerp(exit, entry, 0.5));
        assert!((offset - cap).abs() < 0.01, "offset {offset:.3} m, cap {cap:.3} m");
        for point in &coordinates {
            assert!(aoi.contains(*point));
        }
    }

    #[test]
    fn curve_falls_back_to_chord_outside_aoi() {
        let rules = PlannerRules::default();
        // North-west edge runs 2 m above the chord, so every bulge leaves the AOI.
        let aoi = Polygon::new(
            vec![at(-20.0, -250.0), at(300.0, -250.0), at(300.0, 302.0), at(-20.0, -18.0)],
            Vec::new(),
        )
        .unwrap();
        let sequencer = PathSequencer::new(&rules, &aoi, 10.0);
        let lines = quarter_turn_lines();
        let (kind, coordinates) = single_connector(&sequencer, &lines);

        assert_eq!(kind, ConnectorKind::Curve);
        let (exit, entry) = (coordinates[0], coordinates[4]);
        for (point, t) in coordinates[1..4].iter().zip([0.25, 0.5, 0.75]) {
            assert_eq!(*point, lerp(exit, entry, t));
        }
    }

    /// North-bound line ending at the origin, then a south-bound line 30 m west.
    fn reversal_lines() -> Vec<FlightLine> {
        vec![
            FlightLine::new(0, 0, vec![at(0.0, -200.0), at(0.0, 0.0)]),
            FlightLine::new(0, 1, vec![at(-30.0, 0.0), at(-30.0, -200.0)]),
        ]
    }

    #[test]
    fn u_turn_takes_the_side_whose_center_is_inside() {
        let rules = PlannerRules::default();
        // Left centre lies west of the AOI even though the left end is nearer the entry.
        let aoi = rect_aoi(-5.0, -250.0, 100.0, 100.0);
        let sequencer = PathSequencer::new(&rules, &aoi, 10.0);
        let lines = reversal_lines();
        let (kind, coordinates) = single_connector(&sequencer, &lines);

        assert_eq!(kind, ConnectorKind::UTurn);
        assert_eq!(coordinates.len(), rules.arc_samples + 2);
        let exit = coordinates[0];
        for point in &coordinates[1..coordinates.len() - 1] {
            assert!(point.lon >= exit.lon, "arc swings west: {point:?}");
            assert!(aoi.contains(*point));
        }
    }

    #[test]
    fn u_turn_drops_arc_points_outside_aoi() {
        let rules = PlannerRules::default();
        // North edge 5 m past the exit clips all but the last arc point.
        let aoi = rect_aoi(-100.0, -250.0, 100.0, 5.0);
        let sequencer = PathSequencer::new(&rules, &aoi, 10.0);
        let lines = reversal_lines();
        let (kind, coordinates) = single_connector(&sequencer, &lines);

        assert_eq!(kind, ConnectorKind::UTurn);
        assert_eq!(coordinates.len(), 3, "{coordinates:?}");
        for point in &coordinates {
            assert!(aoi.contains(*point));
        }
        let arc_end = coordinates[1];
        let expected = at(-2.0 * sequencer.turn_radius_m(), 0.0);
        assert!(distance(arc_end, expected) < 0.5);
    }
}
