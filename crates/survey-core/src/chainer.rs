//! Inter-mission ordering that minimises repositioning distance.

use rayon::prelude::*;

use crate::models::{Coordinate, Mission};
use crate::sequencer::{visits, LineVisit, PathSequencer};
use crate::spatial::distance;

/// How a sequenced mission is re-oriented before flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// As sequenced
    Forward,
    /// Same line order, every line flown the other way
    Flipped,
    /// Path flown backwards
    Reversed,
    /// Line order reversed, line directions kept
    ReversedFlipped,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Forward,
        Orientation::Flipped,
        Orientation::Reversed,
        Orientation::ReversedFlipped,
    ];

    pub fn apply(self, order: &[LineVisit]) -> Vec<LineVisit> {
        match self {
            Orientation::Forward => order.to_vec(),
            Orientation::Flipped => order.iter().map(|v| v.flipped()).collect(),
            Orientation::Reversed => order.iter().rev().map(|v| v.flipped()).collect(),
            Orientation::ReversedFlipped => order.iter().rev().copied().collect(),
        }
    }
}

/// Entry and exit points of one mission for each orientation.
#[derive(Debug, Clone, Copy)]
struct Endpoints {
    entry: [Coordinate; 4],
    exit: [Coordinate; 4],
}

impl Endpoints {
    fn of(mission: &Mission, order: &[LineVisit]) -> Option<Self> {
        let first = order.first()?;
        let last = order.last()?;
        let first_line = mission.flight_lines.get(first.line_index)?;
        let last_line = mission.flight_lines.get(last.line_index)?;

        let head_in = first_line.entry(first.reversed);
        let head_out = first_line.exit(first.reversed);
        let tail_in = last_line.entry(last.reversed);
        let tail_out = last_line.exit(last.reversed);
        Some(Self {
            entry: [head_in, head_out, tail_out, tail_in],
            exit: [tail_out, tail_in, head_in, head_out],
        })
    }
}

/// Cheapest move from mission `i` to mission `j`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub exit_orientation: Orientation,
    pub entry_orientation: Orientation,
    pub exit_point: Coordinate,
    pub entry_point: Coordinate,
    pub distance_m: f64,
}

pub struct MissionChainer<'a> {
    sequencer: &'a PathSequencer<'a>,
}

/// Result of chaining: missions in flight order plus total transit.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainedMissions {
    pub missions: Vec<Mission>,
    pub transit_distance_m: f64,
}

impl<'a> MissionChainer<'a> {
    pub fn new(sequencer: &'a PathSequencer<'a>) -> Self {
        Self { sequencer }
    }

    /// Reorder and re-orient `missions` to shorten transits between them.
    pub fn chain(&self, missions: Vec<Mission>) -> ChainedMissions {
        let orders: Vec<Vec<LineVisit>> = missions.iter().map(visits).collect();
        let endpoints: Vec<Option<Endpoints>> = missions
            .iter()
            .zip(&orders)
            .map(|(mission, order)| Endpoints::of(mission, order))
            .collect();

        let n = missions.len();
        if n < 2 || endpoints.iter().any(Option::is_none) {
            let mut missions = missions;
            for (sequence, mission) in missions.iter_mut().enumerate() {
                mission.sequence = sequence;
            }
            return ChainedMissions {
                missions,
                transit_distance_m: 0.0,
            };
        }
        let endpoints: Vec<Endpoints> = endpoints.into_iter().flatten().collect();
        let matrix = cost_matrix(&endpoints);
        let tour = best_tour(&matrix);

        // The first mission leaves toward the second as the matrix says. Each later
        // mission takes the entry nearest to where its predecessor actually ends.
        let mut chosen = vec![Orientation::Forward; n];
        let first = tour[0];
        let first_orientation =
            matrix[first][tour[1]].map_or(Orientation::Forward, |t| t.exit_orientation);
        chosen[first] = first_orientation;
        let mut cursor = endpoints[first].exit[first_orientation as usize];
        for &mission in &tour[1..] {
            let mut best = (f64::INFINITY, 0usize);
            for (k, entry) in endpoints[mission].entry.iter().enumerate() {
                let d = distance(cursor, *entry);
                if d < best.0 {
                    best = (d, k);
                }
            }
            chosen[mission] = Orientation::ALL[best.1];
            cursor = endpoints[mission].exit[best.1];
        }

        let mut slots: Vec<Option<Mission>> = missions.into_iter().map(Some).collect();
        let mut ordered = Vec::with_capacity(n);
        for (sequence, &index) in tour.iter().enumerate() {
            let Some(mission) = slots[index].take() else {
                continue;
            };
            let order = chosen[index].apply(&orders[index]);
            let mut mission = self.sequencer.with_order(mission, &order);
            mission.sequence = sequence;
            ordered.push(mission);
        }

        let transit_distance_m = ordered
            .windows(2)
            .map(|pair| distance(pair[0].end_point, pair[1].start_point))
            .sum();
        ChainedMissions {
            missions: ordered,
            transit_distance_m,
        }
    }
}

/// Best transition for every ordered pair, rows computed in parallel.
fn cost_matrix(endpoints: &[Endpoints]) -> Vec<Vec<Option<Transition>>> {
    (0..endpoints.len())
        .into_par_iter()
        .map(|i| {
            (0..endpoints.len())
                .map(|j| (i != j).then(|| best_transition(&endpoints[i], &endpoints[j])))
                .collect()
        })
        .collect()
}

fn best_transition(from: &Endpoints, to: &Endpoints) -> Transition {
    let mut best: Option<Transition> = None;
    for (a, exit_orientation) in Orientation::ALL.into_iter().enumerate() {
        for (b, entry_orientation) in Orientation::ALL.into_iter().enumerate() {
            let distance_m = distance(from.exit[a], to.entry[b]);
            if best.map_or(true, |t| distance_m < t.distance_m) {
                best = Some(Transition {
                    exit_orientation,
                    entry_orientation,
                    exit_point: from.exit[a],
                    entry_point: to.entry[b],
                    distance_m,
                });
            }
        }
    }
    // Both loops run at least once.
    best.unwrap_or(Transition {
        exit_orientation: Orientation::Forward,
        entry_orientation: Orientation::Forward,
        exit_point: from.exit[0],
        entry_point: to.entry[0],
        distance_m: distance(from.exit[0], to.entry[0]),
    })
}

/// Multi-start nearest-neighbour tour; ties go to the lower index.
fn best_tour(matrix: &[Vec<Option<Transition>>]) -> Vec<usize> {
    let n = matrix.len();
    let cost = |i: usize, j: usize| matrix[i][j].map_or(f64::INFINITY, |t| t.distance_m);

    let mut best: Option<(f64, Vec<usize>)> = None;
    for start in 0..n {
        let mut visited = vec![false; n];
        visited[start] = true;
        let mut tour = vec![start];
        let mut total = 0.0;
        while tour.len() < n {
            let current = tour[tour.len() - 1];
            let mut next: Option<(f64, usize)> = None;
            for candidate in 0..n {
                if visited[candidate] {
                    continue;
                }
                let d = cost(current, candidate);
                if next.map_or(true, |(best_d, _)| d < best_d) {
                    next = Some((d, candidate));
                }
            }
            let Some((d, candidate)) = next else {
                break;
            };
            visited[candidate] = true;
            total += d;
            tour.push(candidate);
        }
        if best.as_ref().map_or(true, |(best_total, _)| total < *best_total) {
            best = Some((total, tour));
        }
    }
    best.map(|(_, tour)| tour).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlightLine, Polygon};
    use crate::partition::MissionDraft;
    use crate::rules::PlannerRules;
    use crate::spatial::destination;

    fn draft(id: usize, lines: Vec<FlightLine>) -> MissionDraft {
        MissionDraft {
            id,
            flight_lines: lines,
            estimated_time_min: 5.0,
            photo_count: 10,
            coverage_polygon: Vec::new(),
        }
    }

    fn big_aoi() -> Polygon {
        let sw = Coordinate::new(46.9, 7.9);
        let ne = Coordinate::new(47.2, 8.2);
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
    fn orientations_cover_all_corners() {
        let order = vec![LineVisit::new(0, false), LineVisit::new(1, true)];
        assert_eq!(
            Orientation::Reversed.apply(&order),
            vec![LineVisit::new(1, false), LineVisit::new(0, true)]
        );
        assert_eq!(
            Orientation::ReversedFlipped.apply(&order),
            vec![LineVisit::new(1, true), LineVisit::new(0, false)]
        );
        assert_eq!(
            Orientation::Flipped.apply(&order),
            vec![LineVisit::new(0, true), LineVisit::new(1, false)]
        );
    }

    #[test]
    fn chooses_short_transition_orientation() {
        let rules = PlannerRules::default();
        let aoi = big_aoi();
        let sequencer = PathSequencer::new(&rules, &aoi, 10.0);

        // Mission A runs north from the origin; mission B starts 5 km north of
        // A's far end and runs back south toward it, ending 5 m from A's end.
        let origin = Coordinate::new(47.0, 8.0);
        let a_end = destination(origin, 0.0, 1_000.0);
        let b_near = destination(a_end, 90.0, 5.0);
        let b_far = destination(b_near, 0.0, 5_000.0);
        let mission_a = sequencer.sequence(draft(0, vec![FlightLine::new(0, 0, vec![origin, a_end])]));
        let mission_b = sequencer.sequence(draft(1, vec![FlightLine::new(1, 0, vec![b_far, b_near])]));

        let chained = MissionChainer::new(&sequencer).chain(vec![mission_a, mission_b]);
        assert_eq!(chained.missions.len(), 2);
        assert!(
            (chained.transit_distance_m - 5.0).abs() < 0.01,
            "transit {:.2} m",
            chained.transit_distance_m
        );
        for (sequence, mission) in chained.missions.iter().enumerate() {
            assert_eq!(mission.sequence, sequence);
        }
    }

    #[test]
    fn tour_visits_nearest_missions_first() {
        let rules = PlannerRules::default();
        let aoi = big_aoi();
        let sequencer = PathSequencer::new(&rules, &aoi, 10.0);
        let origin = Coordinate::new(47.0, 8.0);
        let missions: Vec<Mission> = [0.0, 3_000.0, 1_000.0, 2_000.0]
            .iter()
            .enumerate()
            .map(|(id, offset)| {
                let start = destination(origin, 90.0, *offset);
                let end = destination(start, 0.0, 400.0);
                sequencer.sequence(draft(id, vec![FlightLine::new(id, 0, vec![start, end])]))
            })
            .collect();

        let chained = MissionChainer::new(&sequencer).chain(missions);
        let ids: Vec<usize> = chained.missions.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![0, 2, 3, 1]);
        // Three hops of 1 km each.
        assert!((chained.transit_distance_m - 3_000.0).abs() < 1.0);
    }

    #[test]
    fn single_mission_is_left_alone() {
        let rules = PlannerRules::default();
        let aoi = big_aoi();
        let sequencer = PathSequencer::new(&rules, &aoi, 10.0);
        let origin = Coordinate::new(47.0, 8.0);
        let mission = sequencer.sequence(draft(
            0,
            vec![FlightLine::new(0, 0, vec![origin, destination(origin, 0.0, 300.0)])],
        ));
        let chained = MissionChainer::new(&sequencer).chain(vec![mission.clone()]);
        assert_eq!(chained.missions, vec![mission]);
        assert_eq!(chained.transit_distance_m, 0.0);
    }
}
