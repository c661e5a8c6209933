//! Core data models for survey planning.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::spatial;

/// WGS84 position in decimal degrees. Altitude is implied by the plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.north + self.south) / 2.0,
            (self.east + self.west) / 2.0,
        )
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lon >= self.west
            && point.lon <= self.east
    }
}

/// Area of interest: outer ring followed by zero or more hole rings.
///
/// Rings may be explicitly closed (first == last) or implicitly closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Polygon {
    rings: Vec<Vec<Coordinate>>,
    area_m2: f64,
    bounds: Bounds,
}

impl Polygon {
    /// Build a polygon, validating the outer ring.
    pub fn new(outer: Vec<Coordinate>, holes: Vec<Vec<Coordinate>>) -> Result<Self> {
        if outer.iter().chain(holes.iter().flatten()).any(|c| !c.is_finite()) {
            return Err(PlanError::InvalidPolygon(
                "ring contains a non-finite coordinate".to_string(),
            ));
        }

        let mut distinct: Vec<Coordinate> = Vec::with_capacity(outer.len());
        for point in &outer {
            if !distinct.contains(point) {
                distinct.push(*point);
            }
        }
        if distinct.len() < 3 {
            return Err(PlanError::InvalidPolygon(format!(
                "outer ring needs at least 3 distinct vertices, got {}",
                distinct.len()
            )));
        }

        let area_m2 = spatial::polygon_area(&outer);
        if area_m2 <= f64::EPSILON {
            return Err(PlanError::InvalidPolygon(
                "outer ring encloses no area".to_string(),
            ));
        }
        let bounds = spatial::bounds(&outer);

        let mut rings = Vec::with_capacity(holes.len() + 1);
        rings.push(outer);
        rings.extend(holes.into_iter().filter(|hole| hole.len() >= 3));

        Ok(Self {
            rings,
            area_m2,
            bounds,
        })
    }

    pub fn outer(&self) -> &[Coordinate] {
        &self.rings[0]
    }

    pub fn holes(&self) -> &[Vec<Coordinate>] {
        &self.rings[1..]
    }

    pub fn rings(&self) -> &[Vec<Coordinate>] {
        &self.rings
    }

    /// Outer ring area in square meters (holes are not subtracted).
    pub fn area_m2(&self) -> f64 {
        self.area_m2
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Point-in-polygon test; points inside a hole are outside.
    pub fn contains(&self, point: Coordinate) -> bool {
        spatial::point_in_polygon(point, &self.rings)
    }

    /// Area centroid of the outer ring, falling back to the vertex mean for
    /// near-degenerate rings.
    pub fn centroid(&self) -> Coordinate {
        let ring = spatial::open_ring(self.outer());
        let mut twice_area = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..ring.len() {
            let a = ring[i];
            let b = ring[(i + 1) % ring.len()];
            let cross = a.lon * b.lat - b.lon * a.lat;
            twice_area += cross;
            cx += (a.lon + b.lon) * cross;
            cy += (a.lat + b.lat) * cross;
        }
        if twice_area.abs() < 1e-18 {
            let n = ring.len() as f64;
            let lat = ring.iter().map(|c| c.lat).sum::<f64>() / n;
            let lon = ring.iter().map(|c| c.lon).sum::<f64>() / n;
            return Coordinate::new(lat, lon);
        }
        Coordinate::new(cy / (3.0 * twice_area), cx / (3.0 * twice_area))
    }
}

/// One parallel photographic pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightLine {
    /// Owning mission id
    pub mission_id: usize,
    /// Position within the mission's generation order
    pub index: usize,
    pub coordinates: Vec<Coordinate>,
    pub length_m: f64,
    /// Heading from first to last coordinate (degrees, [0, 360))
    pub heading_deg: f64,
}

impl FlightLine {
    pub fn new(mission_id: usize, index: usize, coordinates: Vec<Coordinate>) -> Self {
        let length_m = spatial::path_length(&coordinates);
        let heading_deg = match (coordinates.first(), coordinates.last()) {
            (Some(first), Some(last)) if coordinates.len() > 1 => {
                spatial::initial_bearing(*first, *last)
            }
            _ => 0.0,
        };
        Self {
            mission_id,
            index,
            coordinates,
            length_m,
            heading_deg,
        }
    }

    pub fn start(&self) -> Coordinate {
        self.coordinates[0]
    }

    pub fn end(&self) -> Coordinate {
        self.coordinates[self.coordinates.len() - 1]
    }

    /// Entry point when flown in the given direction.
    pub fn entry(&self, reversed: bool) -> Coordinate {
        if reversed {
            self.end()
        } else {
            self.start()
        }
    }

    /// Exit point when flown in the given direction.
    pub fn exit(&self, reversed: bool) -> Coordinate {
        if reversed {
            self.start()
        } else {
            self.end()
        }
    }

    /// Heading flown when traversed in the given direction.
    pub fn heading(&self, reversed: bool) -> f64 {
        if reversed {
            spatial::normalize_bearing(self.heading_deg + 180.0)
        } else {
            self.heading_deg
        }
    }

    /// Coordinates in traversal order.
    pub fn traversal(&self, reversed: bool) -> Vec<Coordinate> {
        if reversed {
            self.coordinates.iter().rev().copied().collect()
        } else {
            self.coordinates.clone()
        }
    }
}

/// Shape of the transition between two flight lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    /// Nearly aligned lines, joined directly
    Straight,
    /// Moderate heading change, joined with a shallow curve
    Curve,
    /// Reversal, joined with a semicircular arc
    UTurn,
}

/// One piece of a mission's flyable path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PathSegment {
    /// Directed traversal of a flight line
    Line {
        line_index: usize,
        reversed: bool,
        coordinates: Vec<Coordinate>,
    },
    /// Transition geometry from the end of one line to the start of the next
    Connector {
        kind: ConnectorKind,
        coordinates: Vec<Coordinate>,
    },
}

impl PathSegment {
    pub fn coordinates(&self) -> &[Coordinate] {
        match self {
            PathSegment::Line { coordinates, .. } => coordinates,
            PathSegment::Connector { coordinates, .. } => coordinates,
        }
    }

    pub fn is_line(&self) -> bool {
        matches!(self, PathSegment::Line { .. })
    }
}

/// A battery-bounded survey flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    /// Identity assigned by the partitioner
    pub id: usize,
    /// Position in flight-execution order
    pub sequence: usize,
    /// Flight lines in generation order
    pub flight_lines: Vec<FlightLine>,
    /// Flyable path
    pub path: Vec<PathSegment>,
    pub estimated_time_min: f64,
    pub photo_count: u64,
    pub path_length_m: f64,
    /// Approximate rectangle covered by the mission
    pub coverage_polygon: Vec<Coordinate>,
    pub start_point: Coordinate,
    pub end_point: Coordinate,
}

impl Mission {
    /// Ordered waypoints of the full path with consecutive duplicates removed.
    pub fn waypoints(&self) -> Vec<Coordinate> {
        let mut out: Vec<Coordinate> = Vec::new();
        for segment in &self.path {
            for point in segment.coordinates() {
                if out.last() != Some(point) {
                    out.push(*point);
                }
            }
        }
        out
    }

    /// Headings of the flight lines in path order, in the direction flown.
    pub fn line_headings(&self) -> Vec<f64> {
        self.path
            .iter()
            .filter_map(|segment| match segment {
                PathSegment::Line {
                    line_index,
                    reversed,
                    ..
                } => self
                    .flight_lines
                    .get(*line_index)
                    .map(|line| line.heading(*reversed)),
                PathSegment::Connector { .. } => None,
            })
            .collect()
    }
}

/// Complete survey plan for one AOI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    pub heading_deg: f64,
    /// Missions in flight-execution order
    pub missions: Vec<Mission>,
    pub total_time_min: f64,
    pub total_photos: u64,
    pub area_m2: f64,
    pub mission_count: usize,
    pub battery_count: usize,
    /// Constant flight altitude above ground
    pub altitude_m: f64,
    pub line_spacing_m: f64,
    pub photo_interval_s: f64,
    pub photo_spacing_m: f64,
    /// Length of all mission paths
    pub total_distance_m: f64,
    /// Repositioning distance between consecutive missions
    pub transit_distance_m: f64,
}

impl FlightPlan {
    pub fn summary(&self) -> String {
        format!(
            "{} mission(s) at heading {:.0}°, {:.1} min total, {} photos, {:.2} ha, altitude {:.1} m, line spacing {:.1} m",
            self.mission_count,
            self.heading_deg,
            self.total_time_min,
            self.total_photos,
            self.area_m2 / 10_000.0,
            self.altitude_m,
            self.line_spacing_m,
        )
    }
}

/// Polygon as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiInput {
    pub outer: Vec<Coordinate>,
    #[serde(default)]
    pub holes: Vec<Vec<Coordinate>>,
}

/// Camera and trigger characteristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSpec {
    pub sensor_width_mm: f64,
    pub sensor_height_mm: f64,
    pub focal_length_mm: f64,
    pub image_width_px: u32,
    pub image_height_px: u32,
    /// Fastest the camera can trigger
    #[serde(default)]
    pub min_photo_interval_s: f64,
}

/// Survey parameters chosen by the operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionParams {
    pub gsd_cm: f64,
    pub front_overlap_pct: f64,
    pub side_overlap_pct: f64,
    pub speed_mps: f64,
    pub max_battery_min: f64,
    /// Manual heading override; when absent the default candidates are tried
    #[serde(default)]
    pub heading_deg: Option<f64>,
}

/// Full input to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRequest {
    pub aoi: AoiInput,
    pub camera: CameraSpec,
    pub mission: MissionParams,
}
