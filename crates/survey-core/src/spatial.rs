//! Spatial math for survey geometry: distances, bearings, offsets, polygons.

use crate::models::{Bounds, Coordinate};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Flat-earth scale used for polygon areas (meters per degree).
pub const METERS_PER_DEGREE: f64 = 111_000.0;

const GRAVITY_MPS2: f64 = 9.81;
const TURN_RADIUS_SAFETY_FACTOR: f64 = 1.2;
const MIN_TURN_RADIUS_M: f64 = 5.0;
const MAX_TURN_RADIUS_M: f64 = 50.0;

// Substitute denominator for horizontal edges in the ray-casting test.
const EDGE_EPSILON: f64 = 1e-12;

/// Calculate distance between two points in meters using Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Great-circle distance between two coordinates in meters.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    haversine_distance(a.lat, a.lon, b.lat, b.lon)
}

/// Sum of great-circle distances along a polyline.
pub fn path_length(points: &[Coordinate]) -> f64 {
    points.windows(2).map(|pair| distance(pair[0], pair[1])).sum()
}

/// Normalize a bearing in degrees to [0, 360).
pub fn normalize_bearing(deg: f64) -> f64 {
    let value = deg.rem_euclid(360.0);
    if value >= 360.0 {
        0.0
    } else {
        value
    }
}

/// Signed heading change from `from` to `to`, normalized to [-180, 180].
pub fn heading_delta(from_deg: f64, to_deg: f64) -> f64 {
    let mut delta = (to_deg - from_deg).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// Initial great-circle bearing from `a` to `b` in degrees, [0, 360).
pub fn initial_bearing(a: Coordinate, b: Coordinate) -> f64 {
    normalize_bearing(bearing(a.lat, a.lon, b.lat, b.lon).to_degrees())
}

/// Calculate bearing from point 1 to point 2 in radians.
/// Returns bearing in radians, 0 = north, π/2 = east.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y)
}

/// Destination reached from `point` after `distance_m` along `bearing_deg`.
pub fn destination(point: Coordinate, bearing_deg: f64, distance_m: f64) -> Coordinate {
    let (lat, lon) = offset_by_bearing(point.lat, point.lon, distance_m, bearing_deg.to_radians());
    Coordinate::new(lat, lon)
}

/// Offset a position by distance and bearing.
///
/// # Arguments
/// * `lat`, `lon` - Starting position in degrees
/// * `distance_m` - Distance in meters
/// * `bearing_rad` - Bearing in radians (0 = north, π/2 = east)
///
/// # Returns
/// (new_lat, new_lon) in degrees
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    (lat2.to_degrees(), lon2.to_degrees())
}

// ==== ENU (East-North-Up) Coordinate Conversion ====
// These functions convert between meters and degrees on the same sphere used by
// `haversine_distance`, so local projections and great-circle lengths agree.

/// Meters per degree of latitude (spherical earth, so constant).
pub fn meters_per_deg_lat() -> f64 {
    EARTH_RADIUS_M * std::f64::consts::PI / 180.0
}

/// Meters per degree of longitude at a given latitude (spherical earth).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    EARTH_RADIUS_M * std::f64::consts::PI / 180.0 * lat_deg.to_radians().cos()
}

/// Convert a north/south offset in meters to degrees latitude.
pub fn meters_to_lat(meters: f64) -> f64 {
    meters / meters_per_deg_lat()
}

/// Convert an east/west offset in meters to degrees longitude.
/// Requires the reference latitude for proper scaling.
pub fn meters_to_lon(meters: f64, ref_lat_deg: f64) -> f64 {
    let meters_per_deg = meters_per_deg_lon(ref_lat_deg).max(1e-9);
    meters / meters_per_deg
}

/// Convert degrees latitude to meters.
pub fn lat_to_meters(deg: f64) -> f64 {
    deg * meters_per_deg_lat()
}

/// Convert degrees longitude to meters at a given latitude.
pub fn lon_to_meters(deg: f64, ref_lat_deg: f64) -> f64 {
    deg * meters_per_deg_lon(ref_lat_deg)
}

/// Local planar frame rotated so that one axis runs along a survey heading.
///
/// `along` grows in the heading direction, `perp` grows to the right of it.
/// Projection is linear about the origin, which is accurate for AOIs of a few
/// kilometers.
#[derive(Debug, Clone, Copy)]
pub struct HeadingFrame {
    origin: Coordinate,
    sin_h: f64,
    cos_h: f64,
}

impl HeadingFrame {
    pub fn new(origin: Coordinate, heading_deg: f64) -> Self {
        let heading_rad = heading_deg.to_radians();
        Self {
            origin,
            sin_h: heading_rad.sin(),
            cos_h: heading_rad.cos(),
        }
    }

    pub fn origin(&self) -> Coordinate {
        self.origin
    }

    /// Project to (along, perp) meters.
    pub fn to_local(&self, point: Coordinate) -> (f64, f64) {
        let east = lon_to_meters(point.lon - self.origin.lon, self.origin.lat);
        let north = lat_to_meters(point.lat - self.origin.lat);
        (
            east * self.sin_h + north * self.cos_h,
            east * self.cos_h - north * self.sin_h,
        )
    }

    /// Inverse of [`HeadingFrame::to_local`].
    pub fn to_geo(&self, along: f64, perp: f64) -> Coordinate {
        let east = along * self.sin_h + perp * self.cos_h;
        let north = along * self.cos_h - perp * self.sin_h;
        Coordinate::new(
            self.origin.lat + meters_to_lat(north),
            self.origin.lon + meters_to_lon(east, self.origin.lat),
        )
    }

    /// (min_along, max_along, min_perp, max_perp) over the points.
    pub fn extent(&self, points: &[Coordinate]) -> Option<(f64, f64, f64, f64)> {
        let mut iter = points.iter().map(|p| self.to_local(*p));
        let (a0, p0) = iter.next()?;
        Some(iter.fold((a0, a0, p0, p0), |(amin, amax, pmin, pmax), (a, p)| {
            (amin.min(a), amax.max(a), pmin.min(p), pmax.max(p))
        }))
    }
}

/// Ring without its closing duplicate vertex, if present.
pub fn open_ring(ring: &[Coordinate]) -> &[Coordinate] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

/// Planar shoelace area on (lon, lat) pairs scaled to square meters.
///
/// Uses a fixed meters-per-degree constant, so it is only meaningful for
/// small AOIs away from the poles.
pub fn polygon_area(ring: &[Coordinate]) -> f64 {
    let ring = open_ring(ring);
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..ring.len() {
        let a = ring[i];
        let b = ring[(i + 1) % ring.len()];
        sum += a.lon * b.lat - b.lon * a.lat;
    }
    (sum / 2.0).abs() * METERS_PER_DEGREE * METERS_PER_DEGREE
}

/// Axis-aligned bounds of a ring.
pub fn bounds(ring: &[Coordinate]) -> Bounds {
    let mut out = Bounds {
        north: f64::NEG_INFINITY,
        south: f64::INFINITY,
        east: f64::NEG_INFINITY,
        west: f64::INFINITY,
    };
    for point in ring {
        out.north = out.north.max(point.lat);
        out.south = out.south.min(point.lat);
        out.east = out.east.max(point.lon);
        out.west = out.west.min(point.lon);
    }
    out
}

const OUT_LEFT: u8 = 1;
const OUT_RIGHT: u8 = 2;
const OUT_BOTTOM: u8 = 4;
const OUT_TOP: u8 = 8;

fn outcode(point: Coordinate, rect: &Bounds) -> u8 {
    let mut code = 0;
    if point.lon < rect.west {
        code |= OUT_LEFT;
    } else if point.lon > rect.east {
        code |= OUT_RIGHT;
    }
    if point.lat < rect.south {
        code |= OUT_BOTTOM;
    } else if point.lat > rect.north {
        code |= OUT_TOP;
    }
    code
}

/// Cohen–Sutherland clip of a segment against a rectangle.
///
/// Returns `None` when the segment lies entirely outside.
pub fn clip_segment_to_rect(
    p0: Coordinate,
    p1: Coordinate,
    rect: &Bounds,
) -> Option<(Coordinate, Coordinate)> {
    let mut a = p0;
    let mut b = p1;
    let mut code_a = outcode(a, rect);
    let mut code_b = outcode(b, rect);

    loop {
        if code_a | code_b == 0 {
            return Some((a, b));
        }
        if code_a & code_b != 0 {
            return None;
        }

        let code_out = if code_a != 0 { code_a } else { code_b };
        let dx = b.lon - a.lon;
        let dy = b.lat - a.lat;
        let clipped = if code_out & OUT_TOP != 0 {
            Coordinate::new(rect.north, a.lon + dx * (rect.north - a.lat) / dy)
        } else if code_out & OUT_BOTTOM != 0 {
            Coordinate::new(rect.south, a.lon + dx * (rect.south - a.lat) / dy)
        } else if code_out & OUT_RIGHT != 0 {
            Coordinate::new(a.lat + dy * (rect.east - a.lon) / dx, rect.east)
        } else {
            Coordinate::new(a.lat + dy * (rect.west - a.lon) / dx, rect.west)
        };

        if code_out == code_a {
            a = clipped;
            code_a = outcode(a, rect);
        } else {
            b = clipped;
            code_b = outcode(b, rect);
        }
    }
}

fn point_in_ring(point: Coordinate, ring: &[Coordinate]) -> bool {
    let ring = open_ring(ring);
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let (x, y) = (point.lon, point.lat);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].lon, ring[i].lat);
        let (xj, yj) = (ring[j].lon, ring[j].lat);
        if (yi > y) != (yj > y) {
            let mut denom = yj - yi;
            if denom.abs() < EDGE_EPSILON {
                denom = EDGE_EPSILON;
            }
            let x_cross = (xj - xi) * (y - yi) / denom + xi;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Ray-casting test against an outer ring and its holes.
///
/// A point inside the outer ring but inside any hole is outside.
pub fn point_in_polygon(point: Coordinate, rings: &[Vec<Coordinate>]) -> bool {
    let Some((outer, holes)) = rings.split_first() else {
        return false;
    };
    point_in_ring(point, outer) && !holes.iter().any(|hole| point_in_ring(point, hole))
}

/// Coordinated-turn radius R = v² / (g·tan θ) with a 20% margin, clamped to [5, 50] m.
pub fn turn_radius(speed_mps: f64, bank_angle_deg: f64) -> f64 {
    let tan_bank = bank_angle_deg.to_radians().tan();
    if !tan_bank.is_finite() || tan_bank <= 0.0 {
        return MAX_TURN_RADIUS_M;
    }
    let radius = speed_mps * speed_mps / (GRAVITY_MPS2 * tan_bank);
    (radius * TURN_RADIUS_SAFETY_FACTOR).clamp(MIN_TURN_RADIUS_M, MAX_TURN_RADIUS_M)
}

/// Linear interpolation between two coordinates in degree space.
pub fn lerp(a: Coordinate, b: Coordinate, t: f64) -> Coordinate {
    Coordinate::new(a.lat + (b.lat - a.lat) * t, a.lon + (b.lon - a.lon) * t)
}
