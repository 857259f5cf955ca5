//! Metes-and-bounds path builder.
//!
//! Converts a sequence of textual survey calls into a point sequence.
//! A call is either a line call
//! `"<N|S> <deg> <min> <sec> <E|W> <distance>"` or a curve call
//! `"<L|R> <radius> <deg> <min> <sec> [<distance>]"`. Bearings are in
//! radians with 0 = north, increasing clockwise.
//!
//! Curves are flattened into equal-chord steps: the entering bearing
//! rotates by a half step before the first chord, each following chord
//! rotates by a full step, and after the last chord the running bearing
//! rotates one more half step so downstream calls chain from the true
//! tangent. Every chord except the last is flagged interpolated, for
//! spatial-quality auditing downstream.
//!
//! Path assembly integrates a point-of-beginning call sequence from an
//! origin corner, then the boundary calls. For closed shapes a final
//! point within the closure threshold of the point-of-beginning is
//! treated as floating-point drift and snapped exactly onto it; a
//! larger gap either passes through unchanged (closure not required)
//! or raises [`TraverseError::ClosureMismatch`].

use std::f64::consts::PI;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::projection::{wrap_angle, ProjectedPoint};

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(N|S) +(\d+) +(\d+) +([\d.]+) +(E|W) +([\d.]+)").expect("line call pattern")
});
static CURVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(L|R) +([\d.]+) +(\d+) +(\d+) +([\d.]+)(?: +([\d.]+))?").expect("curve call pattern")
});

/// Closure tolerance in feet: a gap smaller than this is floating-point
/// drift, not a surveying discrepancy.
pub const CLOSURE_THRESHOLD_FEET: f64 = 1.0;

/// One integrated step of a traverse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BearingCall {
    /// Bearing in radians, 0 = north, clockwise.
    pub bearing: f64,
    /// Distance in feet.
    pub distance: f64,
    /// Whether this step approximates a curve rather than following a
    /// surveyed line.
    pub interpolated: bool,
}

/// Kind of aggregate geometry a traverse produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Closed parcel boundary, emitted as a polygon.
    #[default]
    Outline,
    /// Road or easement centerline, emitted as a linestring. Never
    /// requires closure.
    Centerline,
}

/// Structured traverse description for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraverseSpec {
    /// Registry label of the origin corner, e.g. `"24 27 12 SE"`.
    pub origin: String,
    /// Calls from the origin to the point of beginning.
    pub beginning: Vec<String>,
    /// Boundary calls from the point of beginning.
    pub shape: Vec<String>,
    /// Aggregate geometry kind.
    #[serde(default, rename = "type")]
    pub kind: ShapeKind,
    /// Stated right-of-way width for centerlines. Accepted and carried
    /// through but not used by geometry.
    #[serde(default)]
    pub width: Option<f64>,
}

/// Tunables for call parsing and closure checking.
#[derive(Debug, Clone, PartialEq)]
pub struct TraverseOptions {
    /// Curve flattening step in degrees of arc per chord.
    pub angle_step_degrees: f64,
    /// Explicit chord count overriding the per-degree step.
    pub angle_steps: Option<u32>,
    /// Closure tolerance in feet.
    pub closure_threshold: f64,
}

impl Default for TraverseOptions {
    fn default() -> Self {
        Self {
            angle_step_degrees: 2.0,
            angle_steps: None,
            closure_threshold: CLOSURE_THRESHOLD_FEET,
        }
    }
}

/// How a path is assembled from its calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathOptions {
    /// Emit the origin and every point between origin and the point of
    /// beginning, not just the point of beginning.
    pub include_origin: bool,
    /// The boundary is a closed ring; the emitted ring ends on the
    /// point of beginning.
    pub closed: bool,
    /// Raise [`TraverseError::ClosureMismatch`] when a closed boundary
    /// misses the point of beginning by more than the threshold.
    pub require_closure: bool,
}

/// Error raised while parsing calls or assembling a path.
#[derive(Debug, thiserror::Error)]
pub enum TraverseError {
    /// A call string matched neither the line nor the curve form.
    #[error("unrecognized survey call: {0:?}")]
    UnrecognizedCall(String),
    /// A matched call carried an unparseable number.
    #[error("malformed survey call: {0:?}")]
    MalformedCall(String),
    /// A curve call appeared before any line call established a
    /// bearing to enter the curve on.
    #[error("curve call without an entering bearing: {0:?}")]
    CurveWithoutBearing(String),
    /// A closed boundary failed to return to its point of beginning.
    #[error("boundary ends {offset} ft from the point of beginning")]
    ClosureMismatch {
        /// Gap between the final point and the point of beginning, in
        /// feet.
        offset: f64,
    },
}

/// Angle in radians from degrees/minutes/seconds.
fn make_angle(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    (degrees + (minutes + seconds / 60.0) / 60.0).to_radians()
}

/// Rotate a bearing by `angle`, clockwise when `right`.
fn rotate(bearing: f64, angle: f64, right: bool) -> f64 {
    wrap_angle(bearing + if right { angle } else { -angle })
}

fn parse_f64(value: &str, call: &str) -> Result<f64, TraverseError> {
    value
        .parse()
        .map_err(|_| TraverseError::MalformedCall(call.to_string()))
}

/// Convert a quadrant DMS line call into a signed bearing call.
fn line_call(caps: &regex::Captures<'_>, call: &str) -> Result<BearingCall, TraverseError> {
    let north = &caps[1] == "N";
    let east = &caps[5] == "E";

    let degrees = parse_f64(&caps[2], call)?;
    let minutes = parse_f64(&caps[3], call)?;
    let seconds = parse_f64(&caps[4], call)?;
    let distance = parse_f64(&caps[6], call)?;

    let angle = degrees + (minutes + seconds / 60.0) / 60.0;
    // Quadrant rules: NE keeps the angle, NW negates, SW measures past
    // south, SE measures back from south.
    let signed = match (north, east) {
        (true, true) => angle,
        (true, false) => -angle,
        (false, false) => 180.0 + angle,
        (false, true) => 180.0 - angle,
    };

    Ok(BearingCall {
        bearing: signed.to_radians(),
        distance,
        interpolated: false,
    })
}

/// Flatten a curve call into chord bearing calls, updating the running
/// bearing to the exit tangent.
fn curve_calls(
    caps: &regex::Captures<'_>,
    call: &str,
    bearing: &mut f64,
    options: &TraverseOptions,
) -> Result<Vec<BearingCall>, TraverseError> {
    let right = &caps[1] == "R";
    let radius = parse_f64(&caps[2], call)?;
    let degrees = parse_f64(&caps[3], call)?;
    let minutes = parse_f64(&caps[4], call)?;
    let seconds = parse_f64(&caps[5], call)?;

    let angle = make_angle(degrees, minutes, seconds);
    // A zero radius means the call omitted it; fall back to the
    // degenerate derivation from the arc angle.
    let radius = if radius != 0.0 {
        radius
    } else {
        (angle / (2.0 * PI)) / PI / 2.0
    };

    let steps = match options.angle_steps {
        Some(steps) => steps,
        None => (angle / options.angle_step_degrees.to_radians()).ceil() as u32,
    };
    let step_angle = angle / f64::from(steps.max(1));
    let chord = 2.0 * (step_angle / 2.0).sin() * radius;
    let count = steps.max(1);

    let mut calls = Vec::with_capacity(count as usize);
    // Entering the curve takes half of the continuing angle.
    *bearing = rotate(*bearing, step_angle / 2.0, right);
    calls.push(BearingCall {
        bearing: *bearing,
        distance: chord,
        interpolated: count > 1,
    });
    for step in 1..count {
        *bearing = rotate(*bearing, step_angle, right);
        calls.push(BearingCall {
            bearing: *bearing,
            distance: chord,
            interpolated: step != count - 1,
        });
    }
    // Leave the running bearing on the exit tangent for the next call.
    *bearing = rotate(*bearing, step_angle / 2.0, right);

    Ok(calls)
}

/// Parse a call sequence into bearing calls.
///
/// `entering` carries the running bearing from a preceding sequence so
/// a curve at the start of the boundary can chain off the last
/// point-of-beginning call.
pub fn parse_calls(
    calls: &[String],
    options: &TraverseOptions,
    entering: Option<f64>,
) -> Result<Vec<BearingCall>, TraverseError> {
    let mut out = Vec::new();
    let mut bearing = entering;

    for call in calls {
        if let Some(caps) = LINE_RE.captures(call) {
            let parsed = line_call(&caps, call)?;
            bearing = Some(parsed.bearing);
            out.push(parsed);
        } else if let Some(caps) = CURVE_RE.captures(call) {
            let mut current = bearing
                .ok_or_else(|| TraverseError::CurveWithoutBearing(call.clone()))?;
            out.extend(curve_calls(&caps, call, &mut current, options)?);
            bearing = Some(current);
        } else {
            return Err(TraverseError::UnrecognizedCall(call.clone()));
        }
    }

    Ok(out)
}

fn advance(point: ProjectedPoint, call: &BearingCall) -> ProjectedPoint {
    ProjectedPoint::new(
        point.x + call.bearing.sin() * call.distance,
        point.y + call.bearing.cos() * call.distance,
    )
}

/// Integrate a traverse into a flagged point sequence.
///
/// The sequence starts at the point of beginning (or at `origin` when
/// `include_origin` is set) and ends per the closure rules in the
/// module docs.
pub fn build_path(
    origin: ProjectedPoint,
    beginning: &[BearingCall],
    shape: &[BearingCall],
    path: &PathOptions,
    options: &TraverseOptions,
) -> Result<Vec<(ProjectedPoint, bool)>, TraverseError> {
    let mut points = Vec::new();
    if path.include_origin {
        points.push((origin, false));
    }

    let mut current = origin;
    for call in beginning {
        current = advance(current, call);
        if path.include_origin {
            points.push((current, call.interpolated));
        }
    }

    let point_of_beginning = current;
    if !path.include_origin {
        points.push((point_of_beginning, false));
    }

    if shape.is_empty() {
        return Ok(points);
    }

    let last = shape.len() - 1;
    for (i, call) in shape.iter().enumerate() {
        current = advance(current, call);
        if i < last {
            points.push((current, call.interpolated));
            continue;
        }

        let offset = current.distance(point_of_beginning);
        if offset < options.closure_threshold {
            // Close enough that the gap is floating-point drift.
            points.push((point_of_beginning, false));
        } else if path.require_closure {
            return Err(TraverseError::ClosureMismatch { offset });
        } else {
            points.push((current, call.interpolated));
            if path.closed {
                points.push((point_of_beginning, false));
            }
        }
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calls(strings: &[&str]) -> Vec<String> {
        strings.iter().map(|s| s.to_string()).collect()
    }

    fn parse_one(call: &str) -> BearingCall {
        let parsed = parse_calls(&calls(&[call]), &TraverseOptions::default(), None).unwrap();
        assert_eq!(parsed.len(), 1);
        parsed[0]
    }

    #[test]
    fn test_line_call_ne_quadrant() {
        let call = parse_one("N 45 30 15.5 E 120.0");
        let expected = (45.0f64 + (30.0 + 15.5 / 60.0) / 60.0).to_radians();
        assert!((call.bearing - expected).abs() < 1e-12);
        assert_eq!(call.distance, 120.0);
        assert!(!call.interpolated);
    }

    #[test]
    fn test_line_call_quadrants() {
        let ne = parse_one("N 30 0 0 E 10");
        let nw = parse_one("N 30 0 0 W 10");
        let sw = parse_one("S 30 0 0 W 10");
        let se = parse_one("S 30 0 0 E 10");

        assert!((ne.bearing - 30f64.to_radians()).abs() < 1e-12);
        assert!((nw.bearing - (-30f64).to_radians()).abs() < 1e-12);
        assert!((sw.bearing - 210f64.to_radians()).abs() < 1e-12);
        assert!((se.bearing - 150f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_curve_flattening_steps_and_flags() {
        // 10 degrees of arc at the default 2-degree step: 5 chords, all
        // but the last interpolated.
        let parsed = parse_calls(
            &calls(&["N 0 0 0 E 100", "R 500 10 0 0"]),
            &TraverseOptions::default(),
            None,
        )
        .unwrap();
        let chords = &parsed[1..];
        assert_eq!(chords.len(), 5);
        for chord in &chords[..4] {
            assert!(chord.interpolated);
        }
        assert!(!chords[4].interpolated);

        // Chord length: 2 r sin(step/2).
        let step = 2f64.to_radians();
        let expected = 2.0 * 500.0 * (step / 2.0).sin();
        for chord in chords {
            assert!((chord.distance - expected).abs() < 1e-12);
        }

        // First chord enters on a half step; each following chord is a
        // full step further around.
        assert!((chords[0].bearing - step / 2.0).abs() < 1e-12);
        assert!((chords[1].bearing - 3.0 * step / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_curve_exit_bearing_chains_to_next_call() {
        // After a right curve of 10 degrees entered heading north, the
        // exit tangent is 10 degrees; a following curve must enter from
        // there, half a step beyond.
        let options = TraverseOptions::default();
        let parsed = parse_calls(
            &calls(&["N 0 0 0 E 100", "R 500 10 0 0", "R 500 2 0 0"]),
            &options,
            None,
        )
        .unwrap();
        let last = parsed.last().unwrap();
        let expected = 10f64.to_radians() + 1f64.to_radians();
        assert!((last.bearing - expected).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_curve_radius_formula() {
        let angle = PI / 2.0;
        let parsed = parse_calls(
            &calls(&["N 0 0 0 E 100", "L 0 90 0 0"]),
            &TraverseOptions {
                angle_steps: Some(1),
                ..TraverseOptions::default()
            },
            None,
        )
        .unwrap();
        let radius = (angle / (2.0 * PI)) / PI / 2.0;
        let expected = 2.0 * (angle / 2.0).sin() * radius;
        assert_eq!(parsed[1].distance, expected);
    }

    #[test]
    fn test_explicit_step_count() {
        let parsed = parse_calls(
            &calls(&["N 0 0 0 E 100", "R 500 90 0 0"]),
            &TraverseOptions {
                angle_steps: Some(3),
                ..TraverseOptions::default()
            },
            None,
        )
        .unwrap();
        assert_eq!(parsed.len(), 4);
    }

    #[test]
    fn test_curve_without_bearing_fails() {
        let err = parse_calls(&calls(&["R 500 10 0 0"]), &TraverseOptions::default(), None)
            .unwrap_err();
        assert!(matches!(err, TraverseError::CurveWithoutBearing(_)));
    }

    #[test]
    fn test_unrecognized_call_fails() {
        let err = parse_calls(
            &calls(&["thence along the river"]),
            &TraverseOptions::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TraverseError::UnrecognizedCall(_)));
    }

    fn square_shape(last_leg: &str) -> Vec<String> {
        calls(&["N 90 0 0 E 100", "S 0 0 0 E 100", "S 90 0 0 W 100", last_leg])
    }

    fn pob_path(
        last_leg: &str,
        path: PathOptions,
    ) -> Result<Vec<(ProjectedPoint, bool)>, TraverseError> {
        let options = TraverseOptions::default();
        let beginning = parse_calls(&calls(&["N 0 0 0 E 100"]), &options, None).unwrap();
        let shape = parse_calls(&square_shape(last_leg), &options, Some(beginning[0].bearing))
            .unwrap();
        build_path(
            ProjectedPoint::new(1000.0, 1000.0),
            &beginning,
            &shape,
            &path,
            &options,
        )
    }

    #[test]
    fn test_path_exact_closure() {
        let points = pob_path(
            "N 0 0 0 E 100",
            PathOptions {
                closed: true,
                ..PathOptions::default()
            },
        )
        .unwrap();
        // Point of beginning plus four legs, ending snapped on the
        // point of beginning.
        assert_eq!(points.len(), 5);
        assert_eq!(points[0].0, ProjectedPoint::new(1000.0, 1100.0));
        assert_eq!(points[4].0, points[0].0);
        assert!(!points[4].1);
    }

    #[test]
    fn test_path_snaps_small_closure_gap() {
        let points = pob_path(
            "N 0 0 0 E 99.4",
            PathOptions {
                closed: true,
                ..PathOptions::default()
            },
        )
        .unwrap();
        assert_eq!(points.last().unwrap().0, points[0].0);
    }

    #[test]
    fn test_path_closure_mismatch() {
        let err = pob_path(
            "N 0 0 0 E 95",
            PathOptions {
                closed: true,
                require_closure: true,
                ..PathOptions::default()
            },
        )
        .unwrap_err();
        match err {
            TraverseError::ClosureMismatch { offset } => {
                assert!((offset - 5.0).abs() < 1e-9);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_path_open_gap_accepted_and_ring_closed() {
        let points = pob_path(
            "N 0 0 0 E 95",
            PathOptions {
                closed: true,
                ..PathOptions::default()
            },
        )
        .unwrap();
        // Raw endpoint accepted, then the ring explicitly closed.
        assert_eq!(points.len(), 6);
        assert_eq!(points[4].0, ProjectedPoint::new(1000.0, 1095.0));
        assert_eq!(points[5].0, points[0].0);
    }

    #[test]
    fn test_centerline_never_requires_closure() {
        let points = pob_path("N 0 0 0 E 95", PathOptions::default()).unwrap();
        assert_eq!(points.len(), 5);
        assert_eq!(points.last().unwrap().0, ProjectedPoint::new(1000.0, 1095.0));
    }

    #[test]
    fn test_include_origin_emits_approach() {
        let points = pob_path(
            "N 0 0 0 E 100",
            PathOptions {
                include_origin: true,
                closed: true,
                ..PathOptions::default()
            },
        )
        .unwrap();
        assert_eq!(points[0].0, ProjectedPoint::new(1000.0, 1000.0));
        assert_eq!(points[1].0, ProjectedPoint::new(1000.0, 1100.0));
        assert_eq!(points.len(), 6);
    }

    #[test]
    fn test_paths_are_pure_functions_of_their_calls() {
        let a = pob_path(
            "N 0 0 0 E 100",
            PathOptions {
                closed: true,
                ..PathOptions::default()
            },
        )
        .unwrap();
        let b = pob_path(
            "N 0 0 0 E 100",
            PathOptions {
                closed: true,
                ..PathOptions::default()
            },
        )
        .unwrap();
        assert_eq!(a, b);
    }
}
