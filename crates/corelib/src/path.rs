//! Piecewise cubic Bézier camera path.
//!
//! Control points P0..Pn are consumed in windows of four that share their
//! boundary point: segment `i` uses P(3i)..P(3i+3).

use std::collections::BTreeMap;

use glam::Vec3;
use thiserror::Error;

/// Scene-scale factor applied to every evaluated point.
pub const DEFAULT_SCALE: f32 = 10.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathError {
    #[error("path needs at least 4 control points, got {0}")]
    TooFewPoints(usize),
    #[error("{0} control points do not form whole cubic segments (need 3n + 1)")]
    MisalignedPointCount(usize),
    #[error("control point P{0} is missing")]
    MissingPoint(usize),
    #[error("control point P{0} is defined twice")]
    DuplicatePoint(usize),
    #[error("invalid control point name '{0}', expected P<n>")]
    InvalidPointName(String),
    #[error("path parameter {0} is outside [0, 1)")]
    ParameterOutOfRange(f32),
    #[error("path parameter is not finite")]
    NonFiniteParameter,
    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Ordered control-point table.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlPoints {
    points: Vec<Vec3>,
}

impl ControlPoints {
    pub fn new(points: Vec<Vec3>) -> Result<Self, PathError> {
        let len = points.len();
        if len < 4 {
            return Err(PathError::TooFewPoints(len));
        }
        if (len - 1) % 3 != 0 {
            return Err(PathError::MisalignedPointCount(len));
        }
        Ok(Self { points })
    }

    /// Build from `P<n>` named entries in any order.
    pub fn from_named<I, S>(named: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = (S, Vec3)>,
        S: AsRef<str>,
    {
        let mut by_index = BTreeMap::new();
        for (name, point) in named {
            let index = point_index(name.as_ref())?;
            if by_index.insert(index, point).is_some() {
                return Err(PathError::DuplicatePoint(index));
            }
        }
        let mut points = Vec::with_capacity(by_index.len());
        for (expected, (index, point)) in by_index.into_iter().enumerate() {
            if index != expected {
                return Err(PathError::MissingPoint(expected));
            }
            points.push(point);
        }
        Self::new(points)
    }

    /// Parse a text table, one `P<n> x y z` per line. `#` starts a comment;
    /// `:`, `,`, `[` and `]` are accepted as separators.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let mut named = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let cleaned: String = line
                .chars()
                .map(|c| if matches!(c, ':' | ',' | '[' | ']') { ' ' } else { c })
                .collect();
            let fields: Vec<&str> = cleaned.split_whitespace().collect();
            let [name, x, y, z] = fields.as_slice() else {
                return Err(PathError::Malformed {
                    line: line_no,
                    reason: format!("expected 'P<n> x y z', got '{line}'"),
                });
            };
            let coord = |token: &str| {
                token.parse::<f32>().map_err(|_| PathError::Malformed {
                    line: line_no,
                    reason: format!("invalid coordinate '{token}'"),
                })
            };
            named.push((name.to_string(), Vec3::new(coord(*x)?, coord(*y)?, coord(*z)?)));
        }
        Self::from_named(named)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn segment_count(&self) -> usize {
        (self.points.len() - 1) / 3
    }

    /// The four control points of segment `index`.
    pub fn segment(&self, index: usize) -> Option<[Vec3; 4]> {
        let start = index * 3;
        match self.points.get(start..start + 4) {
            Some(&[a, b, c, d]) => Some([a, b, c, d]),
            _ => None,
        }
    }
}

fn point_index(name: &str) -> Result<usize, PathError> {
    name.strip_prefix('P')
        .and_then(|digits| digits.parse::<usize>().ok())
        .ok_or_else(|| PathError::InvalidPointName(name.to_string()))
}

/// What to do with a parameter outside `[0, 1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParamPolicy {
    /// `t < 0` becomes 0; `t >= 1` evaluates the end of the last segment.
    #[default]
    Clamp,
    /// `t` is taken modulo 1.
    Wrap,
    /// Out-of-range `t` is an error.
    Reject,
}

/// Camera path evaluated by de Casteljau reduction per segment.
#[derive(Clone, Debug, PartialEq)]
pub struct BezierPath {
    points: ControlPoints,
    pub scale: f32,
    pub policy: ParamPolicy,
}

impl BezierPath {
    pub fn new(points: ControlPoints) -> Self {
        Self {
            points,
            scale: DEFAULT_SCALE,
            policy: ParamPolicy::default(),
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_policy(mut self, policy: ParamPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn control_points(&self) -> &ControlPoints {
        &self.points
    }

    pub fn segment_count(&self) -> usize {
        self.points.segment_count()
    }

    /// Segment index and local parameter for a global `t`.
    pub fn locate(&self, t: f32) -> Result<(usize, f32), PathError> {
        if !t.is_finite() {
            return Err(PathError::NonFiniteParameter);
        }
        let t = match self.policy {
            ParamPolicy::Clamp => t.max(0.0),
            ParamPolicy::Wrap => t.rem_euclid(1.0),
            ParamPolicy::Reject if !(0.0..1.0).contains(&t) => {
                return Err(PathError::ParameterOutOfRange(t));
            }
            ParamPolicy::Reject => t,
        };
        let segments = self.segment_count();
        let scaled = t * segments as f32;
        let segment = scaled.floor() as usize;
        if segment >= segments {
            return Ok((segments - 1, 1.0));
        }
        Ok((segment, scaled - segment as f32))
    }

    fn blends(&self, t: f32) -> Result<(f32, Vec3, Vec3, Vec3), PathError> {
        let (segment, u) = self.locate(t)?;
        let [p0, p1, p2, p3] = self
            .points
            .segment(segment)
            .ok_or(PathError::MissingPoint(segment * 3 + 3))?;
        Ok((u, p0.lerp(p1, u), p1.lerp(p2, u), p2.lerp(p3, u)))
    }

    /// Point on the curve at `t`, scaled.
    pub fn position(&self, t: f32) -> Result<Vec3, PathError> {
        let (u, a, b, c) = self.blends(t)?;
        let d = a.lerp(b, u);
        let bc = b.lerp(c, u);
        Ok(d.lerp(bc, u) * self.scale)
    }

    /// Look-at target: the second-level blend of the two later first-level
    /// points, scaled. Sits ahead of `position` along the segment; it is not
    /// the curve derivative.
    pub fn tangent_target(&self, t: f32) -> Result<Vec3, PathError> {
        let (u, _, b, c) = self.blends(t)?;
        Ok(b.lerp(c, u) * self.scale)
    }

    /// `(position, tangent_target)` at `t`.
    pub fn pose(&self, t: f32) -> Result<(Vec3, Vec3), PathError> {
        Ok((self.position(t)?, self.tangent_target(t)?))
    }

    /// Polyline length over `samples` evenly spaced steps.
    pub fn approximate_length(&self, samples: usize) -> Result<f32, PathError> {
        if samples == 0 {
            return Ok(0.0);
        }
        let mut length = 0.0;
        let mut prev = self.position(0.0)?;
        for i in 1..=samples {
            // Stay below t = 1 so Wrap and Reject also end on the last point.
            let t = (i as f32 / samples as f32).min(1.0 - f32::EPSILON);
            let pos = self.position(t)?;
            length += (pos - prev).length();
            prev = pos;
        }
        Ok(length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-3
    }

    fn loop_points() -> ControlPoints {
        ControlPoints::new(vec![
            Vec3::new(-8.39, -1.3, 14.41),
            Vec3::new(-13.68, -1.3, 31.6),
            Vec3::new(-3.49, -1.3, 26.51),
            Vec3::new(6.75, -1.3, 27.27),
            Vec3::new(15.99, -6.3, 27.93),
            Vec3::new(28.06, -6.3, 28.03),
            Vec3::new(25.48, -6.3, 10.45),
            Vec3::new(22.51, -6.3, -11.47),
            Vec3::new(8.73, -6.3, -51.08),
            Vec3::new(-7.26, -3.3, -39.28),
            Vec3::new(-21.25, -6.3, -22.87),
            Vec3::new(-2.16, -6.3, -1.47),
            Vec3::new(-8.39, -1.3, 14.41),
        ])
        .unwrap()
    }

    #[test]
    fn start_of_path_is_scaled_first_point() {
        let path = BezierPath::new(loop_points());
        let p = loop_points().points().to_vec();
        assert_eq!(path.segment_count(), 4);
        assert!(close(path.position(0.0).unwrap(), p[0] * 10.0));
        // At u = 0 the tangent target collapses onto P1.
        assert!(close(path.tangent_target(0.0).unwrap(), p[1] * 10.0));
    }

    #[test]
    fn continuous_across_segment_boundaries() {
        let path = BezierPath::new(loop_points());
        for k in 1..path.segment_count() {
            let t = k as f32 / path.segment_count() as f32;
            let before = path.position(t - 1e-6).unwrap();
            let at = path.position(t).unwrap();
            let boundary = loop_points().points()[k * 3] * 10.0;
            assert!(close(at, boundary), "k={k}: {at} vs {boundary}");
            assert!((before - at).length() < 0.05, "k={k}: {before} vs {at}");
        }
    }

    #[test]
    fn matches_closed_form_cubic() {
        let pts = ControlPoints::new(vec![
            Vec3::ZERO,
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(3.0, 2.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
        ])
        .unwrap();
        let path = BezierPath::new(pts.clone()).with_scale(1.0);
        let p = pts.points();
        for &u in &[0.1f32, 0.25, 0.5, 0.9] {
            let s = 1.0 - u;
            let expected =
                p[0] * s * s * s + p[1] * 3.0 * s * s * u + p[2] * 3.0 * s * u * u + p[3] * u * u * u;
            assert!(close(path.position(u).unwrap(), expected));
            let target = p[1].lerp(p[2], u).lerp(p[2].lerp(p[3], u), u);
            assert!(close(path.tangent_target(u).unwrap(), target));
        }
    }

    #[test]
    fn end_of_path_policies() {
        let last = loop_points().points()[12] * 10.0;
        let clamp = BezierPath::new(loop_points());
        assert!(close(clamp.position(1.0).unwrap(), last));
        assert!(close(clamp.position(7.5).unwrap(), last));
        assert!(close(clamp.position(-1.0).unwrap(), clamp.position(0.0).unwrap()));

        let wrap = BezierPath::new(loop_points()).with_policy(ParamPolicy::Wrap);
        assert!(close(wrap.position(1.25).unwrap(), wrap.position(0.25).unwrap()));
        assert!(close(wrap.position(-0.75).unwrap(), wrap.position(0.25).unwrap()));

        let reject = BezierPath::new(loop_points()).with_policy(ParamPolicy::Reject);
        assert_eq!(reject.position(1.0), Err(PathError::ParameterOutOfRange(1.0)));
        assert!(reject.position(0.999).is_ok());
        assert_eq!(clamp.position(f32::NAN), Err(PathError::NonFiniteParameter));
    }

    #[test]
    fn scale_is_configurable() {
        let path = BezierPath::new(loop_points()).with_scale(1.0);
        assert!(close(path.position(0.0).unwrap(), loop_points().points()[0]));
    }

    #[test]
    fn point_count_validation() {
        assert_eq!(
            ControlPoints::new(vec![Vec3::ZERO; 3]),
            Err(PathError::TooFewPoints(3))
        );
        assert_eq!(
            ControlPoints::new(vec![Vec3::ZERO; 6]),
            Err(PathError::MisalignedPointCount(6))
        );
        assert_eq!(ControlPoints::new(vec![Vec3::ZERO; 7]).unwrap().segment_count(), 2);
    }

    #[test]
    fn named_points_any_order() {
        let named = [
            ("P3", Vec3::splat(3.0)),
            ("P0", Vec3::splat(0.0)),
            ("P2", Vec3::splat(2.0)),
            ("P1", Vec3::splat(1.0)),
        ];
        let pts = ControlPoints::from_named(named).unwrap();
        assert_eq!(pts.points()[2], Vec3::splat(2.0));
        assert_eq!(pts.segment(1), None);

        let gap = [("P0", Vec3::ZERO), ("P1", Vec3::ZERO), ("P3", Vec3::ZERO), ("P4", Vec3::ZERO)];
        assert_eq!(ControlPoints::from_named(gap), Err(PathError::MissingPoint(2)));
        assert_eq!(
            ControlPoints::from_named([("Q0", Vec3::ZERO)]),
            Err(PathError::InvalidPointName("Q0".to_string()))
        );
        assert_eq!(
            ControlPoints::from_named([("P0", Vec3::ZERO), ("P0", Vec3::ONE)]),
            Err(PathError::DuplicatePoint(0))
        );
    }

    #[test]
    fn parse_text_table() {
        let src = "\
# balloon loop
P0: [30, 0, 22]
P1 -25 -10 22
P2 -30 -10 22   # inline comment
P3 -110 -4 2
";
        let pts = ControlPoints::parse(src).unwrap();
        assert_eq!(pts.len(), 4);
        assert_eq!(pts.points()[0], Vec3::new(30.0, 0.0, 22.0));
        assert!(matches!(
            ControlPoints::parse("P0 1 2\n"),
            Err(PathError::Malformed { line: 1, .. })
        ));
        assert!(matches!(
            ControlPoints::parse("P0 1 two 3\n"),
            Err(PathError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn length_of_straight_path() {
        let pts = ControlPoints::new(vec![
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
        ])
        .unwrap();
        let path = BezierPath::new(pts).with_policy(ParamPolicy::Reject);
        let len = path.approximate_length(64).unwrap();
        assert!((len - 30.0).abs() < 0.01, "{len}");
    }
}
