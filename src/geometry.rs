use serde::Serialize;

/// A 2D point. `Point::UNDEFINED` (NaN coordinates) is the sentinel for
/// "not yet placed"; it propagates through arithmetic and compares unequal
/// to everything, including itself, via `approx_eq`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const UNDEFINED: Self = Self {
        x: f64::NAN,
        y: f64::NAN,
    };

    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_defined(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.is_defined()
            && other.is_defined()
            && (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
    }
}

/// Width/height pair. Dummy vertices use `Size::ZERO`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Self = Self {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle given by its center and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub center: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(center: Point, size: Size) -> Self {
        Self { center, size }
    }

    pub fn left(&self) -> f64 {
        self.center.x - self.size.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.center.x + self.size.width / 2.0
    }

    pub fn top(&self) -> f64 {
        self.center.y - self.size.height / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.center.y + self.size.height / 2.0
    }

    pub fn union(&self, other: &Self) -> Self {
        let left = self.left().min(other.left());
        let right = self.right().max(other.right());
        let top = self.top().min(other.top());
        let bottom = self.bottom().max(other.bottom());
        Self {
            center: Point::new((left + right) / 2.0, (top + bottom) / 2.0),
            size: Size::new(right - left, bottom - top),
        }
    }

    /// Point where the segment from the rect center toward `toward` crosses
    /// the rect boundary. Degenerate directions (zero-length, undefined)
    /// yield `Point::UNDEFINED` rather than dividing by zero.
    pub fn boundary_point_toward(&self, toward: Point) -> Point {
        if !self.center.is_defined() || !toward.is_defined() {
            return Point::UNDEFINED;
        }
        let dx = toward.x - self.center.x;
        let dy = toward.y - self.center.y;
        if dx == 0.0 && dy == 0.0 {
            return Point::UNDEFINED;
        }
        let half_w = self.size.width / 2.0;
        let half_h = self.size.height / 2.0;
        if half_w == 0.0 && half_h == 0.0 {
            return self.center;
        }
        // Scale the direction vector until it touches the nearer pair of sides.
        let tx = if dx != 0.0 {
            half_w / dx.abs()
        } else {
            f64::INFINITY
        };
        let ty = if dy != 0.0 {
            half_h / dy.abs()
        } else {
            f64::INFINITY
        };
        let t = tx.min(ty);
        if !t.is_finite() {
            return self.center;
        }
        Point::new(self.center.x + dx * t, self.center.y + dy * t)
    }
}

/// An ordered polyline describing how a connector is drawn, including
/// dummy-vertex waypoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Route {
    pub points: Vec<Point>,
}

impl Route {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn is_defined(&self) -> bool {
        !self.points.is_empty() && self.points.iter().all(Point::is_defined)
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .zip(&other.points)
                .all(|(a, b)| a.approx_eq(b, tolerance))
    }
}
