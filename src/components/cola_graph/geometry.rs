//! Clipping of connector lines against rectangular node bodies.

/// Segments shorter than this along an axis are treated as parallel to the
/// other axis when computing the exit parameter.
const AXIS_EPSILON: f64 = 0.1;

/// A point or vector in world or screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// Creates a point.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Squared Euclidean norm.
	pub fn length_squared(self) -> f64 {
		self.x * self.x + self.y * self.y
	}

	/// Euclidean norm.
	pub fn length(self) -> f64 {
		self.length_squared().sqrt()
	}

	/// Whether both coordinates are finite.
	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

impl std::ops::Add for Point {
	type Output = Point;

	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl std::ops::Sub for Point {
	type Output = Point;

	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl std::ops::Mul<f64> for Point {
	type Output = Point;

	fn mul(self, rhs: f64) -> Point {
		Point::new(self.x * rhs, self.y * rhs)
	}
}

impl std::ops::Div<f64> for Point {
	type Output = Point;

	fn div(self, rhs: f64) -> Point {
		Point::new(self.x / rhs, self.y / rhs)
	}
}

/// An axis-aligned rectangle given by its center and full size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
	/// Center.
	pub center: Point,
	/// Full width.
	pub width: f64,
	/// Full height.
	pub height: f64,
}

impl Body {
	/// Creates a body.
	pub const fn new(center: Point, width: f64, height: f64) -> Self {
		Self {
			center,
			width,
			height,
		}
	}

	/// Whether `p` lies inside or on the edge of the rectangle.
	pub fn contains(&self, p: Point) -> bool {
		(p.x - self.center.x).abs() <= self.width / 2.0
			&& (p.y - self.center.y).abs() <= self.height / 2.0
	}

	/// Parameter along `d` (starting at the center) where the line leaves the rectangle.
	fn exit_parameter(&self, d: Point) -> f64 {
		let (adx, ady) = (d.x.abs(), d.y.abs());
		let tx = if adx > AXIS_EPSILON {
			(self.width / 2.0) / adx
		} else {
			1.0
		};
		let ty = if ady > AXIS_EPSILON {
			(self.height / 2.0) / ady
		} else {
			1.0
		};
		tx.min(ty)
	}
}

/// A straight line from `start` to `end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
	/// Point on the source body.
	pub start: Point,
	/// Point on (or short of) the target body.
	pub end: Point,
}

impl Segment {
	/// Length of the segment.
	pub fn length(&self) -> f64 {
		(self.end - self.start).length()
	}
}

/// Clips the center-to-center line between two bodies so it starts where it
/// leaves `src` and ends where it enters `trg`, pulled back a further
/// `end_shorten` world units at the target end to leave room for a marker.
///
/// Coincident centers produce a zero-length segment at the shared center.
pub fn clip_segment(src: &Body, trg: &Body, end_shorten: f64) -> Segment {
	let d = trg.center - src.center;
	let length = d.length();
	if length == 0.0 || !length.is_finite() {
		return Segment {
			start: src.center,
			end: src.center,
		};
	}

	let t0 = src.exit_parameter(d);
	let mut t1 = 1.0 - trg.exit_parameter(d);
	if end_shorten != 0.0 {
		t1 -= end_shorten / length;
	}

	Segment {
		start: src.center + d * t0,
		end: src.center + d * t1,
	}
}
