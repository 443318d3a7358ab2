//! Pan and zoom state of the canvas.

use super::geometry::Point;

/// Smallest allowed zoom factor.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed zoom factor.
pub const MAX_SCALE: f64 = 10.0;

/// Wheel delta units per line when the event reports line-based deltas.
const LINE_DELTA: f64 = 120.0;
/// Wheel delta that doubles (or halves) the scale.
const DELTA_PER_OCTAVE: f64 = 500.0;

/// A wheel event in screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WheelInput {
	/// Horizontal scroll delta (unused for zoom).
	pub delta_x: f64,
	/// Vertical scroll delta; positive zooms out.
	pub delta_y: f64,
	/// Depth scroll delta (unused for zoom).
	pub delta_z: f64,
	/// 0 for pixel deltas, anything else for line/page deltas.
	pub delta_mode: u32,
	/// Cursor position in screen space.
	pub cursor: Point,
}

/// `screen = world * scale + pan`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	scale: f64,
	pan_x: f64,
	pan_y: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self {
			scale: 1.0,
			pan_x: 0.0,
			pan_y: 0.0,
		}
	}
}

impl Viewport {
	/// The identity transform.
	pub fn new() -> Self {
		Self::default()
	}

	/// Current zoom factor.
	pub fn scale(&self) -> f64 {
		self.scale
	}

	/// Current translation in screen units.
	pub fn pan(&self) -> Point {
		Point::new(self.pan_x, self.pan_y)
	}

	/// Affine matrix `[a, b, c, d, e, f]` as taken by canvas `setTransform`.
	pub fn transform(&self) -> [f64; 6] {
		[self.scale, 0.0, 0.0, self.scale, self.pan_x, self.pan_y]
	}

	/// Maps a pointer position into world space.
	pub fn screen_to_world(&self, p: Point) -> Point {
		(p - self.pan()) / self.scale
	}

	/// Maps a world position onto the screen.
	pub fn world_to_screen(&self, p: Point) -> Point {
		p * self.scale + self.pan()
	}

	/// Zooms around the cursor: the world point under the cursor stays put.
	pub fn apply_wheel(&mut self, wheel: WheelInput) -> Viewport {
		let unit = if wheel.delta_mode != 0 { LINE_DELTA } else { 1.0 };
		let factor = (-wheel.delta_y * unit / DELTA_PER_OCTAVE).exp2();
		let scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
		if !scale.is_finite() {
			return *self;
		}

		let world = self.screen_to_world(wheel.cursor);
		let pan = wheel.cursor - world * scale;
		self.scale = scale;
		self.pan_x = pan.x;
		self.pan_y = pan.y;
		*self
	}

	/// Shifts the view by raw screen-space deltas.
	pub fn apply_pan(&mut self, dx: f64, dy: f64) -> Viewport {
		self.pan_x += dx;
		self.pan_y += dy;
		*self
	}
}
