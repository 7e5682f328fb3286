//! Pan/zoom transform between screen pixels and simulation space:
//! `screen = offset + sim * scale`.

use super::config::ViewportConfig;
use super::types::Vec2;

/// Pan offset and zoom scale, clamped to the configured range.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewportTransform {
	/// Screen x of the simulation origin.
	pub offset_x: f64,
	/// Screen y of the simulation origin.
	pub offset_y: f64,
	/// Screen pixels per simulation unit.
	pub scale: f64,
	min_scale: f64,
	max_scale: f64,
	zoom_step: f64,
}

impl Default for ViewportTransform {
	fn default() -> Self {
		Self::new(&ViewportConfig::default())
	}
}

impl ViewportTransform {
	/// Identity transform with the configured limits.
	pub fn new(config: &ViewportConfig) -> Self {
		let min_scale = config.min_scale.max(f64::MIN_POSITIVE);
		Self {
			offset_x: 0.0,
			offset_y: 0.0,
			scale: 1.0,
			min_scale,
			max_scale: config.max_scale.max(min_scale),
			zoom_step: config.zoom_step,
		}
	}

	/// The pan offset as a vector.
	pub fn offset(&self) -> Vec2 {
		Vec2::new(self.offset_x, self.offset_y)
	}

	/// Back to the identity transform.
	pub fn reset(&mut self) {
		self.offset_x = 0.0;
		self.offset_y = 0.0;
		self.scale = 1.0;
	}

	/// Screen pixels to simulation space.
	pub fn to_sim(&self, screen: Vec2) -> Vec2 {
		(screen - self.offset()) / self.scale
	}

	/// Simulation space to screen pixels.
	pub fn to_screen(&self, sim: Vec2) -> Vec2 {
		self.offset() + sim * self.scale
	}

	/// Converts a length in screen pixels to simulation units.
	pub fn screen_len(&self, pixels: f64) -> f64 {
		pixels / self.scale
	}

	/// Moves the view by a raw screen delta.
	pub fn pan_by(&mut self, delta: Vec2) {
		if !delta.is_finite() {
			return;
		}
		self.offset_x += delta.x;
		self.offset_y += delta.y;
	}

	/// Multiplies the scale by `factor`, keeping the simulation point under
	/// `pivot` fixed on screen. Returns whether anything changed.
	pub fn zoom_at(&mut self, pivot: Vec2, factor: f64) -> bool {
		if !factor.is_finite() || factor <= 0.0 || !pivot.is_finite() {
			return false;
		}
		let scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
		if scale == self.scale {
			return false;
		}
		let ratio = scale / self.scale;
		self.offset_x = pivot.x - (pivot.x - self.offset_x) * ratio;
		self.offset_y = pivot.y - (pivot.y - self.offset_y) * ratio;
		self.scale = scale;
		true
	}

	/// One wheel notch: negative `delta_y` (scroll up) zooms in.
	pub fn wheel(&mut self, pivot: Vec2, delta_y: f64) -> bool {
		if delta_y == 0.0 || !delta_y.is_finite() {
			return false;
		}
		let factor = if delta_y < 0.0 {
			self.zoom_step
		} else {
			1.0 / self.zoom_step
		};
		self.zoom_at(pivot, factor)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identity_maps_points_through() {
		let transform = ViewportTransform::default();
		let p = Vec2::new(12.5, -3.0);
		assert_eq!(transform.to_sim(p), p);
		assert_eq!(transform.to_screen(p), p);
	}

	#[test]
	fn pan_moves_screen_pixels_one_to_one() {
		let mut transform = ViewportTransform::default();
		transform.zoom_at(Vec2::ZERO, 2.0);
		let before = transform.to_screen(Vec2::new(10.0, 10.0));
		transform.pan_by(Vec2::new(5.0, -7.0));
		let after = transform.to_screen(Vec2::new(10.0, 10.0));
		assert_eq!(after - before, Vec2::new(5.0, -7.0));
	}

	#[test]
	fn wheel_direction_and_step() {
		let mut transform = ViewportTransform::default();
		assert!(transform.wheel(Vec2::ZERO, -120.0));
		assert!((transform.scale - 1.1).abs() < 1e-12);
		assert!(transform.wheel(Vec2::ZERO, 120.0));
		assert!((transform.scale - 1.0).abs() < 1e-12);
		assert!(!transform.wheel(Vec2::ZERO, 0.0));
	}

	#[test]
	fn degenerate_factors_are_ignored() {
		let mut transform = ViewportTransform::default();
		for factor in [0.0, -1.0, f64::NAN, f64::INFINITY] {
			assert!(!transform.zoom_at(Vec2::new(5.0, 5.0), factor));
		}
		assert_eq!(transform, ViewportTransform::default());
	}

	#[test]
	fn reset_restores_identity() {
		let mut transform = ViewportTransform::default();
		transform.zoom_at(Vec2::new(100.0, 50.0), 3.0);
		transform.pan_by(Vec2::new(40.0, 40.0));
		transform.reset();
		assert_eq!(transform, ViewportTransform::default());
	}
}
