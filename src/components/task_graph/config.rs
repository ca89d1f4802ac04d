//! Tunables for the editor and its layout.

use serde::{Deserialize, Serialize};

/// Parameters of the on-demand force-directed layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutParams {
	/// Number of solver passes.
	pub iterations: usize,
	/// Scale applied to the repulsive force.
	pub repulsion_damping: f64,
	/// Scale applied to the attractive force along edges.
	pub attraction_damping: f64,
}

impl Default for LayoutParams {
	fn default() -> Self {
		Self {
			iterations: 100,
			repulsion_damping: 0.1,
			attraction_damping: 0.01,
		}
	}
}

/// Tunables for the task graph editor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	/// Smallest allowed zoom factor.
	pub min_zoom: f64,
	/// Largest allowed zoom factor.
	pub max_zoom: f64,
	/// Zoom change per wheel tick.
	pub zoom_step: f64,
	/// Node width in world units.
	pub node_width: f64,
	/// Node height in world units.
	pub node_height: f64,
	/// Radius of a connection handle.
	pub handle_radius: f64,
	/// Distance of a handle centre outside the node box.
	pub handle_offset: f64,
	/// Handle hit radius as a multiple of `handle_radius`.
	pub handle_hit_factor: f64,
	/// Edge hit tolerance in screen pixels.
	pub edge_hit_tolerance: f64,
	/// Screen padding kept around the nodes by "center view".
	pub fit_padding: f64,
	/// Radius of the initial circle as a fraction of the smaller viewport side.
	pub circle_radius_factor: f64,
	/// Viewport size used before the canvas has been measured.
	pub fallback_size: (f64, f64),
	/// Auto-layout parameters.
	pub layout: LayoutParams,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			min_zoom: 0.5,
			max_zoom: 2.0,
			zoom_step: 0.1,
			node_width: 120.0,
			node_height: 80.0,
			handle_radius: 8.0,
			handle_offset: 15.0,
			handle_hit_factor: 1.5,
			edge_hit_tolerance: 8.0,
			fit_padding: 50.0,
			circle_radius_factor: 0.3,
			fallback_size: (800.0, 600.0),
			layout: LayoutParams::default(),
		}
	}
}

impl GraphConfig {
	/// Clamps `zoom` into `[min_zoom, max_zoom]`.
	pub fn clamp_zoom(&self, zoom: f64) -> f64 {
		zoom.max(self.min_zoom).min(self.max_zoom)
	}

	/// Repairs zoom bounds coming from host input: non-positive or
	/// non-finite bounds fall back to the defaults, reversed bounds are
	/// swapped.
	pub fn normalized(mut self) -> Self {
		let defaults = Self::default();
		let usable = |z: f64| z.is_finite() && z > 0.0;
		if !usable(self.min_zoom) {
			self.min_zoom = defaults.min_zoom;
		}
		if !usable(self.max_zoom) {
			self.max_zoom = defaults.max_zoom;
		}
		if self.min_zoom > self.max_zoom {
			std::mem::swap(&mut self.min_zoom, &mut self.max_zoom);
		}
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reversed_zoom_bounds_are_swapped() {
		let config = GraphConfig { min_zoom: 3.0, max_zoom: 0.25, ..GraphConfig::default() }.normalized();
		assert_eq!((config.min_zoom, config.max_zoom), (0.25, 3.0));
		assert_eq!(config.clamp_zoom(10.0), 3.0);
		assert_eq!(config.clamp_zoom(0.1), 0.25);
	}

	#[test]
	fn unusable_zoom_bounds_fall_back_to_defaults() {
		let config = GraphConfig { min_zoom: f64::NAN, max_zoom: -1.0, ..GraphConfig::default() }.normalized();
		assert_eq!((config.min_zoom, config.max_zoom), (0.5, 2.0));
	}

	#[test]
	fn partial_config_keeps_defaults() {
		let config: GraphConfig = serde_json::from_str(r#"{"max_zoom":4.0}"#).unwrap();
		assert_eq!(config.max_zoom, 4.0);
		assert_eq!(config.min_zoom, 0.5);
		assert_eq!(config.layout.iterations, 100);
	}

	#[test]
	fn clamp_never_panics_on_inverted_bounds() {
		let config = GraphConfig { min_zoom: 2.0, max_zoom: 1.0, ..GraphConfig::default() };
		assert_eq!(config.clamp_zoom(1.5), 1.0);
	}
}
