//! Screen/world coordinate mapping.

use super::types::{Node, Point};

/// Pan offset and zoom factor mapping world space onto the canvas.
///
/// World `(wx, wy)` lands on screen at `(wx * zoom + pan.x, wy * zoom + pan.y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	/// Screen-space offset of the world origin.
	pub pan: Point,
	/// Scale factor, kept within the configured bounds by the callers.
	pub zoom: f64,
}

impl Default for Viewport {
	fn default() -> Self {
		Self {
			pan: Point::default(),
			zoom: 1.0,
		}
	}
}

impl Viewport {
	/// Screen pixel to world coordinate.
	pub fn to_world(&self, screen: Point) -> Point {
		(screen - self.pan) / self.zoom
	}

	/// World coordinate to screen pixel.
	pub fn to_screen(&self, world: Point) -> Point {
		self.pan + world * self.zoom
	}

	/// Sets a new zoom while keeping the world point under `anchor` fixed.
	pub fn zoom_at(&mut self, anchor: Point, new_zoom: f64) {
		let factor = new_zoom / self.zoom;
		self.pan = anchor - (anchor - self.pan) * factor;
		self.zoom = new_zoom;
	}

	/// Adjusts zoom and pan so the bounding box of `nodes` fits a
	/// `width × height` surface with `padding` on each side.
	///
	/// Zoom is clamped to `[min_zoom, max_zoom]` before the box is centred.
	/// Does nothing when `nodes` is empty.
	pub fn fit_to<'a>(
		&mut self,
		nodes: impl IntoIterator<Item = &'a Node>,
		(width, height): (f64, f64),
		padding: f64,
		(min_zoom, max_zoom): (f64, f64),
	) {
		let Some((min, max)) = bounds(nodes) else {
			return;
		};
		let (box_w, box_h) = (max.x - min.x, max.y - min.y);
		let scale_x = (width - padding * 2.0) / box_w;
		let scale_y = (height - padding * 2.0) / box_h;
		let zoom = scale_x.min(scale_y).min(max_zoom).max(min_zoom);

		let center = (min + max) / 2.0;
		self.zoom = zoom;
		self.pan = Point::new(width / 2.0, height / 2.0) - center * zoom;
	}
}

/// World-space bounding box of the node rectangles.
pub fn bounds<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Option<(Point, Point)> {
	nodes.into_iter().fold(None, |acc, n| {
		let (hw, hh) = (n.width / 2.0, n.height / 2.0);
		let (lo, hi) = (Point::new(n.x - hw, n.y - hh), Point::new(n.x + hw, n.y + hh));
		Some(match acc {
			None => (lo, hi),
			Some((min, max)) => (
				Point::new(min.x.min(lo.x), min.y.min(lo.y)),
				Point::new(max.x.max(hi.x), max.y.max(hi.y)),
			),
		})
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::task_graph::types::{Task, TaskId};

	fn close(a: Point, b: Point) -> bool {
		(a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
	}

	fn node(id: i64, x: f64, y: f64) -> Node {
		Node {
			id: TaskId(id),
			x,
			y,
			width: 120.0,
			height: 80.0,
			selected: false,
			task: Task::new(id, "t"),
		}
	}

	#[test]
	fn screen_world_round_trip() {
		let vp = Viewport {
			pan: Point::new(37.5, -12.25),
			zoom: 1.7,
		};
		for p in [Point::new(0.0, 0.0), Point::new(413.0, 97.5), Point::new(-20.0, 900.0)] {
			assert!(close(vp.to_screen(vp.to_world(p)), p));
		}
	}

	#[test]
	fn zoom_keeps_anchor_fixed() {
		let mut vp = Viewport {
			pan: Point::new(10.0, 20.0),
			zoom: 1.0,
		};
		let anchor = Point::new(300.0, 200.0);
		let before = vp.to_world(anchor);
		vp.zoom_at(anchor, 1.6);
		assert!(close(vp.to_world(anchor), before));
		assert_eq!(vp.zoom, 1.6);
	}

	#[test]
	fn fit_centres_and_contains_box() {
		let nodes = [node(1, -400.0, 0.0), node(2, 400.0, 50.0)];
		let mut vp = Viewport::default();
		vp.fit_to(&nodes, (800.0, 600.0), 50.0, (0.5, 2.0));

		let (min, max) = bounds(&nodes).unwrap();
		let (lo, hi) = (vp.to_screen(min), vp.to_screen(max));
		assert!(lo.x >= 0.0 && lo.y >= 0.0);
		assert!(hi.x <= 800.0 && hi.y <= 600.0);
		assert!(close((lo + hi) / 2.0, Point::new(400.0, 300.0)));
	}

	#[test]
	fn fit_respects_zoom_bounds() {
		let nodes = [node(1, 0.0, 0.0)];
		let mut vp = Viewport::default();
		vp.fit_to(&nodes, (800.0, 600.0), 50.0, (0.5, 2.0));
		assert_eq!(vp.zoom, 2.0);

		let far = [node(1, -10_000.0, 0.0), node(2, 10_000.0, 0.0)];
		vp.fit_to(&far, (800.0, 600.0), 50.0, (0.5, 2.0));
		assert_eq!(vp.zoom, 0.5);
	}

	#[test]
	fn fit_ignores_empty_graph() {
		let mut vp = Viewport::default();
		vp.fit_to(&[] as &[Node], (800.0, 600.0), 50.0, (0.5, 2.0));
		assert_eq!(vp, Viewport::default());
	}
}
