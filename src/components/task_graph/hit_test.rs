//! World-space hit-testing against nodes, their connection handles and edges.
//!
//! Every query takes a world point; callers convert screen input through
//! [`Viewport::to_world`](super::transform::Viewport::to_world) first.

use super::types::{Edge, Node, Point, TaskId};

/// Side of the node a connection handle sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleSide {
	/// Above the node.
	Top,
	/// Right of the node.
	Right,
	/// Below the node.
	Bottom,
	/// Left of the node.
	Left,
}

/// A connection handle centre.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Handle {
	/// Handle centre in world space.
	pub pos: Point,
	/// Which side of the node it belongs to.
	pub side: HandleSide,
}

/// A handle hit, naming the node that owns the handle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandleHit {
	/// Owning node.
	pub node: TaskId,
	/// The handle that was hit.
	pub handle: Handle,
}

/// The four handles of `node`, each `offset` outside its box.
pub fn handles(node: &Node, offset: f64) -> [Handle; 4] {
	let (hw, hh) = (node.width / 2.0, node.height / 2.0);
	[
		Handle {
			pos: Point::new(node.x, node.y - hh - offset),
			side: HandleSide::Top,
		},
		Handle {
			pos: Point::new(node.x + hw + offset, node.y),
			side: HandleSide::Right,
		},
		Handle {
			pos: Point::new(node.x, node.y + hh + offset),
			side: HandleSide::Bottom,
		},
		Handle {
			pos: Point::new(node.x - hw - offset, node.y),
			side: HandleSide::Left,
		},
	]
}

/// First handle within `hit_radius` of `p`.
pub fn handle_at<'a>(
	nodes: impl IntoIterator<Item = &'a Node>,
	p: Point,
	offset: f64,
	hit_radius: f64,
) -> Option<HandleHit> {
	nodes.into_iter().find_map(|node| {
		handles(node, offset)
			.into_iter()
			.find(|h| h.pos.distance(p) <= hit_radius)
			.map(|handle| HandleHit {
				node: node.id,
				handle,
			})
	})
}

/// Node whose box contains `p`. Later nodes win overlaps.
pub fn node_at<'a>(nodes: impl IntoIterator<Item = &'a Node>, p: Point) -> Option<TaskId> {
	nodes
		.into_iter()
		.filter(|n| n.contains(p))
		.last()
		.map(|n| n.id)
}

/// First edge whose segment passes within `threshold` of `p`.
///
/// `lookup` resolves an endpoint id to its centre; edges with an unresolved
/// endpoint are skipped.
pub fn edge_at<'a>(
	edges: impl IntoIterator<Item = &'a Edge>,
	lookup: impl Fn(TaskId) -> Option<Point>,
	p: Point,
	threshold: f64,
) -> Option<Edge> {
	edges.into_iter().copied().find(|e| {
		match (lookup(e.from), lookup(e.to)) {
			(Some(a), Some(b)) => point_to_segment_distance(p, a, b) < threshold,
			_ => false,
		}
	})
}

/// Distance from `p` to the segment `a`–`b`. A degenerate segment is a point.
pub fn point_to_segment_distance(p: Point, a: Point, b: Point) -> f64 {
	let (ap, ab) = (p - a, b - a);
	let len_sq = ab.x * ab.x + ab.y * ab.y;
	if len_sq == 0.0 {
		return p.distance(a);
	}
	let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
	p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::task_graph::types::{EdgeKind, Task};

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
	fn handles_sit_outside_box() {
		let n = node(1, 0.0, 0.0);
		let hs = handles(&n, 15.0);
		assert_eq!(hs[0].pos, Point::new(0.0, -55.0));
		assert_eq!(hs[1].pos, Point::new(75.0, 0.0));
		assert_eq!(hs[2].pos, Point::new(0.0, 55.0));
		assert_eq!(hs[3].pos, Point::new(-75.0, 0.0));
	}

	#[test]
	fn handle_hit_uses_radius() {
		let nodes = [node(1, 0.0, 0.0), node(2, 400.0, 0.0)];
		let hit = handle_at(&nodes, Point::new(475.0 + 11.0, 0.0), 15.0, 12.0).unwrap();
		assert_eq!(hit.node, TaskId(2));
		assert_eq!(hit.handle.side, HandleSide::Right);
		assert!(handle_at(&nodes, Point::new(475.0 + 13.0, 0.0), 15.0, 12.0).is_none());
	}

	#[test]
	fn node_hit_prefers_later_insertion() {
		let nodes = [node(1, 0.0, 0.0), node(2, 50.0, 0.0)];
		assert_eq!(node_at(&nodes, Point::new(30.0, 0.0)), Some(TaskId(2)));
		assert_eq!(node_at(&nodes, Point::new(-50.0, 0.0)), Some(TaskId(1)));
		assert_eq!(node_at(&nodes, Point::new(0.0, 200.0)), None);
	}

	#[test]
	fn segment_distance_clamps_to_endpoints() {
		let (a, b) = (Point::new(0.0, 0.0), Point::new(10.0, 0.0));
		assert_eq!(point_to_segment_distance(Point::new(5.0, 3.0), a, b), 3.0);
		assert_eq!(point_to_segment_distance(Point::new(-4.0, 3.0), a, b), 5.0);
		assert_eq!(point_to_segment_distance(Point::new(13.0, 4.0), a, b), 5.0);
		assert_eq!(point_to_segment_distance(Point::new(3.0, 4.0), a, a), 5.0);
	}

	#[test]
	fn edge_hit_skips_unresolved_endpoints() {
		let edges = [
			Edge { from: TaskId(1), to: TaskId(9), kind: EdgeKind::Relates },
			Edge { from: TaskId(1), to: TaskId(2), kind: EdgeKind::Depends },
		];
		let lookup = |id: TaskId| match id.0 {
			1 => Some(Point::new(0.0, 0.0)),
			2 => Some(Point::new(100.0, 0.0)),
			_ => None,
		};
		let hit = edge_at(&edges, lookup, Point::new(50.0, 5.0), 8.0).unwrap();
		assert_eq!(hit.kind, EdgeKind::Depends);
		assert!(edge_at(&edges, lookup, Point::new(50.0, 9.0), 8.0).is_none());
	}
}
