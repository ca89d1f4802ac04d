//! On-demand force-directed layout.

use std::f64::consts::TAU;

use super::config::LayoutParams;
use super::types::{Edge, Node, Point};

/// Spring-electrical layout over `nodes`, run for a fixed number of passes.
///
/// Every ordered pair repels with `k² / d`, every edge attracts its endpoints
/// with `d² / k`, where `k = sqrt(area / n)`. Forces are applied directly as
/// position deltas; there is no velocity term. Edges with an endpoint outside
/// `nodes` are ignored.
pub fn force_layout(nodes: &mut [Node], edges: &[Edge], viewport: (f64, f64), params: &LayoutParams) {
	let n = nodes.len();
	if n == 0 {
		return;
	}
	let k = (viewport.0 * viewport.1 / n as f64).sqrt();
	let pairs: Vec<(usize, usize)> = edges
		.iter()
		.filter_map(|e| Some((index_of(nodes, e.from)?, index_of(nodes, e.to)?)))
		.collect();

	for _ in 0..params.iterations {
		let mut forces = vec![Point::default(); n];

		for i in 0..n {
			for j in 0..n {
				if i == j {
					continue;
				}
				let (dir, dist) = direction(nodes[i].center(), nodes[j].center(), i, j);
				forces[i] = forces[i] - dir * (k * k / dist * params.repulsion_damping);
			}
		}

		for &(from, to) in &pairs {
			if from == to {
				continue;
			}
			let (dir, dist) = direction(nodes[from].center(), nodes[to].center(), from, to);
			let pull = dir * (dist * dist / k * params.attraction_damping);
			forces[from] = forces[from] + pull;
			forces[to] = forces[to] - pull;
		}

		for (node, force) in nodes.iter_mut().zip(&forces) {
			node.x += force.x;
			node.y += force.y;
		}
	}
}

fn index_of(nodes: &[Node], id: super::types::TaskId) -> Option<usize> {
	nodes.iter().position(|n| n.id == id)
}

/// Unit vector from `a` to `b` and their distance. Coincident points get a
/// fixed per-pair direction so they can still be pushed apart.
fn direction(a: Point, b: Point, i: usize, j: usize) -> (Point, f64) {
	let delta = b - a;
	let dist = delta.length();
	if dist > 1e-9 {
		return (delta / dist, dist);
	}
	let (lo, hi) = (i.min(j) as f64, i.max(j) as f64);
	let angle = (lo * 0.618_034 + hi * 0.414_214) * TAU;
	let dir = Point::new(angle.cos(), angle.sin());
	(if i < j { dir } else { dir * -1.0 }, 1.0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::task_graph::types::{EdgeKind, Task, TaskId};

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

	fn edge(from: i64, to: i64) -> Edge {
		Edge { from: TaskId(from), to: TaskId(to), kind: EdgeKind::Relates }
	}

	fn spread(nodes: &[Node]) -> f64 {
		nodes[0].center().distance(nodes[1].center())
	}

	#[test]
	fn unconnected_nodes_are_pushed_apart() {
		let mut nodes = vec![node(1, 380.0, 300.0), node(2, 420.0, 300.0)];
		force_layout(&mut nodes, &[], (800.0, 600.0), &LayoutParams::default());
		assert!(spread(&nodes) > 40.0);
		assert!(nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));
	}

	#[test]
	fn edges_pull_nodes_closer_than_without() {
		let start = vec![node(1, 300.0, 300.0), node(2, 500.0, 300.0), node(3, 400.0, 450.0)];
		let params = LayoutParams::default();

		let mut free = start.clone();
		force_layout(&mut free, &[], (800.0, 600.0), &params);
		let mut linked = start;
		force_layout(&mut linked, &[edge(1, 2)], (800.0, 600.0), &params);

		assert!(spread(&linked) < spread(&free));
	}

	#[test]
	fn coincident_nodes_separate() {
		let mut nodes = vec![node(1, 100.0, 100.0), node(2, 100.0, 100.0)];
		force_layout(&mut nodes, &[edge(1, 2)], (800.0, 600.0), &LayoutParams::default());
		assert!(spread(&nodes) > 1.0);
	}

	#[test]
	fn dangling_edges_are_ignored() {
		let mut nodes = vec![node(1, 0.0, 0.0)];
		force_layout(&mut nodes, &[edge(1, 9)], (800.0, 600.0), &LayoutParams::default());
		assert_eq!(nodes[0].center(), Point::new(0.0, 0.0));
	}
}
