//! Nodes and edges, kept consistent with the host's tasks and the
//! persistence layer.

use std::f64::consts::PI;

use log::{debug, info};

use super::config::GraphConfig;
use super::storage::GraphPersistence;
use super::types::{Edge, EdgeKind, Node, Point, Task, TaskId};

/// Owns the node set and the edge list, and mirrors every change into the
/// persistence layer.
///
/// Nodes are kept in insertion order. Every edge joins two present nodes;
/// edges of tasks that leave the canvas are deleted, not hidden.
pub struct GraphStore {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	persistence: GraphPersistence,
	node_size: (f64, f64),
	circle_radius_factor: f64,
}

impl GraphStore {
	/// Store with the edge list loaded from `persistence` and no nodes.
	pub fn new(persistence: GraphPersistence, config: &GraphConfig) -> Self {
		let edges = persistence.load_edges();
		debug!("Loaded {} stored connections", edges.len());
		Self {
			nodes: Vec::new(),
			edges,
			persistence,
			node_size: (config.node_width, config.node_height),
			circle_radius_factor: config.circle_radius_factor,
		}
	}

	/// Rebuilds the node set from `tasks`.
	///
	/// Completed tasks are skipped. Existing nodes keep their position and
	/// pick up the new task data; new nodes take their saved position, or a
	/// slot on a circle centred in the `viewport`. Edges touching a task that
	/// is no longer shown are deleted.
	pub fn sync(&mut self, tasks: &[Task], viewport: (f64, f64)) {
		let open: Vec<&Task> = tasks.iter().filter(|t| !t.completed).collect();
		let (w, h) = viewport;
		let center = Point::new(w / 2.0, h / 2.0);
		let radius = w.min(h) * self.circle_radius_factor;
		let step = 2.0 * PI / open.len().max(1) as f64;

		let mut previous = std::mem::take(&mut self.nodes);
		let mut nodes = Vec::with_capacity(open.len());
		for (index, task) in open.into_iter().enumerate() {
			if nodes.iter().any(|n: &Node| n.id == task.id) {
				continue;
			}
			if let Some(at) = previous.iter().position(|n| n.id == task.id) {
				let mut node = previous.swap_remove(at);
				node.task = task.clone();
				nodes.push(node);
				continue;
			}
			let pos = self.persistence.load_node_position(task.id).unwrap_or_else(|| {
				let angle = step * index as f64;
				center + Point::new(angle.cos(), angle.sin()) * radius
			});
			nodes.push(Node {
				id: task.id,
				x: pos.x,
				y: pos.y,
				width: self.node_size.0,
				height: self.node_size.1,
				selected: false,
				task: task.clone(),
			});
		}
		debug!("Synced {} nodes, dropped {}", nodes.len(), previous.len());
		self.nodes = nodes;

		let before = self.edges.len();
		let nodes = &self.nodes;
		self.edges
			.retain(|e| nodes.iter().any(|n| n.id == e.from) && nodes.iter().any(|n| n.id == e.to));
		if self.edges.len() != before {
			self.persistence.save_edges(&self.edges);
			info!("Dropped {} connections of removed tasks", before - self.edges.len());
		}
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	/// Node by id.
	pub fn node(&self, id: TaskId) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	/// Centre of a node by id.
	pub fn center(&self, id: TaskId) -> Option<Point> {
		self.node(id).map(Node::center)
	}

	/// Edges in creation order.
	pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
		self.edges.iter()
	}

	/// The selected node, if any.
	pub fn selected(&self) -> Option<TaskId> {
		self.nodes.iter().find(|n| n.selected).map(|n| n.id)
	}

	/// Selects `id` (or nothing) and deselects every other node.
	pub fn select(&mut self, id: Option<TaskId>) {
		for node in &mut self.nodes {
			node.selected = Some(node.id) == id;
		}
	}

	/// Moves a node and persists its position.
	pub fn move_node(&mut self, id: TaskId, pos: Point) {
		let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
			return;
		};
		node.x = pos.x;
		node.y = pos.y;
		self.persistence.save_position(id, pos);
	}

	/// Persists every node's current position.
	pub fn save_all_positions(&self) {
		for node in &self.nodes {
			self.persistence.save_position(node.id, node.center());
		}
	}

	/// Mutable access for bulk position updates such as auto-layout.
	/// Callers persist with [`GraphStore::save_all_positions`].
	pub(super) fn nodes_mut(&mut self) -> &mut [Node] {
		&mut self.nodes
	}

	/// Adds an edge unless it is a self-loop or the pair is already connected
	/// in either direction. Returns whether an edge was added.
	pub fn create_edge(&mut self, from: TaskId, to: TaskId, kind: EdgeKind) -> bool {
		if from == to || self.edges.iter().any(|e| e.connects(from, to)) {
			return false;
		}
		self.edges.push(Edge { from, to, kind });
		self.persistence.save_edges(&self.edges);
		info!("Connected {from} -> {to} ({})", kind.as_str());
		true
	}

	/// Removes the edge joining `{a, b}`, whatever its direction.
	pub fn delete_edge(&mut self, a: TaskId, b: TaskId) {
		self.edges.retain(|e| !e.connects(a, b));
		self.persistence.save_edges(&self.edges);
		info!("Disconnected {a} and {b}");
	}

	/// Removes a node and every edge touching it.
	pub fn delete_node(&mut self, id: TaskId) {
		self.edges.retain(|e| !e.touches(id));
		self.persistence.save_edges(&self.edges);
		self.nodes.retain(|n| n.id != id);
		info!("Deleted node {id}");
	}

	/// Removes every edge.
	pub fn clear_edges(&mut self) {
		self.edges.clear();
		self.persistence.save_edges(&self.edges);
		info!("Cleared all connections");
	}

	/// Replaces the edge list, as an import does.
	///
	/// Incoming edges go through the same rules as [`GraphStore::create_edge`]:
	/// self-loops are dropped and the first edge of each unordered pair wins.
	/// Edges whose endpoints are not on the canvas are dropped as well.
	pub fn replace_edges(&mut self, edges: impl IntoIterator<Item = Edge>) {
		let mut accepted: Vec<Edge> = Vec::new();
		for edge in edges {
			let known = self.node(edge.from).is_some() && self.node(edge.to).is_some();
			if known && edge.from != edge.to && !accepted.iter().any(|e| e.connects(edge.from, edge.to)) {
				accepted.push(edge);
			}
		}
		self.edges = accepted;
		self.persistence.save_edges(&self.edges);
		debug!("Replaced connections with {} edges", self.edges.len());
	}

	/// Stores a position for `id` and applies it if the node exists.
	pub fn place(&mut self, id: TaskId, pos: Point) {
		if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
			node.x = pos.x;
			node.y = pos.y;
		}
		self.persistence.save_position(id, pos);
	}
}

#[cfg(test)]
pub(super) mod tests {
	use std::rc::Rc;

	use super::*;
	use crate::components::task_graph::storage::{KeyValueStore, MemoryStore};

	pub(in crate::components::task_graph) fn store_with(mem: &Rc<MemoryStore>) -> GraphStore {
		GraphStore::new(GraphPersistence::new(Box::new(mem.clone())), &GraphConfig::default())
	}

	fn tasks(ids: &[i64]) -> Vec<Task> {
		ids.iter().map(|&id| Task::new(id, format!("Task {id}"))).collect()
	}

	#[test]
	fn sync_places_open_tasks_on_circle() {
		let mem = Rc::new(MemoryStore::new());
		let mut store = store_with(&mem);
		store.sync(&tasks(&[1, 2]), (800.0, 600.0));

		assert_eq!(store.nodes().len(), 2);
		assert_eq!(store.edges().count(), 0);
		let center = Point::new(400.0, 300.0);
		for node in store.nodes() {
			let r = node.center().distance(center);
			assert!((r - 180.0).abs() < 1e-9);
		}
		assert_ne!(store.nodes()[0].center(), store.nodes()[1].center());
	}

	#[test]
	fn sync_keeps_one_node_per_open_task() {
		let mem = Rc::new(MemoryStore::new());
		let mut store = store_with(&mem);
		let mut list = tasks(&[1, 2, 3, 3]);
		list[1].completed = true;
		store.sync(&list, (800.0, 600.0));

		let ids: Vec<_> = store.nodes().iter().map(|n| n.id).collect();
		assert_eq!(ids, vec![TaskId(1), TaskId(3)]);
	}

	#[test]
	fn sync_preserves_existing_and_saved_positions() {
		let mem = Rc::new(MemoryStore::new());
		mem.set("task_graph_node_2", r#"{"x":5.0,"y":6.0}"#).unwrap();
		let mut store = store_with(&mem);
		store.sync(&tasks(&[1]), (800.0, 600.0));
		store.move_node(TaskId(1), Point::new(-30.0, 40.0));

		store.sync(&tasks(&[1, 2]), (800.0, 600.0));
		assert_eq!(store.center(TaskId(1)), Some(Point::new(-30.0, 40.0)));
		assert_eq!(store.center(TaskId(2)), Some(Point::new(5.0, 6.0)));
	}

	#[test]
	fn corrupt_saved_position_falls_back_to_circle() {
		let mem = Rc::new(MemoryStore::new());
		mem.set("task_graph_node_1", "garbage").unwrap();
		let mut store = store_with(&mem);
		store.sync(&tasks(&[1]), (800.0, 600.0));
		assert_eq!(store.center(TaskId(1)), Some(Point::new(580.0, 300.0)));
	}

	#[test]
	fn duplicate_and_reversed_edges_are_rejected() {
		let mem = Rc::new(MemoryStore::new());
		let mut store = store_with(&mem);
		store.sync(&tasks(&[1, 2]), (800.0, 600.0));

		assert!(store.create_edge(TaskId(1), TaskId(2), EdgeKind::Depends));
		assert!(!store.create_edge(TaskId(2), TaskId(1), EdgeKind::Relates));
		assert!(!store.create_edge(TaskId(1), TaskId(1), EdgeKind::Relates));

		let edges: Vec<_> = store.edges().copied().collect();
		assert_eq!(edges.len(), 1);
		assert_eq!(edges[0].kind, EdgeKind::Depends);
	}

	#[test]
	fn delete_node_cascades_to_its_edges_only() {
		let mem = Rc::new(MemoryStore::new());
		let mut store = store_with(&mem);
		store.sync(&tasks(&[1, 2, 3]), (800.0, 600.0));
		store.create_edge(TaskId(1), TaskId(2), EdgeKind::Relates);
		store.create_edge(TaskId(3), TaskId(1), EdgeKind::PartOf);
		store.create_edge(TaskId(2), TaskId(3), EdgeKind::Depends);

		store.delete_node(TaskId(1));
		assert!(store.node(TaskId(1)).is_none());
		let edges: Vec<_> = store.edges().copied().collect();
		assert_eq!(edges, vec![Edge { from: TaskId(2), to: TaskId(3), kind: EdgeKind::Depends }]);

		let reloaded = store_with(&mem);
		assert_eq!(reloaded.edges.len(), 1);
	}

	#[test]
	fn sync_deletes_edges_of_removed_tasks() {
		let mem = Rc::new(MemoryStore::new());
		let mut store = store_with(&mem);
		store.sync(&tasks(&[1, 2, 3]), (800.0, 600.0));
		store.create_edge(TaskId(1), TaskId(2), EdgeKind::Relates);
		store.create_edge(TaskId(1), TaskId(3), EdgeKind::Depends);

		store.sync(&tasks(&[1, 3]), (800.0, 600.0));
		store.sync(&tasks(&[1, 2, 3]), (800.0, 600.0));
		let edges: Vec<_> = store.edges().copied().collect();
		assert_eq!(edges, vec![Edge { from: TaskId(1), to: TaskId(3), kind: EdgeKind::Depends }]);

		let mut reloaded = store_with(&mem);
		assert_eq!(reloaded.edges().count(), 1);
		reloaded.sync(&tasks(&[1, 2, 3]), (800.0, 600.0));
		assert_eq!(reloaded.edges().copied().collect::<Vec<_>>(), edges);
	}

	#[test]
	fn replaced_edges_follow_creation_rules() {
		let mem = Rc::new(MemoryStore::new());
		let mut store = store_with(&mem);
		store.sync(&tasks(&[1, 2]), (800.0, 600.0));
		store.replace_edges([
			Edge { from: TaskId(1), to: TaskId(2), kind: EdgeKind::Relates },
			Edge { from: TaskId(2), to: TaskId(1), kind: EdgeKind::Depends },
			Edge { from: TaskId(1), to: TaskId(1), kind: EdgeKind::Relates },
			Edge { from: TaskId(2), to: TaskId(7), kind: EdgeKind::PartOf },
		]);

		let expected = vec![Edge { from: TaskId(1), to: TaskId(2), kind: EdgeKind::Relates }];
		assert_eq!(store.edges().copied().collect::<Vec<_>>(), expected);
		assert_eq!(store_with(&mem).edges().copied().collect::<Vec<_>>(), expected);
	}

	#[test]
	fn move_persists_every_call() {
		let mem = Rc::new(MemoryStore::new());
		let mut store = store_with(&mem);
		store.sync(&tasks(&[1]), (800.0, 600.0));
		store.move_node(TaskId(1), Point::new(500.0, 500.0));
		assert_eq!(
			mem.get("task_graph_node_1").unwrap().as_deref(),
			Some(r#"{"x":500.0,"y":500.0}"#)
		);
	}
}
