//! Best-effort persistence of node positions and edges.
//!
//! Stored data is a cache, not a source of truth: unreadable entries are
//! logged and treated as absent, failed writes are logged and dropped.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::warn;
use serde::{Deserialize, Serialize};

use super::error::GraphError;
use super::types::{Edge, Point, TaskId};

const NODE_KEY_PREFIX: &str = "task_graph_node_";
const EDGES_KEY: &str = "task_graph_connections";

/// A string key-value store such as `window.localStorage`.
pub trait KeyValueStore {
	/// Reads a value, `None` if unset.
	fn get(&self, key: &str) -> Result<Option<String>, GraphError>;
	/// Writes a value.
	fn set(&self, key: &str, value: &str) -> Result<(), GraphError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
	fn get(&self, key: &str) -> Result<Option<String>, GraphError> {
		(**self).get(key)
	}

	fn set(&self, key: &str, value: &str) -> Result<(), GraphError> {
		(**self).set(key, value)
	}
}

/// `window.localStorage`.
pub struct BrowserStorage {
	storage: web_sys::Storage,
}

impl BrowserStorage {
	/// Opens the window's local storage, if the browser exposes one.
	pub fn open() -> Option<Self> {
		let storage = web_sys::window()?.local_storage().ok()??;
		Some(Self { storage })
	}
}

impl KeyValueStore for BrowserStorage {
	fn get(&self, key: &str) -> Result<Option<String>, GraphError> {
		self.storage.get_item(key).map_err(GraphError::storage)
	}

	fn set(&self, key: &str, value: &str) -> Result<(), GraphError> {
		self.storage.set_item(key, value).map_err(GraphError::storage)
	}
}

/// In-memory store, used when local storage is unavailable and in tests.
#[derive(Default)]
pub struct MemoryStore {
	entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
	/// Empty store.
	pub fn new() -> Self {
		Self::default()
	}
}

impl KeyValueStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<String>, GraphError> {
		Ok(self.entries.borrow().get(key).cloned())
	}

	fn set(&self, key: &str, value: &str) -> Result<(), GraphError> {
		self.entries.borrow_mut().insert(key.to_owned(), value.to_owned());
		Ok(())
	}
}

#[derive(Serialize, Deserialize)]
struct SavedPosition {
	x: f64,
	y: f64,
}

/// Typed view over a [`KeyValueStore`] with the editor's key layout.
pub struct GraphPersistence {
	store: Box<dyn KeyValueStore>,
}

impl GraphPersistence {
	/// Wraps a store.
	pub fn new(store: Box<dyn KeyValueStore>) -> Self {
		Self { store }
	}

	/// Saved position of a node, `None` if unset or unreadable.
	pub fn load_node_position(&self, id: TaskId) -> Option<Point> {
		let saved: SavedPosition = self.read(&node_key(id))?;
		Some(Point::new(saved.x, saved.y))
	}

	/// Saves a node position.
	pub fn save_position(&self, id: TaskId, pos: Point) {
		self.write(&node_key(id), &SavedPosition { x: pos.x, y: pos.y });
	}

	/// Saved edge list, empty if unset or unreadable.
	pub fn load_edges(&self) -> Vec<Edge> {
		self.read(EDGES_KEY).unwrap_or_default()
	}

	/// Replaces the saved edge list.
	pub fn save_edges(&self, edges: &[Edge]) {
		self.write(EDGES_KEY, edges);
	}

	fn read<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
		let raw = match self.store.get(key) {
			Ok(raw) => raw?,
			Err(err) => {
				warn!("Could not read {key}: {err}");
				return None;
			}
		};
		serde_json::from_str(&raw)
			.inspect_err(|err| warn!("Ignoring corrupt {key}: {err}"))
			.ok()
	}

	fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
		let result = serde_json::to_string(value)
			.map_err(GraphError::from)
			.and_then(|json| self.store.set(key, &json));
		if let Err(err) = result {
			warn!("Could not save {key}: {err}");
		}
	}
}

fn node_key(id: TaskId) -> String {
	format!("{NODE_KEY_PREFIX}{id}")
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::task_graph::types::EdgeKind;

	fn persistence() -> (GraphPersistence, Rc<MemoryStore>) {
		let mem = Rc::new(MemoryStore::new());
		(GraphPersistence::new(Box::new(mem.clone())), mem)
	}

	#[test]
	fn positions_use_per_task_keys() {
		let (p, mem) = persistence();
		p.save_position(TaskId(7), Point::new(1.5, -2.0));
		assert_eq!(
			mem.get("task_graph_node_7").unwrap().as_deref(),
			Some(r#"{"x":1.5,"y":-2.0}"#)
		);
		assert_eq!(p.load_node_position(TaskId(7)), Some(Point::new(1.5, -2.0)));
		assert_eq!(p.load_node_position(TaskId(8)), None);
	}

	#[test]
	fn corrupt_entries_read_as_absent() {
		let (p, mem) = persistence();
		mem.set("task_graph_node_1", "{not json").unwrap();
		mem.set("task_graph_connections", "[{\"from\":1}]").unwrap();
		assert_eq!(p.load_node_position(TaskId(1)), None);
		assert!(p.load_edges().is_empty());
	}

	#[test]
	fn untyped_stored_edges_are_kept() {
		let (p, mem) = persistence();
		mem.set(
			"task_graph_connections",
			r#"[{"from":1,"to":2},{"from":2,"to":3,"type":"depends"}]"#,
		)
		.unwrap();
		let edges = p.load_edges();
		assert_eq!(
			edges,
			vec![
				Edge { from: TaskId(1), to: TaskId(2), kind: EdgeKind::Relates },
				Edge { from: TaskId(2), to: TaskId(3), kind: EdgeKind::Depends },
			]
		);
	}

	#[test]
	fn edges_round_trip_through_store() {
		let (p, _mem) = persistence();
		let edges = vec![Edge { from: TaskId(1), to: TaskId(2), kind: EdgeKind::Depends }];
		p.save_edges(&edges);
		assert_eq!(p.load_edges(), edges);
	}
}
