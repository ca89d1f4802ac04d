//! The export/import file format.

use serde::{Deserialize, Serialize};

use super::error::GraphError;
use super::types::{Edge, Point, TaskId};

/// Saved position of one node inside an exported document.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
	/// Task the position belongs to.
	#[serde(rename = "taskId")]
	pub task_id: TaskId,
	/// Centre x.
	pub x: f64,
	/// Centre y.
	pub y: f64,
}

/// Export/import shape: `{nodes, edges, zoom, pan}`.
///
/// Every field is optional on import; absent fields leave the matching
/// editor state untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
	/// Node positions.
	pub nodes: Option<Vec<NodePosition>>,
	/// Edge list, replacing the current one on import.
	pub edges: Option<Vec<Edge>>,
	/// Zoom factor.
	pub zoom: Option<f64>,
	/// Pan offset.
	pub pan: Option<Point>,
}

impl GraphDocument {
	/// Parses a whole document before anything is applied.
	pub fn parse(json: &str) -> Result<Self, GraphError> {
		Ok(serde_json::from_str(json)?)
	}

	/// Pretty-printed JSON, as offered for download.
	pub fn to_json(&self) -> Result<String, GraphError> {
		Ok(serde_json::to_string_pretty(self)?)
	}
}
