//! Domain types shared by the editor modules.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of the task a node belongs to. Stable across sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl fmt::Display for TaskId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Task priority as supplied by the host; drives the node border colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
	/// Low priority.
	Low,
	/// Medium priority.
	Medium,
	/// High priority.
	High,
}

/// A task record as handed over by the host application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
	/// Task identifier.
	pub id: TaskId,
	/// Title drawn inside the node.
	pub title: String,
	/// Due date, `YYYY-MM-DD` optionally followed by a time part.
	#[serde(default)]
	pub due_date: Option<String>,
	/// Priority, `None` meaning normal.
	#[serde(default)]
	pub priority: Option<Priority>,
	/// Completed tasks never become nodes.
	#[serde(default)]
	pub completed: bool,
}

impl Task {
	/// Open task with only a title.
	pub fn new(id: i64, title: impl Into<String>) -> Self {
		Self {
			id: TaskId(id),
			title: title.into(),
			due_date: None,
			priority: None,
			completed: false,
		}
	}
}

/// Relationship type of an edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
	/// Loose relation (default).
	#[default]
	Relates,
	/// `from` depends on `to`.
	Depends,
	/// `from` is part of `to`.
	PartOf,
}

impl EdgeKind {
	/// All kinds in toolbar order.
	pub const ALL: [EdgeKind; 3] = [EdgeKind::Relates, EdgeKind::Depends, EdgeKind::PartOf];

	/// Wire name, as stored and exported.
	pub fn as_str(self) -> &'static str {
		match self {
			EdgeKind::Relates => "relates",
			EdgeKind::Depends => "depends",
			EdgeKind::PartOf => "part_of",
		}
	}

	/// Parses a wire name.
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|k| k.as_str() == name)
	}

	/// Human readable relation used in the edge menu.
	pub fn relation_label(self) -> &'static str {
		match self {
			EdgeKind::Relates => "Related To",
			EdgeKind::Depends => "Depends On",
			EdgeKind::PartOf => "Part Of",
		}
	}
}

/// A typed relationship between two tasks.
///
/// Existence is undirected (`a→b` and `b→a` are the same edge) while
/// rendering is directed: the arrowhead points at `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
	/// Source task.
	pub from: TaskId,
	/// Target task.
	pub to: TaskId,
	/// Relationship type. Missing or unrecognised types read as the default.
	#[serde(rename = "type", default, deserialize_with = "lenient_kind")]
	pub kind: EdgeKind,
}

fn lenient_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<EdgeKind, D::Error> {
	let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
	Ok(raw
		.as_ref()
		.and_then(serde_json::Value::as_str)
		.and_then(EdgeKind::from_name)
		.unwrap_or_default())
}

impl Edge {
	/// Whether this edge joins the unordered pair `{a, b}`.
	pub fn connects(&self, a: TaskId, b: TaskId) -> bool {
		(self.from == a && self.to == b) || (self.from == b && self.to == a)
	}

	/// Whether either endpoint is `id`.
	pub fn touches(&self, id: TaskId) -> bool {
		self.from == id || self.to == id
	}
}

/// A 2D point or vector, in either world or screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// New point.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Euclidean length when viewed as a vector.
	pub fn length(self) -> f64 {
		(self.x * self.x + self.y * self.y).sqrt()
	}

	/// Distance to another point.
	pub fn distance(self, other: Point) -> f64 {
		(self - other).length()
	}
}

impl Add for Point {
	type Output = Point;
	fn add(self, rhs: Point) -> Point {
		Point::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl Sub for Point {
	type Output = Point;
	fn sub(self, rhs: Point) -> Point {
		Point::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl Mul<f64> for Point {
	type Output = Point;
	fn mul(self, rhs: f64) -> Point {
		Point::new(self.x * rhs, self.y * rhs)
	}
}

impl Div<f64> for Point {
	type Output = Point;
	fn div(self, rhs: f64) -> Point {
		Point::new(self.x / rhs, self.y / rhs)
	}
}

/// A task drawn on the canvas. `x`/`y` is the centre in world space.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Owning task id.
	pub id: TaskId,
	/// Centre x.
	pub x: f64,
	/// Centre y.
	pub y: f64,
	/// Visual width.
	pub width: f64,
	/// Visual height.
	pub height: f64,
	/// Selection flag, at most one node is selected at a time.
	pub selected: bool,
	/// Latest copy of the owning task, used for drawing.
	pub task: Task,
}

impl Node {
	/// Centre as a point.
	pub fn center(&self) -> Point {
		Point::new(self.x, self.y)
	}

	/// Whether `p` lies inside the node's bounding box (edges inclusive).
	pub fn contains(&self, p: Point) -> bool {
		let (hw, hh) = (self.width / 2.0, self.height / 2.0);
		p.x >= self.x - hw && p.x <= self.x + hw && p.y >= self.y - hh && p.y <= self.y + hh
	}
}

/// Severity passed to the host's notification collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
	/// Operation succeeded.
	Success,
	/// Operation failed.
	Error,
	/// Neutral information.
	Info,
}
