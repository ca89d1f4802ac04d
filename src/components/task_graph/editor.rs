//! The editor model: store, viewport and the pointer interaction state
//! machine. Everything here is synchronous and browser-free; the canvas
//! component feeds it events and carries out the returned [`HostAction`]s.

use log::debug;

use super::config::GraphConfig;
use super::document::{GraphDocument, NodePosition};
use super::error::GraphError;
use super::hit_test::{self, HandleHit};
use super::layout::force_layout;
use super::storage::GraphPersistence;
use super::store::GraphStore;
use super::transform::Viewport;
use super::types::{Edge, EdgeKind, Point, Task, TaskId};

/// The single active pointer gesture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Interaction {
	/// Nothing in progress.
	Idle,
	/// Connection mode is on, no source chosen yet.
	ConnectArmed,
	/// A node follows the pointer, `offset` being the grab point relative to its centre.
	Dragging {
		/// Dragged node.
		node: TaskId,
		/// Grab offset in world units.
		offset: Point,
	},
	/// The canvas follows the pointer, keeping `anchor` under it.
	Panning {
		/// World point grabbed at press time.
		anchor: Point,
	},
	/// Connection mode with `source` chosen; a handle on another node completes the edge.
	Connecting {
		/// Source node.
		source: TaskId,
	},
}

/// Mouse button of a pointer event. Touches report [`PointerButton::Primary`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
	/// Left button or a touch.
	Primary,
	/// Right button.
	Secondary,
	/// Anything else.
	Other,
}

impl PointerButton {
	/// Maps `MouseEvent.button`.
	pub fn from_dom(button: i16) -> Self {
		match button {
			0 => Self::Primary,
			2 => Self::Secondary,
			_ => Self::Other,
		}
	}
}

/// A pointer event in canvas-relative screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
	/// Position relative to the canvas.
	pub screen: Point,
	/// Pressed button.
	pub button: PointerButton,
	/// Whether shift was held.
	pub shift: bool,
}

impl PointerInput {
	/// Primary button without modifiers, as a touch produces.
	pub fn touch(screen: Point) -> Self {
		Self {
			screen,
			button: PointerButton::Primary,
			shift: false,
		}
	}
}

/// Follow-up the host has to perform after an event.
#[derive(Clone, Debug, PartialEq)]
pub enum HostAction {
	/// An edge was created.
	EdgeCreated(Edge),
	/// Ask the user, then call [`GraphEditor::delete_edge`].
	ConfirmDeleteEdge(Edge),
	/// Ask the user, then call [`GraphEditor::delete_node`].
	ConfirmDeleteNode(TaskId),
	/// Open the task editor.
	OpenEditor(TaskId),
	/// Open the host's task context menu.
	NodeMenu {
		/// Task under the pointer.
		task: TaskId,
		/// Canvas-relative position of the click.
		screen: Point,
	},
	/// Open the edge context menu.
	EdgeMenu {
		/// Edge under the pointer.
		edge: Edge,
		/// Canvas-relative position of the click.
		screen: Point,
	},
}

/// Editor state shared by the event handlers and the renderer.
pub struct GraphEditor {
	store: GraphStore,
	viewport: Viewport,
	interaction: Interaction,
	connection_kind: EdgeKind,
	selected_edge: Option<Edge>,
	pointer: Option<Point>,
	size: (f64, f64),
	config: GraphConfig,
}

impl GraphEditor {
	/// Editor over the edges saved in `persistence`, with no nodes until the
	/// first [`GraphEditor::sync`]. Zoom bounds in `config` are normalised.
	pub fn new(persistence: GraphPersistence, config: GraphConfig) -> Self {
		let config = config.normalized();
		Self {
			store: GraphStore::new(persistence, &config),
			viewport: Viewport::default(),
			interaction: Interaction::Idle,
			connection_kind: EdgeKind::default(),
			selected_edge: None,
			pointer: None,
			size: config.fallback_size,
			config,
		}
	}

	/// Nodes and edges.
	pub fn store(&self) -> &GraphStore {
		&self.store
	}

	/// Current pan and zoom.
	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	/// The gesture in progress.
	pub fn interaction(&self) -> Interaction {
		self.interaction
	}

	/// Active configuration.
	pub fn config(&self) -> &GraphConfig {
		&self.config
	}

	/// Canvas size in pixels.
	pub fn size(&self) -> (f64, f64) {
		self.size
	}

	/// Records a new canvas size, used for placement, layout and fitting.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.size = (width, height);
	}

	/// Rebuilds nodes from the host's task list.
	pub fn sync(&mut self, tasks: &[Task]) {
		self.store.sync(tasks, self.size);
		if let Interaction::Dragging { node, .. } | Interaction::Connecting { source: node } =
			self.interaction
		{
			if self.store.node(node).is_none() {
				self.interaction = Interaction::Idle;
			}
		}
		self.prune_selected_edge();
	}

	/// Last pointer position in world space.
	pub fn pointer(&self) -> Option<Point> {
		self.pointer
	}

	/// Edge highlighted by a secondary-button press.
	pub fn selected_edge(&self) -> Option<Edge> {
		self.selected_edge
	}

	/// Relationship type used for new edges.
	pub fn connection_kind(&self) -> EdgeKind {
		self.connection_kind
	}

	/// Chooses the relationship type for the next edge.
	pub fn set_connection_kind(&mut self, kind: EdgeKind) {
		self.connection_kind = kind;
	}

	/// Whether connection mode is on, with or without a source.
	pub fn connection_mode(&self) -> bool {
		matches!(
			self.interaction,
			Interaction::ConnectArmed | Interaction::Connecting { .. }
		)
	}

	/// Source node of the connection being made.
	pub fn connection_source(&self) -> Option<TaskId> {
		match self.interaction {
			Interaction::Connecting { source } => Some(source),
			_ => None,
		}
	}

	/// Turns connection mode on, or cancels it when already on.
	pub fn toggle_connection_mode(&mut self) {
		if self.connection_mode() {
			self.cancel_connection();
		} else {
			self.interaction = Interaction::ConnectArmed;
		}
	}

	/// Leaves connection mode and clears the node selection.
	pub fn cancel_connection(&mut self) {
		self.interaction = Interaction::Idle;
		self.store.select(None);
	}

	/// Button press: a handle starts or completes a connection, a modified
	/// press on an edge selects it, a primary press on a node starts a drag
	/// and anywhere else starts a pan.
	pub fn pointer_down(&mut self, input: PointerInput) -> Option<HostAction> {
		let world = self.viewport.to_world(input.screen);
		self.pointer = Some(world);

		if input.button == PointerButton::Primary {
			if let Some(hit) = self.handle_at(world) {
				return self.press_handle(hit);
			}
		}

		let modified = input.button == PointerButton::Secondary
			|| (input.button == PointerButton::Primary && input.shift);
		if modified {
			if let Some(edge) = self.edge_at(world) {
				self.selected_edge = Some(edge);
				return (input.button == PointerButton::Primary)
					.then_some(HostAction::ConfirmDeleteEdge(edge));
			}
		}

		if input.button != PointerButton::Primary {
			return None;
		}
		self.selected_edge = None;
		if self.connection_mode() {
			return None;
		}
		match self.node_at(world) {
			Some(id) => {
				let center = self.store.center(id).unwrap_or(world);
				self.store.select(Some(id));
				self.interaction = Interaction::Dragging {
					node: id,
					offset: world - center,
				};
			}
			None => {
				self.store.select(None);
				self.interaction = Interaction::Panning { anchor: world };
			}
		}
		None
	}

	fn press_handle(&mut self, hit: HandleHit) -> Option<HostAction> {
		match self.interaction {
			Interaction::Connecting { source } if source == hit.node => None,
			Interaction::Connecting { source } => {
				let kind = self.connection_kind;
				let created = self.store.create_edge(source, hit.node, kind);
				self.cancel_connection();
				created.then_some(HostAction::EdgeCreated(Edge {
					from: source,
					to: hit.node,
					kind,
				}))
			}
			_ => {
				debug!("Connection source {}", hit.node);
				self.interaction = Interaction::Connecting { source: hit.node };
				self.store.select(Some(hit.node));
				None
			}
		}
	}

	/// Pointer motion: moves the dragged node or the canvas.
	pub fn pointer_move(&mut self, screen: Point) {
		let world = self.viewport.to_world(screen);
		self.pointer = Some(world);
		match self.interaction {
			Interaction::Dragging { node, offset } => self.store.move_node(node, world - offset),
			Interaction::Panning { anchor } => {
				self.viewport.pan = self.viewport.pan + (world - anchor) * self.viewport.zoom;
			}
			_ => {}
		}
	}

	/// Button release: ends a drag or pan. Releasing over neither a handle
	/// nor a node cancels a pending connection.
	pub fn pointer_up(&mut self, input: PointerInput) {
		match self.interaction {
			Interaction::Connecting { .. } if input.button == PointerButton::Primary => {
				let world = self.viewport.to_world(input.screen);
				if self.handle_at(world).is_none() && self.node_at(world).is_none() {
					self.cancel_connection();
				}
			}
			Interaction::Dragging { .. } | Interaction::Panning { .. } => {
				self.interaction = Interaction::Idle;
			}
			_ => {}
		}
	}

	/// Ends a drag or pan when the pointer leaves the canvas.
	pub fn pointer_leave(&mut self) {
		if let Interaction::Dragging { .. } | Interaction::Panning { .. } = self.interaction {
			self.interaction = Interaction::Idle;
		}
		self.pointer = None;
	}

	/// Asks the host to open the editor of the task under `screen`.
	pub fn double_click(&self, screen: Point) -> Option<HostAction> {
		self.node_at(self.viewport.to_world(screen))
			.map(HostAction::OpenEditor)
	}

	/// Right-click: edge menu, else node menu (or cancel connection mode).
	pub fn context_menu(&mut self, screen: Point) -> Option<HostAction> {
		let world = self.viewport.to_world(screen);
		if let Some(edge) = self.edge_at(world) {
			return Some(HostAction::EdgeMenu { edge, screen });
		}
		let task = self.node_at(world)?;
		if self.connection_mode() {
			self.cancel_connection();
			return None;
		}
		Some(HostAction::NodeMenu { task, screen })
	}

	/// One wheel tick: a fixed zoom step towards `delta_y`'s sign, anchored at `screen`.
	pub fn wheel(&mut self, screen: Point, delta_y: f64) {
		if delta_y == 0.0 || delta_y.is_nan() {
			return;
		}
		let step = if delta_y < 0.0 {
			self.config.zoom_step
		} else {
			-self.config.zoom_step
		};
		let zoom = self.config.clamp_zoom(self.viewport.zoom + step);
		self.viewport.zoom_at(screen, zoom);
	}

	/// `Delete` asks to remove the selected node; `Escape` cancels connection mode.
	pub fn key_down(&mut self, key: &str) -> Option<HostAction> {
		match key {
			"Delete" => self.store.selected().map(HostAction::ConfirmDeleteNode),
			"Escape" if self.connection_mode() => {
				self.cancel_connection();
				None
			}
			_ => None,
		}
	}

	/// Deletes a node and its edges. Callers confirm with the user first.
	pub fn delete_node(&mut self, id: TaskId) {
		self.store.delete_node(id);
		match self.interaction {
			Interaction::Dragging { node, .. } | Interaction::Connecting { source: node }
				if node == id =>
			{
				self.interaction = Interaction::Idle;
			}
			_ => {}
		}
		self.prune_selected_edge();
	}

	/// Deletes the edge joining `edge`'s endpoints.
	pub fn delete_edge(&mut self, edge: Edge) {
		self.store.delete_edge(edge.from, edge.to);
		self.prune_selected_edge();
	}

	/// Removes every edge. Callers confirm with the user first.
	pub fn clear_edges(&mut self) {
		self.store.clear_edges();
		self.selected_edge = None;
	}

	/// "From → Relation → To" line for the edge menu.
	pub fn describe_edge(&self, edge: Edge) -> Option<String> {
		let from = self.store.node(edge.from)?;
		let to = self.store.node(edge.to)?;
		Some(format!(
			"{} → {} → {}",
			from.task.title,
			edge.kind.relation_label(),
			to.task.title
		))
	}

	/// Runs the force-directed layout, persists the result and fits the view.
	pub fn auto_layout(&mut self) {
		if self.store.nodes().is_empty() {
			return;
		}
		let edges: Vec<Edge> = self.store.edges().copied().collect();
		let size = self.size;
		force_layout(self.store.nodes_mut(), &edges, size, &self.config.layout);
		self.store.save_all_positions();
		debug!("Laid out {} nodes", self.store.nodes().len());
		self.center_view();
	}

	/// Fits all nodes into the canvas.
	pub fn center_view(&mut self) {
		let config = &self.config;
		self.viewport.fit_to(
			self.store.nodes(),
			self.size,
			config.fit_padding,
			(config.min_zoom, config.max_zoom),
		);
	}

	/// Snapshot for download.
	pub fn export(&self) -> GraphDocument {
		GraphDocument {
			nodes: Some(
				self.store
					.nodes()
					.iter()
					.map(|n| NodePosition {
						task_id: n.id,
						x: n.x,
						y: n.y,
					})
					.collect(),
			),
			edges: Some(self.store.edges().copied().collect()),
			zoom: Some(self.viewport.zoom),
			pan: Some(self.viewport.pan),
		}
	}

	/// Applies an exported document and re-centres the view on the result.
	/// Nothing changes unless the whole document parses.
	///
	/// `zoom` and `pan` are applied first, so they only survive when there
	/// are no nodes to fit.
	pub fn import(&mut self, json: &str) -> Result<(), GraphError> {
		let doc = GraphDocument::parse(json)?;
		if let Some(nodes) = &doc.nodes {
			for pos in nodes {
				self.store.place(pos.task_id, Point::new(pos.x, pos.y));
			}
		}
		if let Some(edges) = doc.edges {
			self.store.replace_edges(edges);
			self.prune_selected_edge();
		}
		if let Some(zoom) = doc.zoom {
			self.viewport.zoom = self.config.clamp_zoom(zoom);
		}
		if let Some(pan) = doc.pan {
			self.viewport.pan = pan;
		}
		self.center_view();
		debug!("Imported graph document");
		Ok(())
	}

	fn handle_at(&self, world: Point) -> Option<HandleHit> {
		hit_test::handle_at(
			self.store.nodes(),
			world,
			self.config.handle_offset,
			self.config.handle_radius * self.config.handle_hit_factor,
		)
	}

	fn node_at(&self, world: Point) -> Option<TaskId> {
		hit_test::node_at(self.store.nodes(), world)
	}

	fn edge_at(&self, world: Point) -> Option<Edge> {
		hit_test::edge_at(
			self.store.edges(),
			|id| self.store.center(id),
			world,
			self.config.edge_hit_tolerance / self.viewport.zoom,
		)
	}

	fn prune_selected_edge(&mut self) {
		if let Some(sel) = self.selected_edge {
			if !self.store.edges().any(|e| e.connects(sel.from, sel.to)) {
				self.selected_edge = None;
			}
		}
	}
}
