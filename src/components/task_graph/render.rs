//! Immediate-mode canvas drawing, one full redraw per animation frame.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::editor::GraphEditor;
use super::hit_test::handles;
use super::types::{EdgeKind, Node, Point, Priority, TaskId};

const SELECTED_EDGE_COLOR: &str = "#EF4444";
const PREVIEW_COLOR: &str = "#A9C6FF";
const TITLE_FONT: &str = "bold 12px -apple-system, BlinkMacSystemFont, \"Segoe UI\", Roboto, sans-serif";
const CAPTION_FONT: &str = "10px -apple-system, BlinkMacSystemFont, \"Segoe UI\", Roboto, sans-serif";
const ARROW_LENGTH: f64 = 10.0;
const ARROW_ANGLE: f64 = PI / 6.0;
const TITLE_PADDING: f64 = 16.0;
const ELLIPSIS: &str = "...";
const MONTHS: [&str; 12] = [
	"Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Colour-coding of a connection handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleState {
	/// Connection mode is off.
	Neutral,
	/// This node is the connection source.
	Source,
	/// Connection mode is on and this node can be a target.
	Target,
}

/// Stroke colour for an unselected edge.
pub fn edge_color(kind: EdgeKind) -> &'static str {
	match kind {
		EdgeKind::Relates => "#A9C6FF",
		EdgeKind::Depends => "#F59E0B",
		EdgeKind::PartOf => "#8B5CF6",
	}
}

/// Node border colour by task priority.
pub fn priority_border(priority: Option<Priority>) -> &'static str {
	match priority {
		Some(Priority::High) => "#EF4444",
		Some(Priority::Medium) => "#F59E0B",
		Some(Priority::Low) => "#10B981",
		None => "#E4E4E6",
	}
}

fn handle_color(state: HandleState) -> &'static str {
	match state {
		HandleState::Neutral => "#A9C6FF",
		HandleState::Source => "#F59E0B",
		HandleState::Target => "#10B981",
	}
}

fn node_background(node: &Node, source: Option<TaskId>) -> &'static str {
	if source == Some(node.id) {
		"#FFF3D6"
	} else if node.selected {
		"#F0F4FF"
	} else {
		"#FFFFFF"
	}
}

/// Shortens `title` with an ellipsis until `measure` says it fits `max_width`.
pub fn truncate_title(title: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> String {
	if measure(title) <= max_width {
		return title.to_owned();
	}
	let mut cut = title.to_owned();
	while !cut.is_empty() && measure(&format!("{cut}{ELLIPSIS}")) > max_width {
		cut.pop();
	}
	cut.push_str(ELLIPSIS);
	cut
}

/// `"2024-03-05"` (optionally followed by a time) as `"Mar 5"`.
pub fn due_caption(due_date: &str) -> Option<String> {
	let date = due_date.get(..10)?;
	let mut parts = date.split('-');
	let (_year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
	let month: usize = month.parse().ok()?;
	let day: u32 = day.parse().ok()?;
	if !(1..=31).contains(&day) {
		return None;
	}
	Some(format!("{} {day}", MONTHS.get(month.checked_sub(1)?)?))
}

/// Point where the ray from `node`'s centre towards `from` leaves its box.
pub fn box_exit(node: &Node, from: Point) -> Point {
	let center = node.center();
	let delta = from - center;
	if delta.x == 0.0 && delta.y == 0.0 {
		return center;
	}
	let tx = if delta.x == 0.0 { f64::INFINITY } else { node.width / 2.0 / delta.x.abs() };
	let ty = if delta.y == 0.0 { f64::INFINITY } else { node.height / 2.0 / delta.y.abs() };
	center + delta * tx.min(ty).min(1.0)
}

/// Full redraw: clear, apply pan/zoom, edges, nodes, handles.
pub fn render(editor: &GraphEditor, ctx: &CanvasRenderingContext2d) {
	let (width, height) = editor.size();
	let viewport = editor.viewport();
	ctx.clear_rect(0.0, 0.0, width, height);
	ctx.save();
	let _ = ctx.translate(viewport.pan.x, viewport.pan.y);
	let _ = ctx.scale(viewport.zoom, viewport.zoom);
	draw_edges(editor, ctx);
	draw_preview(editor, ctx);
	draw_nodes(editor, ctx);
	ctx.restore();
}

fn draw_edges(editor: &GraphEditor, ctx: &CanvasRenderingContext2d) {
	let store = editor.store();
	let selected = editor.selected_edge();
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	for edge in store.edges() {
		let (Some(from), Some(to)) = (store.node(edge.from), store.node(edge.to)) else {
			continue;
		};
		let is_selected = selected.is_some_and(|s| edge.connects(s.from, s.to));
		let color = if is_selected {
			SELECTED_EDGE_COLOR
		} else {
			edge_color(edge.kind)
		};

		ctx.set_stroke_style_str(color);
		ctx.set_line_width(if is_selected { 3.0 } else { 2.0 });
		ctx.begin_path();
		ctx.move_to(from.x, from.y);
		ctx.line_to(to.x, to.y);
		ctx.stroke();

		let tip = box_exit(to, from.center());
		let angle = (to.y - from.y).atan2(to.x - from.x);
		ctx.set_fill_style_str(color);
		ctx.begin_path();
		ctx.move_to(tip.x, tip.y);
		ctx.line_to(
			tip.x - ARROW_LENGTH * (angle - ARROW_ANGLE).cos(),
			tip.y - ARROW_LENGTH * (angle - ARROW_ANGLE).sin(),
		);
		ctx.line_to(
			tip.x - ARROW_LENGTH * (angle + ARROW_ANGLE).cos(),
			tip.y - ARROW_LENGTH * (angle + ARROW_ANGLE).sin(),
		);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_preview(editor: &GraphEditor, ctx: &CanvasRenderingContext2d) {
	let (Some(source), Some(pointer)) = (editor.connection_source(), editor.pointer()) else {
		return;
	};
	let Some(start) = editor.store().center(source) else {
		return;
	};
	ctx.set_stroke_style_str(PREVIEW_COLOR);
	ctx.set_line_width(3.0);
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(5.0),
		&JsValue::from_f64(5.0),
	));
	ctx.begin_path();
	ctx.move_to(start.x, start.y);
	ctx.line_to(pointer.x, pointer.y);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(editor: &GraphEditor, ctx: &CanvasRenderingContext2d) {
	let source = editor.connection_source();
	let connecting = editor.connection_mode();

	for node in editor.store().nodes() {
		let (left, top) = (node.x - node.width / 2.0, node.y - node.height / 2.0);

		ctx.set_shadow_color("rgba(0, 0, 0, 0.1)");
		ctx.set_shadow_blur(10.0);
		ctx.set_shadow_offset_x(0.0);
		ctx.set_shadow_offset_y(2.0);
		ctx.set_fill_style_str(node_background(node, source));
		ctx.fill_rect(left, top, node.width, node.height);
		ctx.set_shadow_color("transparent");
		ctx.set_shadow_blur(0.0);

		ctx.set_stroke_style_str(priority_border(node.task.priority));
		ctx.set_line_width(if node.selected { 3.0 } else { 2.0 });
		ctx.stroke_rect(left, top, node.width, node.height);

		ctx.set_fill_style_str("#2C2C2C");
		ctx.set_font(TITLE_FONT);
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let title = truncate_title(&node.task.title, node.width - TITLE_PADDING, |s| {
			ctx.measure_text(s).map(|m| m.width()).unwrap_or(0.0)
		});
		let _ = ctx.fill_text(&title, node.x, node.y - 8.0);

		if let Some(caption) = node.task.due_date.as_deref().and_then(due_caption) {
			ctx.set_font(CAPTION_FONT);
			ctx.set_fill_style_str("#6B7280");
			let _ = ctx.fill_text(&caption, node.x, node.y + 12.0);
		}

		let state = match (connecting, source == Some(node.id)) {
			(false, _) => HandleState::Neutral,
			(true, true) => HandleState::Source,
			(true, false) => HandleState::Target,
		};
		draw_handles(editor, node, state, ctx);
	}
}

fn draw_handles(
	editor: &GraphEditor,
	node: &Node,
	state: HandleState,
	ctx: &CanvasRenderingContext2d,
) {
	let radius = editor.config().handle_radius;
	for handle in handles(node, editor.config().handle_offset) {
		let Point { x, y } = handle.pos;
		ctx.set_fill_style_str(handle_color(state));
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.fill();
		ctx.set_stroke_style_str("#FFFFFF");
		ctx.set_line_width(2.0);
		ctx.stroke();

		if state == HandleState::Target {
			ctx.begin_path();
			ctx.move_to(x - 3.0, y);
			ctx.line_to(x + 3.0, y);
			ctx.move_to(x, y - 3.0);
			ctx.line_to(x, y + 3.0);
			ctx.stroke();
		}
	}
}
