use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
	Blob, BlobPropertyBag, CanvasRenderingContext2d, HtmlAnchorElement, HtmlCanvasElement,
	HtmlElement, HtmlInputElement, KeyboardEvent, MouseEvent, Touch, TouchEvent, Url, WheelEvent,
};

use super::config::GraphConfig;
use super::editor::{GraphEditor, HostAction, PointerButton, PointerInput};
use super::error::GraphError;
use super::render;
use super::storage::{BrowserStorage, GraphPersistence, KeyValueStore, MemoryStore};
use super::types::{Edge, EdgeKind, Point, Task, TaskId, ToastKind};

type SharedEditor = Rc<RefCell<Option<GraphEditor>>>;
type Listener<E> = Rc<RefCell<Option<Closure<dyn FnMut(E)>>>>;

#[derive(Clone, Debug, PartialEq)]
struct EdgeMenu {
	edge: Edge,
	screen: Point,
	label: String,
}

/// Host-facing side effects, shared by every event handler.
#[derive(Clone, Copy)]
struct Host {
	on_node_double_click: Option<Callback<TaskId>>,
	on_node_right_click: Option<Callback<(TaskId, Point)>>,
	on_notify: Option<Callback<(String, ToastKind)>>,
	set_connection_mode: WriteSignal<bool>,
	set_edge_menu: WriteSignal<Option<EdgeMenu>>,
}

impl Host {
	fn notify(&self, message: &str, kind: ToastKind) {
		match self.on_notify {
			Some(cb) => cb.run((message.to_owned(), kind)),
			None => info!("{message}"),
		}
	}

	fn perform(&self, state: &SharedEditor, action: Option<HostAction>) {
		match action {
			None => {}
			Some(HostAction::EdgeCreated(_)) => self.notify("Tasks connected", ToastKind::Success),
			Some(HostAction::ConfirmDeleteEdge(edge)) => {
				if confirm("Delete this connection?") {
					update(state, |s| s.delete_edge(edge));
				}
			}
			Some(HostAction::ConfirmDeleteNode(id)) => {
				if confirm("Remove this task from the graph? Its connections will be deleted.") {
					update(state, |s| s.delete_node(id));
				}
			}
			Some(HostAction::OpenEditor(id)) => {
				if let Some(cb) = self.on_node_double_click {
					cb.run(id);
				}
			}
			Some(HostAction::NodeMenu { task, screen }) => {
				if let Some(cb) = self.on_node_right_click {
					cb.run((task, screen));
				}
			}
			Some(HostAction::EdgeMenu { edge, screen }) => {
				let label = state
					.borrow()
					.as_ref()
					.and_then(|s| s.describe_edge(edge))
					.unwrap_or_default();
				self.set_edge_menu.set(Some(EdgeMenu { edge, screen, label }));
			}
		}
		self.refresh(state);
	}

	fn refresh(&self, state: &SharedEditor) {
		let mode = state.borrow().as_ref().is_some_and(GraphEditor::connection_mode);
		self.set_connection_mode.set(mode);
	}
}

fn update<R>(state: &SharedEditor, f: impl FnOnce(&mut GraphEditor) -> R) -> Option<R> {
	state.borrow_mut().as_mut().map(f)
}

fn confirm(message: &str) -> bool {
	web_sys::window()
		.and_then(|w| w.confirm_with_message(message).ok())
		.unwrap_or(false)
}

/// Whether an element with `tag_name` takes typed text, so graph
/// shortcuts must leave its keystrokes alone.
fn is_text_entry(tag_name: &str, content_editable: bool) -> bool {
	content_editable || matches!(tag_name.to_ascii_uppercase().as_str(), "INPUT" | "TEXTAREA" | "SELECT")
}

fn typing_into(ev: &KeyboardEvent) -> bool {
	ev.target()
		.and_then(|t| t.dyn_into::<HtmlElement>().ok())
		.is_some_and(|el| is_text_entry(&el.tag_name(), el.is_content_editable()))
}

fn canvas_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Point {
	let rect = canvas.get_bounding_client_rect();
	Point::new(client_x as f64 - rect.left(), client_y as f64 - rect.top())
}

fn touch_point(canvas: &HtmlCanvasElement, touch: Option<Touch>) -> Option<Point> {
	touch.map(|t| canvas_point(canvas, t.client_x(), t.client_y()))
}

fn measure(
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
	fallback: (f64, f64),
) -> (f64, f64) {
	if fullscreen {
		if let Some(win) = web_sys::window() {
			let w = win.inner_width().ok().and_then(|v| v.as_f64());
			let h = win.inner_height().ok().and_then(|v| v.as_f64());
			return (w.unwrap_or(fallback.0), h.unwrap_or(fallback.1));
		}
	}
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_width() as f64)
				.filter(|w| *w > 0.0)
				.unwrap_or(fallback.0)
		}),
		height.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_height() as f64)
				.filter(|h| *h > 0.0)
				.unwrap_or(fallback.1)
		}),
	)
}

fn open_persistence(storage: Option<Rc<dyn KeyValueStore>>) -> GraphPersistence {
	if let Some(store) = storage {
		return GraphPersistence::new(Box::new(store));
	}
	match BrowserStorage::open() {
		Some(store) => GraphPersistence::new(Box::new(store)),
		None => {
			warn!("Local storage unavailable, graph layout will not be kept");
			GraphPersistence::new(Box::new(MemoryStore::new()))
		}
	}
}

fn download_json(json: &str, filename: &str) -> Result<(), GraphError> {
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| GraphError::Export("no document".into()))?;
	let parts = js_sys::Array::of1(&JsValue::from_str(json));
	let options = BlobPropertyBag::new();
	options.set_type("application/json");
	let blob = Blob::new_with_str_sequence_and_options(&parts, &options).map_err(GraphError::export)?;
	let url = Url::create_object_url_with_blob(&blob).map_err(GraphError::export)?;
	let anchor: HtmlAnchorElement = document
		.create_element("a")
		.map_err(GraphError::export)?
		.dyn_into()
		.map_err(|_| GraphError::Export("not an anchor element".into()))?;
	anchor.set_href(&url);
	anchor.set_download(filename);
	anchor.click();
	Url::revoke_object_url(&url).map_err(GraphError::export)
}

fn export_filename() -> String {
	let iso = String::from(js_sys::Date::new_0().to_iso_string());
	let day = iso.split('T').next().unwrap_or_default();
	format!("task-graph-{day}.json")
}

fn menu_style(menu: Option<EdgeMenu>) -> String {
	match menu {
		Some(m) => format!(
			"position: absolute; left: {}px; top: {}px; z-index: 10001;",
			m.screen.x, m.screen.y
		),
		None => "display: none;".into(),
	}
}

/// Interactive task relationship graph drawn on a canvas.
///
/// Non-completed `tasks` become draggable nodes; users connect them through
/// the per-node handles. Positions and edges are kept in `storage`
/// (`window.localStorage` unless another store is injected).
#[component]
pub fn TaskGraphCanvas(
	#[prop(into)] tasks: Signal<Vec<Task>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional)] config: Option<GraphConfig>,
	#[prop(optional)] storage: Option<Rc<dyn KeyValueStore>>,
	#[prop(optional, into)] on_node_double_click: Option<Callback<TaskId>>,
	#[prop(optional, into)] on_node_right_click: Option<Callback<(TaskId, Point)>>,
	#[prop(optional, into)] on_notify: Option<Callback<(String, ToastKind)>>,
) -> impl IntoView {
	let config = config.unwrap_or_default();
	let fallback = config.fallback_size;
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let (connection_mode, set_connection_mode) = signal(false);
	let (connection_kind, set_connection_kind) = signal(EdgeKind::default());
	let (edge_menu, set_edge_menu) = signal::<Option<EdgeMenu>>(None);
	let host = Host {
		on_node_double_click,
		on_node_right_click,
		on_notify,
		set_connection_mode,
		set_edge_menu,
	};

	let state: SharedEditor = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let keydown_cb: Listener<KeyboardEvent> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init, keydown_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), keydown_cb.clone());
	let storage = RefCell::new(storage);

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if state_init.borrow().is_some() {
			return;
		}
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = measure(&canvas, fullscreen, width, height, fallback);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas.get_context("2d") {
			Ok(Some(ctx)) => match ctx.dyn_into() {
				Ok(ctx) => ctx,
				Err(_) => return,
			},
			_ => {
				warn!("Canvas 2d context unavailable");
				return;
			}
		};

		let mut editor = GraphEditor::new(open_persistence(storage.borrow_mut().take()), config.clone());
		editor.resize(w, h);
		editor.sync(&tasks.get_untracked());
		*state_init.borrow_mut() = Some(editor);

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let (nw, nh) = measure(&canvas_resize, fullscreen, width, height, fallback);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			update(&state_resize, |s| s.resize(nw, nh));
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let state_key = state_init.clone();
		*keydown_init.borrow_mut() = Some(Closure::new(move |ev: KeyboardEvent| {
			if typing_into(&ev) {
				return;
			}
			let action = update(&state_key, |s| s.key_down(&ev.key())).flatten();
			host.perform(&state_key, action);
		}));
		if let Some(ref cb) = *keydown_init.borrow() {
			let _ = window.add_event_listener_with_callback("keydown", cb.as_ref().unchecked_ref());
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref s) = *state_anim.borrow() {
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_sync = state.clone();
	Effect::new(move |_| {
		let tasks = tasks.get();
		update(&state_sync, |s| s.sync(&tasks));
		host.refresh(&state_sync);
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		set_edge_menu.set(None);
		let input = PointerInput {
			screen: canvas_point(&canvas, ev.client_x(), ev.client_y()),
			button: PointerButton::from_dom(ev.button()),
			shift: ev.shift_key(),
		};
		let action = update(&state_md, |s| s.pointer_down(input)).flatten();
		host.perform(&state_md, action);
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = canvas_point(&canvas, ev.client_x(), ev.client_y());
		update(&state_mm, |s| s.pointer_move(p));
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let input = PointerInput {
			screen: canvas_point(&canvas, ev.client_x(), ev.client_y()),
			button: PointerButton::from_dom(ev.button()),
			shift: ev.shift_key(),
		};
		update(&state_mu, |s| s.pointer_up(input));
		host.refresh(&state_mu);
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		update(&state_ml, GraphEditor::pointer_leave);
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = canvas_point(&canvas, ev.client_x(), ev.client_y());
		update(&state_wh, |s| s.wheel(p, ev.delta_y()));
	};

	let state_dc = state.clone();
	let on_dblclick = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = canvas_point(&canvas, ev.client_x(), ev.client_y());
		let action = state_dc.borrow().as_ref().and_then(|s| s.double_click(p));
		host.perform(&state_dc, action);
	};

	let state_cm = state.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = canvas_point(&canvas, ev.client_x(), ev.client_y());
		let action = update(&state_cm, |s| s.context_menu(p)).flatten();
		host.perform(&state_cm, action);
	};

	let state_ts = state.clone();
	let on_touchstart = move |ev: TouchEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(p) = touch_point(&canvas, ev.touches().get(0)) else {
			return;
		};
		set_edge_menu.set(None);
		let action = update(&state_ts, |s| s.pointer_down(PointerInput::touch(p))).flatten();
		host.perform(&state_ts, action);
	};

	let state_tm = state.clone();
	let on_touchmove = move |ev: TouchEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if let Some(p) = touch_point(&canvas, ev.touches().get(0)) {
			update(&state_tm, |s| s.pointer_move(p));
		}
	};

	let state_te = state.clone();
	let on_touchend = move |ev: TouchEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		match touch_point(&canvas, ev.changed_touches().get(0)) {
			Some(p) => update(&state_te, |s| s.pointer_up(PointerInput::touch(p))),
			None => update(&state_te, GraphEditor::pointer_leave),
		};
		host.refresh(&state_te);
	};

	let state_toggle = state.clone();
	let on_toggle_connect = move |_: MouseEvent| {
		update(&state_toggle, GraphEditor::toggle_connection_mode);
		host.refresh(&state_toggle);
	};

	let state_kind = state.clone();
	let on_kind_change = move |ev: leptos::ev::Event| {
		if let Some(kind) = EdgeKind::from_name(&event_target_value(&ev)) {
			set_connection_kind.set(kind);
			update(&state_kind, |s| s.set_connection_kind(kind));
		}
	};

	let state_layout = state.clone();
	let on_auto_layout = move |_: MouseEvent| {
		update(&state_layout, GraphEditor::auto_layout);
	};

	let state_center = state.clone();
	let on_center = move |_: MouseEvent| {
		update(&state_center, GraphEditor::center_view);
	};

	let state_clear = state.clone();
	let on_clear = move |_: MouseEvent| {
		if confirm("Clear all connections? This will remove all task relationships.") {
			update(&state_clear, GraphEditor::clear_edges);
		}
	};

	let state_export = state.clone();
	let on_export = move |_: MouseEvent| {
		let json = state_export.borrow().as_ref().map(|s| s.export().to_json());
		let result = match json {
			Some(Ok(json)) => download_json(&json, &export_filename()),
			Some(Err(err)) => Err(err),
			None => return,
		};
		if let Err(err) = result {
			warn!("Error exporting graph: {err}");
			host.notify("Error exporting graph", ToastKind::Error);
		}
	};

	let state_import = state.clone();
	let on_import = move |ev: leptos::ev::Event| {
		let input: HtmlInputElement = event_target(&ev);
		let Some(file) = input.files().and_then(|files| files.get(0)) else {
			return;
		};
		input.set_value("");
		let state = state_import.clone();
		spawn_local(async move {
			let text = JsFuture::from(file.text()).await.ok().and_then(|v| v.as_string());
			let result = match text {
				Some(text) => update(&state, |s| s.import(&text)).unwrap_or(Ok(())),
				None => Err(GraphError::Storage("could not read file".into())),
			};
			match result {
				Ok(()) => host.notify("Graph imported successfully", ToastKind::Success),
				Err(err) => {
					warn!("Error importing graph: {err}");
					host.notify("Error importing graph", ToastKind::Error);
				}
			}
		});
	};

	let state_menu = state.clone();
	let on_menu_delete = move |_: MouseEvent| {
		if let Some(menu) = edge_menu.get_untracked() {
			update(&state_menu, |s| s.delete_edge(menu.edge));
		}
		set_edge_menu.set(None);
	};

	view! {
		<div class="task-graph" style="position: relative; width: 100%; height: 100%;">
			<div class="task-graph-toolbar">
				<button
					class="btn"
					class:btn-primary=move || !connection_mode.get()
					class:btn-danger=move || connection_mode.get()
					class:active=move || connection_mode.get()
					on:click=on_toggle_connect
				>
					{move || if connection_mode.get() { "Cancel Connection" } else { "Connect Tasks" }}
				</button>
				<select
					class="connection-type"
					prop:disabled=move || !connection_mode.get()
					prop:value=move || connection_kind.get().as_str()
					on:change=on_kind_change
				>
					{EdgeKind::ALL
						.into_iter()
						.map(|kind| view! { <option value=kind.as_str()>{kind.relation_label()}</option> })
						.collect_view()}
				</select>
				<button class="btn" on:click=on_auto_layout>"Auto Layout"</button>
				<button class="btn" on:click=on_center>"Center View"</button>
				<button class="btn" on:click=on_clear>"Clear All"</button>
				<button class="btn" on:click=on_export>"Export"</button>
				<label class="btn">
					"Import"
					<input
						type="file"
						accept="application/json,.json"
						style="display: none;"
						on:change=on_import
					/>
				</label>
			</div>
			<canvas
				node_ref=canvas_ref
				class="task-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:dblclick=on_dblclick
				on:contextmenu=on_contextmenu
				on:touchstart=on_touchstart
				on:touchmove=on_touchmove
				on:touchend=on_touchend
				style="display: block; width: 100%; height: 100%; cursor: grab;"
			/>
			<div class="edge-context-menu" style=move || menu_style(edge_menu.get())>
				<div class="edge-menu-info">
					{move || edge_menu.get().map(|m| m.label).unwrap_or_default()}
				</div>
				<div class="edge-menu-item" on:click=on_menu_delete>"Delete Connection"</div>
			</div>
		</div>
	}
}
