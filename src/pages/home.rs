use std::time::Duration;

use leptos::prelude::*;
use log::info;

use crate::components::task_graph::{Point, Priority, Task, TaskGraphCanvas, TaskId, ToastKind};

const TOAST_DURATION: Duration = Duration::from_secs(3);

/// A small backlog to draw when no host application feeds real tasks.
fn sample_tasks() -> Vec<Task> {
	let entries = [
		(1, "Draft project brief", Some(Priority::High), Some("2025-03-05")),
		(2, "Collect requirements", Some(Priority::Medium), Some("2025-03-12")),
		(3, "Design data model", Some(Priority::Medium), None),
		(4, "Prototype canvas editor", Some(Priority::High), Some("2025-04-01")),
		(5, "Write onboarding docs", Some(Priority::Low), None),
		(6, "Book kickoff meeting", None, Some("2025-02-28")),
	];
	entries
		.into_iter()
		.map(|(id, title, priority, due)| Task {
			priority,
			due_date: due.map(str::to_owned),
			..Task::new(id, title)
		})
		.collect()
}

fn toast_class(kind: ToastKind) -> &'static str {
	match kind {
		ToastKind::Success => "toast toast-success",
		ToastKind::Error => "toast toast-error",
		ToastKind::Info => "toast toast-info",
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let (tasks, set_tasks) = signal(sample_tasks());
	let (toasts, set_toasts) = signal::<Vec<(u64, String, ToastKind)>>(Vec::new());
	let next_toast = StoredValue::new(0u64);

	let notify = Callback::new(move |(message, kind): (String, ToastKind)| {
		let id = next_toast.get_value();
		next_toast.set_value(id + 1);
		set_toasts.update(|list| list.push((id, message, kind)));
		set_timeout(
			move || set_toasts.update(|list| list.retain(|(t, _, _)| *t != id)),
			TOAST_DURATION,
		);
	});

	let on_node_double_click = Callback::new(move |id: TaskId| {
		info!("Open editor for task {id}");
		set_tasks.update(|list| {
			if let Some(task) = list.iter_mut().find(|t| t.id == id) {
				task.completed = true;
			}
		});
		notify.run((format!("Task {id} marked as done"), ToastKind::Success));
	});

	let on_node_right_click = Callback::new(move |(id, at): (TaskId, Point)| {
		notify.run((format!("Task {id} menu at ({:.0}, {:.0})", at.x, at.y), ToastKind::Info));
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<TaskGraphCanvas
					tasks=tasks
					fullscreen=true
					on_node_double_click=on_node_double_click
					on_node_right_click=on_node_right_click
					on_notify=notify
				/>
				<div class="graph-overlay">
					<h1>"Task Graph"</h1>
					<p class="subtitle">
						"Drag tasks to arrange them. Use the handles to connect. Double-click completes a task."
					</p>
				</div>
				<div class="toasts">
					<For
						each=move || toasts.get()
						key=|(id, _, _)| *id
						children=|(_, message, kind)| view! { <div class=toast_class(kind)>{message}</div> }
					/>
				</div>
			</div>
		</ErrorBoundary>
	}
}
