//! Canvas editor for relationships between tasks.
//!
//! The browser-free model lives in [`editor`] and the modules beneath it;
//! [`TaskGraphCanvas`] wires it to a `<canvas>` element.

mod component;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod hit_test;
pub mod layout;
pub mod render;
pub mod storage;
pub mod store;
pub mod transform;
pub mod types;

pub use component::TaskGraphCanvas;
pub use config::GraphConfig;
pub use error::GraphError;
pub use storage::{BrowserStorage, KeyValueStore, MemoryStore};
pub use types::{EdgeKind, Point, Priority, Task, TaskId, ToastKind};
