//! Error type.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors surfaced by the graph editor to its callers.
#[derive(Debug, Error)]
pub enum GraphError {
	/// An imported document was not valid graph JSON.
	#[error("malformed graph document: {0}")]
	MalformedDocument(#[from] serde_json::Error),
	/// A browser storage or DOM call threw.
	#[error("storage error: {0}")]
	Storage(String),
	/// Building or downloading an export failed.
	#[error("export failed: {0}")]
	Export(String),
}

impl GraphError {
	/// Wraps a thrown JS value as a storage error.
	pub fn storage(err: JsValue) -> Self {
		Self::Storage(js_error_text(&err))
	}

	/// Wraps a thrown JS value as an export error.
	pub fn export(err: JsValue) -> Self {
		Self::Export(js_error_text(&err))
	}
}

fn js_error_text(err: &JsValue) -> String {
	err.as_string().unwrap_or_else(|| format!("{err:?}"))
}
