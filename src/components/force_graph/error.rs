use thiserror::Error;

/// Failures at the boundaries of the graph canvas: decoding a payload and
/// attaching to the browser. The engine itself has no error paths.
#[derive(Debug, Error)]
pub enum GraphError {
	/// JSON did not match the expected payload or config shape.
	#[error("invalid graph payload: {0}")]
	Payload(#[from] serde_json::Error),
	/// Not running in a browser window.
	#[error("no browser window available")]
	NoWindow,
	/// `getContext("2d")` returned nothing usable.
	#[error("2d canvas context unavailable")]
	ContextUnavailable,
	/// A browser API threw.
	#[error("javascript error: {0}")]
	Js(String),
}

impl From<wasm_bindgen::JsValue> for GraphError {
	fn from(value: wasm_bindgen::JsValue) -> Self {
		Self::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
	}
}

/// Result defaulting to [`GraphError`].
pub type Result<T, E = GraphError> = std::result::Result<T, E>;
