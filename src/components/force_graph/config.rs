//! Tunable constants for the graph canvas.
//!
//! All structs deserialize with `#[serde(default)]`, so hosts can override a
//! subset of values from JSON and inherit the rest.

use serde::{Deserialize, Serialize};

use super::error::Result;

/// Every tunable of the canvas, grouped by subsystem.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	/// Force layout.
	pub layout: LayoutConfig,
	/// Pan and zoom.
	pub viewport: ViewportConfig,
	/// Hit testing and gestures.
	pub interaction: InteractionConfig,
	/// Drawing.
	pub render: RenderConfig,
}

impl GraphConfig {
	/// Parses a partial override; missing keys keep their defaults.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}
}

/// Force simulation constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	/// Rest length of link springs.
	pub link_distance: f64,
	/// Many-body strength; negative repels.
	pub charge_strength: f64,
	/// Barnes-Hut approximation threshold.
	pub theta: f64,
	/// Charge distances are clamped to at least this, avoiding blow-ups.
	pub charge_distance_min: f64,
	/// Gravity toward the canvas centre, scaled by alpha.
	pub center_strength: f64,
	/// Added to a node's radius to get its collision radius.
	pub collision_padding: f64,
	/// Fraction of an overlap resolved per collision pass.
	pub collision_strength: f64,
	/// Collision passes per tick.
	pub collision_iterations: usize,
	/// Per-tick fraction by which alpha approaches its target.
	pub alpha_decay: f64,
	/// The simulation stops once alpha falls below this.
	pub alpha_min: f64,
	/// Fraction of velocity lost each tick.
	pub velocity_decay: f64,
	/// Sustained alpha while a node is dragged.
	pub drag_alpha_target: f64,
	/// Initial placement jitter around the canvas centre.
	pub seed_jitter: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			link_distance: 110.0,
			charge_strength: -180.0,
			theta: 0.9,
			charge_distance_min: 1.0,
			center_strength: 0.05,
			collision_padding: 4.0,
			collision_strength: 1.0,
			collision_iterations: 2,
			alpha_decay: 0.01,
			alpha_min: 0.001,
			velocity_decay: 0.4,
			drag_alpha_target: 0.3,
			seed_jitter: 120.0,
		}
	}
}

/// Pan and zoom limits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
	/// Smallest zoom factor.
	pub min_scale: f64,
	/// Largest zoom factor.
	pub max_scale: f64,
	/// Multiplicative zoom per wheel notch.
	pub zoom_step: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.1,
			max_scale: 5.0,
			zoom_step: 1.1,
		}
	}
}

/// Pointer tolerances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
	/// Screen pixels added to a node radius when hit testing.
	pub hit_padding: f64,
	/// Screen pixels from an edge that still count as hovering it.
	pub edge_hit_threshold: f64,
	/// Squared screen distance below which a press/release is a click.
	pub click_distance_sq: f64,
}

impl Default for InteractionConfig {
	fn default() -> Self {
		Self {
			hit_padding: 4.0,
			edge_hit_threshold: 6.0,
			click_distance_sq: 25.0,
		}
	}
}

/// Colours, widths and label rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
	/// Canvas fill.
	pub background: String,
	/// Opacity of nodes and edges outside the highlight.
	pub dimmed_alpha: f64,
	/// Opacity of edges when nothing is highlighted.
	pub edge_alpha: f64,
	/// Edge stroke width in screen pixels.
	pub edge_width: f64,
	/// Stroke width of edges touching the active node.
	pub highlighted_edge_width: f64,
	/// Edge labels appear on highlighted edges only above this scale.
	pub edge_label_min_scale: f64,
	/// Node labels appear from this scale up...
	pub node_label_min_scale: f64,
	/// ...or for nodes at least this large.
	pub node_label_min_radius: f64,
	/// Longer labels are truncated with an ellipsis.
	pub label_max_chars: usize,
	/// Label font size in screen pixels.
	pub font_px: f64,
	/// Outline of the active node.
	pub outline_color: String,
	/// Label fill.
	pub label_color: String,
}

impl Default for RenderConfig {
	fn default() -> Self {
		Self {
			background: "#1a1a2e".into(),
			dimmed_alpha: 0.15,
			edge_alpha: 0.6,
			edge_width: 1.0,
			highlighted_edge_width: 2.5,
			edge_label_min_scale: 1.2,
			node_label_min_scale: 0.9,
			node_label_min_radius: 12.0,
			label_max_chars: 24,
			font_px: 10.0,
			outline_color: "#ffffff".into(),
			label_color: "rgba(255, 255, 255, 0.85)".into(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_overrides_keep_remaining_defaults() {
		let config =
			GraphConfig::from_json(r#"{"viewport": {"max_scale": 8.0}, "layout": {"link_distance": 90}}"#)
				.unwrap();
		assert_eq!(config.viewport.max_scale, 8.0);
		assert_eq!(config.viewport.min_scale, 0.1);
		assert_eq!(config.layout.link_distance, 90.0);
		assert_eq!(config.layout.charge_strength, -180.0);
		assert_eq!(config.render, RenderConfig::default());
	}

	#[test]
	fn malformed_json_is_a_payload_error() {
		assert!(GraphConfig::from_json("{").is_err());
	}
}
