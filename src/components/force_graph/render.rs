//! Frame rendering. Reads simulation, viewport and highlight state and
//! issues draw calls; never mutates anything it is given.

use super::config::RenderConfig;
use super::highlight::{Emphasis, Highlight};
use super::types::{GraphNode, Link, NodeRef, SurfaceSize, Vec2};
use super::variant::{ColorMode, VariantTable};
use super::viewport::ViewportTransform;

/// The drawing surface. Implemented for the browser's 2d context and by a
/// recorder in tests.
pub trait Painter {
	/// Resets the transform to device-pixel scaling only.
	fn reset_transform(&self, pixel_ratio: f64);
	/// Fills the whole surface.
	fn clear(&self, width: f64, height: f64, background: &str);
	/// Moves the origin, in screen pixels.
	fn translate(&self, x: f64, y: f64);
	/// Scales both axes uniformly.
	fn scale(&self, k: f64);
	/// Global opacity for subsequent calls.
	fn set_alpha(&self, alpha: f64);
	/// Straight stroked segment.
	fn line(&self, from: Vec2, to: Vec2, color: &str, width: f64);
	/// Filled disc.
	fn fill_circle(&self, center: Vec2, radius: f64, color: &str);
	/// Circle outline.
	fn stroke_circle(&self, center: Vec2, radius: f64, color: &str, width: f64);
	/// Text horizontally centred on `at`, hanging below it.
	fn text(&self, text: &str, at: Vec2, font_px: f64, color: &str);
}

/// Everything one frame is drawn from.
pub struct Scene<'a> {
	/// Nodes in draw order.
	pub nodes: &'a [GraphNode],
	/// Links, drawn beneath the nodes.
	pub links: &'a [Link],
	/// Pan and zoom.
	pub transform: &'a ViewportTransform,
	/// Which nodes and links stand out.
	pub highlight: &'a Highlight,
	/// Colours per dataset.
	pub variants: &'a VariantTable,
	/// Widths, alphas and label rules.
	pub config: &'a RenderConfig,
	/// Type or cluster colouring.
	pub color_mode: ColorMode,
	/// Canvas size and pixel ratio.
	pub surface: SurfaceSize,
}

/// Cuts `label` to `max_chars` characters, marking the cut with an ellipsis.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
	let mut chars = label.chars();
	let head: String = chars.by_ref().take(max_chars).collect();
	if chars.next().is_some() {
		format!("{head}\u{2026}")
	} else {
		head
	}
}

/// Draws one full frame: background, then edges, then nodes and labels.
pub fn render<P: Painter + ?Sized>(painter: &P, scene: &Scene<'_>) {
	let surface = scene.surface;
	painter.reset_transform(surface.pixel_ratio);
	painter.set_alpha(1.0);
	painter.clear(surface.width, surface.height, &scene.config.background);
	painter.translate(scene.transform.offset_x, scene.transform.offset_y);
	painter.scale(scene.transform.scale);

	draw_edges(painter, scene);
	draw_nodes(painter, scene);
	painter.set_alpha(1.0);
}

fn font_px(scene: &Scene<'_>) -> f64 {
	scene.config.font_px / scene.transform.scale.max(0.5)
}

fn draw_edges<P: Painter + ?Sized>(painter: &P, scene: &Scene<'_>) {
	let k = scene.transform.scale;
	let config = scene.config;

	// Active edges go last so they sit above the dimmed ones.
	for pass_active in [false, true] {
		for link in scene.links {
			let emphasis = scene.highlight.link(link);
			if (emphasis == Emphasis::Active) != pass_active {
				continue;
			}
			let (Some(source), Some(target)) = (scene.nodes.get(link.source.0), scene.nodes.get(link.target.0))
			else {
				continue;
			};
			if source.position.distance_sq(target.position) < 1e-6 {
				continue;
			}

			let (alpha, width) = match emphasis {
				Emphasis::Active => (1.0, config.highlighted_edge_width),
				Emphasis::Dimmed => (config.dimmed_alpha, config.edge_width),
				Emphasis::Normal | Emphasis::Related => (config.edge_alpha, config.edge_width),
			};
			let color = scene.variants.for_link(link, scene.nodes).edge_color(link);
			painter.set_alpha(alpha);
			painter.line(source.position, target.position, &color, width / k);

			if emphasis == Emphasis::Active && k > config.edge_label_min_scale && !link.label.is_empty() {
				let label = truncate_label(&link.label, config.label_max_chars);
				painter.text(
					&label,
					source.position.midpoint(target.position),
					font_px(scene),
					&config.label_color,
				);
			}
		}
	}
}

fn draw_nodes<P: Painter + ?Sized>(painter: &P, scene: &Scene<'_>) {
	let k = scene.transform.scale;
	let config = scene.config;
	let font = font_px(scene);

	for (index, node) in scene.nodes.iter().enumerate() {
		let emphasis = scene.highlight.node(NodeRef(index));
		let alpha = if emphasis == Emphasis::Dimmed {
			config.dimmed_alpha
		} else {
			1.0
		};
		let color = scene.variants.for_node(node).node_color(node, scene.color_mode);

		painter.set_alpha(alpha);
		painter.fill_circle(node.position, node.radius, &color);
		if emphasis == Emphasis::Active {
			painter.stroke_circle(node.position, node.radius + 2.0 / k, &config.outline_color, 2.0 / k);
		}

		let show_label = k >= config.node_label_min_scale
			|| node.radius >= config.node_label_min_radius
			|| emphasis == Emphasis::Active;
		if show_label && !node.label.is_empty() {
			let at = Vec2::new(node.position.x, node.position.y + node.radius + 2.0 / k);
			painter.text(
				&truncate_label(&node.label, config.label_max_chars),
				at,
				font,
				&config.label_color,
			);
		}
	}
}

#[cfg(test)]
pub(crate) mod recording {
	use std::cell::RefCell;

	use super::*;

	#[derive(Clone, Debug, PartialEq)]
	pub enum Op {
		Reset(f64),
		Clear(f64, f64, String),
		Translate(f64, f64),
		Scale(f64),
		Alpha(f64),
		Line(Vec2, Vec2, String, f64),
		Fill(Vec2, f64, String),
		Stroke(Vec2, f64, String, f64),
		Text(String, Vec2, f64),
	}

	#[derive(Default)]
	pub struct Recorder {
		pub ops: RefCell<Vec<Op>>,
	}

	impl Recorder {
		pub fn take(&self) -> Vec<Op> {
			self.ops.take()
		}
	}

	impl Painter for Recorder {
		fn reset_transform(&self, pixel_ratio: f64) {
			self.ops.borrow_mut().push(Op::Reset(pixel_ratio));
		}
		fn clear(&self, width: f64, height: f64, background: &str) {
			self.ops.borrow_mut().push(Op::Clear(width, height, background.into()));
		}
		fn translate(&self, x: f64, y: f64) {
			self.ops.borrow_mut().push(Op::Translate(x, y));
		}
		fn scale(&self, k: f64) {
			self.ops.borrow_mut().push(Op::Scale(k));
		}
		fn set_alpha(&self, alpha: f64) {
			self.ops.borrow_mut().push(Op::Alpha(alpha));
		}
		fn line(&self, from: Vec2, to: Vec2, color: &str, width: f64) {
			self.ops.borrow_mut().push(Op::Line(from, to, color.into(), width));
		}
		fn fill_circle(&self, center: Vec2, radius: f64, color: &str) {
			self.ops.borrow_mut().push(Op::Fill(center, radius, color.into()));
		}
		fn stroke_circle(&self, center: Vec2, radius: f64, color: &str, width: f64) {
			self.ops.borrow_mut().push(Op::Stroke(center, radius, color.into(), width));
		}
		fn text(&self, text: &str, at: Vec2, font_px: f64, _color: &str) {
			self.ops.borrow_mut().push(Op::Text(text.into(), at, font_px));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::recording::{Op, Recorder};
	use super::*;
	use crate::components::force_graph::types::{EdgeVariant, NodeId, NodeVariant};

	fn node(id: i64, x: f64, label: &str, radius: f64) -> GraphNode {
		GraphNode {
			id: NodeId::Int(id),
			label: label.into(),
			radius,
			position: Vec2::new(x, 0.0),
			velocity: Vec2::ZERO,
			pinned: None,
			variant: NodeVariant::Relationship {
				memory_type: "fact".into(),
				importance: 0.2,
				project: None,
				cluster_id: Some(1),
			},
		}
	}

	fn fixture() -> (Vec<GraphNode>, Vec<Link>) {
		let nodes = vec![
			node(1, 0.0, "alpha", 6.0),
			node(2, 100.0, "a rather long label that keeps going", 6.0),
			node(3, 200.0, "gamma", 6.0),
		];
		let links = vec![Link {
			source: NodeRef(0),
			target: NodeRef(1),
			label: "supports".into(),
			variant: EdgeVariant::Relationship {
				relation: "supports".into(),
				color: None,
			},
		}];
		(nodes, links)
	}

	fn draw(nodes: &[GraphNode], links: &[Link], transform: &ViewportTransform, highlight: &Highlight) -> Vec<Op> {
		let recorder = Recorder::default();
		let variants = VariantTable::default();
		let config = RenderConfig::default();
		render(
			&recorder,
			&Scene {
				nodes,
				links,
				transform,
				highlight,
				variants: &variants,
				config: &config,
				color_mode: ColorMode::Type,
				surface: SurfaceSize::new(640.0, 480.0, 2.0),
			},
		);
		recorder.take()
	}

	fn texts(ops: &[Op]) -> Vec<String> {
		ops.iter()
			.filter_map(|op| match op {
				Op::Text(t, ..) => Some(t.clone()),
				_ => None,
			})
			.collect()
	}

	#[test]
	fn frame_setup_precedes_drawing() {
		let (nodes, links) = fixture();
		let mut transform = ViewportTransform::default();
		transform.pan_by(Vec2::new(10.0, 20.0));
		let ops = draw(&nodes, &links, &transform, &Highlight::default());
		assert_eq!(ops[0], Op::Reset(2.0));
		assert!(matches!(&ops[2], Op::Clear(w, h, _) if *w == 640.0 && *h == 480.0));
		assert_eq!(ops[3], Op::Translate(10.0, 20.0));
		assert_eq!(ops[4], Op::Scale(1.0));
	}

	#[test]
	fn rendering_is_idempotent() {
		let (nodes, links) = fixture();
		let transform = ViewportTransform::default();
		let highlight = Highlight::derive(&nodes, &links, Some(NodeRef(0)), None, "");
		let first = draw(&nodes, &links, &transform, &highlight);
		let second = draw(&nodes, &links, &transform, &highlight);
		assert_eq!(first, second);
	}

	#[test]
	fn unrelated_nodes_are_dimmed_and_active_is_outlined() {
		let (nodes, links) = fixture();
		let highlight = Highlight::derive(&nodes, &links, Some(NodeRef(0)), None, "");
		let ops = draw(&nodes, &links, &ViewportTransform::default(), &highlight);

		let alpha_before_fill = |x: f64| {
			let at = ops
				.iter()
				.position(|op| matches!(op, Op::Fill(c, ..) if c.x == x))
				.unwrap();
			ops[..at]
				.iter()
				.rev()
				.find_map(|op| match op {
					Op::Alpha(a) => Some(*a),
					_ => None,
				})
				.unwrap()
		};
		assert_eq!(alpha_before_fill(0.0), 1.0);
		assert_eq!(alpha_before_fill(100.0), 1.0);
		assert_eq!(alpha_before_fill(200.0), RenderConfig::default().dimmed_alpha);
		assert_eq!(ops.iter().filter(|op| matches!(op, Op::Stroke(..))).count(), 1);
	}

	#[test]
	fn edge_labels_need_highlight_and_zoom() {
		let (nodes, links) = fixture();
		let highlight = Highlight::derive(&nodes, &links, Some(NodeRef(0)), None, "");
		let plain = draw(&nodes, &links, &ViewportTransform::default(), &highlight);
		assert!(!texts(&plain).contains(&"supports".to_string()));

		let mut zoomed = ViewportTransform::default();
		zoomed.zoom_at(Vec2::ZERO, 2.0);
		let ops = draw(&nodes, &links, &zoomed, &highlight);
		assert!(texts(&ops).contains(&"supports".to_string()));

		let ops = draw(&nodes, &links, &zoomed, &Highlight::default());
		assert!(!texts(&ops).contains(&"supports".to_string()));
	}

	#[test]
	fn node_labels_depend_on_zoom_and_are_truncated() {
		let (nodes, links) = fixture();
		let mut far = ViewportTransform::default();
		far.zoom_at(Vec2::ZERO, 0.5);
		assert!(texts(&draw(&nodes, &links, &far, &Highlight::default())).is_empty());

		let labels = texts(&draw(&nodes, &links, &ViewportTransform::default(), &Highlight::default()));
		assert_eq!(labels.len(), 3);
		assert_eq!(labels[1], "a rather long label that\u{2026}");
	}

	#[test]
	fn large_nodes_keep_labels_when_zoomed_out() {
		let nodes = vec![node(1, 0.0, "hub", 14.0)];
		let mut far = ViewportTransform::default();
		far.zoom_at(Vec2::ZERO, 0.5);
		assert_eq!(texts(&draw(&nodes, &[], &far, &Highlight::default())), vec!["hub".to_string()]);
	}

	#[test]
	fn empty_graph_draws_only_the_background() {
		let ops = draw(&[], &[], &ViewportTransform::default(), &Highlight::default());
		assert!(ops.iter().all(|op| !matches!(op, Op::Fill(..) | Op::Line(..) | Op::Text(..))));
		assert!(ops.iter().any(|op| matches!(op, Op::Clear(..))));
	}

	#[test]
	fn truncation_counts_characters_not_bytes() {
		assert_eq!(truncate_label("héllo wörld", 5), "héllo\u{2026}");
		assert_eq!(truncate_label("short", 24), "short");
	}
}
