//! Pointer and touch handling.
//!
//! Every press/move/release sequence resolves to exactly one of: click/tap
//! selection, node drag, canvas pan or pinch zoom. Hit testing happens in
//! simulation space, with screen-pixel tolerances divided by the zoom scale.

use log::{debug, trace};

use super::config::InteractionConfig;
use super::layout::Simulation;
use super::types::{GraphNode, Link, LinkRef, NodeRef, Vec2};
use super::variant::{SelectAction, VariantTable};
use super::viewport::ViewportTransform;

/// Which touch event fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
	/// `touchstart`.
	Start,
	/// `touchmove`.
	Move,
	/// `touchend`.
	End,
	/// `touchcancel`.
	Cancel,
}

/// A touch event with every finger still on the surface.
#[derive(Clone, Debug, PartialEq)]
pub struct TouchInput {
	/// The event that fired.
	pub phase: TouchPhase,
	/// Remaining fingers, canvas-relative.
	pub touches: Vec<Vec2>,
}

/// Canvas-relative input, in screen pixels.
#[derive(Clone, Debug, PartialEq)]
pub enum PointerInput {
	/// Mouse button pressed.
	Down(Vec2),
	/// Mouse moved.
	Move(Vec2),
	/// Mouse button released.
	Up(Vec2),
	/// Pointer left the canvas.
	Leave,
	/// Wheel scrolled over the canvas.
	Wheel {
		/// Pointer position, the zoom pivot.
		at: Vec2,
		/// Scroll amount; negative zooms in.
		delta_y: f64,
	},
	/// Any touch event.
	Touch(TouchInput),
}

/// What the pointer is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverTarget {
	/// A node, which always wins over edges.
	Node(NodeRef),
	/// An edge, when no node is hit.
	Edge(LinkRef),
}

/// Hover state after a pointer move.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverInfo {
	/// `None` when the pointer is over empty canvas.
	pub target: Option<HoverTarget>,
	/// Last pointer position, for placing a tooltip.
	pub screen: Vec2,
}

/// Something the host page may react to.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
	/// A node was clicked or tapped.
	NodeSelected(SelectAction),
	/// A click on empty canvas dropped the selection.
	SelectionCleared,
	/// The pointer moved over, along or off a node or edge.
	Hover(HoverInfo),
}

/// Outcome of one input event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response {
	/// Events for the host, in order.
	pub events: Vec<GraphEvent>,
	/// The view changed and must be drawn again.
	pub redraw: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Gesture {
	#[default]
	Idle,
	DragNode {
		node: NodeRef,
		origin: Vec2,
		/// Node centre minus the pressed point, in simulation units.
		grab: Vec2,
	},
	Pan {
		origin: Vec2,
	},
	Pinch {
		baseline: Option<f64>,
	},
}

/// Hover, selection and gesture state; reset when the dataset changes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionState {
	hovered_node: Option<NodeRef>,
	hovered_edge: Option<LinkRef>,
	selected_node: Option<NodeRef>,
	gesture: Gesture,
	pointer_anchor: Option<Vec2>,
}

impl InteractionState {
	/// Node under the pointer.
	pub fn hovered_node(&self) -> Option<NodeRef> {
		self.hovered_node
	}

	/// Edge under the pointer, only when no node is.
	pub fn hovered_edge(&self) -> Option<LinkRef> {
		self.hovered_edge
	}

	/// Last clicked node.
	pub fn selected_node(&self) -> Option<NodeRef> {
		self.selected_node
	}

	/// The node being dragged; `None` during a pan or when idle.
	pub fn drag_target(&self) -> Option<NodeRef> {
		match self.gesture {
			Gesture::DragNode { node, .. } => Some(node),
			_ => None,
		}
	}

	/// A background press is dragging the view.
	pub fn is_panning(&self) -> bool {
		matches!(self.gesture, Gesture::Pan { .. })
	}

	/// Last pointer position seen during a gesture.
	pub fn pointer_anchor(&self) -> Option<Vec2> {
		self.pointer_anchor
	}

	/// Finger distance at the previous pinch step.
	pub fn pinch_baseline_distance(&self) -> Option<f64> {
		match self.gesture {
			Gesture::Pinch { baseline } => baseline,
			_ => None,
		}
	}
}

/// Topmost node under `screen`: nodes drawn later win.
pub fn hit_node(nodes: &[GraphNode], transform: &ViewportTransform, screen: Vec2, padding_px: f64) -> Option<NodeRef> {
	let point = transform.to_sim(screen);
	let padding = transform.screen_len(padding_px);
	nodes
		.iter()
		.enumerate()
		.rev()
		.find(|(_, node)| {
			let reach = node.radius + padding;
			node.position.distance_sq(point) < reach * reach
		})
		.map(|(index, _)| NodeRef(index))
}

/// Squared distance from `p` to segment `a`-`b`; `None` for a zero-length segment.
pub fn segment_distance_sq(p: Vec2, a: Vec2, b: Vec2) -> Option<f64> {
	let ab = b - a;
	let length_sq = ab.length_sq();
	if length_sq <= f64::EPSILON {
		return None;
	}
	let ap = p - a;
	let t = ((ap.x * ab.x + ap.y * ab.y) / length_sq).clamp(0.0, 1.0);
	Some(p.distance_sq(a + ab * t))
}

/// Closest edge within `threshold_px` of `screen`.
pub fn hit_edge(
	nodes: &[GraphNode],
	links: &[Link],
	transform: &ViewportTransform,
	screen: Vec2,
	threshold_px: f64,
) -> Option<LinkRef> {
	let point = transform.to_sim(screen);
	let threshold = transform.screen_len(threshold_px);
	links
		.iter()
		.enumerate()
		.filter_map(|(index, link)| {
			let a = nodes.get(link.source.0)?.position;
			let b = nodes.get(link.target.0)?.position;
			let distance_sq = segment_distance_sq(point, a, b)?;
			(distance_sq < threshold * threshold).then_some((index, distance_sq))
		})
		.min_by(|a, b| a.1.total_cmp(&b.1))
		.map(|(index, _)| LinkRef(index))
}

/// What the controller operates on for one event.
pub struct Target<'a> {
	/// Receives pins and reheats.
	pub simulation: &'a mut Simulation,
	/// Receives pans and zooms.
	pub transform: &'a mut ViewportTransform,
	/// Decides what a selection means.
	pub variants: &'a VariantTable,
}

/// Turns raw pointer and touch input into gestures and events.
pub struct InteractionController {
	state: InteractionState,
	config: InteractionConfig,
	drag_alpha_target: f64,
}

impl InteractionController {
	/// `drag_alpha_target` is the alpha a drag keeps the layout at.
	pub fn new(config: InteractionConfig, drag_alpha_target: f64) -> Self {
		Self {
			state: InteractionState::default(),
			config,
			drag_alpha_target,
		}
	}

	/// Current hover, selection and gesture.
	pub fn state(&self) -> &InteractionState {
		&self.state
	}

	/// Forgets hover, selection and any gesture in progress.
	pub fn reset(&mut self) {
		self.state = InteractionState::default();
	}

	/// Applies one input event.
	pub fn handle(&mut self, input: PointerInput, target: &mut Target<'_>) -> Response {
		let mut response = Response::default();
		match input {
			PointerInput::Down(at) => self.press(at, target, &mut response),
			PointerInput::Move(at) => self.moved(at, target, &mut response),
			PointerInput::Up(at) => {
				self.release(at, target, &mut response);
				// Hover is stale after a drag or pan.
				self.update_hover(at, target, &mut response);
			}
			PointerInput::Leave => self.leave(target, &mut response),
			PointerInput::Wheel { at, delta_y } => {
				response.redraw = target.transform.wheel(at, delta_y);
			}
			PointerInput::Touch(touch) => self.touch(touch, target, &mut response),
		}
		response
	}

	fn press(&mut self, at: Vec2, target: &mut Target<'_>, response: &mut Response) {
		self.cancel(target);
		let nodes = target.simulation.nodes();
		self.state.gesture = match hit_node(nodes, target.transform, at, self.config.hit_padding) {
			Some(node) => {
				let position = nodes[node.0].position;
				let grab = position - target.transform.to_sim(at);
				target.simulation.pin(node, position);
				target.simulation.reheat(self.drag_alpha_target);
				debug!("drag start on node {}", node.0);
				Gesture::DragNode { node, origin: at, grab }
			}
			None => Gesture::Pan { origin: at },
		};
		self.state.pointer_anchor = Some(at);
		response.redraw = true;
	}

	fn moved(&mut self, at: Vec2, target: &mut Target<'_>, response: &mut Response) {
		match self.state.gesture {
			Gesture::DragNode { node, grab, .. } => {
				let position = target.transform.to_sim(at) + grab;
				target.simulation.pin(node, position);
				target.simulation.reheat(self.drag_alpha_target);
				response.redraw = true;
			}
			Gesture::Pan { .. } => {
				if let Some(anchor) = self.state.pointer_anchor {
					target.transform.pan_by(at - anchor);
					response.redraw = true;
				}
			}
			Gesture::Pinch { .. } => {}
			Gesture::Idle => self.update_hover(at, target, response),
		}
		self.state.pointer_anchor = Some(at);
	}

	fn release(&mut self, at: Vec2, target: &mut Target<'_>, response: &mut Response) {
		let gesture = std::mem::take(&mut self.state.gesture);
		self.state.pointer_anchor = None;
		let click_distance_sq = self.config.click_distance_sq;
		let is_click = |origin: Vec2| origin.distance_sq(at) < click_distance_sq;

		match gesture {
			Gesture::DragNode { node, origin, .. } => {
				target.simulation.unpin(node);
				target.simulation.cool();
				if is_click(origin) {
					self.select(node, target, response);
				} else {
					debug!("drag end on node {}", node.0);
				}
				response.redraw = true;
			}
			Gesture::Pan { origin } => {
				if is_click(origin) && self.state.selected_node.take().is_some() {
					response.events.push(GraphEvent::SelectionCleared);
					response.redraw = true;
				}
			}
			Gesture::Pinch { .. } | Gesture::Idle => {}
		}
	}

	fn select(&mut self, node: NodeRef, target: &Target<'_>, response: &mut Response) {
		let Some(graph_node) = target.simulation.node(node) else {
			return;
		};
		self.state.selected_node = Some(node);
		let action = target.variants.for_node(graph_node).select(
			node,
			target.simulation.nodes(),
			target.simulation.links(),
		);
		if let Some(action) = action {
			debug!("selected {:?} node {}", action.kind(), action.id());
			response.events.push(GraphEvent::NodeSelected(action));
		}
	}

	fn leave(&mut self, target: &mut Target<'_>, response: &mut Response) {
		self.cancel(target);
		let had_hover = self.state.hovered_node.take().is_some() | self.state.hovered_edge.take().is_some();
		response.events.push(GraphEvent::Hover(HoverInfo {
			target: None,
			screen: Vec2::ZERO,
		}));
		response.redraw = true;
		trace!("pointer left canvas (hover cleared: {had_hover})");
	}

	/// Abandons the current gesture without producing a click.
	fn cancel(&mut self, target: &mut Target<'_>) {
		if let Gesture::DragNode { node, .. } = std::mem::take(&mut self.state.gesture) {
			target.simulation.unpin(node);
			target.simulation.cool();
		}
		self.state.pointer_anchor = None;
	}

	fn update_hover(&mut self, at: Vec2, target: &Target<'_>, response: &mut Response) {
		let nodes = target.simulation.nodes();
		let node = hit_node(nodes, target.transform, at, self.config.hit_padding);
		let edge = match node {
			Some(_) => None,
			None => hit_edge(
				nodes,
				target.simulation.links(),
				target.transform,
				at,
				self.config.edge_hit_threshold,
			),
		};

		let changed = node != self.state.hovered_node || edge != self.state.hovered_edge;
		self.state.hovered_node = node;
		self.state.hovered_edge = edge;
		let hovered = node.map(HoverTarget::Node).or(edge.map(HoverTarget::Edge));
		if changed || hovered.is_some() {
			response.events.push(GraphEvent::Hover(HoverInfo {
				target: hovered,
				screen: at,
			}));
		}
		response.redraw |= changed;
	}

	fn touch(&mut self, touch: TouchInput, target: &mut Target<'_>, response: &mut Response) {
		let points = &touch.touches;
		match touch.phase {
			TouchPhase::Start => {
				if points.len() >= 2 {
					self.cancel(target);
					let distance = points[0].distance(points[1]);
					self.state.gesture = Gesture::Pinch {
						baseline: (distance > 0.0).then_some(distance),
					};
					response.redraw = true;
				} else if let (Some(&at), Gesture::Idle) = (points.first(), self.state.gesture) {
					self.press(at, target, response);
				}
			}
			TouchPhase::Move => {
				if let Gesture::Pinch { baseline } = self.state.gesture {
					if points.len() >= 2 {
						self.pinch(baseline, points[0], points[1], target, response);
					}
				} else if let Some(&at) = points.first() {
					self.moved(at, target, response);
				}
			}
			TouchPhase::End => match self.state.gesture {
				Gesture::Pinch { .. } if points.len() < 2 => {
					// Lifting one finger of a pinch must not start a pan or tap.
					self.state.gesture = Gesture::Idle;
					self.state.pointer_anchor = None;
				}
				Gesture::DragNode { .. } | Gesture::Pan { .. } if points.is_empty() => {
					if let Some(at) = self.state.pointer_anchor {
						self.release(at, target, response);
					}
				}
				_ => {}
			},
			TouchPhase::Cancel => {
				self.cancel(target);
				self.state.gesture = Gesture::Idle;
			}
		}
	}

	fn pinch(&mut self, baseline: Option<f64>, a: Vec2, b: Vec2, target: &mut Target<'_>, response: &mut Response) {
		let distance = a.distance(b);
		if let Some(previous) = baseline
			&& previous > 0.0
			&& distance > 0.0
		{
			response.redraw |= target.transform.zoom_at(a.midpoint(b), distance / previous);
		}
		self.state.gesture = Gesture::Pinch {
			baseline: (distance > 0.0 && distance.is_finite()).then_some(distance),
		};
	}
}
