//! The owned engine object behind one mounted canvas.
//!
//! A `GraphView` holds the simulation, viewport and interaction state for one
//! dataset. The host drives it with input and animation frames and drops it
//! (after [`GraphView::dispose`]) when the dataset or the page changes.

use log::{debug, info, trace};

use super::adapter::build_graph;
use super::config::GraphConfig;
use super::highlight::Highlight;
use super::interaction::{
	GraphEvent, HoverInfo, HoverTarget, InteractionController, InteractionState, PointerInput, Target,
};
use super::layout::Simulation;
use super::render::{Painter, Scene, render};
use super::scheduler::FrameScheduler;
use super::types::{GraphModel, GraphPayload, NodeId, SurfaceSize, VariantKind};
use super::variant::{ColorMode, VariantTable};
use super::viewport::ViewportTransform;

/// Alpha a resize wakes the layout with.
const RESIZE_ALPHA: f64 = 0.3;

/// Result of feeding input to a view.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Update {
	/// Events for the host, in order.
	pub events: Vec<GraphEvent>,
	/// The caller must request an animation frame.
	pub schedule: bool,
}

/// Payload identity of whatever the pointer is over.
#[derive(Clone, Debug, PartialEq)]
pub enum HoverSubject {
	/// A node, by payload id and dataset.
	Node {
		/// Payload id.
		id: NodeId,
		/// Dataset.
		kind: VariantKind,
	},
	/// An edge, by its endpoints' payload ids.
	Edge {
		/// Payload id of the source node.
		source: NodeId,
		/// Payload id of the target node.
		target: NodeId,
	},
}

/// Hover output for the host page: the hovered node or edge, its tooltip
/// and the canvas-relative pointer position it belongs at.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverDetail {
	/// What is hovered.
	pub subject: HoverSubject,
	/// Tooltip text.
	pub text: String,
	/// Pointer x, canvas-relative.
	pub x: f64,
	/// Pointer y, canvas-relative.
	pub y: f64,
}

/// Owned engine for one mounted dataset.
pub struct GraphView {
	simulation: Simulation,
	transform: ViewportTransform,
	controller: InteractionController,
	scheduler: FrameScheduler,
	variants: VariantTable,
	config: GraphConfig,
	surface: SurfaceSize,
	color_mode: ColorMode,
	search: String,
}

impl GraphView {
	/// Adapts `payload` and starts its layout; `seed` fixes the initial jitter.
	pub fn new(payload: &GraphPayload, config: GraphConfig, surface: SurfaceSize, seed: u64) -> Self {
		let model = build_graph(payload, surface, &config.layout, seed);
		Self::from_model(model, config, surface)
	}

	/// Starts a view over an already adapted graph.
	pub fn from_model(model: GraphModel, config: GraphConfig, surface: SurfaceSize) -> Self {
		info!(
			"graph view created: {:?}, {} nodes, {} links",
			model.kind,
			model.nodes.len(),
			model.links.len()
		);
		let simulation = Simulation::new(model, config.layout.clone(), surface.center());
		Self {
			simulation,
			transform: ViewportTransform::new(&config.viewport),
			controller: InteractionController::new(config.interaction.clone(), config.layout.drag_alpha_target),
			scheduler: FrameScheduler::default(),
			variants: VariantTable::default(),
			config,
			surface,
			color_mode: ColorMode::default(),
			search: String::new(),
		}
	}

	/// Replaces the per-dataset behaviour.
	pub fn with_variants(mut self, variants: VariantTable) -> Self {
		self.variants = variants;
		self
	}

	/// The running layout.
	pub fn simulation(&self) -> &Simulation {
		&self.simulation
	}

	/// Current pan and zoom.
	pub fn transform(&self) -> &ViewportTransform {
		&self.transform
	}

	/// Hover, selection and gesture state.
	pub fn interaction(&self) -> &InteractionState {
		self.controller.state()
	}

	/// Canvas size the layout is centred in.
	pub fn surface(&self) -> SurfaceSize {
		self.surface
	}

	/// How nodes are coloured.
	pub fn color_mode(&self) -> ColorMode {
		self.color_mode
	}

	/// Current label filter.
	pub fn search(&self) -> &str {
		&self.search
	}

	/// [`GraphView::dispose`] has been called.
	pub fn is_disposed(&self) -> bool {
		self.scheduler.is_disposed()
	}

	/// Asks for a redraw. Returns `true` if the caller must schedule a frame.
	pub fn invalidate(&mut self) -> bool {
		self.scheduler.request()
	}

	/// Feeds one pointer or touch event through the interaction controller.
	pub fn handle_input(&mut self, input: PointerInput) -> Update {
		if self.is_disposed() {
			return Update::default();
		}
		let mut target = Target {
			simulation: &mut self.simulation,
			transform: &mut self.transform,
			variants: &self.variants,
		};
		let response = self.controller.handle(input, &mut target);
		let schedule = (response.redraw || self.simulation.is_running()) && self.scheduler.request();
		Update {
			events: response.events,
			schedule,
		}
	}

	/// Sets the label filter. Returns whether a frame must be scheduled.
	pub fn set_search(&mut self, search: &str) -> bool {
		if self.is_disposed() || self.search == search {
			return false;
		}
		self.search = search.to_owned();
		self.invalidate()
	}

	/// Switches colouring. Returns whether a frame must be scheduled.
	pub fn set_color_mode(&mut self, mode: ColorMode) -> bool {
		if self.is_disposed() || self.color_mode == mode {
			return false;
		}
		self.color_mode = mode;
		self.invalidate()
	}

	/// Adopts a new canvas size; the layout's centre follows it.
	pub fn resize(&mut self, surface: SurfaceSize) -> bool {
		if self.is_disposed() || self.surface == surface {
			return false;
		}
		debug!("graph view resized to {}x{}", surface.width, surface.height);
		self.surface = surface;
		self.simulation.set_center(surface.center());
		self.simulation.restart(RESIZE_ALPHA);
		self.invalidate()
	}

	/// Runs one animation frame: at most one physics tick, then one full
	/// redraw. Returns whether another frame must be scheduled.
	pub fn frame<P: Painter + ?Sized>(&mut self, painter: &P) -> bool {
		if self.is_disposed() {
			return false;
		}
		self.scheduler.begin_frame();
		if self.simulation.is_running() {
			self.simulation.tick();
		}

		let state = self.controller.state();
		let highlight = Highlight::derive(
			self.simulation.nodes(),
			self.simulation.links(),
			state.hovered_node(),
			state.selected_node(),
			&self.search,
		);
		render(
			painter,
			&Scene {
				nodes: self.simulation.nodes(),
				links: self.simulation.links(),
				transform: &self.transform,
				highlight: &highlight,
				variants: &self.variants,
				config: &self.config.render,
				color_mode: self.color_mode,
				surface: self.surface,
			},
		);
		trace!("frame {} drawn (alpha {:.4})", self.scheduler.frames(), self.simulation.alpha());

		self.simulation.is_running() && self.scheduler.request()
	}

	/// Tooltip text for a hover target, if it still exists.
	pub fn tooltip(&self, target: HoverTarget) -> Option<String> {
		let nodes = self.simulation.nodes();
		match target {
			HoverTarget::Node(node) => {
				let node = nodes.get(node.0)?;
				Some(self.variants.for_node(node).node_tooltip(node))
			}
			HoverTarget::Edge(link) => {
				let link = self.simulation.links().get(link.0)?;
				Some(self.variants.for_link(link, nodes).edge_tooltip(link, nodes))
			}
		}
	}

	/// Resolves a hover event against the current graph; `None` when the
	/// pointer is over nothing or the target no longer exists.
	pub fn hover_detail(&self, info: &HoverInfo) -> Option<HoverDetail> {
		let target = info.target?;
		let nodes = self.simulation.nodes();
		let subject = match target {
			HoverTarget::Node(node) => {
				let node = nodes.get(node.0)?;
				HoverSubject::Node {
					id: node.id.clone(),
					kind: node.kind(),
				}
			}
			HoverTarget::Edge(link) => {
				let link = self.simulation.links().get(link.0)?;
				HoverSubject::Edge {
					source: nodes.get(link.source.0)?.id.clone(),
					target: nodes.get(link.target.0)?.id.clone(),
				}
			}
		};
		Some(HoverDetail {
			subject,
			text: self.tooltip(target)?,
			x: info.screen.x,
			y: info.screen.y,
		})
	}

	/// Stops ticking and drops pending frame requests; every later call is a
	/// no-op.
	pub fn dispose(&mut self) {
		if self.is_disposed() {
			return;
		}
		self.simulation.stop();
		self.scheduler.dispose();
		self.controller.reset();
		info!("graph view disposed");
	}
}
