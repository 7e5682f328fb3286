//! Iterative force-directed layout.
//!
//! Each tick cools `alpha` toward `alpha_target`, accumulates link, charge
//! and collision forces into node velocities, pulls free nodes toward the
//! centre and integrates. Pinned nodes are treated as fixed inputs.

use log::trace;

use super::config::LayoutConfig;
use super::quadtree::{ChargeParams, Quadtree, jiggle};
use super::types::{GraphModel, GraphNode, Link, NodeRef, Vec2, VariantKind};

/// Owns the nodes and links of one graph and moves them toward equilibrium.
pub struct Simulation {
	kind: VariantKind,
	nodes: Vec<GraphNode>,
	links: Vec<Link>,
	config: LayoutConfig,
	center: Vec2,
	alpha: f64,
	alpha_target: f64,
	running: bool,
	/// Positions are externally given; forces never run.
	frozen: bool,
	link_strengths: Vec<f64>,
	link_biases: Vec<f64>,
	positions: Vec<Vec2>,
}

impl Simulation {
	/// Starts hot (alpha 1) unless the graph has a fixed layout.
	pub fn new(graph: GraphModel, config: LayoutConfig, center: Vec2) -> Self {
		let mut degree = vec![0usize; graph.nodes.len()];
		for link in &graph.links {
			degree[link.source.0] += 1;
			degree[link.target.0] += 1;
		}
		let (link_strengths, link_biases) = graph
			.links
			.iter()
			.map(|link| {
				let (s, t) = (degree[link.source.0] as f64, degree[link.target.0] as f64);
				(1.0 / s.min(t).max(1.0), s / (s + t).max(1.0))
			})
			.unzip();

		let frozen = graph.fixed_layout;
		Self {
			kind: graph.kind,
			nodes: graph.nodes,
			links: graph.links,
			config,
			center,
			alpha: if frozen { 0.0 } else { 1.0 },
			alpha_target: 0.0,
			running: !frozen,
			frozen,
			link_strengths,
			link_biases,
			positions: Vec::new(),
		}
	}

	/// Dataset the graph was built from.
	pub fn kind(&self) -> VariantKind {
		self.kind
	}

	/// Nodes in draw order.
	pub fn nodes(&self) -> &[GraphNode] {
		&self.nodes
	}

	/// Resolved links.
	pub fn links(&self) -> &[Link] {
		&self.links
	}

	/// Looks up a node by index.
	pub fn node(&self, node: NodeRef) -> Option<&GraphNode> {
		self.nodes.get(node.0)
	}

	/// Current temperature; forces scale with it.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Temperature alpha is decaying toward.
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// Another tick would move something.
	pub fn is_running(&self) -> bool {
		self.running
	}

	/// Positions came from the payload and no force ever runs.
	pub fn is_frozen(&self) -> bool {
		self.frozen
	}

	/// Moves the point the centre force pulls toward.
	pub fn set_center(&mut self, center: Vec2) {
		self.center = center;
	}

	/// Holds `node` at `position` until [`Simulation::unpin`].
	pub fn pin(&mut self, node: NodeRef, position: Vec2) {
		if !position.is_finite() {
			return;
		}
		if let Some(node) = self.nodes.get_mut(node.0) {
			node.pinned = Some(position);
			node.position = position;
			node.velocity = Vec2::ZERO;
		}
	}

	/// Releases a pinned node to the forces again.
	pub fn unpin(&mut self, node: NodeRef) {
		if let Some(node) = self.nodes.get_mut(node.0) {
			node.pinned = None;
		}
	}

	/// Keeps the layout live at `target` while the user manipulates it.
	pub fn reheat(&mut self, target: f64) {
		if self.frozen {
			return;
		}
		self.alpha_target = target;
		self.alpha = self.alpha.max(target);
		self.running = true;
	}

	/// Lets the layout decay back to rest.
	pub fn cool(&mut self) {
		self.alpha_target = 0.0;
	}

	/// Wakes a settled layout at `alpha` without sustaining it.
	pub fn restart(&mut self, alpha: f64) {
		if self.frozen {
			return;
		}
		self.alpha = self.alpha.max(alpha);
		self.running = true;
	}

	/// Halts ticking until the next reheat or restart.
	pub fn stop(&mut self) {
		self.running = false;
	}

	/// Advances one step. Returns whether the simulation is still running.
	pub fn tick(&mut self) -> bool {
		if !self.running {
			return false;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;
		let alpha = self.alpha;

		self.apply_links(alpha);
		self.apply_charge(alpha);
		self.apply_center(alpha);
		for _ in 0..self.config.collision_iterations {
			self.apply_collision();
		}
		self.integrate();

		if self.alpha < self.config.alpha_min {
			trace!("layout settled");
			self.running = false;
		}
		self.running
	}

	fn apply_links(&mut self, alpha: f64) {
		let distance = self.config.link_distance;
		for (i, link) in self.links.iter().enumerate() {
			let (s, t) = (link.source.0, link.target.0);
			if s == t {
				continue;
			}
			let source = &self.nodes[s];
			let target = &self.nodes[t];
			let mut delta = (target.position + target.velocity) - (source.position + source.velocity);
			if delta.length_sq() == 0.0 {
				delta = jiggle(s, t);
			}
			let length = delta.length();
			let correction = delta * ((length - distance) / length * alpha * self.link_strengths[i]);
			let bias = self.link_biases[i];
			self.nodes[t].velocity -= correction * bias;
			self.nodes[s].velocity += correction * (1.0 - bias);
		}
	}

	fn apply_charge(&mut self, alpha: f64) {
		if self.nodes.len() < 2 || self.config.charge_strength == 0.0 {
			return;
		}
		self.positions.clear();
		self.positions.extend(self.nodes.iter().map(|node| node.position));
		let Some(tree) = Quadtree::build(&self.positions) else {
			return;
		};
		let params = ChargeParams {
			weighted_strength: self.config.charge_strength * alpha,
			theta_sq: self.config.theta * self.config.theta,
			distance_min_sq: self.config.charge_distance_min * self.config.charge_distance_min,
		};
		for (index, node) in self.nodes.iter_mut().enumerate() {
			tree.accumulate_charge(index, &self.positions, params, &mut node.velocity);
		}
	}

	/// Pulls every free node toward the centre, proportionally to its offset.
	fn apply_center(&mut self, alpha: f64) {
		let pull = self.config.center_strength * alpha;
		for node in self.nodes.iter_mut().filter(|node| node.pinned.is_none()) {
			node.velocity += (self.center - node.position) * pull;
		}
	}

	/// Pushes overlapping circles apart using predicted positions. A sweep
	/// over x keeps this close to linear for sparse layouts.
	fn apply_collision(&mut self) {
		let padding = self.config.collision_padding;
		let strength = self.config.collision_strength;
		let count = self.nodes.len();
		if count < 2 {
			return;
		}

		let max_radius = self
			.nodes
			.iter()
			.map(|node| node.radius + padding)
			.fold(0.0_f64, f64::max);
		let mut order: Vec<usize> = (0..count).collect();
		let predicted_x: Vec<f64> = self
			.nodes
			.iter()
			.map(|node| node.position.x + node.velocity.x)
			.collect();
		order.sort_by(|a, b| predicted_x[*a].total_cmp(&predicted_x[*b]));

		for (rank, &i) in order.iter().enumerate() {
			let ri = self.nodes[i].radius + padding;
			for &j in &order[rank + 1..] {
				if predicted_x[j] - predicted_x[i] > ri + max_radius {
					break;
				}
				let rj = self.nodes[j].radius + padding;
				let reach = ri + rj;
				let a = self.nodes[i].position + self.nodes[i].velocity;
				let b = self.nodes[j].position + self.nodes[j].velocity;
				let mut delta = a - b;
				let mut distance_sq = delta.length_sq();
				if distance_sq >= reach * reach {
					continue;
				}
				if distance_sq == 0.0 {
					delta = jiggle(j, i);
					distance_sq = delta.length_sq();
				}
				let distance = distance_sq.sqrt();
				let push = delta * ((reach - distance) / distance * strength);
				let (wi, wj) = (ri * ri, rj * rj);
				self.nodes[i].velocity += push * (wj / (wi + wj));
				self.nodes[j].velocity -= push * (wi / (wi + wj));
			}
		}
	}

	fn integrate(&mut self) {
		let keep = 1.0 - self.config.velocity_decay;
		for node in &mut self.nodes {
			if let Some(pin) = node.pinned {
				node.position = pin;
				node.velocity = Vec2::ZERO;
				continue;
			}
			node.velocity = node.velocity * keep;
			if !node.velocity.is_finite() {
				node.velocity = Vec2::ZERO;
			}
			node.position += node.velocity;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{EdgeVariant, NodeId, NodeVariant};

	fn node(id: i64, x: f64, y: f64, radius: f64) -> GraphNode {
		GraphNode {
			id: NodeId::Int(id),
			label: format!("n{id}"),
			radius,
			position: Vec2::new(x, y),
			velocity: Vec2::ZERO,
			pinned: None,
			variant: NodeVariant::Relationship {
				memory_type: "fact".into(),
				importance: 0.5,
				project: None,
				cluster_id: None,
			},
		}
	}

	fn link(s: usize, t: usize) -> Link {
		Link {
			source: NodeRef(s),
			target: NodeRef(t),
			label: String::new(),
			variant: EdgeVariant::Relationship {
				relation: "related".into(),
				color: None,
			},
		}
	}

	fn simulation(nodes: Vec<GraphNode>, links: Vec<Link>) -> Simulation {
		let graph = GraphModel {
			kind: VariantKind::Relationship,
			nodes,
			links,
			fixed_layout: false,
		};
		Simulation::new(graph, LayoutConfig::default(), Vec2::new(400.0, 300.0))
	}

	fn settle(sim: &mut Simulation) -> usize {
		let mut ticks = 0;
		while sim.tick() {
			ticks += 1;
			assert!(ticks < 5_000, "simulation never settled");
		}
		ticks
	}

	#[test]
	fn alpha_decays_to_the_floor_and_stops() {
		let mut sim = simulation(vec![node(1, 390.0, 300.0, 5.0), node(2, 410.0, 300.0, 5.0)], vec![link(0, 1)]);
		let ticks = settle(&mut sim);
		assert!(ticks > 100);
		assert!(sim.alpha() < LayoutConfig::default().alpha_min);
		assert!(!sim.is_running());
		assert!(!sim.tick());
	}

	#[test]
	fn linked_nodes_approach_link_distance() {
		let mut sim = simulation(vec![node(1, 395.0, 300.0, 5.0), node(2, 405.0, 300.0, 5.0)], vec![link(0, 1)]);
		settle(&mut sim);
		let d = sim.nodes()[0].position.distance(sim.nodes()[1].position);
		assert!(d > 80.0, "linked nodes too close: {d}");
		assert!(d < 250.0, "linked nodes too far: {d}");
	}

	#[test]
	fn settled_layout_has_no_overlaps() {
		let nodes: Vec<GraphNode> = (0..24)
			.map(|i| {
				let angle = i as f64 * 0.7;
				node(i, 400.0 + angle.cos() * (i as f64), 300.0 + angle.sin() * (i as f64), 5.0 + (i % 4) as f64 * 4.0)
			})
			.collect();
		let links = (1..24).map(|i| link(i / 2, i)).collect();
		let mut sim = simulation(nodes, links);
		settle(&mut sim);

		let nodes = sim.nodes();
		for i in 0..nodes.len() {
			for j in i + 1..nodes.len() {
				let d = nodes[i].position.distance(nodes[j].position);
				assert!(
					d >= nodes[i].radius + nodes[j].radius - 1.0,
					"nodes {i} and {j} overlap: {d}"
				);
			}
		}
	}

	#[test]
	fn free_nodes_stay_centred() {
		let mut sim = simulation(
			vec![node(1, 100.0, 100.0, 5.0), node(2, 120.0, 90.0, 5.0), node(3, 90.0, 130.0, 5.0)],
			vec![],
		);
		settle(&mut sim);
		let centroid = sim.nodes().iter().fold(Vec2::ZERO, |acc, n| acc + n.position) / 3.0;
		assert!(centroid.distance(Vec2::new(400.0, 300.0)) < 5.0, "centroid drifted: {centroid:?}");
	}

	#[test]
	fn pinned_nodes_do_not_move() {
		let mut sim = simulation(vec![node(1, 300.0, 300.0, 5.0), node(2, 305.0, 300.0, 5.0)], vec![link(0, 1)]);
		let pin = Vec2::new(250.0, 250.0);
		sim.pin(NodeRef(0), pin);
		for _ in 0..50 {
			sim.tick();
		}
		assert_eq!(sim.nodes()[0].position, pin);
		sim.unpin(NodeRef(0));
		sim.tick();
		assert!(sim.nodes()[0].pinned.is_none());
	}

	#[test]
	fn reheat_sustains_alpha_until_cooled() {
		let mut sim = simulation(vec![node(1, 390.0, 300.0, 5.0), node(2, 410.0, 300.0, 5.0)], vec![link(0, 1)]);
		settle(&mut sim);
		sim.reheat(0.3);
		assert!(sim.is_running());
		for _ in 0..2_000 {
			assert!(sim.tick());
		}
		assert!((sim.alpha() - 0.3).abs() < 1e-3);
		sim.cool();
		settle(&mut sim);
		assert!(!sim.is_running());
	}

	#[test]
	fn stop_halts_ticking() {
		let mut sim = simulation(vec![node(1, 390.0, 300.0, 5.0)], vec![]);
		sim.stop();
		let before = sim.alpha();
		assert!(!sim.tick());
		assert_eq!(sim.alpha(), before);
	}

	#[test]
	fn coincident_nodes_separate_without_nan() {
		let mut sim = simulation((0..5).map(|i| node(i, 400.0, 300.0, 6.0)).collect(), vec![]);
		for _ in 0..300 {
			sim.tick();
		}
		for n in sim.nodes() {
			assert!(n.position.is_finite());
		}
		assert!(sim.nodes()[0].position.distance(sim.nodes()[1].position) > 1.0);
	}

	#[test]
	fn frozen_layouts_never_run() {
		let graph = GraphModel {
			kind: VariantKind::Relationship,
			nodes: vec![node(1, 10.0, 10.0, 5.0), node(2, 10.0, 10.0, 5.0)],
			links: vec![],
			fixed_layout: true,
		};
		let mut sim = Simulation::new(graph, LayoutConfig::default(), Vec2::ZERO);
		sim.reheat(0.3);
		assert!(!sim.tick());
		assert_eq!(sim.nodes()[0].position, Vec2::new(10.0, 10.0));
		sim.pin(NodeRef(1), Vec2::new(50.0, 60.0));
		assert_eq!(sim.nodes()[1].position, Vec2::new(50.0, 60.0));
	}
}
