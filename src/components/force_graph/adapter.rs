//! Projects backend payloads onto the unified node/link model.
//!
//! This is best-effort: malformed content is clamped or dropped, never
//! reported. Links reference nodes by [`NodeRef`] into the returned node
//! array, so the simulation can move nodes in place.

use std::collections::HashMap;

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::config::LayoutConfig;
use super::error::Result;
use super::types::{
	EdgeVariant, EmbeddingPayload, EntityPayload, GraphModel, GraphNode, GraphPayload, Link,
	NodeId, NodeRef, NodeVariant, RelationshipPayload, SurfaceSize, Vec2, VariantKind,
};

const FALLBACK_RADIUS: f64 = 5.0;
const SCATTER_MARGIN: f64 = 40.0;

impl GraphPayload {
	/// Decodes a memory relationship graph response.
	pub fn relationship_from_json(json: &str) -> Result<Self> {
		Ok(Self::Relationship(serde_json::from_str(json)?))
	}

	/// Decodes a knowledge graph response.
	pub fn entity_from_json(json: &str) -> Result<Self> {
		Ok(Self::Entity(serde_json::from_str(json)?))
	}

	/// Decodes an embedding projection response.
	pub fn embedding_from_json(json: &str) -> Result<Self> {
		Ok(Self::Embedding(serde_json::from_str(json)?))
	}
}

/// Radius of a knowledge entity, grown by the number of statements about it.
pub fn entity_radius(statement_count: u32) -> f64 {
	(4.0 + f64::from(statement_count).sqrt() * 3.0).clamp(5.0, 20.0)
}

/// Radius of a memory: a positive server-provided size wins, else importance.
pub fn memory_radius(importance: f64, size: Option<f64>) -> f64 {
	if let Some(size) = size.filter(|s| s.is_finite() && *s > 0.0) {
		return size;
	}
	let importance = if importance.is_finite() {
		importance.clamp(0.0, 1.0)
	} else {
		0.0
	};
	5.0 + importance * 8.0
}

fn sane_radius(radius: f64) -> f64 {
	if radius.is_finite() && radius > 0.0 {
		radius
	} else {
		FALLBACK_RADIUS
	}
}

/// Seeds positions around the canvas centre so the solver never starts from
/// a single degenerate point.
struct Seeder {
	rng: SmallRng,
	center: Vec2,
	jitter: f64,
}

impl Seeder {
	fn new(seed: u64, surface: SurfaceSize, jitter: f64) -> Self {
		let jitter = if jitter.is_finite() { jitter.abs() } else { 0.0 };
		Self {
			rng: SmallRng::seed_from_u64(seed),
			center: surface.center(),
			jitter,
		}
	}

	fn next(&mut self) -> Vec2 {
		let dx = self.rng.gen_range(-self.jitter..=self.jitter);
		let dy = self.rng.gen_range(-self.jitter..=self.jitter);
		self.center + Vec2::new(dx, dy)
	}
}

/// Builds nodes from `items`, skipping repeated ids, and returns the id index.
fn collect_nodes<T>(
	items: &[T],
	mut project: impl FnMut(&T) -> (NodeId, GraphNode),
) -> (Vec<GraphNode>, HashMap<NodeId, NodeRef>) {
	let mut nodes = Vec::with_capacity(items.len());
	let mut index = HashMap::with_capacity(items.len());
	for item in items {
		let (id, node) = project(item);
		if index.contains_key(&id) {
			warn!("duplicate node id {id} in graph payload, keeping the first");
			continue;
		}
		index.insert(id, NodeRef(nodes.len()));
		nodes.push(node);
	}
	(nodes, index)
}

fn resolve(index: &HashMap<NodeId, NodeRef>, source: &NodeId, target: &NodeId) -> Option<(NodeRef, NodeRef)> {
	Some((*index.get(source)?, *index.get(target)?))
}

fn log_dropped(kind: VariantKind, total: usize, kept: usize) {
	if total > kept {
		debug!(
			"{kind:?} graph: dropped {} of {total} edges with missing endpoints",
			total - kept
		);
	}
}

/// Adapts any supported payload for a canvas of the given size.
pub fn build_graph(payload: &GraphPayload, surface: SurfaceSize, layout: &LayoutConfig, seed: u64) -> GraphModel {
	let mut seeder = Seeder::new(seed, surface, layout.seed_jitter);
	let model = match payload {
		GraphPayload::Relationship(p) => build_relationship_graph(p, &mut seeder),
		GraphPayload::Entity(p) => build_entity_graph(p, &mut seeder),
		GraphPayload::Embedding(p) => build_scatter_graph(p, surface),
	};
	debug!(
		"adapted {:?} graph: {} nodes, {} links",
		model.kind,
		model.nodes.len(),
		model.links.len()
	);
	model
}

fn build_relationship_graph(payload: &RelationshipPayload, seeder: &mut Seeder) -> GraphModel {
	let (nodes, index) = collect_nodes(&payload.nodes, |memory| {
		let label = memory
			.label
			.clone()
			.filter(|l| !l.is_empty())
			.unwrap_or_else(|| memory.content.clone());
		let node = GraphNode {
			id: memory.id.clone(),
			label,
			radius: sane_radius(memory_radius(memory.importance, memory.size)),
			position: seeder.next(),
			velocity: Vec2::ZERO,
			pinned: None,
			variant: NodeVariant::Relationship {
				memory_type: memory.memory_type.clone(),
				importance: memory.importance,
				project: memory.project.clone(),
				cluster_id: memory.cluster_id,
			},
		};
		(memory.id.clone(), node)
	});

	let links: Vec<Link> = payload
		.edges
		.iter()
		.filter_map(|edge| {
			let (source, target) = resolve(&index, &edge.source_id, &edge.target_id)?;
			Some(Link {
				source,
				target,
				label: edge
					.label
					.clone()
					.unwrap_or_else(|| edge.relation_type.replace('_', " ")),
				variant: EdgeVariant::Relationship {
					relation: edge.relation_type.clone(),
					color: edge.color.clone(),
				},
			})
		})
		.collect();
	log_dropped(VariantKind::Relationship, payload.edges.len(), links.len());

	GraphModel {
		kind: VariantKind::Relationship,
		nodes,
		links,
		fixed_layout: false,
	}
}

fn build_entity_graph(payload: &EntityPayload, seeder: &mut Seeder) -> GraphModel {
	let (nodes, index) = collect_nodes(&payload.nodes, |entity| {
		let node = GraphNode {
			id: entity.id.clone(),
			label: entity.name.clone(),
			radius: entity_radius(entity.statement_count),
			position: seeder.next(),
			velocity: Vec2::ZERO,
			pinned: None,
			variant: NodeVariant::Entity {
				entity_type: entity.entity_type.clone(),
				statement_count: entity.statement_count,
				project_id: entity.project_id.clone(),
			},
		};
		(entity.id.clone(), node)
	});

	let links: Vec<Link> = payload
		.edges
		.iter()
		.filter_map(|edge| {
			let (source, target) = resolve(&index, &edge.source_id, &edge.target_id)?;
			Some(Link {
				source,
				target,
				label: edge.predicate.replace('_', " "),
				variant: EdgeVariant::Entity {
					predicate: edge.predicate.clone(),
					fact: edge.fact.clone(),
					aspect: edge.aspect.clone(),
				},
			})
		})
		.collect();
	log_dropped(VariantKind::Entity, payload.edges.len(), links.len());

	GraphModel {
		kind: VariantKind::Entity,
		nodes,
		links,
		fixed_layout: false,
	}
}

/// Fits projected embeddings into the canvas, preserving aspect ratio.
fn build_scatter_graph(payload: &EmbeddingPayload, surface: SurfaceSize) -> GraphModel {
	let finite = payload.points.iter().filter(|p| p.x.is_finite() && p.y.is_finite());
	let (mut min, mut max) = (
		Vec2::new(f64::INFINITY, f64::INFINITY),
		Vec2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
	);
	for point in finite {
		min = Vec2::new(min.x.min(point.x), min.y.min(point.y));
		max = Vec2::new(max.x.max(point.x), max.y.max(point.y));
	}
	let span = (max.x - min.x).max(max.y - min.y);
	let usable = (surface.width.min(surface.height) - 2.0 * SCATTER_MARGIN).max(1.0);
	let scale = if span.is_finite() && span > 0.0 {
		usable / span
	} else {
		0.0
	};
	let data_center = min.midpoint(max);
	let center = surface.center();

	let (nodes, _) = collect_nodes(&payload.points, |point| {
		let position = if point.x.is_finite() && point.y.is_finite() && scale > 0.0 {
			center + (Vec2::new(point.x, point.y) - data_center) * scale
		} else {
			center
		};
		let node = GraphNode {
			id: point.id.clone(),
			label: point.label.clone(),
			radius: sane_radius(memory_radius(point.importance, None) * 0.6),
			position,
			velocity: Vec2::ZERO,
			pinned: None,
			variant: NodeVariant::Relationship {
				memory_type: point.memory_type.clone(),
				importance: point.importance,
				project: None,
				cluster_id: point.cluster_id,
			},
		};
		(point.id.clone(), node)
	});

	GraphModel {
		kind: VariantKind::Relationship,
		nodes,
		links: Vec::new(),
		fixed_layout: true,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{EmbeddingPoint, EntityNode, MemoryNode, RawEntityEdge, RawMemoryEdge};

	fn memory(id: i64) -> MemoryNode {
		MemoryNode {
			id: NodeId::Int(id),
			content: format!("memory {id}"),
			memory_type: "fact".into(),
			importance: 0.5,
			..Default::default()
		}
	}

	fn edge(source: i64, target: i64) -> RawMemoryEdge {
		RawMemoryEdge {
			source_id: NodeId::Int(source),
			target_id: NodeId::Int(target),
			relation_type: "related".into(),
			..Default::default()
		}
	}

	fn build(payload: GraphPayload) -> GraphModel {
		build_graph(&payload, SurfaceSize::default(), &LayoutConfig::default(), 7)
	}

	#[test]
	fn dangling_edges_are_dropped() {
		let graph = build(GraphPayload::Relationship(RelationshipPayload {
			nodes: vec![memory(1), memory(2)],
			edges: vec![edge(1, 2), edge(1, 99)],
			..Default::default()
		}));
		assert_eq!(graph.links.len(), 1);
		assert_eq!(graph.links[0].source, NodeRef(0));
		assert_eq!(graph.links[0].target, NodeRef(1));
	}

	#[test]
	fn entity_radius_is_clamped() {
		assert_eq!(entity_radius(0), 5.0);
		assert_eq!(entity_radius(4), 10.0);
		assert_eq!(entity_radius(10_000), 20.0);
	}

	#[test]
	fn memory_radius_prefers_server_size() {
		assert_eq!(memory_radius(1.0, None), 13.0);
		assert_eq!(memory_radius(0.5, Some(9.0)), 9.0);
		assert_eq!(memory_radius(0.5, Some(-1.0)), 9.0);
		assert_eq!(memory_radius(f64::NAN, None), 5.0);
	}

	#[test]
	fn nodes_are_seeded_near_the_centre() {
		let graph = build(GraphPayload::Relationship(RelationshipPayload {
			nodes: (0..50).map(memory).collect(),
			..Default::default()
		}));
		let center = SurfaceSize::default().center();
		let jitter = LayoutConfig::default().seed_jitter;
		for node in &graph.nodes {
			assert!((node.position.x - center.x).abs() <= jitter);
			assert!((node.position.y - center.y).abs() <= jitter);
		}
		let first = graph.nodes[0].position;
		assert!(graph.nodes.iter().any(|n| n.position != first));
	}

	#[test]
	fn seeding_is_deterministic_per_seed() {
		let payload = GraphPayload::Relationship(RelationshipPayload {
			nodes: (0..5).map(memory).collect(),
			..Default::default()
		});
		let a = build(payload.clone());
		let b = build(payload);
		assert_eq!(a.nodes, b.nodes);
	}

	#[test]
	fn duplicate_ids_keep_the_first_node() {
		let mut second = memory(1);
		second.content = "shadow".into();
		let graph = build(GraphPayload::Relationship(RelationshipPayload {
			nodes: vec![memory(1), second],
			..Default::default()
		}));
		assert_eq!(graph.nodes.len(), 1);
		assert_eq!(graph.nodes[0].label, "memory 1");
	}

	#[test]
	fn entity_payload_from_json() {
		let json = r#"{
			"nodes": [
				{"id": "a", "name": "Alice", "entity_type": "person", "statement_count": 9},
				{"id": "b", "name": "Rust", "entity_type": "technology"}
			],
			"edges": [
				{"source": "a", "target": "b", "predicate": "works_with", "fact": "Alice writes Rust"},
				{"source": "a", "target": "ghost", "predicate": "knows"}
			],
			"stats": {"entities": 2}
		}"#;
		let payload = GraphPayload::entity_from_json(json).unwrap();
		let graph = build(payload);
		assert_eq!(graph.kind, VariantKind::Entity);
		assert_eq!(graph.nodes[0].radius, 13.0);
		assert_eq!(graph.links.len(), 1);
		assert_eq!(graph.links[0].label, "works with");
		assert!(matches!(
			&graph.links[0].variant,
			EdgeVariant::Entity { fact: Some(f), .. } if f == "Alice writes Rust"
		));
	}

	#[test]
	fn entity_edges_to_missing_nodes_are_dropped() {
		let graph = build(GraphPayload::Entity(EntityPayload {
			nodes: vec![EntityNode {
				id: "x".into(),
				name: "X".into(),
				..Default::default()
			}],
			edges: vec![RawEntityEdge {
				source_id: "x".into(),
				target_id: "y".into(),
				..Default::default()
			}],
			..Default::default()
		}));
		assert!(graph.links.is_empty());
	}

	#[test]
	fn invalid_json_is_an_error() {
		assert!(GraphPayload::relationship_from_json("[1, 2").is_err());
	}

	#[test]
	fn scatter_points_fit_inside_the_canvas() {
		let point = |id: i64, x: f64, y: f64| EmbeddingPoint {
			id: NodeId::Int(id),
			x,
			y,
			label: format!("p{id}"),
			..Default::default()
		};
		let surface = SurfaceSize::default();
		let graph = build_graph(
			&GraphPayload::Embedding(EmbeddingPayload {
				points: vec![point(1, -3.0, -1.0), point(2, 5.0, 2.0), point(3, f64::NAN, 0.0)],
			}),
			surface,
			&LayoutConfig::default(),
			1,
		);
		assert!(graph.fixed_layout);
		for node in &graph.nodes {
			assert!(node.position.x >= SCATTER_MARGIN - 1e-9);
			assert!(node.position.x <= surface.width - SCATTER_MARGIN + 1e-9);
			assert!(node.position.y >= 0.0 && node.position.y <= surface.height);
		}
		assert_eq!(graph.nodes[2].position, surface.center());
	}
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod proptests {
	use std::collections::HashSet;

	use proptest::prelude::*;

	use super::*;
	use crate::components::force_graph::types::{MemoryNode, RawMemoryEdge};

	proptest! {
		#[test]
		fn link_exists_iff_both_endpoints_exist(
			ids in proptest::collection::hash_set(0i64..40, 0..20),
			edges in proptest::collection::vec((0i64..40, 0i64..40), 0..60),
		) {
			let payload = GraphPayload::Relationship(RelationshipPayload {
				nodes: ids.iter().map(|&id| MemoryNode { id: NodeId::Int(id), ..Default::default() }).collect(),
				edges: edges
					.iter()
					.map(|&(s, t)| RawMemoryEdge { source_id: NodeId::Int(s), target_id: NodeId::Int(t), ..Default::default() })
					.collect(),
				..Default::default()
			});
			let graph = build_graph(&payload, SurfaceSize::default(), &LayoutConfig::default(), 3);
			let present: HashSet<i64> = ids;
			let expected: Vec<(i64, i64)> = edges
				.into_iter()
				.filter(|(s, t)| present.contains(s) && present.contains(t))
				.collect();
			let built: Vec<(i64, i64)> = graph
				.links
				.iter()
				.map(|l| {
					let id = |r: NodeRef| match &graph.nodes[r.0].id { NodeId::Int(i) => *i, NodeId::Str(_) => -1 };
					(id(l.source), id(l.target))
				})
				.collect();
			prop_assert_eq!(built, expected);
		}
	}
}
