use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A point or offset, in either screen pixels or simulation units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
	/// Horizontal component.
	pub x: f64,
	/// Vertical component, growing downward.
	pub y: f64,
}

impl Vec2 {
	/// The origin.
	pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

	/// Builds a vector from its components.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Squared Euclidean length.
	pub fn length_sq(self) -> f64 {
		self.x * self.x + self.y * self.y
	}

	/// Euclidean length.
	pub fn length(self) -> f64 {
		self.length_sq().sqrt()
	}

	/// Squared distance to `other`.
	pub fn distance_sq(self, other: Self) -> f64 {
		(self - other).length_sq()
	}

	/// Distance to `other`.
	pub fn distance(self, other: Self) -> f64 {
		self.distance_sq(other).sqrt()
	}

	/// Point halfway to `other`.
	pub fn midpoint(self, other: Self) -> Self {
		(self + other) * 0.5
	}

	/// Neither component is NaN or infinite.
	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}
}

impl Add for Vec2 {
	type Output = Self;
	fn add(self, rhs: Self) -> Self {
		Self::new(self.x + rhs.x, self.y + rhs.y)
	}
}

impl AddAssign for Vec2 {
	fn add_assign(&mut self, rhs: Self) {
		self.x += rhs.x;
		self.y += rhs.y;
	}
}

impl Sub for Vec2 {
	type Output = Self;
	fn sub(self, rhs: Self) -> Self {
		Self::new(self.x - rhs.x, self.y - rhs.y)
	}
}

impl SubAssign for Vec2 {
	fn sub_assign(&mut self, rhs: Self) {
		self.x -= rhs.x;
		self.y -= rhs.y;
	}
}

impl Mul<f64> for Vec2 {
	type Output = Self;
	fn mul(self, rhs: f64) -> Self {
		Self::new(self.x * rhs, self.y * rhs)
	}
}

impl Div<f64> for Vec2 {
	type Output = Self;
	fn div(self, rhs: f64) -> Self {
		Self::new(self.x / rhs, self.y / rhs)
	}
}

/// Backend identifier: memories use integer ids, knowledge entities use strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId {
	/// Memory id.
	Int(i64),
	/// Entity id.
	Str(String),
}

impl Default for NodeId {
	fn default() -> Self {
		Self::Int(0)
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Int(id) => write!(f, "{id}"),
			Self::Str(id) => f.write_str(id),
		}
	}
}

impl From<i64> for NodeId {
	fn from(id: i64) -> Self {
		Self::Int(id)
	}
}

impl From<&str> for NodeId {
	fn from(id: &str) -> Self {
		Self::Str(id.to_owned())
	}
}

/// Which of the supported datasets a graph was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
	/// Memory-to-memory relationship graph (also used by the embedding scatter plot).
	Relationship,
	/// Typed knowledge-entity graph.
	Entity,
}

// ---------------------------------------------------------------------------
// Raw payloads, as served by the memory API
// ---------------------------------------------------------------------------

/// A memory in the relationship graph payload.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryNode {
	/// Memory id.
	pub id: NodeId,
	/// Full memory text; the label falls back to its start.
	pub content: String,
	/// Short display label.
	pub label: Option<String>,
	/// Category, e.g. `fact` or `preference`.
	pub memory_type: String,
	/// Importance in `0..=1`; drives the radius.
	pub importance: f64,
	/// Owning project, if any.
	pub project: Option<String>,
	/// Cluster assigned by the server, for cluster colouring.
	pub cluster_id: Option<i64>,
	/// Explicit radius computed by the server, overriding importance.
	pub size: Option<f64>,
}

/// Raw relationship edge: endpoints are still bare ids.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawMemoryEdge {
	/// Id of the source memory.
	#[serde(rename = "source")]
	pub source_id: NodeId,
	/// Id of the target memory.
	#[serde(rename = "target")]
	pub target_id: NodeId,
	/// Relation name, e.g. `supports`.
	#[serde(alias = "relation")]
	pub relation_type: String,
	/// Explicit stroke colour.
	pub color: Option<String>,
	/// Display label; defaults to the relation.
	pub label: Option<String>,
}

/// `GET /graph` response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipPayload {
	/// Memories.
	pub nodes: Vec<MemoryNode>,
	/// Relationships between them.
	pub edges: Vec<RawMemoryEdge>,
	/// Server statistics, passed through untouched.
	pub stats: serde_json::Map<String, serde_json::Value>,
}

/// A knowledge entity.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityNode {
	/// Entity id.
	pub id: NodeId,
	/// Display name.
	pub name: String,
	/// Type, e.g. `person` or `library`; drives the colour.
	pub entity_type: String,
	/// Statements mentioning the entity; drives the radius.
	pub statement_count: u32,
	/// Owning project, if any.
	pub project_id: Option<String>,
}

/// Raw knowledge statement linking two entities.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEntityEdge {
	/// Subject entity id.
	#[serde(rename = "source")]
	pub source_id: NodeId,
	/// Object entity id.
	#[serde(rename = "target")]
	pub target_id: NodeId,
	/// Statement predicate, e.g. `written_in`.
	pub predicate: String,
	/// Natural-language form of the statement.
	pub fact: Option<String>,
	/// Grouping used for edge colour.
	pub aspect: Option<String>,
}

/// `GET /knowledge/graph` response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityPayload {
	/// Entities.
	pub nodes: Vec<EntityNode>,
	/// Statements linking them.
	pub edges: Vec<RawEntityEdge>,
	/// Server statistics, passed through untouched.
	pub stats: serde_json::Map<String, serde_json::Value>,
}

/// One projected memory embedding.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingPoint {
	/// Memory id.
	pub id: NodeId,
	/// Projected x, in embedding units.
	pub x: f64,
	/// Projected y, in embedding units.
	pub y: f64,
	/// Display label.
	pub label: String,
	/// Memory category.
	pub memory_type: String,
	/// Importance in `0..=1`.
	pub importance: f64,
	/// Cluster, for cluster colouring.
	pub cluster_id: Option<i64>,
}

/// `GET /embeddings/projection` response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingPayload {
	/// Projected points.
	pub points: Vec<EmbeddingPoint>,
}

/// Everything the canvas can be handed by the data-fetching layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum GraphPayload {
	/// Memory relationship graph.
	Relationship(RelationshipPayload),
	/// Knowledge-entity graph.
	Entity(EntityPayload),
	/// 2-D embedding scatter plot.
	Embedding(EmbeddingPayload),
}

impl Default for GraphPayload {
	fn default() -> Self {
		Self::Relationship(RelationshipPayload::default())
	}
}

impl GraphPayload {
	/// Number of nodes (or points) in the payload.
	pub fn len(&self) -> usize {
		match self {
			Self::Relationship(p) => p.nodes.len(),
			Self::Entity(p) => p.nodes.len(),
			Self::Embedding(p) => p.points.len(),
		}
	}

	/// No nodes or points.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

// ---------------------------------------------------------------------------
// Adapted graph
// ---------------------------------------------------------------------------

/// Index of a node in its owning [`GraphModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(pub usize);

/// Index of a link in its owning [`GraphModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LinkRef(pub usize);

/// Dataset-specific node attributes.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeVariant {
	/// A memory.
	Relationship {
		/// Memory category.
		memory_type: String,
		/// Importance in `0..=1`.
		importance: f64,
		/// Owning project.
		project: Option<String>,
		/// Server-assigned cluster.
		cluster_id: Option<i64>,
	},
	/// A knowledge entity.
	Entity {
		/// Entity type.
		entity_type: String,
		/// Statements mentioning it.
		statement_count: u32,
		/// Owning project.
		project_id: Option<String>,
	},
}

impl NodeVariant {
	/// The dataset this variant belongs to.
	pub fn kind(&self) -> VariantKind {
		match self {
			Self::Relationship { .. } => VariantKind::Relationship,
			Self::Entity { .. } => VariantKind::Entity,
		}
	}
}

/// Dataset-specific edge attributes.
#[derive(Clone, Debug, PartialEq)]
pub enum EdgeVariant {
	/// A memory relationship.
	Relationship {
		/// Relation name.
		relation: String,
		/// Explicit stroke colour.
		color: Option<String>,
	},
	/// A knowledge statement.
	Entity {
		/// Statement predicate.
		predicate: String,
		/// Natural-language statement.
		fact: Option<String>,
		/// Grouping used for colour.
		aspect: Option<String>,
	},
}

/// A node as the simulation and renderer see it.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Payload id.
	pub id: NodeId,
	/// Display label.
	pub label: String,
	/// Radius in simulation units.
	pub radius: f64,
	/// Position in simulation space.
	pub position: Vec2,
	/// Velocity carried between ticks.
	pub velocity: Vec2,
	/// Set only while the node is held by a drag.
	pub pinned: Option<Vec2>,
	/// Dataset-specific attributes.
	pub variant: NodeVariant,
}

impl GraphNode {
	/// The dataset this node belongs to.
	pub fn kind(&self) -> VariantKind {
		self.variant.kind()
	}
}

/// An edge whose endpoints have been resolved to node indices.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	/// Source node.
	pub source: NodeRef,
	/// Target node.
	pub target: NodeRef,
	/// Display label.
	pub label: String,
	/// Dataset-specific attributes.
	pub variant: EdgeVariant,
}

impl Link {
	/// The endpoint opposite `node`, if `node` is an endpoint at all.
	pub fn other(&self, node: NodeRef) -> Option<NodeRef> {
		if self.source == node {
			Some(self.target)
		} else if self.target == node {
			Some(self.source)
		} else {
			None
		}
	}
}

/// Adapter output, handed to the simulation.
#[derive(Clone, Debug)]
pub struct GraphModel {
	/// Dataset the graph was built from.
	pub kind: VariantKind,
	/// Nodes in draw order; later nodes are on top.
	pub nodes: Vec<GraphNode>,
	/// Links between `nodes`.
	pub links: Vec<Link>,
	/// Positions come from the payload and physics must not run.
	pub fixed_layout: bool,
}

impl GraphModel {
	/// A graph with no nodes.
	pub fn empty(kind: VariantKind) -> Self {
		Self {
			kind,
			nodes: Vec::new(),
			links: Vec::new(),
			fixed_layout: false,
		}
	}
}

/// Device-independent canvas size plus the device pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSize {
	/// CSS pixels.
	pub width: f64,
	/// CSS pixels.
	pub height: f64,
	/// Device pixels per CSS pixel.
	pub pixel_ratio: f64,
}

impl SurfaceSize {
	/// Width used when the container cannot be measured.
	pub const DEFAULT_WIDTH: f64 = 800.0;
	/// Height used when none is given.
	pub const DEFAULT_HEIGHT: f64 = 600.0;

	/// Zero, negative or non-finite dimensions fall back to defaults.
	pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Self {
		let sane = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
		Self {
			width: sane(width, Self::DEFAULT_WIDTH),
			height: sane(height, Self::DEFAULT_HEIGHT),
			pixel_ratio: sane(pixel_ratio, 1.0),
		}
	}

	/// Centre of the surface, where layouts gather.
	pub fn center(&self) -> Vec2 {
		Vec2::new(self.width / 2.0, self.height / 2.0)
	}
}

impl Default for SurfaceSize {
	fn default() -> Self {
		Self::new(Self::DEFAULT_WIDTH, Self::DEFAULT_HEIGHT, 1.0)
	}
}
