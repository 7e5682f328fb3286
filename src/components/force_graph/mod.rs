//! Force-directed graph canvas for the memory dashboard: one engine behind
//! the relationship graph, the knowledge-entity graph and the embedding
//! scatter plot.

mod adapter;
mod canvas;
mod component;
mod config;
mod error;
mod highlight;
mod interaction;
mod layout;
mod quadtree;
mod render;
mod scheduler;
mod types;
mod variant;
mod view;
mod viewport;

pub use adapter::{build_graph, entity_radius, memory_radius};
pub use canvas::{FrameLoop, canvas_point, context_2d, fit_canvas, measure_surface, touch_points};
pub use component::ForceGraphCanvas;
pub use config::{GraphConfig, InteractionConfig, LayoutConfig, RenderConfig, ViewportConfig};
pub use error::{GraphError, Result};
pub use highlight::{Emphasis, Highlight};
pub use interaction::{
	GraphEvent, HoverInfo, HoverTarget, InteractionController, InteractionState, PointerInput, Response, Target,
	TouchInput, TouchPhase, hit_edge, hit_node, segment_distance_sq,
};
pub use layout::Simulation;
pub use render::{Painter, Scene, render, truncate_label};
pub use scheduler::FrameScheduler;
pub use types::{
	EdgeVariant, EmbeddingPayload, EmbeddingPoint, EntityNode, EntityPayload, GraphModel, GraphNode, GraphPayload,
	Link, LinkRef, MemoryNode, NodeId, NodeRef, NodeVariant, RawEntityEdge, RawMemoryEdge, RelationshipPayload,
	SurfaceSize, Vec2, VariantKind,
};
pub use variant::{
	ColorMode, EntityBehavior, MemoryBehavior, Relationship, SelectAction, VariantBehavior, VariantTable,
	category_color, cluster_color,
};
pub use view::{GraphView, HoverDetail, HoverSubject, Update};
pub use viewport::ViewportTransform;
