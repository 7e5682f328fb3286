//! Everything that differs between graph variants: colours, labels,
//! tooltips and what selecting a node does. The engine looks behaviour up
//! here by [`VariantKind`] and never matches on variant data itself.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use super::types::{EdgeVariant, GraphNode, Link, NodeRef, NodeVariant, VariantKind};

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

const UNCLUSTERED: &str = "#7f7f7f";

/// How nodes are coloured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
	/// By memory or entity type.
	#[default]
	Type,
	/// By server-assigned cluster; unclustered nodes are grey.
	Cluster,
}

/// Stable palette colour for an arbitrary category name.
pub fn category_color(name: &str) -> &'static str {
	// FNV-1a
	let hash = name
		.bytes()
		.fold(0xcbf2_9ce4_8422_2325_u64, |h, b| (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3));
	COLORS[(hash % COLORS.len() as u64) as usize]
}

/// Palette colour for a cluster id; grey when there is none.
pub fn cluster_color(cluster: Option<i64>) -> &'static str {
	match cluster {
		Some(id) => COLORS[id.rem_euclid(COLORS.len() as i64) as usize],
		None => UNCLUSTERED,
	}
}

fn memory_type_color(memory_type: &str) -> &'static str {
	match memory_type {
		"fact" => "#4e79a7",
		"decision" => "#f28e2b",
		"preference" => "#e15759",
		"pattern" => "#76b7b2",
		"learning" => "#59a14f",
		"context" => "#edc948",
		"conversation" => "#b07aa1",
		"code" => "#ff9da7",
		other => category_color(other),
	}
}

fn entity_type_color(entity_type: &str) -> &'static str {
	match entity_type {
		"person" => "#f28e2b",
		"project" => "#4e79a7",
		"technology" => "#59a14f",
		"concept" => "#b07aa1",
		"organization" => "#e15759",
		"location" => "#76b7b2",
		"tool" => "#edc948",
		other => category_color(other),
	}
}

fn relation_color(relation: &str) -> &'static str {
	match relation {
		"related" | "related_to" => "#64b4ff",
		"supersedes" => "#e15759",
		"derived_from" => "#59a14f",
		"contradicts" => "#ff4d4d",
		"supports" => "#76b7b2",
		"references" => "#edc948",
		other => category_color(other),
	}
}

/// One edge incident to a selected entity, as listed in its side panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
	/// Statement predicate.
	pub predicate: String,
	/// Id of the entity on the far end.
	pub other_id: String,
	/// Label of the entity on the far end.
	pub other_label: String,
	/// Natural-language statement.
	pub fact: Option<String>,
	/// The selected entity is the subject.
	pub outgoing: bool,
}

/// What the host page should open for a clicked node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SelectAction {
	/// Open the memory detail sheet.
	OpenDetail {
		/// Memory id.
		id: String,
		/// Dataset.
		kind: VariantKind,
	},
	/// Show the inline relationship panel of a knowledge entity.
	ShowRelationships {
		/// Entity id.
		id: String,
		/// Dataset.
		kind: VariantKind,
		/// Entity name.
		label: String,
		/// Every statement the entity takes part in.
		relationships: Vec<Relationship>,
	},
}

impl SelectAction {
	/// Payload id of the selected node.
	pub fn id(&self) -> &str {
		match self {
			Self::OpenDetail { id, .. } | Self::ShowRelationships { id, .. } => id,
		}
	}

	/// Dataset of the selected node.
	pub fn kind(&self) -> VariantKind {
		match self {
			Self::OpenDetail { kind, .. } | Self::ShowRelationships { kind, .. } => *kind,
		}
	}
}

/// Variant-specific presentation and selection.
pub trait VariantBehavior {
	/// Fill colour of a node.
	fn node_color<'a>(&self, node: &'a GraphNode, mode: ColorMode) -> Cow<'a, str>;

	/// Stroke colour of an edge.
	fn edge_color<'a>(&self, link: &'a Link) -> Cow<'a, str>;

	/// Tooltip shown while a node is hovered.
	fn node_tooltip(&self, node: &GraphNode) -> String;

	/// Tooltip shown while an edge is hovered: `source → label → target`.
	fn edge_tooltip(&self, link: &Link, nodes: &[GraphNode]) -> String {
		let name = |r: NodeRef| nodes.get(r.0).map(|n| n.label.as_str()).unwrap_or("?");
		format!("{} \u{2192} {} \u{2192} {}", name(link.source), link.label, name(link.target))
	}

	/// What clicking `node` asks the host to do; `None` ignores the click.
	fn select(&self, node: NodeRef, nodes: &[GraphNode], links: &[Link]) -> Option<SelectAction>;
}

/// Memories: coloured by memory type, selection opens the detail sheet.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryBehavior;

impl VariantBehavior for MemoryBehavior {
	fn node_color<'a>(&self, node: &'a GraphNode, mode: ColorMode) -> Cow<'a, str> {
		match (&node.variant, mode) {
			(NodeVariant::Relationship { cluster_id, .. }, ColorMode::Cluster) => {
				Cow::Borrowed(cluster_color(*cluster_id))
			}
			(NodeVariant::Relationship { memory_type, .. }, ColorMode::Type) => {
				Cow::Borrowed(memory_type_color(memory_type))
			}
			(NodeVariant::Entity { entity_type, .. }, _) => Cow::Borrowed(entity_type_color(entity_type)),
		}
	}

	fn edge_color<'a>(&self, link: &'a Link) -> Cow<'a, str> {
		match &link.variant {
			EdgeVariant::Relationship {
				color: Some(color), ..
			} if !color.is_empty() => Cow::Borrowed(color.as_str()),
			EdgeVariant::Relationship { relation, .. } => Cow::Borrowed(relation_color(relation)),
			EdgeVariant::Entity { predicate, .. } => Cow::Borrowed(category_color(predicate)),
		}
	}

	fn node_tooltip(&self, node: &GraphNode) -> String {
		match &node.variant {
			NodeVariant::Relationship {
				memory_type,
				importance,
				project,
				..
			} => {
				let mut text = format!("{} [{memory_type}, importance {importance:.2}]", node.label);
				if let Some(project) = project {
					text.push_str(&format!(" \u{00b7} {project}"));
				}
				text
			}
			NodeVariant::Entity { entity_type, .. } => format!("{} [{entity_type}]", node.label),
		}
	}

	fn select(&self, node: NodeRef, nodes: &[GraphNode], _links: &[Link]) -> Option<SelectAction> {
		let node = nodes.get(node.0)?;
		Some(SelectAction::OpenDetail {
			id: node.id.to_string(),
			kind: node.kind(),
		})
	}
}

/// Knowledge entities: coloured by entity type (edges by aspect),
/// selection lists the entity's statements inline.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityBehavior;

impl VariantBehavior for EntityBehavior {
	fn node_color<'a>(&self, node: &'a GraphNode, mode: ColorMode) -> Cow<'a, str> {
		match &node.variant {
			NodeVariant::Entity { entity_type, .. } => Cow::Borrowed(entity_type_color(entity_type)),
			NodeVariant::Relationship { .. } => MemoryBehavior.node_color(node, mode),
		}
	}

	fn edge_color<'a>(&self, link: &'a Link) -> Cow<'a, str> {
		match &link.variant {
			EdgeVariant::Entity { aspect, predicate, .. } => {
				Cow::Borrowed(category_color(aspect.as_deref().unwrap_or(predicate)))
			}
			EdgeVariant::Relationship { .. } => MemoryBehavior.edge_color(link),
		}
	}

	fn node_tooltip(&self, node: &GraphNode) -> String {
		match &node.variant {
			NodeVariant::Entity {
				entity_type,
				statement_count,
				..
			} => format!("{} [{entity_type}, {statement_count} statements]", node.label),
			NodeVariant::Relationship { .. } => MemoryBehavior.node_tooltip(node),
		}
	}

	fn edge_tooltip(&self, link: &Link, nodes: &[GraphNode]) -> String {
		match &link.variant {
			EdgeVariant::Entity { fact: Some(fact), .. } if !fact.is_empty() => fact.clone(),
			_ => MemoryBehavior.edge_tooltip(link, nodes),
		}
	}

	fn select(&self, node: NodeRef, nodes: &[GraphNode], links: &[Link]) -> Option<SelectAction> {
		let selected = nodes.get(node.0)?;
		let relationships = links
			.iter()
			.filter_map(|link| {
				let other = nodes.get(link.other(node)?.0)?;
				let (predicate, fact) = match &link.variant {
					EdgeVariant::Entity { predicate, fact, .. } => (predicate.clone(), fact.clone()),
					EdgeVariant::Relationship { relation, .. } => (relation.clone(), None),
				};
				Some(Relationship {
					predicate,
					other_id: other.id.to_string(),
					other_label: other.label.clone(),
					fact,
					outgoing: link.source == node,
				})
			})
			.collect();
		Some(SelectAction::ShowRelationships {
			id: selected.id.to_string(),
			kind: selected.kind(),
			label: selected.label.clone(),
			relationships,
		})
	}
}

/// Behaviour lookup keyed by [`VariantKind`]. Hosts replace entries to
/// customise one variant without touching the engine.
pub struct VariantTable {
	relationship: Box<dyn VariantBehavior>,
	entity: Box<dyn VariantBehavior>,
}

impl Default for VariantTable {
	fn default() -> Self {
		Self {
			relationship: Box::new(MemoryBehavior),
			entity: Box::new(EntityBehavior),
		}
	}
}

impl VariantTable {
	/// Replaces the behaviour of one variant.
	pub fn with(mut self, kind: VariantKind, behavior: impl VariantBehavior + 'static) -> Self {
		match kind {
			VariantKind::Relationship => self.relationship = Box::new(behavior),
			VariantKind::Entity => self.entity = Box::new(behavior),
		}
		self
	}

	/// Behaviour of a variant.
	pub fn get(&self, kind: VariantKind) -> &dyn VariantBehavior {
		match kind {
			VariantKind::Relationship => self.relationship.as_ref(),
			VariantKind::Entity => self.entity.as_ref(),
		}
	}

	/// Behaviour of the variant `node` belongs to.
	pub fn for_node(&self, node: &GraphNode) -> &dyn VariantBehavior {
		self.get(node.kind())
	}

	/// Edge behaviour follows the variant of its source node.
	pub fn for_link(&self, link: &Link, nodes: &[GraphNode]) -> &dyn VariantBehavior {
		match &link.variant {
			EdgeVariant::Relationship { .. } => self.get(VariantKind::Relationship),
			EdgeVariant::Entity { .. } => nodes
				.get(link.source.0)
				.map_or(self.get(VariantKind::Entity), |n| self.for_node(n)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::Vec2;

	fn entity(id: &str, label: &str) -> GraphNode {
		GraphNode {
			id: id.into(),
			label: label.into(),
			radius: 6.0,
			position: Vec2::ZERO,
			velocity: Vec2::ZERO,
			pinned: None,
			variant: NodeVariant::Entity {
				entity_type: "person".into(),
				statement_count: 1,
				project_id: None,
			},
		}
	}

	fn memory(id: i64, cluster: Option<i64>) -> GraphNode {
		GraphNode {
			id: id.into(),
			label: format!("m{id}"),
			radius: 6.0,
			position: Vec2::ZERO,
			velocity: Vec2::ZERO,
			pinned: None,
			variant: NodeVariant::Relationship {
				memory_type: "decision".into(),
				importance: 0.4,
				project: Some("atlas".into()),
				cluster_id: cluster,
			},
		}
	}

	fn statement(s: usize, t: usize, predicate: &str) -> Link {
		Link {
			source: NodeRef(s),
			target: NodeRef(t),
			label: predicate.into(),
			variant: EdgeVariant::Entity {
				predicate: predicate.into(),
				fact: Some(format!("fact {s}->{t}")),
				aspect: None,
			},
		}
	}

	#[test]
	fn memory_selection_opens_detail() {
		let table = VariantTable::default();
		let nodes = vec![memory(42, None)];
		let action = table.for_node(&nodes[0]).select(NodeRef(0), &nodes, &[]).unwrap();
		assert_eq!(
			action,
			SelectAction::OpenDetail {
				id: "42".into(),
				kind: VariantKind::Relationship
			}
		);
	}

	#[test]
	fn entity_selection_lists_incident_statements() {
		let table = VariantTable::default();
		let nodes = vec![entity("a", "Alice"), entity("b", "Bob"), entity("c", "Carol")];
		let links = vec![statement(0, 1, "knows"), statement(2, 0, "mentors"), statement(1, 2, "likes")];
		let action = table.for_node(&nodes[0]).select(NodeRef(0), &nodes, &links).unwrap();
		let SelectAction::ShowRelationships { id, relationships, .. } = action else {
			panic!("expected relationship panel");
		};
		assert_eq!(id, "a");
		assert_eq!(relationships.len(), 2);
		assert!(relationships[0].outgoing);
		assert_eq!(relationships[0].other_label, "Bob");
		assert!(!relationships[1].outgoing);
		assert_eq!(relationships[1].predicate, "mentors");
	}

	#[test]
	fn cluster_mode_uses_cluster_palette() {
		let table = VariantTable::default();
		let node = memory(1, Some(12));
		let behavior = table.for_node(&node);
		assert_eq!(behavior.node_color(&node, ColorMode::Cluster), COLORS[2]);
		assert_eq!(behavior.node_color(&node, ColorMode::Type), "#f28e2b");
		let unclustered = memory(2, None);
		assert_eq!(behavior.node_color(&unclustered, ColorMode::Cluster), UNCLUSTERED);
	}

	#[test]
	fn server_edge_colour_wins() {
		let link = Link {
			source: NodeRef(0),
			target: NodeRef(1),
			label: String::new(),
			variant: EdgeVariant::Relationship {
				relation: "supports".into(),
				color: Some("#123456".into()),
			},
		};
		assert_eq!(MemoryBehavior.edge_color(&link), "#123456");
	}

	#[test]
	fn category_colours_are_stable() {
		assert_eq!(category_color("aspect-x"), category_color("aspect-x"));
		assert!(COLORS.contains(&category_color("anything")));
	}

	#[test]
	fn table_entries_can_be_replaced() {
		struct Quiet;
		impl VariantBehavior for Quiet {
			fn node_color<'a>(&self, _: &'a GraphNode, _: ColorMode) -> Cow<'a, str> {
				Cow::Borrowed("#000")
			}
			fn edge_color<'a>(&self, _: &'a Link) -> Cow<'a, str> {
				Cow::Borrowed("#000")
			}
			fn node_tooltip(&self, _: &GraphNode) -> String {
				String::new()
			}
			fn select(&self, _: NodeRef, _: &[GraphNode], _: &[Link]) -> Option<SelectAction> {
				None
			}
		}
		let table = VariantTable::default().with(VariantKind::Entity, Quiet);
		let node = entity("a", "A");
		assert_eq!(table.for_node(&node).node_color(&node, ColorMode::Type), "#000");
		assert!(table.for_node(&node).select(NodeRef(0), &[node.clone()], &[]).is_none());
	}
}
