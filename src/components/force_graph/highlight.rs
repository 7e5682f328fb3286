use std::collections::HashSet;

use super::types::{GraphNode, Link, NodeRef};

/// How strongly a node or edge is drawn this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emphasis {
	/// Nothing is highlighted; everything draws normally.
	Normal,
	/// The hovered or selected node itself, or an edge touching it.
	Active,
	/// Directly connected to the active node, or matching the search.
	Related,
	/// Outside the highlight; drawn faded.
	Dimmed,
}

/// Which nodes stand out, derived from hover/selection or the search text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Highlight {
	/// Hovered node, else the selected one.
	pub active: Option<NodeRef>,
	/// Nodes sharing a link with `active`.
	pub neighbors: HashSet<NodeRef>,
	/// Present only in search mode (a query and no active node).
	pub matches: Option<HashSet<NodeRef>>,
}

impl Highlight {
	/// Hover takes precedence over selection; search applies only when
	/// neither is set.
	pub fn derive(
		nodes: &[GraphNode],
		links: &[Link],
		hovered: Option<NodeRef>,
		selected: Option<NodeRef>,
		search: &str,
	) -> Self {
		if let Some(active) = hovered.or(selected).filter(|n| n.0 < nodes.len()) {
			let neighbors = links.iter().filter_map(|link| link.other(active)).collect();
			return Self {
				active: Some(active),
				neighbors,
				matches: None,
			};
		}

		let query = search.to_lowercase();
		if query.is_empty() {
			return Self::default();
		}
		let matches = nodes
			.iter()
			.enumerate()
			.filter(|(_, node)| node.label.to_lowercase().contains(&query))
			.map(|(index, _)| NodeRef(index))
			.collect();
		Self {
			active: None,
			neighbors: HashSet::new(),
			matches: Some(matches),
		}
	}

	/// Nothing stands out; everything draws normally.
	pub fn is_empty(&self) -> bool {
		self.active.is_none() && self.matches.is_none()
	}

	/// Emphasis of a node this frame.
	pub fn node(&self, node: NodeRef) -> Emphasis {
		if let Some(active) = self.active {
			if node == active {
				Emphasis::Active
			} else if self.neighbors.contains(&node) {
				Emphasis::Related
			} else {
				Emphasis::Dimmed
			}
		} else if let Some(matches) = &self.matches {
			if matches.contains(&node) {
				Emphasis::Related
			} else {
				Emphasis::Dimmed
			}
		} else {
			Emphasis::Normal
		}
	}

	/// Emphasis of a link this frame. In search mode a link is lit only when
	/// both endpoints match.
	pub fn link(&self, link: &Link) -> Emphasis {
		if let Some(active) = self.active {
			if link.source == active || link.target == active {
				Emphasis::Active
			} else {
				Emphasis::Dimmed
			}
		} else if let Some(matches) = &self.matches {
			if matches.contains(&link.source) && matches.contains(&link.target) {
				Emphasis::Related
			} else {
				Emphasis::Dimmed
			}
		} else {
			Emphasis::Normal
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{EdgeVariant, NodeId, NodeVariant, Vec2};

	fn node(label: &str) -> GraphNode {
		GraphNode {
			id: NodeId::Str(label.into()),
			label: label.into(),
			radius: 5.0,
			position: Vec2::ZERO,
			velocity: Vec2::ZERO,
			pinned: None,
			variant: NodeVariant::Entity {
				entity_type: "concept".into(),
				statement_count: 0,
				project_id: None,
			},
		}
	}

	fn link(s: usize, t: usize) -> Link {
		Link {
			source: NodeRef(s),
			target: NodeRef(t),
			label: "rel".into(),
			variant: EdgeVariant::Entity {
				predicate: "rel".into(),
				fact: None,
				aspect: None,
			},
		}
	}

	fn graph() -> (Vec<GraphNode>, Vec<Link>) {
		(
			vec![node("Rust"), node("Tokio"), node("Serde"), node("Python")],
			vec![link(0, 1), link(2, 0), link(3, 2)],
		)
	}

	#[test]
	fn neighbours_of_the_active_node_stay_lit() {
		let (nodes, links) = graph();
		let h = Highlight::derive(&nodes, &links, Some(NodeRef(0)), None, "");
		assert_eq!(h.node(NodeRef(0)), Emphasis::Active);
		assert_eq!(h.node(NodeRef(1)), Emphasis::Related);
		assert_eq!(h.node(NodeRef(2)), Emphasis::Related);
		assert_eq!(h.node(NodeRef(3)), Emphasis::Dimmed);
		assert_eq!(h.link(&links[0]), Emphasis::Active);
		assert_eq!(h.link(&links[2]), Emphasis::Dimmed);
	}

	#[test]
	fn hover_wins_over_selection() {
		let (nodes, links) = graph();
		let h = Highlight::derive(&nodes, &links, Some(NodeRef(3)), Some(NodeRef(0)), "");
		assert_eq!(h.active, Some(NodeRef(3)));
	}

	#[test]
	fn search_matches_case_insensitively() {
		let (nodes, links) = graph();
		let h = Highlight::derive(&nodes, &links, None, None, "RU");
		assert_eq!(h.node(NodeRef(0)), Emphasis::Related);
		assert_eq!(h.node(NodeRef(1)), Emphasis::Dimmed);
		assert_eq!(h.link(&links[0]), Emphasis::Dimmed);
	}

	#[test]
	fn search_whitespace_is_part_of_the_query() {
		let nodes = vec![node("Alpha Beta"), node("Gamma b c")];
		let h = Highlight::derive(&nodes, &[], None, None, "a b ");
		assert_eq!(h.node(NodeRef(0)), Emphasis::Dimmed);
		assert_eq!(h.node(NodeRef(1)), Emphasis::Related);
	}

	#[test]
	fn search_is_ignored_while_a_node_is_active() {
		let (nodes, links) = graph();
		let h = Highlight::derive(&nodes, &links, None, Some(NodeRef(1)), "python");
		assert!(h.matches.is_none());
		assert_eq!(h.node(NodeRef(3)), Emphasis::Dimmed);
	}

	#[test]
	fn no_hover_and_no_query_draws_everything_normally() {
		let (nodes, links) = graph();
		let h = Highlight::derive(&nodes, &links, None, None, "");
		assert!(h.is_empty());
		assert_eq!(h.node(NodeRef(2)), Emphasis::Normal);
		assert_eq!(h.link(&links[1]), Emphasis::Normal);
	}
}
