use leptos::prelude::*;
use log::error;

use crate::components::force_graph::{
	ColorMode, EmbeddingPayload, EmbeddingPoint, ForceGraphCanvas, GraphPayload, MemoryNode, NodeId, RawMemoryEdge,
	RelationshipPayload, SelectAction,
};

const MEMORY_TYPES: &[&str] = &["fact", "preference", "decision", "event", "skill"];
const RELATIONS: &[&str] = &["related", "supports", "contradicts", "follows"];

const SAMPLE_ENTITIES: &str = r#"{
	"nodes": [
		{"id": "rust", "name": "Rust", "entity_type": "language", "statement_count": 14},
		{"id": "tokio", "name": "Tokio", "entity_type": "library", "statement_count": 6},
		{"id": "serde", "name": "Serde", "entity_type": "library", "statement_count": 5},
		{"id": "leptos", "name": "Leptos", "entity_type": "framework", "statement_count": 4},
		{"id": "wasm", "name": "WebAssembly", "entity_type": "concept", "statement_count": 9},
		{"id": "alice", "name": "Alice", "entity_type": "person", "statement_count": 3},
		{"id": "dashboard", "name": "Memory dashboard", "entity_type": "project", "statement_count": 7}
	],
	"edges": [
		{"source": "tokio", "target": "rust", "predicate": "written_in", "aspect": "technical"},
		{"source": "serde", "target": "rust", "predicate": "written_in", "aspect": "technical"},
		{"source": "leptos", "target": "wasm", "predicate": "compiles_to", "fact": "Leptos CSR apps ship as WebAssembly"},
		{"source": "leptos", "target": "rust", "predicate": "written_in", "aspect": "technical"},
		{"source": "alice", "target": "dashboard", "predicate": "maintains", "aspect": "social"},
		{"source": "dashboard", "target": "leptos", "predicate": "uses", "fact": "The dashboard UI is built with Leptos"},
		{"source": "alice", "target": "rust", "predicate": "prefers"},
		{"source": "dashboard", "target": "ghost", "predicate": "uses"}
	]
}"#;

/// Simple pseudo-random number generator (deterministic for consistency).
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

/// A random memory tree.
fn sample_memories(n: usize) -> GraphPayload {
	let nodes = (0..n)
		.map(|i| MemoryNode {
			id: NodeId::Int(i as i64),
			content: format!("Memory {i}: something worth remembering"),
			label: (i < 12).then(|| format!("Memory {i}")),
			memory_type: MEMORY_TYPES[i % MEMORY_TYPES.len()].into(),
			importance: rand_simple(i * 7),
			project: Some(if i % 3 == 0 { "dashboard" } else { "notes" }.into()),
			cluster_id: (i % 4 != 3).then_some((i % 4) as i64),
			size: None,
		})
		.collect();

	let edges = (1..n)
		.map(|i| RawMemoryEdge {
			source_id: NodeId::Int(i as i64),
			target_id: NodeId::Int((rand_simple(i) * i as f64) as i64),
			relation_type: RELATIONS[i % RELATIONS.len()].into(),
			color: None,
			label: None,
		})
		.collect();

	GraphPayload::Relationship(RelationshipPayload {
		nodes,
		edges,
		..Default::default()
	})
}

fn sample_entities() -> GraphPayload {
	GraphPayload::entity_from_json(SAMPLE_ENTITIES).unwrap_or_else(|err| {
		error!("bad sample entity payload: {err}");
		GraphPayload::default()
	})
}

/// Points on a few noisy rings, standing in for a 2-D embedding projection.
fn sample_embedding(n: usize) -> GraphPayload {
	let points = (0..n)
		.map(|i| {
			let cluster = i % 4;
			let angle = rand_simple(i * 13) * std::f64::consts::TAU;
			let spread = 0.5 + rand_simple(i * 31);
			EmbeddingPoint {
				id: NodeId::Int(i as i64),
				x: cluster as f64 * 3.0 + angle.cos() * spread,
				y: (cluster % 2) as f64 * 3.0 + angle.sin() * spread,
				label: format!("Memory {i}"),
				memory_type: MEMORY_TYPES[i % MEMORY_TYPES.len()].into(),
				importance: rand_simple(i * 3),
				cluster_id: Some(cluster as i64),
			}
		})
		.collect();
	GraphPayload::Embedding(EmbeddingPayload { points })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dataset {
	Memories,
	Entities,
	Embedding,
}

impl Dataset {
	const ALL: [Dataset; 3] = [Dataset::Memories, Dataset::Entities, Dataset::Embedding];

	fn title(self) -> &'static str {
		match self {
			Dataset::Memories => "Memories",
			Dataset::Entities => "Knowledge",
			Dataset::Embedding => "Embeddings",
		}
	}

	fn payload(self) -> GraphPayload {
		match self {
			Dataset::Memories => sample_memories(80),
			Dataset::Entities => sample_entities(),
			Dataset::Embedding => sample_embedding(120),
		}
	}
}

#[component]
fn SelectionPanel(selection: RwSignal<Option<SelectAction>>) -> impl IntoView {
	move || {
		selection.get().map(|action| match action {
			SelectAction::OpenDetail { id, kind } => view! {
				<div class="selection-panel">
					<h2>{format!("Memory {id}")}</h2>
					<p class="subtitle">{format!("{kind:?} graph")}</p>
				</div>
			}
			.into_any(),
			SelectAction::ShowRelationships {
				label,
				relationships,
				..
			} => view! {
				<div class="selection-panel">
					<h2>{label}</h2>
					<ul>
						{relationships
							.into_iter()
							.map(|rel| {
								let arrow = if rel.outgoing { "\u{2192}" } else { "\u{2190}" };
								let text = format!("{arrow} {} {}", rel.predicate.replace('_', " "), rel.other_label);
								view! {
									<li>
										{text}
										{rel.fact.map(|fact| view! { <p class="fact">{fact}</p> })}
									</li>
								}
							})
							.collect_view()}
					</ul>
				</div>
			}
			.into_any(),
		})
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let dataset = RwSignal::new(Dataset::Memories);
	let search = RwSignal::new(String::new());
	let color_mode = RwSignal::new(ColorMode::Type);
	let selection = RwSignal::new(None::<SelectAction>);
	let graph_data = Signal::derive(move || dataset.get().payload());

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<ForceGraphCanvas
					data=graph_data
					search=Signal::derive(move || Some(search.get()))
					color_mode=Signal::derive(move || Some(color_mode.get()))
					on_select=move |action: SelectAction| selection.set(Some(action))
					on_deselect=move |_: ()| selection.set(None)
				/>
				<div class="graph-overlay">
					<h1>"Memory Graph"</h1>
					<p class="subtitle">"Drag nodes to reposition. Scroll or pinch to zoom. Drag background to pan."</p>
					<div class="graph-controls">
						{Dataset::ALL
							.into_iter()
							.map(|d| {
								view! {
									<button
										class:active=move || dataset.get() == d
										on:click=move |_| {
											selection.set(None);
											dataset.set(d);
										}
									>
										{d.title()}
									</button>
								}
							})
							.collect_view()}
						<button on:click=move |_| {
							color_mode
								.update(|mode| {
									*mode = match mode {
										ColorMode::Type => ColorMode::Cluster,
										ColorMode::Cluster => ColorMode::Type,
									};
								})
						}>
							{move || match color_mode.get() {
								ColorMode::Type => "Colour: type",
								ColorMode::Cluster => "Colour: cluster",
							}}
						</button>
						<input
							type="search"
							placeholder="Search labels"
							prop:value=search
							on:input=move |ev| search.set(event_target_value(&ev))
						/>
					</div>
					<SelectionPanel selection=selection />
				</div>
			</div>
		</ErrorBoundary>
	}
}
