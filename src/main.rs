//! Browser entry point: mounts the memory graph app.

use leptos::prelude::*;
use memory_graph_canvas::{App, init_logging};

fn main() {
	init_logging();
	mount_to_body(App)
}
