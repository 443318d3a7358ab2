//! Leptos client-side app wiring and routes.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::HtmlScriptElement;

// Modules
pub mod components;
mod pages;

use crate::components::cola_graph::{EdgeData, GraphData, GraphError, NodeData};
// Top-Level pages
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Id of the `<script type="application/json">` element holding the graph.
pub const GRAPH_DATA_ELEMENT: &str = "graph-data";

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Four nodes in every status, a cycle, a tail and one secondary edge.
pub fn demo_graph() -> GraphData {
	GraphData {
		nodes: vec![
			NodeData::new("Abcdefg", "Abcdefg").with_color("ood"),
			NodeData::new("B", "B").with_color("ok"),
			NodeData::new("C", "C").with_color("fup"),
			NodeData::new("D", "D").with_color("err"),
		],
		edges: vec![
			EdgeData::new(0, 1),
			EdgeData::new(1, 2),
			EdgeData::new(2, 0),
			EdgeData::new(2, 3),
		],
		secondary_edges: vec![EdgeData::new(1, 3)],
	}
}

/// Reads the page's embedded graph, falling back to [`demo_graph`] when the
/// page carries none.
pub fn load_graph_data() -> Result<GraphData, GraphError> {
	let script = web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.get_element_by_id(GRAPH_DATA_ELEMENT))
		.and_then(|e| e.dyn_into::<HtmlScriptElement>().ok());
	let Some(script) = script else {
		info!("no #{GRAPH_DATA_ELEMENT} element, showing the demo graph");
		return Ok(demo_graph());
	};
	match script.text() {
		Ok(text) => GraphData::from_json(&text),
		Err(err) => {
			warn!("could not read #{GRAPH_DATA_ELEMENT}: {err:?}");
			Ok(demo_graph())
		}
	}
}

/// An app router which renders the homepage and handles 404's
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="Constrained Graph Layout" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
