use leptos::prelude::*;

use crate::components::cola_graph::{ColaGraphCanvas, Graph};
use crate::load_graph_data;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let graph = load_graph_data().and_then(Graph::from_data);

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
				{graph.map(|graph| view! { <ColaGraphCanvas graph=graph fullscreen=true /> })}
				<div class="graph-overlay">
					<p class="subtitle">"Drag nodes to reposition. Scroll to zoom. Drag background to pan."</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
