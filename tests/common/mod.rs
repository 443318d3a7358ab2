#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use cola_graph_canvas::components::cola_graph::{
	ForceLayout, FrameScheduler, Graph, GraphController, LayoutConfig,
};
use cola_graph_canvas::demo_graph;

/// Counts frame requests instead of scheduling them.
#[derive(Clone, Default)]
pub struct CountingScheduler(pub Rc<Cell<u32>>);

impl CountingScheduler {
	pub fn requested(&self) -> u32 {
		self.0.get()
	}
}

impl FrameScheduler for CountingScheduler {
	fn request_frame(&mut self) {
		self.0.set(self.0.get() + 1);
	}
}

/// Stands in for registered window listeners; records when it is released.
pub struct Listeners(pub Rc<Cell<bool>>);

impl Drop for Listeners {
	fn drop(&mut self) {
		self.0.set(true);
	}
}

pub type DemoController<L> = GraphController<ForceLayout, CountingScheduler, L>;

/// The demo graph on a force layout, not yet started.
pub fn demo_controller<L>() -> (DemoController<L>, CountingScheduler) {
	let graph = Graph::from_data(demo_graph()).expect("demo graph is valid");
	let frames = CountingScheduler::default();
	let ctl = GraphController::new(
		graph.into_shared(),
		ForceLayout::new(),
		frames.clone(),
		LayoutConfig::default(),
	);
	(ctl, frames)
}
