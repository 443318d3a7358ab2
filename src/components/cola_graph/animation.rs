//! Drives a [`LayoutEngine`] one step per animation frame.
//!
//! Instead of letting the engine relax to completion, every tick is rendered
//! and followed by a single frame request; the next step only runs when that
//! frame fires. At most one request is outstanding at any time.

use log::{debug, info};

use super::layout::{Iterations, LayoutEngine, LayoutEvent};
use super::scene::{Scene, SceneComposer};
use super::types::SharedGraph;
use super::viewport::Viewport;

/// Something that can run a callback before the next paint.
pub trait FrameScheduler {
	/// Requests one callback. The host then calls [`AnimationLoop::on_frame`].
	fn request_frame(&mut self);
}

type TickHandler = Box<dyn FnMut(&Scene)>;
type EndHandler = Box<dyn FnMut()>;

/// Frame-driven wrapper around a layout engine.
pub struct AnimationLoop<E, S> {
	engine: E,
	scheduler: S,
	composer: SceneComposer,
	started: bool,
	frame_pending: bool,
	disposed: bool,
	tick_handler: Option<TickHandler>,
	end_handler: Option<EndHandler>,
}

impl<E: LayoutEngine, S: FrameScheduler> AnimationLoop<E, S> {
	/// Wraps `engine`; nothing runs until [`Self::start`].
	pub fn new(engine: E, scheduler: S) -> Self {
		Self {
			engine,
			scheduler,
			composer: SceneComposer::new(),
			started: false,
			frame_pending: false,
			disposed: false,
			tick_handler: None,
			end_handler: None,
		}
	}

	/// The wrapped engine.
	pub fn engine(&self) -> &E {
		&self.engine
	}

	/// The wrapped engine, for configuration and drag calls.
	pub fn engine_mut(&mut self) -> &mut E {
		&mut self.engine
	}

	/// Whether the engine has reported `Start`.
	pub fn is_started(&self) -> bool {
		self.started
	}

	/// Whether a frame request is outstanding.
	pub fn is_frame_pending(&self) -> bool {
		self.frame_pending
	}

	/// Whether [`Self::dispose`] was called.
	pub fn is_disposed(&self) -> bool {
		self.disposed
	}

	/// Ticks rendered so far.
	pub fn tick_count(&self) -> u64 {
		self.composer.tick_count()
	}

	/// Last composed scene; `None` before the first tick after `Start`.
	pub fn scene(&self) -> Option<&Scene> {
		if self.started {
			self.composer.scene()
		} else {
			None
		}
	}

	/// Called with every rendered tick. The next frame is requested after it returns.
	pub fn on_tick(&mut self, handler: impl FnMut(&Scene) + 'static) {
		self.tick_handler = Some(Box::new(handler));
	}

	/// Called when the engine converges.
	pub fn on_end(&mut self, handler: impl FnMut() + 'static) {
		self.end_handler = Some(Box::new(handler));
	}

	/// Runs the engine's initial relaxation with the given budgets.
	pub fn start(&mut self, graph: &SharedGraph, viewport: &Viewport, iterations: Iterations) {
		if self.disposed {
			return;
		}
		{
			let mut graph = graph.borrow_mut();
			self.engine.start(graph.nodes_mut(), iterations);
		}
		self.dispatch(graph, viewport);
	}

	/// Animation-frame callback: performs one engine step.
	pub fn on_frame(&mut self, graph: &SharedGraph, viewport: &Viewport) {
		self.frame_pending = false;
		if self.disposed {
			return;
		}
		{
			let mut graph = graph.borrow_mut();
			self.engine.tick(graph.nodes_mut());
		}
		self.dispatch(graph, viewport);
	}

	/// Asks for more steps after an external change without restarting.
	pub fn resume(&mut self) {
		if self.disposed || !self.started {
			return;
		}
		self.engine.resume();
		self.request_frame();
	}

	/// Rebuilds the current scene, e.g. after the viewport moved.
	pub fn redraw(&mut self, graph: &SharedGraph, viewport: &Viewport) -> Option<&Scene> {
		if self.disposed || !self.started {
			return None;
		}
		let graph = graph.borrow();
		Some(
			self.composer
				.recompose(&graph, self.engine.links(), viewport),
		)
	}

	/// Stops reacting to frames and drops the handlers.
	pub fn dispose(&mut self) {
		self.disposed = true;
		self.tick_handler = None;
		self.end_handler = None;
	}

	fn request_frame(&mut self) {
		if self.frame_pending || self.disposed {
			return;
		}
		self.frame_pending = true;
		self.scheduler.request_frame();
	}

	fn dispatch(&mut self, graph: &SharedGraph, viewport: &Viewport) {
		for event in self.engine.drain_events() {
			match event {
				LayoutEvent::Start => {
					self.started = true;
					debug!("layout start event");
				}
				LayoutEvent::Tick => {
					if self.started {
						let nodes = graph.borrow();
						let scene = self
							.composer
							.compose_tick(&nodes, self.engine.links(), viewport);
						drop(nodes);
						if let Some(handler) = self.tick_handler.as_mut() {
							handler(scene);
						}
					}
					self.request_frame();
				}
				LayoutEvent::End => {
					info!("layout settled after {} ticks", self.composer.tick_count());
					if let Some(handler) = self.end_handler.as_mut() {
						handler();
					}
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::{Cell, RefCell};
	use std::rc::Rc;

	use super::*;
	use crate::components::cola_graph::geometry::Point;
	use crate::components::cola_graph::layout::Link;
	use crate::components::cola_graph::types::{Graph, GraphData, Node, NodeData, NodeId};

	/// Engine that converges after a fixed number of steps.
	#[derive(Default)]
	struct Countdown {
		remaining: u32,
		steps: Rc<Cell<u32>>,
		events: Vec<LayoutEvent>,
		links: Vec<Link>,
	}

	impl LayoutEngine for Countdown {
		fn set_size(&mut self, _: f64, _: f64) {}
		fn set_nodes(&mut self, _: &[Node]) {}
		fn set_links(&mut self, links: Vec<Link>) {
			self.links = links;
		}
		fn links(&self) -> &[Link] {
			&self.links
		}
		fn handle_disconnected(&mut self, _: bool) {}
		fn avoid_overlaps(&mut self, _: bool) {}
		fn jaccard_link_lengths(&mut self, _: f64, _: f64) {}
		fn start(&mut self, nodes: &mut [Node], _: Iterations) {
			for (i, node) in nodes.iter_mut().enumerate() {
				node.set_position(Point::new(i as f64 * 150.0, 0.0));
			}
			self.events.push(LayoutEvent::Start);
			self.tick(nodes);
		}
		fn tick(&mut self, nodes: &mut [Node]) {
			if self.remaining == 0 {
				self.events.push(LayoutEvent::End);
				return;
			}
			self.remaining -= 1;
			self.steps.set(self.steps.get() + 1);
			for node in nodes.iter_mut() {
				node.set_position(node.position() + Point::new(1.0, 0.0));
			}
			self.events.push(LayoutEvent::Tick);
		}
		fn resume(&mut self) {
			self.remaining = self.remaining.max(1);
		}
		fn drag_start(&mut self, _: NodeId) {}
		fn drag(&mut self, node: &mut Node, to: Point) {
			node.set_position(to);
		}
		fn drag_end(&mut self, _: NodeId) {}
		fn drain_events(&mut self) -> Vec<LayoutEvent> {
			std::mem::take(&mut self.events)
		}
	}

	struct Frames(Rc<Cell<u32>>);

	impl FrameScheduler for Frames {
		fn request_frame(&mut self) {
			self.0.set(self.0.get() + 1);
		}
	}

	fn graph() -> SharedGraph {
		Graph::from_data(GraphData {
			nodes: vec![NodeData::new("a", "A"), NodeData::new("b", "B")],
			..Default::default()
		})
		.unwrap()
		.into_shared()
	}

	fn animation(remaining: u32) -> (AnimationLoop<Countdown, Frames>, Rc<Cell<u32>>) {
		let frames = Rc::new(Cell::new(0));
		let engine = Countdown {
			remaining,
			..Default::default()
		};
		(AnimationLoop::new(engine, Frames(frames.clone())), frames)
	}

	#[test]
	fn nothing_renders_before_start() {
		let (mut anim, frames) = animation(5);
		let rendered = Rc::new(Cell::new(0));
		let seen = rendered.clone();
		anim.on_tick(move |_| seen.set(seen.get() + 1));
		anim.on_frame(&graph(), &Viewport::new());
		assert_eq!(rendered.get(), 0);
		assert!(anim.scene().is_none());
		assert_eq!(frames.get(), 1);
	}

	#[test]
	fn each_tick_renders_then_requests_one_frame() {
		let (mut anim, frames) = animation(3);
		let ticks = Rc::new(RefCell::new(Vec::new()));
		let seen = ticks.clone();
		anim.on_tick(move |scene| seen.borrow_mut().push(scene.tick));
		let ended = Rc::new(Cell::new(false));
		let flag = ended.clone();
		anim.on_end(move || flag.set(true));

		let g = graph();
		anim.start(&g, &Viewport::new(), Iterations::default());
		assert!(anim.is_started());
		assert_eq!(frames.get(), 1);
		assert!(anim.is_frame_pending());

		// a second resume while a frame is pending does not stack requests
		anim.resume();
		assert_eq!(frames.get(), 1);

		while anim.is_frame_pending() {
			anim.on_frame(&g, &Viewport::new());
		}
		assert_eq!(*ticks.borrow(), vec![1, 2, 3]);
		assert_eq!(frames.get(), 3);
		assert!(ended.get());
	}

	#[test]
	fn resume_after_convergence_steps_again() {
		let (mut anim, frames) = animation(1);
		let g = graph();
		anim.start(&g, &Viewport::new(), Iterations::default());
		while anim.is_frame_pending() {
			anim.on_frame(&g, &Viewport::new());
		}
		let before = frames.get();
		anim.resume();
		assert_eq!(frames.get(), before + 1);
		anim.on_frame(&g, &Viewport::new());
		assert_eq!(anim.tick_count(), 2);
	}

	#[test]
	fn disposed_loop_ignores_frames() {
		let (mut anim, frames) = animation(10);
		let g = graph();
		anim.start(&g, &Viewport::new(), Iterations::default());
		anim.dispose();
		let x = g.borrow().nodes()[0].x();
		anim.on_frame(&g, &Viewport::new());
		anim.resume();
		assert_eq!(g.borrow().nodes()[0].x(), x);
		assert_eq!(frames.get(), 1);
		assert!(anim.redraw(&g, &Viewport::new()).is_none());
	}

	#[test]
	fn tick_handler_may_read_the_graph() {
		let (mut anim, _) = animation(2);
		let g = graph();
		let shared = g.clone();
		let widths = Rc::new(Cell::new(0.0));
		let seen = widths.clone();
		anim.on_tick(move |_| seen.set(shared.borrow().nodes()[0].width()));
		anim.start(&g, &Viewport::new(), Iterations::default());
		assert_eq!(widths.get(), 100.0);
	}
}
