//! Interactive controller: routes pointer and wheel input into the viewport,
//! the drag state machine and the layout engine, and owns the animation loop.

use log::{debug, info, warn};

use super::animation::{AnimationLoop, FrameScheduler};
use super::drag::{DragController, DragPhase, DragStep, Grab};
use super::error::GraphError;
use super::geometry::Point;
use super::layout::{Iterations, LayoutEngine, Link};
use super::scene::{Scene, SceneComposer};
use super::types::{Edge, EdgeEnd, Graph, NodeId, SharedGraph};
use super::viewport::{Viewport, WheelInput};

/// Layout settings applied when the controller is built.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutConfig {
	/// Width of the layout area.
	pub width: f64,
	/// Height of the layout area.
	pub height: f64,
	/// Base link length for Jaccard link lengths.
	pub link_length: f64,
	/// Weight of neighbourhood similarity in link lengths.
	pub link_strength: f64,
	/// Keep node rectangles apart.
	pub avoid_overlaps: bool,
	/// Pack disconnected components. Off by default since repacking hides drift.
	pub handle_disconnected: bool,
	/// Budgets for the initial relaxation.
	pub iterations: Iterations,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			width: 1000.0,
			height: 600.0,
			link_length: 100.0,
			link_strength: 0.7,
			avoid_overlaps: true,
			handle_disconnected: false,
			iterations: Iterations::default(),
		}
	}
}

fn primary_links(graph: &Graph) -> Vec<Link> {
	graph
		.edges()
		.iter()
		.map(|e| Link::new(e.source, e.target))
		.collect()
}

/// Owns the interaction state for one rendered graph.
///
/// `L` is the scoped listener registration handed in with each pointer-down;
/// it is dropped when the press ends, whatever way it ends.
pub struct GraphController<E, S, L = ()> {
	graph: SharedGraph,
	animation: AnimationLoop<E, S>,
	viewport: Viewport,
	drag: DragController<L>,
	config: LayoutConfig,
}

impl<E: LayoutEngine, S: FrameScheduler, L> GraphController<E, S, L> {
	/// Configures `engine` for `graph`. Secondary edges are never handed over.
	pub fn new(graph: SharedGraph, mut engine: E, scheduler: S, config: LayoutConfig) -> Self {
		engine.set_size(config.width, config.height);
		{
			let g = graph.borrow();
			engine.set_nodes(g.nodes());
			engine.set_links(primary_links(&g));
		}
		engine.handle_disconnected(config.handle_disconnected);
		engine.avoid_overlaps(config.avoid_overlaps);
		engine.jaccard_link_lengths(config.link_length, config.link_strength);

		Self {
			graph,
			animation: AnimationLoop::new(engine, scheduler),
			viewport: Viewport::new(),
			drag: DragController::new(),
			config,
		}
	}

	/// The shared graph.
	pub fn graph(&self) -> &SharedGraph {
		&self.graph
	}

	/// The layout engine.
	pub fn engine(&self) -> &E {
		self.animation.engine()
	}

	/// Current pan and zoom.
	pub fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	/// Settings in effect.
	pub fn config(&self) -> &LayoutConfig {
		&self.config
	}

	/// Whether the engine has reported its start.
	pub fn is_started(&self) -> bool {
		self.animation.is_started()
	}

	/// Whether [`Self::dispose`] was called.
	pub fn is_disposed(&self) -> bool {
		self.animation.is_disposed()
	}

	/// Ticks rendered so far.
	pub fn tick_count(&self) -> u64 {
		self.animation.tick_count()
	}

	/// Last composed scene.
	pub fn scene(&self) -> Option<&Scene> {
		self.animation.scene()
	}

	/// Gesture state of the pointer.
	pub fn drag_phase(&self) -> DragPhase {
		self.drag.phase()
	}

	/// Whether the pointer is currently dragging a node or the view.
	pub fn is_dragging(&self) -> bool {
		self.drag.phase() == DragPhase::Dragging
	}

	/// Registers the render callback.
	pub fn on_tick(&mut self, handler: impl FnMut(&Scene) + 'static) {
		self.animation.on_tick(handler);
	}

	/// Registers the convergence callback.
	pub fn on_end(&mut self, handler: impl FnMut() + 'static) {
		self.animation.on_end(handler);
	}

	/// Starts (or restarts) the layout with the configured budgets.
	pub fn start(&mut self) {
		self.animation
			.start(&self.graph, &self.viewport, self.config.iterations);
	}

	/// Animation-frame callback.
	pub fn on_frame(&mut self) {
		self.animation.on_frame(&self.graph, &self.viewport);
	}

	/// Rebuilds the scene for the current viewport without stepping the layout.
	pub fn redraw(&mut self) -> Option<&Scene> {
		self.animation.redraw(&self.graph, &self.viewport)
	}

	/// Topmost node under a screen position.
	pub fn node_at(&self, screen: Point) -> Option<NodeId> {
		let world = self.viewport.screen_to_world(screen);
		let graph = self.graph.borrow();
		graph
			.nodes()
			.iter()
			.rev()
			.find(|n| n.is_placed() && n.body().contains(world))
			.map(|n| n.index())
	}

	/// Pointer pressed. Grabs the node under the pointer, or the canvas for
	/// panning. Returns the grabbed node.
	pub fn pointer_down(&mut self, screen: Point, listeners: L) -> Option<NodeId> {
		if self.is_disposed() {
			return None;
		}
		let node = self.node_at(screen);
		let grab = match node {
			Some(id) => {
				let start = self.graph.borrow().nodes()[id.index()].position();
				Grab::Node { node: id, start }
			}
			None => Grab::Canvas,
		};
		if let Some(stale) = self.drag.on_pointer_down(grab, screen, listeners) {
			warn!("press started while node {} was still pinned", stale.index());
			self.animation.engine_mut().drag_end(stale);
		}
		node
	}

	/// Pointer moved while pressed. Returns what was applied.
	pub fn pointer_move(&mut self, screen: Point) -> Option<DragStep> {
		if self.is_disposed() {
			return None;
		}
		let step = self.drag.on_pointer_move(screen)?;
		match step {
			DragStep::Node {
				node,
				to,
				pinned_now,
			} => {
				let engine = self.animation.engine_mut();
				if pinned_now {
					engine.drag_start(node);
				}
				if let Some(n) = self.graph.borrow_mut().node_mut(node) {
					engine.drag(n, to);
				}
				self.animation.resume();
			}
			DragStep::Pan { delta } => {
				self.viewport.apply_pan(delta.x, delta.y);
			}
		}
		Some(step)
	}

	/// Pointer released. Unpins the dragged node, if any.
	pub fn pointer_up(&mut self) {
		if let Some(node) = self.drag.on_pointer_up() {
			self.animation.engine_mut().drag_end(node);
		}
	}

	/// Wheel zoom around the cursor; keeps node drags calibrated.
	pub fn wheel(&mut self, input: WheelInput) -> Viewport {
		if self.is_disposed() {
			return self.viewport;
		}
		let viewport = self.viewport.apply_wheel(input);
		self.drag.set_scale(viewport.scale());
		debug!(
			"zoom to {:.3} at ({:.1}, {:.1})",
			viewport.scale(),
			input.cursor.x,
			input.cursor.y
		);
		viewport
	}

	/// Applies a measured label width; see [`SceneComposer::record_label_width`].
	pub fn measure_label(&mut self, node: NodeId, label_width: f64) -> bool {
		if self.is_disposed() {
			return false;
		}
		SceneComposer::record_label_width(&mut self.graph.borrow_mut(), node, label_width)
	}

	/// New layout area size.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.config.width = width;
		self.config.height = height;
		self.animation.engine_mut().set_size(width, height);
	}

	/// Adds a decorative edge. The engine is not told and no tick is scheduled.
	pub fn add_secondary_edge(
		&mut self,
		source: impl Into<EdgeEnd>,
		target: impl Into<EdgeEnd>,
	) -> Result<Edge, GraphError> {
		self.graph.borrow_mut().add_secondary_edge(source, target)
	}

	/// Applies a structural edit and restarts the layout. Any drag in
	/// progress is cancelled first. The restart happens even when the edit
	/// fails part-way so the engine never runs on stale node or link lists.
	pub fn restructure<T>(
		&mut self,
		edit: impl FnOnce(&mut Graph) -> Result<T, GraphError>,
	) -> Result<T, GraphError> {
		if self.is_disposed() {
			return edit(&mut self.graph.borrow_mut());
		}
		if let Some(node) = self.drag.cancel() {
			self.animation.engine_mut().drag_end(node);
		}
		let result = edit(&mut self.graph.borrow_mut());
		{
			let g = self.graph.borrow();
			let engine = self.animation.engine_mut();
			engine.set_nodes(g.nodes());
			engine.set_links(primary_links(&g));
			info!(
				"graph restructured: {} nodes, {} edges",
				g.nodes().len(),
				g.edges().len()
			);
		}
		self.start();
		result
	}

	/// Tears the controller down: ends any press (releasing its listeners and
	/// unpinning its node) and stops the animation loop.
	pub fn dispose(&mut self) {
		if let Some(node) = self.drag.cancel() {
			self.animation.engine_mut().drag_end(node);
		}
		self.animation.dispose();
		info!("graph controller disposed");
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use super::*;
	use crate::components::cola_graph::layout::LayoutEvent;
	use crate::components::cola_graph::types::{EdgeData, GraphData, Node, NodeData};

	#[derive(Default)]
	struct Recorder {
		calls: Vec<String>,
		links: Vec<Link>,
		events: Vec<LayoutEvent>,
	}

	impl LayoutEngine for Recorder {
		fn set_size(&mut self, w: f64, h: f64) {
			self.calls.push(format!("size {w}x{h}"));
		}
		fn set_nodes(&mut self, nodes: &[Node]) {
			self.calls.push(format!("nodes {}", nodes.len()));
		}
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
				node.set_position(Point::new(i as f64 * 200.0, 0.0));
			}
			self.calls.push("start".into());
			self.events.extend([LayoutEvent::Start, LayoutEvent::Tick]);
		}
		fn tick(&mut self, _: &mut [Node]) {
			self.events.push(LayoutEvent::Tick);
		}
		fn resume(&mut self) {
			self.calls.push("resume".into());
		}
		fn drag_start(&mut self, node: NodeId) {
			self.calls.push(format!("drag_start {}", node.index()));
		}
		fn drag(&mut self, node: &mut Node, to: Point) {
			node.set_position(to);
		}
		fn drag_end(&mut self, node: NodeId) {
			self.calls.push(format!("drag_end {}", node.index()));
		}
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

	fn controller() -> (GraphController<Recorder, Frames>, Rc<Cell<u32>>) {
		let graph = Graph::from_data(GraphData {
			nodes: vec![
				NodeData::new("a", "A"),
				NodeData::new("b", "B"),
				NodeData::new("c", "C"),
			],
			edges: vec![EdgeData::new(0, 1), EdgeData::new(1, 2)],
			secondary_edges: vec![EdgeData::new(0, 2)],
		})
		.unwrap()
		.into_shared();
		let frames = Rc::new(Cell::new(0));
		let ctl = GraphController::new(
			graph,
			Recorder::default(),
			Frames(frames.clone()),
			LayoutConfig::default(),
		);
		(ctl, frames)
	}

	fn calls(ctl: &GraphController<Recorder, Frames>) -> &[String] {
		&ctl.engine().calls
	}

	#[test]
	fn engine_sees_primary_links_only() {
		let (ctl, _) = controller();
		assert_eq!(ctl.engine().links().len(), 2);
		assert_eq!(calls(&ctl)[..2], ["size 1000x600", "nodes 3"]);
	}

	#[test]
	fn hit_test_prefers_topmost_node() {
		let (mut ctl, _) = controller();
		ctl.start();
		assert_eq!(ctl.node_at(Point::new(210.0, 5.0)), Some(NodeId(1)));
		assert_eq!(ctl.node_at(Point::new(100.0, 0.0)), None);
		ctl.graph()
			.borrow_mut()
			.node_mut(NodeId(2))
			.unwrap()
			.set_position(Point::new(200.0, 0.0));
		assert_eq!(ctl.node_at(Point::new(200.0, 0.0)), Some(NodeId(2)));
	}

	#[test]
	fn node_drag_pins_moves_and_resumes() {
		let (mut ctl, _) = controller();
		ctl.start();
		assert_eq!(ctl.pointer_down(Point::new(200.0, 0.0), ()), Some(NodeId(1)));
		ctl.pointer_move(Point::new(250.0, 0.0));
		assert!(ctl.is_dragging());
		assert_eq!(
			ctl.graph().borrow().nodes()[1].position(),
			Point::new(250.0, 0.0)
		);
		ctl.pointer_up();
		let log = calls(&ctl);
		let tail: Vec<&str> = log[log.len() - 3..].iter().map(String::as_str).collect();
		assert_eq!(tail, ["drag_start 1", "resume", "drag_end 1"]);
		assert_eq!(ctl.drag_phase(), DragPhase::Idle);
	}

	#[test]
	fn canvas_drag_pans_without_touching_nodes() {
		let (mut ctl, _) = controller();
		ctl.start();
		assert_eq!(ctl.pointer_down(Point::new(100.0, 100.0), ()), None);
		ctl.pointer_move(Point::new(110.0, 95.0));
		ctl.pointer_up();
		assert_eq!(ctl.viewport().pan(), Point::new(10.0, -5.0));
		assert!(!calls(&ctl).iter().any(|c| c.starts_with("drag")));
	}

	#[test]
	fn zoom_recalibrates_node_drags() {
		let (mut ctl, _) = controller();
		ctl.start();
		let view = ctl.wheel(WheelInput {
			delta_y: -500.0,
			cursor: Point::default(),
			..Default::default()
		});
		assert_eq!(view.scale(), 2.0);
		ctl.pointer_down(Point::new(400.0, 0.0), ());
		ctl.pointer_move(Point::new(420.0, 0.0));
		assert_eq!(
			ctl.graph().borrow().nodes()[1].position(),
			Point::new(210.0, 0.0)
		);
	}

	#[test]
	fn secondary_edge_does_not_tick() {
		let (mut ctl, frames) = controller();
		ctl.start();
		let before = (frames.get(), ctl.tick_count());
		ctl.add_secondary_edge("b", "a").unwrap();
		assert_eq!((frames.get(), ctl.tick_count()), before);
		assert_eq!(ctl.engine().links().len(), 2);
		assert_eq!(ctl.graph().borrow().secondary_edges().len(), 2);
	}

	#[test]
	fn restructure_cancels_drag_and_restarts() {
		let (mut ctl, _) = controller();
		ctl.start();
		ctl.pointer_down(Point::new(0.0, 0.0), ());
		ctl.pointer_move(Point::new(0.0, 30.0));
		let added = ctl.restructure(|g| g.add_node(NodeData::new("d", "D")));
		assert_eq!(added.unwrap(), NodeId(3));
		assert_eq!(ctl.drag_phase(), DragPhase::Idle);
		let log = calls(&ctl);
		let tail: Vec<&str> = log[log.len() - 3..].iter().map(String::as_str).collect();
		assert_eq!(tail, ["drag_end 0", "nodes 4", "start"]);
	}

	#[test]
	fn dispose_mid_drag_unpins_and_goes_quiet() {
		let (mut ctl, frames) = controller();
		ctl.start();
		ctl.pointer_down(Point::new(0.0, 0.0), ());
		ctl.pointer_move(Point::new(0.0, 30.0));
		ctl.dispose();
		assert!(calls(&ctl).iter().any(|c| c == "drag_end 0"));
		let requested = frames.get();
		ctl.on_frame();
		assert_eq!(ctl.pointer_down(Point::new(200.0, 0.0), ()), None);
		assert_eq!(ctl.pointer_move(Point::new(300.0, 0.0)), None);
		assert!(!ctl.measure_label(NodeId(0), 30.0));
		assert_eq!(frames.get(), requested);
	}
}
