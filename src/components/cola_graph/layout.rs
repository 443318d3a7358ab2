//! Boundary of the layout solver.
//!
//! The controller drives any solver that implements [`LayoutEngine`]: it
//! hands over node geometry and links, asks for iteration-budgeted starts and
//! single steps, and reads `Start`/`Tick`/`End` events back. Solvers only see
//! nodes through `&mut [Node]` and may rely on `x`, `y`, `width`, `height`
//! and `index` alone.

use super::geometry::Point;
use super::types::{Node, NodeId};

/// Events a solver reports, in the order they happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutEvent {
	/// `start` finished its initial relaxation. Emitted once per `start`.
	Start,
	/// One incremental step completed; node positions changed.
	Tick,
	/// The layout converged and stepping stopped.
	End,
}

/// Relaxation budgets for [`LayoutEngine::start`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Iterations {
	/// Passes before any constraint is enforced.
	pub unconstrained: u32,
	/// Passes with user constraints (link lengths) only.
	pub user_constraints: u32,
	/// Passes with every constraint, overlap avoidance included.
	pub all_constraints: u32,
}

impl Iterations {
	/// Budgets from the three pass counts.
	pub const fn new(unconstrained: u32, user_constraints: u32, all_constraints: u32) -> Self {
		Self {
			unconstrained,
			user_constraints,
			all_constraints,
		}
	}
}

impl Default for Iterations {
	fn default() -> Self {
		Self::new(10, 10, 10)
	}
}

/// A link as seen by the solver, with its target length once computed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
	/// Source node.
	pub source: NodeId,
	/// Target node.
	pub target: NodeId,
	/// Desired distance between centers, if the solver assigned one.
	pub length: Option<f64>,
}

impl Link {
	/// A link with no length assigned yet.
	pub fn new(source: NodeId, target: NodeId) -> Self {
		Self {
			source,
			target,
			length: None,
		}
	}
}

/// A step-wise layout solver.
pub trait LayoutEngine {
	/// Area the layout should fill.
	fn set_size(&mut self, width: f64, height: f64);

	/// Replaces the node set. Called before every `start`.
	fn set_nodes(&mut self, nodes: &[Node]);

	/// Replaces the link set. Only layout-constraining edges are passed.
	fn set_links(&mut self, links: Vec<Link>);

	/// Links currently known to the solver.
	fn links(&self) -> &[Link];

	/// Whether disconnected components are packed apart.
	fn handle_disconnected(&mut self, enabled: bool);

	/// Whether node rectangles are kept from overlapping.
	fn avoid_overlaps(&mut self, enabled: bool);

	/// Derives per-link lengths from neighbourhood similarity.
	fn jaccard_link_lengths(&mut self, length: f64, strength: f64);

	/// Runs the initial relaxation, emits [`LayoutEvent::Start`] and performs
	/// one step.
	fn start(&mut self, nodes: &mut [Node], iterations: Iterations);

	/// Performs one step, writing positions into `nodes`. Sizes are re-read
	/// from `nodes` on every step.
	fn tick(&mut self, nodes: &mut [Node]);

	/// Reheats a converged or cooling layout without restarting it.
	fn resume(&mut self);

	/// Hands `node` over to the pointer.
	fn drag_start(&mut self, node: NodeId);

	/// Moves a pinned node.
	fn drag(&mut self, node: &mut Node, to: Point);

	/// Returns `node` to normal integration.
	fn drag_end(&mut self, node: NodeId);

	/// Events emitted since the previous call.
	fn drain_events(&mut self) -> Vec<LayoutEvent>;
}
