//! Single-pointer press/drag gesture tracking for node drags and background pans.

use log::debug;

use super::geometry::Point;
use super::types::NodeId;

/// Squared screen distance the pointer must exceed before a press becomes a drag.
pub const DRAG_THRESHOLD_SQ: f64 = 4.0;

/// What the pointer went down on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Grab {
	/// A node, with its world position at press time.
	Node {
		/// Pressed node.
		node: NodeId,
		/// Node center when the press started.
		start: Point,
	},
	/// Empty canvas: dragging pans the view.
	Canvas,
}

/// Observable state of the gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
	/// No pointer held.
	Idle,
	/// Pointer held, threshold not yet exceeded.
	Pressed,
	/// Pointer held and moving the grabbed thing.
	Dragging,
}

/// Effect of a pointer move that the owner must apply.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragStep {
	/// Move a node to `to` (world space). `pinned_now` is set on the move
	/// that crossed the threshold; the node must be pinned before moving it.
	Node {
		/// Dragged node.
		node: NodeId,
		/// New world position.
		to: Point,
		/// First move of this drag.
		pinned_now: bool,
	},
	/// Shift the viewport by a screen-space delta.
	Pan {
		/// Delta since the previous move.
		delta: Point,
	},
}

struct DragSession<L> {
	grab: Grab,
	pointer_start: Point,
	last_pointer: Point,
	dragging: bool,
	// Released when the session is dropped.
	_listeners: L,
}

/// Tracks at most one press at a time. `L` is whatever keeps the global
/// move/up listeners registered; it lives exactly as long as the session.
pub struct DragController<L = ()> {
	session: Option<DragSession<L>>,
	scale: f64,
}

impl<L> Default for DragController<L> {
	fn default() -> Self {
		Self {
			session: None,
			scale: 1.0,
		}
	}
}

impl<L> DragController<L> {
	/// An idle controller at scale 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Keeps drag deltas calibrated to the current zoom.
	pub fn set_scale(&mut self, scale: f64) {
		if scale.is_finite() && scale > 0.0 {
			self.scale = scale;
		}
	}

	/// Current gesture state.
	pub fn phase(&self) -> DragPhase {
		match &self.session {
			None => DragPhase::Idle,
			Some(s) if s.dragging => DragPhase::Dragging,
			Some(_) => DragPhase::Pressed,
		}
	}

	/// Node currently pinned by a drag.
	pub fn dragged_node(&self) -> Option<NodeId> {
		match &self.session {
			Some(DragSession {
				grab: Grab::Node { node, .. },
				dragging: true,
				..
			}) => Some(*node),
			_ => None,
		}
	}

	/// Starts a session. A session that never saw its pointer-up is ended
	/// first; its pinned node, if any, is returned so it can be unpinned.
	pub fn on_pointer_down(&mut self, grab: Grab, screen: Point, listeners: L) -> Option<NodeId> {
		let stale = self.end();
		self.session = Some(DragSession {
			grab,
			pointer_start: screen,
			last_pointer: screen,
			dragging: false,
			_listeners: listeners,
		});
		stale
	}

	/// Feeds a pointer position. Returns what to apply, if anything.
	pub fn on_pointer_move(&mut self, screen: Point) -> Option<DragStep> {
		let scale = self.scale;
		let session = self.session.as_mut()?;
		let delta = screen - session.pointer_start;

		let mut pinned_now = false;
		if !session.dragging {
			if delta.length_squared() <= DRAG_THRESHOLD_SQ {
				return None;
			}
			session.dragging = true;
			pinned_now = true;
			debug!("drag started: {:?}", session.grab);
		}

		let step = match session.grab {
			Grab::Node { node, start } => DragStep::Node {
				node,
				to: start + delta / scale,
				pinned_now,
			},
			Grab::Canvas => DragStep::Pan {
				delta: screen - session.last_pointer,
			},
		};
		session.last_pointer = screen;
		Some(step)
	}

	/// Ends the session. Returns the node to unpin if a node drag was active.
	pub fn on_pointer_up(&mut self) -> Option<NodeId> {
		self.end()
	}

	/// Ends the session on teardown; same contract as [`Self::on_pointer_up`].
	pub fn cancel(&mut self) -> Option<NodeId> {
		self.end()
	}

	fn end(&mut self) -> Option<NodeId> {
		let session = self.session.take()?;
		match session.grab {
			Grab::Node { node, .. } if session.dragging => {
				debug!("drag ended: node {}", node.index());
				Some(node)
			}
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::rc::Rc;

	use super::*;

	struct Flag(Rc<Cell<bool>>);

	impl Drop for Flag {
		fn drop(&mut self) {
			self.0.set(true);
		}
	}

	fn node_grab() -> Grab {
		Grab::Node {
			node: NodeId(2),
			start: Point::new(100.0, 50.0),
		}
	}

	#[test]
	fn small_moves_stay_pressed() {
		let mut drag = DragController::<()>::new();
		drag.on_pointer_down(node_grab(), Point::new(10.0, 10.0), ());
		assert_eq!(drag.on_pointer_move(Point::new(11.0, 11.0)), None);
		assert_eq!(drag.on_pointer_move(Point::new(12.0, 10.0)), None);
		assert_eq!(drag.phase(), DragPhase::Pressed);
		assert_eq!(drag.on_pointer_up(), None);
		assert_eq!(drag.phase(), DragPhase::Idle);
	}

	#[test]
	fn crossing_threshold_pins_once() {
		let mut drag = DragController::<()>::new();
		drag.on_pointer_down(node_grab(), Point::new(10.0, 10.0), ());
		assert_eq!(
			drag.on_pointer_move(Point::new(13.0, 10.0)),
			Some(DragStep::Node {
				node: NodeId(2),
				to: Point::new(103.0, 50.0),
				pinned_now: true
			})
		);
		assert_eq!(
			drag.on_pointer_move(Point::new(14.0, 10.0)),
			Some(DragStep::Node {
				node: NodeId(2),
				to: Point::new(104.0, 50.0),
				pinned_now: false
			})
		);
		assert_eq!(drag.dragged_node(), Some(NodeId(2)));
		assert_eq!(drag.on_pointer_up(), Some(NodeId(2)));
	}

	#[test]
	fn deltas_are_divided_by_scale() {
		let mut drag = DragController::<()>::new();
		drag.set_scale(2.0);
		drag.on_pointer_down(node_grab(), Point::new(0.0, 0.0), ());
		let step = drag.on_pointer_move(Point::new(40.0, -20.0));
		assert!(matches!(
			step,
			Some(DragStep::Node { to, .. }) if to == Point::new(120.0, 40.0)
		));
	}

	#[test]
	fn canvas_drag_reports_incremental_pan() {
		let mut drag = DragController::<()>::new();
		drag.on_pointer_down(Grab::Canvas, Point::new(0.0, 0.0), ());
		assert_eq!(
			drag.on_pointer_move(Point::new(5.0, 0.0)),
			Some(DragStep::Pan {
				delta: Point::new(5.0, 0.0)
			})
		);
		assert_eq!(
			drag.on_pointer_move(Point::new(7.0, 1.0)),
			Some(DragStep::Pan {
				delta: Point::new(2.0, 1.0)
			})
		);
		assert_eq!(drag.dragged_node(), None);
		assert_eq!(drag.on_pointer_up(), None);
	}

	#[test]
	fn listeners_released_on_every_exit() {
		let released = Rc::new(Cell::new(false));
		let mut drag = DragController::new();
		drag.on_pointer_down(node_grab(), Point::default(), Flag(released.clone()));
		drag.on_pointer_up();
		assert!(released.get());

		let released = Rc::new(Cell::new(false));
		drag.on_pointer_down(node_grab(), Point::default(), Flag(released.clone()));
		drag.on_pointer_move(Point::new(9.0, 0.0));
		assert_eq!(drag.cancel(), Some(NodeId(2)));
		assert!(released.get());
		assert_eq!(drag.on_pointer_move(Point::new(20.0, 0.0)), None);

		let released = Rc::new(Cell::new(false));
		{
			let mut scoped = DragController::new();
			scoped.on_pointer_down(Grab::Canvas, Point::default(), Flag(released.clone()));
		}
		assert!(released.get());
	}

	#[test]
	fn lost_pointer_up_unpins_before_new_press() {
		let mut drag = DragController::<()>::new();
		drag.on_pointer_down(node_grab(), Point::default(), ());
		drag.on_pointer_move(Point::new(0.0, 10.0));
		let stale = drag.on_pointer_down(Grab::Canvas, Point::default(), ());
		assert_eq!(stale, Some(NodeId(2)));
		assert_eq!(drag.phase(), DragPhase::Pressed);
	}
}
