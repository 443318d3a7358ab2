//! Turns the current graph state into drawable primitives.

use log::debug;

use super::geometry::{Point, Segment, clip_segment};
use super::layout::Link;
use super::types::{Graph, NodeId};
use super::viewport::Viewport;

/// World units an edge stops short of its target so the arrowhead stays visible.
pub const ARROW_SHORTEN: f64 = 2.0;
/// Horizontal room added around a measured label.
pub const LABEL_PADDING: f64 = 20.0;

/// Arrowhead drawn at the end of an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
	/// Primary edges.
	Arrow,
	/// Secondary edges.
	SecondaryArrow,
}

impl Marker {
	/// Stable identifier of the marker.
	pub fn id(self) -> &'static str {
		match self {
			Marker::Arrow => "arrow",
			Marker::SecondaryArrow => "secondary-arrow",
		}
	}
}

/// A node rectangle with its label.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeShape {
	/// Node drawn.
	pub node: NodeId,
	/// Input id of the node.
	pub key: String,
	/// Center in world space.
	pub center: Point,
	/// Full width.
	pub width: f64,
	/// Full height.
	pub height: f64,
	/// Color or status class.
	pub color: String,
	/// Label text.
	pub label: String,
	/// Whether the label has been measured already.
	pub measured: bool,
}

impl NodeShape {
	/// Upper-left corner of the rectangle.
	pub fn top_left(&self) -> Point {
		self.center - Point::new(self.width / 2.0, self.height / 2.0)
	}
}

/// A clipped connector line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeLine {
	/// Source node.
	pub source: NodeId,
	/// Target node.
	pub target: NodeId,
	/// Line between the two node outlines.
	pub segment: Segment,
	/// Drawn in the secondary style.
	pub secondary: bool,
	/// Arrowhead at `segment.end`.
	pub marker: Marker,
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
	/// Ticks accepted so far.
	pub tick: u64,
	/// Viewport matrix `[a, b, c, d, e, f]`.
	pub transform: [f64; 6],
	/// Node rectangles.
	pub nodes: Vec<NodeShape>,
	/// Edges known to the layout engine.
	pub edges: Vec<EdgeLine>,
	/// Decorative edges.
	pub secondary_edges: Vec<EdgeLine>,
}

/// Builds [`Scene`]s and counts ticks.
#[derive(Debug, Default)]
pub struct SceneComposer {
	tick: u64,
	scene: Option<Scene>,
}

impl SceneComposer {
	/// A composer with a zero tick counter.
	pub fn new() -> Self {
		Self::default()
	}

	/// Ticks accepted so far.
	pub fn tick_count(&self) -> u64 {
		self.tick
	}

	/// Last composed scene.
	pub fn scene(&self) -> Option<&Scene> {
		self.scene.as_ref()
	}

	/// Counts a tick and composes the scene for it.
	pub fn compose_tick(&mut self, graph: &Graph, links: &[Link], viewport: &Viewport) -> &Scene {
		self.tick += 1;
		self.recompose(graph, links, viewport)
	}

	/// Composes the scene again without counting a tick, e.g. after the view moved.
	pub fn recompose(&mut self, graph: &Graph, links: &[Link], viewport: &Viewport) -> &Scene {
		let nodes = graph
			.nodes()
			.iter()
			.filter(|n| n.is_placed())
			.map(|n| NodeShape {
				node: n.index(),
				key: n.id().to_owned(),
				center: n.position(),
				width: n.width(),
				height: n.height(),
				color: n.color().to_owned(),
				label: n.name().to_owned(),
				measured: n.is_measured(),
			})
			.collect();
		let edges = links
			.iter()
			.filter_map(|l| edge_line(graph, l.source, l.target, false))
			.collect();
		let secondary_edges = graph
			.secondary_edges()
			.iter()
			.filter_map(|e| edge_line(graph, e.source, e.target, true))
			.collect();

		self.scene.insert(Scene {
			tick: self.tick,
			transform: viewport.transform(),
			nodes,
			edges,
			secondary_edges,
		})
	}

	/// Applies a measured label width to a node, once. The layout picks the
	/// new width up on its next step. Returns whether the node changed.
	pub fn record_label_width(graph: &mut Graph, node: NodeId, label_width: f64) -> bool {
		if !label_width.is_finite() || label_width < 0.0 {
			return false;
		}
		match graph.node_mut(node) {
			Some(n) if !n.is_measured() => {
				n.apply_measured_width(label_width + LABEL_PADDING);
				debug!("node {} sized to label: {}", n.id(), n.width());
				true
			}
			_ => false,
		}
	}
}

fn edge_line(graph: &Graph, source: NodeId, target: NodeId, secondary: bool) -> Option<EdgeLine> {
	let (src, trg) = (graph.node(source)?, graph.node(target)?);
	if !src.is_placed() || !trg.is_placed() {
		return None;
	}
	let segment = clip_segment(&src.body(), &trg.body(), ARROW_SHORTEN);
	if !segment.start.is_finite() || !segment.end.is_finite() {
		return None;
	}
	Some(EdgeLine {
		source,
		target,
		segment,
		secondary,
		marker: if secondary {
			Marker::SecondaryArrow
		} else {
			Marker::Arrow
		},
	})
}
