//! Graph data structures: the deserialisable input form and the resolved
//! graph the controller works on.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Deserialize;

use super::error::GraphError;
use super::geometry::{Body, Point};

/// Width given to nodes that do not declare one.
pub const DEFAULT_NODE_WIDTH: f64 = 100.0;
/// Height given to nodes that do not declare one.
pub const DEFAULT_NODE_HEIGHT: f64 = 30.0;

fn default_width() -> f64 {
	DEFAULT_NODE_WIDTH
}

fn default_height() -> f64 {
	DEFAULT_NODE_HEIGHT
}

/// Identity of a node inside a [`Graph`]: its slot in the node list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
	/// Slot of the node in [`Graph::nodes`].
	pub fn index(self) -> usize {
		self.0
	}
}

/// One end of an edge as written in the input: a node index or a node id.
/// Only exists until the edge is resolved.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EdgeEnd {
	/// Position in the node list.
	Index(usize),
	/// Value of a node's `id`.
	Id(String),
}

impl From<usize> for EdgeEnd {
	fn from(index: usize) -> Self {
		Self::Index(index)
	}
}

impl From<&str> for EdgeEnd {
	fn from(id: &str) -> Self {
		Self::Id(id.to_owned())
	}
}

impl From<NodeId> for EdgeEnd {
	fn from(id: NodeId) -> Self {
		Self::Index(id.0)
	}
}

/// Node ids may be written as numbers or strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
	Number(i64),
	Text(String),
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: serde::Deserializer<'de>,
{
	Ok(match RawId::deserialize(deserializer)? {
		RawId::Number(n) => n.to_string(),
		RawId::Text(s) => s,
	})
}

/// A node in the input graph.
#[derive(Clone, Debug, Deserialize)]
pub struct NodeData {
	/// Unique identifier, used by edges that reference nodes by id.
	#[serde(deserialize_with = "id_as_string")]
	pub id: String,
	/// Label drawn inside the node.
	#[serde(default)]
	pub name: String,
	/// CSS color or status class (`ok`, `err`, `fup`, `ood`).
	#[serde(default)]
	pub color: Option<String>,
	/// Initial width; corrected once the label has been measured.
	#[serde(default = "default_width")]
	pub width: f64,
	/// Node height.
	#[serde(default = "default_height")]
	pub height: f64,
	/// Optional initial x position. Unplaced nodes are positioned by the engine.
	#[serde(default)]
	pub x: Option<f64>,
	/// Optional initial y position.
	#[serde(default)]
	pub y: Option<f64>,
}

impl NodeData {
	/// A node with the default size and no fixed position.
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			color: None,
			width: DEFAULT_NODE_WIDTH,
			height: DEFAULT_NODE_HEIGHT,
			x: None,
			y: None,
		}
	}

	/// Sets the color or status class.
	pub fn with_color(mut self, color: impl Into<String>) -> Self {
		self.color = Some(color.into());
		self
	}
}

/// An edge in the input graph.
#[derive(Clone, Debug, Deserialize)]
pub struct EdgeData {
	/// Source node.
	pub source: EdgeEnd,
	/// Target node.
	pub target: EdgeEnd,
}

impl EdgeData {
	/// Builds an edge from anything that names a node.
	pub fn new(source: impl Into<EdgeEnd>, target: impl Into<EdgeEnd>) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
		}
	}
}

/// Complete input graph. Secondary edges are drawn but never constrain the layout.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphData {
	/// Nodes.
	pub nodes: Vec<NodeData>,
	/// Edges handed to the layout engine.
	#[serde(default)]
	pub edges: Vec<EdgeData>,
	/// Decorative edges.
	#[serde(default, alias = "secondaryEdges")]
	pub secondary_edges: Vec<EdgeData>,
}

impl GraphData {
	/// Parses a JSON graph document.
	pub fn from_json(text: &str) -> Result<Self, GraphError> {
		Ok(serde_json::from_str(text)?)
	}
}

/// A resolved node. Position and width are written by the controller and
/// the layout engine; everything else is fixed at ingestion.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	id: String,
	name: String,
	color: String,
	x: f64,
	y: f64,
	width: f64,
	height: f64,
	index: NodeId,
	measured: bool,
}

impl Node {
	fn from_data(data: NodeData, index: NodeId) -> Result<Self, GraphError> {
		let valid = |v: f64| v.is_finite() && v > 0.0;
		if !valid(data.width) || !valid(data.height) {
			return Err(GraphError::DegenerateNode {
				id: data.id,
				width: data.width,
				height: data.height,
			});
		}
		Ok(Self {
			id: data.id,
			name: data.name,
			color: data.color.unwrap_or_default(),
			x: data.x.unwrap_or(f64::NAN),
			y: data.y.unwrap_or(f64::NAN),
			width: data.width,
			height: data.height,
			index,
			measured: false,
		})
	}

	/// Input id.
	pub fn id(&self) -> &str {
		&self.id
	}

	/// Label text.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Color or status class; empty when none was given.
	pub fn color(&self) -> &str {
		&self.color
	}

	/// Center x in world space.
	pub fn x(&self) -> f64 {
		self.x
	}

	/// Center y in world space.
	pub fn y(&self) -> f64 {
		self.y
	}

	/// Full width.
	pub fn width(&self) -> f64 {
		self.width
	}

	/// Full height.
	pub fn height(&self) -> f64 {
		self.height
	}

	/// Slot of this node in its graph.
	pub fn index(&self) -> NodeId {
		self.index
	}

	/// Center point.
	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}

	/// Whether the node has a usable position yet.
	pub fn is_placed(&self) -> bool {
		self.x.is_finite() && self.y.is_finite()
	}

	/// Rectangle occupied by the node.
	pub fn body(&self) -> Body {
		Body::new(self.position(), self.width, self.height)
	}

	/// Whether the label width has already been applied.
	pub fn is_measured(&self) -> bool {
		self.measured
	}

	/// Moves the node. Layout engines call this from inside a tick or drag.
	pub fn set_position(&mut self, p: Point) {
		self.x = p.x;
		self.y = p.y;
	}

	pub(crate) fn apply_measured_width(&mut self, width: f64) {
		self.width = width;
		self.measured = true;
	}
}

/// A resolved edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
	/// Source node.
	pub source: NodeId,
	/// Target node.
	pub target: NodeId,
	/// Drawn only; never passed to the layout engine.
	pub secondary: bool,
}

/// Graph shared between the caller and the controller.
pub type SharedGraph = Rc<RefCell<Graph>>;

/// A graph whose edges all reference nodes by [`NodeId`].
#[derive(Clone, Debug, Default)]
pub struct Graph {
	nodes: Vec<Node>,
	edges: Vec<Edge>,
	secondary_edges: Vec<Edge>,
	ids: HashMap<String, NodeId>,
}

impl Graph {
	/// Resolves every edge end to a node, failing on the first dangling reference.
	pub fn from_data(data: GraphData) -> Result<Self, GraphError> {
		let mut graph = Self::default();
		for node in data.nodes {
			graph.add_node(node)?;
		}
		for (i, edge) in data.edges.iter().enumerate() {
			let resolved = graph.resolve_edge(edge, i, false)?;
			graph.edges.push(resolved);
		}
		for (i, edge) in data.secondary_edges.iter().enumerate() {
			let resolved = graph.resolve_edge(edge, i, true)?;
			graph.secondary_edges.push(resolved);
		}
		Ok(graph)
	}

	/// Wraps the graph for sharing with a controller.
	pub fn into_shared(self) -> SharedGraph {
		Rc::new(RefCell::new(self))
	}

	/// All nodes, indexed by [`NodeId`].
	pub fn nodes(&self) -> &[Node] {
		&self.nodes
	}

	pub(crate) fn nodes_mut(&mut self) -> &mut [Node] {
		&mut self.nodes
	}

	/// Node by identity.
	pub fn node(&self, id: NodeId) -> Option<&Node> {
		self.nodes.get(id.0)
	}

	pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
		self.nodes.get_mut(id.0)
	}

	/// Node by input id.
	pub fn find(&self, id: &str) -> Option<NodeId> {
		self.ids.get(id).copied()
	}

	/// Layout-constraining edges.
	pub fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Decorative edges.
	pub fn secondary_edges(&self) -> &[Edge] {
		&self.secondary_edges
	}

	/// Appends a node. Node slots of existing nodes are unchanged.
	pub fn add_node(&mut self, data: NodeData) -> Result<NodeId, GraphError> {
		if self.ids.contains_key(&data.id) {
			return Err(GraphError::DuplicateNodeId(data.id));
		}
		let index = NodeId(self.nodes.len());
		let node = Node::from_data(data, index)?;
		self.ids.insert(node.id.clone(), index);
		self.nodes.push(node);
		Ok(index)
	}

	/// Removes a node along with every edge touching it. Later nodes shift
	/// down one slot and edges are rewritten to match.
	pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
		if id.0 >= self.nodes.len() {
			return Err(GraphError::MissingNode(id.0));
		}
		let removed = self.nodes.remove(id.0);
		for (i, node) in self.nodes.iter_mut().enumerate().skip(id.0) {
			node.index = NodeId(i);
		}
		let shift = |n: NodeId| if n.0 > id.0 { NodeId(n.0 - 1) } else { n };
		for list in [&mut self.edges, &mut self.secondary_edges] {
			list.retain(|e| e.source != id && e.target != id);
			for edge in list.iter_mut() {
				edge.source = shift(edge.source);
				edge.target = shift(edge.target);
			}
		}
		self.ids = self
			.nodes
			.iter()
			.map(|n| (n.id.clone(), n.index))
			.collect();
		Ok(removed)
	}

	/// Adds a layout-constraining edge.
	pub fn add_edge(
		&mut self,
		source: impl Into<EdgeEnd>,
		target: impl Into<EdgeEnd>,
	) -> Result<Edge, GraphError> {
		let edge = self.resolve_edge(&EdgeData::new(source, target), self.edges.len(), false)?;
		self.edges.push(edge);
		Ok(edge)
	}

	/// Removes the primary edge at `position`.
	pub fn remove_edge(&mut self, position: usize) -> Option<Edge> {
		(position < self.edges.len()).then(|| self.edges.remove(position))
	}

	/// Adds a decorative edge.
	pub fn add_secondary_edge(
		&mut self,
		source: impl Into<EdgeEnd>,
		target: impl Into<EdgeEnd>,
	) -> Result<Edge, GraphError> {
		let position = self.secondary_edges.len();
		let edge = self.resolve_edge(&EdgeData::new(source, target), position, true)?;
		self.secondary_edges.push(edge);
		Ok(edge)
	}

	fn resolve_edge(
		&self,
		edge: &EdgeData,
		position: usize,
		secondary: bool,
	) -> Result<Edge, GraphError> {
		Ok(Edge {
			source: self.resolve(&edge.source, position)?,
			target: self.resolve(&edge.target, position)?,
			secondary,
		})
	}

	fn resolve(&self, end: &EdgeEnd, edge: usize) -> Result<NodeId, GraphError> {
		match end {
			EdgeEnd::Index(index) if *index < self.nodes.len() => Ok(NodeId(*index)),
			EdgeEnd::Index(index) => Err(GraphError::UnknownNodeIndex {
				edge,
				index: *index,
				len: self.nodes.len(),
			}),
			EdgeEnd::Id(id) => self.find(id).ok_or_else(|| GraphError::UnknownNodeId {
				edge,
				id: id.clone(),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> GraphData {
		GraphData::from_json(
			r#"{
				"nodes": [
					{ "id": 1, "name": "Abcdefg", "color": "ood" },
					{ "id": 2, "name": "B", "color": "ok" },
					{ "id": "c", "name": "C" },
					{ "id": "d", "name": "D", "width": 60, "height": 20 }
				],
				"edges": [
					{ "source": 0, "target": 1 },
					{ "source": 1, "target": 2 },
					{ "source": "c", "target": "1" },
					{ "source": 2, "target": "d" }
				],
				"secondaryEdges": [{ "source": 1, "target": 3 }]
			}"#,
		)
		.unwrap()
	}

	#[test]
	fn resolves_indices_and_ids() {
		let graph = Graph::from_data(sample()).unwrap();
		assert_eq!(graph.nodes().len(), 4);
		assert_eq!(graph.nodes()[0].id(), "1");
		assert_eq!(graph.nodes()[3].width(), 60.0);
		assert_eq!(graph.nodes()[2].width(), DEFAULT_NODE_WIDTH);
		assert_eq!(graph.edges()[2].source, NodeId(2));
		assert_eq!(graph.edges()[2].target, NodeId(0));
		assert_eq!(graph.edges()[3].target, NodeId(3));
		assert_eq!(graph.secondary_edges().len(), 1);
		assert!(graph.secondary_edges()[0].secondary);
		assert!(graph.edges().iter().all(|e| !e.secondary));
		assert!(!graph.nodes()[0].is_placed());
	}

	#[test]
	fn dangling_index_fails_fast() {
		let mut data = sample();
		data.edges.push(EdgeData::new(0, 9));
		let err = Graph::from_data(data).unwrap_err();
		assert!(matches!(
			err,
			GraphError::UnknownNodeIndex {
				edge: 4,
				index: 9,
				len: 4
			}
		));
	}

	#[test]
	fn dangling_id_in_secondary_edges_fails_fast() {
		let mut data = sample();
		data.secondary_edges.push(EdgeData::new("zz", 0));
		let err = Graph::from_data(data).unwrap_err();
		assert!(matches!(err, GraphError::UnknownNodeId { edge: 1, .. }));
	}

	#[test]
	fn duplicate_ids_and_zero_sizes_are_rejected() {
		let mut data = sample();
		data.nodes.push(NodeData::new("c", "again"));
		assert!(matches!(
			Graph::from_data(data),
			Err(GraphError::DuplicateNodeId(id)) if id == "c"
		));

		let mut data = sample();
		data.nodes[1].height = 0.0;
		assert!(matches!(
			Graph::from_data(data),
			Err(GraphError::DegenerateNode { .. })
		));
	}

	#[test]
	fn malformed_json_is_reported() {
		assert!(matches!(
			GraphData::from_json("{ \"nodes\": 3 }"),
			Err(GraphError::InvalidGraphJson(_))
		));
	}

	#[test]
	fn remove_node_rewrites_edges() {
		let mut graph = Graph::from_data(sample()).unwrap();
		let removed = graph.remove_node(NodeId(1)).unwrap();
		assert_eq!(removed.id(), "2");
		assert_eq!(graph.nodes().len(), 3);
		assert_eq!(graph.nodes()[2].index(), NodeId(2));
		assert_eq!(graph.find("d"), Some(NodeId(2)));
		// (c,1) and (c,d) survive with c shifted down a slot
		assert_eq!(
			graph.edges(),
			&[
				Edge {
					source: NodeId(1),
					target: NodeId(0),
					secondary: false
				},
				Edge {
					source: NodeId(1),
					target: NodeId(2),
					secondary: false
				}
			]
		);
		assert!(graph.secondary_edges().is_empty());
		assert!(matches!(
			graph.remove_node(NodeId(7)),
			Err(GraphError::MissingNode(7))
		));
	}

	#[test]
	fn edits_resolve_against_current_nodes() {
		let mut graph = Graph::from_data(sample()).unwrap();
		let id = graph.add_node(NodeData::new("5", "A new node")).unwrap();
		assert_eq!(id, NodeId(4));
		let edge = graph.add_edge(1, "5").unwrap();
		assert_eq!(edge.target, id);
		assert!(graph.add_secondary_edge("nope", 0).is_err());
		assert_eq!(graph.remove_edge(0).map(|e| e.source), Some(NodeId(0)));
		assert_eq!(graph.remove_edge(99), None);
	}
}
