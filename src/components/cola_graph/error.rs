//! Errors raised while ingesting or editing a graph.

use thiserror::Error;

/// Setup-time failures. Runtime anomalies (degenerate geometry, events
/// arriving out of order) are handled where they occur and never surface here.
#[derive(Debug, Error)]
pub enum GraphError {
	/// An edge points at a node slot that does not exist.
	#[error("edge {edge} references node index {index}, but the graph only has {len} nodes")]
	UnknownNodeIndex {
		/// Position of the offending edge in its list.
		edge: usize,
		/// The index it referenced.
		index: usize,
		/// Number of nodes in the graph.
		len: usize,
	},
	/// An edge names a node id that no node carries.
	#[error("edge {edge} references unknown node id {id:?}")]
	UnknownNodeId {
		/// Position of the offending edge in its list.
		edge: usize,
		/// The id it referenced.
		id: String,
	},
	/// Two nodes share an id.
	#[error("node id {0:?} is used more than once")]
	DuplicateNodeId(String),
	/// A node has a non-positive or non-finite size.
	#[error("node {id:?} has degenerate size {width}x{height}")]
	DegenerateNode {
		/// Node id.
		id: String,
		/// Declared width.
		width: f64,
		/// Declared height.
		height: f64,
	},
	/// A graph edit referenced a node that is not (or no longer) present.
	#[error("no node at index {0}")]
	MissingNode(usize),
	/// The graph document could not be parsed.
	#[error("invalid graph document: {0}")]
	InvalidGraphJson(#[from] serde_json::Error),
}
