//! Force-directed layout engine built on `force_graph`, with link-length and
//! overlap projections layered on top of the force integration.

use std::collections::HashSet;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{info, warn};

use super::geometry::Point;
use super::layout::{Iterations, LayoutEngine, LayoutEvent, Link};
use super::types::{Node, NodeId};

const DT: f32 = 0.016;
const NODE_MASS: f32 = 10.0;
const INITIAL_RADIUS: f64 = 100.0;
const DEFAULT_LINK_LENGTH: f64 = 100.0;
/// Fraction of the length error corrected per pass.
const LINK_STIFFNESS: f64 = 0.5;
/// Extra clearance kept between node rectangles.
const OVERLAP_PADDING: f64 = 4.0;
const COMPONENT_GAP: f64 = 40.0;
const ALPHA_START: f64 = 0.1;
const ALPHA_MIN: f64 = 0.01;
const ALPHA_DECAY: f64 = 0.99;

fn simulation_parameters() -> SimulationParameters {
	SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	}
}

/// The default [`LayoutEngine`].
pub struct ForceLayout {
	graph: ForceGraph<NodeId, ()>,
	handles: Vec<DefaultNodeIdx>,
	sizes: Vec<(f64, f64)>,
	links: Vec<Link>,
	width: f64,
	height: f64,
	avoid_overlaps: bool,
	handle_disconnected: bool,
	jaccard: Option<(f64, f64)>,
	pinned: HashSet<NodeId>,
	alpha: f64,
	running: bool,
	started: bool,
	events: Vec<LayoutEvent>,
}

impl Default for ForceLayout {
	fn default() -> Self {
		Self {
			graph: ForceGraph::new(simulation_parameters()),
			handles: Vec::new(),
			sizes: Vec::new(),
			links: Vec::new(),
			width: 0.0,
			height: 0.0,
			avoid_overlaps: false,
			handle_disconnected: true,
			jaccard: None,
			pinned: HashSet::new(),
			alpha: 0.0,
			running: false,
			started: false,
			events: Vec::new(),
		}
	}
}

impl ForceLayout {
	/// An engine with no nodes.
	pub fn new() -> Self {
		Self::default()
	}

	/// Current temperature; zero once converged.
	pub fn alpha(&self) -> f64 {
		if self.running { self.alpha } else { 0.0 }
	}

	/// Whether `node` is held by a drag.
	pub fn is_pinned(&self, node: NodeId) -> bool {
		self.pinned.contains(&node)
	}

	fn compute_link_lengths(&mut self) {
		let Some((length, strength)) = self.jaccard else {
			return;
		};
		let lengths = jaccard_lengths(&self.links, self.sizes.len(), length, strength);
		for (link, l) in self.links.iter_mut().zip(lengths) {
			link.length = Some(l);
		}
	}

	fn rebuild(&mut self, nodes: &[Node]) {
		self.graph = ForceGraph::new(simulation_parameters());
		self.handles = nodes
			.iter()
			.map(|node| {
				self.graph.add_node(NodeData {
					x: node.x() as f32,
					y: node.y() as f32,
					mass: NODE_MASS,
					is_anchor: self.pinned.contains(&node.index()),
					user_data: node.index(),
				})
			})
			.collect();
		for link in &self.links {
			if let (Some(&src), Some(&tgt)) = (
				self.handles.get(link.source.index()),
				self.handles.get(link.target.index()),
			) {
				self.graph.add_edge(src, tgt, EdgeData::default());
			}
		}
	}

	fn read_positions(&self) -> Vec<Point> {
		let mut positions = vec![Point::default(); self.handles.len()];
		self.graph.visit_nodes(|node| {
			if let Some(p) = positions.get_mut(node.data.user_data.index()) {
				*p = Point::new(node.x() as f64, node.y() as f64);
			}
		});
		positions
	}

	fn write_positions(&mut self, positions: &[Point]) {
		let pinned = &self.pinned;
		self.graph.visit_nodes_mut(|node| {
			let id = node.data.user_data;
			if pinned.contains(&id) {
				return;
			}
			if let Some(p) = positions.get(id.index()) {
				node.data.x = p.x as f32;
				node.data.y = p.y as f32;
			}
		});
	}

	fn relax(&mut self, link_lengths: bool, overlaps: bool) {
		self.graph.update(DT);
		if !link_lengths && !overlaps {
			return;
		}
		let mut positions = self.read_positions();
		if link_lengths {
			project_link_lengths(&mut positions, &self.links, &self.pinned);
		}
		if overlaps {
			separate_overlaps(&mut positions, &self.sizes, &self.pinned);
		}
		self.write_positions(&positions);
	}

	fn copy_into(&self, nodes: &mut [Node]) {
		for (node, p) in nodes.iter_mut().zip(self.read_positions()) {
			if !self.pinned.contains(&node.index()) {
				node.set_position(p);
			}
		}
	}

	fn set_anchor(&mut self, id: NodeId, anchored: bool) {
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data == id {
				node.data.is_anchor = anchored;
			}
		});
	}
}

impl LayoutEngine for ForceLayout {
	fn set_size(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn set_nodes(&mut self, nodes: &[Node]) {
		self.sizes = nodes.iter().map(|n| (n.width(), n.height())).collect();
		self.pinned.retain(|id| id.index() < nodes.len());
		self.compute_link_lengths();
	}

	fn set_links(&mut self, links: Vec<Link>) {
		self.links = links;
		self.compute_link_lengths();
	}

	fn links(&self) -> &[Link] {
		&self.links
	}

	fn handle_disconnected(&mut self, enabled: bool) {
		self.handle_disconnected = enabled;
	}

	fn avoid_overlaps(&mut self, enabled: bool) {
		self.avoid_overlaps = enabled;
	}

	fn jaccard_link_lengths(&mut self, length: f64, strength: f64) {
		self.jaccard = Some((length, strength));
		self.compute_link_lengths();
	}

	fn start(&mut self, nodes: &mut [Node], iterations: Iterations) {
		self.sizes = nodes.iter().map(|n| (n.width(), n.height())).collect();
		let center = Point::new(self.width / 2.0, self.height / 2.0);
		let count = nodes.len().max(1) as f64;
		for (i, node) in nodes.iter_mut().enumerate() {
			if !node.is_placed() {
				let angle = (i as f64) * 2.0 * PI / count;
				node.set_position(center + Point::new(angle.cos(), angle.sin()) * INITIAL_RADIUS);
			}
		}
		self.rebuild(nodes);

		for _ in 0..iterations.unconstrained {
			self.relax(false, false);
		}
		for _ in 0..iterations.user_constraints {
			self.relax(true, false);
		}
		for _ in 0..iterations.all_constraints {
			self.relax(true, self.avoid_overlaps);
		}
		if self.handle_disconnected {
			let mut positions = self.read_positions();
			pack_components(
				&mut positions,
				&self.sizes,
				&self.links,
				(self.width, self.height),
			);
			self.write_positions(&positions);
		}
		self.copy_into(nodes);

		self.alpha = ALPHA_START;
		self.running = true;
		self.started = true;
		self.events.push(LayoutEvent::Start);
		info!(
			"layout started: {} nodes, {} links",
			nodes.len(),
			self.links.len()
		);
		self.tick(nodes);
	}

	fn tick(&mut self, nodes: &mut [Node]) {
		if !self.running {
			return;
		}
		if nodes.len() != self.handles.len() {
			warn!(
				"layout has {} nodes but was given {}; skipping step until restart",
				self.handles.len(),
				nodes.len()
			);
			self.events.push(LayoutEvent::Tick);
			return;
		}
		if self.alpha < ALPHA_MIN {
			self.running = false;
			self.events.push(LayoutEvent::End);
			info!("layout converged");
			return;
		}

		self.sizes = nodes.iter().map(|n| (n.width(), n.height())).collect();
		self.relax(true, self.avoid_overlaps);
		self.copy_into(nodes);
		self.alpha *= ALPHA_DECAY;
		self.events.push(LayoutEvent::Tick);
	}

	fn resume(&mut self) {
		if !self.started {
			return;
		}
		self.alpha = ALPHA_START;
		self.running = true;
	}

	fn drag_start(&mut self, node: NodeId) {
		self.pinned.insert(node);
		self.set_anchor(node, true);
	}

	fn drag(&mut self, node: &mut Node, to: Point) {
		node.set_position(to);
		let id = node.index();
		self.graph.visit_nodes_mut(|n| {
			if n.data.user_data == id {
				n.data.x = to.x as f32;
				n.data.y = to.y as f32;
			}
		});
	}

	fn drag_end(&mut self, node: NodeId) {
		self.pinned.remove(&node);
		self.set_anchor(node, false);
	}

	fn drain_events(&mut self) -> Vec<LayoutEvent> {
		std::mem::take(&mut self.events)
	}
}

/// Target length per link: `length * (1 + strength * J)` with `J` the Jaccard
/// coefficient of the endpoints' neighbour sets, or 0 when either endpoint has
/// fewer than two neighbours.
fn jaccard_lengths(links: &[Link], node_count: usize, length: f64, strength: f64) -> Vec<f64> {
	let mut neighbours = vec![HashSet::new(); node_count];
	for link in links {
		let (s, t) = (link.source.index(), link.target.index());
		if s < node_count && t < node_count && s != t {
			neighbours[s].insert(t);
			neighbours[t].insert(s);
		}
	}

	links
		.iter()
		.map(|link| {
			let (Some(a), Some(b)) = (
				neighbours.get(link.source.index()),
				neighbours.get(link.target.index()),
			) else {
				return length;
			};
			let similarity = if a.len().min(b.len()) < 2 {
				0.0
			} else {
				a.intersection(b).count() as f64 / a.union(b).count() as f64
			};
			length * (1.0 + strength * similarity)
		})
		.collect()
}

/// Moves each free endpoint so that every link gets closer to its length.
fn project_link_lengths(positions: &mut [Point], links: &[Link], pinned: &HashSet<NodeId>) {
	for link in links {
		let (s, t) = (link.source.index(), link.target.index());
		if s >= positions.len() || t >= positions.len() || s == t {
			continue;
		}
		let d = positions[t] - positions[s];
		let dist = d.length();
		if dist < 1e-6 {
			continue;
		}
		let target = link.length.unwrap_or(DEFAULT_LINK_LENGTH);
		let correction = d * ((dist - target) / dist * LINK_STIFFNESS);
		match (pinned.contains(&link.source), pinned.contains(&link.target)) {
			(false, false) => {
				positions[s] = positions[s] + correction * 0.5;
				positions[t] = positions[t] - correction * 0.5;
			}
			(true, false) => positions[t] = positions[t] - correction,
			(false, true) => positions[s] = positions[s] + correction,
			(true, true) => {}
		}
	}
}

/// Pushes overlapping rectangles apart along the axis of least penetration.
fn separate_overlaps(positions: &mut [Point], sizes: &[(f64, f64)], pinned: &HashSet<NodeId>) {
	let n = positions.len().min(sizes.len());
	for i in 0..n {
		for j in (i + 1)..n {
			let d = positions[j] - positions[i];
			let overlap_x = (sizes[i].0 + sizes[j].0) / 2.0 + OVERLAP_PADDING - d.x.abs();
			let overlap_y = (sizes[i].1 + sizes[j].1) / 2.0 + OVERLAP_PADDING - d.y.abs();
			if overlap_x <= 0.0 || overlap_y <= 0.0 {
				continue;
			}
			let push = if overlap_x < overlap_y {
				Point::new(if d.x < 0.0 { -overlap_x } else { overlap_x }, 0.0)
			} else {
				Point::new(0.0, if d.y < 0.0 { -overlap_y } else { overlap_y })
			};
			match (pinned.contains(&NodeId(i)), pinned.contains(&NodeId(j))) {
				(false, false) => {
					positions[i] = positions[i] - push * 0.5;
					positions[j] = positions[j] + push * 0.5;
				}
				(true, false) => positions[j] = positions[j] + push,
				(false, true) => positions[i] = positions[i] - push,
				(true, true) => {}
			}
		}
	}
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
	while parent[i] != i {
		parent[i] = parent[parent[i]];
		i = parent[i];
	}
	i
}

/// Lays connected components out in rows, centered in `size`.
fn pack_components(
	positions: &mut [Point],
	sizes: &[(f64, f64)],
	links: &[Link],
	size: (f64, f64),
) {
	let n = positions.len().min(sizes.len());
	let mut parent: Vec<usize> = (0..n).collect();
	for link in links {
		let (s, t) = (link.source.index(), link.target.index());
		if s < n && t < n {
			let (a, b) = (find(&mut parent, s), find(&mut parent, t));
			parent[a] = b;
		}
	}

	let mut components: Vec<Vec<usize>> = Vec::new();
	let mut slot = vec![usize::MAX; n];
	for i in 0..n {
		let root = find(&mut parent, i);
		if slot[root] == usize::MAX {
			slot[root] = components.len();
			components.push(Vec::new());
		}
		components[slot[root]].push(i);
	}
	if components.len() < 2 {
		return;
	}

	let bounds = |members: &[usize], positions: &[Point]| {
		members.iter().fold(
			(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
			|(x0, y0, x1, y1), &i| {
				let (w, h) = sizes[i];
				let p = positions[i];
				(
					x0.min(p.x - w / 2.0),
					y0.min(p.y - h / 2.0),
					x1.max(p.x + w / 2.0),
					y1.max(p.y + h / 2.0),
				)
			},
		)
	};

	let (mut cursor_x, mut cursor_y, mut row_height) = (0.0_f64, 0.0_f64, 0.0_f64);
	for members in &components {
		let (x0, y0, x1, y1) = bounds(members, &*positions);
		let (w, h) = (x1 - x0, y1 - y0);
		if cursor_x > 0.0 && cursor_x + w > size.0 {
			cursor_x = 0.0;
			cursor_y += row_height + COMPONENT_GAP;
			row_height = 0.0;
		}
		let offset = Point::new(cursor_x - x0, cursor_y - y0);
		for &i in members {
			positions[i] = positions[i] + offset;
		}
		cursor_x += w + COMPONENT_GAP;
		row_height = row_height.max(h);
	}

	let all: Vec<usize> = (0..n).collect();
	let (x0, y0, x1, y1) = bounds(&all, &*positions);
	let shift = Point::new(size.0 / 2.0, size.1 / 2.0) - Point::new((x0 + x1) / 2.0, (y0 + y1) / 2.0);
	for p in positions.iter_mut().take(n) {
		*p = *p + shift;
	}
}
