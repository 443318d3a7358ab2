use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::geometry::Point;
use super::scene::{ARROW_SHORTEN, EdgeLine, NodeShape, Scene};
use super::types::NodeId;

const BACKGROUND: &str = "#ffffff";
const EDGE_COLOR: &str = "#555555";
const SECONDARY_EDGE_COLOR: &str = "lightgray";
const SECONDARY_ARROW_COLOR: &str = "gray";
const LABEL_COLOR: &str = "#ffffff";
const LABEL_FONT: &str = "12px sans-serif";
const OVERLAY_FONT: &str = "11px monospace";
const CORNER_RADIUS: f64 = 5.0;
const ARROW_LENGTH: f64 = 9.0;
const ARROW_WIDTH: f64 = 6.0;

/// Categorical palette for nodes without a recognised color.
const COLORS: [&str; 10] = [
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// A label width measured while painting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelMeasure {
	/// Node whose label was measured.
	pub node: NodeId,
	/// Rendered text width in world units.
	pub width: f64,
}

/// Fill color for a node `color` value: status classes map to the status
/// palette, CSS colors pass through, anything else hashes into [`COLORS`].
pub fn node_fill(color: &str) -> &str {
	match color {
		"ok" => "#2ca02c",
		"err" => "#d62728",
		"fup" => "#ff7f0e",
		"ood" => "#9467bd",
		c if c.starts_with('#') || c.starts_with("rgb") || c.starts_with("hsl") => c,
		"" => COLORS[0],
		c => {
			let hash = c
				.bytes()
				.fold(0usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
			COLORS[hash % COLORS.len()]
		}
	}
}

/// Paints `scene` and returns the labels that were measured for the first time.
pub fn render(
	ctx: &CanvasRenderingContext2d,
	scene: &Scene,
	width: f64,
	height: f64,
) -> Vec<LabelMeasure> {
	let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, width, height);

	let [a, b, c, d, e, f] = scene.transform;
	let _ = ctx.set_transform(a, b, c, d, e, f);
	draw_edges(ctx, &scene.secondary_edges);
	draw_edges(ctx, &scene.edges);
	let measured = draw_nodes(ctx, &scene.nodes);

	let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
	ctx.set_fill_style_str(EDGE_COLOR);
	ctx.set_font(OVERLAY_FONT);
	ctx.set_text_align("left");
	ctx.set_text_baseline("bottom");
	let _ = ctx.fill_text(&scene.tick.to_string(), 4.0, height - 4.0);
	measured
}

fn draw_edges(ctx: &CanvasRenderingContext2d, edges: &[EdgeLine]) {
	for edge in edges {
		let Point { x: x1, y: y1 } = edge.segment.start;
		let Point { x: x2, y: y2 } = edge.segment.end;
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let (stroke, arrow) = if edge.secondary {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(4.0),
				&JsValue::from_f64(3.0),
			));
			(SECONDARY_EDGE_COLOR, SECONDARY_ARROW_COLOR)
		} else {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
			(EDGE_COLOR, EDGE_COLOR)
		};
		ctx.set_stroke_style_str(stroke);
		ctx.set_line_width(1.5);
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2, y2);
		ctx.stroke();

		// The tip sits on the target outline, past the shortened line end.
		let (ux, uy) = (dx / dist, dy / dist);
		let (tip_x, tip_y) = (x2 + ux * ARROW_SHORTEN, y2 + uy * ARROW_SHORTEN);
		let (back_x, back_y) = (tip_x - ux * ARROW_LENGTH, tip_y - uy * ARROW_LENGTH);
		let (px, py) = (-uy * ARROW_WIDTH * 0.5, ux * ARROW_WIDTH * 0.5);
		ctx.set_fill_style_str(arrow);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, shape: &NodeShape) {
	let Point { x, y } = shape.top_left();
	let (w, h) = (shape.width, shape.height);
	let r = CORNER_RADIUS.min(w / 2.0).min(h / 2.0);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

fn draw_nodes(ctx: &CanvasRenderingContext2d, nodes: &[NodeShape]) -> Vec<LabelMeasure> {
	let mut measured = Vec::new();
	ctx.set_font(LABEL_FONT);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");

	for shape in nodes {
		rounded_rect(ctx, shape);
		ctx.set_fill_style_str(node_fill(&shape.color));
		ctx.fill();
		ctx.set_stroke_style_str(BACKGROUND);
		ctx.set_line_width(1.5);
		ctx.stroke();

		ctx.set_fill_style_str(LABEL_COLOR);
		let _ = ctx.fill_text(&shape.label, shape.center.x, shape.center.y);
		if !shape.measured {
			if let Ok(metrics) = ctx.measure_text(&shape.label) {
				measured.push(LabelMeasure {
					node: shape.node,
					width: metrics.width(),
				});
			}
		}
	}
	measured
}
