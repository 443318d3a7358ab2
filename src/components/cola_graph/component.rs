use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, warn};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::browser::{FrameCallback, ListenerGuard, RafScheduler};
use super::controller::{GraphController, LayoutConfig};
use super::drag::DragStep;
use super::engine::ForceLayout;
use super::geometry::Point;
use super::render::{self, LabelMeasure};
use super::scene::Scene;
use super::types::Graph;
use super::viewport::WheelInput;

type CanvasController = GraphController<ForceLayout, RafScheduler, ListenerGuard>;
type ControllerSlot = Rc<RefCell<Option<CanvasController>>>;
type PendingLabels = Rc<RefCell<Vec<LabelMeasure>>>;
type MouseCallback = Rc<Closure<dyn FnMut(MouseEvent)>>;
type ResizeSlot = Rc<RefCell<Option<(ListenerGuard, Closure<dyn FnMut()>)>>>;

fn window_size(window: &Window) -> Option<(f64, f64)> {
	Some((
		window.inner_width().ok()?.as_f64()?,
		window.inner_height().ok()?.as_f64()?,
	))
}

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> Point {
	let rect = canvas.get_bounding_client_rect();
	Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn context(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

fn paint(
	canvas: &HtmlCanvasElement,
	ctx: &CanvasRenderingContext2d,
	scene: &Scene,
	pending: &PendingLabels,
) {
	let measured = render::render(ctx, scene, canvas.width() as f64, canvas.height() as f64);
	pending.borrow_mut().extend(measured);
}

/// Feeds label widths measured during the last paint back into the graph.
fn flush_labels(ctl: &mut CanvasController, pending: &PendingLabels) {
	for label in pending.borrow_mut().drain(..) {
		ctl.measure_label(label.node, label.width);
	}
}

/// Interactive constrained-layout view of `graph` on a 2D canvas.
#[component]
pub fn ColaGraphCanvas(
	graph: Graph,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
	#[prop(optional)] config: Option<LayoutConfig>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let dragging = RwSignal::new(false);
	let controller: ControllerSlot = Rc::new(RefCell::new(None));
	let pending: PendingLabels = Rc::new(RefCell::new(Vec::new()));
	let frame: FrameCallback = Rc::new(RefCell::new(None));
	let resize: ResizeSlot = Rc::new(RefCell::new(None));
	let graph = graph.into_shared();

	let (ctl_move, pending_move) = (controller.clone(), pending.clone());
	let on_window_move: MouseCallback = Rc::new(Closure::new(move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let point = canvas_point(&canvas, &ev);
		let mut slot = ctl_move.borrow_mut();
		let Some(ctl) = slot.as_mut() else {
			return;
		};
		match ctl.pointer_move(point) {
			Some(DragStep::Pan { .. }) => {
				// panning does not reheat the layout, so repaint here
				if let (Some(ctx), Some(scene)) = (context(&canvas), ctl.redraw()) {
					paint(&canvas, &ctx, scene, &pending_move);
				}
				flush_labels(ctl, &pending_move);
			}
			Some(DragStep::Node { .. }) => {}
			None => return,
		}
		dragging.set(ctl.is_dragging());
	}));

	let ctl_up = controller.clone();
	let on_window_up: MouseCallback = Rc::new(Closure::new(move |_: MouseEvent| {
		if let Some(ctl) = ctl_up.borrow_mut().as_mut() {
			ctl.pointer_up();
		}
		dragging.set(false);
	}));

	let (ctl_init, pending_init, frame_init, resize_init) = (
		controller.clone(),
		pending.clone(),
		frame.clone(),
		resize.clone(),
	);
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if ctl_init.borrow().is_some() {
			return;
		}
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			error!("no window; graph canvas not started");
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window).unwrap_or((800.0, 600.0))
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = context(&canvas) else {
			error!("canvas has no 2d context");
			return;
		};

		let config = LayoutConfig {
			width: w,
			height: h,
			..config.clone().unwrap_or_default()
		};
		let mut ctl = GraphController::new(
			graph.clone(),
			ForceLayout::new(),
			RafScheduler::new(frame_init.clone()),
			config,
		);
		let (canvas_tick, ctx_tick, pending_tick) =
			(canvas.clone(), ctx.clone(), pending_init.clone());
		ctl.on_tick(move |scene| paint(&canvas_tick, &ctx_tick, scene, &pending_tick));

		let (ctl_frame, pending_frame) = (ctl_init.clone(), pending_init.clone());
		*frame_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ctl) = ctl_frame.borrow_mut().as_mut() {
				ctl.on_frame();
				flush_labels(ctl, &pending_frame);
			}
		}));

		if fullscreen {
			let (ctl_resize, canvas_resize, ctx_resize, pending_resize) = (
				ctl_init.clone(),
				canvas.clone(),
				ctx.clone(),
				pending_init.clone(),
			);
			let on_resize: Closure<dyn FnMut()> = Closure::new(move || {
				let Some((nw, nh)) = web_sys::window().as_ref().and_then(window_size) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ctl) = ctl_resize.borrow_mut().as_mut() {
					ctl.resize(nw, nh);
					if let Some(scene) = ctl.redraw() {
						paint(&canvas_resize, &ctx_resize, scene, &pending_resize);
					}
					flush_labels(ctl, &pending_resize);
				}
			});
			let guard = ListenerGuard::new(window.clone()).listen("resize", &on_resize);
			*resize_init.borrow_mut() = Some((guard, on_resize));
		}

		*ctl_init.borrow_mut() = Some(ctl);
		if let Some(ctl) = ctl_init.borrow_mut().as_mut() {
			ctl.start();
			flush_labels(ctl, &pending_init);
		}
	});

	let teardown = StoredValue::new_local((controller.clone(), resize));
	on_cleanup(move || {
		teardown.try_with_value(|(controller, resize)| {
			resize.borrow_mut().take();
			if let Some(ctl) = controller.borrow_mut().as_mut() {
				ctl.dispose();
			}
		});
	});

	let ctl_down = controller.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			warn!("no window for drag listeners");
			return;
		};
		let point = canvas_point(&canvas, &ev);
		let listeners = ListenerGuard::new(window)
			.listen("mousemove", &*on_window_move)
			.listen("mouseup", &*on_window_up);
		if let Some(ctl) = ctl_down.borrow_mut().as_mut() {
			ctl.pointer_down(point, listeners);
		}
	};

	let (ctl_wheel, pending_wheel) = (controller, pending);
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let input = WheelInput {
			delta_x: ev.delta_x(),
			delta_y: ev.delta_y(),
			delta_z: ev.delta_z(),
			delta_mode: ev.delta_mode(),
			cursor: canvas_point(&canvas, &ev),
		};
		if let Some(ctl) = ctl_wheel.borrow_mut().as_mut() {
			ctl.wheel(input);
			if let (Some(ctx), Some(scene)) = (context(&canvas), ctl.redraw()) {
				paint(&canvas, &ctx, scene, &pending_wheel);
			}
			flush_labels(ctl, &pending_wheel);
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="cola-graph-canvas"
			on:mousedown=on_mousedown
			on:wheel=on_wheel
			style=move || {
				if dragging.get() {
					"display: block; cursor: move;"
				} else {
					"display: block; cursor: default;"
				}
			}
		/>
	}
}
