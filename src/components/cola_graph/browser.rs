//! Browser glue: `requestAnimationFrame` scheduling and scoped DOM listeners.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::EventTarget;

use super::animation::FrameScheduler;

/// Frame callback slot, filled once the controller exists.
pub type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Schedules frames through `window.requestAnimationFrame`.
pub struct RafScheduler {
	callback: FrameCallback,
}

impl RafScheduler {
	/// Uses whatever closure `callback` holds when a frame is requested.
	pub fn new(callback: FrameCallback) -> Self {
		Self { callback }
	}
}

impl FrameScheduler for RafScheduler {
	fn request_frame(&mut self) {
		let Some(window) = web_sys::window() else {
			warn!("no window to schedule a frame on");
			return;
		};
		if let Some(cb) = self.callback.borrow().as_ref() {
			if let Err(err) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				warn!("requestAnimationFrame failed: {err:?}");
			}
		}
	}
}

/// Event listeners that are removed again when the guard is dropped.
///
/// The closures themselves are owned elsewhere; the guard only keeps the
/// function handles it registered, so dropping it from inside one of those
/// closures is fine.
pub struct ListenerGuard {
	target: EventTarget,
	registered: Vec<(&'static str, js_sys::Function)>,
}

impl ListenerGuard {
	/// An empty guard for `target`.
	pub fn new(target: impl Into<EventTarget>) -> Self {
		Self {
			target: target.into(),
			registered: Vec::new(),
		}
	}

	/// Registers `closure` for `event`.
	pub fn listen<T: ?Sized>(mut self, event: &'static str, closure: &Closure<T>) -> Self {
		let function: &js_sys::Function = closure.as_ref().unchecked_ref();
		match self
			.target
			.add_event_listener_with_callback(event, function)
		{
			Ok(()) => self.registered.push((event, function.clone())),
			Err(err) => warn!("could not listen for {event}: {err:?}"),
		}
		self
	}
}

impl Drop for ListenerGuard {
	fn drop(&mut self) {
		for (event, function) in self.registered.drain(..) {
			if let Err(err) = self
				.target
				.remove_event_listener_with_callback(event, &function)
			{
				warn!("could not stop listening for {event}: {err:?}");
			}
		}
	}
}
