//! Interactive constrained graph layout on a 2D canvas.
//!
//! A [`GraphController`] owns the viewport, the pointer drag state and a
//! frame-driven [`AnimationLoop`] around any [`LayoutEngine`]. Each layout
//! tick is composed into a [`Scene`] (node rectangles plus edges clipped to
//! node outlines) and handed to the renderer; the next step is scheduled only
//! after the previous one was drawn. [`ColaGraphCanvas`] wires all of this to
//! the DOM with [`ForceLayout`] as the solver.

pub mod animation;
mod browser;
mod component;
pub mod controller;
pub mod drag;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod layout;
mod render;
pub mod scene;
pub mod types;
pub mod viewport;

pub use animation::{AnimationLoop, FrameScheduler};
pub use browser::{FrameCallback, ListenerGuard, RafScheduler};
pub use component::ColaGraphCanvas;
pub use controller::{GraphController, LayoutConfig};
pub use engine::ForceLayout;
pub use error::GraphError;
pub use layout::{Iterations, LayoutEngine, LayoutEvent, Link};
pub use render::{LabelMeasure, node_fill, render};
pub use scene::Scene;
pub use types::{EdgeData, Graph, GraphData, NodeData, NodeId};
