//! folio3d - Page-driven presentation core for a document viewer with a 3D overlay.
//!
//! A document page, a freehand annotation layer and a 3D scene share one
//! rectangle. Flipping pages shows the 3D model that belongs to the page;
//! models fade in and out, coast after being dragged, and the camera eases
//! toward the requested zoom. Rendering and file loading sit behind traits
//! so the state machine runs the same headless as it does in a window.

pub mod annotation;
pub mod assets;
pub mod config;
pub mod document;
pub mod drag;
pub mod error;
pub mod fade;
pub mod headless;
pub mod layers;
pub mod pages;
pub mod scheduler;
pub mod session;
pub mod viewer;
pub mod viewport;
pub mod zoom;

pub use config::ViewerConfig;
pub use error::{ViewerError, ViewerResult};
pub use scheduler::{AnimationScheduler, Frame, FrameReport, RendererSurface};
pub use viewer::{Viewer, ViewerEvent, ViewerSnapshot};
