//! Viewport geometry shared by the document, annotation and 3D layers
//!
//! All three layers are stacked on the same rectangle. This module derives
//! that rectangle from the window size, the document's fixed aspect ratio
//! and the document scale, plus the orthographic frustum the 3D camera uses
//! for it. Everything here is pure calculation and unit tested.

use serde::Serialize;

use crate::config::CameraSettings;
use crate::zoom::ZoomEasing;

/// Smallest window extent accepted, in pixels
pub const MIN_WINDOW_EXTENT: f32 = 1.0;

/// Smallest document scale accepted
pub const MIN_ZOOM_SCALE: f32 = 1e-3;

/// Symmetric orthographic frustum bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Frustum {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Frustum {
    /// Frustum of logical height `size` for a surface of the given aspect
    pub fn from_aspect(size: f32, aspect: f32) -> Self {
        let half_height = size / 2.0;
        let half_width = size * aspect / 2.0;
        Self {
            left: -half_width,
            right: half_width,
            top: half_height,
            bottom: -half_height,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Bounds after applying an orthographic zoom (extents shrink as zoom grows)
    pub fn zoomed(&self, zoom: f32) -> Self {
        let zoom = if zoom.is_finite() && zoom > 0.0 {
            zoom
        } else {
            MIN_ZOOM_SCALE
        };
        Self {
            left: self.left / zoom,
            right: self.right / zoom,
            top: self.top / zoom,
            bottom: self.bottom / zoom,
        }
    }
}

/// Pixel rectangle shared by all layers, centered in the window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Layout {
    /// Window size the layout was computed for (after clamping)
    pub window_width: f32,
    pub window_height: f32,
    /// Layer size in pixels
    pub pixel_width: f32,
    pub pixel_height: f32,
    /// Top-left corner of the layers inside the window
    pub offset_x: f32,
    pub offset_y: f32,
    /// Camera frustum matching the layer aspect
    pub frustum: Frustum,
}

impl Layout {
    /// Layer aspect ratio (width / height)
    pub fn aspect(&self) -> f32 {
        self.pixel_width / self.pixel_height
    }

    /// Whole-pixel size for raster requests (never zero)
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.pixel_width.round().max(1.0) as u32,
            self.pixel_height.round().max(1.0) as u32,
        )
    }
}

/// Compute the shared layer rectangle and camera frustum
///
/// Degenerate inputs are clamped rather than rejected: window extents to
/// [`MIN_WINDOW_EXTENT`], the scale to [`MIN_ZOOM_SCALE`].
pub fn compute_layout(
    window_width: f32,
    window_height: f32,
    zoom_scale: f32,
    aspect_ratio: f32,
    frustum_size: f32,
) -> Layout {
    let window_width = clamp_extent(window_width);
    let window_height = clamp_extent(window_height);
    let zoom_scale = if zoom_scale.is_finite() {
        zoom_scale.max(MIN_ZOOM_SCALE)
    } else {
        MIN_ZOOM_SCALE
    };

    let pixel_height = window_height * zoom_scale;
    let pixel_width = pixel_height * aspect_ratio;

    Layout {
        window_width,
        window_height,
        pixel_width,
        pixel_height,
        offset_x: (window_width - pixel_width) / 2.0,
        offset_y: (window_height - pixel_height) / 2.0,
        frustum: Frustum::from_aspect(frustum_size, pixel_width / pixel_height),
    }
}

fn clamp_extent(value: f32) -> f32 {
    if value.is_finite() {
        value.max(MIN_WINDOW_EXTENT)
    } else {
        MIN_WINDOW_EXTENT
    }
}

/// Orthographic camera looking down -Z at the origin
#[derive(Debug, Clone)]
pub struct CameraState {
    /// Unzoomed frustum from the latest layout
    pub frustum: Frustum,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    /// Zoom target and eased current value
    pub zoom: ZoomEasing,
    projection: Frustum,
}

impl CameraState {
    /// Create a camera for `layout` starting at `start_zoom`
    pub fn new(settings: &CameraSettings, layout: &Layout, start_zoom: f32) -> Self {
        let zoom = ZoomEasing::new(start_zoom, settings.zoom_step, settings.zoom_easing)
            .with_bounds(settings.min_zoom, settings.max_zoom);
        let projection = layout.frustum.zoomed(zoom.current());
        Self {
            frustum: layout.frustum,
            near: settings.near,
            far: settings.far,
            position: [0.0, 0.0, 10.0],
            zoom,
            projection,
        }
    }

    /// Adopt the frustum of a freshly computed layout
    pub fn apply_layout(&mut self, layout: &Layout) {
        self.frustum = layout.frustum;
        self.update_projection();
    }

    /// Ease the zoom one tick, recomputing the projection when it moved
    pub fn tick_zoom(&mut self) -> bool {
        let changed = self.zoom.tick();
        if changed {
            self.update_projection();
        }
        changed
    }

    /// Effective projection bounds (frustum divided by current zoom)
    pub fn projection(&self) -> &Frustum {
        &self.projection
    }

    fn update_projection(&mut self) {
        self.projection = self.frustum.zoomed(self.zoom.current());
    }
}
