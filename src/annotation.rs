//! Freehand annotation layer
//!
//! Strokes are recorded as polylines in layer pixel coordinates. Drawing
//! only happens in draw mode, which also routes pointer input here instead
//! of to the 3D layer. Strokes are not persisted; resizing the layers
//! clears them the same way resizing a canvas does.

use serde::Serialize;

use crate::config::AnnotationSettings;

/// One continuous pen stroke
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub color: String,
    pub line_width: f32,
    pub points: Vec<(f32, f32)>,
}

impl Stroke {
    /// Line segments between consecutive points
    pub fn segments(&self) -> impl Iterator<Item = ((f32, f32), (f32, f32))> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Annotation strokes and pen state
#[derive(Debug, Clone)]
pub struct AnnotationLayer {
    pen: AnnotationSettings,
    draw_mode: bool,
    drawing: bool,
    strokes: Vec<Stroke>,
}

impl AnnotationLayer {
    pub fn new(pen: AnnotationSettings) -> Self {
        Self {
            pen,
            draw_mode: false,
            drawing: false,
            strokes: Vec::new(),
        }
    }

    /// Whether pointer input belongs to this layer
    pub fn draw_mode(&self) -> bool {
        self.draw_mode
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Flip draw mode; returns the new state
    pub fn toggle_draw_mode(&mut self) -> bool {
        self.draw_mode = !self.draw_mode;
        if !self.draw_mode {
            self.drawing = false;
        }
        self.draw_mode
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// Start a stroke at `(x, y)` if draw mode is on
    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if !self.draw_mode {
            return;
        }
        self.drawing = true;
        self.strokes.push(Stroke {
            color: self.pen.color.clone(),
            line_width: self.pen.line_width,
            points: vec![(x, y)],
        });
    }

    /// Extend the current stroke; returns the new segment
    pub fn pointer_move(&mut self, x: f32, y: f32) -> Option<((f32, f32), (f32, f32))> {
        if !self.drawing {
            return None;
        }
        let stroke = self.strokes.last_mut()?;
        let from = *stroke.points.last()?;
        stroke.points.push((x, y));
        Some((from, (x, y)))
    }

    /// Pointer released or left the layer
    pub fn pointer_up(&mut self) {
        self.drawing = false;
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.drawing = false;
    }

    /// Total number of drawn segments
    pub fn segment_count(&self) -> usize {
        self.strokes.iter().map(|s| s.segments().count()).sum()
    }
}
