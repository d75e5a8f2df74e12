//! Layer visibility toggles
//!
//! Independent boolean flags for the stacked layers and render options.
//! No combination is invalid.

use serde::{Deserialize, Serialize};

/// A toggleable layer or render option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Rasterized document page
    Document,
    /// Freehand annotation strokes
    Annotation,
    /// 3D model layer
    Scene,
    /// Shadow casting in the 3D layer
    Shadows,
    /// Auto-rotation of the page's asset
    AutoRotate,
}

/// Layer visibility options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerToggles {
    pub document: bool,
    pub annotation: bool,
    pub scene: bool,
    pub shadows: bool,
    pub auto_rotate: bool,
}

impl Default for LayerToggles {
    /// Document and annotations on, 3D layer and shadows off, auto-rotate on
    fn default() -> Self {
        Self {
            document: true,
            annotation: true,
            scene: false,
            shadows: false,
            auto_rotate: true,
        }
    }
}

impl LayerToggles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, layer: Layer) -> bool {
        match layer {
            Layer::Document => self.document,
            Layer::Annotation => self.annotation,
            Layer::Scene => self.scene,
            Layer::Shadows => self.shadows,
            Layer::AutoRotate => self.auto_rotate,
        }
    }

    /// Set a flag; returns true if it changed
    pub fn set(&mut self, layer: Layer, on: bool) -> bool {
        let flag = match layer {
            Layer::Document => &mut self.document,
            Layer::Annotation => &mut self.annotation,
            Layer::Scene => &mut self.scene,
            Layer::Shadows => &mut self.shadows,
            Layer::AutoRotate => &mut self.auto_rotate,
        };
        let changed = *flag != on;
        *flag = on;
        changed
    }

    pub fn toggle(&mut self, layer: Layer) {
        let on = !self.get(layer);
        self.set(layer, on);
    }
}
