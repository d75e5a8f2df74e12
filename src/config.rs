//! Viewer configuration
//!
//! All tunable constants of the viewer live here: layout ratios, camera
//! frustum, animation speeds, the asset list and the page-to-asset map.
//! Configs are read from YAML or JSON, chosen by file extension.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::assets::AssetSpec;
use crate::error::ConfigError;
use crate::pages::PageAssetMap;

/// Document layer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// Fraction of the window height the page occupies at startup
    pub start_scale: f32,
    /// Intrinsic page aspect ratio (width / height)
    pub aspect_ratio: f32,
    /// Multiplier applied by the scale-in / scale-out buttons
    pub scale_step: f32,
    /// Bounds the scale buttons cannot push past
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            start_scale: 0.9,
            aspect_ratio: 4.0 / 2.8,
            scale_step: 1.1,
            min_scale: 0.1,
            max_scale: 10.0,
        }
    }
}

/// Orthographic camera settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Logical height of the orthographic frustum
    pub frustum_size: f32,
    pub near: f32,
    pub far: f32,
    /// Multiplier applied to the zoom target per wheel step
    pub zoom_step: f32,
    /// Fraction of the remaining zoom distance covered per tick
    pub zoom_easing: f32,
    /// Bounds for the zoom target
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            frustum_size: 10.0,
            near: 0.1,
            far: 1000.0,
            zoom_step: 1.1,
            zoom_easing: 0.1,
            min_zoom: 0.1,
            max_zoom: 10.0,
        }
    }
}

/// Fade and drag physics constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub fade_speed: f32,
    /// Opacity below which a fading-out object is hidden
    pub fade_epsilon: f32,
    /// Radians of rotation per pixel of pointer drag
    pub drag_sensitivity: f32,
    /// Per-tick velocity multiplier while coasting
    pub damping: f32,
    /// Velocity magnitude that is snapped to zero
    pub rest_threshold: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            fade_speed: 0.1,
            fade_epsilon: 0.01,
            drag_sensitivity: 0.005,
            damping: 0.93,
            rest_threshold: 1e-6,
        }
    }
}

/// Freehand annotation pen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationSettings {
    /// CSS color string handed to the annotation surface
    pub color: String,
    pub line_width: f32,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            color: "rgba(0,191,255,1)".to_string(),
            line_width: 5.0,
        }
    }
}

/// Complete viewer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub document: DocumentSettings,
    pub camera: CameraSettings,
    pub animation: AnimationSettings,
    /// 3D assets in slot order
    pub assets: Vec<AssetSpec>,
    /// Page number to asset id
    pub pages: BTreeMap<u32, String>,
    pub annotation: AnnotationSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let assets = vec![
            AssetSpec::new("ID1f-CDB", "models/ID1f-CDB.glb"),
            AssetSpec::new("ID1f-CD", "models/ID1f-CD.glb"),
        ];
        let pages = BTreeMap::from([(8, "ID1f-CD".to_string()), (10, "ID1f-CDB".to_string())]);

        Self {
            document: DocumentSettings::default(),
            camera: CameraSettings::default(),
            animation: AnimationSettings::default(),
            assets,
            pages,
            annotation: AnnotationSettings::default(),
        }
    }
}

impl ViewerConfig {
    /// Load and validate a config file, choosing the format from its extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;

        let content = fs::read_to_string(path)?;
        let config = match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content)?,
            "json" => Self::from_json_str(&content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config without validating it
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse a JSON config without validating it
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check every constant against its allowed range and resolve the page map
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("document.start_scale", self.document.start_scale)?;
        positive("document.aspect_ratio", self.document.aspect_ratio)?;
        above_one("document.scale_step", self.document.scale_step)?;
        range(
            "document.max_scale",
            self.document.min_scale,
            self.document.max_scale,
        )?;
        if !(self.document.min_scale..=self.document.max_scale).contains(&self.document.start_scale)
        {
            return Err(ConfigError::Invalid {
                field: "document.start_scale",
                reason: format!(
                    "{} is outside [{}, {}]",
                    self.document.start_scale, self.document.min_scale, self.document.max_scale
                ),
            });
        }

        positive("camera.frustum_size", self.camera.frustum_size)?;
        positive("camera.near", self.camera.near)?;
        if !(self.camera.far > self.camera.near) {
            return Err(ConfigError::Invalid {
                field: "camera.far",
                reason: format!("must exceed near ({})", self.camera.near),
            });
        }
        above_one("camera.zoom_step", self.camera.zoom_step)?;
        unit_fraction("camera.zoom_easing", self.camera.zoom_easing, true)?;
        range("camera.max_zoom", self.camera.min_zoom, self.camera.max_zoom)?;

        unit_fraction("animation.fade_speed", self.animation.fade_speed, true)?;
        unit_fraction("animation.fade_epsilon", self.animation.fade_epsilon, false)?;
        unit_fraction("animation.damping", self.animation.damping, false)?;
        finite("animation.drag_sensitivity", self.animation.drag_sensitivity)?;
        positive("animation.rest_threshold", self.animation.rest_threshold)?;

        positive("annotation.line_width", self.annotation.line_width)?;

        let mut seen = HashSet::new();
        for asset in &self.assets {
            if !seen.insert(asset.id.as_str()) {
                return Err(ConfigError::DuplicateAsset(asset.id.clone()));
            }
            finite("assets.rotate_speed", asset.rotate_speed)?;
            positive("assets.scale", asset.scale)?;
        }

        PageAssetMap::from_config(self).map(|_| ())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is not finite"),
        })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must be positive"),
        })
    }
}

fn above_one(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must be greater than 1"),
        })
    }
}

/// Positive lower bound strictly below a finite upper bound
fn range(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    positive(field, min)?;
    finite(field, max)?;
    if max > min {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{max} must exceed the minimum {min}"),
        })
    }
}

/// Range check for `(0, 1)`, or `(0, 1]` when `allow_one` is set
fn unit_fraction(field: &'static str, value: f32, allow_one: bool) -> Result<(), ConfigError> {
    finite(field, value)?;
    let upper_ok = if allow_one { value <= 1.0 } else { value < 1.0 };
    if value > 0.0 && upper_ok {
        Ok(())
    } else {
        let range = if allow_one { "(0, 1]" } else { "(0, 1)" };
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is outside {range}"),
        })
    }
}
