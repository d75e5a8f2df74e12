//! Opacity fades and auto-rotation for 3D assets
//!
//! Every tick each loaded object's materials move a fixed fraction of the
//! way toward the object's fade target. An object fading out is hidden only
//! once all its materials are below epsilon, so nothing ever vanishes
//! abruptly. Auto-rotation runs independently of the fade.

use thiserror::Error;
use tracing::{debug, warn};

use crate::assets::SceneNode;

/// A per-object update that produced unusable numbers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationFault {
    #[error("object '{id}' produced a non-finite {field}")]
    NonFinite { id: String, field: &'static str },
}

/// One controllable 3D asset
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedObject {
    /// Asset id from the config
    pub id: String,
    /// Scene graph, owned here and lent read-only to the renderer
    pub node: SceneNode,
    /// Gates rendering and rotation
    pub visible: bool,
    /// Opacity the materials converge toward, in `[0, 1]`
    pub fade_target: f32,
    /// Auto-rotation permitted for this object
    pub rotate: bool,
    /// Radians per tick about Y while auto-rotating
    pub rotate_speed: f32,
    /// Stand-in opacity for nodes without materials
    fallback_opacity: f32,
}

impl AnimatedObject {
    /// A freshly loaded object: hidden, fading toward zero, not rotating
    pub fn new(id: impl Into<String>, node: SceneNode, rotate_speed: f32) -> Self {
        Self {
            id: id.into(),
            node,
            visible: false,
            fade_target: 0.0,
            rotate: false,
            rotate_speed,
            fallback_opacity: 0.0,
        }
    }

    /// Effective opacity: the most opaque material, or the fallback
    pub fn opacity(&self) -> f32 {
        if self.node.materials.is_empty() {
            self.fallback_opacity
        } else {
            self.node
                .materials
                .iter()
                .map(|m| m.opacity)
                .fold(0.0, f32::max)
        }
    }

    /// Force the object out: target zero, no rotation, hidden
    pub fn reset(&mut self) {
        self.fade_target = 0.0;
        self.rotate = false;
        self.visible = false;
    }

    /// Bring the object in: visible, fading to one, rotating
    pub fn show(&mut self) {
        self.visible = true;
        self.fade_target = 1.0;
        self.rotate = true;
    }
}

/// Fade step for a single value
pub fn fade_step(opacity: f32, target: f32, speed: f32) -> f32 {
    opacity + (target - opacity) * speed
}

/// Ticks needed for an opacity starting at `start` to come within
/// `epsilon` of `target`
pub fn fade_steps_to_converge(start: f32, target: f32, speed: f32, epsilon: f32) -> u32 {
    let gap = f64::from((start - target).abs());
    let epsilon = f64::from(epsilon);
    if gap < epsilon {
        return 0;
    }
    let steps = ((epsilon / gap).ln() / (1.0 - f64::from(speed)).ln()).ceil();
    steps.max(0.0) as u32
}

/// Result of animating every object for one tick
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FadeReport {
    /// Objects that finished fading out this tick
    pub hidden: Vec<String>,
    /// Objects skipped because their update was unusable
    pub faults: Vec<AnimationFault>,
}

/// Fade and auto-rotate animator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeAnimator {
    /// Fraction of the remaining distance covered per tick
    pub speed: f32,
    /// Opacity below which a fading-out object is hidden
    pub epsilon: f32,
}

impl FadeAnimator {
    pub fn new(speed: f32, epsilon: f32) -> Self {
        Self { speed, epsilon }
    }

    /// Animate all objects; a faulty object is left untouched and reported
    pub fn tick<'a>(
        &self,
        objects: impl Iterator<Item = &'a mut AnimatedObject>,
        auto_rotate_enabled: bool,
    ) -> FadeReport {
        let mut report = FadeReport::default();
        for object in objects {
            let was_visible = object.visible;
            match self.step(object, auto_rotate_enabled) {
                Ok(()) => {
                    if was_visible && !object.visible {
                        debug!(asset = %object.id, "faded out");
                        report.hidden.push(object.id.clone());
                    }
                }
                Err(fault) => {
                    warn!(%fault, "skipping object update");
                    report.faults.push(fault);
                }
            }
        }
        report
    }

    /// Advance one object by one tick
    ///
    /// New values are computed and checked before anything is written, so a
    /// fault leaves the object exactly as it was.
    pub fn step(
        &self,
        object: &mut AnimatedObject,
        auto_rotate_enabled: bool,
    ) -> Result<(), AnimationFault> {
        let target = object.fade_target;
        let non_finite = |field| AnimationFault::NonFinite {
            id: object.id.clone(),
            field,
        };

        let fallback = if object.node.materials.is_empty() {
            target
        } else {
            object.fallback_opacity
        };
        if !fallback.is_finite()
            || object
                .node
                .materials
                .iter()
                .any(|m| !fade_step(m.opacity, target, self.speed).is_finite())
        {
            return Err(non_finite("opacity"));
        }

        let mut visible = object.visible;
        let faded_out = if object.node.materials.is_empty() {
            fallback < self.epsilon
        } else {
            object
                .node
                .materials
                .iter()
                .all(|m| fade_step(m.opacity, target, self.speed) < self.epsilon)
        };
        if target == 0.0 && faded_out {
            visible = false;
        }

        let rotation_y = if object.rotate && visible && auto_rotate_enabled {
            let next = object.node.rotation[1] + object.rotate_speed;
            if !next.is_finite() {
                return Err(non_finite("rotation"));
            }
            next
        } else {
            object.node.rotation[1]
        };

        for material in &mut object.node.materials {
            material.opacity = fade_step(material.opacity, target, self.speed);
        }
        object.fallback_opacity = fallback;
        object.visible = visible;
        object.node.rotation[1] = rotation_y;
        Ok(())
    }
}
