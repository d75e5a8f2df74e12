//! 3D asset slots and the loader seam
//!
//! Each configured asset owns one slot that moves from `Pending` to
//! `Loaded` or `Failed` exactly once. The page state machine only ever
//! shows objects whose slot is `Loaded`.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::AssetError;
use crate::fade::AnimatedObject;

/// Future returned by [`AssetLoader::load`]
pub type LoadFuture = Pin<Box<dyn Future<Output = Result<SceneNode, AssetError>> + Send>>;

/// Loads renderable scene nodes for asset specs
///
/// Implementations do the actual file or network work; the viewer only
/// awaits the result on a background task.
pub trait AssetLoader: Send + Sync {
    fn load(&self, spec: &AssetSpec) -> LoadFuture;
}

/// A 3D asset declared in the config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    /// Identifier referenced by the page map
    pub id: String,
    /// Where the loader finds the model
    pub source: String,
    #[serde(default = "default_position")]
    pub position: [f32; 3],
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Auto-rotation in radians per tick
    #[serde(default = "default_rotate_speed")]
    pub rotate_speed: f32,
}

fn default_position() -> [f32; 3] {
    [-5.0, 0.0, 0.0]
}

fn default_scale() -> f32 {
    1.5
}

fn default_rotate_speed() -> f32 {
    0.001
}

impl AssetSpec {
    /// Asset entry with the default placement and rotation speed
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            position: default_position(),
            scale: default_scale(),
            rotate_speed: default_rotate_speed(),
        }
    }
}

/// A material surface whose opacity the fade animator drives
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub opacity: f32,
}

impl Material {
    pub fn new(name: impl Into<String>, opacity: f32) -> Self {
        Self {
            name: name.into(),
            opacity,
        }
    }
}

/// Renderable object graph, flattened to its transform and materials
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub position: [f32; 3],
    /// Euler angles in radians
    pub rotation: [f32; 3],
    pub scale: f32,
    /// Every material in the graph, collected once at load time
    pub materials: Vec<Material>,
}

impl SceneNode {
    /// Node at the origin with unit scale
    pub fn new(materials: Vec<Material>) -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: 1.0,
            materials,
        }
    }
}

/// Load state of one configured asset
#[derive(Debug, Clone, PartialEq)]
pub enum AssetSlot {
    Pending,
    Loaded(AnimatedObject),
    Failed(AssetError),
}

impl AssetSlot {
    pub fn is_loaded(&self) -> bool {
        matches!(self, AssetSlot::Loaded(_))
    }
}

/// Counts of slots per state
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SlotSummary {
    pub pending: usize,
    pub loaded: usize,
    pub failed: usize,
}

/// All asset slots, indexed in config order
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    specs: Vec<AssetSpec>,
    slots: Vec<AssetSlot>,
}

impl AssetRegistry {
    /// One pending slot per asset entry
    pub fn new(specs: Vec<AssetSpec>) -> Self {
        let slots = vec![AssetSlot::Pending; specs.len()];
        Self { specs, slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn specs(&self) -> &[AssetSpec] {
        &self.specs
    }

    pub fn slot(&self, index: usize) -> Option<&AssetSlot> {
        self.slots.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.id == id)
    }

    /// The loaded object in slot `index`, if any
    pub fn object(&self, index: usize) -> Option<&AnimatedObject> {
        match self.slots.get(index) {
            Some(AssetSlot::Loaded(object)) => Some(object),
            _ => None,
        }
    }

    pub fn object_mut(&mut self, index: usize) -> Option<&mut AnimatedObject> {
        match self.slots.get_mut(index) {
            Some(AssetSlot::Loaded(object)) => Some(object),
            _ => None,
        }
    }

    /// Every loaded object, in slot order
    pub fn objects(&self) -> impl Iterator<Item = &AnimatedObject> {
        self.slots.iter().filter_map(|slot| match slot {
            AssetSlot::Loaded(object) => Some(object),
            _ => None,
        })
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut AnimatedObject> {
        self.slots.iter_mut().filter_map(|slot| match slot {
            AssetSlot::Loaded(object) => Some(object),
            _ => None,
        })
    }

    /// Record the outcome of loading slot `index`
    ///
    /// A successful load is placed as its entry says and starts hidden. Returns
    /// false if the index is unknown or the slot already settled.
    pub fn resolve(&mut self, index: usize, result: Result<SceneNode, AssetError>) -> bool {
        let (Some(spec), Some(slot)) = (self.specs.get(index), self.slots.get_mut(index)) else {
            warn!(index, "load result for unknown asset slot");
            return false;
        };
        if !matches!(slot, AssetSlot::Pending) {
            warn!(asset = %spec.id, "asset slot already settled, ignoring result");
            return false;
        }

        *slot = match result {
            Ok(mut node) => {
                node.position = spec.position;
                node.scale = spec.scale;
                info!(
                    asset = %spec.id,
                    materials = node.materials.len(),
                    "asset loaded"
                );
                AssetSlot::Loaded(AnimatedObject::new(
                    spec.id.clone(),
                    node,
                    spec.rotate_speed,
                ))
            }
            Err(err) => {
                warn!(asset = %spec.id, error = %err, "asset unavailable");
                AssetSlot::Failed(err)
            }
        };
        true
    }

    pub fn summary(&self) -> SlotSummary {
        let mut summary = SlotSummary::default();
        for slot in &self.slots {
            match slot {
                AssetSlot::Pending => summary.pending += 1,
                AssetSlot::Loaded(_) => summary.loaded += 1,
                AssetSlot::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AssetRegistry {
        AssetRegistry::new(vec![
            AssetSpec::new("a", "a.glb"),
            AssetSpec::new("b", "b.glb"),
        ])
    }

    fn node() -> SceneNode {
        SceneNode::new(vec![Material::new("m", 1.0)])
    }

    #[test]
    fn slots_start_pending() {
        let registry = registry();
        assert_eq!(
            registry.summary(),
            SlotSummary {
                pending: 2,
                loaded: 0,
                failed: 0
            }
        );
        assert!(registry.object(0).is_none());
    }

    #[test]
    fn resolve_places_node_from_entry() {
        let mut registry = registry();
        assert!(registry.resolve(1, Ok(node())));

        let object = registry.object(1).expect("loaded");
        assert_eq!(object.id, "b");
        assert_eq!(object.node.position, [-5.0, 0.0, 0.0]);
        assert_eq!(object.node.scale, 1.5);
        assert!(!object.visible);
        assert_eq!(object.fade_target, 0.0);
        assert!(!object.rotate);
    }

    #[test]
    fn failed_load_is_recorded() {
        let mut registry = registry();
        registry.resolve(0, Err(AssetError::NotFound("a".to_string())));
        assert!(matches!(registry.slot(0), Some(AssetSlot::Failed(_))));
        assert_eq!(registry.summary().failed, 1);
        assert_eq!(registry.objects().count(), 0);
    }

    #[test]
    fn settled_slot_ignores_second_result() {
        let mut registry = registry();
        assert!(registry.resolve(0, Ok(node())));
        assert!(!registry.resolve(0, Err(AssetError::NotFound("a".to_string()))));
        assert!(registry.slot(0).is_some_and(AssetSlot::is_loaded));
    }

    #[test]
    fn unknown_index_is_ignored() {
        let mut registry = registry();
        assert!(!registry.resolve(7, Ok(node())));
    }

    #[test]
    fn objects_iterate_in_slot_order() {
        let mut registry = registry();
        registry.resolve(1, Ok(node()));
        registry.resolve(0, Ok(node()));
        let ids: Vec<_> = registry.objects().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(registry.index_of("b"), Some(1));
    }

    #[test]
    fn spec_defaults_fill_from_yaml() {
        let spec: AssetSpec = serde_yaml::from_str("id: x\nsource: x.glb\n").unwrap();
        assert_eq!(spec, AssetSpec::new("x", "x.glb"));
    }
}
