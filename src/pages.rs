//! Page-to-asset state machine
//!
//! Decides which 3D asset (if any) belongs to the current page. Every page
//! change first resets all objects, then shows the mapped one. The reset
//! makes the transition idempotent and keeps stale objects from lingering.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::assets::{AssetRegistry, AssetSlot};
use crate::config::ViewerConfig;
use crate::error::ConfigError;

/// Static page number to asset slot mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageAssetMap {
    entries: BTreeMap<u32, usize>,
}

impl PageAssetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `page` to the asset in slot `asset`
    pub fn with_page(mut self, page: u32, asset: usize) -> Self {
        self.entries.insert(page, asset);
        self
    }

    /// Resolve the config's page → asset id map to slot indices
    pub fn from_config(config: &ViewerConfig) -> Result<Self, ConfigError> {
        let mut map = Self::new();
        for (&page, id) in &config.pages {
            if page == 0 {
                return Err(ConfigError::Invalid {
                    field: "pages",
                    reason: "page numbers start at 1".to_string(),
                });
            }
            let index = config
                .assets
                .iter()
                .position(|a| &a.id == id)
                .ok_or_else(|| ConfigError::UnknownAsset {
                    page,
                    asset: id.clone(),
                })?;
            map.entries.insert(page, index);
        }
        Ok(map)
    }

    /// Asset slot for `page`, or `None` for an asset-free page
    pub fn asset_for(&self, page: u32) -> Option<usize> {
        self.entries.get(&page).copied()
    }

    /// All mapped pages in ascending order
    pub fn pages(&self) -> impl Iterator<Item = (u32, usize)> + '_ {
        self.entries.iter().map(|(&page, &asset)| (page, asset))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What a page change did to the 3D layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The mapped asset was shown and is now the active object
    Shown(usize),
    /// No asset belongs to this page
    AssetFree,
    /// An asset belongs to this page but is pending or failed
    Unavailable(usize),
}

/// Tracks the page mapping and the single active object
#[derive(Debug, Clone)]
pub struct PageStateMachine {
    map: PageAssetMap,
    active: Option<usize>,
}

impl PageStateMachine {
    pub fn new(map: PageAssetMap) -> Self {
        Self { map, active: None }
    }

    pub fn map(&self) -> &PageAssetMap {
        &self.map
    }

    /// Slot of the object that receives drag input
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    /// Reset every object, then show the asset mapped to `page`
    ///
    /// `page` is assumed to be in range; navigation validates it first.
    pub fn on_page_change(&mut self, page: u32, registry: &mut AssetRegistry) -> PageOutcome {
        for object in registry.objects_mut() {
            object.reset();
        }
        self.active = None;

        let Some(index) = self.map.asset_for(page) else {
            debug!(page, "asset-free page");
            return PageOutcome::AssetFree;
        };

        match registry.slot(index) {
            Some(AssetSlot::Loaded(_)) => {}
            Some(AssetSlot::Pending) => {
                info!(page, asset = index, "asset for page still loading");
                return PageOutcome::Unavailable(index);
            }
            Some(AssetSlot::Failed(err)) => {
                warn!(page, asset = index, error = %err, "asset for page failed to load");
                return PageOutcome::Unavailable(index);
            }
            None => {
                warn!(page, asset = index, "page maps to a missing asset slot");
                return PageOutcome::Unavailable(index);
            }
        }

        if let Some(object) = registry.object_mut(index) {
            object.show();
            debug!(page, asset = %object.id, "showing asset");
        }
        self.active = Some(index);
        PageOutcome::Shown(index)
    }

    /// Point every object's fade at the 3D layer's new visibility
    ///
    /// Turning the layer on fades everything toward full opacity; callers
    /// re-run [`on_page_change`](Self::on_page_change) afterwards when a
    /// document is open so only the page's asset stays. The active object
    /// is not touched.
    pub fn set_scene_layer(on: bool, registry: &mut AssetRegistry) {
        let target = if on { 1.0 } else { 0.0 };
        for object in registry.objects_mut() {
            object.fade_target = target;
        }
    }
}
