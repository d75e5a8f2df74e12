//! Headless collaborators
//!
//! Stand-ins for the document rasterizer, the model loader and the GPU
//! surface, so the viewer can be driven from the command line and from
//! tests without a window.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;

use crate::assets::{AssetLoader, AssetSpec, LoadFuture, Material, SceneNode};
use crate::document::{DocumentInfo, DocumentRenderer, OpenFuture, RasterImage, RenderFuture};
use crate::error::{AssetError, DocumentError, SurfaceError};
use crate::scheduler::{Frame, RendererSurface};

/// Paper white, used to fill headless page rasters
const PAGE_FILL: [u8; 4] = [255, 255, 255, 255];

/// Document of blank pages
#[derive(Debug, Clone)]
pub struct HeadlessDocument {
    page_count: u32,
    delay: Duration,
    fill: bool,
}

impl HeadlessDocument {
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            delay: Duration::ZERO,
            fill: false,
        }
    }

    /// Delay every open and render by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Allocate and fill raster pixels instead of returning empty buffers
    pub fn with_pixels(mut self) -> Self {
        self.fill = true;
        self
    }
}

impl DocumentRenderer for HeadlessDocument {
    fn open(&self) -> OpenFuture {
        let page_count = self.page_count;
        let delay = self.delay;
        Box::pin(async move {
            pause(delay).await;
            if page_count == 0 {
                return Err(DocumentError::OpenFailed("document has no pages".to_string()));
            }
            Ok(DocumentInfo { page_count })
        })
    }

    fn render_page(&self, page: u32, width: u32, height: u32) -> RenderFuture {
        let page_count = self.page_count;
        let delay = self.delay;
        let fill = self.fill;
        Box::pin(async move {
            pause(delay).await;
            if page == 0 || page > page_count {
                return Err(DocumentError::RenderFailed {
                    page,
                    reason: format!("document has {page_count} pages"),
                });
            }
            let rgba = if fill {
                PAGE_FILL.repeat(width as usize * height as usize)
            } else {
                Vec::new()
            };
            debug!(page, width, height, "page rasterized");
            Ok(RasterImage {
                page,
                width,
                height,
                rgba,
            })
        })
    }
}

/// Builds scene nodes with a fixed number of transparent materials
#[derive(Debug, Clone)]
pub struct ManifestAssetLoader {
    materials: usize,
    failing: HashSet<String>,
    delay: Duration,
}

impl ManifestAssetLoader {
    pub fn new(materials: usize) -> Self {
        Self {
            materials,
            failing: HashSet::new(),
            delay: Duration::ZERO,
        }
    }

    /// Make loads of asset `id` fail
    pub fn failing(mut self, id: impl Into<String>) -> Self {
        self.failing.insert(id.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl AssetLoader for ManifestAssetLoader {
    fn load(&self, spec: &AssetSpec) -> LoadFuture {
        let id = spec.id.clone();
        let source = spec.source.clone();
        let fails = self.failing.contains(&id);
        let materials = self.materials;
        let delay = self.delay;
        Box::pin(async move {
            pause(delay).await;
            if fails {
                return Err(AssetError::LoadFailed {
                    id,
                    reason: format!("could not read {source}"),
                });
            }
            let materials = (0..materials)
                .map(|i| Material::new(format!("{id}-material-{i}"), 0.0))
                .collect();
            Ok(SceneNode::new(materials))
        })
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// What a [`RecordingSurface`] saw in one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub number: u64,
    pub raster_page: Option<u32>,
    /// Ids of the objects the 3D layer drew
    pub objects: Vec<String>,
    /// Highest material opacity among drawn objects
    pub max_opacity: f32,
    pub projection_height: f32,
    pub segments: usize,
}

/// Surface that records a summary of every frame
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    records: Vec<FrameRecord>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&FrameRecord> {
        self.records.last()
    }
}

impl RendererSurface for RecordingSurface {
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), SurfaceError> {
        let mut objects = Vec::new();
        let mut max_opacity: f32 = 0.0;
        for object in frame.visible_objects() {
            objects.push(object.id.clone());
            max_opacity = max_opacity.max(object.opacity());
        }

        let raster_page = if frame.layers.document {
            frame.raster.map(|r| r.page)
        } else {
            None
        };
        let segments = if frame.layers.annotation {
            frame.annotation.segment_count()
        } else {
            0
        };

        self.records.push(FrameRecord {
            number: frame.number,
            raster_page,
            objects,
            max_opacity,
            projection_height: frame.projection.height(),
            segments,
        });
        Ok(())
    }
}
