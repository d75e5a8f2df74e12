//! Viewer application state and event handling
//!
//! [`Viewer`] owns every piece of mutable presentation state: layout,
//! camera, drag controller, asset slots, page state machine, layer flags
//! and annotations. Input events mutate it through [`Viewer::handle`].
//! Background work (document open, asset loads, page renders) runs on
//! tokio tasks and reports back as [`Completion`] messages, which are only
//! applied between ticks.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::annotation::AnnotationLayer;
use crate::assets::{AssetLoader, AssetRegistry, AssetSlot, SceneNode};
use crate::config::ViewerConfig;
use crate::document::{
    DocumentInfo, DocumentRenderer, PageNavigator, RasterImage, RenderSequencer, RenderToken,
};
use crate::drag::DragMomentum;
use crate::error::{AssetError, ConfigError, DocumentError, ViewerError, ViewerResult};
use crate::fade::{AnimatedObject, FadeAnimator, FadeReport};
use crate::layers::{Layer, LayerToggles};
use crate::pages::{PageAssetMap, PageOutcome, PageStateMachine};
use crate::scheduler::Frame;
use crate::viewport::{CameraState, Layout, compute_layout};
use crate::zoom::ZoomDirection;

/// Input the viewer reacts to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerEvent {
    GoToPage { page: u32 },
    NextPage,
    PrevPage,
    /// Document scale up one step
    ScaleIn,
    /// Document scale down one step
    ScaleOut,
    /// Pointer coordinates are pixels relative to the layer rectangle
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    PointerLeave,
    /// Only the sign of `delta_y` is used
    Wheel { delta_y: f32 },
    Resize { width: f32, height: f32 },
    SetLayer { layer: Layer, on: bool },
    ToggleDrawMode,
}

/// Result of background work, delivered to the viewer between ticks
#[derive(Debug)]
pub enum Completion {
    DocumentOpened(Result<DocumentInfo, DocumentError>),
    AssetLoaded {
        index: usize,
        result: Result<SceneNode, AssetError>,
    },
    PageRendered {
        token: RenderToken,
        page: u32,
        result: Result<RasterImage, DocumentError>,
    },
}

/// Presentation state of the whole viewer
pub struct Viewer {
    config: ViewerConfig,
    window: (f32, f32),
    /// Document scale (fraction of window height)
    scale: f32,
    layout: Layout,
    camera: CameraState,
    drag: DragMomentum,
    fade: FadeAnimator,
    assets: AssetRegistry,
    pages: PageStateMachine,
    layers: LayerToggles,
    annotation: AnnotationLayer,
    navigator: Option<PageNavigator>,
    sequencer: RenderSequencer,
    raster: Option<RasterImage>,
    document: Arc<dyn DocumentRenderer>,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
}

impl Viewer {
    /// Build a viewer for a window of `width` × `height` pixels
    pub fn new(
        config: ViewerConfig,
        width: f32,
        height: f32,
        document: Arc<dyn DocumentRenderer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let scale = config.document.start_scale;
        let layout = compute_layout(
            width,
            height,
            scale,
            config.document.aspect_ratio,
            config.camera.frustum_size,
        );
        let camera = CameraState::new(&config.camera, &layout, scale);
        let anim = &config.animation;
        let drag = DragMomentum::new(anim.drag_sensitivity, anim.damping, anim.rest_threshold);
        let fade = FadeAnimator::new(anim.fade_speed, anim.fade_epsilon);
        let assets = AssetRegistry::new(config.assets.clone());
        let pages = PageStateMachine::new(PageAssetMap::from_config(&config)?);
        let annotation = AnnotationLayer::new(config.annotation.clone());
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            window: (layout.window_width, layout.window_height),
            scale,
            layout,
            camera,
            drag,
            fade,
            assets,
            pages,
            layers: LayerToggles::default(),
            annotation,
            navigator: None,
            sequencer: RenderSequencer::new(),
            raster: None,
            document,
            completions_tx,
            completions_rx,
        })
    }

    /// Open the document and start loading every asset in the background
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, loader: &dyn AssetLoader) {
        let open = self.document.open();
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Completion::DocumentOpened(open.await));
        });

        for (index, spec) in self.assets.specs().iter().enumerate() {
            debug!(asset = %spec.id, source = %spec.source, "loading asset");
            let load = loader.load(spec);
            let tx = self.completions_tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(Completion::AssetLoaded {
                    index,
                    result: load.await,
                });
            });
        }
    }

    /// Sender for hosts that produce completions themselves
    pub fn completion_sender(&self) -> UnboundedSender<Completion> {
        self.completions_tx.clone()
    }

    // ========== Accessors ==========

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn drag(&self) -> &DragMomentum {
        &self.drag
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn layers(&self) -> &LayerToggles {
        &self.layers
    }

    pub fn annotation(&self) -> &AnnotationLayer {
        &self.annotation
    }

    pub fn raster(&self) -> Option<&RasterImage> {
        self.raster.as_ref()
    }

    /// Document scale used for the layout
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Current page, once the document is open
    pub fn current_page(&self) -> Option<u32> {
        self.navigator.map(|n| n.current())
    }

    pub fn page_count(&self) -> Option<u32> {
        self.navigator.map(|n| n.page_count())
    }

    /// The object receiving drag input
    pub fn active_object(&self) -> Option<&AnimatedObject> {
        self.pages.active().and_then(|i| self.assets.object(i))
    }

    /// Borrow the state a renderer needs for frame `number`
    pub fn frame(&self, number: u64) -> Frame<'_> {
        Frame {
            number,
            layout: &self.layout,
            projection: self.camera.projection(),
            layers: &self.layers,
            raster: self.raster.as_ref(),
            annotation: &self.annotation,
            assets: &self.assets,
        }
    }

    // ========== Events ==========

    /// Apply one input event
    pub fn handle(&mut self, event: ViewerEvent) -> ViewerResult<()> {
        debug!(?event, "event");
        match event {
            ViewerEvent::GoToPage { page } => {
                let navigator = self.navigator.as_mut().ok_or(ViewerError::NoDocument)?;
                let page = navigator.go_to(page)?;
                self.render_page(page);
            }
            ViewerEvent::NextPage => {
                let navigator = self.navigator.as_mut().ok_or(ViewerError::NoDocument)?;
                if let Some(page) = navigator.next() {
                    self.render_page(page);
                }
            }
            ViewerEvent::PrevPage => {
                let navigator = self.navigator.as_mut().ok_or(ViewerError::NoDocument)?;
                if let Some(page) = navigator.prev() {
                    self.render_page(page);
                }
            }
            ViewerEvent::ScaleIn => {
                self.set_scale(self.scale * self.config.document.scale_step);
            }
            ViewerEvent::ScaleOut => {
                self.set_scale(self.scale / self.config.document.scale_step);
            }
            ViewerEvent::PointerDown { x, y } => {
                if self.annotation.draw_mode() {
                    self.annotation.pointer_down(x, y);
                } else {
                    self.drag.pointer_down(x, y);
                }
            }
            ViewerEvent::PointerMove { x, y } => {
                if self.annotation.draw_mode() {
                    self.annotation.pointer_move(x, y);
                } else if let Some(delta) = self.drag.pointer_move(x, y) {
                    if let Some(object) = self.active_visible_object_mut() {
                        delta.apply(&mut object.node.rotation);
                    }
                }
            }
            ViewerEvent::PointerUp => {
                self.annotation.pointer_up();
                self.drag.pointer_up();
            }
            ViewerEvent::PointerLeave => {
                self.annotation.pointer_up();
                self.drag.pointer_leave();
            }
            ViewerEvent::Wheel { delta_y } => {
                if let Some(direction) = ZoomDirection::from_wheel(delta_y) {
                    self.camera.zoom.request_step(direction);
                }
            }
            ViewerEvent::Resize { width, height } => {
                self.window = (width, height);
                self.refresh();
            }
            ViewerEvent::SetLayer { layer, on } => self.set_layer(layer, on),
            ViewerEvent::ToggleDrawMode => {
                if self.annotation.toggle_draw_mode() {
                    // The 3D layer stops receiving pointer input
                    self.drag.pointer_up();
                }
            }
        }
        Ok(())
    }

    fn set_layer(&mut self, layer: Layer, on: bool) {
        self.layers.set(layer, on);
        if layer == Layer::Scene {
            PageStateMachine::set_scene_layer(on, &mut self.assets);
            if on {
                if let Some(page) = self.current_page() {
                    self.pages.on_page_change(page, &mut self.assets);
                }
            }
        }
    }

    /// Apply a document scale held inside the configured bounds
    fn set_scale(&mut self, scale: f32) {
        let document = &self.config.document;
        self.scale = scale.clamp(document.min_scale, document.max_scale);
        self.refresh();
    }

    /// Re-lay out and, with a document open, re-render the current page
    fn refresh(&mut self) {
        match self.current_page() {
            Some(page) => self.render_page(page),
            None => self.relayout(),
        }
    }

    fn relayout(&mut self) {
        self.layout = compute_layout(
            self.window.0,
            self.window.1,
            self.scale,
            self.config.document.aspect_ratio,
            self.config.camera.frustum_size,
        );
        self.window = (self.layout.window_width, self.layout.window_height);
        self.camera.apply_layout(&self.layout);
        self.annotation.clear();
    }

    /// Lay out for `page` and request its raster; asset switching follows
    /// when the render completes
    fn render_page(&mut self, page: u32) {
        self.relayout();
        let token = self.sequencer.issue();
        let (width, height) = self.layout.pixel_size();
        debug!(page, token = token.value(), width, height, "requesting page render");

        let render = self.document.render_page(page, width, height);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Completion::PageRendered {
                token,
                page,
                result: render.await,
            });
        });
    }

    // ========== Completions ==========

    /// Apply every completion that has arrived; returns how many
    pub fn drain_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply_completion(completion);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completion and apply it
    pub async fn wait_completion(&mut self) -> bool {
        match self.completions_rx.recv().await {
            Some(completion) => {
                self.apply_completion(completion);
                true
            }
            None => false,
        }
    }

    pub fn apply_completion(&mut self, completion: Completion) {
        match completion {
            Completion::DocumentOpened(Ok(info)) => {
                info!(pages = info.page_count, "document opened");
                let navigator = PageNavigator::new(info);
                let page = navigator.current();
                self.navigator = Some(navigator);
                self.render_page(page);
            }
            Completion::DocumentOpened(Err(err)) => {
                warn!(error = %err, "document unavailable");
            }
            Completion::AssetLoaded { index, result } => {
                if !self.assets.resolve(index, result) {
                    return;
                }
                // A page shown while its asset was loading picks it up now
                let Some(page) = self.current_page() else {
                    return;
                };
                let loaded = self.assets.slot(index).is_some_and(AssetSlot::is_loaded);
                if loaded && self.pages.map().asset_for(page) == Some(index) {
                    self.pages.on_page_change(page, &mut self.assets);
                }
            }
            Completion::PageRendered {
                token,
                page,
                result,
            } => {
                if !self.sequencer.is_latest(token) {
                    debug!(page, token = token.value(), "discarding stale page render");
                    return;
                }
                match result {
                    Ok(raster) => self.raster = Some(raster),
                    Err(err) => warn!(page, error = %err, "page render failed"),
                }
                let outcome = self.pages.on_page_change(page, &mut self.assets);
                if let PageOutcome::Shown(index) = outcome {
                    debug!(page, asset = index, "page asset active");
                }
            }
        }
    }

    // ========== Tick steps ==========

    /// Coast the active object if the pointer is released
    pub fn step_momentum(&mut self) -> bool {
        if self.drag.is_dragging() {
            return false;
        }
        let Some(index) = self.pages.active() else {
            return false;
        };
        let Some(object) = self.assets.object_mut(index).filter(|o| o.visible) else {
            return false;
        };
        match self.drag.coast() {
            Some(delta) => {
                delta.apply(&mut object.node.rotation);
                true
            }
            None => false,
        }
    }

    /// Fade and auto-rotate every loaded object
    pub fn step_fades(&mut self) -> FadeReport {
        self.fade
            .tick(self.assets.objects_mut(), self.layers.auto_rotate)
    }

    /// Ease the camera zoom
    pub fn step_zoom(&mut self) -> bool {
        self.camera.tick_zoom()
    }

    fn active_visible_object_mut(&mut self) -> Option<&mut AnimatedObject> {
        let index = self.pages.active()?;
        self.assets.object_mut(index).filter(|o| o.visible)
    }

    // ========== Snapshot ==========

    /// Serializable summary of the current state
    pub fn snapshot(&self) -> ViewerSnapshot {
        let objects = self
            .assets
            .specs()
            .iter()
            .enumerate()
            .map(|(index, spec)| match self.assets.slot(index) {
                Some(AssetSlot::Loaded(object)) => ObjectSnapshot {
                    id: spec.id.clone(),
                    state: "loaded",
                    visible: object.visible,
                    fade_target: object.fade_target,
                    opacity: object.opacity(),
                    rotation: object.node.rotation,
                },
                Some(AssetSlot::Failed(_)) => ObjectSnapshot::unloaded(&spec.id, "failed"),
                _ => ObjectSnapshot::unloaded(&spec.id, "pending"),
            })
            .collect();

        ViewerSnapshot {
            page: self.current_page(),
            page_count: self.page_count(),
            scale: self.scale,
            zoom: self.camera.zoom.current(),
            zoom_target: self.camera.zoom.target(),
            layer_width: self.layout.pixel_width,
            layer_height: self.layout.pixel_height,
            offset_x: self.layout.offset_x,
            offset_y: self.layout.offset_y,
            layers: self.layers,
            draw_mode: self.annotation.draw_mode(),
            strokes: self.annotation.strokes().len(),
            active: self.active_object().map(|o| o.id.clone()),
            raster_page: self.raster.as_ref().map(|r| r.page),
            objects,
        }
    }
}

/// Per-asset part of a [`ViewerSnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSnapshot {
    pub id: String,
    pub state: &'static str,
    pub visible: bool,
    pub fade_target: f32,
    pub opacity: f32,
    pub rotation: [f32; 3],
}

impl ObjectSnapshot {
    fn unloaded(id: &str, state: &'static str) -> Self {
        Self {
            id: id.to_string(),
            state,
            visible: false,
            fade_target: 0.0,
            opacity: 0.0,
            rotation: [0.0; 3],
        }
    }
}

/// Serializable summary of a [`Viewer`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerSnapshot {
    pub page: Option<u32>,
    pub page_count: Option<u32>,
    pub scale: f32,
    pub zoom: f32,
    pub zoom_target: f32,
    pub layer_width: f32,
    pub layer_height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub layers: LayerToggles,
    pub draw_mode: bool,
    pub strokes: usize,
    pub active: Option<String>,
    pub raster_page: Option<u32>,
    pub objects: Vec<ObjectSnapshot>,
}
