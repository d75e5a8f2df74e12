//! Frame scheduler
//!
//! One tick advances every animation exactly once and then renders once:
//!
//! 1. apply finished background work
//! 2. coast drag momentum (pointer released only)
//! 3. fade and auto-rotate
//! 4. ease the camera zoom
//! 5. render the frame
//!
//! The order is fixed so that a frame always shows the state after all
//! updates of that tick.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::annotation::AnnotationLayer;
use crate::assets::AssetRegistry;
use crate::document::RasterImage;
use crate::error::SurfaceError;
use crate::fade::{AnimatedObject, AnimationFault};
use crate::layers::LayerToggles;
use crate::viewer::Viewer;
use crate::viewport::{Frustum, Layout};

/// State a renderer draws for one frame
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Tick number, starting at 1
    pub number: u64,
    pub layout: &'a Layout,
    /// Camera bounds after zoom
    pub projection: &'a Frustum,
    pub layers: &'a LayerToggles,
    pub raster: Option<&'a RasterImage>,
    pub annotation: &'a AnnotationLayer,
    pub assets: &'a AssetRegistry,
}

impl<'a> Frame<'a> {
    /// Objects the 3D layer draws this frame
    ///
    /// Empty while the 3D layer is toggled off.
    pub fn visible_objects(&self) -> impl Iterator<Item = &'a AnimatedObject> + 'a {
        let scene = self.layers.scene;
        let assets = self.assets;
        assets
            .objects()
            .filter(move |object| scene && object.visible)
    }
}

/// Draws frames; a GPU backend in a real host, a recorder in tests
pub trait RendererSurface {
    fn render(&mut self, frame: &Frame<'_>) -> Result<(), SurfaceError>;
}

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub number: u64,
    /// Background completions applied before updating
    pub completions: usize,
    /// Drag momentum rotated the active object
    pub coasted: bool,
    /// Camera zoom moved
    pub zoomed: bool,
    /// Objects that finished fading out
    pub hidden: Vec<String>,
    /// Objects whose update was skipped this tick
    pub faults: Vec<AnimationFault>,
    /// The surface rendered without error
    pub rendered: bool,
}

/// Counters accumulated over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub frames: u64,
    pub completions: usize,
    pub faults: usize,
    pub surface_errors: usize,
}

/// Drives the per-frame update order against a [`RendererSurface`]
pub struct AnimationScheduler<S: RendererSurface> {
    surface: S,
    frame: u64,
    stats: RunStats,
}

impl<S: RendererSurface> AnimationScheduler<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            frame: 0,
            stats: RunStats::default(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Number of ticks run so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    /// Run one tick
    pub fn tick(&mut self, viewer: &mut Viewer) -> FrameReport {
        self.frame += 1;
        let completions = viewer.drain_completions();
        let coasted = viewer.step_momentum();
        let fades = viewer.step_fades();
        let zoomed = viewer.step_zoom();

        let rendered = match self.surface.render(&viewer.frame(self.frame)) {
            Ok(()) => true,
            Err(err) => {
                warn!(frame = self.frame, error = %err, "frame render failed");
                self.stats.surface_errors += 1;
                false
            }
        };

        self.stats.frames += 1;
        self.stats.completions += completions;
        self.stats.faults += fades.faults.len();

        FrameReport {
            number: self.frame,
            completions,
            coasted,
            zoomed,
            hidden: fades.hidden,
            faults: fades.faults,
            rendered,
        }
    }

    /// Run `frames` ticks
    ///
    /// With a `period` the ticks follow a steady clock; without one each
    /// tick only yields to let background work progress.
    pub async fn run(
        &mut self,
        viewer: &mut Viewer,
        frames: u64,
        period: Option<Duration>,
    ) -> RunStats {
        self.run_with(viewer, frames, period, |_, _| {}).await
    }

    /// Like [`run`](Self::run), calling `before_tick` with the upcoming
    /// frame number ahead of each tick
    pub async fn run_with<F>(
        &mut self,
        viewer: &mut Viewer,
        frames: u64,
        period: Option<Duration>,
        mut before_tick: F,
    ) -> RunStats
    where
        F: FnMut(u64, &mut Viewer),
    {
        info!(frames, ?period, "frame loop starting");
        let mut clock = period.map(|period| {
            let mut clock = time::interval(period);
            clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
            clock
        });

        for _ in 0..frames {
            match clock.as_mut() {
                Some(clock) => {
                    clock.tick().await;
                }
                None => tokio::task::yield_now().await,
            }
            before_tick(self.frame + 1, viewer);
            let report = self.tick(viewer);
            if !report.hidden.is_empty() {
                debug!(frame = report.number, hidden = ?report.hidden, "objects hidden");
            }
        }

        info!(
            frames = self.stats.frames,
            surface_errors = self.stats.surface_errors,
            faults = self.stats.faults,
            "frame loop finished"
        );
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assets::{Material, SceneNode};
    use crate::config::ViewerConfig;
    use crate::document::{DocumentInfo, DocumentRenderer, OpenFuture, RenderFuture};
    use crate::layers::Layer;
    use crate::viewer::{Completion, ViewerEvent};

    struct BlankDocument;

    impl DocumentRenderer for BlankDocument {
        fn open(&self) -> OpenFuture {
            Box::pin(async { Ok(DocumentInfo { page_count: 12 }) })
        }

        fn render_page(&self, page: u32, width: u32, height: u32) -> RenderFuture {
            Box::pin(async move {
                Ok(RasterImage {
                    page,
                    width,
                    height,
                    rgba: Vec::new(),
                })
            })
        }
    }

    /// Keeps a short log of what each frame contained
    #[derive(Default)]
    struct LogSurface {
        frames: Vec<(u64, usize, f32)>,
        fail_on: Option<u64>,
    }

    impl RendererSurface for LogSurface {
        fn render(&mut self, frame: &Frame<'_>) -> Result<(), SurfaceError> {
            if self.fail_on == Some(frame.number) {
                return Err(SurfaceError("device lost".to_string()));
            }
            self.frames.push((
                frame.number,
                frame.visible_objects().count(),
                frame.projection.top,
            ));
            Ok(())
        }
    }

    fn viewer() -> Viewer {
        Viewer::new(
            ViewerConfig::default(),
            1000.0,
            800.0,
            Arc::new(BlankDocument),
        )
        .unwrap()
    }

    fn load_all(viewer: &Viewer) {
        let tx = viewer.completion_sender();
        for index in 0..2 {
            tx.send(Completion::AssetLoaded {
                index,
                result: Ok(SceneNode::new(vec![Material::new("m", 0.0)])),
            })
            .unwrap();
        }
    }

    #[test]
    fn tick_renders_once_and_counts_frames() {
        let mut viewer = viewer();
        let mut scheduler = AnimationScheduler::new(LogSurface::default());

        let first = scheduler.tick(&mut viewer);
        let second = scheduler.tick(&mut viewer);
        assert_eq!((first.number, second.number), (1, 2));
        assert!(first.rendered);
        assert_eq!(scheduler.surface().frames.len(), 2);
    }

    #[test]
    fn completions_are_applied_before_rendering() {
        let mut viewer = viewer();
        load_all(&viewer);
        let mut scheduler = AnimationScheduler::new(LogSurface::default());

        let report = scheduler.tick(&mut viewer);
        assert_eq!(report.completions, 2);
        assert_eq!(viewer.assets().summary().loaded, 2);
    }

    #[test]
    fn zoom_eases_and_projection_follows() {
        let mut viewer = viewer();
        let mut scheduler = AnimationScheduler::new(LogSurface::default());
        viewer.handle(ViewerEvent::Wheel { delta_y: -1.0 }).unwrap();

        assert!(scheduler.tick(&mut viewer).zoomed);
        assert!(scheduler.tick(&mut viewer).zoomed);
        let frames = &scheduler.surface().frames;
        // Zooming in shrinks the visible bounds
        assert!(frames[1].2 < frames[0].2);
    }

    #[test]
    fn surface_errors_are_counted_not_fatal() {
        let mut viewer = viewer();
        let mut scheduler = AnimationScheduler::new(LogSurface {
            fail_on: Some(2),
            ..LogSurface::default()
        });

        for _ in 0..3 {
            scheduler.tick(&mut viewer);
        }
        assert_eq!(scheduler.stats().surface_errors, 1);
        assert_eq!(scheduler.stats().frames, 3);
        assert_eq!(scheduler.surface().frames.len(), 2);
    }

    #[test]
    fn each_fault_is_reported_once_per_tick() {
        let mut viewer = viewer();
        let tx = viewer.completion_sender();
        for (index, opacity) in [(0, f32::NAN), (1, 0.0)] {
            tx.send(Completion::AssetLoaded {
                index,
                result: Ok(SceneNode::new(vec![Material::new("m", opacity)])),
            })
            .unwrap();
        }
        let mut scheduler = AnimationScheduler::new(LogSurface::default());

        for _ in 0..3 {
            let report = scheduler.tick(&mut viewer);
            assert_eq!(report.faults.len(), 1);
            assert!(report.rendered);
        }
        assert_eq!(scheduler.stats().faults, 3);
    }

    #[test]
    fn hidden_scene_layer_draws_no_objects() {
        let mut viewer = viewer();
        load_all(&viewer);
        let mut scheduler = AnimationScheduler::new(LogSurface::default());
        scheduler.tick(&mut viewer);

        viewer
            .handle(ViewerEvent::SetLayer {
                layer: Layer::Scene,
                on: true,
            })
            .unwrap();
        scheduler.tick(&mut viewer);
        // Nothing is visible until a page shows its asset
        assert!(scheduler.surface().frames.iter().all(|f| f.1 == 0));
    }

    #[tokio::test]
    async fn run_opens_document_and_fades_in_page_asset() {
        let mut viewer = viewer();
        load_all(&viewer);
        viewer
            .handle(ViewerEvent::SetLayer {
                layer: Layer::Scene,
                on: true,
            })
            .unwrap();
        viewer
            .completion_sender()
            .send(Completion::DocumentOpened(Ok(DocumentInfo {
                page_count: 12,
            })))
            .unwrap();

        let mut scheduler = AnimationScheduler::new(LogSurface::default());
        scheduler.run(&mut viewer, 5, None).await;
        viewer.handle(ViewerEvent::GoToPage { page: 8 }).unwrap();
        let stats = scheduler.run(&mut viewer, 60, None).await;

        assert_eq!(stats.frames, 65);
        assert_eq!(viewer.current_page(), Some(8));
        let active = viewer.active_object().unwrap();
        assert_eq!(active.id, "ID1f-CD");
        assert!(active.opacity() > 0.99);
        assert_eq!(scheduler.surface().frames.last().map(|f| f.1), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn run_with_period_follows_the_clock() {
        let mut viewer = viewer();
        let mut scheduler = AnimationScheduler::new(LogSurface::default());
        let started = tokio::time::Instant::now();

        scheduler
            .run(&mut viewer, 4, Some(Duration::from_millis(16)))
            .await;
        // The first interval tick completes immediately
        assert_eq!(started.elapsed(), Duration::from_millis(48));
    }
}
