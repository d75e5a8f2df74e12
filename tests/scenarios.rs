//! End-to-end viewer scenarios against the headless collaborators

use std::sync::Arc;
use std::time::Duration;

use folio3d::assets::{AssetLoader, AssetSpec, LoadFuture, Material, SceneNode};
use folio3d::headless::{HeadlessDocument, ManifestAssetLoader, RecordingSurface};
use folio3d::layers::Layer;
use folio3d::{AnimationScheduler, Viewer, ViewerConfig, ViewerEvent};

fn viewer_with(document: HeadlessDocument) -> Viewer {
    Viewer::new(ViewerConfig::default(), 1000.0, 800.0, Arc::new(document))
        .expect("default config is valid")
}

fn scene_on() -> ViewerEvent {
    ViewerEvent::SetLayer {
        layer: Layer::Scene,
        on: true,
    }
}

/// Start the viewer, turn the scene layer on and let everything load
async fn started(loader: &dyn AssetLoader) -> (Viewer, AnimationScheduler<RecordingSurface>) {
    let mut viewer = viewer_with(HeadlessDocument::new(12));
    viewer.start(loader);
    viewer.handle(scene_on()).unwrap();
    let mut scheduler = AnimationScheduler::new(RecordingSurface::new());
    scheduler.run(&mut viewer, 3, None).await;
    (viewer, scheduler)
}

#[tokio::test]
async fn unmapped_page_fades_everything_out() {
    let (mut viewer, mut scheduler) = started(&ManifestAssetLoader::new(2)).await;
    viewer.handle(ViewerEvent::GoToPage { page: 8 }).unwrap();
    scheduler.run(&mut viewer, 30, None).await;
    assert_eq!(scheduler.surface().last().unwrap().objects, ["ID1f-CD"]);

    viewer.handle(ViewerEvent::GoToPage { page: 1 }).unwrap();
    scheduler.run(&mut viewer, 80, None).await;

    assert!(viewer.assets().objects().all(|o| o.fade_target == 0.0));
    assert!(viewer.assets().objects().all(|o| !o.visible));
    assert!(scheduler.surface().last().unwrap().objects.is_empty());
    assert!(viewer.active_object().is_none());
}

#[tokio::test]
async fn fading_out_never_jumps() {
    let (mut viewer, mut scheduler) = started(&ManifestAssetLoader::new(3)).await;
    viewer.handle(ViewerEvent::GoToPage { page: 10 }).unwrap();
    scheduler.run(&mut viewer, 40, None).await;
    viewer.handle(ViewerEvent::GoToPage { page: 2 }).unwrap();
    scheduler.run(&mut viewer, 80, None).await;

    // Every frame while the object was drawn shows a lower opacity than
    // the one before, and it disappears only once nearly transparent
    let fading: Vec<f32> = scheduler
        .surface()
        .records()
        .iter()
        .skip(45)
        .take_while(|r| !r.objects.is_empty())
        .map(|r| r.max_opacity)
        .collect();
    assert!(fading.windows(2).all(|w| w[1] < w[0]));
    assert!(*fading.last().unwrap() < 0.02);
}

#[tokio::test(start_paused = true)]
async fn rapid_page_flips_settle_on_the_last_page() {
    let document = HeadlessDocument::new(12).with_delay(Duration::from_millis(5));
    let mut viewer = viewer_with(document);
    viewer.start(&ManifestAssetLoader::new(1));
    viewer.handle(scene_on()).unwrap();
    let mut scheduler = AnimationScheduler::new(RecordingSurface::new());
    let frame = Some(Duration::from_millis(16));
    scheduler.run(&mut viewer, 3, frame).await;

    for page in [8, 10, 3, 8] {
        viewer.handle(ViewerEvent::GoToPage { page }).unwrap();
    }
    scheduler.run(&mut viewer, 40, frame).await;

    assert_eq!(viewer.current_page(), Some(8));
    assert_eq!(viewer.raster().map(|r| r.page), Some(8));
    assert_eq!(viewer.active_object().map(|o| o.id.as_str()), Some("ID1f-CD"));
    let visible: Vec<_> = viewer
        .assets()
        .objects()
        .filter(|o| o.visible)
        .map(|o| o.id.clone())
        .collect();
    assert_eq!(visible, ["ID1f-CD"]);
}

#[tokio::test]
async fn failed_asset_leaves_its_page_empty() {
    let loader = ManifestAssetLoader::new(2).failing("ID1f-CD");
    let (mut viewer, mut scheduler) = started(&loader).await;

    viewer.handle(ViewerEvent::GoToPage { page: 8 }).unwrap();
    scheduler.run(&mut viewer, 10, None).await;
    assert!(viewer.active_object().is_none());
    assert!(scheduler.surface().last().unwrap().objects.is_empty());

    // The other asset is unaffected
    viewer.handle(ViewerEvent::GoToPage { page: 10 }).unwrap();
    scheduler.run(&mut viewer, 10, None).await;
    assert_eq!(
        viewer.active_object().map(|o| o.id.as_str()),
        Some("ID1f-CDB")
    );
}

#[tokio::test(start_paused = true)]
async fn slow_asset_appears_once_loaded() {
    let loader = ManifestAssetLoader::new(1).with_delay(Duration::from_millis(500));
    let mut viewer = viewer_with(HeadlessDocument::new(12));
    viewer.start(&loader);
    viewer.handle(scene_on()).unwrap();
    let mut scheduler = AnimationScheduler::new(RecordingSurface::new());
    let frame = Some(Duration::from_millis(16));

    scheduler.run(&mut viewer, 3, frame).await;
    viewer.handle(ViewerEvent::GoToPage { page: 10 }).unwrap();
    scheduler.run(&mut viewer, 5, frame).await;
    assert!(viewer.active_object().is_none());

    scheduler.run(&mut viewer, 40, frame).await;
    assert_eq!(
        viewer.active_object().map(|o| o.id.as_str()),
        Some("ID1f-CDB")
    );
}

#[tokio::test]
async fn drag_then_coast_comes_to_rest() {
    let (mut viewer, mut scheduler) = started(&ManifestAssetLoader::new(1)).await;
    viewer.handle(ViewerEvent::SetLayer {
        layer: Layer::AutoRotate,
        on: false,
    })
    .unwrap();
    viewer.handle(ViewerEvent::GoToPage { page: 8 }).unwrap();
    scheduler.run(&mut viewer, 2, None).await;

    viewer.handle(ViewerEvent::PointerDown { x: 0.0, y: 0.0 }).unwrap();
    viewer.handle(ViewerEvent::PointerMove { x: 10.0, y: 0.0 }).unwrap();
    viewer.handle(ViewerEvent::PointerUp).unwrap();
    let after_drag = viewer.active_object().unwrap().node.rotation[1];
    assert!((after_drag - 0.05).abs() < 1e-6);

    let report = scheduler.tick(&mut viewer);
    assert!(report.coasted);

    scheduler.run(&mut viewer, 400, None).await;
    let settled = viewer.active_object().unwrap().node.rotation[1];
    // Geometric series: v0 / (1 - d) of extra travel at most
    let bound = after_drag + 0.05 / (1.0 - 0.93);
    assert!(settled > after_drag && settled <= bound + 1e-4);
    assert_eq!(viewer.drag().velocity(), (0.0, 0.0));
    assert!(!scheduler.tick(&mut viewer).coasted);
}

/// Loader handing out a model with a corrupt material
struct CorruptLoader;

impl AssetLoader for CorruptLoader {
    fn load(&self, spec: &AssetSpec) -> LoadFuture {
        let corrupt = spec.id == "ID1f-CD";
        Box::pin(async move {
            let opacity = if corrupt { f32::NAN } else { 0.0 };
            Ok(SceneNode::new(vec![Material::new("skin", opacity)]))
        })
    }
}

#[tokio::test]
async fn corrupt_object_does_not_stop_the_others() {
    let (mut viewer, mut scheduler) = started(&CorruptLoader).await;
    viewer.handle(ViewerEvent::GoToPage { page: 10 }).unwrap();
    scheduler.run(&mut viewer, 30, None).await;

    let stats = scheduler.stats();
    assert!(stats.faults > 0);
    assert_eq!(stats.surface_errors, 0);

    let healthy = viewer.active_object().unwrap();
    assert_eq!(healthy.id, "ID1f-CDB");
    assert!(healthy.opacity() > 0.9);
}

#[tokio::test]
async fn resize_keeps_layers_aligned() {
    let (mut viewer, mut scheduler) = started(&ManifestAssetLoader::new(1)).await;
    viewer
        .handle(ViewerEvent::Resize {
            width: 1200.0,
            height: 600.0,
        })
        .unwrap();
    scheduler.run(&mut viewer, 2, None).await;

    let layout = *viewer.layout();
    assert!((layout.pixel_height - 540.0).abs() < 1e-3);
    assert!((layout.pixel_width - 771.428_6).abs() < 1e-2);
    assert_eq!(viewer.raster().map(|r| (r.width, r.height)), Some((771, 540)));

    let projection = viewer.camera().projection();
    let ratio = projection.width() / projection.height();
    assert!((ratio - layout.aspect()).abs() < 1e-4);
}
