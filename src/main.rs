use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use folio3d::headless::{HeadlessDocument, ManifestAssetLoader, RecordingSurface};
use folio3d::session::SessionScript;
use folio3d::viewport::compute_layout;
use folio3d::{AnimationScheduler, Viewer, ViewerConfig};

mod cli;

use cli::{Cli, Commands};

fn load_config(path: Option<&Path>) -> anyhow::Result<ViewerConfig> {
    match path {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(ViewerConfig::default()),
    }
}

fn layout(
    config: &ViewerConfig,
    width: f32,
    height: f32,
    scale: Option<f32>,
    json: bool,
) -> anyhow::Result<()> {
    let scale = scale.unwrap_or(config.document.start_scale);
    let layout = compute_layout(
        width,
        height,
        scale,
        config.document.aspect_ratio,
        config.camera.frustum_size,
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
    } else {
        let (pixel_width, pixel_height) = layout.pixel_size();
        println!("layers:  {pixel_width}x{pixel_height} px");
        println!("offset:  ({:.2}, {:.2})", layout.offset_x, layout.offset_y);
        println!(
            "frustum: left {:.4} right {:.4} top {:.4} bottom {:.4}",
            layout.frustum.left, layout.frustum.right, layout.frustum.top, layout.frustum.bottom
        );
    }
    Ok(())
}

struct SimulateArgs {
    script: Option<std::path::PathBuf>,
    frames: u64,
    pages: u32,
    fps: Option<f32>,
    width: f32,
    height: f32,
    materials: usize,
    fail_assets: Vec<String>,
    json: bool,
}

async fn simulate(config: ViewerConfig, args: SimulateArgs) -> anyhow::Result<()> {
    let period = match args.fps {
        Some(fps) if fps.is_finite() && fps > 0.0 => Some(Duration::from_secs_f32(1.0 / fps)),
        Some(fps) => bail!("--fps must be a positive number, got {fps}"),
        None => None,
    };
    let script = match &args.script {
        Some(path) => SessionScript::load(path)
            .with_context(|| format!("failed to load script {}", path.display()))?,
        None => SessionScript::default(),
    };

    let document = Arc::new(HeadlessDocument::new(args.pages));
    let mut viewer = Viewer::new(config, args.width, args.height, document)?;
    let mut loader = ManifestAssetLoader::new(args.materials);
    for id in args.fail_assets {
        loader = loader.failing(id);
    }
    viewer.start(&loader);

    let mut scheduler = AnimationScheduler::new(RecordingSurface::new());
    let played = script
        .play(&mut viewer, &mut scheduler, args.frames, period)
        .await;

    let snapshot = viewer.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!(
        "Ran {} frames ({} events, {} rejected, {} surface errors)",
        played.run.frames, played.delivered, played.rejected, played.run.surface_errors
    );
    match (snapshot.page, snapshot.page_count) {
        (Some(page), Some(count)) => println!("page:   {page} of {count}"),
        _ => println!("page:   document not open"),
    }
    println!("active: {}", snapshot.active.as_deref().unwrap_or("none"));
    for object in &snapshot.objects {
        println!(
            "asset {:<12} {:<8} visible={} opacity={:.3}",
            object.id, object.state, object.visible, object.opacity
        );
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("folio3d=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Layout {
            width,
            height,
            scale,
            json,
        } => {
            layout(&config, width, height, scale, json)?;
        }
        Commands::Simulate {
            script,
            frames,
            pages,
            fps,
            width,
            height,
            materials,
            fail_assets,
            json,
        } => {
            let args = SimulateArgs {
                script,
                frames,
                pages,
                fps,
                width,
                height,
                materials,
                fail_assets,
                json,
            };
            simulate(config, args).await?;
        }
    }

    Ok(())
}
