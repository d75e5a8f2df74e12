use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Page-driven document viewer with a 3D overlay, run headless.
#[derive(Parser, Debug)]
#[command(name = "folio3d")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Viewer config file (.yaml, .yml or .json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the layer rectangle and camera frustum for a window size
    Layout {
        /// Window width in pixels
        #[arg(long)]
        width: f32,

        /// Window height in pixels
        #[arg(long)]
        height: f32,

        /// Document scale (defaults to the configured start scale)
        #[arg(long)]
        scale: Option<f32>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run the viewer against headless collaborators
    Simulate {
        /// Session script (.yaml, .yml or .json) of frame-keyed events
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Number of frames to run
        #[arg(short, long, default_value = "120")]
        frames: u64,

        /// Page count of the headless document
        #[arg(short, long, default_value = "12")]
        pages: u32,

        /// Frame rate; unthrottled when omitted
        #[arg(long)]
        fps: Option<f32>,

        /// Window width in pixels
        #[arg(long, default_value = "1000")]
        width: f32,

        /// Window height in pixels
        #[arg(long, default_value = "800")]
        height: f32,

        /// Materials per loaded model
        #[arg(long, default_value = "2")]
        materials: usize,

        /// Asset id whose load should fail (repeatable)
        #[arg(long = "fail-asset")]
        fail_assets: Vec<String>,

        /// Print the final viewer state as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_layout_subcommand() {
        let cli = Cli::try_parse_from([
            "folio3d", "layout", "--width", "1200", "--height", "600",
        ])
        .unwrap();
        assert!(cli.config.is_none());
        match cli.command {
            Commands::Layout {
                width,
                height,
                scale,
                json,
            } => {
                assert_eq!(width, 1200.0);
                assert_eq!(height, 600.0);
                assert!(scale.is_none());
                assert!(!json);
            }
            _ => panic!("Expected Layout command"),
        }
    }

    #[test]
    fn cli_parses_simulate_with_defaults() {
        let cli = Cli::try_parse_from(["folio3d", "simulate"]).unwrap();
        match cli.command {
            Commands::Simulate {
                script,
                frames,
                pages,
                fps,
                materials,
                fail_assets,
                ..
            } => {
                assert!(script.is_none());
                assert_eq!(frames, 120);
                assert_eq!(pages, 12);
                assert!(fps.is_none());
                assert_eq!(materials, 2);
                assert!(fail_assets.is_empty());
            }
            _ => panic!("Expected Simulate command"),
        }
    }

    #[test]
    fn cli_accepts_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "folio3d",
            "simulate",
            "--config",
            "viewer.yaml",
            "--fail-asset",
            "ID1f-CD",
            "--fail-asset",
            "ID1f-CDB",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("viewer.yaml")));
        match cli.command {
            Commands::Simulate { fail_assets, .. } => {
                assert_eq!(fail_assets, ["ID1f-CD", "ID1f-CDB"]);
            }
            _ => panic!("Expected Simulate command"),
        }
    }

    #[test]
    fn cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["folio3d"]).is_err());
    }
}
