//! Scripted input sessions
//!
//! A session script is a list of viewer events keyed by the frame they
//! are delivered on. It lets the `simulate` command replay a user's page
//! flips, drags and toggles without a window.
//!
//! ```yaml
//! steps:
//!   - frame: 10
//!     event: { type: go_to_page, page: 8 }
//!   - frame: 20
//!     event: { type: pointer_down, x: 100, y: 100 }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ConfigError;
use crate::scheduler::{AnimationScheduler, RendererSurface, RunStats};
use crate::viewer::{Viewer, ViewerEvent};

/// One scheduled event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Frame number (1-based) the event is delivered before
    pub frame: u64,
    pub event: ViewerEvent,
}

/// Events to replay, ordered by frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionScript {
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl SessionScript {
    /// Load a script from a YAML or JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "json" => Self::from_json_str(&content),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let script: Self =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(script.sorted())
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let script: Self =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(script.sorted())
    }

    fn sorted(mut self) -> Self {
        // Stable: same-frame events keep their file order
        self.steps.sort_by_key(|step| step.frame);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Events delivered before frame `frame`
    pub fn events_at(&self, frame: u64) -> impl Iterator<Item = &ViewerEvent> {
        self.steps
            .iter()
            .filter(move |step| step.frame == frame)
            .map(|step| &step.event)
    }

    /// Last frame that carries an event
    pub fn last_frame(&self) -> u64 {
        self.steps.last().map_or(0, |step| step.frame)
    }

    /// Run `frames` ticks, delivering each step before its frame
    ///
    /// Rejected events (bad page numbers, navigation before the document
    /// opened) are logged and skipped.
    pub async fn play<S: RendererSurface>(
        &self,
        viewer: &mut Viewer,
        scheduler: &mut AnimationScheduler<S>,
        frames: u64,
        period: Option<Duration>,
    ) -> PlayStats {
        let mut delivered = 0;
        let mut rejected = 0;
        info!(steps = self.len(), frames, "replaying session");

        let run = scheduler
            .run_with(viewer, frames, period, |frame, viewer| {
                for event in self.events_at(frame) {
                    match viewer.handle(event.clone()) {
                        Ok(()) => delivered += 1,
                        Err(err) => {
                            warn!(frame, ?event, error = %err, "event rejected");
                            rejected += 1;
                        }
                    }
                }
            })
            .await;

        PlayStats {
            run,
            delivered,
            rejected,
        }
    }
}

/// Outcome of [`SessionScript::play`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayStats {
    pub run: RunStats,
    pub delivered: usize,
    pub rejected: usize,
}
