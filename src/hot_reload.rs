//! Live reloading of model artifacts.
//!
//! Watches the model directory and swaps the serving pipeline when
//! `preprocessor.json` or `model.json` change. A reload that fails to
//! parse is logged and the previous pipeline stays active, so the service
//! keeps answering while artifacts are mid-write.

use arc_swap::ArcSwap;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::pipeline::PredictPipeline;

/// Watch a model directory and swap `pipeline` when its artifacts change.
///
/// The returned watcher must be kept alive for reloads to fire.
pub fn watch_model<P: AsRef<Path>>(
    model_dir: P,
    pipeline: Arc<ArcSwap<PredictPipeline>>,
) -> notify::Result<RecommendedWatcher> {
    let dir: PathBuf = model_dir.as_ref().to_path_buf();
    let reload_dir = dir.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    return;
                }
                let touched_artifact = event.paths.iter().any(|p| {
                    p.extension().and_then(|e| e.to_str()) == Some("json")
                });
                if !touched_artifact {
                    return;
                }
                match PredictPipeline::load(&reload_dir) {
                    Ok(new_pipeline) => {
                        info!(
                            dir = %reload_dir.display(),
                            width = new_pipeline.preprocessor.width(),
                            "model artifacts reloaded"
                        );
                        pipeline.store(Arc::new(new_pipeline));
                    }
                    Err(e) => {
                        warn!(
                            dir = %reload_dir.display(),
                            error = %e,
                            "artifact reload failed, keeping previous model"
                        );
                    }
                }
            }
            Err(e) => warn!(error = %e, "model watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
