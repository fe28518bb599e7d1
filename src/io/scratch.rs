//! Working paths for a URL mix and the cleanup rules around them.
//!
//! Each [`ScratchPaths`] embeds a token unique to this process and moment, so
//! concurrent mixes sharing a temp dir never touch each other's files. Removal
//! is best-effort: a failed delete is logged and never replaces the result
//! the caller is waiting for.

use crate::{
    error::{CleanupError, Result},
    io::net::part_path,
    logger::{self, MixLogger},
};
use serde_json::json;
use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::fs;

static SEQ: AtomicU64 = AtomicU64::new(0);

/// `<millis>_<pid>_<seq>`: increases per call within a process and differs
/// across processes.
pub fn unique_token() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let seq = SEQ.fetch_add(1, Ordering::Relaxed);
    format!("{millis}_{}_{seq}", std::process::id())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScratchPaths {
    pub token: String,
    pub vocal: PathBuf,
    pub beat: PathBuf,
    pub output: PathBuf,
}

impl ScratchPaths {
    /// Reserve paths under `dir`, creating it if needed. `output` overrides
    /// the default `mixed_<token>.mp3` destination.
    pub async fn allocate(dir: &Path, output: Option<&Path>) -> Result<Self> {
        fs::create_dir_all(dir).await?;
        let token = unique_token();
        Ok(Self {
            vocal: dir.join(format!("vocal_{token}.mp3")),
            beat: dir.join(format!("beat_{token}.mp3")),
            output: output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dir.join(format!("mixed_{token}.mp3"))),
            token,
        })
    }

    /// After a successful mix: drop the downloaded inputs, keep the output.
    pub async fn release_inputs(&self, logger: Option<&dyn MixLogger>) {
        for p in [&self.vocal, &self.beat] {
            remove_quietly(p, logger).await;
        }
    }

    /// After a failure: drop everything this mix may have written, including
    /// half-finished downloads.
    pub async fn discard_all(&self, logger: Option<&dyn MixLogger>) {
        for p in [&self.vocal, &self.beat] {
            remove_quietly(p, logger).await;
            remove_quietly(&part_path(p), logger).await;
        }
        remove_quietly(&self.output, logger).await;
    }
}

/// Remove `path` if it exists. `Ok(false)` when there was nothing to remove.
pub async fn remove_if_exists(path: &Path) -> std::result::Result<bool, CleanupError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CleanupError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub(crate) async fn remove_quietly(path: &Path, logger: Option<&dyn MixLogger>) {
    match remove_if_exists(path).await {
        Ok(true) => tracing::debug!(path = %path.display(), "removed scratch file"),
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(error = %e, "scratch cleanup failed");
            logger::error(logger, "Cleanup failed", json!({ "error": e.to_string() }));
        }
    }
}
