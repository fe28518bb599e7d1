use directories::ProjectDirs;
use std::{
    env,
    path::{Path, PathBuf},
};

pub const TMP_DIR_ENV: &str = "MIXDOWN_TMP_DIR";
pub const FFMPEG_ENV: &str = "MIXDOWN_FFMPEG";

/// Where scratch files go and which engine binary to run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MixerConfig {
    pub temp_dir: PathBuf,
    pub ffmpeg_path: PathBuf,
}

impl MixerConfig {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
        }
    }

    pub fn with_ffmpeg(mut self, path: impl AsRef<Path>) -> Self {
        self.ffmpeg_path = path.as_ref().to_path_buf();
        self
    }

    pub fn from_env() -> Self {
        let temp_dir = env::var_os(TMP_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_temp_dir);
        let ffmpeg_path = env::var_os(FFMPEG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));
        Self {
            temp_dir,
            ffmpeg_path,
        }
    }
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self::new(default_temp_dir())
    }
}

pub fn default_temp_dir() -> PathBuf {
    match ProjectDirs::from("dev", "Mixdown", "mixdown-core") {
        Some(proj) => proj.cache_dir().join("tmp"),
        None => env::temp_dir().join("mixdown"),
    }
}
