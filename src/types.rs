use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf};

/// Delivery target. Selects the tone-shaping stage appended after loudness normalization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Social,
    Podcast,
    Tv,
    #[default]
    #[serde(other)]
    Music,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [
        OutputFormat::Music,
        OutputFormat::Social,
        OutputFormat::Podcast,
        OutputFormat::Tv,
    ];

    /// Unknown names fall back to `Music` (pass-through) instead of failing.
    pub fn parse_lossy(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "social" => OutputFormat::Social,
            "podcast" => OutputFormat::Podcast,
            "tv" => OutputFormat::Tv,
            _ => OutputFormat::Music,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Music => "music",
            OutputFormat::Social => "social",
            OutputFormat::Podcast => "podcast",
            OutputFormat::Tv => "tv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path-free mix parameters. This is also the payload of a preset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MixSettings {
    /// Linear gain applied to the vocal stem, `0.0..=1.0`.
    pub vocal_volume: f64,
    /// Linear gain applied to the beat stem, `0.0..=1.0`.
    pub beat_volume: f64,
    /// Duck the beat under the vocal with a sidechain compressor.
    pub auto_duck: bool,
    /// Run the mastering compressor and limiter.
    pub compression: bool,
    /// Integrated loudness target in LUFS.
    pub lufs_target: f64,
    pub output_format: OutputFormat,
}

impl Default for MixSettings {
    fn default() -> Self {
        Self {
            vocal_volume: 0.85,
            beat_volume: 0.60,
            auto_duck: true,
            compression: true,
            lufs_target: -14.0,
            output_format: OutputFormat::Music,
        }
    }
}

/// One mix invocation over two local files.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixRequest {
    pub vocal_path: PathBuf,
    pub beat_path: PathBuf,
    pub output_path: PathBuf,
    #[serde(flatten)]
    pub settings: MixSettings,
}

impl MixRequest {
    pub fn new(
        vocal_path: impl Into<PathBuf>,
        beat_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vocal_path: vocal_path.into(),
            beat_path: beat_path.into(),
            output_path: output_path.into(),
            settings: MixSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: MixSettings) -> Self {
        self.settings = settings;
        self
    }
}

/// Options for mixing remote tracks: the mix parameters plus an optional
/// destination. Without one, the output is written into the temp dir.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlMixOptions {
    #[serde(flatten)]
    pub settings: MixSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl From<MixSettings> for UrlMixOptions {
    fn from(settings: MixSettings) -> Self {
        Self {
            settings,
            output_path: None,
        }
    }
}

/// Effective parameters echoed back in a [`MixResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingSummary {
    pub vocal_volume: f64,
    pub beat_volume: f64,
    pub auto_duck: bool,
    pub compression: bool,
    pub lufs_target: f64,
}

impl From<&MixSettings> for ProcessingSummary {
    fn from(s: &MixSettings) -> Self {
        Self {
            vocal_volume: s.vocal_volume,
            beat_volume: s.beat_volume,
            auto_duck: s.auto_duck,
            compression: s.compression,
            lufs_target: s.lufs_target,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixResult {
    pub success: bool,
    pub output_path: PathBuf,
    pub format: OutputFormat,
    pub quality: String,
    pub processing: ProcessingSummary,
}

/// A named, path-free bundle of mix settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    #[serde(flatten)]
    pub settings: MixSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_format_names_fall_back_to_music() {
        assert_eq!(OutputFormat::parse_lossy("vinyl"), OutputFormat::Music);
        assert_eq!(OutputFormat::parse_lossy(" Podcast "), OutputFormat::Podcast);

        let f: OutputFormat = serde_json::from_str("\"cassette\"").unwrap();
        assert_eq!(f, OutputFormat::Music);
        let f: OutputFormat = serde_json::from_str("\"tv\"").unwrap();
        assert_eq!(f, OutputFormat::Tv);
    }

    #[test]
    fn unknown_format_in_settings_json_becomes_music() {
        let s: MixSettings =
            serde_json::from_str(r#"{"outputFormat":"radio","lufsTarget":-16}"#).unwrap();
        assert_eq!(s.output_format, OutputFormat::Music);
        assert_eq!(s.lufs_target, -16.0);

        let out = serde_json::to_value(OutputFormat::Music).unwrap();
        assert_eq!(out, serde_json::json!("music"));
    }

    #[test]
    fn request_json_fills_defaults() {
        let req: MixRequest = serde_json::from_str(
            r#"{"vocalPath":"v.wav","beatPath":"b.wav","outputPath":"o.mp3","autoDuck":false}"#,
        )
        .unwrap();
        assert!(!req.settings.auto_duck);
        assert_eq!(req.settings.vocal_volume, 0.85);
        assert_eq!(req.settings.beat_volume, 0.60);
        assert_eq!(req.settings.lufs_target, -14.0);
        assert_eq!(req.settings.output_format, OutputFormat::Music);
    }
}
