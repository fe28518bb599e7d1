use crate::{
    core::{
        engine::{AudioEngine, FfmpegEngine},
        mixer,
    },
    error::Result,
    io::{
        net::{check_scheme, fetch, http_client},
        scratch::ScratchPaths,
    },
    logger::{self, MixLogger},
    paths::MixerConfig,
    presets,
    types::{MixRequest, MixResult, Preset, UrlMixOptions},
};
use reqwest::Client;
use serde_json::json;

/// Owns what a mix needs across calls: config, engine and HTTP client.
/// Holds no per-request state, so one instance can serve concurrent mixes.
pub struct MixPipeline<E = FfmpegEngine> {
    config: MixerConfig,
    engine: E,
    client: Client,
}

impl MixPipeline<FfmpegEngine> {
    pub fn new(config: MixerConfig) -> Self {
        let engine = FfmpegEngine::new(&config.ffmpeg_path);
        Self::with_engine(config, engine)
    }

    pub fn from_env() -> Self {
        Self::new(MixerConfig::from_env())
    }
}

impl<E: AudioEngine> MixPipeline<E> {
    pub fn with_engine(config: MixerConfig, engine: E) -> Self {
        Self {
            config,
            engine,
            client: http_client(),
        }
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Mix two local files into `request.output_path`.
    pub async fn mix(
        &self,
        request: &MixRequest,
        logger: Option<&dyn MixLogger>,
    ) -> Result<MixResult> {
        mixer::run(&self.engine, request, logger).await
    }

    /// Download both stems into the temp dir, mix them, and clean up.
    ///
    /// On success only the output survives. On failure every path this call
    /// may have written is removed and the error that stopped the mix is
    /// returned unchanged.
    pub async fn mix_from_urls(
        &self,
        vocal_url: &str,
        beat_url: &str,
        options: &UrlMixOptions,
        logger: Option<&dyn MixLogger>,
    ) -> Result<MixResult> {
        check_scheme(vocal_url)?;
        check_scheme(beat_url)?;
        mixer::validate_url_options(options)?;

        let paths =
            ScratchPaths::allocate(&self.config.temp_dir, options.output_path.as_deref()).await?;

        match self.fetch_and_mix(vocal_url, beat_url, options, &paths, logger).await {
            Ok(result) => {
                paths.release_inputs(logger).await;
                Ok(result)
            }
            Err(e) => {
                paths.discard_all(logger).await;
                Err(e)
            }
        }
    }

    async fn fetch_and_mix(
        &self,
        vocal_url: &str,
        beat_url: &str,
        options: &UrlMixOptions,
        paths: &ScratchPaths,
        logger: Option<&dyn MixLogger>,
    ) -> Result<MixResult> {
        logger::info(
            logger,
            "Downloading audio files for mixing",
            json!({
                "vocalUrl": truncate(vocal_url, 50),
                "beatUrl": truncate(beat_url, 50),
            }),
        );

        // Both downloads run to completion before either result is inspected,
        // so nothing is still writing when cleanup runs.
        let (vocal, beat) = tokio::join!(
            fetch(&self.client, vocal_url, &paths.vocal),
            fetch(&self.client, beat_url, &paths.beat),
        );
        vocal?;
        beat?;

        logger::info(logger, "Audio files downloaded, starting mix", json!({}));

        let request = MixRequest {
            vocal_path: paths.vocal.clone(),
            beat_path: paths.beat.clone(),
            output_path: paths.output.clone(),
            settings: options.settings.clone(),
        };
        self.mix(&request, logger).await
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Mix two local files with the engine and temp dir from the environment.
pub async fn mix_audio_professional(
    request: &MixRequest,
    logger: Option<&dyn MixLogger>,
) -> Result<MixResult> {
    MixPipeline::from_env().mix(request, logger).await
}

/// Mix two remote files with the engine and temp dir from the environment.
pub async fn mix_audio_from_urls(
    vocal_url: &str,
    beat_url: &str,
    options: &UrlMixOptions,
    logger: Option<&dyn MixLogger>,
) -> Result<MixResult> {
    MixPipeline::from_env()
        .mix_from_urls(vocal_url, beat_url, options, logger)
        .await
}

/// Never fails; unknown names get the default preset.
pub fn get_mix_preset(name: &str) -> Preset {
    presets::get_preset(name)
}
