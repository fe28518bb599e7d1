//! # mixdown-core
//!
//! Vocal-over-beat mixing and mastering: fetches stems, builds a typed
//! filter graph (EQ, ducking, compression, limiting, loudness normalization,
//! format finishing) and renders it through an external engine.

pub mod core {
    pub mod engine;
    pub mod expr;
    pub mod graph;
    pub mod mixer;
}
pub mod io {
    pub mod net;
    pub mod scratch;
}
pub mod error;
pub mod logger;
pub mod paths;
pub mod pipeline;
pub mod presets;
pub mod types;

pub use crate::{
    core::{
        engine::{AudioEngine, EncodingSettings, EngineEvent, EngineInvocation, EngineJob, FfmpegEngine},
        expr::filter_complex,
        graph::{build as build_filter_graph, FilterGraph, FilterStage, Input, Operator, Source, Tuning},
        mixer::MixState,
    },
    error::{CleanupError, MixError, Result},
    logger::{MixLogger, TracingLogger},
    paths::MixerConfig,
    pipeline::{get_mix_preset, mix_audio_from_urls, mix_audio_professional, MixPipeline},
    presets::list_presets,
    types::{MixRequest, MixResult, MixSettings, OutputFormat, Preset, ProcessingSummary, UrlMixOptions},
};
