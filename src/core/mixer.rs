//! Drives one mix through the external engine.
//!
//! ```text
//! Idle -> GraphBuilt -> Processing -> Completed
//!   |         |             |
//!   +---------+-------------+------> Failed
//! ```
//!
//! A [`MixJob`] lives for exactly one request. Progress events are logged and
//! never move the state; the first terminal event (or the engine going away)
//! settles the job.

use crate::{
    core::{
        engine::{AudioEngine, EncodingSettings, EngineEvent, EngineInvocation, EngineJob},
        expr, graph,
        graph::FilterGraph,
    },
    error::{MixError, Result},
    io::scratch::remove_quietly,
    logger::{self, MixLogger},
    types::{MixRequest, MixResult, MixSettings, ProcessingSummary, UrlMixOptions},
};
use serde_json::json;
use std::path::Path;

pub const QUALITY_LABEL: &str = "billboard-ready";

/// Integrated-loudness range the engine's normalizer accepts.
pub const LUFS_MIN: f64 = -70.0;
pub const LUFS_MAX: f64 = -5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MixState {
    Idle,
    GraphBuilt,
    Processing,
    Completed,
    Failed,
}

impl MixState {
    pub fn is_terminal(self) -> bool {
        matches!(self, MixState::Completed | MixState::Failed)
    }

    pub fn can_move_to(self, next: MixState) -> bool {
        use MixState::*;
        matches!(
            (self, next),
            (Idle, GraphBuilt)
                | (GraphBuilt, Processing)
                | (Processing, Completed)
                | (Idle | GraphBuilt | Processing, Failed)
        )
    }
}

/// Range checks on the path-free parameters.
pub fn validate_settings(s: &MixSettings) -> Result<()> {
    for (name, v) in [("vocalVolume", s.vocal_volume), ("beatVolume", s.beat_volume)] {
        if !v.is_finite() || !(0.0..=1.0).contains(&v) {
            return Err(MixError::invalid(format!("{name} must be within 0..=1, got {v}")));
        }
    }
    if !s.lufs_target.is_finite() || !(LUFS_MIN..=LUFS_MAX).contains(&s.lufs_target) {
        return Err(MixError::invalid(format!(
            "lufsTarget must be within {LUFS_MIN}..={LUFS_MAX}, got {}",
            s.lufs_target
        )));
    }
    Ok(())
}

pub fn validate(request: &MixRequest) -> Result<()> {
    if is_blank(&request.vocal_path) || is_blank(&request.beat_path) {
        return Err(MixError::invalid("Both vocalPath and beatPath are required"));
    }
    if is_blank(&request.output_path) {
        return Err(MixError::invalid("outputPath is required"));
    }
    validate_settings(&request.settings)
}

/// Checks a URL mix's options up front, before anything is downloaded.
pub fn validate_url_options(options: &UrlMixOptions) -> Result<()> {
    if options.output_path.as_deref().is_some_and(is_blank) {
        return Err(MixError::invalid("outputPath is required"));
    }
    validate_settings(&options.settings)
}

fn is_blank(p: &Path) -> bool {
    p.as_os_str().is_empty()
}

pub struct MixJob<'a> {
    request: &'a MixRequest,
    logger: Option<&'a dyn MixLogger>,
    state: MixState,
}

impl<'a> MixJob<'a> {
    pub fn new(request: &'a MixRequest, logger: Option<&'a dyn MixLogger>) -> Self {
        Self {
            request,
            logger,
            state: MixState::Idle,
        }
    }

    pub fn state(&self) -> MixState {
        self.state
    }

    fn advance(&mut self, next: MixState) {
        debug_assert!(
            self.state.can_move_to(next),
            "illegal mix transition {:?} -> {:?}",
            self.state,
            next
        );
        tracing::debug!(from = ?self.state, to = ?next, "mix state");
        self.state = next;
    }

    /// Idle -> GraphBuilt. Validation failures end the job before any I/O.
    pub fn build_graph(&mut self) -> Result<FilterGraph> {
        if let Err(e) = validate(self.request) {
            self.advance(MixState::Failed);
            return Err(e);
        }
        let s = &self.request.settings;
        logger::info(
            self.logger,
            "Starting professional audio mixing",
            json!({
                "vocalVolume": s.vocal_volume,
                "beatVolume": s.beat_volume,
                "autoDuck": s.auto_duck,
                "compression": s.compression,
                "lufsTarget": s.lufs_target,
                "outputFormat": s.output_format,
            }),
        );

        let graph = graph::build(self.request);
        debug_assert!(graph.verify().is_ok(), "builder produced a miswired graph");

        logger::info(
            self.logger,
            "Filter chain built",
            json!({
                "filters": graph.stages.len(),
                "autoDuck": s.auto_duck,
                "compression": s.compression,
            }),
        );
        self.advance(MixState::GraphBuilt);
        Ok(graph)
    }

    /// GraphBuilt -> Processing.
    pub fn start(&mut self, engine: &dyn AudioEngine, graph: &FilterGraph) -> EngineJob {
        let invocation = EngineInvocation {
            inputs: [
                self.request.vocal_path.clone(),
                self.request.beat_path.clone(),
            ],
            filter_complex: expr::filter_complex(graph),
            output_map: expr::output_map(graph),
            encoding: EncodingSettings::default(),
            output: self.request.output_path.clone(),
        };
        self.advance(MixState::Processing);
        engine.spawn(invocation)
    }

    /// Feed one engine event (`None` = engine gone). Returns the outcome once
    /// the job settles.
    pub async fn on_event(&mut self, event: Option<EngineEvent>) -> Option<Result<MixResult>> {
        if self.state != MixState::Processing {
            return None;
        }
        match event {
            Some(EngineEvent::Started { command_line }) => {
                let shown: String = command_line.chars().take(200).collect();
                logger::info(
                    self.logger,
                    "Mix engine started",
                    json!({ "command": format!("{shown}...") }),
                );
                None
            }
            Some(EngineEvent::Progress { position }) => {
                logger::debug(self.logger, "Mixing progress", json!({ "time": position }));
                None
            }
            Some(EngineEvent::Finished) => Some(Ok(self.complete())),
            Some(EngineEvent::Failed { message }) => Some(Err(self.fail(message).await)),
            None => Some(Err(self
                .fail("engine stopped without reporting completion".into())
                .await)),
        }
    }

    fn complete(&mut self) -> MixResult {
        let s = &self.request.settings;
        logger::info(
            self.logger,
            "Professional mix complete",
            json!({
                "output": self.request.output_path.display().to_string(),
                "format": s.output_format,
                "lufs": s.lufs_target,
            }),
        );
        self.advance(MixState::Completed);
        MixResult {
            success: true,
            output_path: self.request.output_path.clone(),
            format: s.output_format,
            quality: QUALITY_LABEL.to_string(),
            processing: ProcessingSummary::from(s),
        }
    }

    async fn fail(&mut self, message: String) -> MixError {
        logger::error(self.logger, "Mixing error", json!({ "error": message }));
        remove_quietly(&self.request.output_path, self.logger).await;
        self.advance(MixState::Failed);
        MixError::Processing { message }
    }
}

/// Run one request to completion on `engine`.
pub async fn run(
    engine: &dyn AudioEngine,
    request: &MixRequest,
    logger: Option<&dyn MixLogger>,
) -> Result<MixResult> {
    let mut job = MixJob::new(request, logger);
    let graph = job.build_graph()?;
    let mut events = job.start(engine, &graph);
    loop {
        let event = events.next_event().await;
        if let Some(outcome) = job.on_event(event).await {
            return outcome;
        }
    }
}
