//! Typed filter graph for the vocal-over-beat mastering chain.
//!
//! [`build`] turns a [`MixRequest`] into an ordered list of [`FilterStage`]s.
//! Every stage reads pins produced by earlier stages (or one of the two raw
//! sources) and binds exactly one new pin. Rendering the graph into the
//! engine's text syntax lives in [`crate::core::expr`].

use crate::types::{MixRequest, MixSettings, OutputFormat};
use std::collections::HashSet;
use thiserror::Error;

// Vocal chain
pub const VOCAL_PRESENCE: EqBand = EqBand::new(3000.0, 2.0, 2.0);
pub const VOCAL_DEMUD: EqBand = EqBand::new(200.0, 1.0, -1.0);
pub const VOCAL_DEESS: EqBand = EqBand::new(8000.0, 2.0, -2.0);

// Beat chain
pub const BEAT_SUB: EqBand = EqBand::new(60.0, 1.0, 3.0);
pub const BEAT_SHINE: EqBand = EqBand::new(10000.0, 2.0, 1.0);

pub const DUCK: DuckParams = DuckParams {
    threshold: 0.15,
    ratio: 2.5,
    attack_ms: 15.0,
    release_ms: 350.0,
    makeup: 1.5,
};

pub const MIX_WEIGHTS_DUCKED: [f64; 2] = [1.0, 0.95];
pub const MIX_WEIGHTS_EQUAL: [f64; 2] = [1.0, 1.0];

pub const MASTER_COMPRESSOR: CompressorParams = CompressorParams {
    threshold_db: -16.0,
    ratio: 2.5,
    attack_ms: 10.0,
    release_ms: 100.0,
    makeup_db: 4.0,
};

pub const MASTER_LIMITER: LimiterParams = LimiterParams {
    ceiling: 0.92,
    attack_ms: 3.0,
    release_ms: 80.0,
};

pub const TRUE_PEAK_DBTP: f64 = -1.5;
pub const LOUDNESS_RANGE_LU: f64 = 11.0;

// Format post-stages
pub const SOCIAL_BASS: EqBand = EqBand::new(100.0, 1.0, 4.0);
pub const SOCIAL_PRESENCE: EqBand = EqBand::new(4000.0, 2.0, 2.0);
pub const PODCAST_WARMTH: EqBand = EqBand::new(150.0, 1.0, 2.0);
pub const PODCAST_HIGHPASS_HZ: f64 = 80.0;
pub const TV_LIMITER: LimiterParams = LimiterParams {
    ceiling: 0.90,
    attack_ms: 5.0,
    release_ms: 50.0,
};

/// Peaking EQ band. Width is in octaves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EqBand {
    pub frequency_hz: f64,
    pub width_octaves: f64,
    pub gain_db: f64,
}

impl EqBand {
    pub const fn new(frequency_hz: f64, width_octaves: f64, gain_db: f64) -> Self {
        Self {
            frequency_hz,
            width_octaves,
            gain_db,
        }
    }
}

/// Sidechain compressor settings. Threshold and makeup are linear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DuckParams {
    pub threshold: f64,
    pub ratio: f64,
    pub attack_ms: f64,
    pub release_ms: f64,
    pub makeup: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressorParams {
    pub threshold_db: f64,
    pub ratio: f64,
    pub attack_ms: f64,
    pub release_ms: f64,
    pub makeup_db: f64,
}

/// Brickwall limiter. Ceiling is linear.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LimiterParams {
    pub ceiling: f64,
    pub attack_ms: f64,
    pub release_ms: f64,
}

/// The aesthetic constants of the chain, overridable as a unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Tuning {
    pub vocal_eq: [EqBand; 3],
    pub beat_eq: [EqBand; 2],
    pub duck: DuckParams,
    pub mix_weights_ducked: [f64; 2],
    pub mix_weights_equal: [f64; 2],
    pub compressor: CompressorParams,
    pub limiter: LimiterParams,
    pub true_peak_dbtp: f64,
    pub loudness_range_lu: f64,
    pub social_eq: [EqBand; 2],
    pub podcast_eq: EqBand,
    pub podcast_highpass_hz: f64,
    pub tv_limiter: LimiterParams,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            vocal_eq: [VOCAL_PRESENCE, VOCAL_DEMUD, VOCAL_DEESS],
            beat_eq: [BEAT_SUB, BEAT_SHINE],
            duck: DUCK,
            mix_weights_ducked: MIX_WEIGHTS_DUCKED,
            mix_weights_equal: MIX_WEIGHTS_EQUAL,
            compressor: MASTER_COMPRESSOR,
            limiter: MASTER_LIMITER,
            true_peak_dbtp: TRUE_PEAK_DBTP,
            loudness_range_lu: LOUDNESS_RANGE_LU,
            social_eq: [SOCIAL_BASS, SOCIAL_PRESENCE],
            podcast_eq: PODCAST_WARMTH,
            podcast_highpass_hz: PODCAST_HIGHPASS_HZ,
            tv_limiter: TV_LIMITER,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operator {
    Gain { volume: f64 },
    Equalizer(EqBand),
    SidechainCompressor(DuckParams),
    /// Sums both inputs, running until the longer one ends.
    Mixer { weights: [f64; 2] },
    Compressor(CompressorParams),
    Limiter(LimiterParams),
    LoudnessNormalizer {
        integrated_lufs: f64,
        true_peak_dbtp: f64,
        loudness_range_lu: f64,
    },
    HighPass { frequency_hz: f64 },
}

impl Operator {
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Gain { .. } => "gain",
            Operator::Equalizer(_) => "equalizer",
            Operator::SidechainCompressor(_) => "sidechain_compressor",
            Operator::Mixer { .. } => "mixer",
            Operator::Compressor(_) => "compressor",
            Operator::Limiter(_) => "limiter",
            Operator::LoudnessNormalizer { .. } => "loudness_normalizer",
            Operator::HighPass { .. } => "high_pass",
        }
    }
}

/// One of the two raw engine inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    Vocal,
    Beat,
}

impl Source {
    /// Input index as passed to the engine.
    pub fn index(self) -> usize {
        match self {
            Source::Vocal => 0,
            Source::Beat => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Input {
    Source(Source),
    Pin(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterStage {
    pub inputs: Vec<Input>,
    pub operator: Operator,
    pub output_pin: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterGraph {
    pub stages: Vec<FilterStage>,
    pub final_output_pin: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph has no stages")]
    Empty,
    #[error("pin `{0}` is bound more than once")]
    DuplicatePin(String),
    #[error("stage `{stage}` reads `{pin}` before it is produced")]
    ForwardReference { stage: String, pin: String },
    #[error("final pin `{0}` is not the last stage's output")]
    FinalPinMismatch(String),
}

impl FilterGraph {
    /// Operator names in emission order.
    pub fn operator_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.operator.name()).collect()
    }

    pub fn stage(&self, pin: &str) -> Option<&FilterStage> {
        self.stages.iter().find(|s| s.output_pin == pin)
    }

    /// Checks the wiring invariants: unique pins, no forward references, and
    /// the final pin is bound by the last stage.
    pub fn verify(&self) -> Result<(), GraphError> {
        let last = self.stages.last().ok_or(GraphError::Empty)?;
        let mut bound: HashSet<&str> = HashSet::new();
        for stage in &self.stages {
            for input in &stage.inputs {
                if let Input::Pin(pin) = input {
                    if !bound.contains(pin.as_str()) {
                        return Err(GraphError::ForwardReference {
                            stage: stage.output_pin.clone(),
                            pin: pin.clone(),
                        });
                    }
                }
            }
            if !bound.insert(stage.output_pin.as_str()) {
                return Err(GraphError::DuplicatePin(stage.output_pin.clone()));
            }
        }
        if last.output_pin != self.final_output_pin {
            return Err(GraphError::FinalPinMismatch(self.final_output_pin.clone()));
        }
        Ok(())
    }
}

/// Appends stages and hands back the pin each one binds.
#[derive(Default)]
struct Chain {
    stages: Vec<FilterStage>,
}

impl Chain {
    fn push(&mut self, inputs: Vec<Input>, operator: Operator, pin: &str) -> Input {
        self.stages.push(FilterStage {
            inputs,
            operator,
            output_pin: pin.to_string(),
        });
        Input::Pin(pin.to_string())
    }

    fn then(&mut self, input: Input, operator: Operator, pin: &str) -> Input {
        self.push(vec![input], operator, pin)
    }

    fn finish(self) -> FilterGraph {
        let final_output_pin = self
            .stages
            .last()
            .map(|s| s.output_pin.clone())
            .unwrap_or_default();
        FilterGraph {
            stages: self.stages,
            final_output_pin,
        }
    }
}

pub fn build(request: &MixRequest) -> FilterGraph {
    build_with(request, &Tuning::default())
}

/// Build the graph with explicit tuning constants. Pure and deterministic.
pub fn build_with(request: &MixRequest, tuning: &Tuning) -> FilterGraph {
    build_settings(&request.settings, tuning)
}

pub(crate) fn build_settings(s: &MixSettings, t: &Tuning) -> FilterGraph {
    let mut c = Chain::default();

    let [presence, demud, deess] = t.vocal_eq;
    let v = c.then(
        Input::Source(Source::Vocal),
        Operator::Gain {
            volume: s.vocal_volume,
        },
        "vocal_gain",
    );
    let v = c.then(v, Operator::Equalizer(presence), "vocal_presence");
    let v = c.then(v, Operator::Equalizer(demud), "vocal_demud");
    let vocal = c.then(v, Operator::Equalizer(deess), "vocal");

    let [sub, shine] = t.beat_eq;
    let b = c.then(
        Input::Source(Source::Beat),
        Operator::Gain {
            volume: s.beat_volume,
        },
        "beat_gain",
    );
    let b = c.then(b, Operator::Equalizer(sub), "beat_sub");
    let beat = c.then(b, Operator::Equalizer(shine), "beat");

    let (beat, weights) = if s.auto_duck {
        let ducked = c.push(
            vec![beat, vocal.clone()],
            Operator::SidechainCompressor(t.duck),
            "beat_ducked",
        );
        (ducked, t.mix_weights_ducked)
    } else {
        (beat, t.mix_weights_equal)
    };

    let mut out = c.push(
        vec![vocal, beat],
        Operator::Mixer { weights },
        "mixed",
    );

    if s.compression {
        out = c.then(out, Operator::Compressor(t.compressor), "compressed");
        out = c.then(out, Operator::Limiter(t.limiter), "limited");
    }

    let normalized = c.then(
        out,
        Operator::LoudnessNormalizer {
            integrated_lufs: s.lufs_target,
            true_peak_dbtp: t.true_peak_dbtp,
            loudness_range_lu: t.loudness_range_lu,
        },
        "normalized",
    );

    match s.output_format {
        OutputFormat::Music => {}
        OutputFormat::Social => {
            let [bass, presence] = t.social_eq;
            let o = c.then(normalized, Operator::Equalizer(bass), "social_bass");
            c.then(o, Operator::Equalizer(presence), "social");
        }
        OutputFormat::Podcast => {
            let o = c.then(normalized, Operator::Equalizer(t.podcast_eq), "podcast_warmth");
            c.then(
                o,
                Operator::HighPass {
                    frequency_hz: t.podcast_highpass_hz,
                },
                "podcast",
            );
        }
        OutputFormat::Tv => {
            c.then(normalized, Operator::Limiter(t.tv_limiter), "tv");
        }
    }

    c.finish()
}
