//! Render a [`FilterGraph`] as an ffmpeg `-filter_complex` expression.

use crate::core::graph::{FilterGraph, Input, Operator, Source};
use std::collections::HashMap;

/// Serialize the graph, one `;`-separated segment per stage.
///
/// ffmpeg links every labeled pad exactly once, so a pin with several
/// consumers is fanned out through `asplit` right after it is produced and
/// each consumer gets its own branch, in emission order.
pub fn filter_complex(graph: &FilterGraph) -> String {
    let mut consumers: HashMap<&Input, usize> = HashMap::new();
    for stage in &graph.stages {
        for input in &stage.inputs {
            *consumers.entry(input).or_default() += 1;
        }
    }

    let mut segments = Vec::with_capacity(graph.stages.len() + 2);
    let mut next_branch: HashMap<&Input, usize> = HashMap::new();

    for src in [Source::Vocal, Source::Beat] {
        let key = Input::Source(src);
        if let Some(&n) = consumers.get(&key) {
            if n > 1 {
                segments.push(split_segment(&source_label(src), &base_name(&key), n));
            }
        }
    }

    for stage in &graph.stages {
        let mut seg = String::new();
        for input in &stage.inputs {
            let n = consumers.get(input).copied().unwrap_or(0);
            if n > 1 {
                let k = next_branch.entry(input).or_default();
                seg.push_str(&format!("[{}_split{}]", base_name(input), k));
                *k += 1;
            } else {
                seg.push_str(&label(input));
            }
        }
        seg.push_str(&operator_expr(&stage.operator));
        seg.push_str(&format!("[{}]", stage.output_pin));
        segments.push(seg);

        let produced = Input::Pin(stage.output_pin.clone());
        if let Some(&n) = consumers.get(&produced) {
            if n > 1 {
                segments.push(split_segment(
                    &format!("[{}]", stage.output_pin),
                    &stage.output_pin,
                    n,
                ));
            }
        }
    }

    segments.join(";")
}

/// The `-map` argument selecting the graph's final pin.
pub fn output_map(graph: &FilterGraph) -> String {
    format!("[{}]", graph.final_output_pin)
}

fn split_segment(from: &str, base: &str, n: usize) -> String {
    let mut seg = format!("{from}asplit={n}");
    for k in 0..n {
        seg.push_str(&format!("[{base}_split{k}]"));
    }
    seg
}

fn source_label(src: Source) -> String {
    format!("[{}:a]", src.index())
}

fn base_name(input: &Input) -> String {
    match input {
        Input::Source(src) => format!("src{}", src.index()),
        Input::Pin(p) => p.clone(),
    }
}

fn label(input: &Input) -> String {
    match input {
        Input::Source(src) => source_label(*src),
        Input::Pin(p) => format!("[{p}]"),
    }
}

fn operator_expr(op: &Operator) -> String {
    match op {
        Operator::Gain { volume } => format!("volume={volume}"),
        Operator::Equalizer(b) => format!(
            "equalizer=f={}:width_type=o:width={}:g={}",
            b.frequency_hz, b.width_octaves, b.gain_db
        ),
        Operator::SidechainCompressor(d) => format!(
            "sidechaincompress=threshold={}:ratio={}:attack={}:release={}:makeup={}",
            d.threshold, d.ratio, d.attack_ms, d.release_ms, d.makeup
        ),
        Operator::Mixer { weights } => format!(
            "amix=inputs=2:duration=longest:weights={} {}",
            weights[0], weights[1]
        ),
        Operator::Compressor(c) => format!(
            "acompressor=threshold={}dB:ratio={}:attack={}:release={}:makeup={}dB",
            c.threshold_db, c.ratio, c.attack_ms, c.release_ms, c.makeup_db
        ),
        Operator::Limiter(l) => format!(
            "alimiter=limit={}:attack={}:release={}",
            l.ceiling, l.attack_ms, l.release_ms
        ),
        Operator::LoudnessNormalizer {
            integrated_lufs,
            true_peak_dbtp,
            loudness_range_lu,
        } => format!("loudnorm=I={integrated_lufs}:TP={true_peak_dbtp}:LRA={loudness_range_lu}"),
        Operator::HighPass { frequency_hz } => format!("highpass=f={frequency_hz}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::{build_settings, Tuning};
    use crate::types::{MixSettings, OutputFormat};

    fn render(s: MixSettings) -> String {
        filter_complex(&build_settings(&s, &Tuning::default()))
    }

    #[test]
    fn plain_mix_without_processing() {
        let expr = render(MixSettings {
            vocal_volume: 0.85,
            beat_volume: 0.6,
            auto_duck: false,
            compression: false,
            lufs_target: -14.0,
            output_format: OutputFormat::Music,
        });
        assert_eq!(
            expr,
            "[0:a]volume=0.85[vocal_gain];\
             [vocal_gain]equalizer=f=3000:width_type=o:width=2:g=2[vocal_presence];\
             [vocal_presence]equalizer=f=200:width_type=o:width=1:g=-1[vocal_demud];\
             [vocal_demud]equalizer=f=8000:width_type=o:width=2:g=-2[vocal];\
             [1:a]volume=0.6[beat_gain];\
             [beat_gain]equalizer=f=60:width_type=o:width=1:g=3[beat_sub];\
             [beat_sub]equalizer=f=10000:width_type=o:width=2:g=1[beat];\
             [vocal][beat]amix=inputs=2:duration=longest:weights=1 1[mixed];\
             [mixed]loudnorm=I=-14:TP=-1.5:LRA=11[normalized]"
        );
    }

    #[test]
    fn ducking_splits_the_vocal_once() {
        let expr = render(MixSettings::default());
        assert!(expr.contains("[vocal]asplit=2[vocal_split0][vocal_split1]"));
        assert!(expr.contains(
            "[beat][vocal_split0]sidechaincompress=threshold=0.15:ratio=2.5:attack=15:release=350:makeup=1.5[beat_ducked]"
        ));
        assert!(expr.contains(
            "[vocal_split1][beat_ducked]amix=inputs=2:duration=longest:weights=1 0.95[mixed]"
        ));
        // no bare [vocal] consumer left once it's been split
        assert_eq!(expr.matches("[vocal]").count(), 2);
    }

    #[test]
    fn mastering_and_format_stages_render() {
        let expr = render(MixSettings {
            output_format: OutputFormat::Podcast,
            ..MixSettings::default()
        });
        assert!(expr.contains(
            "[mixed]acompressor=threshold=-16dB:ratio=2.5:attack=10:release=100:makeup=4dB[compressed]"
        ));
        assert!(expr.contains("[compressed]alimiter=limit=0.92:attack=3:release=80[limited]"));
        assert!(expr.contains("[limited]loudnorm=I=-14:TP=-1.5:LRA=11[normalized]"));
        assert!(expr.ends_with(
            "[normalized]equalizer=f=150:width_type=o:width=1:g=2[podcast_warmth];\
             [podcast_warmth]highpass=f=80[podcast]"
        ));

        let tv = render(MixSettings {
            output_format: OutputFormat::Tv,
            ..MixSettings::default()
        });
        assert!(tv.ends_with("[normalized]alimiter=limit=0.9:attack=5:release=50[tv]"));
    }

    #[test]
    fn map_points_at_final_pin() {
        let g = build_settings(
            &MixSettings {
                output_format: OutputFormat::Social,
                ..MixSettings::default()
            },
            &Tuning::default(),
        );
        assert_eq!(output_map(&g), "[social]");
    }
}
