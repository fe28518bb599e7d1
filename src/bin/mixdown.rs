use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mixdown_core::{
    build_filter_graph, filter_complex, get_mix_preset, list_presets, MixPipeline, MixRequest,
    MixSettings, MixerConfig, OutputFormat, TracingLogger, UrlMixOptions,
};
use std::{path::PathBuf, process};

#[derive(Parser)]
#[command(name = "mixdown")]
#[command(about = "Mix and master a vocal over a beat", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mix two local files
    Mix {
        #[arg(long)]
        vocal: PathBuf,

        #[arg(long)]
        beat: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        tweaks: Tweaks,
    },

    /// Download two files and mix them
    MixUrls {
        #[arg(long)]
        vocal_url: String,

        #[arg(long)]
        beat_url: String,

        /// Defaults to a file in the temp dir
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        tweaks: Tweaks,
    },

    /// Print the filter expression without running the engine
    Graph {
        #[command(flatten)]
        tweaks: Tweaks,
    },

    /// List available presets
    Presets,
}

#[derive(Args)]
struct Tweaks {
    /// Start from a named preset (unknown names use the default)
    #[arg(short, long)]
    preset: Option<String>,

    #[arg(long)]
    vocal_volume: Option<f64>,

    #[arg(long)]
    beat_volume: Option<f64>,

    #[arg(long)]
    no_duck: bool,

    #[arg(long)]
    no_compression: bool,

    #[arg(long, allow_hyphen_values = true)]
    lufs: Option<f64>,

    /// music, social, podcast or tv
    #[arg(short, long)]
    format: Option<String>,
}

impl Tweaks {
    fn settings(&self) -> MixSettings {
        let mut s = match &self.preset {
            Some(name) => get_mix_preset(name).settings,
            None => MixSettings::default(),
        };
        if let Some(v) = self.vocal_volume {
            s.vocal_volume = v;
        }
        if let Some(v) = self.beat_volume {
            s.beat_volume = v;
        }
        if self.no_duck {
            s.auto_duck = false;
        }
        if self.no_compression {
            s.compression = false;
        }
        if let Some(l) = self.lufs {
            s.lufs_target = l;
        }
        if let Some(f) = &self.format {
            s.output_format = OutputFormat::parse_lossy(f);
        }
        s
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Mix {
            vocal,
            beat,
            output,
            tweaks,
        } => handle_mix(vocal, beat, output, tweaks).await,
        Commands::MixUrls {
            vocal_url,
            beat_url,
            output,
            tweaks,
        } => handle_mix_urls(vocal_url, beat_url, output, tweaks).await,
        Commands::Graph { tweaks } => handle_graph(tweaks),
        Commands::Presets => handle_presets(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn handle_mix(
    vocal: PathBuf,
    beat: PathBuf,
    output: PathBuf,
    tweaks: Tweaks,
) -> anyhow::Result<()> {
    let request = MixRequest::new(vocal, beat, output).with_settings(tweaks.settings());
    let pipeline = MixPipeline::new(MixerConfig::from_env());
    let result = pipeline.mix(&request, Some(&TracingLogger)).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn handle_mix_urls(
    vocal_url: String,
    beat_url: String,
    output: Option<PathBuf>,
    tweaks: Tweaks,
) -> anyhow::Result<()> {
    let options = UrlMixOptions {
        settings: tweaks.settings(),
        output_path: output,
    };
    let pipeline = MixPipeline::new(MixerConfig::from_env());
    let result = pipeline
        .mix_from_urls(&vocal_url, &beat_url, &options, Some(&TracingLogger))
        .await
        .with_context(|| format!("mixing {vocal_url} over {beat_url}"))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn handle_graph(tweaks: Tweaks) -> anyhow::Result<()> {
    let request = MixRequest::new("vocal", "beat", "out.mp3").with_settings(tweaks.settings());
    let graph = build_filter_graph(&request);
    for (i, stage) in graph.stages.iter().enumerate() {
        eprintln!("{:>2}. {:<20} -> [{}]", i + 1, stage.operator.name(), stage.output_pin);
    }
    println!("{}", filter_complex(&graph));
    Ok(())
}

fn handle_presets() -> anyhow::Result<()> {
    eprintln!("Available presets");
    eprintln!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for (name, is_default) in list_presets() {
        let s = get_mix_preset(&name).settings;
        let marker = if is_default { " (default)" } else { "" };
        eprintln!(
            "  • {name}{marker}: vocal {} / beat {}, {} LUFS, {}",
            s.vocal_volume, s.beat_volume, s.lufs_target, s.output_format
        );
    }
    eprintln!();
    eprintln!("Use --preset <name> to start from one");
    Ok(())
}
