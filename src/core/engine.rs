use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
    sync::mpsc,
};

const EVENT_BUFFER: usize = 64;
const STDERR_TAIL_LINES: usize = 8;

/// Delivery encoding passed to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodingSettings {
    pub codec: String,
    pub container: String,
    pub bitrate_kbps: u32,
    pub channels: u16,
    pub sample_rate: u32,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            codec: "libmp3lame".into(),
            container: "mp3".into(),
            bitrate_kbps: 320,
            channels: 2,
            sample_rate: 44_100,
        }
    }
}

/// Everything the engine needs to render one mix.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineInvocation {
    /// Source 0 (vocal) and source 1 (beat).
    pub inputs: [PathBuf; 2],
    pub filter_complex: String,
    /// Label of the graph pin that feeds the output, e.g. `[normalized]`.
    pub output_map: String,
    pub encoding: EncodingSettings,
    pub output: PathBuf,
}

impl EngineInvocation {
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-nostats", "-y", "-progress", "pipe:1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        for input in &self.inputs {
            args.push("-i".into());
            args.push(input.to_string_lossy().into_owned());
        }
        let e = &self.encoding;
        args.extend([
            "-filter_complex".into(),
            self.filter_complex.clone(),
            "-map".into(),
            self.output_map.clone(),
            "-c:a".into(),
            e.codec.clone(),
            "-b:a".into(),
            format!("{}k", e.bitrate_kbps),
            "-ac".into(),
            e.channels.to_string(),
            "-ar".into(),
            e.sample_rate.to_string(),
            "-f".into(),
            e.container.clone(),
            self.output.to_string_lossy().into_owned(),
        ]);
        args
    }
}

/// Lifecycle signals emitted while the engine runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    Started { command_line: String },
    /// Observational only. `position` is the engine's own timestamp string.
    Progress { position: String },
    Finished,
    Failed { message: String },
}

/// Receiving end of one engine run.
pub struct EngineJob {
    events: mpsc::Receiver<EngineEvent>,
}

impl EngineJob {
    /// A fresh job plus the sender an engine reports through.
    pub fn channel() -> (mpsc::Sender<EngineEvent>, EngineJob) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        (tx, EngineJob { events: rx })
    }

    /// `None` once the engine has dropped its sender.
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        self.events.recv().await
    }
}

/// External processing engine. `spawn` must return immediately; the work
/// happens in the background and is reported through the job's events.
pub trait AudioEngine: Send + Sync {
    fn spawn(&self, invocation: EngineInvocation) -> EngineJob;
}

/// Runs the `ffmpeg` binary as a child process. Requires a tokio runtime.
#[derive(Clone, Debug)]
pub struct FfmpegEngine {
    binary: PathBuf,
}

impl FfmpegEngine {
    pub fn new(binary: impl AsRef<Path>) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl AudioEngine for FfmpegEngine {
    fn spawn(&self, invocation: EngineInvocation) -> EngineJob {
        let (tx, job) = EngineJob::channel();
        let binary = self.binary.clone();
        tokio::spawn(run_ffmpeg(binary, invocation, tx));
        job
    }
}

async fn run_ffmpeg(binary: PathBuf, invocation: EngineInvocation, tx: mpsc::Sender<EngineEvent>) {
    let args = invocation.ffmpeg_args();
    let command_line = format!("{} {}", binary.display(), args.join(" "));

    let spawned = Command::new(&binary)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(c) => c,
        Err(e) => {
            let message = format!("failed to start {}: {e}", binary.display());
            let _ = tx.send(EngineEvent::Failed { message }).await;
            return;
        }
    };

    let _ = tx.send(EngineEvent::Started { command_line }).await;

    let stderr = child.stderr.take();
    let tail_task = tokio::spawn(async move {
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
        if let Some(err) = stderr {
            let mut lines = BufReader::new(err).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }
        tail
    });

    if let Some(out) = child.stdout.take() {
        let mut lines = BufReader::new(out).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(position) = line.strip_prefix("out_time=") {
                let _ = tx
                    .send(EngineEvent::Progress {
                        position: position.trim().to_string(),
                    })
                    .await;
            }
        }
    }

    let status = child.wait().await;
    let tail = tail_task.await.unwrap_or_default();

    let event = match status {
        Ok(s) if s.success() => EngineEvent::Finished,
        Ok(s) => EngineEvent::Failed {
            message: failure_message(s, &tail),
        },
        Err(e) => EngineEvent::Failed {
            message: format!("failed waiting for engine: {e}"),
        },
    };
    let _ = tx.send(event).await;
}

fn failure_message(status: ExitStatus, tail: &VecDeque<String>) -> String {
    if tail.is_empty() {
        format!("engine exited with {status}")
    } else {
        tail.iter().cloned().collect::<Vec<_>>().join("\n")
    }
}
