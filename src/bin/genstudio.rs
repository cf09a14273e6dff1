//! CLI for GenStudio - multi-stage generative media jobs.

use async_trait::async_trait;
use clap::{Args, Parser, Subcommand, ValueEnum};
use genstudio::features::{Avatar, Dance, GlobalAvatar, SongConcept, StandUp, VOICES};
use genstudio::{
    shell, Artifact, AspectRatio, GeminiClient, InMemoryMediaRegistry, JobOrchestrator, JobState,
    OrchestratorConfig, ShareHandler, SharePayload, StageName, Workflow,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "genstudio")]
#[command(about = "Generate avatars, dance clips, talking heads, songs and stand-up sets via Gemini")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory artifacts are written to
    #[arg(short, long, global = true, default_value = ".")]
    output: PathBuf,

    /// Print the share payload of the finished job
    #[arg(long, global = true)]
    share: bool,

    /// Stop after this many video status checks
    #[arg(long, global = true)]
    max_polls: Option<u32>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a character portrait
    Avatar(AvatarArgs),

    /// Generate a dance video from a description
    Dance(DanceArgs),

    /// Generate a talking-head video, translated if needed
    GlobalAvatar(GlobalAvatarArgs),

    /// Generate a song concept and cover art
    Song(SongArgs),

    /// Generate a stand-up comedy set
    Standup(StandUpArgs),

    /// List available voices
    Voices,
}

#[derive(Args)]
struct AvatarArgs {
    /// Who or what to draw
    description: String,

    /// Art style
    #[arg(long, default_value = "Any")]
    style: String,

    /// Background
    #[arg(long, default_value = "Any")]
    background: String,

    /// Aspect ratio
    #[arg(long, value_enum, default_value = "1:1")]
    aspect_ratio: AspectRatioArg,
}

#[derive(Args)]
struct DanceArgs {
    /// Who is dancing
    performer: String,

    /// Dance style
    #[arg(long, default_value = "Any")]
    style: String,

    /// Music genre
    #[arg(long, default_value = "Any")]
    music: String,

    /// Location
    #[arg(long, default_value = "Any")]
    setting: String,

    /// Aspect ratio
    #[arg(long, value_enum, default_value = "9:16")]
    aspect_ratio: AspectRatioArg,

    /// Use the high quality video model
    #[arg(long)]
    high_quality: bool,
}

#[derive(Args)]
struct GlobalAvatarArgs {
    /// Who the avatar is
    description: String,

    /// What the avatar says, in English
    script: String,

    /// Spoken language
    #[arg(short, long, default_value = "English")]
    language: String,

    /// Voice (random if omitted)
    #[arg(long)]
    voice: Option<String>,

    /// Aspect ratio
    #[arg(long, value_enum, default_value = "16:9")]
    aspect_ratio: AspectRatioArg,

    /// Use the high quality video model
    #[arg(long)]
    high_quality: bool,
}

#[derive(Args)]
struct SongArgs {
    /// What the song is about
    theme: String,

    /// Genre
    #[arg(long, default_value = "Any")]
    genre: String,

    /// Mood
    #[arg(long, default_value = "Any")]
    mood: String,
}

#[derive(Args)]
struct StandUpArgs {
    /// What the set is about
    topic: String,

    /// What the comedian looks like
    comedian: String,

    /// Comedy style
    #[arg(long, default_value = "Any")]
    style: String,

    /// Voice (random if omitted)
    #[arg(long)]
    voice: Option<String>,

    /// Aspect ratio
    #[arg(long, value_enum, default_value = "16:9")]
    aspect_ratio: AspectRatioArg,

    /// Use the high quality video model
    #[arg(long)]
    high_quality: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AspectRatioArg {
    #[value(name = "1:1")]
    Square,
    #[value(name = "16:9")]
    Landscape,
    #[value(name = "9:16")]
    Portrait,
    #[value(name = "4:3")]
    Standard,
    #[value(name = "3:4")]
    StandardPortrait,
}

impl From<AspectRatioArg> for AspectRatio {
    fn from(arg: AspectRatioArg) -> Self {
        match arg {
            AspectRatioArg::Square => AspectRatio::Square,
            AspectRatioArg::Landscape => AspectRatio::Landscape,
            AspectRatioArg::Portrait => AspectRatio::Portrait,
            AspectRatioArg::Standard => AspectRatio::Standard,
            AspectRatioArg::StandardPortrait => AspectRatio::StandardPortrait,
        }
    }
}

struct RunOptions {
    output: PathBuf,
    share: bool,
    max_polls: Option<u32>,
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("genstudio=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let opts = RunOptions {
        output: cli.output,
        share: cli.share,
        max_polls: cli.max_polls,
        json: cli.json,
    };

    match cli.command {
        Commands::Avatar(args) => {
            let avatar = Avatar {
                aspect_ratio: args.aspect_ratio.into(),
                ..Avatar::new(args.description)
                    .with_style(args.style)
                    .with_background(args.background)
            };
            run(avatar, &opts).await?;
        }
        Commands::Dance(args) => {
            let dance = Dance {
                aspect_ratio: args.aspect_ratio.into(),
                high_quality: args.high_quality,
                ..Dance::new(args.performer)
                    .with_style(args.style)
                    .with_music(args.music)
                    .with_setting(args.setting)
            };
            run(dance, &opts).await?;
        }
        Commands::GlobalAvatar(args) => {
            let job = GlobalAvatar {
                voice: args.voice,
                aspect_ratio: args.aspect_ratio.into(),
                high_quality: args.high_quality,
                ..GlobalAvatar::new(args.description, args.script).with_language(args.language)
            };
            run(job, &opts).await?;
        }
        Commands::Song(args) => {
            let song = SongConcept::new(args.theme)
                .with_genre(args.genre)
                .with_mood(args.mood);
            run(song, &opts).await?;
        }
        Commands::Standup(args) => {
            let set = StandUp {
                voice: args.voice,
                aspect_ratio: args.aspect_ratio.into(),
                high_quality: args.high_quality,
                ..StandUp::new(args.topic, args.comedian).with_style(args.style)
            };
            run(set, &opts).await?;
        }
        Commands::Voices => {
            list_voices(opts.json)?;
        }
    }

    Ok(())
}

async fn run<W: Workflow + 'static>(workflow: W, opts: &RunOptions) -> anyhow::Result<()> {
    let client = GeminiClient::builder().build()?;
    let media = InMemoryMediaRegistry::new();
    let mut config = OrchestratorConfig::builder();
    if let Some(max) = opts.max_polls {
        config = config.max_poll_attempts(max);
    }

    let orchestrator = JobOrchestrator::builder(Arc::new(client))
        .media_registry(Arc::new(media.clone()))
        .config(config.build())
        .build();
    let mut updates = orchestrator.subscribe();
    let workflow_name = workflow.name();
    orchestrator.submit(workflow).await;

    let mut last_line = String::new();
    let snapshot = loop {
        let snapshot = updates.borrow_and_update().clone();
        if !opts.json {
            let line = match &snapshot.loading_message {
                Some(message) => format!("{} {}", shell::stage_label(&snapshot.state()), message),
                None => shell::stage_label(&snapshot.state()).to_string(),
            };
            if line != last_line {
                eprintln!("{line}");
                last_line = line;
            }
        }
        if snapshot.state().is_terminal() {
            break snapshot;
        }
        updates.changed().await?;
    };

    if snapshot.state() == JobState::Error {
        let message = snapshot
            .error()
            .map(shell::error_message)
            .unwrap_or_else(|| "Generation failed.".to_string());
        if opts.json {
            let result = serde_json::json!({
                "type": workflow_name,
                "success": false,
                "error": snapshot.error(),
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        anyhow::bail!(message);
    }

    std::fs::create_dir_all(&opts.output)?;
    let mut written = Vec::new();
    for (stage, artifact) in snapshot.artifacts().iter() {
        let path = write_artifact(&opts.output, workflow_name, stage, artifact, &media)?;
        written.push(serde_json::json!({
            "stage": stage,
            "output": path.display().to_string(),
            "mime_type": artifact.media().map(|m| m.mime_type()).unwrap_or("text/plain"),
        }));
    }

    let shared = if opts.share {
        Some(orchestrator.share(&LogShare).await?)
    } else {
        None
    };

    if opts.json {
        let result = serde_json::json!({
            "type": workflow_name,
            "success": true,
            "artifacts": written,
            "share": shared,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", shell::render(&snapshot));
        for entry in &written {
            println!("Wrote {}", entry["output"].as_str().unwrap_or_default());
        }
        if let Some(payload) = &shared {
            println!("Share: {}", serde_json::to_string(payload)?);
        }
    }

    orchestrator.shutdown();
    Ok(())
}

fn write_artifact(
    dir: &Path,
    workflow: &str,
    stage: StageName,
    artifact: &Artifact,
    media: &InMemoryMediaRegistry,
) -> anyhow::Result<PathBuf> {
    let (bytes, extension) = match artifact {
        Artifact::Text { text } => (text.as_bytes().to_vec(), "txt"),
        other => {
            let handle = other
                .media()
                .ok_or_else(|| anyhow::anyhow!("{stage} artifact has no media"))?;
            let data = media
                .get(handle.url())
                .ok_or_else(|| anyhow::anyhow!("{stage} media was already released"))?;
            (data.to_vec(), extension_for(handle.mime_type()))
        }
    };
    let path = dir.join(format!("{workflow}-{stage}.{extension}"));
    std::fs::write(&path, bytes)?;
    Ok(path)
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "audio/wav" => "wav",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}

/// Logs the share; the payload itself is printed with the results.
struct LogShare;

#[async_trait]
impl ShareHandler for LogShare {
    async fn share(&self, payload: SharePayload) -> genstudio::Result<()> {
        tracing::info!(content_type = ?payload.content_type, "sharing result");
        Ok(())
    }
}

fn list_voices(json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(VOICES)?);
    } else {
        println!("Available voices:\n");
        for voice in VOICES {
            println!("  {voice}");
        }
    }
    Ok(())
}
