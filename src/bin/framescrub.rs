use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use framescrub::{
    BackendKind, EngineOpts, FixedContainer, ImageSet, ManualClock, RangedSegment,
    SequenceEngine, SizingPolicy,
};
use tracing_subscriber::EnvFilter;

const SETTLE_STEP_MS: f64 = 1000.0 / 60.0;

#[derive(Parser, Debug)]
#[command(name = "framescrub", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the frame for one progress value as a PNG.
    Frame(FrameArgs),
    /// Render a timed playback to a numbered PNG sequence.
    Play(PlayArgs),
}

#[derive(Parser, Debug)]
struct SequenceArgs {
    /// Frame sources in order: local paths or http(s) URLs.
    #[arg(long, num_args = 1.., required = true)]
    images: Vec<String>,

    /// Surface width in CSS pixels.
    #[arg(long, default_value_t = 640.0)]
    width: f64,

    /// Surface height in CSS pixels.
    #[arg(long, default_value_t = 360.0)]
    height: f64,

    /// Engine options JSON.
    #[arg(long)]
    opts: Option<PathBuf>,

    /// Sizing policy JSON.
    #[arg(long)]
    sizing: Option<PathBuf>,

    /// Progress remapping segments JSON (an array of ranged segments).
    #[arg(long)]
    interpolation: Option<PathBuf>,

    /// Use the GPU backend (requires the `gpu` feature).
    #[arg(long, default_value_t = false)]
    gpu: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    seq: SequenceArgs,

    /// Progress in [0, 1].
    #[arg(long)]
    progress: f64,

    /// Skip the progress remapping curve.
    #[arg(long, default_value_t = false)]
    bypass_mapper: bool,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PlayArgs {
    #[command(flatten)]
    seq: SequenceArgs,

    #[arg(long, default_value_t = 0.0)]
    from: f64,

    #[arg(long, default_value_t = 1.0)]
    to: f64,

    /// Playback duration in milliseconds.
    #[arg(long, default_value_t = 1000.0)]
    duration_ms: f64,

    /// Simulated time between ticks.
    #[arg(long, default_value_t = 1000.0 / 60.0)]
    step_ms: f64,

    /// Directory receiving `frame_00000.png`, ...
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    match cli.cmd {
        Command::Frame(args) => rt.block_on(cmd_frame(args)),
        Command::Play(args) => rt.block_on(cmd_play(args)),
    }
}

async fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let clock = ManualClock::default();
    let mut engine = build_engine(&args.seq, clock.clone())?;
    let summary = engine.load().await;
    if summary.loaded == 0 {
        anyhow::bail!("none of the {} images could be loaded", summary.requested);
    }

    engine.render_by_progress(args.progress, args.bypass_mapper);
    // Let smoothing and any throttled paint settle.
    while engine.tick() {
        clock.advance(SETTLE_STEP_MS);
    }

    write_png(&mut engine, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

async fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    if !(args.step_ms.is_finite() && args.step_ms > 0.0) {
        anyhow::bail!("--step-ms must be > 0");
    }
    let clock = ManualClock::default();
    let mut engine = build_engine(&args.seq, clock.clone())?;
    let summary = engine.load().await;
    if summary.loaded == 0 {
        anyhow::bail!("none of the {} images could be loaded", summary.requested);
    }

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let mut handle = engine.play(args.from, args.to, args.duration_ms);
    let mut written = 0usize;
    loop {
        let busy = engine.tick();
        let out = args.out_dir.join(format!("frame_{written:05}.png"));
        write_png(&mut engine, &out)?;
        written += 1;
        if handle.try_outcome().is_some() && !busy {
            break;
        }
        clock.advance(args.step_ms);
    }

    let stats = engine.stats();
    eprintln!(
        "wrote {written} frames to {} ({} paints, {} decode failures)",
        args.out_dir.display(),
        stats.paints,
        stats.decode_failures
    );
    Ok(())
}

fn build_engine(args: &SequenceArgs, clock: ManualClock) -> anyhow::Result<SequenceEngine> {
    let mut opts = match &args.opts {
        Some(path) => EngineOpts::from_json_path(path)?,
        None => EngineOpts::default(),
    };
    if args.gpu {
        opts = opts.with_backend(BackendKind::Gpu);
    }
    let sizing: SizingPolicy = match &args.sizing {
        Some(path) => read_json(path)?,
        None => SizingPolicy::default(),
    };

    let mut engine = SequenceEngine::builder()
        .container(Arc::new(FixedContainer::new(args.width, args.height)))
        .image_set(ImageSet::new(args.images.iter().cloned()))
        .sizing_policy(sizing)
        .opts(opts)
        .clock(Arc::new(clock))
        .build()?;

    if let Some(path) = &args.interpolation {
        let segments: Vec<RangedSegment> = read_json(path)?;
        engine.set_interpolation(segments)?;
    }
    Ok(engine)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse '{}'", path.display()))
}

fn write_png(engine: &mut SequenceEngine, out: &Path) -> anyhow::Result<()> {
    let mut frame = engine.snapshot()?;
    frame.unpremultiply();

    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))
}
