use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "aspectra", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single still as a PNG plus its manifest JSON.
    Still(StillArgs),
    /// Pre-render a seamless loop and export it (video when a codec can be
    /// negotiated, PNG frame sequence otherwise).
    Loop(LoopArgs),
}

#[derive(Parser, Debug)]
struct StillArgs {
    /// Seed string.
    #[arg(long)]
    seed: String,

    /// Optional aspects JSON file (`{"coherence":0.5,...}`); defaults to
    /// all-0.5.
    #[arg(long)]
    aspects: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[arg(long, default_value_t = 960)]
    width: u32,

    #[arg(long, default_value_t = 960)]
    height: u32,
}

#[derive(Parser, Debug)]
struct LoopArgs {
    /// Ordered landmark JSON file: `[{"name","seed","aspects","note"?}, ...]`.
    #[arg(long)]
    landmarks: PathBuf,

    /// Seed string for the rendered geometry.
    #[arg(long)]
    seed: String,

    /// Output directory for the artifact and manifest.
    #[arg(long)]
    out_dir: PathBuf,

    #[arg(long, default_value_t = 4000)]
    duration_ms: u32,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 640)]
    height: u32,

    /// Motion blur trail decay per frame, in (0,1).
    #[arg(long, default_value_t = 0.12)]
    blur_decay: f64,

    /// Motion blur per-frame contribution, in (0,1).
    #[arg(long, default_value_t = 0.55)]
    blur_add: f64,

    /// Disable the motion blur accumulator.
    #[arg(long)]
    no_blur: bool,

    /// Time-warp strength in [0,1]; higher lingers longer at landmarks.
    #[arg(long, default_value_t = aspectra::DEFAULT_TIME_WARP)]
    time_warp: f64,

    /// Uncaptured warm-up frames before t=0.
    #[arg(long, default_value_t = 12)]
    pre_roll: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Still(args) => cmd_still(args),
        Command::Loop(args) => cmd_loop(args),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open {what} '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f)).with_context(|| format!("parse {what} JSON"))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("write '{}'", path.display()))?;
    Ok(())
}

fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(path).with_context(|| format!("create directory '{}'", path.display()))
}

fn cmd_still(args: StillArgs) -> anyhow::Result<()> {
    let aspects = match &args.aspects {
        Some(p) => read_json::<aspectra::AspectSet>(p, "aspects")?,
        None => aspectra::AspectSet::default(),
    };
    let canvas = aspectra::Canvas::new(args.width, args.height)?;
    let tuning = aspectra::RenderTuning::default();

    let frame = aspectra::render_still(&args.seed, &aspects, canvas, &tuning)?;
    let title = aspectra::generate_title(&args.seed);

    if let Some(parent) = args.out.parent() {
        ensure_dir(parent)?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    let manifest = aspectra::StillManifest::new(&args.seed, aspects, &title, canvas);
    write_json(&args.out.with_extension("json"), &manifest)?;

    println!("wrote {} ({title})", args.out.display());
    Ok(())
}

fn cmd_loop(args: LoopArgs) -> anyhow::Result<()> {
    let landmarks: Vec<aspectra::Landmark> = read_json(&args.landmarks, "landmarks")?;
    let canvas = aspectra::Canvas::new(args.width, args.height)?;

    let mut opts = aspectra::LoopOpts::new(canvas, args.fps, args.duration_ms);
    opts.pre_roll_frames = args.pre_roll;
    opts.time_warp_strength = args.time_warp;

    let mut blur = aspectra::MotionBlur::new(canvas, args.blur_decay, args.blur_add)?;
    if args.no_blur {
        blur.set_enabled(false);
    }

    let total = opts.total_frames();
    let outcome = aspectra::pre_render(
        &landmarks,
        &args.seed,
        &opts,
        &mut blur,
        &mut |done, _| {
            if done % 30 == 0 || done == total {
                eprintln!("rendered {done}/{total}");
            }
        },
        &mut || false,
        &mut || {},
    )?;
    let buffer = match outcome {
        aspectra::PreRender::Completed(buf) => buf,
        aspectra::PreRender::Cancelled => {
            eprintln!("render cancelled");
            return Ok(());
        }
    };

    let result = aspectra::encode(
        &buffer,
        &aspectra::EncodeOpts::default(),
        &mut |_, _| {},
        &mut || {},
    )?;

    ensure_dir(&args.out_dir)?;
    match &result.payload {
        aspectra::ExportPayload::Video { payload, extension } => {
            let path = args.out_dir.join(format!("loop.{extension}"));
            std::fs::write(&path, payload)
                .with_context(|| format!("write video '{}'", path.display()))?;
            println!("wrote {}", path.display());
        }
        aspectra::ExportPayload::FrameSequence(frames) => {
            for (idx, png) in frames {
                let path = args.out_dir.join(format!("frame_{idx:05}.png"));
                std::fs::write(&path, png)
                    .with_context(|| format!("write frame '{}'", path.display()))?;
            }
            println!(
                "no video codec available; wrote {} frames to {}",
                frames.len(),
                args.out_dir.display()
            );
        }
    }

    let manifest = aspectra::AnimationManifest::new(
        &opts,
        aspectra::MotionBlurManifest {
            enabled: blur.is_enabled(),
            decay: blur.decay(),
            add: blur.add_strength(),
        },
        &landmarks,
    );
    write_json(&args.out_dir.join("manifest.json"), &manifest)?;
    Ok(())
}
