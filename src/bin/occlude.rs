use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use occlude::session::segment::CancelToken;
use occlude::{
    CutoutFileSegmenter, DetectionMode, FontBook, ImageBuffer, PipelineConfig, Segmenter,
    TextColor, TextRasterizer, TextSpec,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "occlude", version)]
struct Cli {
    /// Log more (-v debug, -vv trace). `RUST_LOG` overrides this.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite text behind the subject and write a PNG.
    Compose(ComposeArgs),
    /// Write the foreground mask as a grayscale PNG.
    Mask(MaskArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Standard,
    Fast,
    Segmentation,
}

impl From<ModeArg> for DetectionMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Standard => Self::Standard,
            ModeArg::Fast => Self::Fast,
            ModeArg::Segmentation => Self::Segmentation,
        }
    }
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// Input image (any format the `image` crate decodes).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Foreground detection mode. Defaults to `segmentation` when --cutout is given.
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Precomputed segmentation cutout (RGBA PNG).
    #[arg(long)]
    cutout: Option<PathBuf>,

    /// Pipeline configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the maximum processing dimension.
    #[arg(long)]
    max_dimension: Option<u32>,
}

#[derive(Args, Debug)]
struct ComposeArgs {
    #[command(flatten)]
    detect: DetectArgs,

    /// Text content; a literal `\n` starts a new line.
    #[arg(long, required_unless_present = "spec", conflicts_with = "spec")]
    text: Option<String>,

    /// Full text spec JSON; individual style flags override its fields.
    #[arg(long)]
    spec: Option<PathBuf>,

    #[arg(long)]
    font_family: Option<String>,

    /// Directory of .ttf/.otf/.ttc files to register.
    #[arg(long)]
    font_dir: Option<PathBuf>,

    /// Font size in pixels.
    #[arg(long)]
    size: Option<f32>,

    /// Text color as #RRGGBB or #RRGGBBAA.
    #[arg(long)]
    color: Option<TextColor>,

    /// Anchor x in percent of width.
    #[arg(long)]
    x: Option<f32>,

    /// Anchor y in percent of height.
    #[arg(long)]
    y: Option<f32>,

    /// Also write the mask debug overlay here.
    #[arg(long)]
    debug_overlay: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct MaskArgs {
    #[command(flatten)]
    detect: DetectArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Compose(args) => cmd_compose(args),
        Command::Mask(args) => cmd_mask(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &DetectArgs) -> anyhow::Result<PipelineConfig> {
    let mut cfg = match &args.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    match (args.mode, &args.cutout) {
        (Some(mode), _) => cfg.mode = mode.into(),
        (None, Some(_)) => cfg.mode = DetectionMode::Segmentation,
        (None, None) => {}
    }
    if let Some(max) = args.max_dimension {
        cfg.max_dimension = max;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn load_cutout(args: &DetectArgs, source: &ImageBuffer) -> anyhow::Result<Option<ImageBuffer>> {
    let Some(path) = &args.cutout else {
        return Ok(None);
    };
    let segmenter = CutoutFileSegmenter::new(path);
    let cutout = segmenter.segment(
        source,
        &mut |p: f32| tracing::debug!(progress = p, "segmentation"),
        &CancelToken::new(),
    )?;
    Ok(Some(cutout))
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.detect)?;

    let mut spec = match &args.spec {
        Some(path) => TextSpec::from_path(path)?,
        None => TextSpec::new(args.text.as_deref().unwrap_or_default().replace("\\n", "\n")),
    };
    if let Some(family) = args.font_family {
        spec.font_family = family;
    }
    if let Some(size) = args.size {
        spec.size = size;
    }
    if let Some(color) = args.color {
        spec.color = color;
    }
    if let Some(x) = args.x {
        spec.x = x;
    }
    if let Some(y) = args.y {
        spec.y = y;
    }
    spec.validate()?;

    let mut fonts = FontBook::new();
    if let Some(dir) = &args.font_dir {
        let n = fonts.load_dir(dir)?;
        tracing::info!(faces = n, dir = %dir.display(), "fonts registered");
    }
    if fonts.resolve(&spec.font_family).is_none() {
        tracing::info!(family = %spec.font_family, "family not registered, using bitmap face");
    }

    let source = occlude::load_image(&args.detect.in_path)
        .with_context(|| format!("load '{}'", args.detect.in_path.display()))?;
    let cutout = load_cutout(&args.detect, &source)?;

    let mut rasterizer = TextRasterizer::new(fonts, cfg.line_height_factor);
    let out = occlude::compose_still(&source, cutout.as_ref(), &spec, &cfg, &mut rasterizer)?;

    let Some(image) = out.image() else {
        anyhow::bail!("no frame produced: the mask or text layer was unavailable for this image");
    };
    occlude::save_png(image, &args.out)?;
    eprintln!("wrote {}", args.out.display());

    if let Some(path) = &args.debug_overlay {
        occlude::save_png(&out.debug_overlay(cfg.overlay_color)?, path)?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn cmd_mask(args: MaskArgs) -> anyhow::Result<()> {
    let cfg = load_config(&args.detect)?;
    let source = occlude::load_image(&args.detect.in_path)
        .with_context(|| format!("load '{}'", args.detect.in_path.display()))?;
    let cutout = load_cutout(&args.detect, &source)?;

    let canvas = occlude::render::resize::resize_to_fit(&source, cfg.max_dimension)?;
    let mask = occlude::detect_mask(&canvas, cutout.as_ref(), &cfg)?;
    if mask.is_empty() {
        anyhow::bail!("mask unavailable for this image");
    }
    tracing::info!(
        foreground = mask.foreground_count(),
        total = mask.len(),
        origin = mask.origin().name(),
        "mask"
    );
    occlude::save_mask_png(&mask, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}
