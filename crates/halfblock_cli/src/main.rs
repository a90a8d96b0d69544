use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use halfblock_render::{
    BlockRenderer, CrosstermTerminal, DimensionValue, RenderOptions, RenderedFrame, TerminalSize,
    TerminalSizeSource,
};
use image::imageops::FilterType;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] =
    &["png", "jpg", "jpeg", "gif", "bmp", "ico", "pbm", "pgm", "ppm", "pam", "tif", "tiff", "webp"];

#[derive(Parser, Debug)]
#[command(author, version, about = "Render images as truecolor half-block terminal text")]
struct Cli {
    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log debug details to stderr
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render an image to stdout
    Preview(PreviewArgs),
    /// Render an image and write the text to disk
    Convert(ConvertArgs),
    /// Render every image under a directory into text files
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Input image path
    input: PathBuf,
    #[command(flatten)]
    settings: RenderSettings,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Input image path
    input: PathBuf,
    /// Output file path
    #[arg(short, long)]
    output: PathBuf,
    #[command(flatten)]
    settings: RenderSettings,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Directory searched recursively for images
    input: PathBuf,
    /// Output directory for the rendered text files
    #[arg(short, long)]
    out_dir: PathBuf,
    #[command(flatten)]
    settings: RenderSettings,
}

#[derive(Args, Debug, Clone)]
struct RenderSettings {
    /// Width in columns, or a percentage of the terminal width (e.g. 50%)
    #[arg(long)]
    width: Option<DimensionValue>,
    /// Height in rows, or a percentage of the usable terminal rows
    #[arg(long)]
    height: Option<DimensionValue>,
    /// Fit inside the width/height box instead of stretching
    #[arg(long, default_value_t = false)]
    preserve_aspect_ratio: bool,
    /// Resampling filter used when resizing
    #[arg(long, value_enum, default_value = "triangle")]
    filter: FilterChoice,
    /// Terminal columns, overriding the detected size
    #[arg(long, env = "HALFBLOCK_COLUMNS")]
    columns: Option<u16>,
    /// Terminal rows, overriding the detected size
    #[arg(long, env = "HALFBLOCK_ROWS")]
    rows: Option<u16>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FilterChoice {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Commands::Preview(args) => preview(args),
        Commands::Convert(args) => convert(args),
        Commands::Batch(args) => batch(args),
    }
}

fn init_logging(cli: &Cli) {
    // Flags raise the level on top of RUST_LOG; without them RUST_LOG decides alone.
    let filter = if cli.debug || cli.verbose {
        let level = if cli.debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
        EnvFilter::from_default_env().add_directive(level.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn preview(args: PreviewArgs) -> Result<()> {
    let renderer = args.settings.renderer();
    let options = args.settings.to_options();
    let frame = renderer
        .render_path(&args.input, &options)
        .with_context(|| format!("failed to render {:?}", args.input))?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(frame.text.as_bytes()).context("failed to write to stdout")?;
    stdout.flush()?;
    Ok(())
}

fn convert(args: ConvertArgs) -> Result<()> {
    let renderer = args.settings.renderer();
    let options = args.settings.to_options();
    let frame = renderer
        .render_path(&args.input, &options)
        .with_context(|| format!("failed to render {:?}", args.input))?;

    write_frame(&args.output, &frame)?;
    info!("wrote {} lines to {:?}", frame.lines().count(), args.output);
    Ok(())
}

fn batch(args: BatchArgs) -> Result<()> {
    let renderer = args.settings.renderer();
    let options = args.settings.to_options();
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create output directory {:?}", args.out_dir))?;

    let inputs = collect_images(&args.input)?;
    let progress = ProgressBar::new(inputs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} images",
        )
        .context("invalid progress template")?
        .progress_chars("=> "),
    );

    let mut failed = 0usize;
    for input in &inputs {
        let output = args.out_dir.join(output_name(&args.input, input));
        match renderer.render_path(input, &options) {
            Ok(frame) => write_frame(&output, &frame)?,
            Err(err) => {
                warn!("skipping {:?}: {err}", input);
                failed += 1;
            },
        }
        progress.inc(1);
    }

    progress.finish_with_message(format!("Rendered into {:?}", args.out_dir));
    if failed == inputs.len() {
        anyhow::bail!("none of the {} images under {:?} could be rendered", failed, args.input);
    }
    Ok(())
}

fn write_frame(path: &Path, frame: &RenderedFrame) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {:?}", parent))?;
    }

    let mut file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    file.write_all(frame.text.as_bytes()).with_context(|| format!("failed to write {:?}", path))?;
    Ok(())
}

fn collect_images(root: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_image(path))
        .collect();
    entries.sort();
    if entries.is_empty() {
        anyhow::bail!("no image files found in {:?}", root);
    }

    debug!("found {} images under {:?}", entries.len(), root);
    Ok(entries)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Mirrors the input's location below `root` and appends `.txt`, keeping the source
/// extension so `cat.png` and `cat.jpg` land in different files.
fn output_name(root: &Path, input: &Path) -> PathBuf {
    let relative = input.strip_prefix(root).unwrap_or(input);
    let mut name = relative.as_os_str().to_owned();
    name.push(".txt");
    PathBuf::from(name)
}

/// Terminal size with command line overrides applied over the detected size.
#[derive(Clone, Copy, Debug)]
struct OverriddenTerminal {
    columns: Option<u16>,
    rows: Option<u16>,
}

impl TerminalSizeSource for OverriddenTerminal {
    fn current_size(&self) -> TerminalSize {
        let detected = match (self.columns, self.rows) {
            (Some(columns), Some(rows)) => TerminalSize::new(columns, rows),
            _ => CrosstermTerminal::default().current_size(),
        };

        TerminalSize::new(
            self.columns.unwrap_or(detected.columns),
            self.rows.unwrap_or(detected.rows),
        )
    }
}

impl RenderSettings {
    fn renderer(&self) -> BlockRenderer<OverriddenTerminal> {
        BlockRenderer::new()
            .with_terminal(OverriddenTerminal { columns: self.columns, rows: self.rows })
    }

    fn to_options(&self) -> RenderOptions {
        RenderOptions {
            width: self.width,
            height: self.height,
            preserve_aspect_ratio: self.preserve_aspect_ratio,
            filter: self.filter.to_filter(),
        }
    }
}

impl FilterChoice {
    fn to_filter(self) -> FilterType {
        match self {
            FilterChoice::Nearest => FilterType::Nearest,
            FilterChoice::Triangle => FilterType::Triangle,
            FilterChoice::CatmullRom => FilterType::CatmullRom,
            FilterChoice::Gaussian => FilterType::Gaussian,
            FilterChoice::Lanczos3 => FilterType::Lanczos3,
        }
    }
}
