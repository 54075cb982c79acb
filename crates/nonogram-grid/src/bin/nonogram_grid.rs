//! nonogram-grid CLI: detect the cross lattices of a nonogram photo.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use nonogram_grid::detect::{detect_crosses, render_overlay, save_cells};
use nonogram_grid::{CrossLocs, CrossLocsParams, Pass};
use serde::Serialize;
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "nonogram-grid")]
#[command(about = "Locate the grid crossings of a photographed nonogram puzzle")]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace); `RUST_LOG` wins
    /// in `tracing` builds.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect the main, top and left lattices in an image.
    Detect(DetectArgs),

    /// Print the effective detector configuration as JSON.
    PrintConfig {
        /// JSON config file; missing fields take their defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: ParamOverrides,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PassArg {
    Main,
    Top,
    Left,
}

impl From<PassArg> for Pass {
    fn from(value: PassArg) -> Self {
        match value {
            PassArg::Main => Pass::Main,
            PassArg::Top => Pass::Top,
            PassArg::Left => Pass::Left,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct DetectArgs {
    /// Input image (any format the `image` crate decodes).
    image: PathBuf,

    /// JSON config file; missing fields take their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the detection as JSON here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Write the image with the detected crossings drawn on it.
    #[arg(long)]
    draw: Option<PathBuf>,

    /// Marker radius for --draw, in pixels.
    #[arg(long, default_value_t = 3)]
    radius: u32,

    /// Write rectified cell images (`{row:03}_{col:03}.png`) into this directory.
    #[arg(long)]
    cells_dir: Option<PathBuf>,

    /// Lattice whose cells are written by --cells-dir.
    #[arg(long, value_enum, default_value_t = PassArg::Main)]
    cells_from: PassArg,

    /// Side of each rectified cell image, in pixels.
    #[arg(long, default_value_t = 20)]
    cell_side: usize,

    #[command(flatten)]
    overrides: ParamOverrides,
}

/// Single-field overrides applied on top of the config file.
#[derive(Debug, Clone, Args, Default)]
struct ParamOverrides {
    /// Longer side of the working image.
    #[arg(long)]
    max_side: Option<usize>,
    /// Adaptive threshold block size (odd).
    #[arg(long)]
    block_size: Option<usize>,
    /// Adaptive threshold offset.
    #[arg(long)]
    threshold_c: Option<f32>,
    /// Smallest cell side tried by the seed search.
    #[arg(long)]
    cell_min: Option<u32>,
    /// Largest cell side tried by the seed search.
    #[arg(long)]
    cell_max: Option<u32>,
    /// Minimum template similarity, exclusive.
    #[arg(long)]
    similarity: Option<f32>,
    /// Side of the seed search window.
    #[arg(long)]
    seed_window: Option<usize>,
}

impl ParamOverrides {
    fn apply(&self, p: &mut CrossLocsParams) {
        if let Some(v) = self.max_side {
            p.resize_max_side = v;
        }
        if let Some(v) = self.block_size {
            p.threshold_block_size = v;
        }
        if let Some(v) = self.threshold_c {
            p.threshold_c = v;
        }
        if let Some(v) = self.cell_min {
            p.cell_side_min = v;
        }
        if let Some(v) = self.cell_max {
            p.cell_side_max = v;
        }
        if let Some(v) = self.similarity {
            p.similarity_ratio_min = v;
        }
        if let Some(v) = self.seed_window {
            p.seed_window = v;
        }
    }
}

#[derive(Serialize)]
struct DetectReport<'a> {
    image: String,
    width: u32,
    height: u32,
    params: &'a CrossLocsParams,
    #[serde(flatten)]
    crosses: &'a CrossLocs,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Detect(args) => run_detect(&args),
        Commands::PrintConfig { config, overrides } => run_print_config(config.as_deref(), &overrides),
    }
}

// `RUST_LOG`, when set, overrides `-v`.
#[cfg(feature = "tracing")]
fn init_logging(verbose: u8) {
    let level = nonogram_grid::core::level_for_verbosity(verbose);
    nonogram_grid::core::init_tracing(nonogram_grid::core::TraceFormat::Compact, level);
    let _ = tracing_log::LogTracer::init();
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: u8) {
    let _ = nonogram_grid::core::init_with_level(nonogram_grid::core::level_for_verbosity(verbose));
}

fn load_params(config: Option<&Path>, overrides: &ParamOverrides) -> CliResult<CrossLocsParams> {
    let mut params = match config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| -> CliError {
                format!("failed to read config {}: {e}", path.display()).into()
            })?;
            serde_json::from_str(&text).map_err(|e| -> CliError {
                format!("invalid config {}: {e}", path.display()).into()
            })?
        }
        None => CrossLocsParams::default(),
    };
    overrides.apply(&mut params);
    params.validate()?;
    Ok(params)
}

// ── print-config ───────────────────────────────────────────────────────

fn run_print_config(config: Option<&Path>, overrides: &ParamOverrides) -> CliResult<()> {
    let params = load_params(config, overrides)?;
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}

// ── detect ─────────────────────────────────────────────────────────────

fn run_detect(args: &DetectArgs) -> CliResult<()> {
    let params = load_params(args.config.as_deref(), &args.overrides)?;

    log::info!("loading image: {}", args.image.display());
    let img = image::open(&args.image)
        .map_err(|e| -> CliError {
            format!("failed to open image {}: {e}", args.image.display()).into()
        })?
        .to_luma8();
    let (width, height) = img.dimensions();

    let crosses = detect_crosses(&img, params.clone())?;
    log::info!(
        "cell {} px; main {}x{}, top {}x{}, left {}x{}",
        crosses.cell_size,
        crosses.main.rows(),
        crosses.main.cols(),
        crosses.top.rows(),
        crosses.top.cols(),
        crosses.left.rows(),
        crosses.left.cols()
    );

    let report = DetectReport {
        image: args.image.display().to_string(),
        width,
        height,
        params: &params,
        crosses: &crosses,
    };
    let json = serde_json::to_string_pretty(&report)?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, &json)?;
            log::info!("results written to {}", path.display());
        }
        None => println!("{json}"),
    }

    if let Some(path) = &args.draw {
        render_overlay(&img, &crosses, args.radius).save(path)?;
        log::info!("overlay written to {}", path.display());
    }

    if let Some(dir) = &args.cells_dir {
        let pass = Pass::from(args.cells_from);
        let grid = crosses.grid(pass);
        if grid.is_empty() {
            log::warn!("{pass:?} lattice is empty, no cells written");
        } else {
            save_cells(&img, grid, args.cell_side, dir)?;
        }
    }

    Ok(())
}
