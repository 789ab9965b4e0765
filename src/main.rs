use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;

use gifrecolor::{color, color::Color, img, output, replace::replace, Frame};

#[derive(Parser)]
#[command(name = "gifrecolor")]
#[command(about = "Replace a color in one or more GIF animations with tolerance")]
struct Args {
    /// One or more input GIF files
    #[arg(short, long, required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Output file name (bare name, no path); defaults to the input name
    /// with '_processed' appended
    #[arg(short, long)]
    output: Option<String>,

    /// Directory for the processed files; defaults to the input's directory
    #[arg(long, alias = "od")]
    output_dir: Option<PathBuf>,

    /// The color to replace, as '#RRGGBB' or 'R G B' (e.g. '#33CCCC' or '51 204 204')
    #[arg(long, alias = "oc")]
    old_color: String,

    /// The color that replaces it, in the same formats
    #[arg(long, alias = "nc")]
    new_color: String,

    /// Maximum per-channel distance for a pixel to count as a match
    #[arg(short, long, default_value_t = 30)]
    tolerance: i64,

    /// Time between frames in milliseconds; values below 20 render
    /// inconsistently in many viewers
    #[arg(short, long, default_value_t = 100)]
    duration: u16,

    /// Overwrite existing files instead of picking a numbered name
    #[arg(short, long)]
    force: bool,
}

/// Per-run accumulator, reported once at the end.
#[derive(Default)]
struct RunStats {
    files_ok: usize,
    files_failed: usize,
    frames: usize,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    for input in &args.input {
        if !input.is_file() {
            bail!("file {} not found", input.display());
        }
    }

    let target: Color = args.old_color.parse()?;
    let replacement: Color = args.new_color.parse()?;
    let tolerance = color::validate_tolerance(args.tolerance)?;

    let mut stats = RunStats::default();
    for input in &args.input {
        match process_file(input, &args, target, replacement, tolerance) {
            Ok(frames) => {
                stats.files_ok += 1;
                stats.frames += frames;
            }
            Err(err) => {
                log::error!("{}: {err:#}", input.display());
                stats.files_failed += 1;
            }
        }
    }

    log::info!(
        "done: {} file(s) processed, {} frame(s) recolored",
        stats.files_ok,
        stats.frames
    );
    if stats.files_failed > 0 {
        bail!("{} file(s) failed", stats.files_failed);
    }
    Ok(())
}

/// Decodes one GIF, recolors its frames in parallel, and writes the result.
/// Returns the number of frames processed.
fn process_file(
    input: &Path,
    args: &Args,
    target: Color,
    replacement: Color,
    tolerance: u8,
) -> Result<usize> {
    let dest = output::resolve_output(
        input,
        args.output.as_deref(),
        args.output_dir.as_deref(),
        args.force,
    )?;

    let animation = img::decode(input)?;
    log::info!(
        "processing {} ({} frames)",
        input.display(),
        animation.frame_count()
    );

    let bar = ProgressBar::new(animation.frame_count() as u64).with_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
            .expect("static progress template")
            .progress_chars("=> "),
    );
    bar.set_message(output::file_name(input));

    // Frames are independent; order is preserved by the ordered collect.
    let processed: Vec<Frame> = animation
        .frames
        .par_iter()
        .progress_with(bar)
        .map(|frame| replace(frame, target, replacement, tolerance))
        .collect();

    output::make_parent_dir(&dest)
        .with_context(|| format!("failed to create directory for {}", dest.display()))?;
    img::encode(&processed, args.duration, &dest)?;
    log::info!("wrote {}", dest.display());
    Ok(processed.len())
}
