// ============================================================================
// LumaEdit CLI - headless editing via command-line arguments
// ============================================================================
//
// Usage examples:
//   lumaedit -i photo.png -o out.png --step rotate-right --grayscale
//   lumaedit -i "shots/*.jpg" --output-dir small/ --step resize=640x480 --format png
//   lumaedit -i scan.tif -o cropped.jpg --step crop=10,10,300,200 --quality 85
//   lumaedit -i a.png --step flip-h --step undo --brightness -40 -o b.png
//   lumaedit --write-config ~/.config/lumaedit/lumaedit_settings.cfg
//
// Each input is decoded, run through the edit recipe with the same engine the
// interactive editor uses, and the display buffer (filters applied) is
// exported.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Instant;

use clap::Parser;
use thiserror::Error;

use crate::components::crop::CropRect;
use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::error::{DecodeError, EditError, EncodeError};
use crate::io::{self, SaveFormat};
use crate::ops::transform::{FlipAxis, RotateDirection};

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// LumaEdit headless image editor.
#[derive(Parser, Debug)]
#[command(
    name = "lumaedit",
    version,
    about = "LumaEdit headless image editor",
    long_about = "Apply rotate, flip, resize, crop and tone filters to image files\n\
                  without opening an editor window. Reads PNG, JPEG, WEBP, BMP, TGA\n\
                  and TIFF; writes PNG, JPEG, BMP, TGA and TIFF.\n\n\
                  Example:\n  \
                  lumaedit -i photo.png --step rotate-right --grayscale -o out.png"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "shots/*.jpg").
    #[arg(short, long, num_args = 1.., required_unless_present = "write_config")]
    pub input: Vec<String>,

    /// Output file path. Only valid for single-file input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, bmp, tga, tiff.
    /// When omitted, inferred from --output's extension, then the config default.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1-100). Defaults to the config value.
    #[arg(short, long, value_name = "1-100")]
    pub quality: Option<u8>,

    /// Edit step, applied in order: rotate-left, rotate-right, flip-h, flip-v,
    /// resize=WxH, crop=X,Y,W,H, undo, redo.
    #[arg(long = "step", value_name = "STEP")]
    pub steps: Vec<EditStep>,

    /// Convert to grayscale.
    #[arg(long)]
    pub grayscale: bool,

    /// Brightness offset (-255..255).
    #[arg(long, allow_negative_numbers = true, value_name = "N")]
    pub brightness: Option<i32>,

    /// Contrast level (-255..255).
    #[arg(long, allow_negative_numbers = true, value_name = "N")]
    pub contrast: Option<i32>,

    /// Settings file to use instead of the default location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the effective settings to FILE.
    #[arg(long, value_name = "FILE")]
    pub write_config: Option<PathBuf>,

    /// Print per-file progress and mirror the log to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Edit recipe steps
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EditStep {
    Rotate(RotateDirection),
    Flip(FlipAxis),
    Resize { width: f64, height: f64 },
    Crop(CropRect),
    Undo,
    Redo,
}

impl FromStr for EditStep {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| EditError::InvalidStep {
            step: s.to_string(),
            reason: reason.to_string(),
        };
        let trimmed = s.trim();
        let (name, arg) = match trimmed.split_once('=') {
            Some((n, a)) => (n.trim(), Some(a.trim())),
            None => (trimmed, None),
        };
        match (name.to_ascii_lowercase().as_str(), arg) {
            ("rotate-left", None) => Ok(EditStep::Rotate(RotateDirection::Left)),
            ("rotate-right", None) => Ok(EditStep::Rotate(RotateDirection::Right)),
            ("flip-h", None) => Ok(EditStep::Flip(FlipAxis::Horizontal)),
            ("flip-v", None) => Ok(EditStep::Flip(FlipAxis::Vertical)),
            ("undo", None) => Ok(EditStep::Undo),
            ("redo", None) => Ok(EditStep::Redo),
            ("resize", Some(arg)) => {
                let (w, h) = arg
                    .split_once(['x', 'X'])
                    .ok_or_else(|| invalid("expected resize=WxH"))?;
                let width = parse_number(w).ok_or_else(|| invalid("width is not a number"))?;
                let height = parse_number(h).ok_or_else(|| invalid("height is not a number"))?;
                Ok(EditStep::Resize { width, height })
            }
            ("crop", Some(arg)) => {
                let parts: Vec<f64> = arg
                    .split(',')
                    .map(parse_number)
                    .collect::<Option<_>>()
                    .ok_or_else(|| invalid("crop values must be numbers"))?;
                let [x, y, width, height] = parts[..] else {
                    return Err(invalid("expected crop=X,Y,W,H"));
                };
                Ok(EditStep::Crop(CropRect { x, y, width, height }))
            }
            ("resize" | "crop", None) => Err(invalid("missing '=' argument")),
            (_, Some(_)) => Err(invalid("this step takes no argument")),
            _ => Err(invalid("unknown step")),
        }
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

impl EditStep {
    /// Run the step against `editor`. `false` when the editor ignored it.
    pub fn apply(&self, editor: &mut Editor) -> bool {
        match *self {
            EditStep::Rotate(dir) => editor.rotate_90(dir),
            EditStep::Flip(axis) => editor.flip(axis),
            EditStep::Resize { width, height } => editor.resize_image(width, height),
            EditStep::Crop(rect) => {
                if editor.enter_crop().is_none() || editor.set_crop_rect(rect).is_none() {
                    return false;
                }
                editor.commit_crop()
            }
            EditStep::Undo => editor.undo(),
            EditStep::Redo => editor.redo(),
        }
    }
}

// ============================================================================
// Public entry point
// ============================================================================

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("load failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("save failed: {0}")]
    Encode(#[from] EncodeError),
}

/// Outcome of a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
}

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = setup failed or any file failed.
pub fn run(args: CliArgs) -> ExitCode {
    crate::logger::set_echo_stderr(args.verbose);
    match run_batch(&args) {
        Some(report) if report.failed == 0 => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

/// Everything `run` does, minus the exit code. `None` on a setup error.
pub fn run_batch(args: &CliArgs) -> Option<BatchReport> {
    let config = match &args.config {
        Some(path) => EditorConfig::load_from(path),
        None => EditorConfig::load(),
    };

    if let Some(path) = &args.write_config {
        if let Err(e) = config.save_to(path) {
            eprintln!("error: could not write config '{}': {}", path.display(), e);
            return None;
        }
        crate::log_info!("Wrote settings to {}", path.display());
        if args.input.is_empty() {
            return Some(BatchReport::default());
        }
    }

    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return None;
    }

    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return None;
    }

    let format = match parse_format(args.format.as_deref(), args.output.as_deref(), config.default_format) {
        Ok(f) => f,
        Err(name) => {
            eprintln!("error: unknown output format '{}'.", name);
            return None;
        }
    };
    let quality = args.quality.unwrap_or(config.jpeg_quality).clamp(1, 100);

    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return None;
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut report = BatchReport::default();

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }
        let file_start = Instant::now();

        let Some(output_path) = build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            format,
        ) else {
            eprintln!(
                "  error: cannot determine output path for '{}'.",
                input_path.display()
            );
            report.failed += 1;
            continue;
        };

        match run_one(input_path, &output_path, args, &config, format, quality) {
            Ok(()) => {
                report.succeeded += 1;
                if args.verbose || multi {
                    println!(
                        "  -> {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                crate::log_err!("{}: {}", input_path.display(), e);
                eprintln!("  error: {}", e);
                report.failed += 1;
            }
        }
    }

    Some(report)
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    input: &Path,
    output: &Path,
    args: &CliArgs,
    config: &EditorConfig,
    format: SaveFormat,
    quality: u8,
) -> Result<(), ProcessError> {
    let mut editor = Editor::new(config.clone());
    editor.finish_load(io::decode_file(input))?;

    for step in &args.steps {
        if !step.apply(&mut editor) && args.verbose {
            println!("  skipped {:?}", step);
        }
    }

    let mut settings = editor.settings();
    if args.grayscale {
        settings.set_grayscale(true);
    }
    if let Some(b) = args.brightness {
        settings.set_brightness(b);
    }
    if let Some(c) = args.contrast {
        settings.set_contrast(c);
    }
    if settings != editor.settings() {
        editor.commit_filters();
        editor.set_filters(settings);
    }

    let bytes = editor.export(format, quality)?;
    std::fs::write(output, bytes).map_err(EncodeError::from)?;
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Pick the format from `--format`, then the output extension, then
/// `fallback`. An unrecognised `--format` is returned as the error.
fn parse_format<'a>(
    format_arg: Option<&'a str>,
    output: Option<&Path>,
    fallback: SaveFormat,
) -> Result<SaveFormat, &'a str> {
    if let Some(f) = format_arg {
        return SaveFormat::from_name(f).ok_or(f);
    }
    Ok(output.and_then(SaveFormat::from_path).unwrap_or(fallback))
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}
