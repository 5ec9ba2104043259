use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vein_enhance::{
    default_output_path, process_directory, process_file, Mode, ProcessOptions, ProcessResult,
    Settings, DEFAULT_PREVIEW_SCALE,
};

#[derive(Parser)]
#[command(
    name = "vein-enhance",
    about = "Enhance vein patterns in near-infrared / red-channel photos",
    version,
    after_help = "Simple usage: vein-enhance <image>  (writes <name>_enhanced.<ext>)\n\n\
                  Sliders run from 0 to 100 with 50 as the neutral default."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: String,

    /// Output file or directory (default: {name}_enhanced.{ext})
    #[arg(short, long)]
    output: Option<String>,

    /// Pass frames through without enhancement
    #[arg(long)]
    raw: bool,

    /// Vein clarity (CLAHE clip limit), 0-100
    #[arg(long, default_value = "50")]
    clarity: f32,

    /// Image brightness (gamma), 0-100
    #[arg(long, default_value = "50")]
    brightness: f32,

    /// Background smoothness (illumination blur size), 0-100
    #[arg(long, default_value = "50")]
    smoothness: f32,

    /// Use the preview path, downscaling by this factor (0-1]
    #[arg(long, value_name = "FACTOR", num_args = 0..=1, default_missing_value = "0.5")]
    preview_scale: Option<f32>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    for (name, value) in [
        ("clarity", cli.clarity),
        ("brightness", cli.brightness),
        ("smoothness", cli.smoothness),
    ] {
        if !(0.0..=100.0).contains(&value) {
            eprintln!("Error: --{name} must be between 0 and 100");
            process::exit(1);
        }
    }

    let scale = cli.preview_scale.unwrap_or(1.0);
    if !(scale > 0.0 && scale <= 1.0) {
        eprintln!("Error: Preview scale must be in (0, 1] (live preview uses {DEFAULT_PREVIEW_SCALE})");
        process::exit(1);
    }

    let opts = ProcessOptions {
        mode: if cli.raw { Mode::Raw } else { Mode::Processed },
        settings: Settings::new(cli.clarity, cli.brightness, cli.smoothness),
        scale,
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let input_path = Path::new(&cli.input);
    if !input_path.exists() {
        eprintln!("Error: Input path does not exist: {}", cli.input);
        process::exit(1);
    }

    if !opts.quiet {
        match opts.mode {
            Mode::Raw => eprintln!("RAW mode - frames are passed through unenhanced"),
            Mode::Processed => eprintln!(
                "Clarity {:.0}, brightness {:.0}, smoothness {:.0}, scale {:.2}",
                opts.settings.vein_clarity(),
                opts.settings.image_brightness(),
                opts.settings.background_smoothness(),
                opts.scale
            ),
        }
        eprintln!();
    }

    let results = if input_path.is_dir() {
        let output_dir = if let Some(o) = &cli.output {
            PathBuf::from(o)
        } else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: vein-enhance <input_dir> -o <output_dir>");
            process::exit(1);
        };
        process_directory(input_path, &output_dir, &opts)
    } else {
        let output_path = match &cli.output {
            Some(o) => PathBuf::from(o),
            None => default_output_path(input_path),
        };
        vec![process_file(input_path, &output_path, &opts)]
    };

    let mut success_count = 0u32;
    let mut skip_count = 0u32;
    let mut fail_count = 0u32;

    for r in &results {
        print_result(r, &opts);
        if r.skipped {
            skip_count += 1;
        } else if r.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !opts.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if skip_count > 0 {
            eprint!(", Skipped: {skip_count}");
        }
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, opts: &ProcessOptions) {
    if opts.quiet && result.success {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.skipped {
        if !opts.quiet {
            eprintln!("[SKIP] {filename}: {}", result.message);
        }
    } else if result.success {
        if !opts.quiet {
            match result.dimensions {
                Some((w, h)) => eprintln!("[OK] {filename} ({w}x{h})"),
                None => eprintln!("[OK] {filename}"),
            }
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }

    if opts.verbose && !result.message.is_empty() {
        eprintln!("  -> {}", result.message);
    }
}
