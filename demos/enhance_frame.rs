//! Enhance a single photo and also write its half-scale preview.
//!
//! Usage:
//! ```sh
//! cargo run --example enhance_frame -- input.jpg output.png
//! ```

use std::env;
use std::process;

use vein_enhance::{enhance_for_preview, ProcessOptions, DEFAULT_PREVIEW_SCALE};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output>", args[0]);
        process::exit(1);
    }

    let input = &args[1];
    let output = &args[2];

    let opts = ProcessOptions::default();
    let result = vein_enhance::process_file(input.as_ref(), output.as_ref(), &opts);

    if result.skipped {
        println!("Skipped: {}", result.message);
        return;
    } else if !result.success {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
    println!("Done: {}", result.message);

    let frame = image::open(input).expect("input decoded once already").to_rgba8();
    let preview = match enhance_for_preview(&frame, opts.mode, opts.settings, DEFAULT_PREVIEW_SCALE)
    {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Preview skipped: {e}");
            return;
        }
    };
    let preview_path = vein_enhance::default_output_path(output.as_ref());
    preview.save(&preview_path).expect("failed to save preview");
    println!(
        "Preview: {} ({}x{})",
        preview_path.display(),
        preview.width(),
        preview.height()
    );
}
