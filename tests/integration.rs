use image::{Rgba, RgbaImage};
use vein_enhance::{
    enhance_for_capture, enhance_for_preview, process_directory, process_file, Error, Mode,
    ProcessOptions, Roi, Settings,
};

/// Soft horizontal illumination ramp with a few darker vertical "veins".
fn synthetic_hand(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        let base = 120 + (x * 80) / w;
        let vein = [w / 3, w / 2, (2 * w) / 3]
            .iter()
            .any(|&vx| x.abs_diff(vx + (y / 16)) <= 1);
        let r = if vein { base - 35 } else { base };
        #[allow(clippy::cast_possible_truncation)]
        let r = r as u8;
        Rgba([r, r / 2, r / 3, 255])
    })
}

#[test]
fn flat_gray_frame_end_to_end() {
    let frame = RgbaImage::from_pixel(100, 100, Rgba([128, 128, 128, 255]));
    let out = enhance_for_capture(&frame, Mode::Processed, Settings::default()).unwrap();
    assert_eq!(out.dimensions(), (100, 100));

    let roi = Roi::centered(100, 100).unwrap();
    assert_eq!((roi.width, roi.height), (50, 45));

    for (x, y, p) in out.enumerate_pixels() {
        assert_eq!(p[3], 255);
        if roi.contains(x, y) {
            // a flat region normalizes to its baseline and the mask stays empty
            assert_eq!(*p, Rgba([255, 255, 255, 255]), "pixel ({x},{y})");
        } else {
            assert_eq!(*p, Rgba([128, 128, 128, 255]), "pixel ({x},{y})");
        }
    }
}

#[test]
fn preview_halves_a_200px_frame() {
    let frame = synthetic_hand(200, 200);
    let out = enhance_for_preview(&frame, Mode::Processed, Settings::default(), 0.5).unwrap();
    assert_eq!(out.dimensions(), (100, 100));
}

#[test]
fn raw_capture_returns_input_bit_for_bit() {
    let frame = synthetic_hand(64, 48);
    for settings in [
        Settings::default(),
        Settings::new(0.0, 100.0, 0.0),
        Settings::new(100.0, 0.0, 100.0),
    ] {
        let out = enhance_for_capture(&frame, Mode::Raw, settings).unwrap();
        assert_eq!(out.as_raw(), frame.as_raw());
    }
}

#[test]
fn processed_mode_is_deterministic() {
    let frame = synthetic_hand(96, 80);
    let settings = Settings::new(70.0, 40.0, 30.0);
    let a = enhance_for_capture(&frame, Mode::Processed, settings).unwrap();
    let b = enhance_for_capture(&frame, Mode::Processed, settings).unwrap();
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn outside_region_matches_red_channel() {
    let frame = synthetic_hand(90, 70);
    let out = enhance_for_capture(&frame, Mode::Processed, Settings::default()).unwrap();
    let roi = Roi::centered(90, 70).unwrap();
    for (x, y, p) in out.enumerate_pixels() {
        if !roi.contains(x, y) {
            let red = frame.get_pixel(x, y)[0];
            assert_eq!(*p, Rgba([red, red, red, 255]), "pixel ({x},{y})");
        }
    }
}

#[test]
fn settings_change_the_region() {
    let frame = synthetic_hand(96, 80);
    let dark = enhance_for_capture(&frame, Mode::Processed, Settings::new(50.0, 100.0, 50.0))
        .unwrap();
    let bright = enhance_for_capture(&frame, Mode::Processed, Settings::new(50.0, 0.0, 50.0))
        .unwrap();
    assert_ne!(dark.as_raw(), bright.as_raw());
}

#[test]
fn dark_band_is_drawn_black_inside_region() {
    // 5px vertical vein centered on x = 100
    let frame = RgbaImage::from_fn(200, 200, |x, _| {
        let r = if (98..=102).contains(&x) { 90 } else { 200 };
        Rgba([r, 40, 30, 255])
    });
    let out = enhance_for_capture(&frame, Mode::Processed, Settings::default()).unwrap();
    let roi = Roi::centered(200, 200).unwrap();
    assert!(roi.contains(100, 100));

    for x in 99..=101 {
        assert_eq!(*out.get_pixel(x, 100), Rgba([0, 0, 0, 255]), "band column {x}");
    }
    for x in [94, 106] {
        let p = out.get_pixel(x, 100);
        assert!(p[0] > 0, "column {x} next to the band was blanked");
        assert_eq!((p[0], p[1], p[2]), (p[0], p[0], p[0]));
    }

    // the same band outside the region keeps its raw red value
    assert_eq!(*out.get_pixel(100, 5), Rgba([90, 90, 90, 255]));
}

#[test]
fn one_by_one_frame_is_rejected_when_processed() {
    let frame = RgbaImage::from_pixel(1, 1, Rgba([200, 0, 0, 255]));
    let err = enhance_for_capture(&frame, Mode::Processed, Settings::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidDimensions { .. }));

    // raw passthrough has nothing to compute and still succeeds
    let out = enhance_for_capture(&frame, Mode::Raw, Settings::default()).unwrap();
    assert_eq!(out, frame);
}

#[test]
fn process_file_writes_enhanced_png() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hand.png");
    let output = dir.path().join("out").join("hand_enhanced.png");
    synthetic_hand(80, 60).save(&input).unwrap();

    let result = process_file(&input, &output, &ProcessOptions::default());
    assert!(result.success, "{}", result.message);
    assert!(!result.skipped);
    assert_eq!(result.dimensions, Some((80, 60)));

    let written = image::open(&output).unwrap();
    assert_eq!((written.width(), written.height()), (80, 60));
}

#[test]
fn process_file_reports_missing_input() {
    let dir = tempfile::tempdir().unwrap();
    let result = process_file(
        &dir.path().join("missing.png"),
        &dir.path().join("out.png"),
        &ProcessOptions::default(),
    );
    assert!(!result.success);
    assert!(result.message.contains("Failed to load"));
}

#[test]
fn process_file_skips_tiny_frames() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dot.png");
    RgbaImage::from_pixel(1, 1, Rgba([9, 9, 9, 255]))
        .save(&input)
        .unwrap();

    let result = process_file(&input, &dir.path().join("dot_out.png"), &ProcessOptions::default());
    assert!(result.skipped);
    assert!(result.success);
}

#[test]
fn process_directory_handles_every_supported_file() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    synthetic_hand(40, 40).save(input_dir.path().join("a.png")).unwrap();
    synthetic_hand(50, 30).save(input_dir.path().join("b.bmp")).unwrap();
    std::fs::write(input_dir.path().join("notes.txt"), "not an image").unwrap();

    let opts = ProcessOptions {
        scale: 0.5,
        ..ProcessOptions::default()
    };
    let results = process_directory(input_dir.path(), output_dir.path(), &opts);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success && !r.skipped));

    let a = image::open(output_dir.path().join("a.png")).unwrap();
    assert_eq!((a.width(), a.height()), (20, 20));
}
