use assert_cmd::Command;
use image::{GrayImage, Luma};
use predicates::prelude::*;
use std::path::Path;

fn cli() -> Command {
    Command::cargo_bin("nonogram-grid").expect("binary built")
}

/// 5x5 crossings 20 px apart starting at (60, 60), drawn with 2 px lines.
fn write_grid_png(path: &Path) {
    let mut img = GrayImage::from_pixel(200, 200, Luma([255]));
    for k in 0..5u32 {
        let at = 60 + 20 * k;
        for t in 50..=151u32 {
            for w in 0..2 {
                img.put_pixel(at + w, t, Luma([0]));
                img.put_pixel(t, at + w, Luma([0]));
            }
        }
    }
    img.save(path).expect("write png");
}

#[test]
fn print_config_shows_defaults() {
    cli()
        .arg("print-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"resize_max_side\": 1200"))
        .stdout(predicate::str::contains("\"similarity_ratio_min\": 0.9"));
}

#[test]
fn print_config_applies_file_then_flags() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("params.json");
    std::fs::write(&config, r#"{ "seed_window": 90, "cell_side_max": 30 }"#).expect("write");

    cli()
        .args(["print-config", "--config"])
        .arg(&config)
        .args(["--cell-max", "40"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"seed_window\": 90"))
        .stdout(predicate::str::contains("\"cell_side_max\": 40"));
}

#[test]
fn invalid_params_are_rejected() {
    cli()
        .args(["print-config", "--block-size", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("threshold_block_size"));
}

#[test]
fn missing_image_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    cli()
        .arg("detect")
        .arg(dir.path().join("nope.png"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open image"));
}

#[test]
fn detect_writes_json_overlay_and_cells() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("grid.png");
    let out = dir.path().join("crosses.json");
    let overlay = dir.path().join("overlay.png");
    let cells = dir.path().join("cells");
    write_grid_png(&input);

    cli()
        .arg("detect")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .arg("--draw")
        .arg(&overlay)
        .arg("--cells-dir")
        .arg(&cells)
        .args(["--max-side", "200", "--cell-side", "16"])
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).expect("json written"))
            .expect("valid json");
    assert_eq!(json["cell_size"], 20);
    assert_eq!(json["width"], 200);
    assert_eq!(json["main"]["rows"], 7);
    assert_eq!(json["main"]["cols"], 7);
    assert_eq!(json["stats"]["main"]["confirmed"], 25);

    let drawn = image::open(&overlay).expect("overlay written").to_rgb8();
    assert_eq!(drawn.dimensions(), (200, 200));
    assert_eq!(drawn.get_pixel(60, 60).0, [0, 0, 255]);

    let written = std::fs::read_dir(&cells).expect("cells dir").count();
    assert_eq!(written, 36);
    assert!(cells.join("000_000.png").exists());
}

#[test]
fn blank_image_reports_missing_seed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("blank.png");
    GrayImage::from_pixel(60, 60, Luma([255]))
        .save(&input)
        .expect("write png");

    cli()
        .arg("detect")
        .arg(&input)
        .args(["--max-side", "60", "--cell-max", "12"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SeedNotFound"));
}
